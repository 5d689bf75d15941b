//! `$N` placeholder substitution for rule templates.
//!
//! A placeholder is `$` followed by one or more ASCII digits, read greedily:
//! `$12` is group twelve, never group one followed by a literal `2`. Group
//! contents are inserted verbatim and never scanned for placeholders again.

use regex::Captures;

/// Render a template against a regex match.
///
/// Returns `None` when the trimmed result is empty, which callers treat as
/// "no usable value".
pub fn render(template: &str, captures: &Captures<'_>) -> Option<String> {
    let groups: Vec<Option<&str>> = captures
        .iter()
        .map(|group| group.map(|m| m.as_str()))
        .collect();
    let rendered = substitute(template, &groups);
    let trimmed = rendered.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Replace every placeholder in `template` with its group.
///
/// `groups[0]` is the whole match. Indices up to and including
/// `groups.len()` are substituted, with non-participating groups becoming
/// the empty string. Larger indices are left as written.
pub fn substitute(template: &str, groups: &[Option<&str>]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.bytes().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            out.push('$');
            rest = after;
            continue;
        }

        let token = &after[..digits];
        match token.parse::<usize>() {
            Ok(index) if index <= groups.len() => {
                out.push_str(groups.get(index).copied().flatten().unwrap_or(""));
            }
            _ => {
                out.push('$');
                out.push_str(token);
            }
        }
        rest = &after[digits..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn renders_second_group() {
        let re = Regex::new(r"^(.+?)\s*-\s*(.+?)\.[^.]+$").unwrap();
        let caps = re.captures("Pink Floyd - Comfortably Numb.mp3").unwrap();
        assert_eq!(render("$2", &caps).as_deref(), Some("Comfortably Numb"));
        assert_eq!(render("$1", &caps).as_deref(), Some("Pink Floyd"));
    }

    #[test]
    fn whole_match_and_mixed_literal_text() {
        let re = Regex::new(r"(\d+)-(\d+)").unwrap();
        let caps = re.captures("track 3-12 live").unwrap();
        assert_eq!(
            render("disc $1 of $2 ($0)", &caps).as_deref(),
            Some("disc 3 of 12 (3-12)")
        );
    }

    #[test]
    fn template_without_placeholders_is_a_constant() {
        let re = Regex::new(r"\.mp3$").unwrap();
        let caps = re.captures("song.mp3").unwrap();
        assert_eq!(render("Rock", &caps).as_deref(), Some("Rock"));
    }

    #[test]
    fn digits_are_consumed_greedily() {
        let mut groups = vec![Some("whole")];
        groups.extend((1..=12).map(|i| if i == 1 { Some("A") } else { Some("L") }));
        assert_eq!(substitute("$12", &groups), "L");
        assert_eq!(substitute("$1", &groups), "A");
    }

    #[test]
    fn index_past_groups_stays_literal() {
        let groups = [Some("ab"), Some("a"), Some("b")];
        // One past the last group is still substituted, as empty.
        assert_eq!(substitute("[$3]", &groups), "[]");
        assert_eq!(substitute("[$4]", &groups), "[$4]");
        assert_eq!(substitute("[$12]", &groups), "[$12]");
    }

    #[test]
    fn non_participating_group_is_empty() {
        let re = Regex::new(r"^(\d+)?\s*(.+)$").unwrap();
        let caps = re.captures("Intro").unwrap();
        assert_eq!(substitute("<$1>$2", &[caps.get(0).map(|m| m.as_str()), None, Some("Intro")]), "<>Intro");
        assert_eq!(render("$1", &caps), None);
    }

    #[test]
    fn inserted_text_is_not_rescanned() {
        let groups = [Some("$2 x"), Some("$2"), Some("x")];
        assert_eq!(substitute("$1/$2", &groups), "$2/x");
    }

    #[test]
    fn lone_dollar_signs_survive() {
        let groups = [Some("9"), Some("9")];
        assert_eq!(substitute("$$1 $ $x", &groups), "$9 $ $x");
    }

    #[test]
    fn whitespace_only_result_is_no_value() {
        let re = Regex::new(r"^(\s*)x").unwrap();
        let caps = re.captures("   x").unwrap();
        assert_eq!(render("$1", &caps), None);
        assert_eq!(render("  $1  ", &caps), None);
    }

    #[test]
    fn result_is_trimmed() {
        let re = Regex::new(r"^(.+?)\.").unwrap();
        let caps = re.captures(" Title .mp3").unwrap();
        assert_eq!(render("$1", &caps).as_deref(), Some("Title"));
    }

    #[test]
    fn substitution_is_deterministic() {
        let groups = [Some("01 - a"), Some("01"), Some("a")];
        let first = substitute("$2 #$1", &groups);
        let second = substitute("$2 #$1", &groups);
        assert_eq!(first, second);
        assert_eq!(first, "a #01");
    }
}

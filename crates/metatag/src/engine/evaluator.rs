//! Rule evaluation: what a rule would change, without changing anything.
//!
//! Each file ends in exactly one [`FileOutcome`]. Only `Proposed` outcomes
//! leave this module; the other outcomes are counted and logged.

use super::error::Result;
use super::ports::LibraryReader;
use super::source::{resolve, FileContext};
use super::template::render;
use super::types::{ChangeDraft, EvaluateProgress};
use metatag_db::TagRule;
use regex::Regex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Result of previewing one rule over a batch of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Proposals in input file order. May be empty.
    Ready(Vec<ChangeDraft>),
    /// The rule's regex does not compile. No file was looked at.
    InvalidRegex(String),
}

impl Preview {
    /// Proposals, treating an invalid regex as "nothing to change".
    pub fn changes(&self) -> &[ChangeDraft] {
        match self {
            Self::Ready(changes) => changes,
            Self::InvalidRegex(_) => &[],
        }
    }

    pub fn into_changes(self) -> Vec<ChangeDraft> {
        match self {
            Self::Ready(changes) => changes,
            Self::InvalidRegex(_) => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes().is_empty()
    }
}

/// What evaluation decided for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FileOutcome {
    Proposed(ChangeDraft),
    /// File id did not resolve to a record.
    Missing,
    /// The rule's source has no value for this file.
    NoValue,
    NoMatch,
    /// Template rendered to nothing but whitespace.
    EmptyValue,
    /// Candidate equals the current value.
    Unchanged,
}

#[derive(Debug, Default)]
struct Tally {
    proposed: usize,
    missing: usize,
    no_value: usize,
    no_match: usize,
    empty: usize,
    unchanged: usize,
}

impl Tally {
    fn count(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Proposed(_) => self.proposed += 1,
            FileOutcome::Missing => self.missing += 1,
            FileOutcome::NoValue => self.no_value += 1,
            FileOutcome::NoMatch => self.no_match += 1,
            FileOutcome::EmptyValue => self.empty += 1,
            FileOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Decide the outcome for one resolved file.
pub(crate) fn evaluate_file(rule: &TagRule, regex: &Regex, ctx: &FileContext<'_>) -> FileOutcome {
    let Some(source) = resolve(&rule.source_field, ctx) else {
        return FileOutcome::NoValue;
    };
    let Some(captures) = regex.captures(&source) else {
        return FileOutcome::NoMatch;
    };
    let Some(candidate) = render(&rule.template, &captures) else {
        return FileOutcome::EmptyValue;
    };

    let current = ctx.tag_value(&rule.target_field);
    if current == Some(candidate.as_str()) {
        return FileOutcome::Unchanged;
    }

    FileOutcome::Proposed(ChangeDraft::for_file(
        ctx.file,
        rule.target_field.as_str(),
        current.map(str::to_string),
        Some(candidate),
    ))
}

/// Current value of `key` on one file, `None` when the tag is absent.
pub async fn current_value(reader: &dyn LibraryReader, file_id: i64, key: &str) -> Result<Option<String>> {
    Ok(reader
        .tags(file_id)
        .await?
        .into_iter()
        .find(|t| t.key == key)
        .map(|t| t.value))
}

/// Preview `rule` over `file_ids`. Reads only.
pub async fn evaluate(
    reader: &dyn LibraryReader,
    rule: &TagRule,
    file_ids: &[i64],
) -> Result<Preview> {
    evaluate_with_progress(reader, rule, file_ids, None).await
}

/// [`evaluate`], reporting after each file and yielding to the runtime.
pub async fn evaluate_with_progress(
    reader: &dyn LibraryReader,
    rule: &TagRule,
    file_ids: &[i64],
    progress: Option<&UnboundedSender<EvaluateProgress>>,
) -> Result<Preview> {
    let regex = match Regex::new(&rule.regex) {
        Ok(regex) => regex,
        Err(err) => {
            warn!(rule_id = rule.id, error = %err, "Rule regex does not compile");
            return Ok(Preview::InvalidRegex(err.to_string()));
        }
    };

    let tags_by_file = reader.tags_for_many(file_ids).await?;
    let mut changes = Vec::new();
    let mut tally = Tally::default();

    for (index, &file_id) in file_ids.iter().enumerate() {
        let outcome = match reader.file(file_id).await? {
            None => FileOutcome::Missing,
            Some(file) => {
                let tags = tags_by_file.get(&file_id).map(Vec::as_slice).unwrap_or_default();
                let ctx = FileContext {
                    file: &file,
                    position: index + 1,
                    tags,
                };
                evaluate_file(rule, &regex, &ctx)
            }
        };

        tally.count(&outcome);
        match outcome {
            FileOutcome::Proposed(change) => changes.push(change),
            skipped => debug!(rule_id = rule.id, file_id, outcome = ?skipped, "No change proposed"),
        }

        if let Some(tx) = progress {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(EvaluateProgress {
                evaluated: index + 1,
                total: file_ids.len(),
                proposed: changes.len(),
            });
        }
        tokio::task::yield_now().await;
    }

    info!(
        rule_id = rule.id,
        files = file_ids.len(),
        proposed = tally.proposed,
        missing = tally.missing,
        no_value = tally.no_value,
        no_match = tally.no_match,
        empty = tally.empty,
        unchanged = tally.unchanged,
        "Evaluated rule"
    );

    Ok(Preview::Ready(changes))
}

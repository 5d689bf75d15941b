//! `metatag rule` - manage tag rules, preview and apply them

use super::error::HelpfulError;
use super::output::{format_value, print_json, print_table, truncate};
use super::{print_apply_report, Session};
use clap::{Args, Subcommand};
use metatag::engine::{
    evaluate_with_progress, validate_regex, EngineError, EvaluateProgress, Preview,
};
use metatag_db::{NewTagRule, SourceField, TagRule};
use metatag_ids::PendingChangeId;

#[derive(Subcommand, Debug, Clone)]
pub enum RuleAction {
    /// List all rules, presets first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one rule
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Add a rule
    Add {
        name: String,
        /// filename, folder, index, datetime or tag:<key>
        #[arg(long, default_value = "filename")]
        source: SourceField,
        #[arg(long)]
        regex: String,
        /// Tag key to write
        #[arg(long)]
        target: String,
        /// Replacement with $0..$N placeholders
        #[arg(long, default_value = "$1")]
        template: String,
    },
    /// Change fields of a rule
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        source: Option<SourceField>,
        #[arg(long)]
        regex: Option<String>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        template: Option<String>,
    },
    /// Remove a user rule (presets cannot be removed)
    Remove { id: i64 },
    /// Show what a rule would change, without changing anything
    Preview {
        id: i64,
        #[command(flatten)]
        selection: FileSelection,
        #[arg(long)]
        json: bool,
    },
    /// Stage every change a rule proposes and apply them
    Apply {
        id: i64,
        #[command(flatten)]
        selection: FileSelection,
        /// Apply without stopping at the preview
        #[arg(long)]
        yes: bool,
    },
}

/// Which files a rule runs over.
#[derive(Args, Debug, Clone)]
pub struct FileSelection {
    /// Every file of a library, in filename order
    #[arg(long, conflicts_with = "files")]
    pub library: Option<i64>,
    /// Individual files, in the order given
    #[arg(long = "file")]
    pub files: Vec<i64>,
}

impl FileSelection {
    async fn resolve(&self, session: &Session) -> anyhow::Result<Vec<i64>> {
        let ids: Vec<i64> = match self.library {
            Some(library_id) => {
                let library = session.library(library_id).await?;
                session
                    .db
                    .list_files(library.id)
                    .await?
                    .into_iter()
                    .map(|f| f.id)
                    .collect()
            }
            None => self.files.clone(),
        };
        if ids.is_empty() {
            return Err(HelpfulError::no_files_selected().into());
        }
        Ok(ids)
    }
}

pub async fn run(session: &Session, action: RuleAction) -> anyhow::Result<()> {
    match action {
        RuleAction::List { json } => list_rules(session, json).await,
        RuleAction::Show { id, json } => show_rule(session, id, json).await,
        RuleAction::Add {
            name,
            source,
            regex,
            target,
            template,
        } => {
            validate_regex(&regex).map_err(|e| HelpfulError::invalid_regex(&regex, e))?;
            let rule = session
                .rules()
                .create(NewTagRule {
                    name,
                    source_field: source,
                    regex,
                    target_field: target,
                    template,
                    is_preset: false,
                })
                .await?;
            println!("Added rule [{}] {}", rule.id, rule.name);
            println!("  Preview it with: metatag rule preview {} --library <id>", rule.id);
            Ok(())
        }
        RuleAction::Edit {
            id,
            name,
            source,
            regex,
            target,
            template,
        } => {
            let mut rule = find_rule(session, id).await?;
            if let Some(regex) = regex {
                validate_regex(&regex).map_err(|e| HelpfulError::invalid_regex(&regex, e))?;
                rule.regex = regex;
            }
            if let Some(name) = name {
                rule.name = name;
            }
            if let Some(source) = source {
                rule.source_field = source;
            }
            if let Some(target) = target {
                rule.target_field = target;
            }
            if let Some(template) = template {
                rule.template = template;
            }
            let rule = session.rules().update(rule).await?;
            println!("Updated rule [{}] {}", rule.id, rule.name);
            Ok(())
        }
        RuleAction::Remove { id } => match session.rules().delete(id).await {
            Ok(()) => {
                println!("Removed rule {}", id);
                Ok(())
            }
            Err(EngineError::PresetRule(name)) => Err(HelpfulError::preset_rule(&name).into()),
            Err(EngineError::RuleNotFound(id)) => Err(HelpfulError::rule_not_found(id).into()),
            Err(err) => Err(err.into()),
        },
        RuleAction::Preview { id, selection, json } => {
            let rule = find_rule(session, id).await?;
            let file_ids = selection.resolve(session).await?;
            let preview = preview(session, &rule, &file_ids).await?;
            if json {
                return print_json(&preview.changes());
            }
            print_preview(&rule, &preview, file_ids.len());
            Ok(())
        }
        RuleAction::Apply { id, selection, yes } => {
            let rule = find_rule(session, id).await?;
            let file_ids = selection.resolve(session).await?;
            let preview = preview(session, &rule, &file_ids).await?;
            print_preview(&rule, &preview, file_ids.len());
            if preview.is_empty() {
                return Ok(());
            }
            if !yes {
                println!();
                println!("Nothing written. Re-run with --yes to apply these changes.");
                return Ok(());
            }

            let queue = session.queue();
            let staged = queue.enqueue_many(preview.into_changes()).await;
            let ids: Vec<PendingChangeId> = staged.iter().map(|c| c.id().clone()).collect();
            let report = queue.apply(&ids).await?;
            print_apply_report(&report);
            Ok(())
        }
    }
}

async fn find_rule(session: &Session, id: i64) -> anyhow::Result<TagRule> {
    match session.rules().get(id).await {
        Ok(rule) => Ok(rule),
        Err(EngineError::RuleNotFound(id)) => Err(HelpfulError::rule_not_found(id).into()),
        Err(err) => Err(err.into()),
    }
}

async fn preview(session: &Session, rule: &TagRule, file_ids: &[i64]) -> anyhow::Result<Preview> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<EvaluateProgress>();
    let printer = tokio::spawn(async move {
        while let Some(p) = rx.recv().await {
            if p.evaluated % 500 == 0 {
                eprintln!("  evaluated {}/{}", p.evaluated, p.total);
            }
        }
    });
    let result = evaluate_with_progress(&session.db, rule, file_ids, Some(&tx)).await;
    drop(tx);
    let _ = printer.await;
    Ok(result?)
}

fn print_preview(rule: &TagRule, preview: &Preview, file_count: usize) {
    if let Preview::InvalidRegex(reason) = preview {
        println!("Rule [{}] has an invalid regex; it proposes nothing.", rule.id);
        println!("  {}", reason);
        println!("  Fix it with: metatag rule edit {} --regex <pattern>", rule.id);
        return;
    }

    let changes = preview.changes();
    if changes.is_empty() {
        println!("Rule [{}] {} proposes no changes for {} file(s).", rule.id, rule.name, file_count);
        return;
    }

    let rows = changes
        .iter()
        .map(|c| {
            vec![
                c.file_id.to_string(),
                truncate(&c.filename, 50),
                c.key.clone(),
                format_value(c.old_value.as_deref()),
                format_value(c.new_value.as_deref()),
            ]
        })
        .collect();
    print_table(&["FILE", "FILENAME", "KEY", "OLD", "NEW"], rows);
    println!("{} change(s) across {} file(s)", changes.len(), file_count);
}

async fn list_rules(session: &Session, json: bool) -> anyhow::Result<()> {
    let rules = session.rules().list().await?;
    if json {
        return print_json(&rules);
    }

    let rows = rules
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                truncate(&r.name, 40),
                r.source_field.to_string(),
                truncate(&r.regex, 40),
                r.target_field.clone(),
                r.template.clone(),
                if r.is_preset { "yes" } else { "" }.to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "SOURCE", "REGEX", "TARGET", "TEMPLATE", "PRESET"],
        rows,
    );
    println!("{} rules", rules.len());
    Ok(())
}

async fn show_rule(session: &Session, id: i64, json: bool) -> anyhow::Result<()> {
    let rule = find_rule(session, id).await?;
    if json {
        return print_json(&rule);
    }

    println!("RULE [{}] {}", rule.id, rule.name);
    println!("  Source:   {}", rule.source_field);
    println!("  Regex:    {}", rule.regex);
    println!("  Target:   {}", rule.target_field);
    println!("  Template: {}", rule.template);
    println!("  Preset:   {}", if rule.is_preset { "yes" } else { "no" });
    println!("  Created:  {}", rule.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Err(err) = validate_regex(&rule.regex) {
        println!();
        println!("  WARNING: regex does not compile: {}", err);
    }
    Ok(())
}

//! `metatag tag` - inspect and edit the tags of one file
//!
//! Edits go through the pending queue like rule output does, so they land
//! in the history and can be undone.

use super::error::HelpfulError;
use super::output::{print_json, print_table};
use super::Session;
use clap::Subcommand;
use metatag::engine::{current_value, ChangeDraft};

#[derive(Subcommand, Debug, Clone)]
pub enum TagAction {
    /// Show the tags of a file
    Show {
        file: i64,
        #[arg(long)]
        json: bool,
    },
    /// Set one tag
    Set { file: i64, key: String, value: String },
    /// Remove one tag
    Rm { file: i64, key: String },
}

pub async fn run(session: &Session, action: TagAction) -> anyhow::Result<()> {
    match action {
        TagAction::Show { file, json } => show_tags(session, file, json).await,
        TagAction::Set { file, key, value } => {
            let file = session.file(file).await?;
            let old = current_value(&session.db, file.id, &key).await?;
            if old.as_deref() == Some(value.as_str()) {
                println!("{} is already '{}' on {}", key, value, file.filename);
                return Ok(());
            }
            apply_one(session, ChangeDraft::for_file(&file, key.as_str(), old, Some(value.clone()))).await?;
            println!("Set {} = '{}' on {}", key, value, file.filename);
            Ok(())
        }
        TagAction::Rm { file, key } => {
            let file = session.file(file).await?;
            let Some(old) = current_value(&session.db, file.id, &key).await? else {
                println!("{} has no '{}' tag", file.filename, key);
                return Ok(());
            };
            apply_one(session, ChangeDraft::for_file(&file, key.as_str(), Some(old), None)).await?;
            println!("Removed {} from {}", key, file.filename);
            Ok(())
        }
    }
}

async fn apply_one(session: &Session, draft: ChangeDraft) -> anyhow::Result<()> {
    let queue = session.queue();
    let change = queue.enqueue(draft).await;
    let report = queue.apply(&[change.id().clone()]).await?;
    if let Some(failure) = report.failed.first() {
        return Err(HelpfulError::new(format!("Failed to write tag '{}'", change.draft().key))
            .with_context(failure.error.clone())
            .with_suggestion(format!("TRY: Check that {} is writable", change.draft().file_path))
            .into());
    }
    Ok(())
}

async fn show_tags(session: &Session, file_id: i64, json: bool) -> anyhow::Result<()> {
    let file = session.file(file_id).await?;
    let tags = session.db.get_tags(file.id).await?;
    if json {
        return print_json(&tags);
    }

    println!("{} ({})", file.filename, file.path);
    if tags.is_empty() {
        println!("  No tags.");
        let fields = file.file_type.common_fields().join(", ");
        println!("  Common fields for {}: {}", file.file_type, fields);
        return Ok(());
    }

    let rows = tags
        .iter()
        .map(|t| vec![t.key.clone(), t.value.clone(), t.source.as_str().to_string()])
        .collect();
    print_table(&["KEY", "VALUE", "SOURCE"], rows);
    Ok(())
}

//! `metatag history` - review and undo applied tag changes

use super::error::HelpfulError;
use super::output::{format_value, print_json, print_table};
use super::Session;
use clap::Subcommand;
use metatag::engine::{undo_last, EngineError, HistoryLog, Reversal};

#[derive(Subcommand, Debug, Clone)]
pub enum HistoryAction {
    /// Applied changes of a file, newest first
    Show {
        file: i64,
        /// Rows to show (defaults to history_limit from config.toml)
        #[arg(short = 'n', long)]
        limit: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Revert the most recent change of a file
    Undo { file: i64 },
}

pub async fn run(session: &Session, action: HistoryAction) -> anyhow::Result<()> {
    match action {
        HistoryAction::Show { file, limit, json } => {
            let file = session.file(file).await?;
            let limit = limit.unwrap_or(session.config.history_limit);
            let entries = HistoryLog::history(&session.db, file.id, limit).await?;
            if json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("No history for {}", file.filename);
                return Ok(());
            }

            let rows = entries
                .iter()
                .map(|e| {
                    vec![
                        e.id.to_string(),
                        e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                        e.key.clone(),
                        e.operation.to_string(),
                        format_value(e.old_value.as_deref()),
                        format_value(e.new_value.as_deref()),
                    ]
                })
                .collect();
            println!("{}", file.filename);
            print_table(&["ID", "WHEN", "KEY", "OP", "OLD", "NEW"], rows);
            Ok(())
        }
        HistoryAction::Undo { file } => {
            let file = session.file(file).await?;
            let writer = session.writer();
            match undo_last(&session.db, writer.as_ref(), file.id).await {
                Ok(Reversal::Restore { key, value }) => {
                    println!("Restored {} = '{}' on {}", key, value, file.filename)
                }
                Ok(Reversal::Remove { key }) => println!("Removed {} from {}", key, file.filename),
                Ok(Reversal::Nothing { key }) => {
                    println!("Last change to {} left nothing to restore", key)
                }
                Err(EngineError::NothingToUndo(id)) => {
                    return Err(HelpfulError::nothing_to_undo(id).into())
                }
                Err(err) => return Err(err.into()),
            }
            Ok(())
        }
    }
}

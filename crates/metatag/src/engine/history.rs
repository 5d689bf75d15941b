//! Recording applied changes and undoing the latest one.

use super::error::{EngineError, Result};
use super::ports::{HistoryLog, TagWriter};
use metatag_db::{HistoryOperation, NewHistoryEntry, TagHistoryEntry};
use serde::Serialize;
use tracing::info;

/// Append one entry. Storage failures propagate.
pub async fn record(
    history: &dyn HistoryLog,
    file_id: i64,
    key: &str,
    old_value: Option<&str>,
    new_value: Option<&str>,
    operation: HistoryOperation,
) -> Result<()> {
    history
        .append(&NewHistoryEntry {
            file_id,
            key: key.to_string(),
            old_value: old_value.map(str::to_string),
            new_value: new_value.map(str::to_string),
            operation,
        })
        .await
}

/// What undo needs to do to reverse one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Reversal {
    Restore { key: String, value: String },
    Remove { key: String },
    Nothing { key: String },
}

impl Reversal {
    pub fn for_entry(entry: &TagHistoryEntry) -> Self {
        let key = entry.key.clone();
        match (entry.operation, &entry.old_value) {
            (_, Some(old)) => Self::Restore {
                key,
                value: old.clone(),
            },
            (HistoryOperation::Create | HistoryOperation::Update, None) => Self::Remove { key },
            (HistoryOperation::Delete, None) => Self::Nothing { key },
        }
    }
}

/// Revert the most recent history entry of `file_id`.
///
/// The entry stays in the log and no new entry is written, so calling this
/// again without other changes targets the same entry.
pub async fn undo_last(
    history: &dyn HistoryLog,
    writer: &dyn TagWriter,
    file_id: i64,
) -> Result<Reversal> {
    let entry = history
        .most_recent(file_id)
        .await?
        .ok_or(EngineError::NothingToUndo(file_id))?;

    let reversal = Reversal::for_entry(&entry);
    match &reversal {
        Reversal::Restore { key, value } => writer.write_tag(file_id, key, value).await?,
        Reversal::Remove { key } => writer.delete_tag(file_id, key).await?,
        Reversal::Nothing { .. } => {}
    }

    info!(file_id, entry_id = entry.id, reversal = ?reversal, "Undid tag change");
    Ok(reversal)
}

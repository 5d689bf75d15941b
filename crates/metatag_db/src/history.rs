//! Tag history operations (append-only log backing undo)

use crate::error::{DbError, Result};
use crate::types::*;
use crate::LibraryDb;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const HISTORY_COLUMNS: &str = "id, file_id, key, old_value, new_value, operation, timestamp";

impl LibraryDb {
    /// Append one entry. Returns the new row id.
    pub async fn add_history(&self, entry: &NewHistoryEntry) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO tag_history (file_id, key, old_value, new_value, operation, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.file_id)
        .bind(&entry.key)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(entry.operation.as_str())
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Newest entries first; entries sharing a timestamp are ordered by id.
    pub async fn get_history(&self, file_id: i64, limit: u32) -> Result<Vec<TagHistoryEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tag_history WHERE file_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
            HISTORY_COLUMNS
        ))
        .bind(file_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_history).collect()
    }

    pub async fn most_recent_history(&self, file_id: i64) -> Result<Option<TagHistoryEntry>> {
        Ok(self.get_history(file_id, 1).await?.into_iter().next())
    }
}

fn row_to_history(row: &SqliteRow) -> Result<TagHistoryEntry> {
    let op_str: String = row.get("operation");
    let operation = HistoryOperation::parse(&op_str)
        .ok_or_else(|| DbError::constraint(format!("Unknown history operation: {}", op_str)))?;

    Ok(TagHistoryEntry {
        id: row.get("id"),
        file_id: row.get("file_id"),
        key: row.get("key"),
        old_value: row.get("old_value"),
        new_value: row.get("new_value"),
        operation,
        timestamp: LibraryDb::millis_to_datetime(row.get("timestamp")),
    })
}

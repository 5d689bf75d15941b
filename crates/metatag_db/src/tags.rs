//! Tag operations

use crate::error::{DbError, Result};
use crate::types::*;
use crate::LibraryDb;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::HashMap;

impl LibraryDb {
    /// Tags of one file, ordered by key. Empty when the file has none.
    pub async fn get_tags(&self, file_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT file_id, key, value, source FROM tags WHERE file_id = ? ORDER BY key",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_tag).collect()
    }

    /// Tags for several files at once. Every requested id gets an entry.
    pub async fn get_tags_for_many(&self, file_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>> {
        let mut result: HashMap<i64, Vec<Tag>> =
            file_ids.iter().map(|id| (*id, Vec::new())).collect();
        if file_ids.is_empty() {
            return Ok(result);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT file_id, key, value, source FROM tags WHERE file_id IN (");
        let mut separated = builder.separated(", ");
        for id in file_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY file_id, key");

        let rows = builder.build().fetch_all(&self.pool).await?;
        for row in &rows {
            let tag = row_to_tag(row)?;
            result.entry(tag.file_id).or_default().push(tag);
        }

        Ok(result)
    }

    /// Set a tag value, replacing any existing value for the key.
    pub async fn upsert_tag(
        &self,
        file_id: i64,
        key: &str,
        value: &str,
        source: TagSource,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tags (file_id, key, value, source)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(file_id, key) DO UPDATE SET
                value = excluded.value,
                source = excluded.source
            "#,
        )
        .bind(file_id)
        .bind(key)
        .bind(value)
        .bind(source.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove one tag. Removing an absent key is a no-op.
    pub async fn delete_tag(&self, file_id: i64, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM tags WHERE file_id = ? AND key = ?")
            .bind(file_id)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove every tag of a file (before a rescan reloads them).
    pub async fn clear_tags(&self, file_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tags WHERE file_id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_tag(row: &SqliteRow) -> Result<Tag> {
    let source_str: String = row.get("source");
    let source = TagSource::parse(&source_str)
        .ok_or_else(|| DbError::constraint(format!("Unknown tag source: {}", source_str)))?;

    Ok(Tag {
        file_id: row.get("file_id"),
        key: row.get("key"),
        value: row.get("value"),
        source,
    })
}

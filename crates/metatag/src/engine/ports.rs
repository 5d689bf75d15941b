//! Collaborator interfaces the engine is written against.
//!
//! The engine never talks to sqlx or the filesystem directly. Storage comes
//! in through [`LibraryReader`], [`HistoryLog`] and [`RuleRepository`], all
//! implemented by [`LibraryDb`]; tag writes go through a [`TagWriter`] such
//! as [`crate::writer::SidecarTagWriter`].

use super::error::Result;
use async_trait::async_trait;
use metatag_db::{FileRecord, LibraryDb, NewHistoryEntry, NewTagRule, Tag, TagHistoryEntry, TagRule};
use std::collections::HashMap;

/// Read access to files and their current tags.
#[async_trait]
pub trait LibraryReader: Send + Sync {
    /// `None` when the file no longer exists.
    async fn file(&self, file_id: i64) -> Result<Option<FileRecord>>;

    /// Current tags of one file. Empty, not an error, for an untagged file.
    async fn tags(&self, file_id: i64) -> Result<Vec<Tag>>;

    /// Current tags of several files, keyed by every requested id.
    async fn tags_for_many(&self, file_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>>;
}

/// Durable write of a single tag.
#[async_trait]
pub trait TagWriter: Send + Sync {
    async fn write_tag(&self, file_id: i64, key: &str, value: &str) -> Result<()>;

    async fn delete_tag(&self, file_id: i64, key: &str) -> Result<()>;
}

/// Append-only record of applied mutations.
#[async_trait]
pub trait HistoryLog: Send + Sync {
    async fn append(&self, entry: &NewHistoryEntry) -> Result<()>;

    /// Newest first.
    async fn history(&self, file_id: i64, limit: u32) -> Result<Vec<TagHistoryEntry>>;

    async fn most_recent(&self, file_id: i64) -> Result<Option<TagHistoryEntry>>;
}

/// Persistence for tag rules. Deletion here is unconditional.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<TagRule>>;

    async fn get(&self, id: i64) -> Result<Option<TagRule>>;

    async fn create(&self, rule: &NewTagRule) -> Result<TagRule>;

    async fn update(&self, rule: &TagRule) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
impl LibraryReader for LibraryDb {
    async fn file(&self, file_id: i64) -> Result<Option<FileRecord>> {
        Ok(self.get_file(file_id).await?)
    }

    async fn tags(&self, file_id: i64) -> Result<Vec<Tag>> {
        Ok(self.get_tags(file_id).await?)
    }

    async fn tags_for_many(&self, file_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>> {
        Ok(self.get_tags_for_many(file_ids).await?)
    }
}

#[async_trait]
impl HistoryLog for LibraryDb {
    async fn append(&self, entry: &NewHistoryEntry) -> Result<()> {
        self.add_history(entry).await?;
        Ok(())
    }

    async fn history(&self, file_id: i64, limit: u32) -> Result<Vec<TagHistoryEntry>> {
        Ok(self.get_history(file_id, limit).await?)
    }

    async fn most_recent(&self, file_id: i64) -> Result<Option<TagHistoryEntry>> {
        Ok(self.most_recent_history(file_id).await?)
    }
}

#[async_trait]
impl RuleRepository for LibraryDb {
    async fn list(&self) -> Result<Vec<TagRule>> {
        Ok(self.list_rules().await?)
    }

    async fn get(&self, id: i64) -> Result<Option<TagRule>> {
        Ok(self.get_rule(id).await?)
    }

    async fn create(&self, rule: &NewTagRule) -> Result<TagRule> {
        Ok(self.create_rule(rule).await?)
    }

    async fn update(&self, rule: &TagRule) -> Result<()> {
        Ok(self.update_rule(rule).await?)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        Ok(self.delete_rule(id).await?)
    }
}

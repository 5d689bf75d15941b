//! Hand-written collaborators for engine unit tests.

use super::error::{EngineError, Result};
use super::ports::{HistoryLog, LibraryReader, TagWriter};
use async_trait::async_trait;
use chrono::Utc;
use metatag_db::{
    FileRecord, FileType, NewHistoryEntry, SourceField, Tag, TagHistoryEntry, TagRule, TagSource,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) fn file_record(id: i64, path: &str) -> FileRecord {
    let filename = path.rsplit('/').next().unwrap_or(path).to_string();
    FileRecord {
        id,
        library_id: 1,
        path: path.to_string(),
        file_type: FileType::from_filename(&filename).unwrap_or(FileType::Mp3),
        filename,
        size: 4096,
        modified_at: "2025-03-01T09:30:00.000Z".to_string(),
        scanned_at: Utc::now(),
    }
}

pub(crate) fn rule(source: SourceField, regex: &str, target: &str, template: &str) -> TagRule {
    TagRule {
        id: 1,
        name: "test rule".to_string(),
        source_field: source,
        regex: regex.to_string(),
        target_field: target.to_string(),
        template: template.to_string(),
        is_preset: false,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
pub(crate) struct MemoryLibrary {
    files: HashMap<i64, FileRecord>,
    tags: HashMap<i64, Vec<Tag>>,
    reads: AtomicUsize,
}

impl MemoryLibrary {
    pub(crate) fn with_file(mut self, id: i64, path: &str, tags: &[(&str, &str)]) -> Self {
        self.files.insert(id, file_record(id, path));
        self.tags.insert(id, Self::tags_of(id, tags));
        self
    }

    pub(crate) fn tags_of(file_id: i64, tags: &[(&str, &str)]) -> Vec<Tag> {
        tags.iter()
            .map(|(key, value)| Tag {
                file_id,
                key: key.to_string(),
                value: value.to_string(),
                source: TagSource::Native,
            })
            .collect()
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LibraryReader for MemoryLibrary {
    async fn file(&self, file_id: i64) -> Result<Option<FileRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.get(&file_id).cloned())
    }

    async fn tags(&self, file_id: i64) -> Result<Vec<Tag>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.tags.get(&file_id).cloned().unwrap_or_default())
    }

    async fn tags_for_many(&self, file_ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(file_ids
            .iter()
            .map(|id| (*id, self.tags.get(id).cloned().unwrap_or_default()))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WriteCall {
    Write { file_id: i64, key: String, value: String },
    Delete { file_id: i64, key: String },
}

/// Records every call; fails for files registered with `failing_on`.
#[derive(Default)]
pub(crate) struct SpyWriter {
    calls: Mutex<Vec<WriteCall>>,
    failing: HashSet<i64>,
}

impl SpyWriter {
    pub(crate) fn failing_on(file_ids: &[i64]) -> Self {
        Self {
            calls: Mutex::default(),
            failing: file_ids.iter().copied().collect(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<WriteCall> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, file_id: i64) -> Result<()> {
        if self.failing.contains(&file_id) {
            return Err(EngineError::Write(format!("disk full writing file {}", file_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl TagWriter for SpyWriter {
    async fn write_tag(&self, file_id: i64, key: &str, value: &str) -> Result<()> {
        self.calls.lock().unwrap().push(WriteCall::Write {
            file_id,
            key: key.to_string(),
            value: value.to_string(),
        });
        self.check(file_id)
    }

    async fn delete_tag(&self, file_id: i64, key: &str) -> Result<()> {
        self.calls.lock().unwrap().push(WriteCall::Delete {
            file_id,
            key: key.to_string(),
        });
        self.check(file_id)
    }
}

/// In-memory history. `fail_appends` simulates the store going away.
#[derive(Default)]
pub(crate) struct SpyHistory {
    entries: Mutex<Vec<TagHistoryEntry>>,
    fail_appends: AtomicBool,
}

impl SpyHistory {
    pub(crate) fn entries(&self) -> Vec<TagHistoryEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub(crate) fn fail_appends(&self) {
        self.fail_appends.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl HistoryLog for SpyHistory {
    async fn append(&self, entry: &NewHistoryEntry) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(EngineError::Storage(metatag_db::DbError::not_found(
                "history table",
            )));
        }
        let mut entries = self.entries.lock().unwrap();
        let id = entries.len() as i64 + 1;
        entries.push(TagHistoryEntry {
            id,
            file_id: entry.file_id,
            key: entry.key.clone(),
            old_value: entry.old_value.clone(),
            new_value: entry.new_value.clone(),
            operation: entry.operation,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn history(&self, file_id: i64, limit: u32) -> Result<Vec<TagHistoryEntry>> {
        let mut mine: Vec<_> = self
            .entries()
            .into_iter()
            .filter(|e| e.file_id == file_id)
            .collect();
        mine.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        mine.truncate(limit as usize);
        Ok(mine)
    }

    async fn most_recent(&self, file_id: i64) -> Result<Option<TagHistoryEntry>> {
        Ok(self.history(file_id, 1).await?.into_iter().next())
    }
}

//! Sidecar-backed tag writer.
//!
//! Tags are written to `<media path><suffix>` as a pretty-printed JSON
//! object and mirrored into the `tags` table with source `sidecar`. The
//! media file itself is never modified.

use crate::engine::{EngineError, Result, TagWriter};
use async_trait::async_trait;
use metatag_db::{FileType, LibraryDb, TagSource};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub type Sidecar = Map<String, Value>;

/// Sidecar location for a media file.
pub fn sidecar_path(file_path: &str, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", file_path, suffix))
}

/// Read a sidecar. Missing or unparsable sidecars read as empty.
pub async fn read_sidecar(path: &Path) -> Sidecar {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(_) => return Sidecar::new(),
    };
    match serde_json::from_str::<Sidecar>(&content) {
        Ok(map) => map,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Ignoring unreadable sidecar");
            Sidecar::new()
        }
    }
}

/// String-valued entries of a sidecar, in key order.
pub fn sidecar_tags(sidecar: &Sidecar) -> Vec<(String, String)> {
    let mut tags: Vec<(String, String)> = sidecar
        .iter()
        .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
        .collect();
    tags.sort();
    tags
}

async fn write_sidecar(path: &Path, sidecar: &Sidecar) -> Result<()> {
    let content = serde_json::to_string_pretty(sidecar)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}

pub struct SidecarTagWriter {
    db: LibraryDb,
    suffix: String,
}

impl SidecarTagWriter {
    pub fn new(db: LibraryDb, suffix: impl Into<String>) -> Self {
        Self {
            db,
            suffix: suffix.into(),
        }
    }

    async fn sidecar_for(&self, file_id: i64) -> Result<PathBuf> {
        let file = self
            .db
            .get_file(file_id)
            .await?
            .ok_or(EngineError::FileNotFound(file_id))?;
        if FileType::from_filename(&file.filename).is_none() {
            return Err(EngineError::UnsupportedFormat(file.filename));
        }
        Ok(sidecar_path(&file.path, &self.suffix))
    }
}

#[async_trait]
impl TagWriter for SidecarTagWriter {
    async fn write_tag(&self, file_id: i64, key: &str, value: &str) -> Result<()> {
        let path = self.sidecar_for(file_id).await?;

        let mut sidecar = read_sidecar(&path).await;
        sidecar.insert(key.to_string(), Value::String(value.to_string()));
        write_sidecar(&path, &sidecar).await?;

        self.db
            .upsert_tag(file_id, key, value, TagSource::Sidecar)
            .await?;
        debug!(file_id, key, sidecar = %path.display(), "Wrote tag");
        Ok(())
    }

    async fn delete_tag(&self, file_id: i64, key: &str) -> Result<()> {
        let path = self.sidecar_for(file_id).await?;

        let mut sidecar = read_sidecar(&path).await;
        if sidecar.remove(key).is_some() {
            if sidecar.is_empty() {
                tokio::fs::remove_file(&path).await?;
            } else {
                write_sidecar(&path, &sidecar).await?;
            }
        }

        self.db.delete_tag(file_id, key).await?;
        debug!(file_id, key, "Deleted tag");
        Ok(())
    }
}

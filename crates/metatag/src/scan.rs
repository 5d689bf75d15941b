//! Library scanning
//!
//! Walks a library folder, records every supported media file and loads the
//! values from its sidecar as `sidecar` tags. Files whose modification time
//! is unchanged since the last scan are left alone.

use crate::config::MetatagConfig;
use crate::engine::{EngineError, Result};
use crate::writer::{read_sidecar, sidecar_path, sidecar_tags};
use chrono::{DateTime, SecondsFormat, Utc};
use metatag_db::{FileType, Library, LibraryDb, NewFile, TagSource};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Sent once per discovered file, before it is looked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    pub total: usize,
    pub scanned: usize,
    /// Filename being scanned.
    pub current: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Supported files found under the library folder.
    pub discovered: usize,
    /// New or modified files that were (re)recorded.
    pub updated: usize,
    pub unchanged: usize,
    /// Tags loaded from sidecars.
    pub sidecar_tags: usize,
    /// Entries the walker could not read.
    pub unreadable: usize,
}

#[derive(Debug)]
struct Discovered {
    path: PathBuf,
    filename: String,
    file_type: FileType,
    size: u64,
    modified_at: String,
}

/// File modification time as stored: RFC 3339, UTC, millisecond precision.
pub fn format_mtime(modified: SystemTime) -> String {
    DateTime::<Utc>::from(modified).to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

fn discover(root: &Path, skip_hidden_dirs: bool) -> (Vec<Discovered>, usize) {
    let mut found = Vec::new();
    let mut unreadable = 0;

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(skip_hidden_dirs && is_hidden_dir(entry)));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "Skipping unreadable entry");
                unreadable += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().into_owned();
        let Some(file_type) = FileType::from_filename(&filename) else {
            continue;
        };
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(_) => {
                unreadable += 1;
                continue;
            }
        };
        let modified_at = metadata
            .modified()
            .map(format_mtime)
            .unwrap_or_default();

        found.push(Discovered {
            path: entry.into_path(),
            filename,
            file_type,
            size: metadata.len(),
            modified_at,
        });
    }

    (found, unreadable)
}

/// Scan one library folder into the database.
pub async fn scan_library(
    db: &LibraryDb,
    library: &Library,
    config: &MetatagConfig,
    progress: Option<&UnboundedSender<ScanProgress>>,
) -> Result<ScanStats> {
    let root = PathBuf::from(&library.path);
    if !root.is_dir() {
        return Err(EngineError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Library folder not found: {}", library.path),
        )));
    }

    let skip_hidden = config.skip_hidden_dirs;
    let (found, unreadable) = tokio::task::spawn_blocking(move || discover(&root, skip_hidden))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let total = found.len();
    let mut stats = ScanStats {
        discovered: total,
        unreadable,
        ..ScanStats::default()
    };

    for (index, file) in found.into_iter().enumerate() {
        if let Some(tx) = progress {
            let _ = tx.send(ScanProgress {
                total,
                scanned: index + 1,
                current: file.filename.clone(),
            });
        }

        let path = file.path.to_string_lossy().into_owned();
        if !db.file_needs_rescan(&path, &file.modified_at).await? {
            stats.unchanged += 1;
            continue;
        }

        let record = db
            .upsert_file(&NewFile {
                library_id: library.id,
                path: path.clone(),
                filename: file.filename,
                file_type: file.file_type,
                size: file.size,
                modified_at: file.modified_at,
            })
            .await?;
        db.clear_tags(record.id).await?;

        let sidecar = read_sidecar(&sidecar_path(&path, &config.sidecar_suffix)).await;
        for (key, value) in sidecar_tags(&sidecar) {
            db.upsert_tag(record.id, &key, &value, TagSource::Sidecar)
                .await?;
            stats.sidecar_tags += 1;
        }

        stats.updated += 1;
        tokio::task::yield_now().await;
    }

    info!(
        library_id = library.id,
        discovered = stats.discovered,
        updated = stats.updated,
        unchanged = stats.unchanged,
        sidecar_tags = stats.sidecar_tags,
        "Scanned library"
    );
    Ok(stats)
}

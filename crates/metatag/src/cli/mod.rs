//! Command-line interface for metatag
//!
//! Every command opens the database, does its work and exits. The pending
//! queue lives for one invocation, so commands that change tags stage and
//! apply their changes in the same run.

pub mod error;
pub mod history;
pub mod library;
pub mod output;
pub mod rule;
pub mod tag;

use crate::cli::error::HelpfulError;
use metatag::engine::{ApplyReport, PendingQueue, RuleBook};
use metatag::{MetatagConfig, SidecarTagWriter};
use metatag_db::{FileRecord, Library, LibraryDb};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// What every command needs: configuration and an open database.
pub struct Session {
    pub config: MetatagConfig,
    pub db: LibraryDb,
}

impl Session {
    pub async fn open(home: &Path, db_override: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = MetatagConfig::load_or_default(home).map_err(|e| {
            HelpfulError::new(format!("Failed to load configuration: {}", e))
                .with_context(format!("Config file: {}", home.join(metatag::config::CONFIG_FILE).display()))
                .with_suggestion("TRY: Fix or remove the file to fall back to defaults")
        })?;
        let db_path = db_override.unwrap_or_else(|| config.resolve_database_path(home));
        let db = LibraryDb::open(&db_path)
            .await
            .map_err(|e| HelpfulError::database_open(&db_path, e))?;
        debug!(db = %db_path.display(), "Session opened");
        Ok(Self { config, db })
    }

    pub fn writer(&self) -> Arc<SidecarTagWriter> {
        Arc::new(SidecarTagWriter::new(
            self.db.clone(),
            self.config.sidecar_suffix.clone(),
        ))
    }

    pub fn queue(&self) -> PendingQueue {
        PendingQueue::new(self.writer(), Arc::new(self.db.clone()))
    }

    pub fn rules(&self) -> RuleBook {
        RuleBook::new(Arc::new(self.db.clone()))
    }

    pub async fn library(&self, id: i64) -> anyhow::Result<Library> {
        Ok(self
            .db
            .get_library(id)
            .await?
            .ok_or_else(|| HelpfulError::library_not_found(id))?)
    }

    pub async fn file(&self, id: i64) -> anyhow::Result<FileRecord> {
        Ok(self
            .db
            .get_file(id)
            .await?
            .ok_or_else(|| HelpfulError::file_not_found(id))?)
    }
}

/// Print the success count and every failure of an Apply call.
pub fn print_apply_report(report: &ApplyReport) {
    println!("Applied {} change(s)", report.succeeded.len());
    if !report.failed.is_empty() {
        println!("{} change(s) failed:", report.failed.len());
        for failure in &report.failed {
            println!("  {}  {}", failure.id, failure.error);
        }
    }
}

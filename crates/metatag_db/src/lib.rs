//! Storage layer for metatag
//!
//! One SQLite database holds libraries, files, tags, tag rules and the tag
//! history. The engine and the CLI go through [`LibraryDb`]; nothing else
//! touches sqlx directly.
//!
//! # Usage
//!
//! ```rust,ignore
//! use metatag_db::{LibraryDb, Result};
//!
//! let db = LibraryDb::open("~/.metatag/metatag.sqlite3").await?;
//!
//! let rules = db.list_rules().await?;
//! let tags = db.get_tags(file_id).await?;
//! ```

mod error;
mod schema;
mod types;

mod history;
mod library;
mod presets;
mod rules;
mod tags;

pub use error::{DbError, Result};
pub use presets::PRESET_RULES;
pub use types::*;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Handle to the tagger database. Cheap to clone.
#[derive(Clone)]
pub struct LibraryDb {
    pool: SqlitePool,
}

impl LibraryDb {
    /// Open or create a database at the given path.
    ///
    /// Creates missing tables and seeds preset rules.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.initialize().await?;

        info!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Private in-memory database, used by tests.
    ///
    /// A single connection that never idles out; every connection to
    /// `:memory:` would otherwise see its own empty database.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    async fn initialize(&self) -> Result<()> {
        self.ensure_schema().await?;
        self.seed_presets().await?;
        Ok(())
    }

    /// Underlying pool (escape hatch for ad-hoc queries in tests).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl LibraryDb {
    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert stored milliseconds back to a DateTime.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }
}

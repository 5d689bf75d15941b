//! Schema creation. All CREATE TABLE statements live here.

use crate::error::Result;
use crate::LibraryDb;
use tracing::info;

const TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS libraries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        path TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        library_id INTEGER NOT NULL REFERENCES libraries(id) ON DELETE CASCADE,
        path TEXT NOT NULL UNIQUE,
        filename TEXT NOT NULL,
        type TEXT NOT NULL,
        size INTEGER NOT NULL DEFAULT 0,
        modified_at TEXT NOT NULL,
        scanned_at INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
        key TEXT NOT NULL,
        value TEXT NOT NULL DEFAULT '',
        source TEXT NOT NULL DEFAULT 'native',
        UNIQUE(file_id, key)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tag_rules (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        source_field TEXT NOT NULL,
        regex TEXT NOT NULL,
        target_field TEXT NOT NULL,
        template TEXT NOT NULL DEFAULT '$1',
        is_preset INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tag_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
        key TEXT NOT NULL,
        old_value TEXT,
        new_value TEXT,
        operation TEXT NOT NULL,
        timestamp INTEGER NOT NULL
    )"#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_files_library ON files(library_id)",
    "CREATE INDEX IF NOT EXISTS idx_files_type ON files(type)",
    "CREATE INDEX IF NOT EXISTS idx_tags_file ON tags(file_id)",
    "CREATE INDEX IF NOT EXISTS idx_tags_key ON tags(key)",
    "CREATE INDEX IF NOT EXISTS idx_tag_history_file ON tag_history(file_id, timestamp)",
];

impl LibraryDb {
    /// Ensure all tables exist. Safe to run on every start.
    ///
    /// Journal mode and foreign keys are connection options, set in [`LibraryDb::open`].
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        for ddl in TABLES.iter().chain(INDEXES) {
            sqlx::query(ddl).execute(&self.pool).await?;
        }

        info!("Database schema verified");
        Ok(())
    }
}

//! Library and file operations

use crate::error::{DbError, Result};
use crate::types::*;
use crate::LibraryDb;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const FILE_COLUMNS: &str = "id, library_id, path, filename, type, size, modified_at, scanned_at";
const SEARCH_LIMIT: i64 = 200;

impl LibraryDb {
    // ========================================================================
    // Library Operations
    // ========================================================================

    /// Register a folder as a library.
    pub async fn add_library(&self, path: &str, name: &str) -> Result<Library> {
        let now = Self::now_millis();
        let result = sqlx::query("INSERT INTO libraries (path, name, created_at) VALUES (?, ?, ?)")
            .bind(path)
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    DbError::constraint(format!("Library already registered: {}", path))
                }
                other => DbError::Sqlx(other),
            })?;

        Ok(Library {
            id: result.last_insert_rowid(),
            path: path.to_string(),
            name: name.to_string(),
            created_at: Self::millis_to_datetime(now),
        })
    }

    /// All libraries, ordered by name.
    pub async fn list_libraries(&self) -> Result<Vec<Library>> {
        let rows = sqlx::query("SELECT id, path, name, created_at FROM libraries ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_library).collect())
    }

    pub async fn get_library(&self, id: i64) -> Result<Option<Library>> {
        let row = sqlx::query("SELECT id, path, name, created_at FROM libraries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_library))
    }

    /// Remove a library. Files, tags and history go with it.
    pub async fn remove_library(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM libraries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========================================================================
    // File Operations
    // ========================================================================

    /// Insert a file or refresh its metadata if the path is already known.
    pub async fn upsert_file(&self, file: &NewFile) -> Result<FileRecord> {
        let now = Self::now_millis();

        sqlx::query(
            r#"
            INSERT INTO files (library_id, path, filename, type, size, modified_at, scanned_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(path) DO UPDATE SET
                filename = excluded.filename,
                type = excluded.type,
                size = excluded.size,
                modified_at = excluded.modified_at,
                scanned_at = excluded.scanned_at
            "#,
        )
        .bind(file.library_id)
        .bind(&file.path)
        .bind(&file.filename)
        .bind(file.file_type.as_str())
        .bind(file.size as i64)
        .bind(&file.modified_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(&format!("SELECT {} FROM files WHERE path = ?", FILE_COLUMNS))
            .bind(&file.path)
            .fetch_one(&self.pool)
            .await?;

        row_to_file(&row)
    }

    pub async fn get_file(&self, id: i64) -> Result<Option<FileRecord>> {
        let row = sqlx::query(&format!("SELECT {} FROM files WHERE id = ?", FILE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_file).transpose()
    }

    /// Files of a library, ordered by filename.
    pub async fn list_files(&self, library_id: i64) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM files WHERE library_id = ? ORDER BY filename",
            FILE_COLUMNS
        ))
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_file).collect()
    }

    /// Files directly inside `folder` (not in its subfolders).
    pub async fn list_files_in_folder(&self, folder: &str) -> Result<Vec<FileRecord>> {
        let folder = folder.trim_end_matches('/');
        let rows = sqlx::query(&format!(
            "SELECT {} FROM files WHERE path LIKE ? AND path NOT LIKE ? ORDER BY filename",
            FILE_COLUMNS
        ))
        .bind(format!("{}/%", folder))
        .bind(format!("{}/%/%", folder))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_file).collect()
    }

    /// Files whose filename, path or any tag value contains `query`.
    pub async fn search_files(&self, query: &str) -> Result<Vec<FileRecord>> {
        let like = format!("%{}%", query);
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT f.id, f.library_id, f.path, f.filename, f.type, f.size, f.modified_at, f.scanned_at
            FROM files f
            LEFT JOIN tags t ON t.file_id = f.id
            WHERE f.filename LIKE ? OR f.path LIKE ? OR t.value LIKE ?
            ORDER BY f.filename
            LIMIT ?
            "#,
        )
        .bind(&like)
        .bind(&like)
        .bind(&like)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_file).collect()
    }

    /// True when the path is unknown or its recorded mtime differs.
    pub async fn file_needs_rescan(&self, path: &str, modified_at: &str) -> Result<bool> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT modified_at FROM files WHERE path = ?")
                .bind(path)
                .fetch_optional(&self.pool)
                .await?;

        Ok(stored.as_deref() != Some(modified_at))
    }
}

fn row_to_library(row: &SqliteRow) -> Library {
    Library {
        id: row.get("id"),
        path: row.get("path"),
        name: row.get("name"),
        created_at: LibraryDb::millis_to_datetime(row.get("created_at")),
    }
}

fn row_to_file(row: &SqliteRow) -> Result<FileRecord> {
    let type_str: String = row.get("type");
    let file_type = FileType::parse(&type_str)
        .ok_or_else(|| DbError::constraint(format!("Unknown file type: {}", type_str)))?;

    Ok(FileRecord {
        id: row.get("id"),
        library_id: row.get("library_id"),
        path: row.get("path"),
        filename: row.get("filename"),
        file_type,
        size: row.get::<i64, _>("size").max(0) as u64,
        modified_at: row.get("modified_at"),
        scanned_at: LibraryDb::millis_to_datetime(row.get("scanned_at")),
    })
}

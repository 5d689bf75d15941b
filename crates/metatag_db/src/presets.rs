//! Built-in tag rules seeded on first open.

use crate::error::Result;
use crate::LibraryDb;
use tracing::{debug, info};

/// (name, source_field, regex, target_field, template)
pub const PRESET_RULES: &[(&str, &str, &str, &str, &str)] = &[
    // Basic filename parsing
    ("Track number from filename", "filename", r"^(\d+)[\s\-_.]", "track", "$1"),
    ("Track from filename (strip leading zeros)", "filename", r"^0*(\d+)\s", "track", "$1"),
    ("Date from filename (YYYY-MM-DD)", "filename", r"(\d{4}-\d{2}-\d{2})", "year", "$1"),
    ("Title from filename (strip extension)", "filename", r"^(.+)\.[^.]+$", "title", "$1"),
    // "Artist - Title.ext"
    ("Artist - Title from filename", "filename", r"^(.+?)\s*-\s*(.+?)\.[^.]+$", "title", "$2"),
    ("Artist from filename (Artist - Title)", "filename", r"^(.+?)\s*-\s*(.+?)\.[^.]+$", "artist", "$1"),
    // "01 - My Song.mp3"
    ("Title from ## - Title filename", "filename", r"^\d{1,3}\s*[-._]\s*(.+?)\.[^.]+$", "title", "$1"),
    // "01 - Pink Floyd - Time.mp3"
    (
        "Artist from ## - Artist - Title filename",
        "filename",
        r"^\d{1,3}\s*[-._]\s*(.+?)\s+-\s+.+?\.[^.]+$",
        "artist",
        "$1",
    ),
    (
        "Title from ## - Artist - Title filename",
        "filename",
        r"^\d{1,3}\s*[-._]\s*.+?\s+-\s+(.+?)\.[^.]+$",
        "title",
        "$1",
    ),
    // Years
    ("Year from brackets in filename (19xx/20xx)", "filename", r"[\(\[]((?:19|20)\d{2})[\)\]]", "year", "$1"),
    ("Year from brackets in folder name", "folder", r"[\(\[]((?:19|20)\d{2})[\)\]]", "year", "$1"),
    ("Year from 4-digit number in folder", "folder", r"((?:19|20)\d{2})", "year", "$1"),
    // CD1, Disc 2, Disk3
    ("Disc number from filename", "filename", r"(?:[Dd](?:isc|isk)|[Cc][Dd])\s*(\d+)", "disc", "$1"),
    // Folder structure
    ("Album from parent folder", "folder", r"([^/\\]+)[/\\]?$", "album", "$1"),
    (
        "Album from folder (strip bracketed year)",
        "folder",
        r"[/\\]([^/\\]+?)\s*[\(\[](?:19|20)\d{2}[\)\]]\s*$",
        "album",
        "$1",
    ),
    ("Album artist from grandparent folder", "folder", r"([^/\\]+)[/\\][^/\\]+$", "album_artist", "$1"),
    (
        "Genre from folder structure (Genre/Artist/Album)",
        "folder",
        r"([^/\\]+)[/\\][^/\\]+[/\\][^/\\]+$",
        "genre",
        "$1",
    ),
    // Annotations
    ("Comment from [bracketed] text in filename", "filename", r"\[([^\]]+)\]", "comment", "$1"),
    // Documents
    ("Author from Author - Title document", "filename", r"^(.+?)\s*[-–—]\s*.+?\.[^.]+$", "author", "$1"),
    ("Title from Author - Title document", "filename", r"^.+?\s*[-–—]\s*(.+?)\.[^.]+$", "title", "$1"),
];

impl LibraryDb {
    /// Insert every preset that has no preset row with the same name yet.
    ///
    /// Runs on every open; repeated runs never duplicate a preset.
    pub async fn seed_presets(&self) -> Result<usize> {
        let now = Self::now_millis();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for &(name, source, regex, target, template) in PRESET_RULES {
            let exists: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM tag_rules WHERE name = ? AND is_preset = 1")
                    .bind(name)
                    .fetch_one(&mut *tx)
                    .await?;
            if exists > 0 {
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO tag_rules (name, source_field, regex, target_field, template, is_preset, created_at)
                VALUES (?, ?, ?, ?, ?, 1, ?)
                "#,
            )
            .bind(name)
            .bind(source)
            .bind(regex)
            .bind(target)
            .bind(template)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            debug!(preset = name, "Seeded preset rule");
            inserted += 1;
        }

        tx.commit().await?;
        if inserted > 0 {
            info!(count = inserted, "Seeded preset tag rules");
        }
        Ok(inserted)
    }
}

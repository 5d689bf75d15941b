//! Resolves a rule's source field to the string its regex runs against.

use metatag_db::{FileRecord, SourceField, Tag};
use std::path::Path;

/// What the resolver can see of one file during an evaluation.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    pub file: &'a FileRecord,
    /// 1-based position of the file in the evaluated batch.
    pub position: usize,
    pub tags: &'a [Tag],
}

impl<'a> FileContext<'a> {
    pub fn tag_value(&self, key: &str) -> Option<&'a str> {
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }
}

/// `None` means the file has no value for this source and must be skipped.
pub fn resolve(source: &SourceField, ctx: &FileContext<'_>) -> Option<String> {
    match source {
        SourceField::Filename => Some(ctx.file.filename.clone()),
        SourceField::Folder => Some(parent_folder(&ctx.file.path)),
        SourceField::Index => Some(ctx.position.to_string()),
        SourceField::Datetime => Some(ctx.file.modified_at.clone()),
        SourceField::TagRef(key) => ctx.tag_value(key).map(str::to_string),
        SourceField::Other(_) => None,
    }
}

/// Parent directory of a path; `.` for a bare filename.
fn parent_folder(path: &str) -> String {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use metatag_db::{FileType, TagSource};

    fn file(path: &str) -> FileRecord {
        FileRecord {
            id: 1,
            library_id: 1,
            path: path.to_string(),
            filename: path.rsplit('/').next().unwrap_or(path).to_string(),
            file_type: FileType::Mp3,
            size: 1024,
            modified_at: "2025-01-01T12:00:00.000Z".to_string(),
            scanned_at: Utc::now(),
        }
    }

    fn tag(key: &str, value: &str) -> Tag {
        Tag {
            file_id: 1,
            key: key.to_string(),
            value: value.to_string(),
            source: TagSource::Native,
        }
    }

    #[test]
    fn resolves_fixed_sources() {
        let f = file("/music/Pink Floyd/The Wall/01 - In the Flesh.mp3");
        let ctx = FileContext { file: &f, position: 3, tags: &[] };

        assert_eq!(
            resolve(&SourceField::Filename, &ctx).as_deref(),
            Some("01 - In the Flesh.mp3")
        );
        assert_eq!(
            resolve(&SourceField::Folder, &ctx).as_deref(),
            Some("/music/Pink Floyd/The Wall")
        );
        assert_eq!(resolve(&SourceField::Index, &ctx).as_deref(), Some("3"));
        assert_eq!(
            resolve(&SourceField::Datetime, &ctx).as_deref(),
            Some("2025-01-01T12:00:00.000Z")
        );
    }

    #[test]
    fn tag_reference_reads_current_value() {
        let f = file("/music/a.mp3");
        let tags = [tag("artist", "Pink Floyd"), tag("title", "Time")];
        let ctx = FileContext { file: &f, position: 1, tags: &tags };

        assert_eq!(
            resolve(&SourceField::TagRef("title".to_string()), &ctx).as_deref(),
            Some("Time")
        );
        assert_eq!(resolve(&SourceField::TagRef("album".to_string()), &ctx), None);
    }

    #[test]
    fn unknown_source_has_no_value() {
        let f = file("/music/a.mp3");
        let ctx = FileContext { file: &f, position: 1, tags: &[] };
        assert_eq!(resolve(&SourceField::Other("size".to_string()), &ctx), None);
    }

    #[test]
    fn folder_of_bare_and_root_paths() {
        assert_eq!(parent_folder("a.mp3"), ".");
        assert_eq!(parent_folder("/a.mp3"), "/");
    }
}

use metatag_db::{
    FileType, HistoryOperation, LibraryDb, NewFile, NewHistoryEntry, NewTagRule, SourceField,
    TagSource, PRESET_RULES,
};
use tempfile::TempDir;

async fn seeded_file(db: &LibraryDb, path: &str) -> i64 {
    let lib = match db.list_libraries().await.unwrap().into_iter().next() {
        Some(lib) => lib,
        None => db.add_library("/music", "Music").await.unwrap(),
    };
    let filename = path.rsplit('/').next().unwrap().to_string();
    db.upsert_file(&NewFile {
        library_id: lib.id,
        path: path.to_string(),
        filename: filename.clone(),
        file_type: FileType::from_filename(&filename).unwrap(),
        size: 5_000_000,
        modified_at: "2025-01-01T12:00:00Z".to_string(),
    })
    .await
    .unwrap()
    .id
}

fn user_rule(name: &str) -> NewTagRule {
    NewTagRule {
        name: name.to_string(),
        source_field: SourceField::Filename,
        regex: r"^(\d+)".to_string(),
        target_field: "track".to_string(),
        template: "$1".to_string(),
        is_preset: false,
    }
}

#[tokio::test]
async fn test_presets_seeded_once_across_reopens() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("metatag.sqlite3");

    let db = LibraryDb::open(&path).await.unwrap();
    let first = db.list_rules().await.unwrap();
    assert_eq!(first.len(), PRESET_RULES.len());
    assert!(first.iter().all(|r| r.is_preset));
    db.close().await;

    let db = LibraryDb::open(&path).await.unwrap();
    assert_eq!(db.seed_presets().await.unwrap(), 0);
    let second = db.list_rules().await.unwrap();
    assert_eq!(second.len(), PRESET_RULES.len());
}

#[tokio::test]
async fn test_deleted_preset_is_reseeded_but_user_rule_with_same_name_is_not_a_preset() {
    let db = LibraryDb::open_in_memory().await.unwrap();
    let preset = db
        .list_rules()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.name == "Album from parent folder")
        .unwrap();

    db.delete_rule(preset.id).await.unwrap();
    let mut lookalike = user_rule("Album from parent folder");
    lookalike.is_preset = false;
    db.create_rule(&lookalike).await.unwrap();

    assert_eq!(db.seed_presets().await.unwrap(), 1);
    let same_name: Vec<_> = db
        .list_rules()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.name == "Album from parent folder")
        .collect();
    assert_eq!(same_name.len(), 2);
    assert_eq!(same_name.iter().filter(|r| r.is_preset).count(), 1);
}

#[tokio::test]
async fn test_rules_ordered_presets_first_then_by_name() {
    let db = LibraryDb::open_in_memory().await.unwrap();
    db.create_rule(&user_rule("zeta")).await.unwrap();
    db.create_rule(&user_rule("Alpha")).await.unwrap();

    let rules = db.list_rules().await.unwrap();
    let first_user = rules.iter().position(|r| !r.is_preset).unwrap();
    assert_eq!(first_user, PRESET_RULES.len());
    assert!(rules[..first_user].iter().all(|r| r.is_preset));
    assert_eq!(rules[first_user].name, "Alpha");
    assert_eq!(rules[first_user + 1].name, "zeta");
}

#[tokio::test]
async fn test_rule_update_and_delete() {
    let db = LibraryDb::open_in_memory().await.unwrap();
    let mut rule = db.create_rule(&user_rule("track")).await.unwrap();
    assert!(!rule.is_preset);

    rule.source_field = SourceField::TagRef("title".to_string());
    rule.template = "$1 (remaster)".to_string();
    db.update_rule(&rule).await.unwrap();

    let stored = db.get_rule(rule.id).await.unwrap().unwrap();
    assert_eq!(stored.source_field, SourceField::TagRef("title".to_string()));
    assert_eq!(stored.template, "$1 (remaster)");

    db.delete_rule(rule.id).await.unwrap();
    assert!(db.get_rule(rule.id).await.unwrap().is_none());

    // Unknown id on update surfaces as not found.
    assert!(db.update_rule(&rule).await.is_err());
}

#[tokio::test]
async fn test_tags_empty_for_untagged_file_and_many_has_every_id() {
    let db = LibraryDb::open_in_memory().await.unwrap();
    let a = seeded_file(&db, "/music/a.mp3").await;
    let b = seeded_file(&db, "/music/b.flac").await;

    assert!(db.get_tags(a).await.unwrap().is_empty());

    db.upsert_tag(b, "title", "B", TagSource::Native).await.unwrap();
    db.upsert_tag(b, "artist", "X", TagSource::Native).await.unwrap();

    let many = db.get_tags_for_many(&[a, b, 999]).await.unwrap();
    assert_eq!(many.len(), 3);
    assert!(many[&a].is_empty());
    assert!(many[&999].is_empty());
    let keys: Vec<_> = many[&b].iter().map(|t| t.key.as_str()).collect();
    assert_eq!(keys, vec!["artist", "title"]);
}

#[tokio::test]
async fn test_upsert_tag_replaces_value_and_source() {
    let db = LibraryDb::open_in_memory().await.unwrap();
    let f = seeded_file(&db, "/music/a.mp3").await;

    db.upsert_tag(f, "title", "Old", TagSource::Native).await.unwrap();
    db.upsert_tag(f, "title", "New", TagSource::Sidecar).await.unwrap();

    let tags = db.get_tags(f).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].value, "New");
    assert_eq!(tags[0].source, TagSource::Sidecar);

    db.delete_tag(f, "title").await.unwrap();
    db.delete_tag(f, "title").await.unwrap();
    assert!(db.get_tags(f).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_most_recent_breaks_ties_by_id() {
    let db = LibraryDb::open_in_memory().await.unwrap();
    let f = seeded_file(&db, "/music/a.mp3").await;

    db.add_history(&NewHistoryEntry {
        file_id: f,
        key: "title".to_string(),
        old_value: None,
        new_value: Some("A".to_string()),
        operation: HistoryOperation::Create,
    })
    .await
    .unwrap();
    let second = db
        .add_history(&NewHistoryEntry {
            file_id: f,
            key: "title".to_string(),
            old_value: Some("A".to_string()),
            new_value: Some("B".to_string()),
            operation: HistoryOperation::Update,
        })
        .await
        .unwrap();

    let last = db.most_recent_history(f).await.unwrap().unwrap();
    assert_eq!(last.id, second);
    assert_eq!(last.operation, HistoryOperation::Update);
    assert_eq!(last.old_value.as_deref(), Some("A"));

    let all = db.get_history(f, 100).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].operation, HistoryOperation::Create);
    assert!(all[1].old_value.is_none());
}

#[tokio::test]
async fn test_remove_library_cascades_to_files_tags_and_history() {
    let db = LibraryDb::open_in_memory().await.unwrap();
    let f = seeded_file(&db, "/music/a.mp3").await;
    db.upsert_tag(f, "title", "A", TagSource::Native).await.unwrap();
    db.add_history(&NewHistoryEntry {
        file_id: f,
        key: "title".to_string(),
        old_value: None,
        new_value: Some("A".to_string()),
        operation: HistoryOperation::Create,
    })
    .await
    .unwrap();

    let lib = db.list_libraries().await.unwrap().remove(0);
    db.remove_library(lib.id).await.unwrap();

    assert!(db.get_file(f).await.unwrap().is_none());
    assert!(db.get_tags(f).await.unwrap().is_empty());
    assert!(db.most_recent_history(f).await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_file_and_rescan_detection() {
    let db = LibraryDb::open_in_memory().await.unwrap();
    let id = seeded_file(&db, "/music/Album/01 - Song.mp3").await;

    assert!(!db
        .file_needs_rescan("/music/Album/01 - Song.mp3", "2025-01-01T12:00:00Z")
        .await
        .unwrap());
    assert!(db
        .file_needs_rescan("/music/Album/01 - Song.mp3", "2025-02-01T12:00:00Z")
        .await
        .unwrap());
    assert!(db.file_needs_rescan("/music/other.mp3", "x").await.unwrap());

    // Same path again keeps the id.
    let again = seeded_file(&db, "/music/Album/01 - Song.mp3").await;
    assert_eq!(again, id);

    let in_album = db.list_files_in_folder("/music/Album").await.unwrap();
    assert_eq!(in_album.len(), 1);
    assert!(db.list_files_in_folder("/music").await.unwrap().is_empty());

    let found = db.search_files("Song").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].file_type, FileType::Mp3);
}

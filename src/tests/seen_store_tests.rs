use crate::seen::{record, SeenSet, SeenStore, SeenStoreError};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tempfile::tempdir;

fn flushed_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 15).unwrap()
}

#[test]
fn test_load_absent_file_is_empty() {
    let dir = tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("seen_posts.json"));

    let seen = store.load();
    assert!(seen.is_empty());
}

#[test]
fn test_load_corrupt_file_is_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seen_posts.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let seen = SeenStore::new(&path).load();
    assert!(seen.is_empty());
}

#[test]
fn test_load_wrong_shape_is_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seen_posts.json");
    std::fs::write(&path, r#"{"last_flushed": "yesterday", "ids": [1, 2]}"#).unwrap();

    assert!(SeenStore::new(&path).load().is_empty());
}

#[test]
fn test_load_bare_array() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seen_posts.json");
    std::fs::write(&path, r#"["abc123", "abc123", "def456"]"#).unwrap();

    let seen = SeenStore::new(&path).load();
    assert_eq!(seen.len(), 2);
    assert!(seen.contains("abc123"));
    assert!(seen.contains("def456"));
}

#[test]
fn test_save_then_load_round_trip() {
    let dir = tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("seen_posts.json"));
    let seen = record(SeenSet::new(flushed_at()), ["abc123", "def456", "ghi789"]);

    store.save(&seen).unwrap();
    assert_eq!(store.load(), seen);
}

#[test]
fn test_save_then_load_empty_set() {
    let dir = tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("seen_posts.json"));
    let seen = SeenSet::new(flushed_at());

    store.save(&seen).unwrap();
    let loaded = store.load();
    assert!(loaded.is_empty());
    assert_eq!(loaded, seen);
}

#[test]
fn test_round_trip_is_independent_of_insertion_order() {
    let dir = tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("seen_posts.json"));

    let cached = record(SeenSet::new(flushed_at()), ["abc123"]);
    store.save(&cached).unwrap();

    let updated = record(store.load(), ["def456"]);
    store.save(&updated).unwrap();

    let expected = record(SeenSet::new(flushed_at()), ["def456", "abc123"]);
    assert_eq!(store.load(), expected);
}

#[test]
fn test_save_overwrites_previous_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seen_posts.json");
    let store = SeenStore::new(&path);

    store
        .save(&record(SeenSet::new(flushed_at()), ["old1", "old2"]))
        .unwrap();
    store
        .save(&record(SeenSet::new(flushed_at()), ["new1"]))
        .unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["ids"], serde_json::json!(["new1"]));
    assert_eq!(
        doc["last_flushed"].as_str().map(|s| s.parse::<DateTime<Utc>>().unwrap()),
        Some(flushed_at())
    );
}

#[test]
fn test_save_into_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let store = SeenStore::new(dir.path().join("no_such_dir").join("seen_posts.json"));
    let seen = record(SeenSet::new(flushed_at()), ["abc123"]);

    match store.save(&seen).unwrap_err() {
        SeenStoreError::Io { path, .. } => assert_eq!(path, store.path()),
        e => panic!("Expected Io, got {:?}", e),
    }
}

#[test]
fn test_load_zone_less_timestamp_keeps_ids() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seen_posts.json");
    std::fs::write(
        &path,
        r#"{"last_flushed": "2024-05-01 12:00:00.123456", "ids": ["abc123", "def456"]}"#,
    )
    .unwrap();

    let seen = SeenStore::new(&path).load();
    assert_eq!(seen.len(), 2);
    assert!(seen.contains("abc123"));
    assert!(seen.contains("def456"));
    let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        + chrono::Duration::microseconds(123456);
    assert_eq!(seen.last_flushed(), expected);
}

#[test]
fn test_load_unparseable_timestamp_keeps_ids() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seen_posts.json");
    std::fs::write(&path, r#"{"last_flushed": "last tuesday", "ids": ["abc123"]}"#).unwrap();

    let before = Utc::now();
    let seen = SeenStore::new(&path).load();
    assert!(seen.contains("abc123"));
    assert!(seen.last_flushed() >= before);
}

#[test]
fn test_load_unreadable_path_is_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("seen_posts.json");
    std::fs::create_dir(&path).unwrap();

    let seen = SeenStore::new(&path).load();
    assert!(seen.is_empty());
}

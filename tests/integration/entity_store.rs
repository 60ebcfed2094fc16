//! Integration tests for the per-channel payload store

use reaction_harvester::resume::{EntityStore, JsonFileStore, ResumeError};
use reaction_harvester::ReactionRecord;
use std::collections::HashMap;
use tempfile::TempDir;

#[test]
fn test_write_then_exists() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("chats"));

    assert!(!store.exists("C01").unwrap());
    store
        .write("C01", &[ReactionRecord::new("party", 3)])
        .unwrap();
    assert!(store.exists("C01").unwrap());
    assert!(dir.path().join("chats/C01.json").is_file());
}

#[test]
fn test_document_is_flat_reaction_list() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    store
        .write(
            "C01",
            &[ReactionRecord::new("party", 3), ReactionRecord::new("tada", 1)],
        )
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("C01.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        serde_json::json!([
            {"name": "party", "count": 3},
            {"name": "tada", "count": 1}
        ])
    );
}

#[test]
fn test_read_all_returns_every_document() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    store.write("C01", &[ReactionRecord::new("party", 3)]).unwrap();
    store.write("C02", &[]).unwrap();

    let stored: HashMap<String, Vec<ReactionRecord>> = store
        .read_all()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(stored.len(), 2);
    assert_eq!(stored["C01"], vec![ReactionRecord::new("party", 3)]);
    assert!(stored["C02"].is_empty());
}

#[test]
fn test_read_all_ignores_other_files() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    store.write("C01", &[ReactionRecord::new("eyes", 1)]).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a payload").unwrap();
    std::fs::write(dir.path().join(".tmpAbC123"), "half written").unwrap();
    std::fs::create_dir(dir.path().join("nested.json")).unwrap();

    let ids: Vec<String> = store
        .read_all()
        .unwrap()
        .map(|entry| entry.unwrap().0)
        .collect();

    assert_eq!(ids, vec!["C01".to_string()]);
}

#[test]
fn test_read_all_on_missing_directory_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("never-created"));
    assert_eq!(store.read_all().unwrap().count(), 0);
}

#[test]
fn test_reads_per_message_documents() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("C09.json"),
        r#"[[{"name": "party", "count": 2}], [], [{"name": "tada", "count": 1}]]"#,
    )
    .unwrap();

    let store = JsonFileStore::new(dir.path());
    let (id, payload) = store.read_all().unwrap().next().unwrap().unwrap();

    assert_eq!(id, "C09");
    assert_eq!(
        payload,
        vec![ReactionRecord::new("party", 2), ReactionRecord::new("tada", 1)]
    );
}

#[test]
fn test_corrupt_document_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("C01.json"), "{ truncated").unwrap();

    let store = JsonFileStore::new(dir.path());
    let entry = store.read_all().unwrap().next().unwrap();
    assert!(matches!(entry, Err(ResumeError::DeserializationError(_))));
}

#[test]
fn test_rejects_path_like_ids() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());

    for id in ["", "../C01", "a/b", "C01.json"] {
        assert!(
            matches!(store.exists(id), Err(ResumeError::InvalidChannelId(_))),
            "id {id:?} should be rejected"
        );
        assert!(store.write(id, &[]).is_err());
    }
}

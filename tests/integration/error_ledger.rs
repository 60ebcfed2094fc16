//! Integration tests for the error ledger

use reaction_harvester::resume::{ErrorLedger, ErrorRecord};
use reaction_harvester::Channel;
use tempfile::TempDir;

fn ledger_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("channels").join("channel_error_list.json")
}

#[test]
fn test_append_persists_record() {
    let dir = TempDir::new().unwrap();
    let mut ledger = ErrorLedger::open(ledger_path(&dir)).unwrap();

    let channel = Channel::new("C01", "general", false);
    assert!(ledger.append(ErrorRecord::for_channel(&channel, "not_in_channel")).unwrap());

    let reopened = ErrorLedger::open(ledger_path(&dir)).unwrap();
    assert_eq!(reopened.len(), 1);
    let record = &reopened.records()[0];
    assert_eq!(record.id, "C01");
    assert_eq!(record.name, "general");
    assert_eq!(record.error.as_deref(), Some("not_in_channel"));
}

#[test]
fn test_append_deduplicates_by_id() {
    let dir = TempDir::new().unwrap();
    let mut ledger = ErrorLedger::open(ledger_path(&dir)).unwrap();
    let channel = Channel::new("C01", "general", false);

    assert!(ledger.append(ErrorRecord::for_channel(&channel, "first")).unwrap());
    assert!(!ledger.append(ErrorRecord::for_channel(&channel, "second")).unwrap());

    let reopened = ErrorLedger::open(ledger_path(&dir)).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.records()[0].error.as_deref(), Some("first"));
}

#[test]
fn test_append_sees_records_from_other_handles() {
    let dir = TempDir::new().unwrap();
    let mut first = ErrorLedger::open(ledger_path(&dir)).unwrap();
    let mut second = ErrorLedger::open(ledger_path(&dir)).unwrap();

    first
        .append(ErrorRecord::for_channel(&Channel::new("C01", "a", false), "x"))
        .unwrap();
    second
        .append(ErrorRecord::for_channel(&Channel::new("C02", "b", false), "y"))
        .unwrap();
    assert!(!second
        .append(ErrorRecord::for_channel(&Channel::new("C01", "a", false), "z"))
        .unwrap());

    let reopened = ErrorLedger::open(ledger_path(&dir)).unwrap();
    let ids: Vec<&str> = reopened.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["C01", "C02"]);
}

#[test]
fn test_clear_removes_document() {
    let dir = TempDir::new().unwrap();
    let mut ledger = ErrorLedger::open(ledger_path(&dir)).unwrap();
    ledger
        .append(ErrorRecord::for_channel(&Channel::new("C01", "a", false), "x"))
        .unwrap();

    ledger.clear().unwrap();

    assert!(ledger.is_empty());
    assert!(!ledger_path(&dir).exists());
    assert!(ErrorLedger::open(ledger_path(&dir)).unwrap().is_empty());

    // Clearing twice is fine
    ledger.clear().unwrap();
}

#[test]
fn test_reads_records_without_error_details() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("channels")).unwrap();
    std::fs::write(
        ledger_path(&dir),
        r#"[{"id": "C07", "name": "random", "is_archived": true}, {"name": "old", "id": "C08"}]"#,
    )
    .unwrap();

    let ledger = ErrorLedger::open(ledger_path(&dir)).unwrap();

    assert!(ledger.contains("C07"));
    assert!(ledger.contains("C08"));
    assert!(ledger.records()[0].is_archived);
    assert!(!ledger.records()[1].is_archived);
    assert!(ledger.records()[0].error.is_none());
    assert!(ledger.records()[0].recorded_at.is_none());
}

use std::fs;

use agent_provider::{Role, Turn};
use pretty_assertions::assert_eq;
use session_store::{ChatLogError, ChatLogStore};
use time::macros::datetime;

fn sample_history() -> Vec<Turn> {
    vec![Turn::user("hi"), Turn::assistant("hello")]
}

#[test]
fn save_then_load_recent_round_trips_history() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ChatLogStore::new(dir.path());

    store
        .save(None, &sample_history())
        .expect("save should succeed");

    let restored = store.load_recent(None).expect("load should succeed");
    assert_eq!(restored, sample_history());
    assert_eq!(restored[0].role, Role::User);
}

#[test]
fn project_logs_are_written_under_project_directory() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ChatLogStore::new(dir.path());

    let path = store
        .save_at(Some("demo"), &sample_history(), datetime!(2026-01-02 03:04:05 UTC))
        .expect("save should succeed");

    assert_eq!(path, dir.path().join("demo").join("chat_20260102_030405.json"));
    let markdown = fs::read_to_string(path.with_extension("md")).expect("markdown sibling");
    assert!(markdown.starts_with("# Design & Development Chat Log\n\nProject: demo\n"));
    assert!(markdown.contains("## Assistant\n\nhello\n"));

    let record = store.load(&path).expect("record");
    assert_eq!(record.project.as_deref(), Some("demo"));
    assert_eq!(record.timestamp, "20260102_030405");

    assert!(store.load_recent(None).expect("root logs").is_empty());
}

#[test]
fn record_json_uses_role_tagged_turns() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ChatLogStore::new(dir.path());
    let path = store
        .save_at(None, &sample_history(), datetime!(2026-01-02 03:04:05 UTC))
        .expect("save");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("json");
    assert_eq!(value["project"], serde_json::Value::Null);
    assert_eq!(value["history"][0]["role"], "user");
    assert_eq!(value["history"][1]["content"], "hello");
}

#[test]
fn same_second_saves_do_not_overwrite_and_newest_wins() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ChatLogStore::new(dir.path());
    let at = datetime!(2026-01-02 03:04:05 UTC);

    let first = store
        .save_at(None, &[Turn::user("first")], at)
        .expect("first save");
    let second = store
        .save_at(None, &[Turn::user("second")], at)
        .expect("second save");

    assert_ne!(first, second);
    assert!(second.ends_with("chat_20260102_030405_1.json"));
    assert_eq!(
        store.load_recent(None).expect("load"),
        vec![Turn::user("second")]
    );
}

#[test]
fn load_recent_picks_latest_stamp() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ChatLogStore::new(dir.path());

    store
        .save_at(Some("p"), &[Turn::user("new")], datetime!(2026-05-01 00:00:00 UTC))
        .expect("save");
    store
        .save_at(Some("p"), &[Turn::user("old")], datetime!(2025-05-01 00:00:00 UTC))
        .expect("save");

    assert_eq!(
        store.load_recent(Some("p")).expect("load"),
        vec![Turn::user("new")]
    );
}

#[test]
fn load_recent_is_empty_for_missing_project() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ChatLogStore::new(dir.path().join("never-created"));

    assert!(store.load_recent(Some("ghost")).expect("load").is_empty());
    assert!(store.list(None).expect("list").is_empty());
}

#[test]
fn list_is_newest_first_and_skips_unreadable_files() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ChatLogStore::new(dir.path());

    store
        .save_at(None, &sample_history(), datetime!(2026-01-01 00:00:00 UTC))
        .expect("save");
    store
        .save_at(None, &[Turn::user("x")], datetime!(2026-02-01 00:00:00 UTC))
        .expect("save");
    fs::write(dir.path().join("chat_20260301_000000.json"), "{ not json")
        .expect("corrupt file");

    let summaries = store.list(None).expect("list");
    let stamps: Vec<&str> = summaries.iter().map(|s| s.timestamp.as_str()).collect();
    assert_eq!(stamps, vec!["20260201_000000", "20260101_000000"]);
    assert_eq!(summaries[0].messages, 1);
    assert_eq!(summaries[1].messages, 2);
}

#[test]
fn corrupt_newest_log_yields_empty_history() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ChatLogStore::new(dir.path());
    store
        .save_at(None, &sample_history(), datetime!(2026-01-01 00:00:00 UTC))
        .expect("save");
    fs::write(dir.path().join("chat_20270101_000000.json"), "[]").expect("corrupt file");

    assert!(store.load_recent(None).expect("load").is_empty());
}

#[test]
fn project_names_with_separators_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ChatLogStore::new(dir.path());

    let error = store
        .save(Some("../escape"), &sample_history())
        .err()
        .expect("invalid name must fail");
    assert!(matches!(error, ChatLogError::InvalidProjectName { .. }));
}

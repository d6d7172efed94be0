//! Training-data preparation from files on disk.

use std::sync::Arc;

use chrono::NaiveDate;
use scout::error::{DatasetError, ScoutError};
use scout::training::{load_raw, BatchPreparer, ChatExample, RuleTimeNormalizer};
use tempfile::TempDir;

const RAW_WITH_TRAILING_COMMAS: &str = r#"[
  {
    "query": "Hi there",
    "data": {
      "answer": "Hello! How can I help you today?",
      "queryRewrite": null,
      "temporalDirection": null,
      "isFollowUp": false,
      "type": null,
      "filterQuery": null,
      "filters": {"app": null, "entity": null, "count": null, "startTime": null, "endTime": null, "sortDirection": null, "intent": {}},
    },
  },
  {
    "query": "spreadsheets in drive from last month",
    "data": {
      "answer": null,
      "queryRewrite": null,
      "temporalDirection": null,
      "isFollowUp": false,
      "type": "GetItems",
      "filterQuery": null,
      "filters": {"app": "google-drive", "entity": "sheets", "count": null, "startTime": "2024-06-01T00:00:00.000+05:30", "endTime": "2024-06-30T23:59:59.999+05:30", "sortDirection": null, "intent": {}}
    }
  },
  {
    "query": "emails from a while ago",
    "data": {
      "answer": null,
      "queryRewrite": null,
      "temporalDirection": null,
      "isFollowUp": false,
      "type": "GetItems",
      "filterQuery": null,
      "filters": {"app": "gmail", "entity": "mail", "count": null, "startTime": "2024-01-01T00:00:00.000+05:30", "endTime": null, "sortDirection": null, "intent": {}}
    }
  },
]"#;

fn write_raw(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("raw.json");
    std::fs::write(&path, content).unwrap();
    path
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
}

#[tokio::test]
async fn test_prepare_file_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = write_raw(&dir, RAW_WITH_TRAILING_COMMAS);
    let output = dir.path().join("out").join("processed.json");

    let preparer = BatchPreparer::new("INSTRUCTIONS", today())
        .with_normalizer(Some(Arc::new(RuleTimeNormalizer::new())), 2);
    let stats = preparer.prepare_file(&input, &output).await.unwrap();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.time_references, 2);
    assert_eq!(stats.normalized, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.flagged, 0);

    let written: Vec<ChatExample> =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written.len(), 3);

    let user = &written[1].messages[0];
    assert_eq!(user.role, "user");
    assert_eq!(
        user.content,
        "User Query: spreadsheets in drive from last month\n\nINSTRUCTIONS"
    );

    let model: serde_json::Value = serde_json::from_str(&written[1].messages[1].content).unwrap();
    assert_eq!(model["filters"]["startTime"], "2025-02-01T00:00:00");
    assert_eq!(model["filters"]["endTime"], "2025-02-28T23:59:59");

    // Vague phrasing has no window, so the original is kept
    let model: serde_json::Value = serde_json::from_str(&written[2].messages[1].content).unwrap();
    assert_eq!(model["filters"]["startTime"], "2024-01-01T00:00:00.000+05:30");
}

#[tokio::test]
async fn test_prepare_without_normalizer_keeps_times() {
    let dir = TempDir::new().unwrap();
    let input = write_raw(&dir, RAW_WITH_TRAILING_COMMAS);
    let output = dir.path().join("processed.json");

    let stats = BatchPreparer::new("INSTRUCTIONS", today())
        .prepare_file(&input, &output)
        .await
        .unwrap();
    assert_eq!(stats.normalized, 0);
    assert_eq!(stats.failed, 0);

    let written: Vec<ChatExample> =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert!(written[1].messages[1].content.contains("2024-06-01T00:00:00.000+05:30"));
    assert!(written[1].messages[1].content.starts_with(r#"{"answer":null,"queryRewrite":null"#));
}

#[test]
fn test_unrepairable_dataset_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = write_raw(&dir, r#"[{"query": "hi", "data": {"answer": "Hello"}"#);

    let err = load_raw(&input).unwrap_err();
    assert!(matches!(err, ScoutError::Dataset(DatasetError::Parse(_))));
}

#[test]
fn test_missing_dataset_file() {
    let dir = TempDir::new().unwrap();
    let err = load_raw(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ScoutError::Dataset(DatasetError::Read { .. })));
}

//! Training-data files: raw `[{query, data}]` examples in, chat-formatted
//! examples out.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DatasetError, Result};
use crate::query::TimeWindow;

// ============================================================================
// Raw Examples
// ============================================================================

/// A labelled example: a query and the record the model should emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExample {
    pub query: String,
    pub data: Value,
}

impl RawExample {
    /// `data.filters.startTime` and `data.filters.endTime`, when set.
    pub fn time_fields(&self) -> (Option<&str>, Option<&str>) {
        let filters = self.data.get("filters");
        let field = |name: &str| filters.and_then(|f| f.get(name)).and_then(Value::as_str);
        (field("startTime"), field("endTime"))
    }

    /// Whether either time field is non-null.
    pub fn has_time_reference(&self) -> bool {
        let (start, end) = self.time_fields();
        start.is_some() || end.is_some()
    }

    /// Overwrite both time fields with `window` in local `YYYY-MM-DDTHH:MM:SS` form.
    pub fn apply_window(&mut self, window: &TimeWindow) {
        if let Some(filters) = self.data.get_mut("filters").and_then(Value::as_object_mut) {
            filters.insert("startTime".to_string(), Value::String(window.start_local()));
            filters.insert("endTime".to_string(), Value::String(window.end_local()));
        }
    }
}

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("Invalid regex"));

/// Load raw examples from `path`.
pub fn load_raw(path: &Path) -> Result<Vec<RawExample>> {
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_raw(&content)
}

/// Parse raw examples, repairing trailing commas once if the first parse fails.
pub fn parse_raw(content: &str) -> Result<Vec<RawExample>> {
    let entries: Vec<Value> = match serde_json::from_str(content) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Dataset JSON malformed ({}), attempting trailing-comma repair", e);
            let repaired = TRAILING_COMMA.replace_all(content, "$1");
            serde_json::from_str(&repaired).map_err(DatasetError::Parse)?
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| to_example(index, entry))
        .collect()
}

fn to_example(index: usize, entry: Value) -> Result<RawExample> {
    let missing = |field: &str| DatasetError::MissingField {
        index,
        field: field.to_string(),
    };

    let Value::Object(mut map) = entry else {
        return Err(missing("query").into());
    };
    let query = match map.remove("query") {
        Some(Value::String(q)) => q,
        _ => return Err(missing("query").into()),
    };
    let data = match map.remove("data") {
        Some(data @ Value::Object(_)) => data,
        _ => return Err(missing("data").into()),
    };

    Ok(RawExample { query, data })
}

// ============================================================================
// Chat Examples
// ============================================================================

/// One message of a chat-formatted example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// A chat-formatted training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExample {
    pub messages: Vec<ChatMessage>,
}

/// Turn a labelled example into a user/model exchange.
///
/// The user message carries the query followed by the instruction prompt;
/// the model message is the compact JSON of `data`.
pub fn format_example(example: &RawExample, prompt: &str) -> Result<ChatExample> {
    Ok(ChatExample {
        messages: vec![
            ChatMessage {
                role: "user".to_string(),
                content: format!("User Query: {}\n\n{}", example.query, prompt),
            },
            ChatMessage {
                role: "model".to_string(),
                content: serde_json::to_string(&example.data)?,
            },
        ],
    })
}

/// Write chat examples to `path` as pretty-printed JSON.
pub fn write_output(path: &Path, examples: &[ChatExample]) -> Result<()> {
    let write_err = |source| DatasetError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(examples)?;
    std::fs::write(path, json).map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoutError;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_parse_clean() {
        let examples = parse_raw(r#"[{"query": "hi", "data": {"answer": "Hello!"}}]"#).unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].query, "hi");
        assert_eq!(examples[0].data["answer"], "Hello!");
    }

    #[test]
    fn test_trailing_comma_repair() {
        let content = r#"[
            {"query": "hi", "data": {"answer": "Hello!", "filters": {"app": null,},},},
        ]"#;
        let examples = parse_raw(content).unwrap();
        assert_eq!(examples.len(), 1);
    }

    #[test]
    fn test_unrepairable_json_fails() {
        let err = parse_raw(r#"[{"query": "hi" "data": {}}]"#).unwrap_err();
        assert!(matches!(err, ScoutError::Dataset(DatasetError::Parse(_))));
    }

    #[test]
    fn test_missing_field() {
        let err = parse_raw(r#"[{"query": "a", "data": {}}, {"data": {}}]"#).unwrap_err();
        match err {
            ScoutError::Dataset(DatasetError::MissingField { index, field }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "query");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_time_fields_and_apply_window() {
        let mut example = RawExample {
            query: "emails from last week".to_string(),
            data: json!({"filters": {"startTime": "2024-01-01T00:00:00.000+05:30", "endTime": null}}),
        };
        assert!(example.has_time_reference());

        let d = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        example.apply_window(&TimeWindow::days(d, d + chrono::Duration::days(7)));
        assert_eq!(
            example.time_fields(),
            (Some("2025-03-05T00:00:00"), Some("2025-03-12T23:59:59"))
        );
    }

    #[test]
    fn test_format_example() {
        let example = RawExample {
            query: "hi".to_string(),
            data: json!({"answer": "Hello!", "isFollowUp": false}),
        };
        let chat = format_example(&example, "PROMPT").unwrap();
        assert_eq!(chat.messages[0].role, "user");
        assert_eq!(chat.messages[0].content, "User Query: hi\n\nPROMPT");
        assert_eq!(chat.messages[1].role, "model");
        assert_eq!(chat.messages[1].content, r#"{"answer":"Hello!","isFollowUp":false}"#);
    }

    #[test]
    fn test_write_output_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/processed.json");
        let example = RawExample {
            query: "hi".to_string(),
            data: json!({}),
        };
        write_output(&path, &[format_example(&example, "P").unwrap()]).unwrap();

        let written: Vec<ChatExample> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
    }
}

//! Batch preparation of chat-formatted training data.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::query::{invariant_violations, ClassificationResult};

use super::dataset::{format_example, load_raw, write_output, ChatExample, RawExample};
use super::normalizer::TimeNormalizer;

/// Counters reported after a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareStats {
    /// Examples read
    pub total: usize,
    /// Examples carrying a time reference
    pub time_references: usize,
    /// Time references rewritten by the normalizer
    pub normalized: usize,
    /// Normalizer calls that failed and left the example unchanged
    pub failed: usize,
    /// Examples whose record breaks a routing invariant
    pub flagged: usize,
}

/// Outcome of one example.
enum TimeUpdate {
    Untouched,
    Normalized,
    Failed,
}

/// Turns labelled examples into chat-formatted training data.
pub struct BatchPreparer {
    normalizer: Option<Arc<dyn TimeNormalizer>>,
    max_concurrent: usize,
    prompt: String,
    current_date: NaiveDate,
}

impl BatchPreparer {
    /// Create a preparer without time normalization.
    pub fn new(prompt: impl Into<String>, current_date: NaiveDate) -> Self {
        Self {
            normalizer: None,
            max_concurrent: 1,
            prompt: prompt.into(),
            current_date,
        }
    }

    /// Normalize time references with `normalizer`, at most `max_concurrent` at a time.
    pub fn with_normalizer(
        mut self,
        normalizer: Option<Arc<dyn TimeNormalizer>>,
        max_concurrent: usize,
    ) -> Self {
        self.normalizer = normalizer;
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Prepare examples in memory. Output order matches input order.
    pub async fn prepare(
        &self,
        examples: Vec<RawExample>,
    ) -> Result<(Vec<ChatExample>, PrepareStats)> {
        let mut stats = PrepareStats {
            total: examples.len(),
            ..Default::default()
        };

        info!(
            total = stats.total,
            normalizer = self.normalizer.as_ref().map(|n| n.name()).unwrap_or("none"),
            "Preparing training examples"
        );

        let results: Vec<(RawExample, TimeUpdate)> = stream::iter(examples)
            .map(|example| self.normalize_one(example))
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut chats = Vec::with_capacity(results.len());
        for (index, (example, update)) in results.into_iter().enumerate() {
            if example.has_time_reference() {
                stats.time_references += 1;
            }
            match update {
                TimeUpdate::Normalized => stats.normalized += 1,
                TimeUpdate::Failed => stats.failed += 1,
                TimeUpdate::Untouched => {}
            }

            if self.audit(index, &example) {
                stats.flagged += 1;
            }

            chats.push(format_example(&example, &self.prompt)?);

            if (index + 1) % 100 == 0 {
                info!("Prepared {}/{} examples", index + 1, stats.total);
            }
        }

        info!(
            normalized = stats.normalized,
            failed = stats.failed,
            flagged = stats.flagged,
            "Updated {} of {} time references",
            stats.normalized,
            stats.time_references
        );

        Ok((chats, stats))
    }

    /// Load `input`, prepare it, and write the result to `output`.
    pub async fn prepare_file(&self, input: &Path, output: &Path) -> Result<PrepareStats> {
        let examples = load_raw(input)?;
        info!("Loaded {} examples from {}", examples.len(), input.display());

        let (chats, stats) = self.prepare(examples).await?;
        write_output(output, &chats)?;
        info!("Wrote {} examples to {}", chats.len(), output.display());

        Ok(stats)
    }

    async fn normalize_one(&self, mut example: RawExample) -> (RawExample, TimeUpdate) {
        let Some(normalizer) = &self.normalizer else {
            return (example, TimeUpdate::Untouched);
        };
        if !example.has_time_reference() {
            return (example, TimeUpdate::Untouched);
        }

        match normalizer.normalize(&example.query, self.current_date).await {
            Ok(window) => {
                debug!(
                    query = %example.query,
                    start = %window.start_local(),
                    end = %window.end_local(),
                    "Time reference normalized"
                );
                example.apply_window(&window);
                (example, TimeUpdate::Normalized)
            }
            Err(e) => {
                warn!(
                    query = %example.query,
                    normalizer = normalizer.name(),
                    "Keeping original time fields: {}",
                    e
                );
                (example, TimeUpdate::Failed)
            }
        }
    }

    /// Log routing-invariant violations; true when any were found.
    fn audit(&self, index: usize, example: &RawExample) -> bool {
        let Ok(record) = serde_json::from_value::<ClassificationResult>(example.data.clone()) else {
            return false;
        };
        let violations = invariant_violations(&example.query, &record);
        for violation in &violations {
            warn!(index, query = %example.query, "Training record: {}", violation);
        }
        !violations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NormalizerError;
    use crate::query::TimeWindow;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedNormalizer;

    #[async_trait]
    impl TimeNormalizer for FixedNormalizer {
        async fn normalize(&self, _query: &str, current_date: NaiveDate) -> Result<TimeWindow> {
            Ok(TimeWindow::day(current_date))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingNormalizer;

    #[async_trait]
    impl TimeNormalizer for FailingNormalizer {
        async fn normalize(&self, _query: &str, _current_date: NaiveDate) -> Result<TimeWindow> {
            Err(NormalizerError::Timeout.into())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    fn examples() -> Vec<RawExample> {
        vec![
            RawExample {
                query: "hi".to_string(),
                data: json!({"answer": "Hello!", "filters": {"startTime": null, "endTime": null}}),
            },
            RawExample {
                query: "files from today".to_string(),
                data: json!({"filters": {"startTime": "2023-01-01T00:00:00.000+05:30", "endTime": null}}),
            },
        ]
    }

    #[tokio::test]
    async fn test_without_normalizer() {
        let preparer = BatchPreparer::new("PROMPT", today());
        let (chats, stats) = preparer.prepare(examples()).await.unwrap();

        assert_eq!(chats.len(), 2);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.time_references, 1);
        assert_eq!(stats.normalized, 0);
        assert!(chats[1].messages[1].content.contains("2023-01-01"));
    }

    #[tokio::test]
    async fn test_normalizes_time_references() {
        let preparer = BatchPreparer::new("PROMPT", today())
            .with_normalizer(Some(Arc::new(FixedNormalizer)), 4);
        let (chats, stats) = preparer.prepare(examples()).await.unwrap();

        assert_eq!(stats.normalized, 1);
        assert_eq!(stats.failed, 0);
        assert!(chats[0].messages[0].content.starts_with("User Query: hi"));
        let model: serde_json::Value = serde_json::from_str(&chats[1].messages[1].content).unwrap();
        assert_eq!(model["filters"]["startTime"], "2025-03-12T00:00:00");
        assert_eq!(model["filters"]["endTime"], "2025-03-12T23:59:59");
    }

    #[tokio::test]
    async fn test_failure_keeps_original() {
        let preparer = BatchPreparer::new("PROMPT", today())
            .with_normalizer(Some(Arc::new(FailingNormalizer)), 2);
        let (chats, stats) = preparer.prepare(examples()).await.unwrap();

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.normalized, 0);
        assert!(chats[1].messages[1].content.contains("2023-01-01T00:00:00.000+05:30"));
    }

    #[tokio::test]
    async fn test_audit_flags_bad_records() {
        let bad = RawExample {
            query: "emails from John".to_string(),
            data: json!({
                "type": "GetItems",
                "filters": {"app": "gmail", "entity": "mail", "intent": {"from": ["john@acme.com"]}}
            }),
        };
        let preparer = BatchPreparer::new("PROMPT", today());
        let (_, stats) = preparer.prepare(vec![bad]).await.unwrap();
        assert_eq!(stats.flagged, 1);
    }
}

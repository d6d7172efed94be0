//! Time-normalization providers.
//!
//! Labelled examples go stale: a record written last year for "emails from
//! last week" carries last year's dates. A normalizer recomputes the window
//! relative to the preparation date.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::{NormalizerConfig, NormalizerProvider};
use crate::error::{NormalizerError, Result};
use crate::query::{TemporalReasoner, TimeWindow};

use super::llm::LlmTimeNormalizer;

/// Trait for time-normalization providers.
#[async_trait]
pub trait TimeNormalizer: Send + Sync {
    /// Resolve the time window `query` refers to, relative to `current_date`.
    async fn normalize(&self, query: &str, current_date: NaiveDate) -> Result<TimeWindow>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Deterministic normalizer backed by the temporal reasoner.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTimeNormalizer;

impl RuleTimeNormalizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TimeNormalizer for RuleTimeNormalizer {
    async fn normalize(&self, query: &str, current_date: NaiveDate) -> Result<TimeWindow> {
        TemporalReasoner::at_date(current_date)
            .resolve_window(query)
            .ok_or_else(|| NormalizerError::NoWindow.into())
    }

    fn name(&self) -> &str {
        "rules"
    }
}

/// Create a time normalizer from configuration.
///
/// Returns `None` for the `none` provider.
pub fn create_normalizer(config: &NormalizerConfig) -> Result<Option<Arc<dyn TimeNormalizer>>> {
    match config.provider {
        NormalizerProvider::None => Ok(None),
        NormalizerProvider::Rules => Ok(Some(Arc::new(RuleTimeNormalizer::new()))),
        NormalizerProvider::Llm => Ok(Some(Arc::new(LlmTimeNormalizer::from_config(config)?))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoutError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    #[tokio::test]
    async fn test_rules_resolve_window() {
        let window = RuleTimeNormalizer::new()
            .normalize("files from last month", today())
            .await
            .unwrap();
        assert_eq!(window.start_local(), "2025-02-01T00:00:00");
        assert_eq!(window.end_local(), "2025-02-28T23:59:59");
    }

    #[tokio::test]
    async fn test_rules_no_window() {
        let err = RuleTimeNormalizer::new()
            .normalize("emails about the budget", today())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::Normalizer(NormalizerError::NoWindow)));
    }

    #[test]
    fn test_create_normalizer() {
        let mut config = NormalizerConfig {
            provider: NormalizerProvider::None,
            ..Default::default()
        };
        assert!(create_normalizer(&config).unwrap().is_none());

        config.provider = NormalizerProvider::Rules;
        let normalizer = create_normalizer(&config).unwrap().unwrap();
        assert_eq!(normalizer.name(), "rules");

        config.provider = NormalizerProvider::Llm;
        config.api_key = Some("test-key".to_string());
        let normalizer = create_normalizer(&config).unwrap().unwrap();
        assert_eq!(normalizer.name(), "llm");
    }
}

//! Final assembly of a `ClassificationResult`.
//!
//! Every component's output funnels through here, and the record-level
//! invariants are enforced in one place:
//! - an answer clears all routing
//! - `temporalDirection` only accompanies `google-calendar`
//! - a non-empty intent only accompanies `gmail`/`mail` and an address
//! - `app`/`entity` are only set for a single detected pair

use super::detector::DetectorOutcome;
use super::discourse::DiscourseOutcome;
use super::temporal::TimeWindow;
use super::types::{
    App, ClassificationResult, Entity, Filters, MailIntent, QueryType, SortDirection,
    TemporalDirection,
};
use super::vocabulary::EMAIL_PATTERN;

/// Everything the routing components produced for one query.
#[derive(Debug, Clone)]
pub struct RoutedParts {
    pub detector: DetectorOutcome,
    pub query_type: QueryType,
    pub filter_query: Option<String>,
    pub intent: MailIntent,
    pub count: Option<u32>,
    pub window: Option<TimeWindow>,
    pub sort_direction: Option<SortDirection>,
    pub temporal_direction: Option<TemporalDirection>,
}

/// Result for a query answered directly.
pub fn assemble_answer(answer: String, discourse: &DiscourseOutcome) -> ClassificationResult {
    ClassificationResult::answered(answer)
        .with_follow_up(discourse.is_follow_up)
        .with_rewrite(discourse.query_rewrite.clone())
}

/// Result for a routed query.
pub fn assemble_routed(parts: RoutedParts, discourse: &DiscourseOutcome) -> ClassificationResult {
    let RoutedParts {
        detector,
        query_type,
        filter_query,
        intent,
        count,
        window,
        sort_direction,
        temporal_direction,
    } = parts;

    if detector == DetectorOutcome::Unsupported {
        return ClassificationResult {
            query_type: Some(QueryType::SearchWithoutFilters),
            filter_query,
            ..Default::default()
        }
        .with_follow_up(discourse.is_follow_up)
        .with_rewrite(discourse.query_rewrite.clone());
    }

    let mut filters = Filters {
        count,
        start_time: window.map(|w| w.start_time()),
        end_time: window.map(|w| w.end_time()),
        sort_direction,
        ..Default::default()
    };

    let filter_query = match query_type {
        QueryType::SearchWithoutFilters => filter_query,
        QueryType::GetItems => {
            filters.app = detector.app();
            filters.entity = detector.entity();
            filters.intent = gate_intent(intent, filters.app, filters.entity);
            None
        }
        QueryType::SearchWithFilters => {
            filters.app = detector.app();
            filters.entity = detector.entity();
            filter_query
        }
    };

    let temporal_direction = temporal_direction.filter(|_| filters.app == Some(App::GoogleCalendar));

    ClassificationResult {
        answer: None,
        query_rewrite: discourse.query_rewrite.clone(),
        temporal_direction,
        is_follow_up: discourse.is_follow_up,
        query_type: Some(query_type),
        filter_query,
        filters,
    }
}

/// Keep an intent only for gmail/mail with at least one valid address.
fn gate_intent(intent: MailIntent, app: Option<App>, entity: Option<Entity>) -> MailIntent {
    let is_mail = app == Some(App::Gmail) && entity == Some(Entity::Mail);
    let has_valid_address = intent.addresses().any(|a| EMAIL_PATTERN.is_match(a));
    if is_mail && has_valid_address {
        intent
    } else {
        MailIntent::default()
    }
}

/// Invariant violations in `result` against the query it was built from.
///
/// Empty for every record the engine produces. Used to audit records that
/// come from elsewhere, such as training data or model generations.
pub fn invariant_violations(query: &str, result: &ClassificationResult) -> Vec<String> {
    let mut violations = Vec::new();
    let filters = &result.filters;

    if result.answer.is_some() {
        if !filters.is_blank() {
            violations.push("answer is set but filters are not empty".to_string());
        }
        if result.query_type.is_some() {
            violations.push("answer is set but type is not null".to_string());
        }
        if result.filter_query.is_some() {
            violations.push("answer is set but filterQuery is not null".to_string());
        }
    } else if result.query_type.is_none() {
        violations.push("type is null without an answer".to_string());
    }

    let is_calendar = filters.app == Some(App::GoogleCalendar);
    if result.temporal_direction.is_some() != is_calendar {
        violations.push(format!(
            "temporalDirection {:?} does not match app {:?}",
            result.temporal_direction, filters.app
        ));
    }

    if !filters.intent.is_empty() {
        if filters.app != Some(App::Gmail) || filters.entity != Some(Entity::Mail) {
            violations.push("intent is set outside gmail/mail".to_string());
        }
        let query_has_address = query
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
            .any(|t| EMAIL_PATTERN.is_match(t));
        if !query_has_address {
            violations.push("intent is set but the query has no email address".to_string());
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn discourse() -> DiscourseOutcome {
        DiscourseOutcome {
            is_follow_up: false,
            query_rewrite: None,
            resolved_text: String::new(),
        }
    }

    fn parts(detector: DetectorOutcome, query_type: QueryType) -> RoutedParts {
        RoutedParts {
            detector,
            query_type,
            filter_query: Some("budget".to_string()),
            intent: MailIntent {
                from: vec!["john@acme.com".to_string()],
                ..Default::default()
            },
            count: Some(5),
            window: Some(TimeWindow::day(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())),
            sort_direction: Some(SortDirection::Desc),
            temporal_direction: Some(TemporalDirection::Next),
        }
    }

    #[test]
    fn test_search_without_filters_clears_app() {
        let result = assemble_routed(
            parts(DetectorOutcome::Multiple, QueryType::SearchWithoutFilters),
            &discourse(),
        );
        assert_eq!(result.filters.app, None);
        assert!(result.filters.intent.is_empty());
        assert_eq!(result.filters.count, Some(5));
        assert_eq!(result.temporal_direction, None);
        assert_eq!(result.filter_query.as_deref(), Some("budget"));
        assert_eq!(
            result.filters.start_time.as_deref(),
            Some("2025-01-15T00:00:00.000+05:30")
        );
    }

    #[test]
    fn test_get_items_keeps_intent_and_drops_filter_query() {
        let gmail = DetectorOutcome::Single {
            app: App::Gmail,
            entity: Some(Entity::Mail),
        };
        let result = assemble_routed(parts(gmail, QueryType::GetItems), &discourse());
        assert_eq!(result.filters.intent.from, vec!["john@acme.com"]);
        assert_eq!(result.filter_query, None);
        assert_eq!(result.temporal_direction, None);
    }

    #[test]
    fn test_intent_gated_outside_mail() {
        let drive = DetectorOutcome::Single {
            app: App::GoogleDrive,
            entity: None,
        };
        let result = assemble_routed(parts(drive, QueryType::GetItems), &discourse());
        assert!(result.filters.intent.is_empty());
    }

    #[test]
    fn test_direction_only_for_calendar() {
        let calendar = DetectorOutcome::Single {
            app: App::GoogleCalendar,
            entity: Some(Entity::Event),
        };
        let result = assemble_routed(parts(calendar, QueryType::SearchWithFilters), &discourse());
        assert_eq!(result.temporal_direction, Some(TemporalDirection::Next));
        assert!(result.filters.intent.is_empty());
    }

    #[test]
    fn test_unsupported_nulls_filters() {
        let result = assemble_routed(
            parts(DetectorOutcome::Unsupported, QueryType::SearchWithoutFilters),
            &discourse(),
        );
        assert!(result.filters.is_blank());
        assert_eq!(result.filter_query.as_deref(), Some("budget"));
        assert_eq!(result.query_type, Some(QueryType::SearchWithoutFilters));
    }

    #[test]
    fn test_answer_has_no_violations() {
        let result = assemble_answer("Hello!".to_string(), &discourse());
        assert!(invariant_violations("hi", &result).is_empty());
    }

    #[test]
    fn test_violations_detected() {
        let mut result = ClassificationResult {
            query_type: Some(QueryType::GetItems),
            temporal_direction: Some(TemporalDirection::Prev),
            ..Default::default()
        };
        result.filters.app = Some(App::Gmail);
        result.filters.entity = Some(Entity::Mail);
        result.filters.intent.from = vec!["john@acme.com".to_string()];

        let violations = invariant_violations("emails from John", &result);
        assert_eq!(violations.len(), 2);
    }
}

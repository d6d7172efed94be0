//! End-to-end classification tests.

use chrono::TimeZone;
use scout::query::ist;
use scout::{
    invariant_violations, App, ClassificationResult, ConversationHistory, ConversationTurn,
    CurrentContext, Entity, IntentClassifier, QueryType, SortDirection, TemporalDirection,
    UserIdentity,
};

/// Wednesday 12 March 2025, 10:30 IST.
fn ctx() -> CurrentContext {
    let now = ist().with_ymd_and_hms(2025, 3, 12, 10, 30, 0).unwrap();
    let user = UserIdentity {
        name: "Asha Rao".to_string(),
        email: "asha@acme.com".to_string(),
        company: "Acme".to_string(),
        domain: "acme.com".to_string(),
    };
    CurrentContext::new(user, now)
}

fn classify(query: &str) -> ClassificationResult {
    IntentClassifier::new().classify(query, &ConversationHistory::new(), &ctx())
}

fn three_documents() -> ConversationHistory {
    ConversationHistory::new()
        .with_turn(ConversationTurn::user("find my planning documents"))
        .with_turn(ConversationTurn::assistant(
            "I found three documents:\n1. Q3 Budget.xlsx\n2. Marketing Plan 2025.docx\n3. Hiring Roadmap.pdf",
        ))
}

#[test]
fn test_greeting_short_circuits() {
    let result = classify("Hi there, how are you?");

    assert!(result.answer.is_some());
    assert_eq!(result.query_type, None);
    assert_eq!(result.filter_query, None);
    assert_eq!(result.filters.app, None);
    assert!(result.filters.is_blank());
    assert!(!result.is_follow_up);
}

#[test]
fn test_exact_address_gets_items() {
    let result = classify("emails from john@acme.com");

    assert_eq!(result.query_type, Some(QueryType::GetItems));
    assert_eq!(result.filters.app, Some(App::Gmail));
    assert_eq!(result.filters.entity, Some(Entity::Mail));
    assert_eq!(result.filters.intent.from, vec!["john@acme.com"]);
    assert_eq!(result.filter_query, None);
    assert_eq!(result.temporal_direction, None);
}

#[test]
fn test_bare_name_searches_content() {
    let result = classify("emails from John about the budget");

    assert_eq!(result.query_type, Some(QueryType::SearchWithFilters));
    let keywords = result.filter_query.unwrap();
    assert!(keywords.contains("John"));
    assert!(keywords.contains("budget"));
    assert!(result.filters.intent.is_empty());
}

#[test]
fn test_several_apps_search_without_filters() {
    let result = classify("show me recent files and emails");

    assert_eq!(result.query_type, Some(QueryType::SearchWithoutFilters));
    assert_eq!(result.filters.sort_direction, Some(SortDirection::Desc));
    assert_eq!(result.filters.app, None);
    assert_eq!(result.temporal_direction, None);
}

#[test]
fn test_past_meeting_lookup() {
    let result = classify("when was my meeting with John");

    assert_eq!(result.filters.app, Some(App::GoogleCalendar));
    assert_eq!(result.temporal_direction, Some(TemporalDirection::Prev));
    assert_eq!(result.filters.start_time, None);
    assert_eq!(result.filters.end_time, None);
}

#[test]
fn test_no_app_cue() {
    let result = classify("what did Ravi say about pricing");

    assert_eq!(result.filters.app, None);
    assert_eq!(result.query_type, Some(QueryType::SearchWithoutFilters));
}

#[test]
fn test_sort_words_do_not_set_direction_outside_calendar() {
    let result = classify("my latest emails");
    assert_eq!(result.filters.sort_direction, Some(SortDirection::Desc));
    assert_eq!(result.temporal_direction, None);
}

#[test]
fn test_ordinal_follow_up_rewrites() {
    let result = IntentClassifier::new().classify(
        "tell me more about the second one",
        &three_documents(),
        &ctx(),
    );

    assert!(result.is_follow_up);
    assert!(result.answer.is_none());
    assert!(result
        .query_rewrite
        .as_deref()
        .unwrap()
        .contains("Marketing Plan 2025.docx"));
}

#[test]
fn test_unambiguous_queries_are_idempotent() {
    let classifier = IntentClassifier::new();
    let history = three_documents();

    for query in [
        "emails from John about the budget",
        "my oldest files in drive",
        "emails from john@acme.com",
    ] {
        let first = classifier.classify(query, &history, &ctx());
        let second = classifier.classify(query, &history, &ctx());
        assert_eq!(first, second);
        assert_eq!(first.query_rewrite, None, "{query}");
    }
}

#[test]
fn test_results_satisfy_invariants() {
    let classifier = IntentClassifier::new();
    let history = three_documents();

    for query in [
        "Hi there, how are you?",
        "what is 15% of 240",
        "emails from john@acme.com to priya@acme.com",
        "emails from John about the budget",
        "show me recent files and emails",
        "when was my meeting with John",
        "meetings next week",
        "budget spreadsheets in drive from last month",
        "open jira tickets about login",
        "summarize my emails from this week",
        "tell me more about the second one",
        "find Priya in my contacts",
    ] {
        let result = classifier.classify(query, &history, &ctx());
        let violations = invariant_violations(query, &result);
        assert!(violations.is_empty(), "{query}: {violations:?}");
    }
}

#[test]
fn test_wire_format() {
    let json = serde_json::to_value(classify("emails from john@acme.com")).unwrap();

    assert_eq!(json["type"], "GetItems");
    assert_eq!(json["isFollowUp"], false);
    assert_eq!(json["filters"]["app"], "gmail");
    assert_eq!(json["filters"]["entity"], "mail");
    assert_eq!(json["filters"]["intent"]["from"][0], "john@acme.com");
    assert!(json["filters"]["intent"].get("to").is_none());
    assert!(json["answer"].is_null());
}

#[test]
fn test_oversized_period_counts_set_no_window() {
    for query in [
        "meetings in the last 100000000 days",
        "emails from 4000000000 days ago",
        "files from the next 99999999999 weeks",
    ] {
        let result = classify(query);
        assert_eq!(result.filters.start_time, None, "{query}");
        assert_eq!(result.filters.end_time, None, "{query}");
        assert!(invariant_violations(query, &result).is_empty(), "{query}");
    }
}

#[test]
fn test_fresh_query_with_ordinal_is_not_follow_up() {
    let classifier = IntentClassifier::new();
    let history = three_documents();

    let result = classifier.classify("when was the last meeting with Priya", &history, &ctx());
    assert!(!result.is_follow_up);
    assert_eq!(result.query_rewrite, None);
    assert_eq!(result.filters.app, Some(App::GoogleCalendar));
    assert_eq!(result.temporal_direction, Some(TemporalDirection::Prev));
    let keywords = result.filter_query.unwrap_or_default();
    assert!(!keywords.contains("Roadmap"), "{keywords}");

    let result = classifier.classify("show me the first email", &history, &ctx());
    assert!(!result.is_follow_up);
    assert_eq!(result.query_rewrite, None);
}

#[test]
fn test_pronoun_after_greeting_is_not_follow_up() {
    let classifier = IntentClassifier::new();
    let greeting = classifier.classify("hi", &ConversationHistory::new(), &ctx());
    let history = ConversationHistory::new()
        .with_turn(ConversationTurn::user("hi"))
        .with_turn(ConversationTurn::assistant(greeting.answer.unwrap()));

    let result = classifier.classify("send it to Priya", &history, &ctx());
    assert!(!result.is_follow_up);
    assert_eq!(result.query_rewrite, None);
    assert!(result.answer.is_none());

    let result = classifier.classify("summarize", &history, &ctx());
    assert!(!result.is_follow_up);
    assert_eq!(result.query_rewrite, None);
}

#[test]
fn test_vague_command_is_rewritten_without_follow_up() {
    let history = ConversationHistory::new()
        .with_turn(ConversationTurn::user("how did the third quarter go"))
        .with_turn(ConversationTurn::assistant(
            "Revenue grew twelve percent in the third quarter. Costs stayed flat.",
        ));

    let result = IntentClassifier::new().classify("summarize", &history, &ctx());
    assert!(!result.is_follow_up);
    assert_eq!(
        result.query_rewrite.as_deref(),
        Some("summarize: Revenue grew twelve percent in the third quarter")
    );
}

#[test]
fn test_unsupported_sources_search_without_filters() {
    let result = classify("photos from the offsite");
    assert_eq!(result.query_type, Some(QueryType::SearchWithoutFilters));
    assert!(result.filters.is_blank());
    assert!(result.filter_query.unwrap().contains("offsite"));

    let result = classify("open jira tickets about login from last week");
    assert_eq!(result.query_type, Some(QueryType::SearchWithoutFilters));
    assert!(result.filters.is_blank());
    assert_eq!(result.temporal_direction, None);
    let keywords = result.filter_query.unwrap();
    assert!(keywords.contains("login"));
    assert!(!keywords.to_lowercase().contains("jira"));
}

#[test]
fn test_calendar_date_range() {
    let result = classify("meetings between March 3 and March 7");
    assert_eq!(result.filters.app, Some(App::GoogleCalendar));
    assert_eq!(result.filters.entity, Some(Entity::Event));
    assert_eq!(
        result.filters.start_time.as_deref(),
        Some("2025-03-03T00:00:00.000+05:30")
    );
    assert_eq!(
        result.filters.end_time.as_deref(),
        Some("2025-03-07T23:59:59.999+05:30")
    );
    assert_eq!(result.temporal_direction, Some(TemporalDirection::Prev));

    let result = classify("meetings from March 17 to March 21");
    assert_eq!(
        result.filters.start_time.as_deref(),
        Some("2025-03-17T00:00:00.000+05:30")
    );
    assert_eq!(
        result.filters.end_time.as_deref(),
        Some("2025-03-21T23:59:59.999+05:30")
    );
    assert_eq!(result.temporal_direction, Some(TemporalDirection::Next));
}

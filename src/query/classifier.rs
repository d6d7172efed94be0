//! Query Intent Classifier.
//!
//! Turns a raw utterance, the conversation history and the current context
//! into a single `ClassificationResult`. Classification is a pure function
//! of its inputs and never fails.

use std::sync::LazyLock;

use regex::Regex;

use super::assembler::{assemble_answer, assemble_routed, RoutedParts};
use super::conversation::ConversationalHandler;
use super::detector::{detect, Detection, DetectorOutcome};
use super::discourse::DiscourseAnalyzer;
use super::filter_query::{extract_count, extract_filter_query};
use super::intent::extract_intent;
use super::sort::infer_sort_direction;
use super::temporal::TemporalReasoner;
use super::types::*;
use super::vocabulary::words;
use crate::config::EngineConfig;

// ============================================================================
// Decision Table
// ============================================================================

/// Signals the decision table reads.
#[derive(Debug, Clone)]
pub struct Signals {
    pub detector: DetectorOutcome,
    pub open_ended: bool,
    pub has_identifier: bool,
    pub has_keywords: bool,
}

/// One row of the decision table.
pub struct Rule {
    pub name: &'static str,
    pub query_type: QueryType,
    pub applies: fn(&Signals) -> bool,
}

/// Structural rules, first match wins.
pub static RULES: &[Rule] = &[
    Rule {
        name: "broad-or-open-ended",
        query_type: QueryType::SearchWithoutFilters,
        applies: |s| !s.detector.is_single() || s.open_ended,
    },
    Rule {
        name: "exact-identifier",
        query_type: QueryType::GetItems,
        applies: |s| s.has_identifier,
    },
    Rule {
        name: "content-keywords",
        query_type: QueryType::SearchWithFilters,
        applies: |s| s.has_keywords,
    },
    Rule {
        name: "listing",
        query_type: QueryType::GetItems,
        applies: |_| true,
    },
];

/// Apply the decision table.
pub fn decide(signals: &Signals) -> &'static Rule {
    RULES
        .iter()
        .find(|rule| (rule.applies)(signals))
        .unwrap_or(&RULES[RULES.len() - 1])
}

// ============================================================================
// Intent Classifier
// ============================================================================

/// Classifies queries into structured search directives.
pub struct IntentClassifier {
    discourse: DiscourseAnalyzer,
    conversational: ConversationalHandler,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Create a classifier with default settings.
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// Create a classifier from engine settings.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            discourse: DiscourseAnalyzer::new(config.rewrite_gist_words),
            conversational: ConversationalHandler::new(config.assistant_name.clone()),
        }
    }

    /// Classify a query in the context of the conversation so far.
    pub fn classify(
        &self,
        query: &str,
        history: &ConversationHistory,
        ctx: &CurrentContext,
    ) -> ClassificationResult {
        let discourse = self.discourse.analyze(query, history);
        let text = discourse.resolved_text.as_str();

        if let Some(reply) = self.conversational.respond(text, history, ctx) {
            tracing::debug!(kind = ?reply.kind, "Answered conversationally");
            return assemble_answer(reply.answer, &discourse);
        }

        let tokens = words(text);
        let Detection {
            outcome: detector,
            unsupported_spans,
        } = detect(&tokens);

        let is_calendar = detector.app() == Some(App::GoogleCalendar);
        let temporal = TemporalReasoner::new(ctx.timestamp()).analyze(text, is_calendar);
        let sort_direction = infer_sort_direction(&tokens);
        let count = extract_count(text);

        let mut excluded = unsupported_spans;
        if let Some(c) = &count {
            excluded.push(c.span.clone());
        }
        let filter_query = extract_filter_query(text, &excluded);

        let intent = match detector {
            DetectorOutcome::Single {
                app: App::Gmail,
                entity: Some(Entity::Mail),
            } => extract_intent(text, &tokens),
            _ => MailIntent::default(),
        };

        let signals = Signals {
            detector,
            open_ended: OPEN_ENDED_PATTERN.is_match(text),
            has_identifier: intent.has_address(),
            has_keywords: filter_query.is_some(),
        };
        let rule = decide(&signals);

        tracing::debug!(
            rule = rule.name,
            query_type = %rule.query_type,
            detector = ?detector,
            follow_up = discourse.is_follow_up,
            "Query classified"
        );

        assemble_routed(
            RoutedParts {
                detector,
                query_type: rule.query_type,
                filter_query,
                intent,
                count: count.map(|c| c.count),
                window: temporal.window,
                sort_direction,
                temporal_direction: temporal.direction,
            },
            &discourse,
        )
    }
}

static OPEN_ENDED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:summari[sz]e|summary|summaries|overview|recap|catch\s+me\s+up|brief\s+me|what's\s+going\s+on|whats\s+going\s+on|what\s+is\s+going\s+on|discuss|discussed|discussion|discussions)\b",
    )
    .expect("Invalid regex")
});

//! Scout: Query Understanding Engine
//!
//! A rule-based query intent classifier for an enterprise search assistant.
//! Each user utterance, read against the conversation so far and the current
//! time, becomes a structured search directive: follow-up and rewrite
//! signals, a direct answer for conversational queries, or a routing record
//! with app, entity, time window, sort order, content keywords and exact
//! identifiers.

pub mod config;
pub mod error;
pub mod query;
pub mod training;

pub use config::Config;
pub use error::{ConfigError, DatasetError, NormalizerError, Result, ScoutError};
pub use query::{
    invariant_violations, App, ClassificationResult, ConversationHistory, ConversationTurn,
    CurrentContext, Entity, Filters, IntentClassifier, MailIntent, QueryType, Role,
    SortDirection, TemporalDirection, TemporalReasoner, TimeWindow, UserIdentity,
};
pub use training::{
    create_normalizer, render_prompt, BatchPreparer, ChatExample, PrepareStats, RawExample,
    TimeNormalizer,
};

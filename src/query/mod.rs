//! Query understanding engine.
//!
//! This module provides:
//! - Discourse analysis (follow-ups and ambiguous references)
//! - Direct answers for conversational queries
//! - Temporal, sort, app/entity, keyword and identifier extraction
//! - A decision table routing each query to one of three search shapes

pub mod assembler;
pub mod calculator;
pub mod classifier;
pub mod conversation;
pub mod detector;
pub mod discourse;
pub mod filter_query;
pub mod intent;
pub mod sort;
pub mod temporal;
pub mod types;
pub mod vocabulary;

pub use assembler::invariant_violations;
pub use classifier::*;
pub use temporal::{TemporalReasoner, TimeWindow};
pub use types::*;

//! Offline training-data preparation.
//!
//! Labelled `[{query, data}]` examples are turned into chat-formatted
//! examples for fine-tuning a model to emit `ClassificationResult` records.
//!
//! # Pipeline
//!
//! 1. Load and repair the raw dataset ([`load_raw`])
//! 2. Optionally recompute stale time windows with a [`TimeNormalizer`]
//! 3. Audit each record against the routing invariants
//! 4. Pair every query with the rendered instruction prompt ([`render_prompt`])
//!
//! # Example
//!
//! ```rust,ignore
//! use scout::training::{create_normalizer, render_prompt, BatchPreparer};
//!
//! let prompt = render_prompt(&ctx.user, ctx.timestamp());
//! let preparer = BatchPreparer::new(prompt, today)
//!     .with_normalizer(create_normalizer(&config.normalizer)?, 4);
//! let stats = preparer.prepare_file(&input, &output).await?;
//! ```

mod batch;
mod dataset;
mod llm;
mod normalizer;
mod prompt;

pub use batch::{BatchPreparer, PrepareStats};
pub use dataset::{
    format_example, load_raw, parse_raw, write_output, ChatExample, ChatMessage, RawExample,
};
pub use llm::{normalization_prompt, parse_reply, LlmTimeNormalizer, API_KEY_ENV};
pub use normalizer::{create_normalizer, RuleTimeNormalizer, TimeNormalizer};
pub use prompt::render_prompt;

//! CLI command handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::DateTime;
use scout::config::{NormalizerProvider, UserConfig};
use scout::training::{create_normalizer, render_prompt, BatchPreparer};
use scout::{Config, ConversationHistory, CurrentContext, IntentClassifier, UserIdentity};

use super::output;

/// Run the classify command.
pub fn run_classify(
    config: &Config,
    query: &str,
    history_path: Option<&str>,
    now: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let history = match history_path {
        Some(path) => load_history(path)?,
        None => ConversationHistory::new(),
    };
    let ctx = context(&config.user, now)?;

    let classifier = IntentClassifier::with_config(&config.engine);
    let result = classifier.classify(query, &history, &ctx);

    output::print_classification(query, &result, json_output)
}

/// Run the prepare command.
pub async fn run_prepare(
    mut config: Config,
    input: Option<String>,
    output_path: Option<String>,
    provider: Option<NormalizerProvider>,
    json_output: bool,
) -> Result<()> {
    if let Some(provider) = provider {
        config.normalizer.provider = provider;
    }

    let input = input.map(expand).unwrap_or_else(|| config.data_file());
    let output_path = output_path.map(expand).unwrap_or_else(|| config.output_file());

    let ctx = context(&config.user, None)?;
    let normalizer = create_normalizer(&config.normalizer)?;
    let prompt = render_prompt(&ctx.user, ctx.timestamp());
    let preparer = BatchPreparer::new(prompt, ctx.timestamp().date_naive())
        .with_normalizer(normalizer, config.normalizer.max_concurrent);

    let stats = preparer
        .prepare_file(&input, &output_path)
        .await
        .with_context(|| format!("Failed to prepare {}", input.display()))?;

    output::print_prepare_stats(&stats, &output_path, json_output)
}

/// Run the prompt command.
pub fn run_prompt(config: &Config, now: Option<&str>) -> Result<()> {
    let ctx = context(&config.user, now)?;
    println!("{}", render_prompt(&ctx.user, ctx.timestamp()));
    Ok(())
}

fn context(user: &UserConfig, now: Option<&str>) -> Result<CurrentContext> {
    let identity = UserIdentity {
        name: user.name.clone(),
        email: user.email.clone(),
        company: user.company.clone(),
        domain: user.domain.clone(),
    };

    match now {
        Some(ts) => {
            let now = DateTime::parse_from_rfc3339(ts)
                .with_context(|| format!("Invalid --now timestamp: {}", ts))?;
            Ok(CurrentContext::new(identity, now))
        }
        None => Ok(CurrentContext::now(identity)),
    }
}

fn load_history(path: &str) -> Result<ConversationHistory> {
    let path = expand(path.to_string());
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid history file {}", path.display()))
}

fn expand(path: String) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path).as_ref())
}

//! Chat-model time normalizer (OpenAI-compatible).

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::NormalizerConfig;
use crate::error::{NormalizerError, Result};
use crate::query::TimeWindow;

use super::normalizer::TimeNormalizer;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "SCOUT_LLM_API_KEY";

/// Time normalizer that asks a chat model to resolve the window.
pub struct LlmTimeNormalizer {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// OpenAI error response format.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Window as the model reports it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindowReply {
    start_time: Option<String>,
    end_time: Option<String>,
}

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("Invalid regex"));

impl LlmTimeNormalizer {
    /// Create a normalizer from configuration.
    pub fn from_config(config: &NormalizerConfig) -> Result<Self> {
        Self::from_config_with_env(config, |name| std::env::var(name).ok())
    }

    /// Like [`from_config`](Self::from_config), reading variables through `env`.
    pub fn from_config_with_env(
        config: &NormalizerConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| env(API_KEY_ENV))
            .ok_or_else(|| {
                NormalizerError::Api(format!(
                    "API key not provided and {} env var not set",
                    API_KEY_ENV
                ))
            })?;

        Self::new(&config.base_url, &config.model, &api_key, config.timeout_secs)
    }

    /// Create a normalizer with explicit parameters.
    pub fn new(base_url: &str, model: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| NormalizerError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NormalizerError::Timeout
                } else if e.is_connect() {
                    NormalizerError::Api(format!("Connection failed: {}", e))
                } else {
                    NormalizerError::Api(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let result: ChatResponse = response.json().await.map_err(|e| {
                NormalizerError::MalformedResponse(format!("Failed to parse response: {}", e))
            })?;

            result
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .ok_or_else(|| NormalizerError::MalformedResponse("no choices".to_string()).into())
        } else if status.as_u16() == 429 {
            Err(NormalizerError::RateLimited.into())
        } else {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                Err(NormalizerError::Api(format!(
                    "API error ({}): {}",
                    status, error_response.error.message
                ))
                .into())
            } else {
                Err(NormalizerError::Api(format!("API error ({}): {}", status, error_text)).into())
            }
        }
    }
}

#[async_trait]
impl TimeNormalizer for LlmTimeNormalizer {
    async fn normalize(&self, query: &str, current_date: NaiveDate) -> Result<TimeWindow> {
        let reply = self.complete(normalization_prompt(query, current_date)).await?;
        parse_reply(&reply, current_date)
    }

    fn name(&self) -> &str {
        "llm"
    }
}

/// Prompt asking for the window `query` refers to.
pub fn normalization_prompt(query: &str, current_date: NaiveDate) -> String {
    format!(
        "Today's date is {today}. Work out the time range the query below refers to.\n\n\
         Query: \"{query}\"\n\n\
         - \"last\" or \"past\" N days/weeks/months count backwards from today\n\
         - \"next\" N days/weeks count forwards from today\n\
         - \"last month\" or \"last year\" mean the previous calendar period\n\
         - ranges start at 00:00:00 and end at 23:59:59\n\n\
         Reply with JSON only, in the form \
         {{\"startTime\": \"YYYY-MM-DDTHH:MM:SS\" or null, \"endTime\": \"YYYY-MM-DDTHH:MM:SS\" or null}}",
        today = current_date.format("%Y-%m-%d"),
        query = query,
    )
}

/// Extract the window from a model reply.
///
/// A missing end closes the window at the end of `current_date`; a missing
/// start cannot be recovered.
pub fn parse_reply(reply: &str, current_date: NaiveDate) -> Result<TimeWindow> {
    let body = JSON_OBJECT
        .find(reply)
        .ok_or_else(|| NormalizerError::MalformedResponse("no JSON object in reply".to_string()))?;

    let window: WindowReply = serde_json::from_str(body.as_str())
        .map_err(|e| NormalizerError::MalformedResponse(e.to_string()))?;

    let start = window.start_time.as_deref().map(parse_time).transpose()?;
    let end = window.end_time.as_deref().map(parse_time).transpose()?;

    match (start, end) {
        (None, None) => Err(NormalizerError::NoWindow.into()),
        (None, Some(_)) => {
            Err(NormalizerError::MalformedResponse("endTime without startTime".to_string()).into())
        }
        (Some(start), end) => {
            let end = end.unwrap_or_else(|| {
                current_date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default())
            });
            if end < start {
                return Err(NormalizerError::MalformedResponse(format!(
                    "endTime {} precedes startTime {}",
                    end, start
                ))
                .into());
            }
            Ok(TimeWindow { start, end })
        }
    }
}

fn parse_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.naive_local()))
        .map_err(|e| NormalizerError::MalformedResponse(format!("bad timestamp {value:?}: {e}")).into())
}

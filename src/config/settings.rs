//! Configuration settings for Scout.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub user: UserConfig,
    pub normalizer: NormalizerConfig,
    pub dataset: DatasetConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("scout.toml"),
            PathBuf::from("config.toml"),
            dirs::config_dir()
                .map(|p| p.join("scout/config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".scout/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn validate(&self) -> Result<()> {
        if self.normalizer.provider == NormalizerProvider::Llm {
            if self.normalizer.base_url.is_empty() {
                return Err(ConfigError::MissingField("normalizer.base_url".to_string()).into());
            }
            if self.normalizer.model.is_empty() {
                return Err(ConfigError::MissingField("normalizer.model".to_string()).into());
            }
        }

        if self.normalizer.max_concurrent == 0 {
            return Err(
                ConfigError::Invalid("normalizer.max_concurrent must be > 0".to_string()).into(),
            );
        }

        if self.engine.rewrite_gist_words == 0 {
            return Err(
                ConfigError::Invalid("engine.rewrite_gist_words must be > 0".to_string()).into(),
            );
        }

        Ok(())
    }

    /// Expanded path of the raw training-data file.
    pub fn data_file(&self) -> PathBuf {
        expand_path(&self.dataset.data_file)
    }

    /// Expanded path the processed training data is written to.
    pub fn output_file(&self) -> PathBuf {
        expand_path(&self.dataset.output_file)
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Classification engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name the assistant uses for itself in conversational answers
    pub assistant_name: String,
    /// Maximum words of prior assistant content folded into a rewrite
    pub rewrite_gist_words: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assistant_name: "Scout".to_string(),
            rewrite_gist_words: 24,
        }
    }
}

/// Default user identity used when the caller does not supply one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub name: String,
    pub email: String,
    pub company: String,
    pub domain: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: "User".to_string(),
            email: String::new(),
            company: String::new(),
            domain: String::new(),
        }
    }
}

/// Time-normalizer provider for training-data preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizerProvider {
    /// Leave time fields untouched
    None,
    /// Recompute windows with the built-in temporal reasoner
    #[default]
    Rules,
    /// Ask an OpenAI-compatible chat model
    Llm,
}

/// Time-normalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Provider type: "none", "rules" or "llm"
    pub provider: NormalizerProvider,
    /// Chat-completions endpoint base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// API key (loaded from SCOUT_LLM_API_KEY if not set)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum in-flight normalizer requests
    pub max_concurrent: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            provider: NormalizerProvider::Rules,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_concurrent: 4,
        }
    }
}

/// Training-data file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Raw `[{query, data}]` examples
    pub data_file: String,
    /// Chat-formatted output
    pub output_file: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_file: "data/raw.json".to_string(),
            output_file: "data/processed.json".to_string(),
        }
    }
}

//! Error types for Scout.
//!
//! The classification engine itself is infallible; these errors cover
//! configuration loading and the offline training-data preparation path.

use thiserror::Error;

/// Main error type for Scout operations.
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Time normalizer error: {0}")]
    Normalizer(#[from] NormalizerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Training-data file errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write dataset {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset JSON (after trailing-comma repair): {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Dataset entry {index} is missing field '{field}'")]
    MissingField { index: usize, field: String },
}

/// Errors from a time-normalization provider.
#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No time window found in query")]
    NoWindow,
}

/// Result type alias for Scout operations.
pub type Result<T> = std::result::Result<T, ScoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScoutError::Config(ConfigError::MissingField("normalizer.base_url".to_string()));
        assert!(err.to_string().contains("normalizer.base_url"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ScoutError = io_err.into();
        assert!(matches!(err, ScoutError::Io(_)));

        let err: ScoutError = NormalizerError::Timeout.into();
        assert!(matches!(err, ScoutError::Normalizer(NormalizerError::Timeout)));
    }

    #[test]
    fn test_dataset_error_names_entry() {
        let err = DatasetError::MissingField {
            index: 3,
            field: "query".to_string(),
        };
        assert_eq!(err.to_string(), "Dataset entry 3 is missing field 'query'");
    }
}

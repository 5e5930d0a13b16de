//! Error types for Sparkify Lake
//!
//! This module defines the error hierarchy for the whole pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! A play event that matches no catalog entry is not an error and never
//! surfaces here.

use thiserror::Error;

/// The main error type for Sparkify Lake
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Ingestion Errors
    // ============================================================================
    #[error("Schema violation in '{source_path}': {message}")]
    Schema {
        source_path: String,
        message: String,
    },

    #[error("No input objects under '{location}' match '{pattern}'")]
    NoInput { location: String, pattern: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Invalid storage location '{location}': {message}")]
    InvalidLocation { location: String, message: String },

    #[error("Object store error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    #[error("Table '{table}' is incomplete (missing _SUCCESS marker)")]
    IncompleteTable { table: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a schema violation error for an input object
    pub fn schema(source_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            source_path: source_path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid location error
    pub fn location(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Check if this error comes from malformed input data
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Error::Schema { .. })
    }
}

/// Result type alias for Sparkify Lake
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::schema("song_data/A/A/A/TRAAA.json", "invalid type: string");
        assert_eq!(
            err.to_string(),
            "Schema violation in 'song_data/A/A/A/TRAAA.json': invalid type: string"
        );

        let err = Error::IncompleteTable {
            table: "tracks".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Table 'tracks' is incomplete (missing _SUCCESS marker)"
        );
    }

    #[test]
    fn test_is_schema_violation() {
        assert!(Error::schema("a.json", "bad").is_schema_violation());
        assert!(!Error::output("disk full").is_schema_violation());
        assert!(!Error::config("x").is_schema_violation());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }

    #[test]
    fn test_with_context_converts_source_errors() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let err = result
            .with_context(|| "Failed to read 'pipeline.yaml'".to_string())
            .unwrap_err();
        assert!(matches!(err, Error::Other(_)));
        assert_eq!(
            err.to_string(),
            "Failed to read 'pipeline.yaml': IO error: no such file"
        );

        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err = result.context("summary").unwrap_err();
        assert!(err.to_string().starts_with("summary: Failed to parse JSON:"));
    }
}

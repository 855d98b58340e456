//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("max_concurrent must be at least 1")]
    InvalidConcurrency,

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("max_upload_bytes must be at least 1")]
    InvalidUploadLimit,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}

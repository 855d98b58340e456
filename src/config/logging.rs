//! Logging configuration

use serde::Deserialize;

use super::error::ValidationError;

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Tracing subscriber settings
///
/// `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let level = self.level.trim().to_ascii_lowercase();
        if level.is_empty() {
            return Err(ValidationError::MissingRequired("LOGGING__LEVEL"));
        }
        if !LEVELS.contains(&level.as_str()) {
            return Err(ValidationError::InvalidLogLevel(self.level.clone()));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

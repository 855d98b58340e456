//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `FILE_CONVERTER` prefix and nested values use double underscores as separators.
//! Every section has defaults, so an empty environment yields a working setup.
//!
//! # Example
//!
//! ```no_run
//! use mr_file_converter::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Running up to {} conversions at once", config.conversion.max_concurrent);
//! ```

mod conversion;
mod error;
mod logging;
mod network;
mod session;
mod storage;
mod tools;

pub use conversion::{ConversionConfig, DEFAULT_MAX_UPLOAD_BYTES};
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use network::NetworkConfig;
pub use session::SessionConfig;
pub use storage::StorageConfig;
pub use tools::ToolsConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Work directory for scoped artifacts
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversion concurrency and timeouts
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// External programs
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Outbound HTTP settings
    #[serde(default)]
    pub network: NetworkConfig,

    /// Idle session eviction
    #[serde(default)]
    pub session: SessionConfig,

    /// Tracing output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `FILE_CONVERTER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `FILE_CONVERTER__CONVERSION__MAX_CONCURRENT=8` -> `conversion.max_concurrent = 8`
    /// - `FILE_CONVERTER__TOOLS__YT_DLP=/opt/bin/yt-dlp` -> `tools.yt_dlp = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("FILE_CONVERTER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.storage.validate()?;
        self.conversion.validate()?;
        self.tools.validate()?;
        self.network.validate()?;
        self.session.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

//! Conversion concurrency, timeout and upload size configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_TIMEOUT_SECS: u64 = 3_600;

/// Upload size accepted when nothing else is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Limits applied to every conversion
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    /// Conversions allowed to run at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Time limit for a single conversion in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How long to wait for a free slot in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Largest upload accepted for conversion, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl ConversionConfig {
    /// Get conversion timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get slot wait as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Validate conversion configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrent == 0 {
            return Err(ValidationError::InvalidConcurrency);
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ValidationError::InvalidTimeout("conversion"));
        }
        if self.acquire_timeout_secs == 0 || self.acquire_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ValidationError::InvalidTimeout("conversion slot"));
        }
        if self.max_upload_bytes == 0 {
            return Err(ValidationError::InvalidUploadLimit);
        }
        Ok(())
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            timeout_secs: default_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_concurrent() -> usize {
    4
}

fn default_timeout() -> u64 {
    120
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

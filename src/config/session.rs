//! Session lifetime configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Idle session eviction settings
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Sessions idle longer than this are evicted (seconds)
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// How often the eviction sweep runs (seconds)
    #[serde(default = "default_eviction_interval")]
    pub eviction_interval_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs)
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.idle_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("session idle"));
        }
        if self.eviction_interval_secs == 0 {
            return Err(ValidationError::InvalidTimeout("session eviction"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            eviction_interval_secs: default_eviction_interval(),
        }
    }
}

fn default_idle_timeout() -> u64 {
    1_800
}

fn default_eviction_interval() -> u64 {
    60
}

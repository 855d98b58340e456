//! Outbound HTTP configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Settings for probing and fetching webpages
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Accept invalid TLS certificates when probing user URLs
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl NetworkConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate network configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("network request"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ValidationError::MissingRequired("NETWORK__USER_AGENT"));
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            accept_invalid_certs: default_accept_invalid_certs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_request_timeout() -> u64 {
    15
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_user_agent() -> String {
    concat!("mr-file-converter/", env!("CARGO_PKG_VERSION")).to_string()
}

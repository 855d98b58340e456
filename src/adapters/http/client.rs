//! Shared reqwest client construction.

use crate::config::NetworkConfig;

/// Builds the HTTP client used for probing and fetching webpages.
pub fn build_http_client(config: &NetworkConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.user_agent.clone())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_with_default_config() {
        assert!(build_http_client(&NetworkConfig::default()).is_ok());
    }
}

//! HTTP reachability probe.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::ports::{ProbeError, UrlProbe};

/// Checks a URL with a GET request; any non-success status is a failure.
#[derive(Debug, Clone)]
pub struct HttpUrlProbe {
    client: reqwest::Client,
}

impl HttpUrlProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UrlProbe for HttpUrlProbe {
    async fn probe(&self, url: &Url) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "Probed URL");

        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::HttpStatus(status.as_u16()))
        }
    }
}

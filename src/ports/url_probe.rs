//! URL Probe Port - Reachability checks for webpage conversions.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Port for checking that a URL can be read before offering formats.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    async fn probe(&self, url: &Url) -> Result<(), ProbeError>;
}

/// Why a URL could not be read.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("server answered with HTTP {0}")]
    HttpStatus(u16),
}

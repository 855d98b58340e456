//! Media Resolver Port - Resolves video links to playable media.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::domain::conversation::MediaHandle;

/// Port for turning a user-supplied link into a `MediaHandle`.
///
/// Fails when the link does not point at a single playable video.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, url: &Url) -> Result<MediaHandle, ResolveError>;
}

/// Errors resolving a media link.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{url} is not a playable video")]
    NotMedia { url: String },

    #[error("required tool '{tool}' is not installed")]
    ToolMissing { tool: String },

    #[error("{tool} exited with status {status:?}: {stderr}")]
    ToolFailed {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("unexpected metadata: {0}")]
    Malformed(String),
}

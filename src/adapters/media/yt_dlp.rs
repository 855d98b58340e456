//! yt-dlp backed media resolver.
//!
//! Resolution only reads metadata (`--dump-single-json --skip-download`);
//! the download itself is a routed conversion.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;
use url::Url;

use crate::domain::conversation::MediaHandle;
use crate::ports::{MediaResolver, ResolveError};

#[derive(Debug, Deserialize)]
struct VideoMetadata {
    #[serde(rename = "_type")]
    kind: Option<String>,
    title: Option<String>,
    webpage_url: Option<String>,
}

/// Resolves links by asking yt-dlp for the video's metadata.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: String,
}

impl YtDlpResolver {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Turns yt-dlp's JSON output into a handle.
    pub fn parse_metadata(requested: &Url, json: &[u8]) -> Result<MediaHandle, ResolveError> {
        let metadata: VideoMetadata =
            serde_json::from_slice(json).map_err(|e| ResolveError::Malformed(e.to_string()))?;

        if matches!(metadata.kind.as_deref(), Some(kind) if kind != "video") {
            return Err(ResolveError::NotMedia {
                url: requested.to_string(),
            });
        }

        let watch_url = match metadata.webpage_url.as_deref() {
            Some(raw) => Url::parse(raw).map_err(|e| ResolveError::Malformed(e.to_string()))?,
            None => requested.clone(),
        };
        let title = metadata
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ResolveError::Malformed("missing title".to_string()))?;

        Ok(MediaHandle::new(watch_url, title))
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(&self, url: &Url) -> Result<MediaHandle, ResolveError> {
        let output = Command::new(&self.program)
            .args([
                "--dump-single-json",
                "--no-playlist",
                "--skip-download",
                "--no-warnings",
                url.as_str(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ResolveError::ToolMissing {
                    tool: self.program.clone(),
                },
                _ => ResolveError::ToolFailed {
                    tool: self.program.clone(),
                    status: None,
                    stderr: e.to_string(),
                },
            })?;

        if !output.status.success() {
            return Err(ResolveError::ToolFailed {
                tool: self.program.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let handle = Self::parse_metadata(url, &output.stdout)?;
        debug!(url = %url, title = %handle.title, "Resolved media link");
        Ok(handle)
    }
}

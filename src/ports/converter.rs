//! Converter Port - Opaque conversion operations.
//!
//! Routing tables map (source, target) format pairs onto `Converter`
//! implementations. The engine never looks inside a converter: it hands
//! over an input and an output path and gets back success or a typed error.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::ArtifactError;
use crate::domain::conversation::MediaHandle;
use crate::domain::formats::{FileFormat, MediaFormat, MediaSource, WebpageFormat, WebpageSource};
use crate::domain::routing::RoutingTable;

/// What a converter reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionInput {
    /// A downloaded upload on local disk.
    File(PathBuf),
    /// A validated webpage address.
    Url(Url),
    /// A resolved media link.
    Media(MediaHandle),
}

impl ConversionInput {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionInput::File(_) => "file",
            ConversionInput::Url(_) => "url",
            ConversionInput::Media(_) => "media",
        }
    }
}

impl fmt::Display for ConversionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionInput::File(path) => write!(f, "{}", path.display()),
            ConversionInput::Url(url) => write!(f, "{url}"),
            ConversionInput::Media(media) => write!(f, "{}", media.watch_url),
        }
    }
}

/// Port for a single conversion operation.
///
/// # Contract
///
/// - Reads `input` and writes the complete result to `output`.
/// - `output` already exists (empty) and lives in a scoped directory that
///   the caller deletes; converters may create sibling files there.
/// - Any failure (parse error, missing tool, unsupported structure) is a
///   `ConverterError`; converters never panic on bad input.
#[async_trait]
pub trait Converter: Send + Sync + fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn convert(&self, input: &ConversionInput, output: &Path) -> Result<(), ConverterError>;
}

/// Shared converter handle stored in routing tables.
pub type SharedConverter = Arc<dyn Converter>;

/// Routes of the file conversation.
pub type FileRoutes = RoutingTable<FileFormat, FileFormat, SharedConverter>;

/// Routes of the webpage conversation.
pub type WebpageRoutes = RoutingTable<WebpageSource, WebpageFormat, SharedConverter>;

/// Routes of the media conversation.
pub type MediaRoutes = RoutingTable<MediaSource, MediaFormat, SharedConverter>;

/// Errors from conversion operations.
#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {format}: {reason}")]
    Parse { format: String, reason: String },

    #[error("{structure} cannot be represented in the target format")]
    UnsupportedStructure { structure: String },

    #[error("{converter} cannot read {input} input")]
    UnsupportedInput {
        converter: String,
        input: &'static str,
    },

    #[error("required tool '{tool}' is not installed")]
    ToolMissing { tool: String },

    #[error("{tool} exited with status {status:?}: {stderr}")]
    ToolFailed {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("conversion timed out after {after:?}")]
    TimedOut { after: Duration },

    #[error("no conversion slot became free within {waited:?}")]
    Busy { waited: Duration },

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl ConverterError {
    pub fn parse(format: impl Into<String>, reason: impl fmt::Display) -> Self {
        ConverterError::Parse {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unsupported_input(converter: impl Into<String>, input: &ConversionInput) -> Self {
        ConverterError::UnsupportedInput {
            converter: converter.into(),
            input: input.kind(),
        }
    }
}

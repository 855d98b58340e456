//! Artifact Factory Port - Scoped temporary file creation.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::artifact::ScopedArtifact;

/// Port for creating scoped temporary artifacts.
///
/// # Contract
///
/// `create(base_name, suffix)` returns an artifact whose path is unique,
/// ends in `base_name.suffix`, exists as an empty file when returned, and is
/// removed when the artifact is dropped. Creation failures surface as
/// `ArtifactError` and are never retried here.
pub trait ArtifactFactory: Send + Sync {
    fn create(&self, base_name: &str, suffix: &str) -> Result<ScopedArtifact, ArtifactError>;
}

/// Errors creating a scoped artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("invalid artifact name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("failed to create artifact under {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ArtifactError::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArtifactError::Io {
            path: path.into(),
            source,
        }
    }
}

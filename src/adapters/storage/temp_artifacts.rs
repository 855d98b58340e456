//! Temp-directory Artifact Factory Adapter
//!
//! Creates every artifact in its own private directory under a configured
//! work root, so concurrent conversions never collide on file names and
//! deleting the directory removes everything a converter left behind.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::artifact::ScopedArtifact;
use crate::ports::{ArtifactError, ArtifactFactory};

const DIR_PREFIX: &str = "mfc-";

/// Artifact factory backed by `tempfile`.
#[derive(Debug, Clone)]
pub struct TempArtifactFactory {
    root: PathBuf,
}

impl TempArtifactFactory {
    /// Create a factory placing artifacts under `root`
    ///
    /// The root is created on first use if missing.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn validate_component(name: &str, value: &str) -> Result<(), ArtifactError> {
        if value.is_empty() {
            return Err(ArtifactError::invalid_name(name, "must not be empty"));
        }
        if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
            return Err(ArtifactError::invalid_name(value, "must be a bare name"));
        }
        Ok(())
    }
}

impl ArtifactFactory for TempArtifactFactory {
    fn create(&self, base_name: &str, suffix: &str) -> Result<ScopedArtifact, ArtifactError> {
        Self::validate_component("base_name", base_name)?;
        Self::validate_component("suffix", suffix)?;

        std::fs::create_dir_all(&self.root).map_err(|e| ArtifactError::io(&self.root, e))?;

        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir_in(&self.root)
            .map_err(|e| ArtifactError::io(&self.root, e))?;

        let artifact = ScopedArtifact::new(dir, &format!("{base_name}.{suffix}"));
        std::fs::File::create(artifact.path()).map_err(|e| ArtifactError::io(artifact.path(), e))?;

        debug!(path = %artifact.path().display(), "Created scoped artifact");
        Ok(artifact)
    }
}

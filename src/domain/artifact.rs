//! Scoped temporary artifacts.
//!
//! A `ScopedArtifact` owns a private temporary directory holding exactly one
//! file. Dropping the artifact removes both, so every exit path (success,
//! error, early return, cancellation) cleans up without explicit calls.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary file whose lifetime is bound to this value.
pub struct ScopedArtifact {
    dir: TempDir,
    path: PathBuf,
}

impl ScopedArtifact {
    /// Wraps a file living inside `dir`.
    ///
    /// `file_name` is joined onto the directory; it must be a bare file name.
    pub fn new(dir: TempDir, file_name: &str) -> Self {
        let path = dir.path().join(file_name);
        Self { dir, path }
    }

    /// Path of the artifact file. Valid only while `self` is alive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component, used as the display name on delivery.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// Directory that holds the artifact.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Deletes the artifact now, reporting I/O failures instead of
    /// swallowing them as `Drop` would.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

impl fmt::Debug for ScopedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedArtifact")
            .field("path", &self.path)
            .finish()
    }
}

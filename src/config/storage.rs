//! Scoped artifact storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where scoped artifacts are created
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Work directory for temporary artifacts (defaults to the system temp dir)
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.work_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__WORK_DIR"));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
        }
    }
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("mr-file-converter")
}

//! Repository-level settings shared by every process using the repository.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_FILE: &str = "repository.toml";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to read repository settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse repository settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Contents of `<repository>/repository.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Allow report servers to host the scheduler.
    pub use_scheduler: bool,
}

impl RepositoryConfig {
    /// Load settings from the repository root. A missing file yields defaults.
    pub fn load(root: &Path) -> Result<Self, RepositoryError> {
        let path = root.join(SETTINGS_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Repository settings not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RepositoryConfig::load(dir.path()).unwrap();
        assert!(!config.use_scheduler);
    }

    #[test]
    fn test_settings_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "use_scheduler = true\n").unwrap();
        assert!(RepositoryConfig::load(dir.path()).unwrap().use_scheduler);
    }

    #[test]
    fn test_invalid_settings_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "use_scheduler = \"maybe\"\n").unwrap();
        assert!(matches!(
            RepositoryConfig::load(dir.path()),
            Err(RepositoryError::Parse(_))
        ));
    }
}

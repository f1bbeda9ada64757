//! Shared report repository.
//!
//! Holds the repository-level settings read at startup and the web
//! application path, which the HTTP host publishes once it is serving. The
//! scheduler supervisor polls that path as its readiness signal.

pub mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::lifecycle::readiness::ReadinessProvider;

pub use settings::{RepositoryConfig, RepositoryError};

#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    config: RepositoryConfig,
    web_application_path: ArcSwapOption<String>,
}

impl Repository {
    pub fn new(root: PathBuf, config: RepositoryConfig) -> Self {
        Self {
            root,
            config,
            web_application_path: ArcSwapOption::empty(),
        }
    }

    /// Load the repository settings found under `root`.
    pub fn open(root: &Path) -> Result<Self, RepositoryError> {
        let config = RepositoryConfig::load(root)?;
        Ok(Self::new(root.to_path_buf(), config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Publish the web application path.
    ///
    /// The value is set at most once and never reverts; empty values and
    /// later calls are ignored. Returns whether this call set it.
    pub fn set_web_application_path(&self, path: impl Into<String>) -> bool {
        let path = path.into();
        if path.is_empty() {
            return false;
        }

        let previous = self
            .web_application_path
            .compare_and_swap(&None::<Arc<String>>, Some(Arc::new(path)));
        previous.is_none()
    }

    pub fn web_application_path(&self) -> Option<Arc<String>> {
        self.web_application_path.load_full()
    }
}

impl ReadinessProvider for Repository {
    fn ready_value(&self) -> Option<String> {
        self.web_application_path().map(|p| p.as_ref().clone())
    }
}

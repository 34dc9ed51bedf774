//! StorageConfig and store path resolution.

use crate::config::xdg;
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sled,
    /// Nothing survives the process; useful for dry runs
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Sled database directory; relative paths are taken from the workspace
    /// root. `None` uses `$XDG_DATA_HOME/lesson-catalog/store`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the database directory to an actual filesystem location.
    pub fn resolve_path(&self, workspace_root: &Path) -> Result<PathBuf, CatalogError> {
        match &self.path {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            Some(path) => Ok(workspace_root.join(path)),
            None => Ok(xdg::app_data_dir()?.join("store")),
        }
    }
}

//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::CatalogConfig;
use crate::error::CatalogError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the standard files and environment, then
    /// validate the configured schemas.
    pub fn load(workspace_root: &Path) -> Result<CatalogConfig, CatalogError> {
        let config = MergeService::load(workspace_root)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file (environment still applies).
    pub fn load_from_file(path: &Path) -> Result<CatalogConfig, CatalogError> {
        let config = MergeService::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> CatalogConfig {
        CatalogConfig::default()
    }
}

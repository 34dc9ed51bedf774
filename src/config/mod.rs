//! Configuration
//!
//! Layered with the `config` crate: built-in defaults, the global file
//! (`$XDG_CONFIG_HOME/lesson-catalog/config.toml`), the working directory's
//! `catalog.toml`, then `CATALOG__*` environment variables.

mod facade;

pub mod merge {
    pub(crate) mod merge_policy;
    pub mod service;
}

pub mod paths {
    pub mod xdg_root;
}

pub mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod workspace_file;
}

pub mod workspace {
    pub mod storage_paths;
}

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::storage_paths::{StorageConfig, StoreBackend};

use crate::catalog::DEFAULT_ROOT_LABEL;
use crate::error::CatalogError;
use crate::logging::LoggingConfig;
use crate::schema::{presets, PartitionSchema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_root_label() -> String {
    DEFAULT_ROOT_LABEL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub store: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// First breadcrumb label
    #[serde(default = "default_root_label")]
    pub root_label: String,

    /// Schemas keyed by catalog name; these replace presets of the same name
    #[serde(default)]
    pub catalogs: BTreeMap<String, PartitionSchema>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            store: StorageConfig::default(),
            logging: LoggingConfig::default(),
            root_label: default_root_label(),
            catalogs: BTreeMap::new(),
        }
    }
}

impl CatalogConfig {
    fn configured(&self, key: &str, schema: &PartitionSchema) -> Result<PartitionSchema, CatalogError> {
        let mut schema = schema.clone();
        if schema.catalog.is_empty() {
            schema.catalog = key.to_string();
        }
        if schema.catalog != key {
            return Err(CatalogError::Config(format!(
                "catalogs.{} declares catalog name '{}'",
                key, schema.catalog
            )));
        }
        schema.validate()?;
        Ok(schema)
    }

    /// Schema for `name`: the configured one if present, else the preset.
    pub fn schema(&self, name: &str) -> Result<PartitionSchema, CatalogError> {
        if let Some(schema) = self.catalogs.get(name) {
            return self.configured(name, schema);
        }
        presets::all()
            .into_iter()
            .find(|schema| schema.catalog == name)
            .ok_or_else(|| {
                CatalogError::Config(format!(
                    "Unknown catalog '{}'; known catalogs: {}",
                    name,
                    self.catalog_names().join(", ")
                ))
            })
    }

    /// Every available schema, presets first, overrides applied.
    pub fn schemas(&self) -> Result<Vec<PartitionSchema>, CatalogError> {
        let mut out = Vec::new();
        for preset in presets::all() {
            match self.catalogs.get(&preset.catalog) {
                Some(schema) => out.push(self.configured(&preset.catalog, schema)?),
                None => out.push(preset),
            }
        }
        for (key, schema) in &self.catalogs {
            if !out.iter().any(|s| &s.catalog == key) {
                out.push(self.configured(key, schema)?);
            }
        }
        Ok(out)
    }

    pub fn catalog_names(&self) -> Vec<String> {
        let mut names: Vec<String> = presets::all().into_iter().map(|s| s.catalog).collect();
        for key in self.catalogs.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
        names
    }

    /// Check every configured schema up front.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.schemas().map(|_| ())
    }
}

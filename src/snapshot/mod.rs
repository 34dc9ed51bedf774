//! Portable snapshots
//!
//! A snapshot carries part of a catalog to another store. Nodes and items are
//! identified by natural keys, never by database ids, so the same document can
//! be imported into any store of the same catalog and re-imported safely.

pub mod export;
pub mod import;

use crate::error::CatalogError;
use crate::types::PartitionAddress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub use export::{ExportScope, ExportSerializer};
pub use import::{ImportOptions, ImportRecord, ImportRecordError, ImportReconciler, ImportReport};

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub catalog: String,
    pub exported_at: DateTime<Utc>,
    /// Parents always precede their children
    pub nodes: Vec<SnapshotNode>,
    pub items: Vec<SnapshotItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub natural_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_natural_key: Option<String>,
    pub name: String,
    pub address: PartitionAddress,
    pub order: u32,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotItem {
    /// `None` for unfiled items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_natural_key: Option<String>,
    pub address: PartitionAddress,
    pub payload: Value,
}

impl Snapshot {
    pub fn new(catalog: impl Into<String>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            catalog: catalog.into(),
            exported_at: Utc::now(),
            nodes: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot, rejecting format versions this build cannot read.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let snapshot: Snapshot = serde_json::from_str(text)?;
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(CatalogError::Snapshot(format!(
                "unsupported snapshot format version {} (expected {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }
        Ok(snapshot)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), CatalogError> {
        fs::write(path, self.to_json_pretty()?).map_err(|e| {
            CatalogError::Snapshot(format!("failed to write {}: {}", path.display(), e))
        })
    }

    pub fn read_from(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|e| {
            CatalogError::Snapshot(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }
}

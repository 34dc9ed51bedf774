//! Partition Schemas
//!
//! Static description of a catalog's shape: the partition axis that roots
//! every tree, the selector axes crossed with it, and how deep administrators
//! may nest folders below them.

pub mod presets;

use crate::error::CatalogError;
use crate::types::PartitionAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Deepest folder nesting any catalog supports (lesson → sub-folder).
pub const MAX_NODE_DEPTH: u8 = 2;

/// A finite-domain classifier (level, category, topic, lesson number...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    /// Display label; falls back to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub values: Vec<String>,
}

impl Axis {
    pub fn new(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            label: None,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// One drill-down step a cursor can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// Choose a value of this axis. Index 0 is always the partition axis.
    Selector(&'a Axis),
    /// Choose a node at this depth (0 = root nodes).
    NodeLevel(usize),
}

/// Shape of one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSchema {
    /// Filled from the config key when left out of a config file
    #[serde(default)]
    pub catalog: String,
    pub partition: Axis,
    #[serde(default)]
    pub selectors: Vec<Axis>,
    /// 0 (items hang off the partition), 1 (lessons) or 2 (lessons with folders)
    pub max_depth: u8,
    /// Payload field used as the item natural key during import dedup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_key_field: Option<String>,
}

impl PartitionSchema {
    pub fn new(catalog: impl Into<String>, partition: Axis, max_depth: u8) -> Self {
        Self {
            catalog: catalog.into(),
            partition,
            selectors: Vec::new(),
            max_depth,
            item_key_field: None,
        }
    }

    pub fn with_selector(mut self, axis: Axis) -> Self {
        self.selectors.push(axis);
        self
    }

    pub fn with_item_key(mut self, field: impl Into<String>) -> Self {
        self.item_key_field = Some(field.into());
        self
    }

    /// Reject schemas a cursor could not walk.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.catalog.trim().is_empty() {
            return Err(CatalogError::Config("Catalog name cannot be empty".to_string()));
        }
        if self.max_depth > MAX_NODE_DEPTH {
            return Err(CatalogError::Config(format!(
                "Catalog '{}' max_depth must be at most {}, got {}",
                self.catalog, MAX_NODE_DEPTH, self.max_depth
            )));
        }

        let mut axis_names = HashSet::new();
        for axis in self.axes() {
            if axis.name.trim().is_empty() {
                return Err(CatalogError::Config(format!(
                    "Catalog '{}' has an axis with an empty name",
                    self.catalog
                )));
            }
            if !axis_names.insert(axis.name.as_str()) {
                return Err(CatalogError::Config(format!(
                    "Catalog '{}' declares axis '{}' twice",
                    self.catalog, axis.name
                )));
            }
            if axis.values.is_empty() {
                return Err(CatalogError::Config(format!(
                    "Axis '{}' of catalog '{}' has no values",
                    axis.name, self.catalog
                )));
            }
            let mut seen = HashSet::new();
            for value in &axis.values {
                if value.trim().is_empty() || !seen.insert(value.as_str()) {
                    return Err(CatalogError::Config(format!(
                        "Axis '{}' of catalog '{}' has an empty or duplicate value '{}'",
                        axis.name, self.catalog, value
                    )));
                }
            }
        }
        Ok(())
    }

    /// Partition axis followed by the selector axes, in drill-down order.
    pub fn axes(&self) -> impl Iterator<Item = &Axis> {
        std::iter::once(&self.partition).chain(self.selectors.iter())
    }

    /// Number of selector frames (partition included) before nodes begin.
    pub fn selector_steps(&self) -> usize {
        1 + self.selectors.len()
    }

    /// Longest frame stack a cursor over this schema may hold.
    pub fn max_cursor_depth(&self) -> usize {
        self.selector_steps() + self.max_depth as usize
    }

    /// The step taken by the frame at `index`, if the schema has one.
    pub fn step(&self, index: usize) -> Option<Step<'_>> {
        if index == 0 {
            return Some(Step::Selector(&self.partition));
        }
        if index < self.selector_steps() {
            return self.selectors.get(index - 1).map(Step::Selector);
        }
        let level = index - self.selector_steps();
        if level < self.max_depth as usize {
            Some(Step::NodeLevel(level))
        } else {
            None
        }
    }

    /// Whether a node may sit at `depth` (0 = root).
    pub fn allows_node_depth(&self, depth: usize) -> bool {
        depth < self.max_depth as usize
    }

    /// Check an address names a legal partition and every selector exactly once.
    pub fn validate_address(&self, address: &PartitionAddress) -> Result<(), CatalogError> {
        if !self.partition.contains(&address.partition) {
            return Err(CatalogError::InvalidDestination(format!(
                "'{}' is not a {} of catalog '{}'",
                address.partition,
                self.partition.display_label(),
                self.catalog
            )));
        }
        for axis in &self.selectors {
            match address.selectors.get(&axis.name) {
                Some(value) if axis.contains(value) => {}
                Some(value) => {
                    return Err(CatalogError::InvalidDestination(format!(
                        "'{}' is not a valid {} of catalog '{}'",
                        value,
                        axis.display_label(),
                        self.catalog
                    )))
                }
                None => {
                    return Err(CatalogError::InvalidDestination(format!(
                        "address {} is missing selector '{}'",
                        address, axis.name
                    )))
                }
            }
        }
        if let Some(extra) = address
            .selectors
            .keys()
            .find(|key| !self.selectors.iter().any(|axis| &axis.name == *key))
        {
            return Err(CatalogError::InvalidDestination(format!(
                "catalog '{}' has no selector '{}'",
                self.catalog, extra
            )));
        }
        Ok(())
    }
}

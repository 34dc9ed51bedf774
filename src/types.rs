//! Core identifiers and addresses shared by every catalog component.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// NodeId: store-assigned identity of a folder/lesson node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

/// ItemId: store-assigned identity of a leaf content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of whoever created a record. Checked by the caller's permission
/// predicate, never by the engine.
pub type ActorId = String;

/// Partition value plus every selector value that scopes a container.
///
/// Selector axes (category, topic, lesson number...) are folded into the
/// address instead of being stored as nodes. `BTreeMap` keeps the encoding
/// deterministic, which natural keys rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionAddress {
    pub partition: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selectors: BTreeMap<String, String>,
}

impl PartitionAddress {
    pub fn new(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            selectors: BTreeMap::new(),
        }
    }

    pub fn with_selector(mut self, axis: impl Into<String>, value: impl Into<String>) -> Self {
        self.selectors.insert(axis.into(), value.into());
        self
    }

    /// Canonical `partition[axis=value,...]` rendering used for keys and logs.
    pub fn canonical(&self) -> String {
        if self.selectors.is_empty() {
            return self.partition.clone();
        }
        let selectors: Vec<String> = self
            .selectors
            .iter()
            .map(|(axis, value)| format!("{}={}", axis, value))
            .collect();
        format!("{}[{}]", self.partition, selectors.join(","))
    }
}

impl fmt::Display for PartitionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// `(address, parent)` pair naming one sibling group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiblingGroup {
    pub address: PartitionAddress,
    pub parent: Option<NodeId>,
}

impl SiblingGroup {
    pub fn new(address: PartitionAddress, parent: Option<NodeId>) -> Self {
        Self { address, parent }
    }
}

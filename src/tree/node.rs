//! Node drafts and name rules

use crate::error::CatalogError;
use crate::types::{NodeId, PartitionAddress};

/// Everything needed to create a node; the store assigns id and order.
#[derive(Debug, Clone)]
pub struct NodeDraft {
    pub address: PartitionAddress,
    pub parent_id: Option<NodeId>,
    pub name: String,
    pub locked: bool,
    pub hidden: bool,
}

impl NodeDraft {
    pub fn new(address: PartitionAddress, parent_id: Option<NodeId>, name: impl Into<String>) -> Self {
        Self {
            address,
            parent_id,
            name: name.into(),
            locked: false,
            hidden: false,
        }
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

/// Trim and reject empty names.
pub fn validate_name(name: &str) -> Result<String, CatalogError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::InvalidName("Node name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

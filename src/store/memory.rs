//! In-process backend. Used by tests, the `memory` config backend, and
//! callers that persist snapshots themselves.

use super::{CatalogStore, ContentItem, Node, WriteBatch, WriteOp};
use crate::error::StorageError;
use crate::types::{ItemId, NodeId, PartitionAddress};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct MemoryState {
    nodes: BTreeMap<NodeId, Node>,
    items: BTreeMap<ItemId, ContentItem>,
}

/// `CatalogStore` held entirely in memory. A batch is applied under one
/// write lock, so readers never observe half of it.
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn item_count(&self) -> usize {
        self.state.read().items.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for MemoryStore {
    fn next_id(&self) -> Result<u64, StorageError> {
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn get_node(&self, id: NodeId) -> Result<Option<Node>, StorageError> {
        Ok(self.state.read().nodes.get(&id).cloned())
    }

    fn get_item(&self, id: ItemId) -> Result<Option<ContentItem>, StorageError> {
        Ok(self.state.read().items.get(&id).cloned())
    }

    fn nodes_at(&self, address: &PartitionAddress) -> Result<Vec<Node>, StorageError> {
        Ok(self
            .state
            .read()
            .nodes
            .values()
            .filter(|node| &node.address == address)
            .cloned()
            .collect())
    }

    fn items_at(&self, address: &PartitionAddress) -> Result<Vec<ContentItem>, StorageError> {
        Ok(self
            .state
            .read()
            .items
            .values()
            .filter(|item| &item.address == address)
            .cloned()
            .collect())
    }

    fn items_by_node(&self, node: NodeId) -> Result<Vec<ContentItem>, StorageError> {
        Ok(self
            .state
            .read()
            .items
            .values()
            .filter(|item| item.node_id == Some(node))
            .cloned()
            .collect())
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let mut state = self.state.write();
        for op in batch.into_ops() {
            match op {
                WriteOp::PutNode(node) => {
                    state.nodes.insert(node.id, node);
                }
                WriteOp::RemoveNode(id) => {
                    state.nodes.remove(&id);
                }
                WriteOp::PutItem(item) => {
                    state.items.insert(item.id, item);
                }
                WriteOp::RemoveItem(id) => {
                    state.items.remove(&id);
                }
            }
        }
        Ok(())
    }
}

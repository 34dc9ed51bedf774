//! Fixtures shared by unit tests.

use crate::catalog::Catalog;
use crate::error::StorageError;
use crate::schema::presets;
use crate::store::{CatalogStore, ContentItem, MemoryStore, Node, WriteBatch};
use crate::types::{ItemId, NodeId, PartitionAddress};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use parking_lot::Mutex;

pub fn n5() -> PartitionAddress {
    PartitionAddress::new("N5")
}

pub fn vocabulary_catalog() -> Catalog {
    Catalog::new(presets::vocabulary(), Arc::new(MemoryStore::new())).unwrap()
}

/// Memory store whose writes can be made to fail on demand.
pub struct FlakyStore {
    inner: MemoryStore,
    fail_next: AtomicBool,
    poisoned_items: Mutex<HashSet<ItemId>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_next: AtomicBool::new(false),
            poisoned_items: Mutex::new(HashSet::new()),
        }
    }

    /// The next `apply` call fails without writing anything.
    pub fn fail_next_apply(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Every batch that writes this item fails.
    pub fn poison_item(&self, id: ItemId) {
        self.poisoned_items.lock().insert(id);
    }
}

impl CatalogStore for FlakyStore {
    fn next_id(&self) -> Result<u64, StorageError> {
        self.inner.next_id()
    }

    fn get_node(&self, id: NodeId) -> Result<Option<Node>, StorageError> {
        self.inner.get_node(id)
    }

    fn get_item(&self, id: ItemId) -> Result<Option<ContentItem>, StorageError> {
        self.inner.get_item(id)
    }

    fn nodes_at(&self, address: &PartitionAddress) -> Result<Vec<Node>, StorageError> {
        self.inner.nodes_at(address)
    }

    fn items_at(&self, address: &PartitionAddress) -> Result<Vec<ContentItem>, StorageError> {
        self.inner.items_at(address)
    }

    fn items_by_node(&self, node: NodeId) -> Result<Vec<ContentItem>, StorageError> {
        self.inner.items_by_node(node)
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StorageError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Backend("injected failure".to_string()));
        }
        let poisoned = self.poisoned_items.lock();
        let touches_poisoned = batch.ops().iter().any(|op| match op {
            crate::store::WriteOp::PutItem(item) => poisoned.contains(&item.id),
            crate::store::WriteOp::RemoveItem(id) => poisoned.contains(id),
            _ => false,
        });
        if touches_poisoned {
            return Err(StorageError::Backend("poisoned item".to_string()));
        }
        drop(poisoned);
        self.inner.apply(batch)
    }
}

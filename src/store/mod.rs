//! Catalog Record Store
//!
//! Persistence port for Node and ContentItem records. The engine only needs
//! keyed get, listing by address, and an atomic multi-record write; every
//! backend provides those and nothing more.

pub mod memory;
pub mod persistence;

use crate::error::StorageError;
use crate::types::{ActorId, ItemId, NodeId, PartitionAddress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::MemoryStore;
pub use persistence::SledStore;

/// Folder/lesson record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub address: PartitionAddress,
    pub parent_id: Option<NodeId>,
    pub name: String,
    /// 1-based position within the `(address, parent_id)` sibling group
    pub order: u32,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub hidden: bool,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
}

/// Leaf record. The payload is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,
    pub address: PartitionAddress,
    /// `None` = unfiled, attached directly to the address
    pub node_id: Option<NodeId>,
    pub payload: serde_json::Value,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
}

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    PutNode(Node),
    RemoveNode(NodeId),
    PutItem(ContentItem),
    RemoveItem(ItemId),
}

/// Writes that a backend applies all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_node(&mut self, node: Node) {
        self.ops.push(WriteOp::PutNode(node));
    }

    pub fn remove_node(&mut self, id: NodeId) {
        self.ops.push(WriteOp::RemoveNode(id));
    }

    pub fn put_item(&mut self, item: ContentItem) {
        self.ops.push(WriteOp::PutItem(item));
    }

    pub fn remove_item(&mut self, id: ItemId) {
        self.ops.push(WriteOp::RemoveItem(id));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Persistence backend for one catalog.
pub trait CatalogStore: Send + Sync {
    /// Allocate a fresh record id; never reused.
    fn next_id(&self) -> Result<u64, StorageError>;

    fn get_node(&self, id: NodeId) -> Result<Option<Node>, StorageError>;

    fn get_item(&self, id: ItemId) -> Result<Option<ContentItem>, StorageError>;

    /// Every node stored under `address`, in no particular order.
    fn nodes_at(&self, address: &PartitionAddress) -> Result<Vec<Node>, StorageError>;

    /// Every item stored under `address`, filed or not, in no particular order.
    fn items_at(&self, address: &PartitionAddress) -> Result<Vec<ContentItem>, StorageError>;

    /// Items whose `node_id` is `node`.
    fn items_by_node(&self, node: NodeId) -> Result<Vec<ContentItem>, StorageError>;

    /// Apply every write or none of them. Removing a missing record is not an error.
    fn apply(&self, batch: WriteBatch) -> Result<(), StorageError>;

    fn put_node(&self, node: &Node) -> Result<(), StorageError> {
        let mut batch = WriteBatch::new();
        batch.put_node(node.clone());
        self.apply(batch)
    }

    fn put_item(&self, item: &ContentItem) -> Result<(), StorageError> {
        let mut batch = WriteBatch::new();
        batch.put_item(item.clone());
        self.apply(batch)
    }

    fn remove_item(&self, id: ItemId) -> Result<(), StorageError> {
        let mut batch = WriteBatch::new();
        batch.remove_item(id);
        self.apply(batch)
    }

    /// Sibling group sorted by `order`, ties broken by id.
    fn children_of(
        &self,
        address: &PartitionAddress,
        parent: Option<NodeId>,
    ) -> Result<Vec<Node>, StorageError> {
        let mut children: Vec<Node> = self
            .nodes_at(address)?
            .into_iter()
            .filter(|node| node.parent_id == parent)
            .collect();
        sort_siblings(&mut children);
        Ok(children)
    }

    /// Items attached at one container, oldest first.
    fn items_in_container(
        &self,
        address: &PartitionAddress,
        node: Option<NodeId>,
    ) -> Result<Vec<ContentItem>, StorageError> {
        let mut items = match node {
            Some(node_id) => self.items_by_node(node_id)?,
            None => self
                .items_at(address)?
                .into_iter()
                .filter(|item| item.node_id.is_none())
                .collect(),
        };
        sort_items(&mut items);
        Ok(items)
    }
}

pub(crate) fn sort_siblings(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
}

pub(crate) fn sort_items(items: &mut [ContentItem]) {
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

//! Sled-backed catalog store
//!
//! One sled tree per catalog. Records are JSON-encoded under a one-byte kind
//! prefix followed by the big-endian id, so prefix scans walk one kind in id
//! order. Batches go through `Tree::apply_batch`, which sled applies
//! atomically.

use super::{CatalogStore, ContentItem, Node, WriteBatch, WriteOp};
use crate::error::StorageError;
use crate::types::{ItemId, NodeId, PartitionAddress};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

const NODE_PREFIX: u8 = b'n';
const ITEM_PREFIX: u8 = b'i';

fn record_key(prefix: u8, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(prefix);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn decode<T: DeserializeOwned>(key: &[u8], value: &[u8]) -> Result<T, StorageError> {
    serde_json::from_slice(value).map_err(|e| StorageError::Corrupt {
        key: hex::encode(key),
        reason: e.to_string(),
    })
}

/// `CatalogStore` persisted in a sled database.
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledStore {
    /// Open (or create) the database at `path` and the tree for `catalog`.
    pub fn open(path: &Path, catalog: &str) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::from_db(db, catalog)
    }

    /// Use an already-open database; several catalogs can share one.
    pub fn from_db(db: sled::Db, catalog: &str) -> Result<Self, StorageError> {
        let tree = db.open_tree(format!("catalog/{}", catalog))?;
        debug!(catalog = catalog, "Opened sled catalog tree");
        Ok(Self { db, tree })
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.tree.flush()?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: Vec<u8>) -> Result<Option<T>, StorageError> {
        match self.tree.get(&key)? {
            Some(value) => decode(&key, &value).map(Some),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(
        &self,
        prefix: u8,
        mut keep: impl FnMut(&T) -> bool,
    ) -> Result<Vec<T>, StorageError> {
        let mut out = Vec::new();
        for entry in self.tree.scan_prefix([prefix]) {
            let (key, value) = entry?;
            let record: T = decode(&key, &value)?;
            if keep(&record) {
                out.push(record);
            }
        }
        Ok(out)
    }
}

impl CatalogStore for SledStore {
    fn next_id(&self) -> Result<u64, StorageError> {
        // generate_id starts at 0; keep 0 free so ids read naturally
        Ok(self.db.generate_id()? + 1)
    }

    fn get_node(&self, id: NodeId) -> Result<Option<Node>, StorageError> {
        self.get(record_key(NODE_PREFIX, id.0))
    }

    fn get_item(&self, id: ItemId) -> Result<Option<ContentItem>, StorageError> {
        self.get(record_key(ITEM_PREFIX, id.0))
    }

    fn nodes_at(&self, address: &PartitionAddress) -> Result<Vec<Node>, StorageError> {
        self.scan(NODE_PREFIX, |node: &Node| &node.address == address)
    }

    fn items_at(&self, address: &PartitionAddress) -> Result<Vec<ContentItem>, StorageError> {
        self.scan(ITEM_PREFIX, |item: &ContentItem| &item.address == address)
    }

    fn items_by_node(&self, node: NodeId) -> Result<Vec<ContentItem>, StorageError> {
        self.scan(ITEM_PREFIX, |item: &ContentItem| item.node_id == Some(node))
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let op_count = batch.len();
        let mut sled_batch = sled::Batch::default();
        for op in batch.into_ops() {
            match op {
                WriteOp::PutNode(node) => {
                    sled_batch.insert(record_key(NODE_PREFIX, node.id.0), serde_json::to_vec(&node)?);
                }
                WriteOp::RemoveNode(id) => sled_batch.remove(record_key(NODE_PREFIX, id.0)),
                WriteOp::PutItem(item) => {
                    sled_batch.insert(record_key(ITEM_PREFIX, item.id.0), serde_json::to_vec(&item)?);
                }
                WriteOp::RemoveItem(id) => sled_batch.remove(record_key(ITEM_PREFIX, id.0)),
            }
        }
        self.tree.apply_batch(sled_batch)?;
        debug!(ops = op_count, "Applied sled write batch");
        Ok(())
    }
}

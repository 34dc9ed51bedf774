//! Content items
//!
//! Leaf records attached to a node or, while an address has no folders yet,
//! directly to the address ("unfiled"). A container holds either items or
//! child nodes; item writes enforce that side of the rule.

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::store::ContentItem;
use crate::types::{ItemId, NodeId, PartitionAddress};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

pub struct ItemStore<'a> {
    catalog: &'a Catalog,
}

impl<'a> ItemStore<'a> {
    pub(crate) fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn create(
        &self,
        address: &PartitionAddress,
        node_id: Option<NodeId>,
        payload: Value,
        created_by: &str,
    ) -> Result<ContentItem, CatalogError> {
        self.ensure_leaf_bearing(address, node_id)?;
        let store = self.catalog.store();
        let item = ContentItem {
            id: ItemId(store.next_id()?),
            address: address.clone(),
            node_id,
            payload,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        store.put_item(&item)?;
        info!(item_id = %item.id, address = %item.address, node = ?item.node_id, "Item created");
        Ok(item)
    }

    pub fn get(&self, id: ItemId) -> Result<ContentItem, CatalogError> {
        self.catalog
            .store()
            .get_item(id)?
            .ok_or_else(|| CatalogError::item_not_found(id))
    }

    /// Merge `patch` into the payload and return the updated item.
    pub fn update(&self, id: ItemId, patch: Value) -> Result<ContentItem, CatalogError> {
        let mut item = self.get(id)?;
        merge_payload(&mut item.payload, patch);
        self.catalog.store().put_item(&item)?;
        debug!(item_id = %id, "Item payload updated");
        Ok(item)
    }

    pub fn delete(&self, id: ItemId) -> Result<(), CatalogError> {
        let item = self.get(id)?;
        self.catalog.store().remove_item(item.id)?;
        info!(item_id = %id, "Item deleted");
        Ok(())
    }

    pub fn list_by_node(&self, node_id: NodeId) -> Result<Vec<ContentItem>, CatalogError> {
        let node = self.catalog.tree().get_node(node_id)?;
        Ok(self
            .catalog
            .store()
            .items_in_container(&node.address, Some(node.id))?)
    }

    pub fn list_unfiled(&self, address: &PartitionAddress) -> Result<Vec<ContentItem>, CatalogError> {
        Ok(self.catalog.store().items_in_container(address, None)?)
    }

    /// Check that `(address, node)` may hold items right now.
    pub fn ensure_leaf_bearing(
        &self,
        address: &PartitionAddress,
        node_id: Option<NodeId>,
    ) -> Result<(), CatalogError> {
        self.catalog.schema().validate_address(address)?;
        let store = self.catalog.store();
        match node_id {
            Some(id) => {
                let node = store.get_node(id)?.ok_or_else(|| {
                    CatalogError::InvalidDestination(format!("node {} does not exist", id))
                })?;
                if &node.address != address {
                    return Err(CatalogError::InvalidDestination(format!(
                        "node {} belongs to {}, not {}",
                        id, node.address, address
                    )));
                }
                if !store.children_of(address, Some(id))?.is_empty() {
                    return Err(CatalogError::InvalidDestination(format!(
                        "node '{}' has sub-folders; add items to one of them",
                        node.name
                    )));
                }
            }
            None => {
                if !store.children_of(address, None)?.is_empty() {
                    return Err(CatalogError::InvalidDestination(format!(
                        "{} has folders; items must go into a folder",
                        address
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Shallow merge: object patches overwrite keys (`null` removes one); any
/// other patch replaces the payload.
pub fn merge_payload(payload: &mut Value, patch: Value) {
    match (payload, patch) {
        (Value::Object(target), Value::Object(fields)) => {
            for (key, value) in fields {
                if value.is_null() {
                    target.remove(&key);
                } else {
                    target.insert(key, value);
                }
            }
        }
        (target, replacement) => *target = replacement,
    }
}

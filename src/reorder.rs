//! Sibling reordering (drag-and-drop)

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::store::{Node, WriteBatch};
use crate::types::{NodeId, PartitionAddress};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct ReorderOutcome {
    /// The sibling group in its new order
    pub siblings: Vec<Node>,
    /// Rows whose order was rewritten
    pub changed: usize,
}

/// Move `dragged` to the index `target` held, then number the group 1..=N.
///
/// `siblings` must be one group in order. Both ids must belong to it.
pub fn plan_reorder(siblings: &[Node], dragged: NodeId, target: NodeId) -> Result<Vec<Node>, CatalogError> {
    let position = |id: NodeId| {
        siblings.iter().position(|n| n.id == id).ok_or_else(|| {
            CatalogError::InvalidDestination(format!(
                "node {} is not in this sibling group; drag between parents is not supported",
                id
            ))
        })
    };
    let from = position(dragged)?;
    let to = position(target)?;

    let mut planned = siblings.to_vec();
    let moving = planned.remove(from);
    planned.insert(to, moving);
    for (index, node) in planned.iter_mut().enumerate() {
        node.order = index as u32 + 1;
    }
    Ok(planned)
}

pub struct SiblingReorderer<'a> {
    catalog: &'a Catalog,
}

impl<'a> SiblingReorderer<'a> {
    pub(crate) fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Drop `dragged` onto `target` within the group `(address, parent)`.
    pub fn reorder(
        &self,
        address: &PartitionAddress,
        parent_id: Option<NodeId>,
        dragged: NodeId,
        target: NodeId,
    ) -> Result<ReorderOutcome, CatalogError> {
        let tree = self.catalog.tree();
        tree.get_node(dragged)?;
        tree.get_node(target)?;

        let lock = self.catalog.locks().get_lock(address, parent_id);
        let _guard = lock.write();

        let store = self.catalog.store();
        let siblings = store.children_of(address, parent_id)?;
        if dragged == target {
            if !siblings.iter().any(|n| n.id == dragged) {
                return Err(CatalogError::InvalidDestination(format!(
                    "node {} is not in this sibling group",
                    dragged
                )));
            }
            debug!(node_id = %dragged, "Dropped onto itself; nothing to reorder");
            return Ok(ReorderOutcome { siblings, changed: 0 });
        }

        let planned = plan_reorder(&siblings, dragged, target)?;
        let before: HashMap<NodeId, u32> = siblings.iter().map(|n| (n.id, n.order)).collect();
        let mut batch = WriteBatch::new();
        for node in &planned {
            if before.get(&node.id) != Some(&node.order) {
                batch.put_node(node.clone());
            }
        }
        let changed = batch.len();
        if !batch.is_empty() {
            store.apply(batch)?;
        }
        info!(
            address = %address,
            parent = ?parent_id,
            dragged = %dragged,
            target = %target,
            changed,
            "Siblings reordered"
        );
        Ok(ReorderOutcome { siblings: planned, changed })
    }

    /// Same as `reorder`, taking the group from the dragged node.
    pub fn reorder_nodes(&self, dragged: NodeId, target: NodeId) -> Result<ReorderOutcome, CatalogError> {
        let node = self.catalog.tree().get_node(dragged)?;
        self.reorder(&node.address, node.parent_id, dragged, target)
    }
}

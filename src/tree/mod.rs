//! Lesson Tree
//!
//! Owns Node records: creation with dense sibling order, in-place edits,
//! ordered listing, and cascading delete.

pub mod natural_key;
pub mod node;

use crate::catalog::Catalog;
use crate::error::{CascadeOp, CatalogError, RecordId};
use crate::store::{sort_siblings, Node, WriteBatch};
use crate::types::{NodeId, PartitionAddress};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{error, info};

pub use natural_key::{item_natural_key, node_natural_key, normalize_name};
pub use node::{validate_name, NodeDraft};

/// Outcome of a cascading delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub node_id: NodeId,
    pub nodes_removed: usize,
    pub items_removed: usize,
    /// Remaining siblings whose order changed to close the gap
    pub siblings_renumbered: usize,
}

pub struct TreeStore<'a> {
    catalog: &'a Catalog,
}

impl<'a> TreeStore<'a> {
    pub(crate) fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Create a node at the end of its sibling group.
    pub fn create_node(
        &self,
        address: &PartitionAddress,
        parent_id: Option<NodeId>,
        name: &str,
        created_by: &str,
    ) -> Result<Node, CatalogError> {
        self.create_from_draft(NodeDraft::new(address.clone(), parent_id, name), created_by)
    }

    /// Create a node from a draft carrying lock/hide flags.
    pub fn create_from_draft(&self, draft: NodeDraft, created_by: &str) -> Result<Node, CatalogError> {
        let schema = self.catalog.schema();
        let store = self.catalog.store();
        schema.validate_address(&draft.address)?;
        let name = validate_name(&draft.name)?;

        let depth = match draft.parent_id {
            None => 0,
            Some(parent_id) => {
                let parent = store.get_node(parent_id)?.ok_or_else(|| {
                    CatalogError::InvalidParent(format!("parent node {} does not exist", parent_id))
                })?;
                if parent.address != draft.address {
                    return Err(CatalogError::InvalidParent(format!(
                        "parent node {} belongs to {}, not {}",
                        parent_id, parent.address, draft.address
                    )));
                }
                self.depth_of(&parent)? + 1
            }
        };
        if !schema.allows_node_depth(depth) {
            return Err(CatalogError::InvalidParent(format!(
                "catalog '{}' allows {} folder level(s); a node at depth {} is not allowed",
                schema.catalog,
                schema.max_depth,
                depth + 1
            )));
        }

        let lock = self.catalog.locks().get_lock(&draft.address, draft.parent_id);
        let _guard = lock.write();

        let siblings = store.children_of(&draft.address, draft.parent_id)?;
        // A container holds items or folders, never both
        if siblings.is_empty()
            && !store
                .items_in_container(&draft.address, draft.parent_id)?
                .is_empty()
        {
            let container = match draft.parent_id {
                Some(parent_id) => format!("node {}", parent_id),
                None => draft.address.to_string(),
            };
            return Err(CatalogError::InvalidDestination(format!(
                "{} holds items; move them out before adding a folder",
                container
            )));
        }
        let order = siblings.iter().map(|n| n.order).max().unwrap_or(0) + 1;

        let node = Node {
            id: NodeId(store.next_id()?),
            address: draft.address,
            parent_id: draft.parent_id,
            name,
            order,
            locked: draft.locked,
            hidden: draft.hidden,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        };
        store.put_node(&node)?;
        info!(
            node_id = %node.id,
            address = %node.address,
            parent = ?node.parent_id,
            order = node.order,
            "Node created"
        );
        Ok(node)
    }

    pub fn get_node(&self, id: NodeId) -> Result<Node, CatalogError> {
        self.catalog
            .store()
            .get_node(id)?
            .ok_or_else(|| CatalogError::node_not_found(id))
    }

    pub fn rename_node(&self, id: NodeId, name: &str) -> Result<Node, CatalogError> {
        let name = validate_name(name)?;
        self.update_node(id, |node| node.name = name)
    }

    pub fn set_locked(&self, id: NodeId, locked: bool) -> Result<Node, CatalogError> {
        self.update_node(id, |node| node.locked = locked)
    }

    pub fn set_hidden(&self, id: NodeId, hidden: bool) -> Result<Node, CatalogError> {
        self.update_node(id, |node| node.hidden = hidden)
    }

    fn update_node(&self, id: NodeId, edit: impl FnOnce(&mut Node)) -> Result<Node, CatalogError> {
        let mut node = self.get_node(id)?;
        edit(&mut node);
        self.catalog.store().put_node(&node)?;
        info!(node_id = %id, name = %node.name, locked = node.locked, hidden = node.hidden, "Node updated");
        Ok(node)
    }

    /// Sibling group ordered by `order`.
    pub fn list_children(
        &self,
        address: &PartitionAddress,
        parent_id: Option<NodeId>,
    ) -> Result<Vec<Node>, CatalogError> {
        Ok(self.catalog.store().children_of(address, parent_id)?)
    }

    pub fn list_roots(&self, address: &PartitionAddress) -> Result<Vec<Node>, CatalogError> {
        self.list_children(address, None)
    }

    pub fn has_children(
        &self,
        address: &PartitionAddress,
        parent_id: Option<NodeId>,
    ) -> Result<bool, CatalogError> {
        Ok(!self.list_children(address, parent_id)?.is_empty())
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, node: &Node) -> Result<Vec<Node>, CatalogError> {
        let store = self.catalog.store();
        let mut chain = Vec::new();
        let mut seen = HashSet::from([node.id]);
        let mut next = node.parent_id;
        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                return Err(CatalogError::InvalidParent(format!(
                    "parent chain of node {} loops through {}",
                    node.id, parent_id
                )));
            }
            let parent = store.get_node(parent_id)?.ok_or_else(|| {
                CatalogError::InvalidParent(format!(
                    "node {} references missing parent {}",
                    node.id, parent_id
                ))
            })?;
            next = parent.parent_id;
            chain.push(parent);
        }
        Ok(chain)
    }

    /// 0 for roots.
    pub fn depth_of(&self, node: &Node) -> Result<usize, CatalogError> {
        Ok(self.ancestors(node)?.len())
    }

    /// Node and all descendants, parents before children, siblings in order.
    pub fn subtree(&self, root: &Node) -> Result<Vec<Node>, CatalogError> {
        let by_parent = children_index(self.catalog.store().nodes_at(&root.address)?);
        Ok(walk_subtree(root.clone(), &by_parent))
    }

    /// Remove a node, its descendants and every item under them, then close
    /// the gap in the node's sibling group. One atomic batch; if it fails the
    /// error lists what is still present and the call can be repeated.
    pub fn delete_node(&self, id: NodeId) -> Result<DeleteReport, CatalogError> {
        let store = self.catalog.store();
        let node = self.get_node(id)?;

        let lock = self.catalog.locks().get_lock(&node.address, node.parent_id);
        let _guard = lock.write();

        let by_parent = children_index(store.nodes_at(&node.address)?);
        let doomed_nodes = walk_subtree(node.clone(), &by_parent);
        let doomed_ids: HashSet<NodeId> = doomed_nodes.iter().map(|n| n.id).collect();
        let doomed_items: Vec<_> = store
            .items_at(&node.address)?
            .into_iter()
            .filter(|item| item.node_id.map_or(false, |nid| doomed_ids.contains(&nid)))
            .map(|item| item.id)
            .collect();

        let mut batch = WriteBatch::new();
        for item_id in &doomed_items {
            batch.remove_item(*item_id);
        }
        // Deepest first, root last
        for doomed in doomed_nodes.iter().rev() {
            batch.remove_node(doomed.id);
        }

        let mut siblings_renumbered = 0;
        let remaining = by_parent
            .get(&node.parent_id)
            .map(|siblings| siblings.iter().filter(|s| s.id != id).cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        for (index, mut sibling) in remaining.into_iter().enumerate() {
            let order = index as u32 + 1;
            if sibling.order != order {
                sibling.order = order;
                batch.put_node(sibling);
                siblings_renumbered += 1;
            }
        }

        if let Err(e) = store.apply(batch) {
            error!(node_id = %id, error = %e, "Cascading delete failed");
            let mut still_present = Vec::new();
            for item_id in &doomed_items {
                if store.get_item(*item_id)?.is_some() {
                    still_present.push(RecordId::Item(*item_id));
                }
            }
            for doomed in &doomed_nodes {
                if store.get_node(doomed.id)?.is_some() {
                    still_present.push(RecordId::Node(doomed.id));
                }
            }
            if still_present.is_empty() {
                return Err(e.into());
            }
            let total = doomed_items.len() + doomed_nodes.len();
            return Err(CatalogError::PartialCascadeFailure {
                operation: CascadeOp::DeleteNode,
                completed: total - still_present.len(),
                remaining: still_present,
            });
        }

        let removed: Vec<NodeId> = doomed_nodes.iter().map(|n| n.id).collect();
        self.catalog.locks().forget_children_of(&node.address, &removed);

        info!(
            node_id = %id,
            nodes_removed = doomed_nodes.len(),
            items_removed = doomed_items.len(),
            siblings_renumbered,
            "Node deleted"
        );
        Ok(DeleteReport {
            node_id: id,
            nodes_removed: doomed_nodes.len(),
            items_removed: doomed_items.len(),
            siblings_renumbered,
        })
    }
}

/// Group nodes by parent, each group sorted by order.
pub(crate) fn children_index(nodes: Vec<Node>) -> HashMap<Option<NodeId>, Vec<Node>> {
    let mut by_parent: HashMap<Option<NodeId>, Vec<Node>> = HashMap::new();
    for node in nodes {
        by_parent.entry(node.parent_id).or_default().push(node);
    }
    for group in by_parent.values_mut() {
        sort_siblings(group);
    }
    by_parent
}

/// Pre-order walk with an explicit stack; tolerates cycles in stored data.
pub(crate) fn walk_subtree(root: Node, by_parent: &HashMap<Option<NodeId>, Vec<Node>>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !seen.insert(node.id) {
            continue;
        }
        if let Some(children) = by_parent.get(&Some(node.id)) {
            stack.extend(children.iter().rev().cloned());
        }
        out.push(node);
    }
    out
}

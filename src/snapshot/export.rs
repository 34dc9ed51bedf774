use super::{Snapshot, SnapshotItem, SnapshotNode};
use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::store::Node;
use crate::tree::node_natural_key;
use crate::types::{NodeId, PartitionAddress};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// What part of the catalog to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    /// These nodes with their subtrees; non-root nodes become roots
    Nodes(Vec<NodeId>),
    /// Every node and item at the address, unfiled items included
    Partition(PartitionAddress),
}

pub struct ExportSerializer<'a> {
    catalog: &'a Catalog,
}

impl<'a> ExportSerializer<'a> {
    pub(crate) fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn export(&self, scope: &ExportScope) -> Result<Snapshot, CatalogError> {
        let tree = self.catalog.tree();
        let mut snapshot = Snapshot::new(self.catalog.name());

        let roots = match scope {
            ExportScope::Nodes(ids) => {
                let mut requested = Vec::new();
                for id in ids {
                    requested.push(tree.get_node(*id)?);
                }
                let wanted: HashSet<NodeId> = requested.iter().map(|n| n.id).collect();
                let mut roots = Vec::new();
                let mut taken = HashSet::new();
                for node in requested {
                    // Already exported as part of a requested ancestor's subtree
                    let covered = tree
                        .ancestors(&node)?
                        .iter()
                        .any(|ancestor| wanted.contains(&ancestor.id));
                    if !covered && taken.insert(node.id) {
                        roots.push(node);
                    }
                }
                roots
            }
            ExportScope::Partition(address) => {
                self.catalog.schema().validate_address(address)?;
                let store = self.catalog.store();
                for item in store.items_in_container(address, None)? {
                    snapshot.items.push(SnapshotItem {
                        node_natural_key: None,
                        address: item.address,
                        payload: item.payload,
                    });
                }
                tree.list_roots(address)?
            }
        };

        for root in roots {
            self.push_subtree(&mut snapshot, root)?;
        }

        info!(
            catalog = %snapshot.catalog,
            nodes = snapshot.nodes.len(),
            items = snapshot.items.len(),
            "Snapshot exported"
        );
        Ok(snapshot)
    }

    /// Append `root` (as a snapshot root) and its subtree, parents first.
    fn push_subtree(&self, snapshot: &mut Snapshot, root: Node) -> Result<(), CatalogError> {
        let store = self.catalog.store();
        let root_id = root.id;
        let mut keys: HashMap<NodeId, String> = HashMap::new();
        for node in self.catalog.tree().subtree(&root)? {
            let parent_key = if node.id == root_id {
                None
            } else {
                node.parent_id.and_then(|p| keys.get(&p).cloned())
            };
            let key = node_natural_key(&node.name, &node.address, parent_key.as_deref());
            for item in store.items_in_container(&node.address, Some(node.id))? {
                snapshot.items.push(SnapshotItem {
                    node_natural_key: Some(key.clone()),
                    address: item.address,
                    payload: item.payload,
                });
            }
            keys.insert(node.id, key.clone());
            snapshot.nodes.push(SnapshotNode {
                natural_key: key,
                parent_natural_key: parent_key,
                name: node.name,
                address: node.address,
                order: node.order,
                locked: node.locked,
                hidden: node.hidden,
            });
        }
        Ok(())
    }
}

//! Recursive item counts
//!
//! A count covers the items attached directly at a container plus everything
//! under its descendant nodes. Counting loads an address's nodes and items
//! once, so a whole sibling list costs one pass.

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::store::{sort_siblings, Node};
use crate::tree::children_index;
use crate::types::{NodeId, PartitionAddress};
use std::collections::{HashMap, HashSet};

/// Node adjacency and direct item counts for one address.
struct Census {
    children: HashMap<Option<NodeId>, Vec<NodeId>>,
    direct: HashMap<Option<NodeId>, usize>,
}

impl Census {
    fn load(catalog: &Catalog, address: &PartitionAddress) -> Result<(Self, Vec<Node>), CatalogError> {
        let store = catalog.store();
        let nodes = store.nodes_at(address)?;
        let mut children: HashMap<Option<NodeId>, Vec<NodeId>> = HashMap::new();
        for node in &nodes {
            children.entry(node.parent_id).or_default().push(node.id);
        }
        let mut direct: HashMap<Option<NodeId>, usize> = HashMap::new();
        for item in store.items_at(address)? {
            *direct.entry(item.node_id).or_insert(0) += 1;
        }
        Ok((Self { children, direct }, nodes))
    }

    /// Depth-first total from `start`; no depth bound, cycle-safe.
    fn total_from(&self, start: Option<NodeId>) -> usize {
        let mut total = 0;
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(container) = stack.pop() {
            if let Some(id) = container {
                if !seen.insert(id) {
                    continue;
                }
            }
            total += self.direct.get(&container).copied().unwrap_or(0);
            if let Some(kids) = self.children.get(&container) {
                stack.extend(kids.iter().map(|id| Some(*id)));
            }
        }
        total
    }

    /// Subtree totals for every node, each subtree summed once.
    fn subtree_totals(&self, nodes: &[Node]) -> HashMap<NodeId, usize> {
        let mut totals: HashMap<NodeId, usize> = HashMap::new();
        for node in nodes {
            if totals.contains_key(&node.id) {
                continue;
            }
            // Iterative post-order: a node is summed after all its children
            let mut stack = vec![(node.id, false)];
            let mut on_path = HashSet::new();
            while let Some((id, expanded)) = stack.pop() {
                if totals.contains_key(&id) {
                    continue;
                }
                let kids = self.children.get(&Some(id));
                if expanded {
                    let from_children: usize = kids
                        .map(|k| k.iter().map(|c| totals.get(c).copied().unwrap_or(0)).sum())
                        .unwrap_or(0);
                    totals.insert(id, self.direct.get(&Some(id)).copied().unwrap_or(0) + from_children);
                    on_path.remove(&id);
                } else {
                    if !on_path.insert(id) {
                        continue;
                    }
                    stack.push((id, true));
                    if let Some(kids) = kids {
                        for child in kids {
                            if !totals.contains_key(child) && !on_path.contains(child) {
                                stack.push((*child, false));
                            }
                        }
                    }
                }
            }
        }
        totals
    }
}

/// A node with its recursive item count.
#[derive(Debug, Clone, PartialEq)]
pub struct CountedNode {
    pub node: Node,
    pub count: usize,
}

/// One line of a rendered tree: a counted node and how deep it sits.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub depth: usize,
    pub counted: CountedNode,
}

pub struct CountAggregator<'a> {
    catalog: &'a Catalog,
}

impl<'a> CountAggregator<'a> {
    pub(crate) fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Items at `(address, node)` plus everything beneath it. With no node,
    /// counts the whole address including unfiled items.
    pub fn count_under(
        &self,
        address: &PartitionAddress,
        node_id: Option<NodeId>,
    ) -> Result<usize, CatalogError> {
        if let Some(id) = node_id {
            let node = self.catalog.tree().get_node(id)?;
            if &node.address != address {
                return Err(CatalogError::InvalidDestination(format!(
                    "node {} belongs to {}, not {}",
                    id, node.address, address
                )));
            }
        }
        let (census, _) = Census::load(self.catalog, address)?;
        Ok(census.total_from(node_id))
    }

    /// Every node at the address with its total, parents before children and
    /// siblings in order, from a single census.
    pub fn count_tree(&self, address: &PartitionAddress) -> Result<Vec<TreeRow>, CatalogError> {
        let (census, nodes) = Census::load(self.catalog, address)?;
        let totals = census.subtree_totals(&nodes);
        let by_parent = children_index(nodes);

        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<(usize, &Node)> = by_parent
            .get(&None)
            .map(|roots| roots.iter().rev().map(|n| (0, n)).collect())
            .unwrap_or_default();
        while let Some((depth, node)) = stack.pop() {
            if !seen.insert(node.id) {
                continue;
            }
            if let Some(kids) = by_parent.get(&Some(node.id)) {
                stack.extend(kids.iter().rev().map(|k| (depth + 1, k)));
            }
            rows.push(TreeRow {
                depth,
                counted: CountedNode {
                    node: node.clone(),
                    count: totals.get(&node.id).copied().unwrap_or(0),
                },
            });
        }
        Ok(rows)
    }

    /// Counts for every child of `(address, parent)`, in sibling order.
    pub fn count_siblings(
        &self,
        address: &PartitionAddress,
        parent_id: Option<NodeId>,
    ) -> Result<Vec<CountedNode>, CatalogError> {
        let (census, nodes) = Census::load(self.catalog, address)?;
        let totals = census.subtree_totals(&nodes);
        let mut siblings: Vec<Node> = nodes
            .into_iter()
            .filter(|node| node.parent_id == parent_id)
            .collect();
        sort_siblings(&mut siblings);
        Ok(siblings
            .into_iter()
            .map(|node| CountedNode {
                count: totals.get(&node.id).copied().unwrap_or(0),
                node,
            })
            .collect())
    }
}

use super::{Snapshot, SnapshotNode};
use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::tree::{item_natural_key, normalize_name, NodeDraft};
use crate::types::{NodeId, PartitionAddress};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Import every record into this address instead of the one it carries
    pub retarget: Option<PartitionAddress>,
}

/// The snapshot record an import error refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportRecord {
    Node { natural_key: String, name: String },
    /// Position in `Snapshot::items`
    Item { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRecordError {
    pub record: ImportRecord,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub nodes_created: usize,
    pub items_created: usize,
    pub nodes_skipped: usize,
    pub items_skipped: usize,
    /// Items whose owning node could not be resolved and were filed at the
    /// address instead
    pub items_unfiled: usize,
    pub errors: Vec<ImportRecordError>,
}

impl ImportReport {
    fn node_error(&mut self, node: &SnapshotNode, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(natural_key = %node.natural_key, name = %node.name, reason = %reason, "Node not imported cleanly");
        self.errors.push(ImportRecordError {
            record: ImportRecord::Node {
                natural_key: node.natural_key.clone(),
                name: node.name.clone(),
            },
            reason,
        });
    }

    fn item_error(&mut self, index: usize, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(index, reason = %reason, "Item not imported");
        self.errors.push(ImportRecordError {
            record: ImportRecord::Item { index },
            reason,
        });
    }
}

/// A node in import order with how its parent should be resolved.
struct Planned<'s> {
    node: &'s SnapshotNode,
    parent_key: Option<&'s str>,
}

/// Order nodes parents-first. Nodes whose parent is not in the snapshot come
/// back as roots; nodes on a parent cycle are left out.
fn plan_nodes<'s>(snapshot: &'s Snapshot, report: &mut ImportReport) -> Vec<Planned<'s>> {
    let present: HashSet<&str> = snapshot.nodes.iter().map(|n| n.natural_key.as_str()).collect();
    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (index, node) in snapshot.nodes.iter().enumerate() {
        match node.parent_natural_key.as_deref() {
            None => roots.push(index),
            Some(parent) if present.contains(parent) => {
                children.entry(parent).or_default().push(index)
            }
            Some(parent) => {
                report.node_error(
                    node,
                    format!("parent {} is not in the snapshot; imported as a root", parent),
                );
                roots.push(index);
            }
        }
    }
    for group in children.values_mut() {
        group.sort_by_key(|&i| snapshot.nodes[i].order);
    }
    roots.sort_by_key(|&i| snapshot.nodes[i].order);

    let mut planned = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<(usize, Option<&str>)> = roots.into_iter().rev().map(|i| (i, None)).collect();
    while let Some((index, parent_key)) = stack.pop() {
        if !visited.insert(index) {
            continue;
        }
        let node = &snapshot.nodes[index];
        planned.push(Planned { node, parent_key });
        if let Some(kids) = children.get(node.natural_key.as_str()) {
            for &kid in kids.iter().rev() {
                stack.push((kid, Some(node.natural_key.as_str())));
            }
        }
    }

    for (index, node) in snapshot.nodes.iter().enumerate() {
        if !visited.contains(&index) {
            report.node_error(node, "node is part of a parent cycle; skipped");
        }
    }
    planned
}

pub struct ImportReconciler<'a> {
    catalog: &'a Catalog,
}

impl<'a> ImportReconciler<'a> {
    pub(crate) fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn import(&self, snapshot: &Snapshot, created_by: &str) -> Result<ImportReport, CatalogError> {
        self.import_with(snapshot, created_by, &ImportOptions::default())
    }

    /// Merge a snapshot into the catalog. Existing equivalents are reused,
    /// nothing is rolled back, and running it again finishes an interrupted
    /// import without duplicating records.
    pub fn import_with(
        &self,
        snapshot: &Snapshot,
        created_by: &str,
        options: &ImportOptions,
    ) -> Result<ImportReport, CatalogError> {
        if snapshot.catalog != self.catalog.name() {
            return Err(CatalogError::Snapshot(format!(
                "snapshot belongs to catalog '{}', not '{}'",
                snapshot.catalog,
                self.catalog.name()
            )));
        }
        if let Some(address) = &options.retarget {
            self.catalog.schema().validate_address(address)?;
        }
        let destination = |address: &PartitionAddress| {
            options.retarget.clone().unwrap_or_else(|| address.clone())
        };

        let tree = self.catalog.tree();
        let mut report = ImportReport::default();
        let mut mapping: HashMap<&str, NodeId> = HashMap::new();

        for Planned { node, parent_key } in plan_nodes(snapshot, &mut report) {
            let parent_id = match parent_key {
                None => None,
                Some(key) => match mapping.get(key) {
                    Some(id) => Some(*id),
                    None => {
                        report.node_error(node, "parent was not imported; skipped");
                        continue;
                    }
                },
            };
            let address = destination(&node.address);
            let wanted = normalize_name(&node.name);
            let existing = match tree.list_children(&address, parent_id) {
                Ok(siblings) => siblings.into_iter().find(|n| normalize_name(&n.name) == wanted),
                Err(e) => {
                    report.node_error(node, e.to_string());
                    continue;
                }
            };
            if let Some(existing) = existing {
                mapping.insert(&node.natural_key, existing.id);
                report.nodes_skipped += 1;
                continue;
            }
            let draft = NodeDraft::new(address, parent_id, node.name.clone())
                .locked(node.locked)
                .hidden(node.hidden);
            match tree.create_from_draft(draft, created_by) {
                Ok(created) => {
                    mapping.insert(&node.natural_key, created.id);
                    report.nodes_created += 1;
                }
                Err(e) => report.node_error(node, e.to_string()),
            }
        }

        let store = self.catalog.store();
        let items = self.catalog.items();
        let key_field = self.catalog.schema().item_key_field.as_deref();
        let mut known: HashMap<(PartitionAddress, Option<NodeId>), HashSet<String>> = HashMap::new();

        for (index, item) in snapshot.items.iter().enumerate() {
            let address = destination(&item.address);
            let node_id = match item.node_natural_key.as_deref() {
                None => None,
                Some(key) => match mapping.get(key) {
                    Some(id) => Some(*id),
                    None => {
                        report.items_unfiled += 1;
                        warn!(index, node_key = %key, "Owning node unresolved; filing item at the address");
                        None
                    }
                },
            };

            let container = (address.clone(), node_id);
            if !known.contains_key(&container) {
                let existing = match store.items_in_container(&address, node_id) {
                    Ok(existing) => existing,
                    Err(e) => {
                        report.item_error(index, e.to_string());
                        continue;
                    }
                };
                let keys = existing
                    .iter()
                    .map(|i| item_natural_key(&i.payload, key_field))
                    .collect();
                known.insert(container.clone(), keys);
            }
            let key = item_natural_key(&item.payload, key_field);
            if known.get(&container).map_or(false, |keys| keys.contains(&key)) {
                report.items_skipped += 1;
                continue;
            }
            match items.create(&address, node_id, item.payload.clone(), created_by) {
                Ok(_) => {
                    if let Some(keys) = known.get_mut(&container) {
                        keys.insert(key);
                    }
                    report.items_created += 1;
                }
                Err(e) => report.item_error(index, e.to_string()),
            }
        }

        info!(
            catalog = %snapshot.catalog,
            nodes_created = report.nodes_created,
            nodes_skipped = report.nodes_skipped,
            items_created = report.items_created,
            items_skipped = report.items_skipped,
            items_unfiled = report.items_unfiled,
            errors = report.errors.len(),
            "Snapshot imported"
        );
        Ok(report)
    }
}

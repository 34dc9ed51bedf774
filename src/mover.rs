//! Cross-tree item moves
//!
//! Re-files items into another container, possibly at another address. The
//! destination is checked once up front; each item is then written on its own
//! so one bad id does not hold back the rest.

use crate::catalog::Catalog;
use crate::error::{CascadeOp, CatalogError, RecordId};
use crate::types::{ItemId, NodeId, PartitionAddress};
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveReport {
    pub moved: usize,
    /// Items already at the destination
    pub skipped: usize,
}

pub struct CrossTreeMover<'a> {
    catalog: &'a Catalog,
}

impl<'a> CrossTreeMover<'a> {
    pub(crate) fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn move_items(
        &self,
        item_ids: &[ItemId],
        dest_address: &PartitionAddress,
        dest_node: Option<NodeId>,
    ) -> Result<MoveReport, CatalogError> {
        // Holding the destination group's lock keeps folders from appearing
        // under it mid-move
        let lock = self.catalog.locks().get_lock(dest_address, dest_node);
        let _guard = lock.write();
        self.catalog.items().ensure_leaf_bearing(dest_address, dest_node)?;

        let store = self.catalog.store();
        let mut seen = HashSet::new();
        let mut report = MoveReport::default();
        let mut failed = Vec::new();

        for &id in item_ids.iter().filter(|id| seen.insert(**id)) {
            let mut item = match store.get_item(id) {
                Ok(Some(item)) => item,
                Ok(None) => {
                    warn!(item_id = %id, "Item to move does not exist");
                    failed.push(RecordId::Item(id));
                    continue;
                }
                Err(e) => {
                    warn!(item_id = %id, error = %e, "Could not load item to move");
                    failed.push(RecordId::Item(id));
                    continue;
                }
            };
            if &item.address == dest_address && item.node_id == dest_node {
                report.skipped += 1;
                continue;
            }
            item.address = dest_address.clone();
            item.node_id = dest_node;
            match store.put_item(&item) {
                Ok(()) => report.moved += 1,
                Err(e) => {
                    warn!(item_id = %id, error = %e, "Item move failed");
                    failed.push(RecordId::Item(id));
                }
            }
        }

        info!(
            address = %dest_address,
            node = ?dest_node,
            moved = report.moved,
            skipped = report.skipped,
            failed = failed.len(),
            "Items moved"
        );
        if !failed.is_empty() {
            return Err(CatalogError::PartialCascadeFailure {
                operation: CascadeOp::MoveItems,
                completed: report.moved + report.skipped,
                remaining: failed,
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::presets;
    use crate::test_support::{n5, vocabulary_catalog, FlakyStore};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn moves_unfiled_items_into_a_folder() {
        let catalog = vocabulary_catalog();
        let items = catalog.items();
        let n4 = PartitionAddress::new("N4");
        let a = items.create(&n5(), None, json!({ "word": "日" }), "admin").unwrap();
        let b = items.create(&n5(), None, json!({ "word": "月" }), "admin").unwrap();
        let lesson = catalog.tree().create_node(&n4, None, "Bài 1", "admin").unwrap();

        let report = catalog
            .mover()
            .move_items(&[a.id, b.id, a.id], &n4, Some(lesson.id))
            .unwrap();
        assert_eq!(report, MoveReport { moved: 2, skipped: 0 });
        assert!(items.list_unfiled(&n5()).unwrap().is_empty());
        assert_eq!(items.list_by_node(lesson.id).unwrap().len(), 2);

        // The emptied level can take folders now
        catalog.tree().create_node(&n5(), None, "Bài 1", "admin").unwrap();

        let again = catalog.mover().move_items(&[a.id], &n4, Some(lesson.id)).unwrap();
        assert_eq!(again, MoveReport { moved: 0, skipped: 1 });
    }

    #[test]
    fn moves_across_partitions() {
        let catalog = vocabulary_catalog();
        let n4 = PartitionAddress::new("N4");
        let src = catalog.tree().create_node(&n5(), None, "Bài 1", "admin").unwrap();
        let dst = catalog.tree().create_node(&n4, None, "Bài 1", "admin").unwrap();
        let item = catalog
            .items()
            .create(&n5(), Some(src.id), json!({ "word": "日" }), "admin")
            .unwrap();
        catalog.mover().move_items(&[item.id], &n4, Some(dst.id)).unwrap();
        let moved = catalog.items().get(item.id).unwrap();
        assert_eq!(moved.address, n4);
        assert_eq!(moved.node_id, Some(dst.id));
        assert_eq!(catalog.counts().count_under(&n5(), None).unwrap(), 0);
    }

    #[test]
    fn illegal_destination_writes_nothing() {
        let catalog = vocabulary_catalog();
        let tree = catalog.tree();
        let lesson = tree.create_node(&n5(), None, "Bài 1", "admin").unwrap();
        let kanji = tree.create_node(&n5(), Some(lesson.id), "Kanji", "admin").unwrap();
        let item = catalog
            .items()
            .create(&n5(), Some(kanji.id), json!({ "word": "日" }), "admin")
            .unwrap();
        let mover = catalog.mover();
        for (address, node) in [
            (n5(), Some(lesson.id)),
            (n5(), None),
            (PartitionAddress::new("N4"), Some(kanji.id)),
            (n5(), Some(NodeId(999))),
            (PartitionAddress::new("N0"), None),
        ] {
            assert!(matches!(
                mover.move_items(&[item.id], &address, node),
                Err(CatalogError::InvalidDestination(_))
            ));
        }
        assert_eq!(catalog.items().get(item.id).unwrap().node_id, Some(kanji.id));
    }

    #[test]
    fn per_item_failures_name_the_items_left_behind() {
        let flaky = Arc::new(FlakyStore::new());
        let catalog = Catalog::new(presets::vocabulary(), flaky.clone()).unwrap();
        let items = catalog.items();
        let n4 = PartitionAddress::new("N4");
        let good = items.create(&n5(), None, json!({ "word": "日" }), "admin").unwrap();
        let bad = items.create(&n5(), None, json!({ "word": "月" }), "admin").unwrap();
        let lesson = catalog.tree().create_node(&n4, None, "Bài 1", "admin").unwrap();
        flaky.poison_item(bad.id);

        match catalog
            .mover()
            .move_items(&[good.id, bad.id, ItemId(4040)], &n4, Some(lesson.id))
        {
            Err(CatalogError::PartialCascadeFailure {
                operation,
                completed,
                remaining,
            }) => {
                assert_eq!(operation, CascadeOp::MoveItems);
                assert_eq!(completed, 1);
                assert_eq!(
                    remaining,
                    vec![RecordId::Item(bad.id), RecordId::Item(ItemId(4040))]
                );
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
        assert_eq!(items.get(good.id).unwrap().node_id, Some(lesson.id));
        assert_eq!(items.get(bad.id).unwrap().node_id, None);
    }
}

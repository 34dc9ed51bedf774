use lesson_catalog::error::StorageError;
use lesson_catalog::store::WriteBatch;
use lesson_catalog::{
    CascadeOp, Catalog, CatalogError, CatalogStore, ContentItem, ItemId, MemoryStore, Node,
    NodeId, PartitionAddress,
};
use lesson_catalog::schema::presets;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::support::{memory_catalog, n5};

/// Memory store that refuses the first batch after `arm`.
struct RefusingStore {
    inner: MemoryStore,
    armed: AtomicBool,
}

impl RefusingStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            armed: AtomicBool::new(false),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl CatalogStore for RefusingStore {
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
        if self.armed.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Backend("disk full".to_string()));
        }
        self.inner.apply(batch)
    }
}

#[test]
fn delete_leaves_no_orphans_and_closes_the_gap() {
    let catalog = memory_catalog();
    let tree = catalog.tree();
    let first = tree.create_node(&n5(), None, "Bài 1", "admin").unwrap();
    let second = tree.create_node(&n5(), None, "Bài 2", "admin").unwrap();
    let third = tree.create_node(&n5(), None, "Bài 3", "admin").unwrap();
    let kanji = tree.create_node(&n5(), Some(second.id), "Kanji", "admin").unwrap();
    let words = tree.create_node(&n5(), Some(second.id), "Từ vựng", "admin").unwrap();
    for (node, word) in [(kanji.id, "日"), (kanji.id, "月"), (words.id, "学生")] {
        catalog.items().create(&n5(), Some(node), json!({ "word": word }), "admin").unwrap();
    }
    catalog.items().create(&n5(), Some(third.id), json!({ "word": "先生" }), "admin").unwrap();

    let report = tree.delete_node(second.id).unwrap();
    assert_eq!(report.nodes_removed, 3);
    assert_eq!(report.items_removed, 3);
    assert_eq!(report.siblings_renumbered, 1);

    let store = catalog.store();
    let left: Vec<NodeId> = store.nodes_at(&n5()).unwrap().iter().map(|n| n.id).collect();
    assert_eq!(left.len(), 2);
    assert!(left.contains(&first.id) && left.contains(&third.id));
    let items = store.items_at(&n5()).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].node_id, Some(third.id));

    let orders: Vec<u32> = tree.list_roots(&n5()).unwrap().iter().map(|n| n.order).collect();
    assert_eq!(orders, vec![1, 2]);
    assert!(matches!(tree.get_node(kanji.id), Err(CatalogError::NotFound(_))));
}

#[test]
fn failed_delete_reports_remaining_and_can_be_repeated() {
    let store = Arc::new(RefusingStore::new());
    let catalog = Catalog::new(presets::vocabulary(), store.clone()).unwrap();
    let tree = catalog.tree();
    let lesson = tree.create_node(&n5(), None, "Bài 1", "admin").unwrap();
    let kanji = tree.create_node(&n5(), Some(lesson.id), "Kanji", "admin").unwrap();
    catalog.items().create(&n5(), Some(kanji.id), json!({ "word": "日" }), "admin").unwrap();

    store.arm();
    match tree.delete_node(lesson.id) {
        Err(CatalogError::PartialCascadeFailure {
            operation,
            completed,
            remaining,
        }) => {
            assert_eq!(operation, CascadeOp::DeleteNode);
            assert_eq!(completed, 0);
            assert_eq!(remaining.len(), 3);
        }
        other => panic!("expected a partial cascade failure, got {other:?}"),
    }
    assert_eq!(tree.list_roots(&n5()).unwrap().len(), 1);

    let report = tree.delete_node(lesson.id).unwrap();
    assert_eq!(report.nodes_removed, 2);
    assert_eq!(report.items_removed, 1);
    assert!(catalog.store().items_at(&n5()).unwrap().is_empty());
}

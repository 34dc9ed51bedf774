use lesson_catalog::schema::presets;
use lesson_catalog::{Catalog, SledStore};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use crate::support::n5;

#[test]
fn records_and_order_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let (lesson_id, second_id) = {
        let store = Arc::new(SledStore::open(dir.path(), "vocabulary").unwrap());
        let catalog = Catalog::new(presets::vocabulary(), store.clone()).unwrap();
        let tree = catalog.tree();
        let lesson = tree.create_node(&n5(), None, "Bài 1", "admin").unwrap();
        let second = tree.create_node(&n5(), None, "Bài 2", "admin").unwrap();
        catalog.items().create(&n5(), Some(lesson.id), json!({ "word": "日" }), "admin").unwrap();
        catalog.reorderer().reorder_nodes(second.id, lesson.id).unwrap();
        store.flush().unwrap();
        (lesson.id, second.id)
    };

    let store = Arc::new(SledStore::open(dir.path(), "vocabulary").unwrap());
    let catalog = Catalog::new(presets::vocabulary(), store).unwrap();
    let roots = catalog.tree().list_roots(&n5()).unwrap();
    let ids: Vec<_> = roots.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![second_id, lesson_id]);
    assert_eq!(catalog.counts().count_under(&n5(), Some(lesson_id)).unwrap(), 1);

    // Ids keep growing after reopen
    let third = catalog.tree().create_node(&n5(), None, "Bài 3", "admin").unwrap();
    assert!(third.id > second_id);
    assert_eq!(third.order, 3);
}

#[test]
fn catalogs_sharing_a_database_are_isolated() {
    let dir = TempDir::new().unwrap();
    let db = sled::open(dir.path()).unwrap();
    let vocabulary = Catalog::new(
        presets::vocabulary(),
        Arc::new(SledStore::from_db(db.clone(), "vocabulary").unwrap()),
    )
    .unwrap();
    let grammar = Catalog::new(
        presets::grammar(),
        Arc::new(SledStore::from_db(db, "grammar").unwrap()),
    )
    .unwrap();

    vocabulary.tree().create_node(&n5(), None, "Bài 1", "admin").unwrap();
    assert!(grammar.tree().list_roots(&n5()).unwrap().is_empty());
}

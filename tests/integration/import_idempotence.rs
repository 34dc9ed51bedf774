use lesson_catalog::{ExportScope, ImportOptions, PartitionAddress, Snapshot};
use serde_json::json;

use crate::support::{memory_catalog, n5};

fn seeded() -> lesson_catalog::Catalog {
    let catalog = memory_catalog();
    let tree = catalog.tree();
    let lesson = tree.create_node(&n5(), None, "Bài 1", "admin").unwrap();
    let kanji = tree.create_node(&n5(), Some(lesson.id), "Kanji", "admin").unwrap();
    for word in ["日", "月"] {
        catalog.items().create(&n5(), Some(kanji.id), json!({ "word": word }), "admin").unwrap();
    }
    catalog
}

#[test]
fn importing_twice_creates_nothing_the_second_time() {
    let source = seeded();
    let snapshot = source.exporter().export(&ExportScope::Partition(n5())).unwrap();
    let text = snapshot.to_json_pretty().unwrap();

    let target = memory_catalog();
    let parsed = Snapshot::from_json(&text).unwrap();
    let first = target.importer().import(&parsed, "importer").unwrap();
    assert_eq!((first.nodes_created, first.items_created), (2, 2));
    assert!(first.errors.is_empty());

    let second = target.importer().import(&parsed, "importer").unwrap();
    assert_eq!((second.nodes_created, second.items_created), (0, 0));
    assert_eq!((second.nodes_skipped, second.items_skipped), (2, 2));
    assert_eq!(target.counts().count_under(&n5(), None).unwrap(), 2);
}

#[test]
fn import_into_the_source_catalog_is_a_no_op() {
    let catalog = seeded();
    let snapshot = catalog.exporter().export(&ExportScope::Partition(n5())).unwrap();
    let report = catalog.importer().import(&snapshot, "admin").unwrap();
    assert_eq!(report.nodes_created + report.items_created, 0);
    assert_eq!(catalog.tree().list_roots(&n5()).unwrap().len(), 1);
}

#[test]
fn retargeted_import_lands_in_another_level() {
    let source = seeded();
    let snapshot = source.exporter().export(&ExportScope::Partition(n5())).unwrap();
    let n4 = PartitionAddress::new("N4");

    let report = source
        .importer()
        .import_with(&snapshot, "admin", &ImportOptions { retarget: Some(n4.clone()) })
        .unwrap();
    assert_eq!((report.nodes_created, report.items_created), (2, 2));
    assert_eq!(source.counts().count_under(&n4, None).unwrap(), 2);
    assert_eq!(source.counts().count_under(&n5(), None).unwrap(), 2);
}

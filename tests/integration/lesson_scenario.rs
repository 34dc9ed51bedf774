use lesson_catalog::cursor::{Container, Frame, Selection};
use lesson_catalog::CatalogError;
use serde_json::json;

use crate::support::{memory_catalog, n5};

/// Build N5 lessons, fill them, walk them with a cursor, then reshuffle.
#[test]
fn n5_lessons_from_empty_catalog() {
    let catalog = memory_catalog();
    let tree = catalog.tree();
    let items = catalog.items();

    let lesson1 = tree.create_node(&n5(), None, "Bài 1", "admin").unwrap();
    let lesson2 = tree.create_node(&n5(), None, "Bài 2", "admin").unwrap();
    let kanji = tree.create_node(&n5(), Some(lesson1.id), "Kanji", "admin").unwrap();
    let words = tree.create_node(&n5(), Some(lesson1.id), "Từ vựng", "admin").unwrap();
    assert_eq!((lesson1.order, lesson2.order), (1, 2));

    // A third level is beyond the vocabulary schema
    assert!(matches!(
        tree.create_node(&n5(), Some(kanji.id), "Extra", "admin"),
        Err(CatalogError::InvalidParent(_))
    ));

    for word in ["日", "月", "火"] {
        items.create(&n5(), Some(kanji.id), json!({ "word": word }), "admin").unwrap();
    }
    items.create(&n5(), Some(words.id), json!({ "word": "学生" }), "admin").unwrap();
    items.create(&n5(), Some(lesson2.id), json!({ "word": "先生" }), "admin").unwrap();

    // Lesson 1 holds folders, not items
    assert!(matches!(
        items.create(&n5(), Some(lesson1.id), json!({ "word": "x" }), "admin"),
        Err(CatalogError::InvalidDestination(_))
    ));

    let counts = catalog.counts();
    assert_eq!(counts.count_under(&n5(), Some(lesson1.id)).unwrap(), 4);
    assert_eq!(counts.count_under(&n5(), None).unwrap(), 5);
    let roots = counts.count_siblings(&n5(), None).unwrap();
    let summary: Vec<(&str, usize)> = roots.iter().map(|c| (c.node.name.as_str(), c.count)).collect();
    assert_eq!(summary, vec![("Bài 1", 4), ("Bài 2", 1)]);

    let mut cursor = catalog.cursor();
    assert!(matches!(cursor.current_container(&tree).unwrap(), Container::Selecting { .. }));
    cursor.enter(&tree, Selection::from("N5")).unwrap();
    cursor.enter(&tree, Selection::from(lesson1.id)).unwrap();
    cursor.enter(&tree, Selection::from("Kanji")).unwrap();
    assert_eq!(cursor.breadcrumb(), vec!["Home", "N5", "Bài 1", "Kanji"]);
    assert!(matches!(
        cursor.current_container(&tree).unwrap(),
        Container::Items { node: Some(id), .. } if id == kanji.id
    ));
    assert!(matches!(
        cursor.enter(&tree, Selection::from("anything")),
        Err(CatalogError::CursorOverflow { .. })
    ));
    assert!(matches!(cursor.back().unwrap(), Frame::Node { .. }));
    assert_eq!(cursor.current_node(), Some(lesson1.id));

    // Drag lesson 2 to the top
    let outcome = catalog.reorderer().reorder_nodes(lesson2.id, lesson1.id).unwrap();
    let names: Vec<&str> = outcome.siblings.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["Bài 2", "Bài 1"]);
    assert_eq!(outcome.changed, 2);

    // Move the lesson 2 item into the Kanji folder
    let moved = items.list_by_node(lesson2.id).unwrap();
    let ids: Vec<_> = moved.iter().map(|i| i.id).collect();
    let report = catalog.mover().move_items(&ids, &n5(), Some(kanji.id)).unwrap();
    assert_eq!(report.moved, 1);
    assert_eq!(counts.count_under(&n5(), Some(kanji.id)).unwrap(), 4);
    assert_eq!(counts.count_under(&n5(), Some(lesson2.id)).unwrap(), 0);
}

#[test]
fn other_partitions_are_untouched() {
    let catalog = memory_catalog();
    let n4 = lesson_catalog::PartitionAddress::new("N4");
    let lesson = catalog.tree().create_node(&n5(), None, "Bài 1", "admin").unwrap();
    catalog.items().create(&n5(), Some(lesson.id), json!({ "word": "日" }), "admin").unwrap();

    assert!(catalog.tree().list_roots(&n4).unwrap().is_empty());
    assert_eq!(catalog.counts().count_under(&n4, None).unwrap(), 0);
    assert!(matches!(
        catalog.counts().count_under(&n4, Some(lesson.id)),
        Err(CatalogError::InvalidDestination(_))
    ));
}

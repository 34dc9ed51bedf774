//! Built-in schemas for the content tabs. Config may override any of them by
//! catalog name.

use super::{Axis, PartitionSchema};

pub const JLPT_LEVELS: [&str; 5] = ["N5", "N4", "N3", "N2", "N1"];

fn level_axis() -> Axis {
    Axis::new("level", &JLPT_LEVELS).with_label("Level")
}

pub fn vocabulary() -> PartitionSchema {
    PartitionSchema::new("vocabulary", level_axis(), 2).with_item_key("word")
}

pub fn grammar() -> PartitionSchema {
    PartitionSchema::new("grammar", level_axis(), 2).with_item_key("pattern")
}

pub fn jlpt() -> PartitionSchema {
    PartitionSchema::new("jlpt", level_axis(), 1)
        .with_selector(
            Axis::new("category", &["vocabulary", "grammar", "reading", "listening"])
                .with_label("Category"),
        )
        .with_item_key("question")
}

pub fn conversation() -> PartitionSchema {
    PartitionSchema::new("conversation", level_axis(), 1)
        .with_selector(
            Axis::new(
                "topic",
                &["greetings", "daily_life", "shopping", "travel", "work"],
            )
            .with_label("Topic"),
        )
        .with_item_key("question")
}

pub fn lecture() -> PartitionSchema {
    let lessons: Vec<String> = (1..=25).map(|n| n.to_string()).collect();
    let lesson_refs: Vec<&str> = lessons.iter().map(String::as_str).collect();
    PartitionSchema::new("lecture", level_axis(), 0)
        .with_selector(Axis::new("lesson", &lesson_refs).with_label("Lesson"))
        .with_selector(
            Axis::new("lesson_type", &["vocabulary", "grammar", "kanji", "practice"])
                .with_label("Lesson type"),
        )
        .with_item_key("title")
}

pub fn reading() -> PartitionSchema {
    PartitionSchema::new("reading", level_axis(), 1).with_item_key("title")
}

pub fn listening() -> PartitionSchema {
    PartitionSchema::new("listening", level_axis(), 2).with_item_key("title")
}

/// Every built-in schema, in tab order.
pub fn all() -> Vec<PartitionSchema> {
    vec![
        vocabulary(),
        grammar(),
        jlpt(),
        conversation(),
        lecture(),
        reading(),
        listening(),
    ]
}

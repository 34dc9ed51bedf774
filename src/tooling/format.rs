//! Text rendering for CLI output.

use crate::counts::TreeRow;
use crate::error::CatalogError;
use crate::schema::PartitionSchema;
use crate::snapshot::{ImportRecord, ImportReport};
use crate::store::ContentItem;
use crate::tree::DeleteReport;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn flags(locked: bool, hidden: bool) -> String {
    match (locked, hidden) {
        (true, true) => "locked, hidden".to_string(),
        (true, false) => "locked".to_string(),
        (false, true) => "hidden".to_string(),
        (false, false) => String::new(),
    }
}

pub fn format_schemas_text(schemas: &[PartitionSchema]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Catalogs"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Catalog", "Partition", "Selectors", "Folder levels", "Item key"]);
    for schema in schemas {
        let selectors = schema
            .selectors
            .iter()
            .map(|axis| format!("{} ({})", axis.display_label(), axis.values.len()))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            schema.catalog.clone(),
            format!("{}: {}", schema.partition.display_label(), schema.partition.values.join(" ")),
            if selectors.is_empty() { "-".to_string() } else { selectors },
            schema.max_depth.to_string(),
            schema.item_key_field.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_tree_text(title: &str, rows: &[TreeRow], unfiled: usize) -> String {
    let mut out = format!("{}\n\n", format_section_heading(title));
    if rows.is_empty() {
        out.push_str(&format!("No folders. {} unfiled item(s).\n", unfiled));
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Order", "Id", "Name", "Items", "Flags"]);
    for row in rows {
        let node = &row.counted.node;
        let name = if row.depth == 0 {
            node.name.clone()
        } else {
            format!("{}└ {}", "  ".repeat(row.depth - 1), node.name)
        };
        table.add_row(vec![
            node.order.to_string(),
            node.id.to_string(),
            name,
            row.counted.count.to_string(),
            flags(node.locked, node.hidden),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    if unfiled > 0 {
        out.push_str(&format!(
            "{} unfiled item(s) still sit at the partition; move them into a folder.\n",
            unfiled.yellow()
        ));
    }
    out
}

pub fn format_items_text(title: &str, items: &[ContentItem], key_field: Option<&str>) -> String {
    let mut out = format!("{}\n\n", format_section_heading(title));
    if items.is_empty() {
        out.push_str("No items.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Id", "Item", "Created by"]);
    for item in items {
        table.add_row(vec![
            item.id.to_string(),
            item_summary(item, key_field),
            item.created_by.clone(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Short label: the key field when present, else compact JSON.
pub fn item_summary(item: &ContentItem, key_field: Option<&str>) -> String {
    if let Some(text) = key_field
        .and_then(|field| item.payload.get(field))
        .and_then(|v| v.as_str())
    {
        return text.to_string();
    }
    let json = item.payload.to_string();
    if json.chars().count() > 60 {
        format!("{}…", json.chars().take(59).collect::<String>())
    } else {
        json
    }
}

pub fn format_delete_text(name: &str, report: &DeleteReport) -> String {
    format!(
        "{} '{}': {} folder(s) and {} item(s) removed; {} sibling(s) renumbered",
        "Deleted".green(),
        name,
        report.nodes_removed,
        report.items_removed,
        report.siblings_renumbered
    )
}

pub fn format_import_text(report: &ImportReport) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Import"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["", "Created", "Skipped"]);
    table.add_row(vec![
        "Folders".to_string(),
        report.nodes_created.to_string(),
        report.nodes_skipped.to_string(),
    ]);
    table.add_row(vec![
        "Items".to_string(),
        report.items_created.to_string(),
        report.items_skipped.to_string(),
    ]);
    out.push_str(&format!("{}\n", table));
    if report.items_unfiled > 0 {
        out.push_str(&format!(
            "{} item(s) lost their folder and were filed at the partition\n",
            report.items_unfiled
        ));
    }
    if !report.errors.is_empty() {
        out.push_str(&format!("\n{}\n", format_section_heading("Problems")));
        for error in &report.errors {
            let record = match &error.record {
                ImportRecord::Node { name, .. } => format!("folder '{}'", name),
                ImportRecord::Item { index } => format!("item #{}", index),
            };
            out.push_str(&format!("  {} {}: {}\n", "✗".red(), record, error.reason));
        }
    }
    out
}

/// Human hint for the failures a CLI user can act on.
pub fn error_hint(error: &CatalogError) -> Option<&'static str> {
    match error {
        CatalogError::PartialCascadeFailure { .. } => {
            Some("Run the same command again to finish the remaining records.")
        }
        CatalogError::InvalidDestination(_) => {
            Some("A container holds either folders or items; pick a folder without sub-folders.")
        }
        CatalogError::Storage(_) => Some("Check that no other process has the store open."),
        _ => None,
    }
}

//! CLI Tooling
//!
//! Command-line adapter over the catalog engine. Every command opens the
//! selected catalog, runs one operation, and renders the result as text or
//! JSON.

use crate::catalog::Catalog;
use crate::config::{CatalogConfig, ConfigLoader, StoreBackend};
use crate::cursor::{Container, Selection};
use crate::error::CatalogError;
use crate::logging::LoggingConfig;
use crate::snapshot::{ExportScope, ImportOptions, Snapshot};
use crate::store::{CatalogStore, MemoryStore, SledStore};
use crate::tree::NodeDraft;
use crate::tooling::format::{
    format_delete_text, format_import_text, format_items_text, format_schemas_text,
    format_section_heading, format_tree_text, item_summary,
};
use crate::types::{ItemId, NodeId, PartitionAddress};
use clap::{Args, Parser, Subcommand};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Lesson catalog administration
#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Manage partitioned lesson catalogs: folders, items, ordering and snapshots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Catalog to operate on (vocabulary, grammar, jlpt, ...)
    #[arg(long, short = 'c', default_value = "vocabulary", global = true)]
    pub catalog: String,

    /// Name recorded as the creator of new records
    #[arg(long, default_value = "admin", global = true)]
    pub actor: String,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold the logging flags over the configured logging section.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.enabled = true;
            config.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

/// A complete address given on the command line.
#[derive(Args, Debug, Clone)]
pub struct AddressArgs {
    /// Partition value, e.g. N5
    #[arg(long, short = 'p')]
    pub partition: String,

    /// Selector value as AXIS=VALUE (repeat for each selector axis)
    #[arg(long = "select", value_name = "AXIS=VALUE")]
    pub selectors: Vec<String>,
}

impl AddressArgs {
    pub fn to_address(&self) -> Result<PartitionAddress, CatalogError> {
        parse_address(&self.partition, &self.selectors)
    }
}

fn parse_address(partition: &str, selectors: &[String]) -> Result<PartitionAddress, CatalogError> {
    let mut address = PartitionAddress::new(partition);
    for pair in selectors {
        let (axis, value) = pair.split_once('=').ok_or_else(|| {
            CatalogError::InvalidSelection(format!("expected AXIS=VALUE, got '{}'", pair))
        })?;
        address = address.with_selector(axis.trim(), value.trim());
    }
    Ok(address)
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List available catalogs and their shape
    Schemas {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the folder tree of one address with recursive item counts
    Tree {
        #[command(flatten)]
        address: AddressArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List the items of a folder, or the unfiled items of an address
    Items {
        #[command(flatten)]
        address: AddressArgs,
        /// Folder id; omit for unfiled items
        #[arg(long)]
        node: Option<u64>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Walk the catalog interactively
    Browse,
    /// Create a folder at the end of its sibling list
    AddNode {
        #[command(flatten)]
        address: AddressArgs,
        /// Parent folder id; omit for a top-level folder
        #[arg(long)]
        parent: Option<u64>,
        /// Folder name
        #[arg(long)]
        name: String,
        #[arg(long)]
        locked: bool,
        #[arg(long)]
        hidden: bool,
    },
    /// Create an item from a JSON payload
    AddItem {
        #[command(flatten)]
        address: AddressArgs,
        /// Owning folder id; omit to leave the item unfiled
        #[arg(long)]
        node: Option<u64>,
        /// Item payload as a JSON object
        #[arg(long)]
        payload: String,
    },
    /// Rename a folder
    Rename {
        #[arg(long)]
        node: u64,
        #[arg(long)]
        name: String,
    },
    /// Set or clear a folder's locked / hidden flags
    Flag {
        #[arg(long)]
        node: u64,
        #[arg(long)]
        locked: Option<bool>,
        #[arg(long)]
        hidden: Option<bool>,
    },
    /// Delete a folder with everything under it
    Delete {
        #[arg(long)]
        node: u64,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Drop one folder onto another in the same sibling list
    Reorder {
        /// Folder being dragged
        #[arg(long)]
        dragged: u64,
        /// Folder it is dropped onto
        #[arg(long)]
        target: u64,
    },
    /// Move items to another folder or address
    Move {
        /// Item id (repeatable)
        #[arg(long = "item", required = true)]
        items: Vec<u64>,
        #[command(flatten)]
        address: AddressArgs,
        /// Destination folder id; omit for unfiled
        #[arg(long)]
        node: Option<u64>,
    },
    /// Export folders or a whole address as a JSON snapshot
    Export {
        /// Folder id to export with its subtree (repeatable)
        #[arg(long = "node", conflicts_with = "partition")]
        nodes: Vec<u64>,
        /// Export every folder and item at this partition
        #[arg(long, short = 'p', required_unless_present = "nodes")]
        partition: Option<String>,
        /// Selector value as AXIS=VALUE, with --partition
        #[arg(long = "select", value_name = "AXIS=VALUE", requires = "partition")]
        selectors: Vec<String>,
        /// Write to this file instead of standard output
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Merge a JSON snapshot into the catalog
    Import {
        /// Snapshot file
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Import into this partition instead of the snapshot's
        #[arg(long)]
        retarget: Option<String>,
        /// Selector value for --retarget as AXIS=VALUE
        #[arg(long = "retarget-select", value_name = "AXIS=VALUE", requires = "retarget")]
        retarget_selectors: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Name of a command for logs.
fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Schemas { .. } => "schemas",
        Commands::Tree { .. } => "tree",
        Commands::Items { .. } => "items",
        Commands::Browse => "browse",
        Commands::AddNode { .. } => "add-node",
        Commands::AddItem { .. } => "add-item",
        Commands::Rename { .. } => "rename",
        Commands::Flag { .. } => "flag",
        Commands::Delete { .. } => "delete",
        Commands::Reorder { .. } => "reorder",
        Commands::Move { .. } => "move",
        Commands::Export { .. } => "export",
        Commands::Import { .. } => "import",
    }
}

fn to_json(value: &serde_json::Value) -> Result<String, CatalogError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn check_format(format: &str) -> Result<bool, CatalogError> {
    match format {
        "json" => Ok(true),
        "text" => Ok(false),
        other => Err(CatalogError::Config(format!(
            "Invalid output format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

/// Shared state for one CLI invocation.
pub struct CliContext {
    config: CatalogConfig,
    workspace_root: PathBuf,
    db: Option<sled::Db>,
    memory: Mutex<HashMap<String, Arc<MemoryStore>>>,
    catalog: String,
    actor: String,
}

impl CliContext {
    /// Load configuration and open the configured store.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CatalogError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let db = match config.store.backend {
            StoreBackend::Sled => {
                let path = config.store.resolve_path(&workspace_root)?;
                std::fs::create_dir_all(&path).map_err(|e| {
                    CatalogError::Config(format!(
                        "Failed to create store directory {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Some(sled::open(&path)?)
            }
            StoreBackend::Memory => None,
        };
        Ok(Self {
            config,
            workspace_root,
            db,
            memory: Mutex::new(HashMap::new()),
            catalog: "vocabulary".to_string(),
            actor: "admin".to_string(),
        })
    }

    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = catalog.into();
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &PathBuf {
        &self.workspace_root
    }

    /// Open the selected catalog over the configured backend.
    pub fn open_catalog(&self) -> Result<Catalog, CatalogError> {
        let schema = self.config.schema(&self.catalog)?;
        let store: Arc<dyn CatalogStore> = match &self.db {
            Some(db) => Arc::new(SledStore::from_db(db.clone(), &schema.catalog)?),
            None => {
                let memory: Arc<MemoryStore> = self
                    .memory
                    .lock()
                    .entry(schema.catalog.clone())
                    .or_insert_with(|| Arc::new(MemoryStore::new()))
                    .clone();
                memory
            }
        };
        Ok(Catalog::new(schema, store)?.with_root_label(self.config.root_label.clone()))
    }

    /// Run one command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String, CatalogError> {
        info!(command = command_name(command), catalog = %self.catalog, "Executing command");
        let result = self.execute_inner(command);
        if let Some(db) = &self.db {
            db.flush()?;
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, CatalogError> {
        match command {
            Commands::Schemas { format } => self.handle_schemas(format),
            Commands::Tree { address, format } => self.handle_tree(&address.to_address()?, format),
            Commands::Items {
                address,
                node,
                format,
            } => self.handle_items(&address.to_address()?, node.map(NodeId), format),
            Commands::Browse => self.handle_browse(),
            Commands::AddNode {
                address,
                parent,
                name,
                locked,
                hidden,
            } => {
                let catalog = self.open_catalog()?;
                let draft = NodeDraft::new(address.to_address()?, parent.map(NodeId), name.clone())
                    .locked(*locked)
                    .hidden(*hidden);
                let node = catalog.tree().create_from_draft(draft, &self.actor)?;
                Ok(format!(
                    "Created folder {} '{}' at position {}",
                    node.id, node.name, node.order
                ))
            }
            Commands::AddItem {
                address,
                node,
                payload,
            } => {
                let catalog = self.open_catalog()?;
                let payload: serde_json::Value = serde_json::from_str(payload).map_err(|e| {
                    CatalogError::InvalidSelection(format!("payload is not valid JSON: {}", e))
                })?;
                let item = catalog.items().create(
                    &address.to_address()?,
                    node.map(NodeId),
                    payload,
                    &self.actor,
                )?;
                Ok(format!("Created item {}", item.id))
            }
            Commands::Rename { node, name } => {
                let catalog = self.open_catalog()?;
                let node = catalog.tree().rename_node(NodeId(*node), name)?;
                Ok(format!("Renamed folder {} to '{}'", node.id, node.name))
            }
            Commands::Flag {
                node,
                locked,
                hidden,
            } => {
                let catalog = self.open_catalog()?;
                let tree = catalog.tree();
                let mut current = tree.get_node(NodeId(*node))?;
                if let Some(locked) = locked {
                    current = tree.set_locked(current.id, *locked)?;
                }
                if let Some(hidden) = hidden {
                    current = tree.set_hidden(current.id, *hidden)?;
                }
                Ok(format!(
                    "Folder {} '{}': locked={}, hidden={}",
                    current.id, current.name, current.locked, current.hidden
                ))
            }
            Commands::Delete { node, yes } => self.handle_delete(NodeId(*node), *yes),
            Commands::Reorder { dragged, target } => {
                let catalog = self.open_catalog()?;
                let outcome = catalog
                    .reorderer()
                    .reorder_nodes(NodeId(*dragged), NodeId(*target))?;
                let order = outcome
                    .siblings
                    .iter()
                    .map(|n| format!("{}. {}", n.order, n.name))
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(format!("{} row(s) renumbered\n{}", outcome.changed, order))
            }
            Commands::Move {
                items,
                address,
                node,
            } => {
                let catalog = self.open_catalog()?;
                let ids: Vec<ItemId> = items.iter().map(|id| ItemId(*id)).collect();
                let report = catalog
                    .mover()
                    .move_items(&ids, &address.to_address()?, node.map(NodeId))?;
                Ok(format!(
                    "Moved {} item(s); {} already in place",
                    report.moved, report.skipped
                ))
            }
            Commands::Export {
                nodes,
                partition,
                selectors,
                output,
            } => {
                let scope = match partition {
                    Some(partition) => ExportScope::Partition(parse_address(partition, selectors)?),
                    None => ExportScope::Nodes(nodes.iter().map(|id| NodeId(*id)).collect()),
                };
                self.handle_export(&scope, output.as_ref())
            }
            Commands::Import {
                input,
                retarget,
                retarget_selectors,
                format,
            } => {
                let retarget = retarget
                    .as_deref()
                    .map(|partition| parse_address(partition, retarget_selectors))
                    .transpose()?;
                self.handle_import(input, ImportOptions { retarget }, format)
            }
        }
    }

    fn handle_schemas(&self, format: &str) -> Result<String, CatalogError> {
        let schemas = self.config.schemas()?;
        if check_format(format)? {
            return to_json(&serde_json::to_value(&schemas)?);
        }
        Ok(format_schemas_text(&schemas))
    }

    fn handle_tree(&self, address: &PartitionAddress, format: &str) -> Result<String, CatalogError> {
        let json = check_format(format)?;
        let catalog = self.open_catalog()?;
        catalog.schema().validate_address(address)?;
        let rows = catalog.counts().count_tree(address)?;
        let unfiled = catalog.items().list_unfiled(address)?.len();
        let total_items = unfiled + rows.iter().filter(|r| r.depth == 0).map(|r| r.counted.count).sum::<usize>();

        if json {
            let nodes: Vec<_> = rows
                .iter()
                .map(|row| {
                    json!({
                        "id": row.counted.node.id,
                        "parent_id": row.counted.node.parent_id,
                        "name": row.counted.node.name,
                        "order": row.counted.node.order,
                        "depth": row.depth,
                        "item_count": row.counted.count,
                        "locked": row.counted.node.locked,
                        "hidden": row.counted.node.hidden,
                    })
                })
                .collect();
            return to_json(&json!({
                "catalog": catalog.name(),
                "address": address,
                "total_items": total_items,
                "unfiled_items": unfiled,
                "nodes": nodes,
            }));
        }
        let title = format!("{} · {}", catalog.name(), address);
        Ok(format_tree_text(&title, &rows, unfiled))
    }

    fn handle_items(
        &self,
        address: &PartitionAddress,
        node: Option<NodeId>,
        format: &str,
    ) -> Result<String, CatalogError> {
        let json = check_format(format)?;
        let catalog = self.open_catalog()?;
        let items = match node {
            Some(id) => catalog.items().list_by_node(id)?,
            None => catalog.items().list_unfiled(address)?,
        };
        if json {
            return to_json(&serde_json::to_value(&items)?);
        }
        let title = match node {
            Some(id) => format!("Items in folder {}", id),
            None => format!("Unfiled items at {}", address),
        };
        Ok(format_items_text(
            &title,
            &items,
            catalog.schema().item_key_field.as_deref(),
        ))
    }

    fn handle_delete(&self, id: NodeId, yes: bool) -> Result<String, CatalogError> {
        let catalog = self.open_catalog()?;
        let node = catalog.tree().get_node(id)?;
        if !yes {
            use dialoguer::Confirm;
            let items = catalog.counts().count_under(&node.address, Some(id))?;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Delete '{}' with every sub-folder and {} item(s)?",
                    node.name, items
                ))
                .default(false)
                .interact()
                .map_err(|e| CatalogError::Config(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Deletion cancelled".to_string());
            }
        }
        let report = catalog.tree().delete_node(id)?;
        Ok(format_delete_text(&node.name, &report))
    }

    fn handle_export(
        &self,
        scope: &ExportScope,
        output: Option<&PathBuf>,
    ) -> Result<String, CatalogError> {
        let catalog = self.open_catalog()?;
        let snapshot = catalog.exporter().export(scope)?;
        match output {
            Some(path) => {
                snapshot.write_to(path)?;
                Ok(format!(
                    "Exported {} folder(s) and {} item(s) to {}",
                    snapshot.nodes.len(),
                    snapshot.items.len(),
                    path.display()
                ))
            }
            None => snapshot.to_json_pretty(),
        }
    }

    fn handle_import(
        &self,
        input: &PathBuf,
        options: ImportOptions,
        format: &str,
    ) -> Result<String, CatalogError> {
        let json = check_format(format)?;
        let snapshot = Snapshot::read_from(input)?;
        let catalog = self.open_catalog()?;
        let report = catalog.importer().import_with(&snapshot, &self.actor, &options)?;
        if json {
            return to_json(&serde_json::to_value(&report)?);
        }
        Ok(format_import_text(&report))
    }

    /// Interactive drill-down with dialoguer; returns where the user left off.
    fn handle_browse(&self) -> Result<String, CatalogError> {
        use dialoguer::Select;

        let catalog = self.open_catalog()?;
        let tree = catalog.tree();
        let key_field = catalog.schema().item_key_field.clone();
        let mut cursor = catalog.cursor();

        loop {
            let container = cursor.current_container(&tree)?;
            let mut labels = Vec::new();
            let mut selections = Vec::new();
            match &container {
                Container::Selecting { axis } => {
                    for value in &axis.values {
                        labels.push(value.clone());
                        selections.push(Selection::Value(value.clone()));
                    }
                }
                Container::Nodes { address, parent } => {
                    for counted in catalog.counts().count_siblings(address, *parent)? {
                        labels.push(format!("{} ({})", counted.node.name, counted.count));
                        selections.push(Selection::Node(counted.node.id));
                    }
                }
                Container::Items { address, node } => {
                    let items = match node {
                        Some(id) => catalog.items().list_by_node(*id)?,
                        None => catalog.items().list_unfiled(address)?,
                    };
                    println!(
                        "{}",
                        format_items_text(&cursor.breadcrumb().join(" › "), &items, key_field.as_deref())
                    );
                    labels.extend(items.iter().map(|i| format!("  {}", item_summary(i, key_field.as_deref()))));
                }
            }
            let back_index = labels.len();
            labels.push("← Back".to_string());
            labels.push("Quit".to_string());

            let heading = format_section_heading(&cursor.breadcrumb().join(" › "));
            let choice = Select::new()
                .with_prompt(heading)
                .items(&labels)
                .default(0)
                .interact_opt()
                .map_err(|e| CatalogError::Config(format!("Failed to get user input: {}", e)))?;

            match choice {
                Some(index) if index < selections.len() => {
                    cursor.enter(&tree, selections[index].clone())?;
                }
                Some(index) if index == back_index => {
                    if cursor.can_go_back() {
                        cursor.back()?;
                    }
                }
                // Item rows have nothing to drill into
                Some(index) if index < back_index => {}
                _ => break,
            }
        }
        Ok(format!("Left at {}", cursor.breadcrumb().join(" › ")))
    }
}

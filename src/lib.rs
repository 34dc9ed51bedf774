//! Lesson Catalog: partitioned lesson trees
//!
//! Lessons and folders form small trees rooted at a partition (a JLPT
//! level, say) and scoped by selector values. Leaf items hang off
//! leaf-bearing containers. The crate covers the tree, drill-down
//! navigation, recursive counts, sibling reordering, cross-tree item moves,
//! and JSON snapshot export/import with natural-key dedup.

pub mod catalog;
pub mod concurrency;
pub mod config;
pub mod counts;
pub mod cursor;
pub mod error;
pub mod items;
pub mod logging;
pub mod mover;
pub mod reorder;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;

#[cfg(test)]
mod test_support;

pub use catalog::{Catalog, DEFAULT_ROOT_LABEL};
pub use config::{CatalogConfig, ConfigLoader};
pub use cursor::{Container, Frame, NavigationCursor, Selection};
pub use error::{CascadeOp, CatalogError, RecordId, StorageError};
pub use schema::{Axis, PartitionSchema};
pub use snapshot::{ExportScope, ImportOptions, ImportReport, Snapshot};
pub use store::{CatalogStore, ContentItem, MemoryStore, Node, SledStore};
pub use types::{ItemId, NodeId, PartitionAddress};

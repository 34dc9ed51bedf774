//! Catalog facade
//!
//! Binds one `PartitionSchema` to one `CatalogStore` and hands out the
//! component views (tree, items, counts, reorder, move, export, import) that
//! operate on it. Views borrow the catalog, so they are cheap to create per
//! request.

use crate::concurrency::SiblingLocks;
use crate::counts::CountAggregator;
use crate::cursor::NavigationCursor;
use crate::error::CatalogError;
use crate::items::ItemStore;
use crate::mover::CrossTreeMover;
use crate::reorder::SiblingReorderer;
use crate::schema::PartitionSchema;
use crate::snapshot::{ExportSerializer, ImportReconciler};
use crate::store::CatalogStore;
use crate::tree::TreeStore;
use std::sync::Arc;

pub const DEFAULT_ROOT_LABEL: &str = "Home";

pub struct Catalog {
    schema: Arc<PartitionSchema>,
    store: Arc<dyn CatalogStore>,
    locks: SiblingLocks,
    root_label: String,
}

impl Catalog {
    /// Validates the schema before anything can be written through it.
    pub fn new(
        schema: PartitionSchema,
        store: Arc<dyn CatalogStore>,
    ) -> Result<Self, CatalogError> {
        schema.validate()?;
        Ok(Self {
            schema: Arc::new(schema),
            store,
            locks: SiblingLocks::new(),
            root_label: DEFAULT_ROOT_LABEL.to_string(),
        })
    }

    /// Label shown as the first breadcrumb entry.
    pub fn with_root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = label.into();
        self
    }

    pub fn schema(&self) -> &PartitionSchema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.schema.catalog
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    pub(crate) fn locks(&self) -> &SiblingLocks {
        &self.locks
    }

    pub fn tree(&self) -> TreeStore<'_> {
        TreeStore::new(self)
    }

    pub fn items(&self) -> ItemStore<'_> {
        ItemStore::new(self)
    }

    pub fn counts(&self) -> CountAggregator<'_> {
        CountAggregator::new(self)
    }

    pub fn reorderer(&self) -> SiblingReorderer<'_> {
        SiblingReorderer::new(self)
    }

    pub fn mover(&self) -> CrossTreeMover<'_> {
        CrossTreeMover::new(self)
    }

    pub fn exporter(&self) -> ExportSerializer<'_> {
        ExportSerializer::new(self)
    }

    pub fn importer(&self) -> ImportReconciler<'_> {
        ImportReconciler::new(self)
    }

    /// Fresh cursor positioned at the root.
    pub fn cursor(&self) -> NavigationCursor {
        NavigationCursor::new(self.schema.clone(), self.root_label.clone())
    }
}

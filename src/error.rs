//! Error types for the catalog engine.

use crate::types::{ItemId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failures raised by a `CatalogStore` backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("record codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("corrupt record under key {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A record a multi-record operation did not finish with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RecordId {
    Node(NodeId),
    Item(ItemId),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Node(id) => write!(f, "node {}", id),
            RecordId::Item(id) => write!(f, "item {}", id),
        }
    }
}

/// Multi-record operations that can stop partway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeOp {
    DeleteNode,
    MoveItems,
}

impl fmt::Display for CascadeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeOp::DeleteNode => f.write_str("delete"),
            CascadeOp::MoveItems => f.write_str("move"),
        }
    }
}

/// Errors surfaced by every catalog operation.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(RecordId),

    #[error("invalid parent: {0}")]
    InvalidParent(String),

    #[error("cursor is already at maximum depth {max_depth}")]
    CursorOverflow { max_depth: usize },

    #[error("cursor is at root; nothing to go back to")]
    CursorUnderflow,

    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("{operation} stopped after {completed} records; {} still pending", .remaining.len())]
    PartialCascadeFailure {
        operation: CascadeOp,
        completed: usize,
        remaining: Vec<RecordId>,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    pub fn node_not_found(id: NodeId) -> Self {
        CatalogError::NotFound(RecordId::Node(id))
    }

    pub fn item_not_found(id: ItemId) -> Self {
        CatalogError::NotFound(RecordId::Item(id))
    }

    /// Caller misuse of the API; retrying the same call cannot succeed.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidParent(_)
                | CatalogError::CursorOverflow { .. }
                | CatalogError::CursorUnderflow
                | CatalogError::InvalidDestination(_)
                | CatalogError::InvalidSelection(_)
                | CatalogError::InvalidName(_)
        )
    }

    /// Whether re-invoking the same call may make progress.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::PartialCascadeFailure { .. } | CatalogError::Storage(_)
        )
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Snapshot(err.to_string())
    }
}

impl From<config::ConfigError> for CatalogError {
    fn from(err: config::ConfigError) -> Self {
        CatalogError::Config(err.to_string())
    }
}

impl From<sled::Error> for CatalogError {
    fn from(err: sled::Error) -> Self {
        CatalogError::Storage(StorageError::Sled(err))
    }
}

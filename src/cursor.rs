//! Navigation Cursor
//!
//! A frame stack driven by the catalog schema: first the partition value,
//! then one value per selector axis, then up to `max_depth` folder levels.
//! What the cursor currently points at (a choice of values, a folder list, or
//! an item list) is resolved against the live tree on every call.

use crate::error::CatalogError;
use crate::schema::{Axis, PartitionSchema, Step};
use crate::tree::{normalize_name, TreeStore};
use crate::types::{NodeId, PartitionAddress};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One step taken by the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    Selector { axis: String, value: String },
    Node { node_id: NodeId, name: String },
}

impl Frame {
    pub fn label(&self) -> &str {
        match self {
            Frame::Selector { value, .. } => value,
            Frame::Node { name, .. } => name,
        }
    }
}

/// What the caller picked at the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// An axis value, or a folder name at a node step
    Value(String),
    Node(NodeId),
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::Value(value.to_string())
    }
}

impl From<NodeId> for Selection {
    fn from(id: NodeId) -> Self {
        Selection::Node(id)
    }
}

/// What the cursor's position holds right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    /// A partition or selector value still has to be chosen
    Selecting { axis: Axis },
    /// Child folders; items are not addressable here
    Nodes {
        address: PartitionAddress,
        parent: Option<NodeId>,
    },
    /// Leaf-bearing; an empty list is a valid terminal state
    Items {
        address: PartitionAddress,
        node: Option<NodeId>,
    },
}

#[derive(Debug, Clone)]
pub struct NavigationCursor {
    schema: Arc<PartitionSchema>,
    root_label: String,
    frames: Vec<Frame>,
}

impl NavigationCursor {
    pub fn new(schema: Arc<PartitionSchema>, root_label: impl Into<String>) -> Self {
        Self {
            schema,
            root_label: root_label.into(),
            frames: Vec::new(),
        }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn can_go_back(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn reset(&mut self) {
        self.frames.clear();
    }

    /// The step the next `enter` would take, `None` at the deepest level.
    pub fn next_step(&self) -> Option<Step<'_>> {
        self.schema.step(self.frames.len())
    }

    /// Push one frame.
    pub fn enter(&mut self, tree: &TreeStore<'_>, selection: Selection) -> Result<&Frame, CatalogError> {
        let frame = match self.next_step() {
            None => {
                return Err(CatalogError::CursorOverflow {
                    max_depth: self.schema.max_cursor_depth(),
                })
            }
            Some(Step::Selector(axis)) => match selection {
                Selection::Value(value) if axis.contains(&value) => Frame::Selector {
                    axis: axis.name.clone(),
                    value,
                },
                Selection::Value(value) => {
                    return Err(CatalogError::InvalidSelection(format!(
                        "'{}' is not a {} (expected one of: {})",
                        value,
                        axis.display_label(),
                        axis.values.join(", ")
                    )))
                }
                Selection::Node(id) => {
                    return Err(CatalogError::InvalidSelection(format!(
                        "expected a {} value, got node {}",
                        axis.display_label(),
                        id
                    )))
                }
            },
            Some(Step::NodeLevel(_)) => {
                let address = self.resolved_address()?;
                let children = tree.list_children(&address, self.current_node())?;
                let chosen = match &selection {
                    Selection::Node(id) => children
                        .into_iter()
                        .find(|node| node.id == *id)
                        .ok_or_else(|| CatalogError::node_not_found(*id))?,
                    Selection::Value(name) => {
                        let wanted = normalize_name(name);
                        children
                            .into_iter()
                            .find(|node| normalize_name(&node.name) == wanted)
                            .ok_or_else(|| {
                                CatalogError::InvalidSelection(format!(
                                    "no folder named '{}' here",
                                    name
                                ))
                            })?
                    }
                };
                Frame::Node {
                    node_id: chosen.id,
                    name: chosen.name,
                }
            }
        };
        debug!(depth = self.frames.len() + 1, label = frame.label(), "Cursor entered");
        self.frames.push(frame);
        Ok(&self.frames[self.frames.len() - 1])
    }

    /// Pop the top frame.
    pub fn back(&mut self) -> Result<Frame, CatalogError> {
        self.frames.pop().ok_or(CatalogError::CursorUnderflow)
    }

    /// Root label followed by one label per frame.
    pub fn breadcrumb(&self) -> Vec<String> {
        std::iter::once(self.root_label.clone())
            .chain(self.frames.iter().map(|f| f.label().to_string()))
            .collect()
    }

    /// The complete address once every selector has been chosen.
    pub fn address(&self) -> Option<PartitionAddress> {
        if self.frames.len() < self.schema.selector_steps() {
            return None;
        }
        let mut frames = self.frames.iter();
        let mut address = match frames.next() {
            Some(Frame::Selector { value, .. }) => PartitionAddress::new(value.clone()),
            _ => return None,
        };
        for frame in frames.take(self.schema.selectors.len()) {
            if let Frame::Selector { axis, value } = frame {
                address = address.with_selector(axis.clone(), value.clone());
            }
        }
        Some(address)
    }

    /// Innermost folder, `None` while still at the partition level.
    pub fn current_node(&self) -> Option<NodeId> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Frame::Node { node_id, .. } => Some(*node_id),
            Frame::Selector { .. } => None,
        })
    }

    pub fn current_container(&self, tree: &TreeStore<'_>) -> Result<Container, CatalogError> {
        match self.next_step() {
            Some(Step::Selector(axis)) => Ok(Container::Selecting { axis: axis.clone() }),
            Some(Step::NodeLevel(_)) => {
                let address = self.resolved_address()?;
                let parent = self.current_node();
                if tree.has_children(&address, parent)? {
                    Ok(Container::Nodes { address, parent })
                } else {
                    Ok(Container::Items {
                        address,
                        node: parent,
                    })
                }
            }
            None => Ok(Container::Items {
                address: self.resolved_address()?,
                node: self.current_node(),
            }),
        }
    }

    /// Drop folder frames whose node no longer exists and pick up renames.
    /// Returns how many frames were dropped.
    pub fn refresh(&mut self, tree: &TreeStore<'_>) -> Result<usize, CatalogError> {
        for index in 0..self.frames.len() {
            let Frame::Node { node_id, name } = &mut self.frames[index] else {
                continue;
            };
            match tree.get_node(*node_id) {
                Ok(node) => *name = node.name,
                Err(CatalogError::NotFound(_)) => {
                    let dropped = self.frames.len() - index;
                    self.frames.truncate(index);
                    debug!(dropped, "Cursor dropped frames of deleted folders");
                    return Ok(dropped);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(0)
    }

    fn resolved_address(&self) -> Result<PartitionAddress, CatalogError> {
        self.address().ok_or_else(|| {
            CatalogError::InvalidSelection("every selector must be chosen first".to_string())
        })
    }
}

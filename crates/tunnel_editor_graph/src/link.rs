// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::node::NodeId;
use crate::slot::SlotType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed link from an output slot to an input slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Unique link ID
    pub id: LinkId,
    /// Origin node ID
    pub from_node: NodeId,
    /// Origin output slot index
    pub from_slot: usize,
    /// Destination node ID
    pub to_node: NodeId,
    /// Destination input slot index
    pub to_slot: usize,
    /// Types the destination accepts over this link
    pub accepts: SlotType,
}

impl Link {
    /// Create a new link
    pub fn new(
        from_node: NodeId,
        from_slot: usize,
        to_node: NodeId,
        to_slot: usize,
        accepts: SlotType,
    ) -> Self {
        Self {
            id: LinkId::new(),
            from_node,
            from_slot,
            to_node,
            to_slot,
            accepts,
        }
    }

    /// Check if this link involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }

    /// Check if this link leaves the given output slot
    pub fn leaves(&self, node_id: NodeId, slot: usize) -> bool {
        self.from_node == node_id && self.from_slot == slot
    }

    /// Check if this link enters the given input slot
    pub fn enters(&self, node_id: NodeId, slot: usize) -> bool {
        self.to_node == node_id && self.to_slot == slot
    }
}

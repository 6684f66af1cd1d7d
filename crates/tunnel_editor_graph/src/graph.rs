// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and links.

use crate::access::GraphAccess;
use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An editable node graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Links between nodes
    links: IndexMap<LinkId, Link>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its links
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        self.links.retain(|_, l| !l.involves_node(node_id));
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Link an output slot to an input slot
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_slot: usize,
        to_node: NodeId,
        to_slot: usize,
    ) -> Result<LinkId, ConnectionError> {
        let source_node = self.nodes.get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target_node = self.nodes.get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;

        let source_slot = source_node.output(from_slot)
            .ok_or(ConnectionError::SlotNotFound(from_node, from_slot))?;
        let target_slot = target_node.input(to_slot)
            .ok_or(ConnectionError::SlotNotFound(to_node, to_slot))?;

        if !source_slot.can_connect(target_slot) {
            return Err(ConnectionError::IncompatibleSlots {
                from: source_slot.slot_type.to_string(),
                to: target_slot.slot_type.to_string(),
            });
        }

        if from_node == to_node {
            return Err(ConnectionError::SelfLoop);
        }

        let accepts = target_slot.slot_type.clone();
        self.insert_link(Link::new(from_node, from_slot, to_node, to_slot, accepts))
    }

    /// Insert a prebuilt link, as stored in a saved workflow.
    ///
    /// Only the endpoints are checked; saved types may be stale until the
    /// nodes are configured.
    pub fn insert_link(&mut self, link: Link) -> Result<LinkId, ConnectionError> {
        let source_node = self.nodes.get(&link.from_node)
            .ok_or(ConnectionError::NodeNotFound(link.from_node))?;
        let target_node = self.nodes.get(&link.to_node)
            .ok_or(ConnectionError::NodeNotFound(link.to_node))?;
        if source_node.output(link.from_slot).is_none() {
            return Err(ConnectionError::SlotNotFound(link.from_node, link.from_slot));
        }
        if target_node.input(link.to_slot).is_none() {
            return Err(ConnectionError::SlotNotFound(link.to_node, link.to_slot));
        }
        if self.links.values().any(|l| l.enters(link.to_node, link.to_slot)) {
            return Err(ConnectionError::SlotAlreadyConnected(link.to_node, link.to_slot));
        }

        let id = link.id;
        self.links.insert(id, link);
        Ok(id)
    }

    /// Remove a link
    pub fn disconnect(&mut self, link_id: LinkId) -> Option<Link> {
        self.links.shift_remove(&link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get links involving a node
    pub fn links_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.involves_node(node_id))
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

impl GraphAccess for Graph {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    fn links_from(&self, node: NodeId, slot: usize) -> Vec<LinkId> {
        self.links
            .values()
            .filter(|l| l.leaves(node, slot))
            .map(|l| l.id)
            .collect()
    }

    fn link_into(&self, node: NodeId, slot: usize) -> Option<LinkId> {
        self.links.values().find(|l| l.enters(node, slot)).map(|l| l.id)
    }

    fn remove_link(&mut self, id: LinkId) -> Option<Link> {
        self.disconnect(id)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating a link
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Slot not found
    #[error("Slot {1} not found on node {0:?}")]
    SlotNotFound(NodeId, usize),

    /// Incompatible slot types
    #[error("Incompatible slot types: {from} -> {to}")]
    IncompatibleSlots {
        /// Origin type
        from: String,
        /// Destination type
        to: String,
    },

    /// Input slot already has a link
    #[error("Input slot {1} on node {0:?} is already connected")]
    SlotAlreadyConnected(NodeId, usize),

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{create_default_registry, PRIMITIVE_INT, PREVIEW_ANY, SCALE_IMAGE};

    #[test]
    fn test_connect_and_query() {
        let registry = create_default_registry();
        let mut graph = Graph::default();
        let int = graph.add_node(registry.create_node(PRIMITIVE_INT).unwrap());
        let preview = graph.add_node(registry.create_node(PREVIEW_ANY).unwrap());

        let link = graph.connect(int, 0, preview, 0).unwrap();
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.link_into(preview, 0), Some(link));
        assert_eq!(graph.links_from(int, 0), vec![link]);

        assert!(matches!(
            graph.connect(int, 0, preview, 0),
            Err(ConnectionError::SlotAlreadyConnected(_, 0))
        ));
    }

    #[test]
    fn test_rejects_incompatible_types() {
        let registry = create_default_registry();
        let mut graph = Graph::default();
        let int = graph.add_node(registry.create_node(PRIMITIVE_INT).unwrap());
        let scale = graph.add_node(registry.create_node(SCALE_IMAGE).unwrap());

        assert!(matches!(
            graph.connect(int, 0, scale, 0),
            Err(ConnectionError::IncompatibleSlots { .. })
        ));
        assert!(matches!(
            graph.connect(int, 0, int, 0),
            Err(ConnectionError::SlotNotFound(_, 0))
        ));
    }

    #[test]
    fn test_remove_node_drops_links() {
        let registry = create_default_registry();
        let mut graph = Graph::default();
        let int = graph.add_node(registry.create_node(PRIMITIVE_INT).unwrap());
        let preview = graph.add_node(registry.create_node(PREVIEW_ANY).unwrap());
        graph.connect(int, 0, preview, 0).unwrap();

        assert!(graph.remove_node(int).is_some());
        assert_eq!(graph.link_count(), 0);
        assert_eq!(graph.node_count(), 1);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! The graph service consumed by tunnel nodes.
//!
//! Tunnel operations never reach for a global graph; every call receives
//! the accessor explicitly so the resolver can be driven by any host.

use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId, Role};

/// Host-provided view of the editable graph
pub trait GraphAccess {
    /// Get a node by ID
    fn node(&self, id: NodeId) -> Option<&Node>;

    /// Get a mutable node by ID
    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node>;

    /// IDs of every node, in graph order
    fn node_ids(&self) -> Vec<NodeId>;

    /// Get a link by ID
    fn link(&self, id: LinkId) -> Option<&Link>;

    /// Links leaving an output slot
    fn links_from(&self, node: NodeId, slot: usize) -> Vec<LinkId>;

    /// The link entering an input slot, if any
    fn link_into(&self, node: NodeId, slot: usize) -> Option<LinkId>;

    /// Remove a link from the graph
    fn remove_link(&mut self, id: LinkId) -> Option<Link>;

    /// IDs of every node with the given role, in graph order
    fn find_nodes_by_role(&self, role: Role) -> Vec<NodeId> {
        self.node_ids()
            .into_iter()
            .filter(|id| self.node(*id).is_some_and(|node| node.role() == role))
            .collect()
    }

    /// First producer publishing `name`. The empty name never matches.
    fn find_producer_by_name(&self, name: &str) -> Option<NodeId> {
        if name.is_empty() {
            return None;
        }
        self.find_nodes_by_role(Role::Producer).into_iter().find(|id| {
            self.node(*id)
                .and_then(Node::producer)
                .is_some_and(|producer| producer.variable_name == name)
        })
    }
}

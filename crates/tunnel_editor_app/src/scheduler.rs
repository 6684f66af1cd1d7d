// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deferred tunnel refresh.
//!
//! Workflow loading inserts many nodes at once. Tunnel nodes configured
//! early would resolve against a half-built graph, so their refresh can be
//! pushed to the next host tick. Scheduling is idempotent: a node queued
//! twice before the tick is refreshed once.

use indexmap::IndexSet;
use tunnel_editor_graph::NodeId;

/// Nodes waiting for the next refresh pass
#[derive(Debug, Default)]
pub struct PendingRefresh {
    queue: IndexSet<NodeId>,
}

impl PendingRefresh {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a node; returns false if it was already queued
    pub fn schedule(&mut self, node: NodeId) -> bool {
        self.queue.insert(node)
    }

    /// Drop a node that left the graph before the pass ran
    pub fn cancel(&mut self, node: NodeId) {
        self.queue.shift_remove(&node);
    }

    /// Take every queued node in scheduling order
    pub fn drain(&mut self) -> Vec<NodeId> {
        self.queue.drain(..).collect()
    }

    /// Number of queued nodes
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_is_idempotent() {
        let mut pending = PendingRefresh::new();
        let a = NodeId::new();
        let b = NodeId::new();

        assert!(pending.schedule(a));
        assert!(pending.schedule(b));
        assert!(!pending.schedule(a));
        assert_eq!(pending.len(), 2);

        pending.cancel(b);
        assert_eq!(pending.drain(), vec![a]);
        assert!(pending.is_empty());
    }
}

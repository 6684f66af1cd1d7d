// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pluggable node behaviors invoked by the host on graph edits.

use crate::access::GraphAccess;
use crate::builtin::{CONSUMER_TYPE, PRODUCER_TYPE};
use crate::consumer;
use crate::link::Link;
use crate::node::{Node, NodeId, NodeKind};
use crate::producer;
use crate::slot::{SlotDirection, SlotType};
use indexmap::IndexMap;

/// A link touching a node was made or broken
#[derive(Debug, Clone)]
pub struct ConnectionChange {
    /// Which side of the node the slot is on
    pub direction: SlotDirection,
    /// Slot index on that side
    pub slot: usize,
    /// True when the link was made, false when it was broken
    pub connected: bool,
    /// The link involved
    pub link: Option<Link>,
}

impl ConnectionChange {
    /// A link was made on the given slot
    pub fn connected(direction: SlotDirection, slot: usize, link: Link) -> Self {
        Self {
            direction,
            slot,
            connected: true,
            link: Some(link),
        }
    }

    /// A link was broken on the given slot
    pub fn disconnected(direction: SlotDirection, slot: usize, link: Link) -> Self {
        Self {
            direction,
            slot,
            connected: false,
            link: Some(link),
        }
    }
}

/// Callbacks a node role implements for the host
pub trait NodeBehavior {
    /// The node was just added by the user
    fn on_created(&self, graph: &mut dyn GraphAccess, node: NodeId);

    /// The node was restored from a saved workflow.
    ///
    /// `saved` holds the persisted attributes; they may be stale relative to
    /// the rest of the graph and must be validated again.
    fn on_configure(&self, graph: &mut dyn GraphAccess, node: NodeId, saved: &NodeKind);

    /// A link on one of the node's slots changed
    fn on_connections_change(
        &self,
        graph: &mut dyn GraphAccess,
        node: NodeId,
        change: &ConnectionChange,
    );

    /// The node is about to be detached from the graph
    fn on_removed(&self, graph: &mut dyn GraphAccess, node: NodeId);
}

/// Behavior of the variable producer node
#[derive(Debug, Clone, Copy, Default)]
pub struct ProducerBehavior;

impl NodeBehavior for ProducerBehavior {
    fn on_created(&self, graph: &mut dyn GraphAccess, node: NodeId) {
        producer::on_added(graph, node);
    }

    fn on_configure(&self, graph: &mut dyn GraphAccess, node: NodeId, saved: &NodeKind) {
        let upstream_type = graph
            .link_into(node, 0)
            .and_then(|id| graph.link(id))
            .and_then(|link| Some(graph.node(link.from_node)?.output_type(link.from_slot)));

        let Some(target) = graph.node_mut(node) else {
            return;
        };
        if let (NodeKind::Producer(saved), Some(state)) = (saved, target.producer_mut()) {
            state.variable_name.clone_from(&saved.variable_name);
        }
        if let (Some(slot_type), Some(slot)) = (upstream_type, target.inputs.get_mut(0)) {
            slot.retype(slot_type);
        }

        // Consumers only follow renames made after configuration.
        let name = producer::validate_name(graph, node);
        if let Some(state) = graph.node_mut(node).and_then(Node::producer_mut) {
            state.previous_name = name;
        }
        producer::on_added(graph, node);
    }

    fn on_connections_change(
        &self,
        graph: &mut dyn GraphAccess,
        node: NodeId,
        change: &ConnectionChange,
    ) {
        match (change.direction, change.connected, &change.link) {
            (SlotDirection::Input, true, Some(link)) => {
                let source_type = graph
                    .node(link.from_node)
                    .map(|origin| origin.output_type(link.from_slot))
                    .unwrap_or_default();
                producer::on_input_connected(graph, node, source_type);
            }
            (SlotDirection::Input, false, _) => producer::on_input_disconnected(graph, node),
            (SlotDirection::Output, true, Some(link)) => {
                let downstream_type = graph
                    .node(link.to_node)
                    .and_then(|target| target.input(link.to_slot))
                    .map(|slot| slot.slot_type.clone())
                    .unwrap_or(SlotType::Any);
                producer::on_output_connected(graph, node, downstream_type);
                producer::propagate(graph, node);
            }
            (SlotDirection::Output, false, _) => {
                producer::on_output_disconnected(graph, node);
                producer::propagate(graph, node);
            }
            (_, true, None) => producer::propagate(graph, node),
        }
    }

    fn on_removed(&self, graph: &mut dyn GraphAccess, node: NodeId) {
        producer::on_removed(graph, node);
    }
}

/// Behavior of the variable consumer node
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsumerBehavior;

impl NodeBehavior for ConsumerBehavior {
    fn on_created(&self, graph: &mut dyn GraphAccess, node: NodeId) {
        consumer::refresh_choices(graph, node, &[]);
        let selected = graph
            .node(node)
            .and_then(Node::consumer)
            .map(|state| state.selected_name.clone())
            .unwrap_or_default();
        consumer::on_name_selected(graph, node, &selected);
    }

    fn on_configure(&self, graph: &mut dyn GraphAccess, node: NodeId, saved: &NodeKind) {
        consumer::refresh_choices(graph, node, &[]);
        let selected = match saved {
            NodeKind::Consumer(state) => state.selected_name.clone(),
            _ => String::new(),
        };
        consumer::on_name_selected(graph, node, &selected);
    }

    fn on_connections_change(
        &self,
        graph: &mut dyn GraphAccess,
        node: NodeId,
        _change: &ConnectionChange,
    ) {
        consumer::on_connections_change(graph, node);
    }

    fn on_removed(&self, _graph: &mut dyn GraphAccess, node: NodeId) {
        tracing::trace!(consumer = ?node, "consumer removed");
    }
}

/// Behaviors by node type ID
pub struct BehaviorRegistry {
    behaviors: IndexMap<String, Box<dyn NodeBehavior>>,
}

impl BehaviorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            behaviors: IndexMap::new(),
        }
    }

    /// Registry with the producer and consumer behaviors installed
    pub fn with_tunnels() -> Self {
        let mut registry = Self::new();
        registry.register(PRODUCER_TYPE, ProducerBehavior);
        registry.register(CONSUMER_TYPE, ConsumerBehavior);
        registry
    }

    /// Register a behavior for a node type
    pub fn register(&mut self, type_id: impl Into<String>, behavior: impl NodeBehavior + 'static) {
        self.behaviors.insert(type_id.into(), Box::new(behavior));
    }

    /// Behavior for a node type, if any
    pub fn get(&self, type_id: &str) -> Option<&dyn NodeBehavior> {
        self.behaviors.get(type_id).map(|behavior| behavior.as_ref())
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::with_tunnels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{create_default_registry, PRIMITIVE_INT};
    use crate::graph::Graph;
    use crate::node::{ConsumerState, ProducerState};

    #[test]
    fn test_configure_rederives_stale_state() {
        let registry = create_default_registry();
        let behaviors = BehaviorRegistry::with_tunnels();
        let mut graph = Graph::default();

        let int = graph.add_node(registry.create_node(PRIMITIVE_INT).unwrap());
        let first = graph.add_node(registry.create_node(PRODUCER_TYPE).unwrap());
        let second = graph.add_node(registry.create_node(PRODUCER_TYPE).unwrap());
        let getter = graph.add_node(registry.create_node(CONSUMER_TYPE).unwrap());
        graph.connect(int, 0, second, 0).unwrap();

        let saved = |name: &str| {
            NodeKind::Producer(ProducerState {
                variable_name: name.to_string(),
                previous_name: name.to_string(),
            })
        };
        let producer = behaviors.get(PRODUCER_TYPE).unwrap();
        producer.on_configure(&mut graph, first, &saved("seed"));
        producer.on_configure(&mut graph, second, &saved("seed"));

        let second_node = graph.node(second).unwrap();
        assert_eq!(second_node.producer().unwrap().variable_name, "seed_0");
        assert_eq!(second_node.bound_type(), SlotType::named("INT"));

        let saved_getter = NodeKind::Consumer(ConsumerState {
            selected_name: "seed_0".to_string(),
            ..ConsumerState::default()
        });
        behaviors.get(CONSUMER_TYPE).unwrap().on_configure(&mut graph, getter, &saved_getter);
        assert_eq!(graph.node(getter).unwrap().output_type(0), SlotType::named("INT"));
    }

    #[test]
    fn test_connection_events_drive_producer() {
        let registry = create_default_registry();
        let behaviors = BehaviorRegistry::default();
        let mut graph = Graph::default();
        let int = graph.add_node(registry.create_node(PRIMITIVE_INT).unwrap());
        let setter = graph.add_node(registry.create_node(PRODUCER_TYPE).unwrap());
        let producer = behaviors.get(PRODUCER_TYPE).unwrap();

        let id = graph.connect(int, 0, setter, 0).unwrap();
        let link = graph.link(id).cloned().unwrap();
        producer.on_connections_change(
            &mut graph,
            setter,
            &ConnectionChange::connected(SlotDirection::Input, 0, link.clone()),
        );
        assert_eq!(graph.node(setter).unwrap().bound_type(), SlotType::named("INT"));

        graph.disconnect(id);
        producer.on_connections_change(
            &mut graph,
            setter,
            &ConnectionChange::disconnected(SlotDirection::Input, 0, link),
        );
        assert_eq!(graph.node(setter).unwrap().bound_type(), SlotType::Any);
        assert!(behaviors.get(PRIMITIVE_INT).is_none());
    }
}

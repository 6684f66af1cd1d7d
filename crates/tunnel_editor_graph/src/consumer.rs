// SPDX-License-Identifier: MIT OR Apache-2.0
//! Consumer node: reads a variable by name.
//!
//! The single output mirrors the bound producer's input type, or stays a
//! wildcard while the selected name resolves to nothing.

use crate::access::GraphAccess;
use crate::link::{Link, LinkId};
use crate::node::{BindingState, Node, NodeId};
use crate::resolver;
use crate::slot::SlotType;

/// Title prefix; the bare prefix is the unresolved placeholder
pub const TITLE_PREFIX: &str = "Get_";

/// Names a consumer can currently select
pub fn available_names(graph: &dyn GraphAccess) -> Vec<String> {
    resolver::available_names(graph, &[])
}

/// The producer publishing this consumer's selected name
pub fn resolve_producer(graph: &dyn GraphAccess, consumer: NodeId) -> Option<NodeId> {
    let selected = selected_name(graph, consumer)?;
    resolver::resolve_producer(graph, selected, &[])
}

/// Select a variable name and mirror the producer that publishes it
pub fn on_name_selected(graph: &mut dyn GraphAccess, consumer: NodeId, name: &str) {
    let Some(state) = graph.node_mut(consumer).and_then(Node::consumer_mut) else {
        return;
    };
    state.selected_name = name.to_string();

    let producer = resolver::resolve_producer(graph, name, &[]);
    apply_resolution(graph, consumer, producer);
}

/// Apply the outcome of a resolution: state, title and output type
pub fn apply_resolution(graph: &mut dyn GraphAccess, consumer: NodeId, producer: Option<NodeId>) {
    let resolved = producer
        .and_then(|id| graph.node(id))
        .and_then(|node| Some((node.bound_type(), node.producer()?.variable_name.clone())));

    let (binding, title, slot_type) = match resolved {
        Some((bound_type, name)) => (BindingState::Bound, format!("{TITLE_PREFIX}{name}"), bound_type),
        None => (BindingState::Unbound, TITLE_PREFIX.to_string(), SlotType::Any),
    };

    let Some(node) = graph.node_mut(consumer) else {
        return;
    };
    let Some(state) = node.consumer_mut() else {
        return;
    };
    state.state = binding;
    if binding == BindingState::Unbound && !state.selected_name.is_empty() {
        tracing::warn!(
            consumer = ?consumer,
            name = %state.selected_name,
            "no producer publishes variable"
        );
    }
    node.title = title;

    set_type(graph, consumer, slot_type);
}

/// Retype the output and drop links that no longer accept it
pub fn set_type(graph: &mut dyn GraphAccess, consumer: NodeId, slot_type: SlotType) {
    let Some(slot) = graph.node_mut(consumer).and_then(|node| node.outputs.get_mut(0)) else {
        return;
    };
    slot.retype(slot_type);
    revalidate_downstream_links(graph, consumer);
}

/// Remove output links whose accepted types exclude the current output type.
///
/// Returns the removed links. A wildcard output keeps every link.
pub fn revalidate_downstream_links(graph: &mut dyn GraphAccess, consumer: NodeId) -> Vec<Link> {
    let Some(output_type) = graph.node(consumer).map(|node| node.output_type(0)) else {
        return Vec::new();
    };
    if output_type.is_any() {
        return Vec::new();
    }

    let stale: Vec<LinkId> = graph
        .links_from(consumer, 0)
        .into_iter()
        .filter(|id| graph.link(*id).is_some_and(|link| !link.accepts.admits(&output_type)))
        .collect();

    stale
        .into_iter()
        .filter_map(|id| graph.remove_link(id))
        .inspect(|link| {
            tracing::warn!(
                consumer = ?consumer,
                link = ?link.id,
                accepts = %link.accepts,
                output = %output_type,
                "removed incompatible link"
            );
        })
        .collect()
}

/// The link feeding the bound producer's input, which stands in for this
/// consumer once the graph is compiled for execution
pub fn get_upstream_binding(graph: &dyn GraphAccess, consumer: NodeId) -> Option<LinkId> {
    let Some(producer) = resolve_producer(graph, consumer) else {
        tracing::warn!(
            consumer = ?consumer,
            name = selected_name(graph, consumer).unwrap_or_default(),
            "no producer found for consumer"
        );
        return None;
    };
    graph.link_into(producer, 0)
}

/// Any link on this node changed
pub fn on_connections_change(graph: &mut dyn GraphAccess, consumer: NodeId) {
    revalidate_downstream_links(graph, consumer);
}

/// Refresh the names offered by the selection control
pub fn refresh_choices(graph: &mut dyn GraphAccess, consumer: NodeId, excluding: &[NodeId]) {
    let names = resolver::available_names(graph, excluding);
    if let Some(state) = graph.node_mut(consumer).and_then(Node::consumer_mut) {
        state.choices = names;
    }
}

/// Current binding state, as of the last resolution
pub fn binding_state(graph: &dyn GraphAccess, consumer: NodeId) -> BindingState {
    graph
        .node(consumer)
        .and_then(Node::consumer)
        .map(|state| state.state)
        .unwrap_or_default()
}

fn selected_name(graph: &dyn GraphAccess, consumer: NodeId) -> Option<&str> {
    graph
        .node(consumer)
        .and_then(Node::consumer)
        .map(|state| state.selected_name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{
        create_default_registry, CONSUMER_TYPE, PREVIEW_ANY, PRIMITIVE_INT, PRODUCER_TYPE, SHOW_TEXT,
    };
    use crate::graph::Graph;
    use crate::producer;

    struct Fixture {
        graph: Graph,
        int: NodeId,
        setter: NodeId,
        getter: NodeId,
    }

    /// Int source feeding a producer named `seed`, plus an unselected consumer
    fn fixture() -> Fixture {
        let registry = create_default_registry();
        let mut graph = Graph::default();
        let int = graph.add_node(registry.create_node(PRIMITIVE_INT).unwrap());
        let setter = graph.add_node(registry.create_node(PRODUCER_TYPE).unwrap());
        let getter = graph.add_node(registry.create_node(CONSUMER_TYPE).unwrap());

        graph.connect(int, 0, setter, 0).unwrap();
        producer::on_input_connected(&mut graph, setter, SlotType::named("INT"));
        producer::on_name_edited(&mut graph, setter, "seed");

        Fixture { graph, int, setter, getter }
    }

    #[test]
    fn test_selecting_binds_and_mirrors_type() {
        let Fixture { mut graph, setter, getter, .. } = fixture();
        assert_eq!(binding_state(&graph, getter), BindingState::Unbound);

        on_name_selected(&mut graph, getter, "seed");

        let node = graph.node(getter).unwrap();
        assert_eq!(binding_state(&graph, getter), BindingState::Bound);
        assert_eq!(node.output_type(0), SlotType::named("INT"));
        assert_eq!(node.title, "Get_seed");
        assert_eq!(resolve_producer(&graph, getter), Some(setter));
        assert_eq!(resolve_producer(&graph, getter), resolve_producer(&graph, getter));
    }

    #[test]
    fn test_unknown_name_falls_back_to_wildcard() {
        let Fixture { mut graph, getter, .. } = fixture();
        on_name_selected(&mut graph, getter, "seed");
        on_name_selected(&mut graph, getter, "missing");

        let node = graph.node(getter).unwrap();
        assert_eq!(binding_state(&graph, getter), BindingState::Unbound);
        assert_eq!(node.output_type(0), SlotType::Any);
        assert_eq!(node.title, TITLE_PREFIX);
        assert_eq!(node.consumer().unwrap().selected_name, "missing");
    }

    #[test]
    fn test_incompatible_downstream_link_removed() {
        let registry = create_default_registry();
        let Fixture { mut graph, getter, .. } = fixture();
        let text = graph.add_node(registry.create_node(SHOW_TEXT).unwrap());
        let preview = graph.add_node(registry.create_node(PREVIEW_ANY).unwrap());

        // Unbound output is a wildcard, so both links are accepted for now.
        graph.connect(getter, 0, text, 0).unwrap();
        let kept = graph.connect(getter, 0, preview, 0).unwrap();

        on_name_selected(&mut graph, getter, "seed");

        assert_eq!(graph.links_from(getter, 0), vec![kept]);
        assert_eq!(graph.link_into(text, 0), None);
    }

    #[test]
    fn test_upstream_binding_is_producer_input() {
        let Fixture { mut graph, int, getter, setter } = fixture();
        assert_eq!(get_upstream_binding(&graph, getter), None);

        on_name_selected(&mut graph, getter, "seed");

        let upstream = get_upstream_binding(&graph, getter).unwrap();
        let link = graph.link(upstream).unwrap();
        assert_eq!(link.from_node, int);
        assert_eq!(link.to_node, setter);
    }

    #[test]
    fn test_available_names_offered() {
        let Fixture { mut graph, getter, .. } = fixture();
        refresh_choices(&mut graph, getter, &[]);

        assert_eq!(available_names(&graph), vec!["seed"]);
        assert_eq!(graph.node(getter).unwrap().consumer().unwrap().choices, vec!["seed"]);
    }
}

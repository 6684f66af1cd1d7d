// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binding resolution between producers and consumers.
//!
//! A binding is never stored: a consumer is bound to a producer exactly when
//! its selected name equals the producer's non-empty variable name. Every
//! query here recomputes that relation from the graph.
//!
//! Fan-out is depth-1. A propagation touches the consumers that depend on
//! the edited producer directly; anything further downstream of those
//! consumers is revisited only by its own events.

use crate::access::GraphAccess;
use crate::consumer;
use crate::node::{Node, NodeId, Role};
use std::collections::HashSet;

/// First producer publishing `name`, skipping `excluding`.
///
/// With duplicate names the first producer in graph order wins.
pub fn resolve_producer(
    graph: &dyn GraphAccess,
    name: &str,
    excluding: &[NodeId],
) -> Option<NodeId> {
    let first = graph.find_producer_by_name(name)?;
    if !excluding.contains(&first) {
        return Some(first);
    }

    // Only reached while a duplicated name has not been suffixed yet.
    graph
        .find_nodes_by_role(Role::Producer)
        .into_iter()
        .filter(|id| !excluding.contains(id))
        .find(|id| variable_name(graph, *id) == Some(name))
}

/// Consumers whose selected name is `name`. The empty name selects nothing.
pub fn find_consumers(graph: &dyn GraphAccess, name: &str) -> Vec<NodeId> {
    if name.is_empty() {
        return Vec::new();
    }
    graph
        .find_nodes_by_role(Role::Consumer)
        .into_iter()
        .filter(|id| {
            graph
                .node(*id)
                .and_then(Node::consumer)
                .is_some_and(|state| state.selected_name == name)
        })
        .collect()
}

/// Sorted, de-duplicated names published by producers, skipping `excluding`
pub fn available_names(graph: &dyn GraphAccess, excluding: &[NodeId]) -> Vec<String> {
    let mut names: Vec<String> = graph
        .find_nodes_by_role(Role::Producer)
        .into_iter()
        .filter(|id| !excluding.contains(id))
        .filter_map(|id| variable_name(graph, id).map(String::from))
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Names held by every producer other than `producer`
pub fn occupied_names(graph: &dyn GraphAccess, producer: NodeId) -> HashSet<String> {
    graph
        .find_nodes_by_role(Role::Producer)
        .into_iter()
        .filter(|id| *id != producer)
        .filter_map(|id| variable_name(graph, id).map(String::from))
        .collect()
}

/// Push a producer's current name and type to its dependents.
///
/// Consumers on the current name take the producer's type, consumers still
/// on the previous name follow the rename, and every consumer refreshes its
/// offered names. Afterwards the current name becomes the previous name.
pub fn propagate(graph: &mut dyn GraphAccess, producer: NodeId) {
    let Some(state) = graph.node(producer).and_then(Node::producer) else {
        return;
    };
    let name = state.variable_name.clone();
    let previous = state.previous_name.clone();

    let bound = find_consumers(graph, &name);
    for id in &bound {
        consumer::apply_resolution(graph, *id, Some(producer));
    }

    if previous != name {
        let renamed = find_consumers(graph, &previous);
        if !renamed.is_empty() {
            tracing::debug!(
                producer = ?producer,
                from = %previous,
                to = %name,
                count = renamed.len(),
                "carrying consumers over rename"
            );
        }
        for id in renamed {
            // An emptied name releases its consumers instead of clearing their selection.
            let target = if name.is_empty() { previous.as_str() } else { name.as_str() };
            consumer::on_name_selected(graph, id, target);
        }
    }

    for id in graph.find_nodes_by_role(Role::Consumer) {
        consumer::refresh_choices(graph, id, &[]);
    }

    if let Some(state) = graph.node_mut(producer).and_then(Node::producer_mut) {
        state.previous_name = name;
    }

    tracing::debug!(producer = ?producer, bound = bound.len(), "propagated variable");
}

/// Re-resolve every consumer as though `producer` were already gone
pub fn release_dependents(graph: &mut dyn GraphAccess, producer: NodeId) {
    let name = variable_name(graph, producer).map(String::from).unwrap_or_default();
    let orphaned = find_consumers(graph, &name);

    for id in graph.find_nodes_by_role(Role::Consumer) {
        consumer::refresh_choices(graph, id, &[producer]);
    }
    for id in &orphaned {
        let fallback = resolve_producer(graph, &name, &[producer]);
        consumer::apply_resolution(graph, *id, fallback);
    }

    if !orphaned.is_empty() {
        tracing::debug!(
            producer = ?producer,
            name = %name,
            count = orphaned.len(),
            "released consumers of removed producer"
        );
    }
}

fn variable_name(graph: &dyn GraphAccess, id: NodeId) -> Option<&str> {
    graph
        .node(id)
        .and_then(Node::producer)
        .map(|state| state.variable_name.as_str())
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Producer node: publishes a named, typed value.
//!
//! A producer is the only writer of its name. Its bound type is the type
//! of its single input; the output mirrors it onward for chaining.

use crate::access::GraphAccess;
use crate::allocator;
use crate::node::{Node, NodeId};
use crate::resolver;
use crate::slot::SlotType;

/// Title prefix; the bare prefix is the unnamed placeholder
pub const TITLE_PREFIX: &str = "Set_";

/// Rename the variable, keeping names unique, then notify dependents
pub fn on_name_edited(graph: &mut dyn GraphAccess, producer: NodeId, new_name: &str) {
    let Some(state) = graph.node_mut(producer).and_then(Node::producer_mut) else {
        return;
    };
    state.variable_name = new_name.to_string();

    validate_name(graph, producer);
    retitle(graph, producer);
    propagate(graph, producer);
}

/// Suffix the current name until no other producer holds it.
///
/// Returns the name the producer ends up with.
pub fn validate_name(graph: &mut dyn GraphAccess, producer: NodeId) -> String {
    let occupied = resolver::occupied_names(graph, producer);
    let Some(state) = graph.node_mut(producer).and_then(Node::producer_mut) else {
        return String::new();
    };

    let allocated = allocator::allocate(&state.variable_name, &occupied);
    if allocated != state.variable_name {
        tracing::debug!(
            producer = ?producer,
            requested = %state.variable_name,
            allocated = %allocated,
            "variable name taken, suffixed"
        );
        state.variable_name = allocated.clone();
    }
    allocated
}

/// An upstream value of `source_type` was connected to the input
pub fn on_input_connected(graph: &mut dyn GraphAccess, producer: NodeId, source_type: SlotType) {
    let Some(node) = graph.node_mut(producer) else {
        return;
    };
    if node.title == TITLE_PREFIX {
        node.title = format!("{TITLE_PREFIX}{source_type}");
    }
    if let Some(slot) = node.inputs.get_mut(0) {
        slot.retype(source_type.clone());
    }
    let Some(state) = node.producer_mut() else {
        return;
    };
    if state.variable_name == SlotType::WILDCARD {
        state.variable_name = source_type.to_string();
    }
    let name = state.variable_name.clone();

    on_name_edited(graph, producer, &name);
}

/// The input link went away; the bound type reverts to the wildcard
pub fn on_input_disconnected(graph: &mut dyn GraphAccess, producer: NodeId) {
    let Some(slot) = graph.node_mut(producer).and_then(|node| node.inputs.get_mut(0)) else {
        return;
    };
    slot.retype(SlotType::Any);
    propagate(graph, producer);
}

/// Mirror an arriving downstream type onto the output slot
pub fn on_output_connected(graph: &mut dyn GraphAccess, producer: NodeId, downstream_type: SlotType) {
    if let Some(slot) = graph.node_mut(producer).and_then(|node| node.outputs.get_mut(0)) {
        slot.retype(downstream_type);
    }
}

/// The output link went away
pub fn on_output_disconnected(graph: &mut dyn GraphAccess, producer: NodeId) {
    if let Some(slot) = graph.node_mut(producer).and_then(|node| node.outputs.get_mut(0)) {
        slot.retype(SlotType::Any);
    }
}

/// Inserted into a graph, either fresh or from a saved workflow
pub fn on_added(graph: &mut dyn GraphAccess, producer: NodeId) {
    validate_name(graph, producer);
    retitle(graph, producer);
    propagate(graph, producer);
}

/// About to be detached: dependents re-resolve without this producer
pub fn on_removed(graph: &mut dyn GraphAccess, producer: NodeId) {
    resolver::release_dependents(graph, producer);
}

/// Push the current name and type to dependents
pub fn propagate(graph: &mut dyn GraphAccess, producer: NodeId) {
    resolver::propagate(graph, producer);
}

fn retitle(graph: &mut dyn GraphAccess, producer: NodeId) {
    let Some(node) = graph.node_mut(producer) else {
        return;
    };
    let Some(name) = node.producer().map(|state| state.variable_name.clone()) else {
        return;
    };
    if !name.is_empty() {
        node.title = format!("{TITLE_PREFIX}{name}");
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compilation of the editable graph into an executable one.
//!
//! Tunnel nodes are virtual. Every input fed through a consumer or a
//! producer pass-through is spliced onto the real upstream output, and the
//! tunnel nodes themselves are dropped.

use crate::access::GraphAccess;
use crate::consumer;
use crate::graph::Graph;
use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId, NodeKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where an executable input takes its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecInput {
    /// Origin node
    pub from_node: NodeId,
    /// Origin output slot index
    pub from_slot: usize,
}

/// A node in the executable graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecNode {
    /// Node ID, shared with the editable graph
    pub id: NodeId,
    /// Node type ID
    pub node_type: String,
    /// Title at compile time
    pub title: String,
    /// Resolved source per input slot, `None` when unconnected
    pub inputs: Vec<Option<ExecInput>>,
}

/// The graph as sent to an execution backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutableGraph {
    nodes: IndexMap<NodeId, ExecNode>,
}

impl ExecutableGraph {
    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Option<&ExecNode> {
        self.nodes.get(&id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &ExecNode> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialize for the backend
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Get nodes in topological order
    pub fn execution_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(*node_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        temp_mark: &mut HashSet<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(&node_id) {
            return Err(CycleError);
        }
        if visited.contains(&node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        // Dependencies first
        if let Some(node) = self.nodes.get(&node_id) {
            for input in node.inputs.iter().flatten() {
                self.visit(input.from_node, visited, temp_mark, order)?;
            }
        }

        temp_mark.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);

        Ok(())
    }
}

/// Build the executable graph, splicing out every tunnel
pub fn compile(graph: &Graph) -> Result<ExecutableGraph, CompileError> {
    let mut nodes = IndexMap::new();

    for node in graph.nodes().filter(|node| !node.is_virtual()) {
        let inputs = (0..node.inputs.len())
            .map(|slot| {
                graph
                    .link_into(node.id, slot)
                    .map(|link| resolve_origin(graph, link))
                    .transpose()
            })
            .collect::<Result<Vec<_>, _>>()?;

        nodes.insert(
            node.id,
            ExecNode {
                id: node.id,
                node_type: node.node_type.clone(),
                title: node.title.clone(),
                inputs,
            },
        );
    }

    let compiled = ExecutableGraph { nodes };
    compiled.execution_order()?;

    tracing::debug!(
        nodes = compiled.len(),
        dropped = graph.node_count() - compiled.len(),
        "compiled executable graph"
    );
    Ok(compiled)
}

/// Follow a link back through tunnel nodes to a real output
fn resolve_origin(graph: &Graph, link: LinkId) -> Result<ExecInput, CompileError> {
    let mut visited = HashSet::new();
    let mut current: &Link = graph.link(link).ok_or(CompileError::LinkNotFound(link))?;

    loop {
        let origin = graph
            .node(current.from_node)
            .ok_or(CompileError::NodeNotFound(current.from_node))?;
        if !visited.insert(origin.id) {
            return Err(CompileError::TunnelCycle(origin.id));
        }

        let upstream = match &origin.kind {
            NodeKind::Other => {
                return Ok(ExecInput {
                    from_node: origin.id,
                    from_slot: current.from_slot,
                });
            }
            NodeKind::Consumer(state) => {
                let producer = consumer::resolve_producer(graph, origin.id).ok_or_else(|| {
                    CompileError::UnboundConsumer {
                        node: origin.id,
                        name: state.selected_name.clone(),
                    }
                })?;
                consumer::get_upstream_binding(graph, origin.id)
                    .ok_or_else(|| missing_upstream(graph, producer))?
            }
            NodeKind::Producer(_) => graph
                .link_into(origin.id, 0)
                .ok_or_else(|| missing_upstream(graph, origin.id))?,
        };

        current = graph.link(upstream).ok_or(CompileError::LinkNotFound(upstream))?;
    }
}

fn missing_upstream(graph: &Graph, producer: NodeId) -> CompileError {
    CompileError::MissingUpstream {
        producer,
        name: graph
            .node(producer)
            .and_then(Node::producer)
            .map(|state| state.variable_name.clone())
            .unwrap_or_default(),
    }
}

/// Error when the graph contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("Graph contains a cycle")]
pub struct CycleError;

/// Error while compiling the executable graph
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Link not found
    #[error("Link not found: {0:?}")]
    LinkNotFound(LinkId),

    /// A consumer selects a name no producer publishes
    #[error("No producer publishes variable '{name}' (consumer {node:?})")]
    UnboundConsumer {
        /// The consumer
        node: NodeId,
        /// Its selected name
        name: String,
    },

    /// A producer has nothing connected to its input
    #[error("Variable '{name}' has no input (producer {producer:?})")]
    MissingUpstream {
        /// The producer
        producer: NodeId,
        /// Its variable name
        name: String,
    },

    /// Following tunnels led back to a node already visited
    #[error("Variable tunnels form a loop through {0:?}")]
    TunnelCycle(NodeId),

    /// The spliced graph is cyclic
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{
        create_default_registry, CONSUMER_TYPE, LOAD_IMAGE, PREVIEW_IMAGE, PRODUCER_TYPE,
        SCALE_IMAGE,
    };
    use crate::node::NodeRegistry;
    use crate::producer;
    use crate::slot::SlotType;

    struct Tunnel {
        graph: Graph,
        load: NodeId,
        setter: NodeId,
        getter: NodeId,
        preview: NodeId,
    }

    fn tunnel(registry: &NodeRegistry) -> Tunnel {
        let mut graph = Graph::default();
        let load = graph.add_node(registry.create_node(LOAD_IMAGE).unwrap());
        let setter = graph.add_node(registry.create_node(PRODUCER_TYPE).unwrap());
        let getter = graph.add_node(registry.create_node(CONSUMER_TYPE).unwrap());
        let preview = graph.add_node(registry.create_node(PREVIEW_IMAGE).unwrap());

        graph.connect(load, 0, setter, 0).unwrap();
        producer::on_input_connected(&mut graph, setter, SlotType::named("IMAGE"));
        producer::on_name_edited(&mut graph, setter, "photo");
        consumer::on_name_selected(&mut graph, getter, "photo");
        graph.connect(getter, 0, preview, 0).unwrap();

        Tunnel { graph, load, setter, getter, preview }
    }

    #[test]
    fn test_splices_consumer_onto_upstream() {
        let registry = create_default_registry();
        let Tunnel { graph, load, setter, getter, preview } = tunnel(&registry);

        let compiled = compile(&graph).unwrap();
        assert_eq!(compiled.len(), 2);
        assert!(compiled.node(setter).is_none());
        assert!(compiled.node(getter).is_none());
        assert_eq!(
            compiled.node(preview).unwrap().inputs,
            vec![Some(ExecInput { from_node: load, from_slot: 0 })]
        );
        assert_eq!(compiled.execution_order().unwrap(), vec![load, preview]);
        assert!(compiled.to_json_pretty().unwrap().contains("PreviewImage"));
    }

    #[test]
    fn test_splices_producer_passthrough() {
        let registry = create_default_registry();
        let Tunnel { mut graph, load, setter, .. } = tunnel(&registry);
        let scale = graph.add_node(registry.create_node(SCALE_IMAGE).unwrap());
        graph.connect(setter, 0, scale, 0).unwrap();

        let compiled = compile(&graph).unwrap();
        assert_eq!(
            compiled.node(scale).unwrap().inputs[0],
            Some(ExecInput { from_node: load, from_slot: 0 })
        );
        assert_eq!(compiled.node(scale).unwrap().inputs[1], None);
    }

    #[test]
    fn test_unbound_consumer_is_an_error() {
        let registry = create_default_registry();
        let Tunnel { mut graph, getter, .. } = tunnel(&registry);
        consumer::on_name_selected(&mut graph, getter, "nothing");
        // The preview link accepts IMAGE; the wildcard output keeps it.
        assert!(matches!(
            compile(&graph),
            Err(CompileError::UnboundConsumer { name, .. }) if name == "nothing"
        ));
    }

    #[test]
    fn test_producer_without_input_is_an_error() {
        let registry = create_default_registry();
        let Tunnel { mut graph, setter, .. } = tunnel(&registry);
        let link = graph.link_into(setter, 0).unwrap();
        graph.disconnect(link);
        producer::on_input_disconnected(&mut graph, setter);

        assert!(matches!(
            compile(&graph),
            Err(CompileError::MissingUpstream { name, .. }) if name == "photo"
        ));
    }
}

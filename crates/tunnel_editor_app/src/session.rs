// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session: the host side of the tunnel nodes.
//!
//! The session owns the graph and turns each edit into the node behavior
//! callbacks in a fixed order. Edits run one at a time and every edit is
//! recorded in the undo history once it has settled.

use crate::history::{History, HistoryError, StateSnapshot};
use crate::scheduler::PendingRefresh;
use crate::settings::EditorSettings;
use tunnel_editor_graph::builtin::create_default_registry;
use tunnel_editor_graph::{
    compile, consumer, producer, BehaviorRegistry, BindingState, CompileError, ConnectionChange,
    ConnectionError, ExecutableGraph, Graph, GraphAccess, Link, LinkId, Node, NodeBehavior,
    NodeId, NodeKind, NodeRegistry, Role, Slot, SlotDirection, SlotType, Workflow, WorkflowError,
};

/// Offset applied to duplicated nodes
const DUPLICATE_OFFSET: f32 = 20.0;

/// Error from a session edit
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Node type not registered
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Link not found
    #[error("Link not found: {0:?}")]
    LinkNotFound(LinkId),

    /// The node does not play the required role
    #[error("Node {0:?} is not a {1:?}")]
    WrongRole(NodeId, Role),

    /// Link rejected by the graph
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// History error
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Workflow error
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Compilation error
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// An editing session over one graph
pub struct EditorSession {
    graph: Graph,
    node_types: NodeRegistry,
    behaviors: BehaviorRegistry,
    history: History,
    pending: PendingRefresh,
    defer_propagation: bool,
}

impl EditorSession {
    /// Create an empty session with the built-in node types
    pub fn new(settings: &EditorSettings) -> Self {
        Self {
            graph: Graph::default(),
            node_types: create_default_registry(),
            behaviors: BehaviorRegistry::with_tunnels(),
            history: History::with_max_depth(settings.history_depth),
            pending: PendingRefresh::new(),
            defer_propagation: settings.defer_propagation,
        }
    }

    /// The edited graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Undo history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Add a node of a registered type
    pub fn add_node(&mut self, type_id: &str) -> Result<NodeId> {
        let node = self
            .node_types
            .create_node(type_id)
            .ok_or_else(|| SessionError::UnknownNodeType(type_id.to_string()))?;

        self.edit("Add node", |session| {
            let id = session.graph.add_node(node);
            session.with_behavior(id, |behavior, graph| behavior.on_created(graph, id));
            Ok(id)
        })
    }

    /// Clone a node next to the original
    pub fn duplicate_node(&mut self, id: NodeId) -> Result<NodeId> {
        let copy = self
            .graph
            .node(id)
            .cloned()
            .ok_or(SessionError::NodeNotFound(id))?;

        let [x, y] = copy.position;
        let mut copy = copy.with_position(x + DUPLICATE_OFFSET, y + DUPLICATE_OFFSET);
        copy.id = NodeId::new();
        copy.inputs = copy.inputs.iter().map(Slot::instantiate).collect();
        copy.outputs = copy.outputs.iter().map(Slot::instantiate).collect();
        if let NodeKind::Producer(state) = &mut copy.kind {
            state.previous_name.clear();
            if let Some(slot) = copy.inputs.get_mut(0) {
                slot.retype(SlotType::Any);
            }
        }

        self.edit("Duplicate node", |session| {
            let id = session.graph.add_node(copy);
            session.with_behavior(id, |behavior, graph| behavior.on_created(graph, id));
            Ok(id)
        })
    }

    /// Remove a node; dependents are notified before it is detached
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        if self.graph.node(id).is_none() {
            return Err(SessionError::NodeNotFound(id));
        }

        self.edit("Remove node", |session| {
            session.with_behavior(id, |behavior, graph| behavior.on_removed(graph, id));

            let links: Vec<LinkId> = session.graph.links_for_node(id).map(|l| l.id).collect();
            for link in links {
                session.detach_link(link, Some(id));
            }

            session.pending.cancel(id);
            session.graph.remove_node(id);
            Ok(())
        })
    }

    /// Link an output to an input, replacing the input's existing link
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_slot: usize,
        to_node: NodeId,
        to_slot: usize,
    ) -> Result<LinkId> {
        self.edit("Connect", |session| {
            let id = match session.graph.connect(from_node, from_slot, to_node, to_slot) {
                Err(ConnectionError::SlotAlreadyConnected(..)) => {
                    if let Some(existing) = session.graph.link_into(to_node, to_slot) {
                        session.detach_link(existing, None);
                    }
                    session.graph.connect(from_node, from_slot, to_node, to_slot)?
                }
                other => other?,
            };

            let link = session
                .graph
                .link(id)
                .cloned()
                .ok_or(SessionError::LinkNotFound(id))?;
            session.with_behavior(from_node, |behavior, graph| {
                behavior.on_connections_change(
                    graph,
                    from_node,
                    &ConnectionChange::connected(SlotDirection::Output, from_slot, link.clone()),
                );
            });
            session.with_behavior(to_node, |behavior, graph| {
                behavior.on_connections_change(
                    graph,
                    to_node,
                    &ConnectionChange::connected(SlotDirection::Input, to_slot, link),
                );
            });
            Ok(id)
        })
    }

    /// Remove a link
    pub fn disconnect(&mut self, link: LinkId) -> Result<()> {
        if self.graph.link(link).is_none() {
            return Err(SessionError::LinkNotFound(link));
        }
        self.edit("Disconnect", |session| {
            session.detach_link(link, None);
            Ok(())
        })
    }

    /// Rename a producer's variable; returns the name it ends up with
    pub fn rename_variable(&mut self, id: NodeId, name: &str) -> Result<String> {
        self.require_role(id, Role::Producer)?;
        self.edit("Rename variable", |session| {
            producer::on_name_edited(&mut session.graph, id, name);
            Ok(session
                .graph
                .node(id)
                .and_then(Node::producer)
                .map(|state| state.variable_name.clone())
                .unwrap_or_default())
        })
    }

    /// Point a consumer at a variable name
    pub fn select_variable(&mut self, id: NodeId, name: &str) -> Result<BindingState> {
        self.require_role(id, Role::Consumer)?;
        self.edit("Select variable", |session| {
            consumer::on_name_selected(&mut session.graph, id, name);
            Ok(consumer::binding_state(&session.graph, id))
        })
    }

    /// Names a consumer can currently select
    pub fn available_names(&self) -> Vec<String> {
        consumer::available_names(&self.graph)
    }

    /// Consumers whose selected name resolves to no producer.
    ///
    /// A consumer with no name selected yet is not reported.
    pub fn unresolved_consumers(&self) -> Vec<(NodeId, String)> {
        self.graph
            .find_nodes_by_role(Role::Consumer)
            .into_iter()
            .filter(|id| consumer::resolve_producer(&self.graph, *id).is_none())
            .filter_map(|id| {
                let state = self.graph.node(id)?.consumer()?;
                (!state.selected_name.is_empty()).then(|| (id, state.selected_name.clone()))
            })
            .collect()
    }

    /// Replace the graph with a saved workflow.
    ///
    /// Every node is inserted before any is configured. Tunnel nodes are then
    /// refreshed once more, on the next tick when propagation is deferred.
    pub fn load_workflow(&mut self, workflow: Workflow) {
        let mut graph = Graph::new(workflow.name);
        for node in &workflow.nodes {
            let mut node = node.clone();
            // Names come back one producer at a time in configure, so the
            // first holder of a duplicated name keeps it.
            if let Some(state) = node.producer_mut() {
                state.variable_name.clear();
                state.previous_name.clear();
            }
            graph.add_node(node);
        }
        for link in workflow.links {
            if let Err(e) = graph.insert_link(link) {
                tracing::warn!("Dropping saved link: {e}");
            }
        }

        self.graph = graph;
        self.history.clear();
        self.pending = PendingRefresh::new();

        for node in &workflow.nodes {
            self.with_behavior(node.id, |behavior, graph| {
                behavior.on_configure(graph, node.id, &node.kind);
            });
            if node.is_virtual() {
                self.pending.schedule(node.id);
            }
        }

        tracing::info!(
            "Loaded workflow '{}': {} nodes, {} links",
            self.graph.name,
            self.graph.node_count(),
            self.graph.link_count()
        );

        if !self.defer_propagation {
            self.tick();
        }
    }

    /// Snapshot the graph for saving
    pub fn to_workflow(&self) -> Workflow {
        Workflow::from_graph(&self.graph)
    }

    /// Run the deferred refresh pass; returns how many nodes were refreshed
    pub fn tick(&mut self) -> usize {
        let mut refreshed = 0;
        for id in self.pending.drain() {
            match self.graph.node(id).map(Node::role) {
                Some(Role::Producer) => producer::propagate(&mut self.graph, id),
                Some(Role::Consumer) => {
                    let selected = self
                        .graph
                        .node(id)
                        .and_then(Node::consumer)
                        .map(|state| state.selected_name.clone())
                        .unwrap_or_default();
                    consumer::refresh_choices(&mut self.graph, id, &[]);
                    consumer::on_name_selected(&mut self.graph, id, &selected);
                }
                Some(Role::Other) | None => continue,
            }
            refreshed += 1;
        }

        if refreshed > 0 {
            tracing::debug!(refreshed, "deferred tunnel refresh");
        }
        refreshed
    }

    /// Number of nodes waiting for the next tick
    pub fn pending_refreshes(&self) -> usize {
        self.pending.len()
    }

    /// Undo the last edit; returns its description
    pub fn undo(&mut self) -> Result<String> {
        let operation = self.history.undo()?;
        self.restore(&operation.before)?;
        Ok(operation.description)
    }

    /// Redo the last undone edit; returns its description
    pub fn redo(&mut self) -> Result<String> {
        let operation = self.history.redo()?;
        self.restore(&operation.after)?;
        Ok(operation.description)
    }

    /// Build the executable graph
    pub fn compile(&self) -> Result<ExecutableGraph> {
        Ok(compile(&self.graph)?)
    }

    fn edit<T>(&mut self, description: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let before = StateSnapshot::from_value(&self.graph)?;
        let output = f(self)?;
        let after = StateSnapshot::from_value(&self.graph)?;
        self.history.record(description, before, after);
        Ok(output)
    }

    fn restore(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        self.graph = snapshot.to_value()?;
        self.pending = PendingRefresh::new();
        for id in self.graph.find_nodes_by_role(Role::Consumer) {
            consumer::refresh_choices(&mut self.graph, id, &[]);
        }
        Ok(())
    }

    fn require_role(&self, id: NodeId, role: Role) -> Result<()> {
        match self.graph.node(id).map(Node::role) {
            Some(actual) if actual == role => Ok(()),
            Some(_) => Err(SessionError::WrongRole(id, role)),
            None => Err(SessionError::NodeNotFound(id)),
        }
    }

    /// Remove a link and tell both endpoints, except a node being removed
    fn detach_link(&mut self, id: LinkId, removing: Option<NodeId>) -> Option<Link> {
        let link = self.graph.disconnect(id)?;

        if removing != Some(link.from_node) {
            self.with_behavior(link.from_node, |behavior, graph| {
                behavior.on_connections_change(
                    graph,
                    link.from_node,
                    &ConnectionChange::disconnected(SlotDirection::Output, link.from_slot, link.clone()),
                );
            });
        }
        if removing != Some(link.to_node) {
            self.with_behavior(link.to_node, |behavior, graph| {
                behavior.on_connections_change(
                    graph,
                    link.to_node,
                    &ConnectionChange::disconnected(SlotDirection::Input, link.to_slot, link.clone()),
                );
            });
        }
        Some(link)
    }

    fn with_behavior(&mut self, id: NodeId, f: impl FnOnce(&dyn NodeBehavior, &mut Graph)) {
        let Some(node_type) = self.graph.node(id).map(|node| node.node_type.clone()) else {
            return;
        };
        if let Some(behavior) = self.behaviors.get(&node_type) {
            f(behavior, &mut self.graph);
        }
    }
}

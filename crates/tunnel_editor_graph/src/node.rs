// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::slot::{Slot, SlotType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Input nodes (constants, loaders)
    Input,
    /// Output nodes (previews, savers)
    Output,
    /// Image operations
    Image,
    /// Utility nodes, including the variable tunnels
    Utility,
}

/// Role a node plays in the variable namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Publishes a named value
    Producer,
    /// Reads a named value
    Consumer,
    /// Any other host node
    Other,
}

/// Whether a consumer currently resolves to a producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BindingState {
    /// No producer carries the selected name
    #[default]
    Unbound,
    /// A producer carries the selected name
    Bound,
}

/// Producer attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerState {
    /// Published variable name (empty means inert)
    pub variable_name: String,
    /// Name held before the last edit, used to carry consumers over a rename
    pub previous_name: String,
}

/// Consumer attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerState {
    /// Selected variable name
    pub selected_name: String,
    /// Result of the last resolution
    #[serde(default)]
    pub state: BindingState,
    /// Names offered by the selection control, refreshed on every edit
    #[serde(skip)]
    pub choices: Vec<String>,
}

/// Role-specific node attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Variable producer
    Producer(ProducerState),
    /// Variable consumer
    Consumer(ConsumerState),
    /// Plain host node
    #[default]
    Other,
}

impl NodeKind {
    /// The role tag for this kind
    pub fn role(&self) -> Role {
        match self {
            Self::Producer(_) => Role::Producer,
            Self::Consumer(_) => Role::Consumer,
            Self::Other => Role::Other,
        }
    }

    /// Tunnel nodes never reach the execution backend
    pub fn is_virtual(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Node type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeType {
    /// Unique type identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Default input slots
    pub inputs: Vec<Slot>,
    /// Default output slots
    pub outputs: Vec<Slot>,
    /// Initial role-specific attributes
    pub kind: NodeKind,
}

/// A node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type ID
    pub node_type: String,
    /// Visible title
    pub title: String,
    /// Position in the graph UI
    pub position: [f32; 2],
    /// Input slots
    pub inputs: Vec<Slot>,
    /// Output slots
    pub outputs: Vec<Slot>,
    /// Role-specific attributes
    pub kind: NodeKind,
}

impl Node {
    /// Create a new node from a type definition
    pub fn new(node_type: &NodeType) -> Self {
        Self {
            id: NodeId::new(),
            node_type: node_type.id.clone(),
            title: node_type.name.clone(),
            position: [0.0, 0.0],
            inputs: node_type.inputs.iter().map(Slot::instantiate).collect(),
            outputs: node_type.outputs.iter().map(Slot::instantiate).collect(),
            kind: node_type.kind.clone(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Role tag
    pub fn role(&self) -> Role {
        self.kind.role()
    }

    /// Whether the node is excluded from the executable graph
    pub fn is_virtual(&self) -> bool {
        self.kind.is_virtual()
    }

    /// Get an input slot by index
    pub fn input(&self, index: usize) -> Option<&Slot> {
        self.inputs.get(index)
    }

    /// Get an output slot by index
    pub fn output(&self, index: usize) -> Option<&Slot> {
        self.outputs.get(index)
    }

    /// Type of an output slot, wildcard when the slot is missing
    pub fn output_type(&self, index: usize) -> SlotType {
        self.output(index)
            .map(|slot| slot.slot_type.clone())
            .unwrap_or_default()
    }

    /// Producer attributes, if this node is a producer
    pub fn producer(&self) -> Option<&ProducerState> {
        match &self.kind {
            NodeKind::Producer(state) => Some(state),
            _ => None,
        }
    }

    /// Mutable producer attributes
    pub fn producer_mut(&mut self) -> Option<&mut ProducerState> {
        match &mut self.kind {
            NodeKind::Producer(state) => Some(state),
            _ => None,
        }
    }

    /// Consumer attributes, if this node is a consumer
    pub fn consumer(&self) -> Option<&ConsumerState> {
        match &self.kind {
            NodeKind::Consumer(state) => Some(state),
            _ => None,
        }
    }

    /// Mutable consumer attributes
    pub fn consumer_mut(&mut self) -> Option<&mut ConsumerState> {
        match &mut self.kind {
            NodeKind::Consumer(state) => Some(state),
            _ => None,
        }
    }

    /// A producer's bound type: the type of its input slot
    pub fn bound_type(&self) -> SlotType {
        self.input(0)
            .map(|slot| slot.slot_type.clone())
            .unwrap_or_default()
    }
}

/// Registry of available node types
pub struct NodeRegistry {
    /// Registered node types by ID
    types: indexmap::IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: indexmap::IndexMap::new(),
        }
    }

    /// Register a node type
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Create a node from a type ID
    pub fn create_node(&self, type_id: &str) -> Option<Node> {
        self.get(type_id).map(Node::new)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

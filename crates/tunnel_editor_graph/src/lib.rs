// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph with variable tunnels.
//!
//! A "Set" node (producer) publishes its input under a variable name, and
//! any number of "Get" nodes (consumers) read it back by selecting that
//! name, without a drawn link between them.
//!
//! ## Architecture
//!
//! - Typed slots and links on an `IndexMap`-backed graph
//! - A [`GraphAccess`] service handed explicitly to every tunnel operation
//! - Unique name allocation and a name-based binding resolver
//! - [`NodeBehavior`] callbacks the host invokes on graph edits
//! - Compilation into an [`ExecutableGraph`] with the tunnels spliced out
//! - RON/JSON workflow persistence

pub mod access;
pub mod allocator;
pub mod behavior;
pub mod builtin;
pub mod compile;
pub mod consumer;
pub mod graph;
pub mod link;
pub mod node;
pub mod producer;
pub mod resolver;
pub mod slot;
pub mod workflow;

pub use access::GraphAccess;
pub use behavior::{BehaviorRegistry, ConnectionChange, NodeBehavior};
pub use compile::{compile, CompileError, ExecutableGraph};
pub use graph::{ConnectionError, Graph};
pub use link::{Link, LinkId};
pub use node::{BindingState, Node, NodeId, NodeKind, NodeRegistry, NodeType, Role};
pub use slot::{Slot, SlotDirection, SlotId, SlotType};
pub use workflow::{Workflow, WorkflowError, WorkflowFormat};

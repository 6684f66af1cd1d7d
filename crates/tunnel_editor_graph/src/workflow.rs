// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saved workflows.
//!
//! A workflow is the persisted form of an editable graph. Loading one only
//! yields data; the host replays it into a graph and configures every node,
//! since saved tunnel state may be stale relative to the rest of the graph.

use crate::graph::Graph;
use crate::link::Link;
use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current workflow format version
pub const WORKFLOW_FORMAT_VERSION: u32 = 1;

/// On-disk encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkflowFormat {
    /// Rusty Object Notation
    #[default]
    Ron,
    /// JSON
    Json,
}

impl WorkflowFormat {
    /// Pick the format from a file extension; anything but `.json` is RON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Ron,
        }
    }
}

/// A saved graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Format version
    pub version: u32,
    /// Graph name
    pub name: String,
    /// Nodes in graph order
    pub nodes: Vec<Node>,
    /// Links between nodes
    pub links: Vec<Link>,
}

impl Workflow {
    /// Snapshot a graph
    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            version: WORKFLOW_FORMAT_VERSION,
            name: graph.name.clone(),
            nodes: graph.nodes().cloned().collect(),
            links: graph.links().cloned().collect(),
        }
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, WorkflowError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Parse from RON
    pub fn from_ron(content: &str) -> Result<Self, WorkflowError> {
        Self::checked(ron::from_str(content)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, WorkflowError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(content: &str) -> Result<Self, WorkflowError> {
        Self::checked(serde_json::from_str(content)?)
    }

    /// Load from a file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self, WorkflowError> {
        let content = std::fs::read_to_string(path)?;
        match WorkflowFormat::from_path(path) {
            WorkflowFormat::Ron => Self::from_ron(&content),
            WorkflowFormat::Json => Self::from_json(&content),
        }
    }

    /// Save to a file, picking the format from its extension
    pub fn save(&self, path: &Path) -> Result<(), WorkflowError> {
        let content = match WorkflowFormat::from_path(path) {
            WorkflowFormat::Ron => self.to_ron()?,
            WorkflowFormat::Json => self.to_json()?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    fn checked(workflow: Self) -> Result<Self, WorkflowError> {
        if workflow.version > WORKFLOW_FORMAT_VERSION {
            return Err(WorkflowError::UnsupportedVersion {
                found: workflow.version,
                supported: WORKFLOW_FORMAT_VERSION,
            });
        }
        Ok(workflow)
    }
}

/// Error while reading or writing a workflow
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Saved by a newer editor
    #[error("Workflow version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{create_default_registry, PRIMITIVE_INT, PRODUCER_TYPE};
    use crate::node::NodeKind;

    fn sample() -> Workflow {
        let registry = create_default_registry();
        let mut graph = Graph::new("sample");
        let int = graph.add_node(registry.create_node(PRIMITIVE_INT).unwrap());
        let mut setter = registry.create_node(PRODUCER_TYPE).unwrap();
        if let Some(state) = setter.producer_mut() {
            state.variable_name = "seed".to_string();
        }
        let setter = graph.add_node(setter);
        graph.connect(int, 0, setter, 0).unwrap();
        Workflow::from_graph(&graph)
    }

    #[test]
    fn test_ron_keeps_tunnel_state() {
        let ron = sample().to_ron().unwrap();
        let loaded = Workflow::from_ron(&ron).unwrap();
        assert_eq!(loaded.name, "sample");
        assert_eq!(loaded.links.len(), 1);
        assert!(matches!(
            &loaded.nodes[1].kind,
            NodeKind::Producer(state) if state.variable_name == "seed"
        ));
    }

    #[test]
    fn test_rejects_newer_version() {
        let mut workflow = sample();
        workflow.version = WORKFLOW_FORMAT_VERSION + 1;
        let json = workflow.to_json().unwrap();
        assert!(matches!(
            Workflow::from_json(&json),
            Err(WorkflowError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(WorkflowFormat::from_path(Path::new("a.JSON")), WorkflowFormat::Json);
        assert_eq!(WorkflowFormat::from_path(Path::new("a.ron")), WorkflowFormat::Ron);
        assert_eq!(WorkflowFormat::from_path(Path::new("a")), WorkflowFormat::Ron);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node types: the variable tunnels plus a small host catalog.

use crate::consumer;
use crate::node::{ConsumerState, NodeCategory, NodeKind, NodeRegistry, NodeType, ProducerState};
use crate::producer;
use crate::slot::{Slot, SlotDirection, SlotType};

/// Type ID of the variable producer
pub const PRODUCER_TYPE: &str = "SetVariable";
/// Type ID of the variable consumer
pub const CONSUMER_TYPE: &str = "GetVariable";

/// Integer constant
pub const PRIMITIVE_INT: &str = "PrimitiveInt";
/// Float constant
pub const PRIMITIVE_FLOAT: &str = "PrimitiveFloat";
/// String constant
pub const PRIMITIVE_STRING: &str = "PrimitiveString";
/// Image loader
pub const LOAD_IMAGE: &str = "LoadImage";
/// Image scaler
pub const SCALE_IMAGE: &str = "ImageScale";
/// Image preview sink
pub const PREVIEW_IMAGE: &str = "PreviewImage";
/// Text display sink
pub const SHOW_TEXT: &str = "ShowText";
/// Sink that takes anything
pub const PREVIEW_ANY: &str = "PreviewAny";

/// Register the producer and consumer node types
pub fn register_tunnels(registry: &mut NodeRegistry) {
    registry.register(NodeType {
        id: PRODUCER_TYPE.to_string(),
        name: producer::TITLE_PREFIX.to_string(),
        category: NodeCategory::Utility,
        description: "Publishes its input under a variable name for matching Get nodes".to_string(),
        inputs: vec![Slot::wildcard(SlotDirection::Input)],
        outputs: vec![Slot::wildcard(SlotDirection::Output)],
        kind: NodeKind::Producer(ProducerState::default()),
    });

    registry.register(NodeType {
        id: CONSUMER_TYPE.to_string(),
        name: consumer::TITLE_PREFIX.to_string(),
        category: NodeCategory::Utility,
        description: "Reads the value published by the Set node with the selected name".to_string(),
        inputs: vec![],
        outputs: vec![Slot::wildcard(SlotDirection::Output)],
        kind: NodeKind::Consumer(ConsumerState::default()),
    });
}

/// Create a registry with the tunnels and the host catalog
pub fn create_default_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_tunnels(&mut registry);

    // Constants
    registry.register(host_type(
        PRIMITIVE_INT,
        "Int",
        NodeCategory::Input,
        "Constant integer",
        vec![],
        vec![Slot::output("INT", SlotType::named("INT"))],
    ));

    registry.register(host_type(
        PRIMITIVE_FLOAT,
        "Float",
        NodeCategory::Input,
        "Constant float",
        vec![],
        vec![Slot::output("FLOAT", SlotType::named("FLOAT"))],
    ));

    registry.register(host_type(
        PRIMITIVE_STRING,
        "String",
        NodeCategory::Input,
        "Constant string",
        vec![],
        vec![Slot::output("STRING", SlotType::named("STRING"))],
    ));

    // Images
    registry.register(host_type(
        LOAD_IMAGE,
        "Load Image",
        NodeCategory::Input,
        "Load an image and its alpha mask from disk",
        vec![],
        vec![
            Slot::output("IMAGE", SlotType::named("IMAGE")),
            Slot::output("MASK", SlotType::named("MASK")),
        ],
    ));

    registry.register(host_type(
        SCALE_IMAGE,
        "Scale Image",
        NodeCategory::Image,
        "Resize an image",
        vec![
            Slot::input("image", SlotType::named("IMAGE")),
            Slot::input("width", SlotType::from("INT,FLOAT")),
            Slot::input("height", SlotType::from("INT,FLOAT")),
        ],
        vec![Slot::output("IMAGE", SlotType::named("IMAGE"))],
    ));

    // Sinks
    registry.register(host_type(
        PREVIEW_IMAGE,
        "Preview Image",
        NodeCategory::Output,
        "Show an image in the editor",
        vec![Slot::input("images", SlotType::named("IMAGE"))],
        vec![],
    ));

    registry.register(host_type(
        SHOW_TEXT,
        "Show Text",
        NodeCategory::Output,
        "Show a string in the editor",
        vec![Slot::input("text", SlotType::named("STRING"))],
        vec![],
    ));

    registry.register(host_type(
        PREVIEW_ANY,
        "Preview Any",
        NodeCategory::Output,
        "Show any value in the editor",
        vec![Slot::wildcard(SlotDirection::Input)],
        vec![],
    ));

    registry
}

fn host_type(
    id: &str,
    name: &str,
    category: NodeCategory,
    description: &str,
    inputs: Vec<Slot>,
    outputs: Vec<Slot>,
) -> NodeType {
    NodeType {
        id: id.to_string(),
        name: name.to_string(),
        category,
        description: description.to_string(),
        inputs,
        outputs,
        kind: NodeKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Role;

    #[test]
    fn test_default_registry() {
        let registry = create_default_registry();
        assert_eq!(registry.types().count(), 10);
        assert_eq!(registry.types_in_category(NodeCategory::Utility).count(), 2);

        let setter = registry.create_node(PRODUCER_TYPE).unwrap();
        assert_eq!(setter.role(), Role::Producer);
        assert!(setter.is_virtual());
        assert_eq!(setter.title, "Set_");

        let image = registry.create_node(LOAD_IMAGE).unwrap();
        assert_eq!(image.role(), Role::Other);
        assert!(!image.is_virtual());
        assert!(registry.create_node("Missing").is_none());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot definitions for node inputs/outputs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub Uuid);

impl SlotId {
    /// Create a new random slot ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

/// Slot direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotDirection {
    /// Input slot
    Input,
    /// Output slot
    Output,
}

/// Type tag carried by a slot or declared by a link.
///
/// Host type names are opaque strings (`IMAGE`, `INT`, `LATENT`, ...).
/// The string form `*` is the wildcard and `A,B` declares a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SlotType {
    /// Wildcard, compatible with everything
    #[default]
    Any,
    /// A single concrete type
    Named(String),
    /// Any of several concrete types
    OneOf(Vec<String>),
}

impl SlotType {
    /// The wildcard tag in its string form
    pub const WILDCARD: &'static str = "*";

    /// Create a concrete type tag
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Whether this is the wildcard
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Concrete names covered by this tag (empty for the wildcard)
    pub fn names(&self) -> &[String] {
        match self {
            Self::Any => &[],
            Self::Named(name) => std::slice::from_ref(name),
            Self::OneOf(names) => names,
        }
    }

    /// Check if this type can connect to another type
    pub fn can_connect_to(&self, other: &SlotType) -> bool {
        if self.is_any() || other.is_any() {
            return true;
        }
        self.names().iter().any(|name| other.names().contains(name))
    }

    /// Whether a value of type `value` is acceptable where `self` is declared.
    ///
    /// A wildcard on either side is always admitted. For a set, every
    /// concrete name carried by `value` must be in the set.
    pub fn admits(&self, value: &SlotType) -> bool {
        if self.is_any() || value.is_any() {
            return true;
        }
        value.names().iter().all(|name| self.names().contains(name))
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(Self::WILDCARD),
            Self::Named(name) => f.write_str(name),
            Self::OneOf(names) => f.write_str(&names.join(",")),
        }
    }
}

impl FromStr for SlotType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let names: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        if names.is_empty() || names.iter().any(|name| name == Self::WILDCARD) {
            return Ok(Self::Any);
        }

        Ok(match <[String; 1]>::try_from(names) {
            Ok([single]) => Self::Named(single),
            Err(names) => Self::OneOf(names),
        })
    }
}

impl From<&str> for SlotType {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// A slot on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Unique slot ID
    pub id: SlotId,
    /// Slot name, shown on the node
    pub name: String,
    /// Slot direction
    pub direction: SlotDirection,
    /// Data type
    pub slot_type: SlotType,
}

impl Slot {
    /// Create a new input slot
    pub fn input(name: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            id: SlotId::new(),
            name: name.into(),
            direction: SlotDirection::Input,
            slot_type,
        }
    }

    /// Create a new output slot
    pub fn output(name: impl Into<String>, slot_type: SlotType) -> Self {
        Self {
            id: SlotId::new(),
            name: name.into(),
            direction: SlotDirection::Output,
            slot_type,
        }
    }

    /// A wildcard slot named `*`, as tunnel nodes start out
    pub fn wildcard(direction: SlotDirection) -> Self {
        Self {
            id: SlotId::new(),
            name: SlotType::WILDCARD.to_string(),
            direction,
            slot_type: SlotType::Any,
        }
    }

    /// Copy of a template slot with its own ID
    pub fn instantiate(&self) -> Self {
        Self {
            id: SlotId::new(),
            ..self.clone()
        }
    }

    /// Retype the slot; the visible name follows the type
    pub fn retype(&mut self, slot_type: SlotType) {
        self.name = slot_type.to_string();
        self.slot_type = slot_type;
    }

    /// Check if a connection to another slot is valid
    pub fn can_connect(&self, other: &Slot) -> bool {
        if self.direction == other.direction {
            return false;
        }
        self.slot_type.can_connect_to(&other.slot_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_tags() {
        assert_eq!(SlotType::from("*"), SlotType::Any);
        assert_eq!(SlotType::from(""), SlotType::Any);
        assert_eq!(SlotType::from("INT"), SlotType::named("INT"));
        assert_eq!(
            SlotType::from("INT, FLOAT"),
            SlotType::OneOf(vec!["INT".into(), "FLOAT".into()])
        );
        assert_eq!(SlotType::from("INT,FLOAT").to_string(), "INT,FLOAT");
    }

    #[test]
    fn test_admits() {
        let strings = SlotType::named("STRING");
        assert!(!strings.admits(&SlotType::named("INT")));
        assert!(strings.admits(&SlotType::named("STRING")));
        assert!(strings.admits(&SlotType::Any));
        assert!(SlotType::Any.admits(&SlotType::named("INT")));
        assert!(SlotType::from("INT,FLOAT").admits(&SlotType::named("FLOAT")));
    }

    #[test]
    fn test_can_connect() {
        let out = Slot::output("out", SlotType::named("IMAGE"));
        let image_in = Slot::input("in", SlotType::named("IMAGE"));
        let mask_in = Slot::input("in", SlotType::named("MASK"));
        let any_in = Slot::wildcard(SlotDirection::Input);

        assert!(out.can_connect(&image_in));
        assert!(!out.can_connect(&mask_in));
        assert!(out.can_connect(&any_in));
        assert!(!image_in.can_connect(&mask_in));
    }
}

//! Tree nodes: identity, properties, options, and signals
//!
//! This module contains the node type itself plus the supporting pieces
//! owned by a node:
//!
//! - [`NodeId`] - Generational handle; a stale handle reports "gone"
//!   instead of silently aliasing a newer node in the same slot
//! - [`Node`] - Name, qualified type tag, capability tag, visibility flag,
//!   property bag, option set, and signal set
//! - [`PropertyList`] - Untyped descriptive state mutated by the owning
//!   node's own logic (no validation, no triggers)
//!
//! Nodes are created through the [`Registry`](crate::registry::Registry)
//! and owned by exactly one parent inside a [`Tree`](crate::tree::Tree).
//! Cross-references between nodes are held as `NodeId`s and must be
//! revalidated on use, since the referent may be destroyed independently.

use crate::config::option::{NodeOption, OptionList};
use crate::error::{Result, SimTreeError};
use crate::signal::Signal;
use crate::tree::path::validate_name;
use crate::types::Value;
use std::collections::BTreeMap;

/// Property name under which every node records its creation time
pub const PROP_CREATED_AT: &str = "created_at";

/// Generational handle to a node in a [`Tree`](crate::tree::Tree)
///
/// The generation is bumped when a slot is freed, so handles held across
/// a detach become detectably dead rather than pointing at whatever node
/// reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Untyped descriptive state attached to a node
///
/// Properties use the same typed-value model as options but carry no
/// validation, no triggers, and no external representation requirement.
#[derive(Debug, Clone, Default)]
pub struct PropertyList {
    values: BTreeMap<String, Value>,
}

impl PropertyList {
    /// Create an empty property list
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, overwriting any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Get a property value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Remove a property, returning its value if it was present
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Whether a property is present
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate properties in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A tree element with identity, configuration, and invocable behavior
pub struct Node {
    name: String,
    type_tag: String,
    capability: String,
    basic: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    properties: PropertyList,
    pub(crate) options: OptionList,
    signals: Vec<Signal>,
}

impl Node {
    /// Create a detached node with the given name and qualified type tag
    ///
    /// The node is stamped with a `created_at` property and carries the
    /// standard signal set. Its capability tag defaults to the type tag;
    /// builders of pluggable types override it with
    /// [`set_capability`](Node::set_capability).
    pub fn new(name: impl Into<String>, type_tag: impl Into<String>) -> Result<Node> {
        let name = name.into();
        validate_name(&name)?;
        let type_tag = type_tag.into();

        let mut properties = PropertyList::new();
        properties.set(PROP_CREATED_AT, chrono::Utc::now().to_rfc3339());

        let mut node = Node {
            name,
            capability: type_tag.clone(),
            type_tag,
            basic: true,
            parent: None,
            children: Vec::new(),
            properties,
            options: OptionList::new(),
            signals: Vec::new(),
        };
        for signal in crate::builtin::standard_signals() {
            node.register_signal(signal)?;
        }
        Ok(node)
    }

    /// The node's name (unique among its siblings)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// The qualified type name this node was built from
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// The abstract capability this node satisfies
    pub fn capability(&self) -> &str {
        &self.capability
    }

    /// Override the capability tag (done by builders of pluggable types)
    pub fn set_capability(&mut self, capability: impl Into<String>) {
        self.capability = capability.into();
    }

    /// Whether the node is shown in "basic" listings
    pub fn is_basic(&self) -> bool {
        self.basic
    }

    /// Set the basic/advanced visibility flag
    pub fn set_basic(&mut self, basic: bool) {
        self.basic = basic;
    }

    /// The id of the owning parent, if attached
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Ids of the owned children, in attach order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The node's property bag
    pub fn properties(&self) -> &PropertyList {
        &self.properties
    }

    /// Mutable access to the property bag (owning logic only)
    pub fn properties_mut(&mut self) -> &mut PropertyList {
        &mut self.properties
    }

    /// The node's option set
    pub fn options(&self) -> &OptionList {
        &self.options
    }

    /// Declare an option on this node
    pub fn add_option(&mut self, option: NodeOption) -> Result<()> {
        self.options.add(option)
    }

    /// Register a signal; duplicate names are rejected
    ///
    /// Signals are registered at construction time and immutable
    /// afterward; there is no removal.
    pub fn register_signal(&mut self, signal: Signal) -> Result<()> {
        if self.signal(signal.name()).is_some() {
            return Err(SimTreeError::DuplicateName(signal.name().to_string()));
        }
        self.signals.push(signal);
        Ok(())
    }

    /// Look up a signal by name
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name() == name)
    }

    /// Iterate all signals, hidden ones included
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("type_tag", &self.type_tag)
            .field("capability", &self.capability)
            .field("children", &self.children.len())
            .field("options", &self.options.len())
            .field("signals", &self.signals.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_has_created_at() {
        let node = Node::new("solver", "physics.euler.Solver").unwrap();
        assert!(node.properties().contains(PROP_CREATED_AT));
        assert_eq!(node.type_tag(), "physics.euler.Solver");
        assert_eq!(node.capability(), "physics.euler.Solver");
    }

    #[test]
    fn test_new_node_rejects_bad_name() {
        assert!(Node::new("a/b", "demo.core.Group").is_err());
        assert!(Node::new("..", "demo.core.Group").is_err());
    }

    #[test]
    fn test_standard_signals_present() {
        let node = Node::new("n", "demo.core.Group").unwrap();
        assert!(node.signal("list_signals").is_some());
        assert!(node.signal("configure").is_some());
        assert!(node.signal("create_component").is_some());
    }

    #[test]
    fn test_duplicate_signal_rejected() {
        let mut node = Node::new("n", "demo.core.Group").unwrap();
        let dup = crate::signal::Signal::new("configure", "dup", |_| Ok(None));
        assert!(matches!(
            node.register_signal(dup),
            Err(SimTreeError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_property_round_trip() {
        let mut node = Node::new("n", "demo.core.Group").unwrap();
        node.properties_mut().set("iterations", 12i64);
        assert_eq!(node.properties().get("iterations").unwrap().as_int(), Some(12));
    }
}

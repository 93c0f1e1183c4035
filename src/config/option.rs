//! Typed, validated, triggerable configuration options
//!
//! An option is the user-configurable face of a node: it has a declared
//! kind, a default, an optional [`Restriction`], optional linked external
//! storage written through on every successful configuration, and an
//! ordered list of change triggers.
//!
//! # Configuration contract
//!
//! A raw value is converted to the declared kind, then validated, then
//! committed; the option is left untouched (and no trigger fires) if
//! either step fails. Triggers run exactly once per successful
//! configuration, after the value and linked storage are updated, in
//! registration order. See [`Tree::configure`](crate::tree::Tree::configure).

use crate::config::restriction::Restriction;
use crate::error::{Result, SimTreeError};
use crate::tree::{NodeId, Tree};
use crate::types::{Value, ValueKind};
use std::sync::{Arc, Mutex};

/// Change trigger: runs against the tree after a successful configure
///
/// Triggers capture the owning node by handle rather than by reference,
/// so they can reconfigure other options or rebuild children re-entrantly
/// under the single-writer discipline.
pub type Trigger = Arc<dyn Fn(&mut Tree, NodeId) -> Result<()> + Send + Sync>;

/// Shared external storage an option writes through on every change
pub type LinkedValue = Arc<Mutex<Value>>;

/// Create linked storage seeded with an initial value
pub fn linked_value(initial: impl Into<Value>) -> LinkedValue {
    Arc::new(Mutex::new(initial.into()))
}

/// A single typed configuration option
pub struct NodeOption {
    name: String,
    description: String,
    kind: ValueKind,
    default: Value,
    current: Value,
    basic: bool,
    restriction: Option<Restriction>,
    linked: Option<LinkedValue>,
    triggers: Vec<Trigger>,
}

impl NodeOption {
    /// Declare an option; the declared kind is the default value's kind
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<Value>,
    ) -> NodeOption {
        let default = default.into();
        NodeOption {
            name: name.into(),
            description: description.into(),
            kind: default.kind(),
            current: default.clone(),
            default,
            basic: true,
            restriction: None,
            linked: None,
            triggers: Vec::new(),
        }
    }

    /// Attach a validity restriction
    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = Some(restriction);
        self
    }

    /// Link external storage, written through on every successful configure
    pub fn linked_to(mut self, storage: LinkedValue) -> Self {
        self.linked = Some(storage);
        self
    }

    /// Register a change trigger; triggers fire in registration order
    pub fn on_change<F>(mut self, trigger: F) -> Self
    where
        F: Fn(&mut Tree, NodeId) -> Result<()> + Send + Sync + 'static,
    {
        self.triggers.push(Arc::new(trigger));
        self
    }

    /// Mark the option as advanced (hidden from basic listings)
    pub fn advanced(mut self) -> Self {
        self.basic = false;
        self
    }

    /// The option's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The option's description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The declared value kind
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// The default value
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// The current value
    pub fn value(&self) -> &Value {
        &self.current
    }

    /// Whether the option appears in basic listings
    pub fn is_basic(&self) -> bool {
        self.basic
    }

    /// The restriction, if any
    pub fn restriction(&self) -> Option<&Restriction> {
        self.restriction.as_ref()
    }

    /// Convert, validate, and commit a value
    ///
    /// Returns the triggers to run (the caller fires them once the node
    /// borrow is released). Failure leaves the current value, the linked
    /// storage, and the trigger list untouched.
    pub(crate) fn assign(&mut self, value: Value) -> Result<Vec<Trigger>> {
        let value = value.convert_to(self.kind)?;
        if let Some(restriction) = &self.restriction {
            restriction
                .check(&value)
                .map_err(|message| SimTreeError::ValidationFailed {
                    option: self.name.clone(),
                    message,
                })?;
        }
        if let Some(linked) = &self.linked {
            let mut slot = linked
                .lock()
                .map_err(|_| SimTreeError::Config("linked option storage poisoned".to_string()))?;
            *slot = value.clone();
        }
        self.current = value;
        Ok(self.triggers.clone())
    }
}

impl std::fmt::Debug for NodeOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeOption")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("current", &self.current)
            .field("triggers", &self.triggers.len())
            .finish()
    }
}

/// The ordered option set of a node
#[derive(Debug, Default)]
pub struct OptionList {
    options: Vec<NodeOption>,
}

impl OptionList {
    /// Create an empty option list
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an option; duplicate names are rejected
    pub fn add(&mut self, option: NodeOption) -> Result<()> {
        if self.get(option.name()).is_some() {
            return Err(SimTreeError::DuplicateName(option.name().to_string()));
        }
        self.options.push(option);
        Ok(())
    }

    /// Look up an option by name
    pub fn get(&self, name: &str) -> Option<&NodeOption> {
        self.options.iter().find(|o| o.name() == name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut NodeOption> {
        self.options.iter_mut().find(|o| o.name() == name)
    }

    /// Iterate options in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &NodeOption> {
        self.options.iter()
    }

    /// Number of declared options
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Whether no options are declared
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

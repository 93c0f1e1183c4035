//! Signals: named, invocable operations exposed by nodes
//!
//! A [`Signal`] bundles a handler with its metadata: name, description,
//! pretty name for display, a hidden flag (excluded from discovery but
//! still invocable by path + name), and an optional signature generator
//! that populates an empty [`FrameMap`] with the parameter schema a
//! caller must supply.
//!
//! Handlers are stored callable state tied to a node *handle*, not a node
//! reference: they receive a [`SignalContext`] giving mutable access to
//! the whole tree plus the receiving node's id, which keeps lifetime and
//! ownership explicit and lets handlers attach, detach, and reconfigure
//! nodes re-entrantly under the single-writer discipline.

pub mod frame;

pub use frame::{error_body, FrameEntry, FrameId, FrameMap, SignalFrame, ERROR_ENTRY};

use crate::error::Result;
use crate::registry::SharedRegistry;
use crate::tree::{NodeId, Tree};
use std::sync::Arc;

/// Everything a signal handler may touch
pub struct SignalContext<'a> {
    /// The tree, mutable: handlers run on the tree-owner thread
    pub tree: &'a mut Tree,
    /// The process-wide registry, for building components by type name
    pub registry: &'a SharedRegistry,
    /// The node the signal was invoked on
    pub node: NodeId,
    /// The call frame
    pub frame: &'a SignalFrame,
}

/// Handler invoked with the call frame; `Some` body becomes the reply
pub type SignalHandler = Arc<dyn Fn(&mut SignalContext<'_>) -> Result<Option<FrameMap>> + Send + Sync>;

/// Populates an empty map with a signal's accepted parameter schema
pub type SignatureFn = Arc<dyn Fn(&Tree, NodeId, &mut FrameMap) -> Result<()> + Send + Sync>;

/// A named, invocable operation on a node
///
/// Registered once at node construction time and immutable afterward.
#[derive(Clone)]
pub struct Signal {
    name: String,
    description: String,
    pretty_name: String,
    hidden: bool,
    handler: SignalHandler,
    signature: Option<SignatureFn>,
}

impl Signal {
    /// Define a signal with its handler
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Signal
    where
        F: Fn(&mut SignalContext<'_>) -> Result<Option<FrameMap>> + Send + Sync + 'static,
    {
        let name = name.into();
        Signal {
            pretty_name: name.clone(),
            name,
            description: description.into(),
            hidden: false,
            handler: Arc::new(handler),
            signature: None,
        }
    }

    /// Set the human-readable display name
    pub fn pretty(mut self, pretty_name: impl Into<String>) -> Self {
        self.pretty_name = pretty_name.into();
        self
    }

    /// Exclude the signal from discovery listings
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Attach a signature generator
    pub fn with_signature<F>(mut self, generator: F) -> Self
    where
        F: Fn(&Tree, NodeId, &mut FrameMap) -> Result<()> + Send + Sync + 'static,
    {
        self.signature = Some(Arc::new(generator));
        self
    }

    /// The signal's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signal's description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The display name
    pub fn pretty_name(&self) -> &str {
        &self.pretty_name
    }

    /// Whether the signal is excluded from listings
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// A clone of the handler, detached from the node borrow
    pub fn handler(&self) -> SignalHandler {
        self.handler.clone()
    }

    /// The signature generator, if one was attached
    pub fn signature_fn(&self) -> Option<&SignatureFn> {
        self.signature.as_ref()
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("hidden", &self.hidden)
            .field("has_signature", &self.signature.is_some())
            .finish()
    }
}

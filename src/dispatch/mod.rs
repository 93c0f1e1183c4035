//! Signal dispatch: local invocation and the client/server split
//!
//! The [`Dispatcher`] is the sole sanctioned entry point for acting on a
//! tree from outside its nodes: it resolves a receiver by path, looks up
//! the named signal, and invokes the handler. Local dispatch returns the
//! handler's outcome directly; remote dispatch decorates the same
//! contract with wire encoding and a strictly ordered request/reply
//! session (see [`TreeServer`] and [`SessionClient`]).
//!
//! # Invocation state machine
//!
//! Every remote call moves through
//! `Pending -> Sent -> (Replied | Failed | TimedOut)` ([`CallState`]).
//! A timed-out call has an *unknown* outcome: the server may still have
//! applied the mutation, so retry policy belongs to the caller.

pub mod client;
pub mod server;

pub use client::SessionClient;
pub use server::{DispatchStats, ServerCommand, ServerEvent, TreeServer, SIG_SERVER_STATS};

use crate::error::{Result, SimTreeError};
use crate::registry::SharedRegistry;
use crate::signal::{FrameMap, SignalContext, SignalFrame};
use crate::tree::{dead_handle, NodePath, Tree};
use tracing::trace;

/// The lifecycle of a single signal invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Built but not yet transmitted
    Pending,
    /// Transmitted, awaiting the matching reply
    Sent,
    /// The reply arrived and was handed to the caller
    Replied,
    /// The reply carried a failure
    Failed,
    /// No reply arrived in time; the remote outcome is unknown
    TimedOut,
}

/// Resolves a receiver by path and invokes a named signal
pub struct Dispatcher {
    registry: SharedRegistry,
}

impl Dispatcher {
    /// Create a dispatcher over the shared registry
    pub fn new(registry: SharedRegistry) -> Dispatcher {
        Dispatcher { registry }
    }

    /// The shared registry handlers build through
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Dispatch a call frame against the tree
    ///
    /// [`NotFound`](SimTreeError::NotFound) (receiver resolution) and
    /// [`UnknownSignal`](SimTreeError::UnknownSignal) are distinct from a
    /// handler's own error, which propagates with its original kind.
    /// A `Some` return is the reply frame (same frame id, endpoints
    /// swapped); `None` means the signal produces no reply.
    pub fn dispatch(&self, tree: &mut Tree, frame: &SignalFrame) -> Result<Option<SignalFrame>> {
        let node = tree.resolve(tree.root(), &frame.receiver)?;
        let handler = {
            let receiver = tree.get(node).ok_or_else(|| dead_handle(node))?;
            receiver
                .signal(&frame.signal)
                .ok_or_else(|| SimTreeError::UnknownSignal {
                    path: frame.receiver.to_string(),
                    signal: frame.signal.clone(),
                })?
                .handler()
        };
        trace!(receiver = %frame.receiver, signal = %frame.signal, "dispatching");

        let mut ctx = SignalContext {
            tree,
            registry: &self.registry,
            node,
            frame,
        };
        let body = handler(&mut ctx)?;
        Ok(body.map(|b| frame.make_reply(b)))
    }

    /// Convenience for local callers: build the frame, return the reply body
    pub fn call(
        &self,
        tree: &mut Tree,
        receiver: &str,
        signal: &str,
        options: FrameMap,
    ) -> Result<Option<FrameMap>> {
        let frame = SignalFrame::call(
            NodePath::root(),
            NodePath::new(receiver)?,
            signal,
            options,
        );
        Ok(self.dispatch(tree, &frame)?.map(|reply| reply.options))
    }

    /// Fetch a signal's parameter schema without invoking it
    ///
    /// Runs the signature generator against an empty map; a signal with
    /// no generator yields an empty schema.
    pub fn signature(&self, tree: &Tree, receiver: &str, signal: &str) -> Result<FrameMap> {
        let path = NodePath::new(receiver)?;
        let node = tree.resolve(tree.root(), &path)?;
        let generator = {
            let receiver_node = tree.get(node).ok_or_else(|| dead_handle(node))?;
            receiver_node
                .signal(signal)
                .ok_or_else(|| SimTreeError::UnknownSignal {
                    path: path.to_string(),
                    signal: signal.to_string(),
                })?
                .signature_fn()
                .cloned()
        };
        let mut schema = FrameMap::new();
        if let Some(generator) = generator {
            generator(tree, node, &mut schema)?;
        }
        Ok(schema)
    }
}

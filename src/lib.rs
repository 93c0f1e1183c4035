//! # simtree: component-tree runtime for simulation frameworks
//!
//! A runtime-introspective, dynamically-typed component tree with
//! string-addressed nodes, pluggable type construction, typed
//! configurable options, and a named-operation ("signal") invocation
//! protocol that works identically whether the caller is in-process or
//! on the far side of a client/server boundary.
//!
//! ## Architecture
//!
//! - **Tree**: a single-owner arena of [`Node`]s with unique `/`-separated
//!   path addressing and generational handles
//! - **Registry**: the process-wide map from qualified type name
//!   (`<library>.<namespace>.<ClassName>`) to [`Builder`], populated by
//!   [`Library`] load
//! - **Options**: typed, validated configuration values with change
//!   triggers and linked external storage
//! - **Signals**: named operations invoked through [`SignalFrame`]s with
//!   a stable JSON wire encoding
//! - **Dispatch**: the [`Dispatcher`] for local calls; [`TreeServer`] and
//!   [`SessionClient`] for the strictly ordered remote session over
//!   crossbeam channels
//!
//! ## Threading
//!
//! The tree is mutated by at most one thread of control, the *tree
//! owner*. Remote callers hand mutation requests to the owner through the
//! server's command queue and wait for the reply. This single-writer
//! discipline is what allows option triggers to re-enter the
//! configuration system without locking.
//!
//! ## Example
//!
//! ```ignore
//! use simtree::{
//!     config::RuntimeConfig,
//!     dispatch::TreeServer,
//!     registry::{FnBuilder, Registry},
//!     signal::FrameMap,
//!     tree::{Node, Tree},
//! };
//!
//! let mut registry = Registry::new();
//! registry.register_builder(FnBuilder::new(
//!     "demo.core.Counter",
//!     "demo.Counter",
//!     |name| Node::new(name, "demo.core.Counter"),
//! ))?;
//!
//! let tree = Tree::new(Node::new("root", "demo.core.Root")?);
//! let (worker, client) =
//!     TreeServer::spawn(tree, registry.into_shared(), RuntimeConfig::default());
//!
//! let mut options = FrameMap::new();
//! options.set_str("name", "c1");
//! options.set_str("type", "demo.core.Counter");
//! let reply = client.call("/", "create_component", options)?;
//! assert_eq!(reply.get_path("path")?.as_str(), "/c1");
//!
//! client.shutdown()?;
//! worker.join().unwrap();
//! ```

pub mod builtin;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod signal;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use config::{NodeOption, Restriction, RuntimeConfig};
pub use dispatch::{CallState, Dispatcher, SessionClient, TreeServer};
pub use error::{Result, ResultExt, SimTreeError};
pub use registry::{Builder, FnBuilder, Library, QualifiedName, Registry, SharedRegistry};
pub use signal::{FrameEntry, FrameId, FrameMap, Signal, SignalContext, SignalFrame};
pub use tree::{Node, NodeId, NodePath, PropertyList, Tree};
pub use types::{Value, ValueArray, ValueKind};

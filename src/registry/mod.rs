//! The process-wide type registry
//!
//! The registry maps qualified type names to [`Builder`]s. It is
//! populated by [`Library`] load, never mutated ad hoc, and read on
//! every build. Shared as a [`SharedRegistry`] (`Arc<RwLock<_>>`): writes
//! happen only during library load/unload at startup/shutdown, so
//! steady-state builds on the dispatch path take the read lock only.
//!
//! # Duplicate registration policy
//!
//! Registering a second builder under an already-used qualified name is
//! an error ([`DuplicateName`](crate::SimTreeError::DuplicateName)).
//! Capability-based builds resolve a concrete type from a string that is
//! often data; silently changing which type wins would change behavior at
//! a distance.
//!
//! # Example
//!
//! ```ignore
//! use simtree::registry::{FnBuilder, Registry};
//! use simtree::tree::Node;
//!
//! let mut registry = Registry::new();
//! registry.register_builder(FnBuilder::new(
//!     "demo.core.Counter",
//!     "demo.Counter",
//!     |name| Node::new(name, "demo.core.Counter"),
//! ))?;
//! let node = registry.build("demo.core.Counter", "c1")?;
//! ```

pub mod builder;
pub mod library;

pub use builder::{Builder, FnBuilder, QualifiedName};
pub use library::Library;

use crate::error::{Result, SimTreeError};
use crate::tree::Node;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// The registry handle shared between the tree owner and other threads
pub type SharedRegistry = Arc<RwLock<Registry>>;

/// Process-wide map from qualified type name to builder
#[derive(Default)]
pub struct Registry {
    builders: HashMap<String, Arc<dyn Builder>>,
    libraries: HashMap<String, Arc<dyn Library>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Wrap the registry for sharing across threads
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Register a builder under its qualified name
    pub fn register_builder(&mut self, builder: Arc<dyn Builder>) -> Result<()> {
        let qualified = QualifiedName::new(builder.qualified_name())?;
        if self.builders.contains_key(qualified.as_str()) {
            return Err(SimTreeError::DuplicateName(qualified.as_str().to_string()));
        }
        debug!(type_name = %qualified, capability = builder.capability(), "builder registered");
        self.builders.insert(qualified.as_str().to_string(), builder);
        Ok(())
    }

    /// Look up a builder by qualified name
    pub fn builder(&self, qualified: &str) -> Option<&Arc<dyn Builder>> {
        self.builders.get(qualified)
    }

    /// Construct a detached node of the named concrete type
    ///
    /// Fails with [`UnknownType`](SimTreeError::UnknownType) on a registry
    /// miss. The built node's type tag is checked against the qualified
    /// name and its capability tag is stamped from the builder.
    pub fn build(&self, qualified: &str, name: &str) -> Result<Node> {
        let builder = self
            .builders
            .get(qualified)
            .ok_or_else(|| SimTreeError::UnknownType(qualified.to_string()))?;
        let mut node = builder.build(name)?;
        if node.type_tag() != qualified {
            return Err(SimTreeError::TypeMismatch {
                expected: qualified.to_string(),
                found: node.type_tag().to_string(),
            });
        }
        node.set_capability(builder.capability());
        Ok(node)
    }

    /// Construct by abstract capability plus concrete type name
    ///
    /// The concrete qualified name is usually data, read from a config
    /// file or received over the wire. Fails with
    /// [`TypeMismatch`](SimTreeError::TypeMismatch) when the named type
    /// does not satisfy the requested capability.
    pub fn build_as(&self, capability: &str, qualified: &str, name: &str) -> Result<Node> {
        let builder = self
            .builders
            .get(qualified)
            .ok_or_else(|| SimTreeError::UnknownType(qualified.to_string()))?;
        if builder.capability() != capability {
            return Err(SimTreeError::TypeMismatch {
                expected: capability.to_string(),
                found: builder.capability().to_string(),
            });
        }
        self.build(qualified, name)
    }

    /// Load a library: register its builders, run its `initiate` hook
    ///
    /// Loading an already-loaded library is a no-op. A builder whose
    /// qualified name does not belong to the library is rejected before
    /// anything is registered.
    pub fn load_library(&mut self, library: Arc<dyn Library>) -> Result<()> {
        if self.libraries.contains_key(library.name()) {
            debug!(library = library.name(), "library already loaded");
            return Ok(());
        }

        let prefix = format!("{}.", library.name());
        let builders = library.builders();
        for builder in &builders {
            let qualified = QualifiedName::new(builder.qualified_name())?;
            if !qualified.as_str().starts_with(&prefix) {
                return Err(SimTreeError::Config(format!(
                    "builder '{}' does not belong to library '{}'",
                    qualified,
                    library.name()
                )));
            }
            if self.builders.contains_key(qualified.as_str()) {
                return Err(SimTreeError::DuplicateName(qualified.as_str().to_string()));
            }
        }
        for builder in builders {
            self.register_builder(builder)?;
        }

        library.initiate();
        info!(
            library = library.name(),
            version = library.version(),
            "library loaded"
        );
        self.libraries.insert(library.name().to_string(), library);
        Ok(())
    }

    /// Unload a library: remove its builders, run its `terminate` hook
    ///
    /// Unloading a library that is not loaded is a no-op.
    pub fn unload_library(&mut self, name: &str) {
        let Some(library) = self.libraries.remove(name) else {
            debug!(library = name, "library not loaded, unload is a no-op");
            return;
        };
        let prefix = format!("{}.", name);
        self.builders.retain(|qualified, _| !qualified.starts_with(&prefix));
        library.terminate();
        info!(library = name, "library unloaded");
    }

    /// Whether a library is currently loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    /// Names of the loaded libraries, unordered
    pub fn loaded_libraries(&self) -> Vec<&str> {
        self.libraries.keys().map(|s| s.as_str()).collect()
    }

    /// Number of registered builders
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Whether no builders are registered
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

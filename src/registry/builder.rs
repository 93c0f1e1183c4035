//! Builders: factories for concrete node types
//!
//! A [`Builder`] knows how to construct one concrete node type, named by
//! a [`QualifiedName`] of the form `<library>.<namespace>.<ClassName>`.
//! The qualified name is both the registry key and the wire value a
//! remote peer sends to have the matching concrete type constructed.

use crate::error::{Result, SimTreeError};
use crate::tree::Node;
use std::sync::Arc;

/// A validated `<library>.<namespace>.<ClassName>` type name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    full: String,
    library_len: usize,
    class_start: usize,
}

impl QualifiedName {
    /// Parse and validate a qualified type name
    ///
    /// At least three non-empty dot-separated segments are required; the
    /// namespace may itself be dotted.
    pub fn new(raw: &str) -> Result<QualifiedName> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() < 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(SimTreeError::Config(format!(
                "malformed qualified name '{}'",
                raw
            )));
        }
        let library_len = segments[0].len();
        let class_start = raw.len() - segments[segments.len() - 1].len();
        Ok(QualifiedName {
            full: raw.to_string(),
            library_len,
            class_start,
        })
    }

    /// The full qualified name
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The owning library's name (first segment)
    pub fn library(&self) -> &str {
        &self.full[..self.library_len]
    }

    /// The namespace (middle segments)
    pub fn namespace(&self) -> &str {
        &self.full[self.library_len + 1..self.class_start - 1]
    }

    /// The class name (last segment)
    pub fn class_name(&self) -> &str {
        &self.full[self.class_start..]
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full)
    }
}

/// A factory capable of constructing one concrete node type
pub trait Builder: Send + Sync {
    /// The qualified type name this builder constructs
    fn qualified_name(&self) -> &str;

    /// The abstract capability the constructed type satisfies
    fn capability(&self) -> &str;

    /// Construct a detached node with the given name
    ///
    /// The node's type tag must equal [`qualified_name`](Builder::qualified_name);
    /// the registry enforces this at build time.
    fn build(&self, name: &str) -> Result<Node>;
}

/// A closure-backed [`Builder`]
///
/// Convenient for libraries whose node types are wired up in code rather
/// than as dedicated structs.
pub struct FnBuilder {
    qualified: String,
    capability: String,
    build_fn: Box<dyn Fn(&str) -> Result<Node> + Send + Sync>,
}

impl FnBuilder {
    /// Wrap a construction closure
    pub fn new<F>(
        qualified: impl Into<String>,
        capability: impl Into<String>,
        build_fn: F,
    ) -> Arc<FnBuilder>
    where
        F: Fn(&str) -> Result<Node> + Send + Sync + 'static,
    {
        Arc::new(FnBuilder {
            qualified: qualified.into(),
            capability: capability.into(),
            build_fn: Box::new(build_fn),
        })
    }
}

impl Builder for FnBuilder {
    fn qualified_name(&self) -> &str {
        &self.qualified
    }

    fn capability(&self) -> &str {
        &self.capability
    }

    fn build(&self, name: &str) -> Result<Node> {
        (self.build_fn)(name)
    }
}

//! Component path addressing
//!
//! Paths are `/`-separated, case-sensitive segment lists. A leading `/`
//! makes a path root-relative; `..` steps to the parent during
//! resolution. Segment names must not be empty and must not contain `/`
//! (there are no escaping rules), which is enforced at construction so
//! that every [`NodePath`] in the system is well-formed.

use crate::error::{Result, SimTreeError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Path separator character
pub const SEPARATOR: char = '/';

/// Segment that steps to the parent node
pub const PARENT_SEGMENT: &str = "..";

/// A validated component path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(String);

impl NodePath {
    /// Parse and validate a path string
    ///
    /// Rejects empty paths, empty segments (`a//b`), and trailing
    /// separators (other than the bare root `/`).
    pub fn new(raw: &str) -> Result<NodePath> {
        if raw.is_empty() {
            return Err(SimTreeError::Config("empty path".to_string()));
        }
        if raw == "/" {
            return Ok(NodePath::root());
        }

        let body = raw.strip_prefix(SEPARATOR).unwrap_or(raw);
        if body.is_empty() || body.ends_with(SEPARATOR) {
            return Err(SimTreeError::Config(format!("malformed path '{}'", raw)));
        }
        for segment in body.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(SimTreeError::Config(format!(
                    "empty segment in path '{}'",
                    raw
                )));
            }
        }
        Ok(NodePath(raw.to_string()))
    }

    /// The root path `/`
    pub fn root() -> NodePath {
        NodePath(SEPARATOR.to_string())
    }

    /// Whether this path is root-relative
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with(SEPARATOR)
    }

    /// Whether this is the bare root path
    pub fn is_root(&self) -> bool {
        self.0.len() == 1 && self.is_absolute()
    }

    /// Iterate the path's segments, in order
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        let body = self.0.strip_prefix(SEPARATOR).unwrap_or(&self.0);
        body.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// The last segment, if any
    pub fn name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Append a child segment
    ///
    /// The segment must be a valid single name (no separators, not empty,
    /// not `..`), child names are validated the same way at attach time.
    pub fn join(&self, name: &str) -> Result<NodePath> {
        validate_name(name)?;
        let joined = if self.is_root() {
            format!("{}{}", SEPARATOR, name)
        } else {
            format!("{}{}{}", self.0, SEPARATOR, name)
        };
        Ok(NodePath(joined))
    }

    /// The parent path, or `None` at the root
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(SEPARATOR) {
            Some(0) if self.is_absolute() => Some(NodePath::root()),
            Some(idx) => Some(NodePath(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// The path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validate a single node name (one path segment)
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == PARENT_SEGMENT || name.contains(SEPARATOR) {
        return Err(SimTreeError::Config(format!("invalid node name '{}'", name)));
    }
    Ok(())
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodePath {
    type Err = SimTreeError;

    fn from_str(s: &str) -> Result<NodePath> {
        NodePath::new(s)
    }
}

impl TryFrom<String> for NodePath {
    type Error = SimTreeError;

    fn try_from(s: String) -> Result<NodePath> {
        NodePath::new(&s)
    }
}

impl From<NodePath> for String {
    fn from(p: NodePath) -> String {
        p.0
    }
}

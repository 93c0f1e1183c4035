//! Core value types for the simtree runtime
//!
//! This module contains the fundamental value model used throughout the
//! crate for option values, properties, and signal-frame entries.
//!
//! # Main Types
//!
//! - [`ValueKind`] - Enum of supported scalar kinds (bool, int, real, string, path)
//! - [`Value`] - A single typed scalar value
//! - [`ValueArray`] - A homogeneous ordered sequence of one scalar kind
//!
//! # Conversion
//!
//! Values arrive from external callers in serialized form (usually a
//! string). [`Value::parse_as`] converts a raw string to a declared kind,
//! and [`Value::convert_to`] performs the lossless conversions between
//! already-typed values (`Int -> Real`, string parsing). Anything else is
//! a [`ConversionFailed`](crate::SimTreeError::ConversionFailed) error.

use crate::error::{Result, SimTreeError};
use crate::tree::path::NodePath;
use serde::{Deserialize, Serialize};

/// The scalar kinds a [`Value`] can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Boolean value
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Real,
    /// UTF-8 string
    Str,
    /// A component path
    Path,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Int => write!(f, "integer"),
            ValueKind::Real => write!(f, "real"),
            ValueKind::Str => write!(f, "string"),
            ValueKind::Path => write!(f, "path"),
        }
    }
}

/// A single typed scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    Path(NodePath),
}

impl Value {
    /// The scalar kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Real(_) => ValueKind::Real,
            Value::Str(_) => ValueKind::Str,
            Value::Path(_) => ValueKind::Path,
        }
    }

    /// Parse a raw string into a value of the given kind
    pub fn parse_as(kind: ValueKind, raw: &str) -> Result<Value> {
        let conversion_failed = || SimTreeError::ConversionFailed {
            expected: kind.to_string(),
            raw: raw.to_string(),
        };

        match kind {
            ValueKind::Bool => match raw {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(conversion_failed()),
            },
            ValueKind::Int => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| conversion_failed()),
            ValueKind::Real => raw
                .parse::<f64>()
                .map(Value::Real)
                .map_err(|_| conversion_failed()),
            ValueKind::Str => Ok(Value::Str(raw.to_string())),
            ValueKind::Path => NodePath::new(raw)
                .map(Value::Path)
                .map_err(|_| conversion_failed()),
        }
    }

    /// Convert this value to the given kind, if the conversion is lossless
    ///
    /// Identical kinds pass through, `Int -> Real` widens, and strings are
    /// parsed. Every other combination fails.
    pub fn convert_to(&self, kind: ValueKind) -> Result<Value> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        match (self, kind) {
            (Value::Int(i), ValueKind::Real) => Ok(Value::Real(*i as f64)),
            (Value::Str(s), _) => Value::parse_as(kind, s),
            (Value::Path(p), ValueKind::Str) => Ok(Value::Str(p.to_string())),
            _ => Err(SimTreeError::ConversionFailed {
                expected: kind.to_string(),
                raw: self.to_string(),
            }),
        }
    }

    /// Get the boolean value, if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the integer value, if this is an int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the numeric value, widening integers
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the string value, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the path value, if this is a path
    pub fn as_path(&self) -> Option<&NodePath> {
        match self {
            Value::Path(p) => Some(p),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Str(s) => write!(f, "{}", s),
            Value::Path(p) => write!(f, "{}", p),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NodePath> for Value {
    fn from(v: NodePath) -> Self {
        Value::Path(v)
    }
}

/// A homogeneous ordered sequence of a single scalar kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum ValueArray {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Real(Vec<f64>),
    Str(Vec<String>),
    Path(Vec<NodePath>),
}

impl ValueArray {
    /// The scalar kind of this array's elements
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueArray::Bool(_) => ValueKind::Bool,
            ValueArray::Int(_) => ValueKind::Int,
            ValueArray::Real(_) => ValueKind::Real,
            ValueArray::Str(_) => ValueKind::Str,
            ValueArray::Path(_) => ValueKind::Path,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            ValueArray::Bool(v) => v.len(),
            ValueArray::Int(v) => v.len(),
            ValueArray::Real(v) => v.len(),
            ValueArray::Str(v) => v.len(),
            ValueArray::Path(v) => v.len(),
        }
    }

    /// Whether the array holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

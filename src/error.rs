//! Error handling for the simtree runtime
//!
//! This module defines custom error types and a Result alias for use
//! throughout the crate.

use thiserror::Error;

/// Main error type for simtree operations
#[derive(Error, Debug)]
pub enum SimTreeError {
    /// Path or name resolution failure, naming the first unresolved segment
    #[error("Not found: '{segment}' while resolving '{path}'")]
    NotFound { path: String, segment: String },

    /// Registry miss: no builder registered for a qualified type name
    #[error("Unknown type: no builder registered for '{0}'")]
    UnknownType(String),

    /// A signal name did not resolve on an otherwise valid receiver
    #[error("Unknown signal: '{signal}' on '{path}'")]
    UnknownSignal { path: String, signal: String },

    /// Wrong capability on a capability-based build or typed access
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// An option value failed its declared restriction
    #[error("Validation failed for option '{option}': {message}")]
    ValidationFailed { option: String, message: String },

    /// A raw value could not be converted to an option's declared kind
    #[error("Conversion failed: cannot read '{raw}' as {expected}")]
    ConversionFailed { expected: String, raw: String },

    /// Attach collision or duplicate builder registration
    #[error("Duplicate name: '{0}' is already registered")]
    DuplicateName(String),

    /// Remote-handler or transport error surfaced through a reply envelope
    #[error("Remote failure: {0}")]
    RemoteFailure(String),

    /// A remote call expired before its reply arrived; outcome is unknown
    #[error("Timed out: {0}")]
    TimedOut(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SimTreeError>,
    },
}

impl SimTreeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SimTreeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a not-found error for a path resolution failure
    pub fn not_found(path: impl Into<String>, segment: impl Into<String>) -> Self {
        SimTreeError::NotFound {
            path: path.into(),
            segment: segment.into(),
        }
    }
}

impl From<serde_json::Error> for SimTreeError {
    fn from(err: serde_json::Error) -> Self {
        SimTreeError::Serialization(err.to_string())
    }
}

/// Result type alias for simtree operations
pub type Result<T> = std::result::Result<T, SimTreeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

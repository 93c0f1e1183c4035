//! Libraries: loadable units of builders
//!
//! A library is a named, versioned unit that contributes builders to the
//! registry. Loading registers all of its builders and runs a one-time
//! `initiate` hook; unloading removes them and runs `terminate`. Both
//! directions are idempotent: repeating a load or unload is a no-op, not
//! an error.

use crate::registry::builder::Builder;
use std::sync::Arc;

/// A loadable unit that registers builders and runs init/terminate hooks
pub trait Library: Send + Sync {
    /// The library's name; every contributed builder's qualified name
    /// must start with `<name>.`
    fn name(&self) -> &str;

    /// The library's version string
    fn version(&self) -> &str;

    /// The builders this library contributes
    fn builders(&self) -> Vec<Arc<dyn Builder>>;

    /// One-time initialization hook, run on first load
    fn initiate(&self) {}

    /// Termination hook, run on unload
    fn terminate(&self) {}
}

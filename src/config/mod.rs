//! Configuration for the simtree runtime
//!
//! This module carries two distinct things:
//!
//! - The per-node option system ([`NodeOption`], [`OptionList`],
//!   [`Restriction`]), the typed, validated, triggerable values callers
//!   use to configure nodes.
//! - [`RuntimeConfig`], the runtime's own settings (dispatch timeouts,
//!   channel capacity), persisted as TOML.
//!
//! # Example
//!
//! ```ignore
//! use simtree::config::RuntimeConfig;
//!
//! let config = RuntimeConfig::load("runtime.toml").unwrap_or_default();
//! assert!(config.reply_timeout().as_millis() > 0);
//! ```

pub mod option;
pub mod restriction;

pub use option::{linked_value, LinkedValue, NodeOption, OptionList, Trigger};
pub use restriction::Restriction;

use crate::error::{Result, SimTreeError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default timeout for a remote call's reply in milliseconds
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 5_000;

/// Default capacity of the client/server command channels
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Runtime settings for dispatch and transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How long a caller waits for a reply before the call times out
    pub reply_timeout_ms: u64,

    /// Bounded capacity of the command/event channels
    pub channel_capacity: usize,

    /// Whether every dispatched frame is logged at debug level
    pub log_frames: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            log_frames: false,
        }
    }
}

impl RuntimeConfig {
    /// The reply timeout as a [`Duration`]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&text)
            .map_err(|e| SimTreeError::Config(format!("failed to parse runtime config: {}", e)))
    }

    /// Save settings to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| SimTreeError::Config(format!("failed to serialize runtime config: {}", e)))?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }
}

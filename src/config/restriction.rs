//! Validity restrictions for option values
//!
//! A restriction narrows the set of values an option accepts: an
//! enumerated set of allowed values or a closed numeric range. Checking
//! happens after conversion to the declared kind, so a restriction only
//! ever sees values of its option's own kind.

use crate::types::Value;
use serde::{Deserialize, Serialize};

/// A validity restriction on an option's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "restriction", rename_all = "snake_case")]
pub enum Restriction {
    /// The value must equal one of the listed values
    OneOf { allowed: Vec<Value> },
    /// Closed integer range
    IntRange { min: i64, max: i64 },
    /// Closed real range
    RealRange { min: f64, max: f64 },
}

impl Restriction {
    /// Check a converted value, returning a human-readable reason on failure
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            Restriction::OneOf { allowed } => {
                if allowed.contains(value) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not one of {}", value, self.describe()))
                }
            }
            Restriction::IntRange { min, max } => match value.as_int() {
                Some(i) if (*min..=*max).contains(&i) => Ok(()),
                Some(i) => Err(format!("{} is outside [{}, {}]", i, min, max)),
                None => Err(format!("'{}' is not an integer", value)),
            },
            Restriction::RealRange { min, max } => match value.as_real() {
                Some(r) if r >= *min && r <= *max => Ok(()),
                Some(r) => Err(format!("{} is outside [{}, {}]", r, min, max)),
                None => Err(format!("'{}' is not a real", value)),
            },
        }
    }

    /// A short description of the allowed values, used in listings
    pub fn describe(&self) -> String {
        match self {
            Restriction::OneOf { allowed } => {
                let names: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                format!("{{{}}}", names.join(", "))
            }
            Restriction::IntRange { min, max } => format!("[{}, {}]", min, max),
            Restriction::RealRange { min, max } => format!("[{}, {}]", min, max),
        }
    }
}

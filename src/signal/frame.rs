//! Signal frames: the structured argument/result container
//!
//! A [`SignalFrame`] is what crosses the dispatch boundary: an envelope
//! (sender path, receiver path, signal name, frame identifier), an
//! "options" map of scalar/array entries with nested named sub-maps, and
//! an optional embedded reply envelope carrying the same frame id.
//!
//! # Wire encoding
//!
//! Frames encode to a JSON tree document ([`SignalFrame::encode`]) and
//! decode back ([`SignalFrame::decode`]). The round-trip law
//! `decode(encode(f)) == f` holds for every frame, independent of which
//! scalar, array, or sub-map entries it uses.

use crate::error::{Result, SimTreeError};
use crate::tree::path::NodePath;
use crate::types::{Value, ValueArray};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Reserved entry name carrying a remote failure message in a reply body
pub const ERROR_ENTRY: &str = "error";

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier correlating a call with its reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(u64);

impl FrameId {
    /// Allocate a fresh identifier
    pub fn next() -> FrameId {
        FrameId(NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single named entry in a frame map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", content = "data", rename_all = "snake_case")]
pub enum FrameEntry {
    /// A scalar value
    Scalar(Value),
    /// A homogeneous array of one scalar kind
    Array(ValueArray),
}

/// A tree of named entries and nested sub-maps
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameMap {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    entries: BTreeMap<String, FrameEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    maps: BTreeMap<String, FrameMap>,
}

impl FrameMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the map has no entries and no sub-maps
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.maps.is_empty()
    }

    /// Set a named entry, replacing any previous one
    pub fn set(&mut self, name: impl Into<String>, entry: FrameEntry) -> &mut Self {
        self.entries.insert(name.into(), entry);
        self
    }

    /// Set a scalar entry
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.set(name, FrameEntry::Scalar(value.into()))
    }

    /// Set a boolean entry
    pub fn set_bool(&mut self, name: impl Into<String>, value: bool) -> &mut Self {
        self.set_value(name, value)
    }

    /// Set an integer entry
    pub fn set_int(&mut self, name: impl Into<String>, value: i64) -> &mut Self {
        self.set_value(name, value)
    }

    /// Set a real entry
    pub fn set_real(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.set_value(name, value)
    }

    /// Set a string entry
    pub fn set_str(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.set_value(name, value.into())
    }

    /// Set a path entry
    pub fn set_path(&mut self, name: impl Into<String>, value: NodePath) -> &mut Self {
        self.set_value(name, value)
    }

    /// Set an array entry
    pub fn set_array(&mut self, name: impl Into<String>, array: ValueArray) -> &mut Self {
        self.set(name, FrameEntry::Array(array))
    }

    /// Get a named entry
    pub fn get(&self, name: &str) -> Option<&FrameEntry> {
        self.entries.get(name)
    }

    /// Whether a named entry is present
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn missing(name: &str) -> SimTreeError {
        SimTreeError::NotFound {
            path: "frame options".to_string(),
            segment: name.to_string(),
        }
    }

    /// Get a scalar entry, failing on absence or on an array entry
    pub fn get_value(&self, name: &str) -> Result<&Value> {
        match self.get(name).ok_or_else(|| Self::missing(name))? {
            FrameEntry::Scalar(v) => Ok(v),
            FrameEntry::Array(a) => Err(SimTreeError::TypeMismatch {
                expected: "scalar entry".to_string(),
                found: format!("array of {}", a.kind()),
            }),
        }
    }

    fn kind_mismatch(expected: &str, found: &Value) -> SimTreeError {
        SimTreeError::TypeMismatch {
            expected: expected.to_string(),
            found: found.kind().to_string(),
        }
    }

    /// Get a boolean entry
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        let v = self.get_value(name)?;
        v.as_bool().ok_or_else(|| Self::kind_mismatch("bool", v))
    }

    /// Get an integer entry
    pub fn get_int(&self, name: &str) -> Result<i64> {
        let v = self.get_value(name)?;
        v.as_int().ok_or_else(|| Self::kind_mismatch("integer", v))
    }

    /// Get a real entry, widening integers
    pub fn get_real(&self, name: &str) -> Result<f64> {
        let v = self.get_value(name)?;
        v.as_real().ok_or_else(|| Self::kind_mismatch("real", v))
    }

    /// Get a string entry
    pub fn get_str(&self, name: &str) -> Result<&str> {
        let v = self.get_value(name)?;
        v.as_str().ok_or_else(|| Self::kind_mismatch("string", v))
    }

    /// Get a path entry
    pub fn get_path(&self, name: &str) -> Result<&NodePath> {
        let v = self.get_value(name)?;
        v.as_path().ok_or_else(|| Self::kind_mismatch("path", v))
    }

    /// Get an array entry
    pub fn get_array(&self, name: &str) -> Result<&ValueArray> {
        match self.get(name).ok_or_else(|| Self::missing(name))? {
            FrameEntry::Array(a) => Ok(a),
            FrameEntry::Scalar(v) => Err(Self::kind_mismatch("array entry", v)),
        }
    }

    /// Iterate entries in name order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FrameEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Get a nested sub-map
    pub fn map(&self, name: &str) -> Option<&FrameMap> {
        self.maps.get(name)
    }

    /// Get or create a nested sub-map
    pub fn map_mut(&mut self, name: impl Into<String>) -> &mut FrameMap {
        self.maps.entry(name.into()).or_default()
    }

    /// Iterate nested sub-maps in name order
    pub fn maps(&self) -> impl Iterator<Item = (&str, &FrameMap)> {
        self.maps.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The remote failure message, if this is an error reply body
    pub fn error_message(&self) -> Option<&str> {
        self.get_str(ERROR_ENTRY).ok()
    }
}

/// Build a reply body carrying a failure message
pub fn error_body(message: impl Into<String>) -> FrameMap {
    let mut body = FrameMap::new();
    body.set_str(ERROR_ENTRY, message.into());
    body
}

/// The structured argument/result container exchanged for a signal invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalFrame {
    /// Path of the calling node (or `/` for external callers)
    pub sender: NodePath,
    /// Path of the node the signal is invoked on
    pub receiver: NodePath,
    /// The signal being invoked
    pub signal: String,
    frame_id: FrameId,
    /// The call's argument map
    pub options: FrameMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reply: Option<Box<SignalFrame>>,
}

impl SignalFrame {
    /// Build a call frame with a freshly allocated frame id
    pub fn call(
        sender: NodePath,
        receiver: NodePath,
        signal: impl Into<String>,
        options: FrameMap,
    ) -> SignalFrame {
        SignalFrame {
            sender,
            receiver,
            signal: signal.into(),
            frame_id: FrameId::next(),
            options,
            reply: None,
        }
    }

    /// The frame identifier correlating this call with its reply
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// The call's argument map
    pub fn options(&self) -> &FrameMap {
        &self.options
    }

    /// Build the reply frame for this call: same frame id, endpoints swapped
    pub fn make_reply(&self, body: FrameMap) -> SignalFrame {
        SignalFrame {
            sender: self.receiver.clone(),
            receiver: self.sender.clone(),
            signal: self.signal.clone(),
            frame_id: self.frame_id,
            options: body,
            reply: None,
        }
    }

    /// Embed a reply envelope into this frame
    pub fn attach_reply(&mut self, reply: SignalFrame) {
        self.reply = Some(Box::new(reply));
    }

    /// The embedded reply envelope, if any
    pub fn reply(&self) -> Option<&SignalFrame> {
        self.reply.as_deref()
    }

    /// Extract the embedded reply envelope
    pub fn take_reply(&mut self) -> Option<SignalFrame> {
        self.reply.take().map(|b| *b)
    }

    /// Encode to the external wire form
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the external wire form
    pub fn decode(encoded: &str) -> Result<SignalFrame> {
        Ok(serde_json::from_str(encoded)?)
    }
}

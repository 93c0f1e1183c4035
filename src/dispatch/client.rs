//! The client side of a remote dispatch session
//!
//! A [`SessionClient`] talks to a [`TreeServer`](crate::dispatch::TreeServer)
//! over a pair of channels. Calls are strictly ordered per session: a
//! frame is not transmitted while another call's reply is outstanding,
//! because a signal may mutate server-side tree state that the next
//! signal depends on.
//!
//! Abandoning a call is cooperative only. On timeout the continuation is
//! discarded locally, but the in-flight request still runs to completion
//! on the server. The caller must treat
//! [`TimedOut`](crate::SimTreeError::TimedOut) as "unknown outcome", not
//! "no-op".
//! A stale reply arriving after its call was abandoned is discarded by
//! frame-id matching.

use crate::builtin::SIG_SIGNAL_SIGNATURE;
use crate::dispatch::server::{ServerCommand, ServerEvent, SIG_SERVER_STATS};
use crate::dispatch::CallState;
use crate::error::{Result, SimTreeError};
use crate::signal::{FrameMap, SignalFrame};
use crate::tree::NodePath;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Client handle for invoking signals across the dispatch boundary
pub struct SessionClient {
    commands: Sender<ServerCommand>,
    events: Receiver<ServerEvent>,
    timeout: Duration,
    sender_path: NodePath,
    in_flight: Mutex<()>,
}

impl SessionClient {
    /// Wire a client over existing channels
    pub fn new(
        commands: Sender<ServerCommand>,
        events: Receiver<ServerEvent>,
        timeout: Duration,
    ) -> SessionClient {
        SessionClient {
            commands,
            events,
            timeout,
            sender_path: NodePath::root(),
            in_flight: Mutex::new(()),
        }
    }

    /// Set the sender path stamped into outgoing frames
    pub fn with_sender_path(mut self, path: NodePath) -> SessionClient {
        self.sender_path = path;
        self
    }

    fn transmit(&self, frame: &SignalFrame) -> Result<()> {
        let encoded = frame.encode()?;
        self.commands
            .send(ServerCommand::Frame(encoded))
            .map_err(|_| SimTreeError::Channel("tree server disconnected".to_string()))
    }

    /// Invoke a signal and wait for its reply
    ///
    /// Blocks until the reply bearing this call's frame id arrives, the
    /// configured timeout elapses, or the server disconnects. A reply
    /// body carrying an error entry surfaces as
    /// [`RemoteFailure`](SimTreeError::RemoteFailure) with the original
    /// handler error preserved.
    pub fn call(&self, receiver: &str, signal: &str, options: FrameMap) -> Result<FrameMap> {
        let frame = SignalFrame::call(
            self.sender_path.clone(),
            NodePath::new(receiver)?,
            signal,
            options,
        );
        let expected = frame.frame_id();
        let mut state = CallState::Pending;
        trace!(frame_id = %expected, ?state, "call queued");

        let _guard = self
            .in_flight
            .lock()
            .map_err(|_| SimTreeError::Channel("client session poisoned".to_string()))?;
        self.transmit(&frame)?;
        state = CallState::Sent;
        trace!(frame_id = %expected, ?state, "frame transmitted");

        let deadline = Instant::now() + self.timeout;
        loop {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                state = CallState::TimedOut;
                debug!(frame_id = %expected, ?state, "call abandoned");
                return Err(SimTreeError::TimedOut(format!(
                    "no reply for frame {} within {:?}",
                    expected, self.timeout
                )));
            };
            match self.events.recv_timeout(remaining) {
                Ok(ServerEvent::Reply(encoded)) => {
                    let mut envelope = SignalFrame::decode(&encoded)?;
                    if envelope.frame_id() != expected {
                        trace!(
                            frame_id = %envelope.frame_id(),
                            "discarding stale reply for abandoned call"
                        );
                        continue;
                    }
                    let reply = envelope.take_reply().ok_or_else(|| {
                        SimTreeError::RemoteFailure("reply envelope missing".to_string())
                    })?;
                    if let Some(message) = reply.options().error_message() {
                        let message = message.to_string();
                        state = CallState::Failed;
                        debug!(frame_id = %expected, ?state, error = %message, "call failed");
                        return Err(SimTreeError::RemoteFailure(message));
                    }
                    state = CallState::Replied;
                    trace!(frame_id = %expected, ?state, "call completed");
                    return Ok(reply.options);
                }
                Err(RecvTimeoutError::Timeout) => {
                    state = CallState::TimedOut;
                    debug!(frame_id = %expected, ?state, "call abandoned");
                    return Err(SimTreeError::TimedOut(format!(
                        "no reply for frame {} within {:?}",
                        expected, self.timeout
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SimTreeError::Channel(
                        "tree server disconnected".to_string(),
                    ));
                }
            }
        }
    }

    /// Invoke a signal without waiting for a reply
    ///
    /// The server's acknowledgement is discarded by the next call's
    /// frame-id matching.
    pub fn notify(&self, receiver: &str, signal: &str, options: FrameMap) -> Result<()> {
        let frame = SignalFrame::call(
            self.sender_path.clone(),
            NodePath::new(receiver)?,
            signal,
            options,
        );
        let _guard = self
            .in_flight
            .lock()
            .map_err(|_| SimTreeError::Channel("client session poisoned".to_string()))?;
        self.transmit(&frame)
    }

    /// Fetch a remote signal's parameter schema
    ///
    /// Signature discovery is a degenerate invocation: the server runs
    /// the signal's signature generator against an empty frame, which is
    /// how a caller builds a valid request without foreknowledge of the
    /// target's internals.
    pub fn signature(&self, receiver: &str, signal: &str) -> Result<FrameMap> {
        let mut options = FrameMap::new();
        options.set_str("name", signal);
        self.call(receiver, SIG_SIGNAL_SIGNATURE, options)
    }

    /// Fetch the server's dispatch statistics
    pub fn server_stats(&self) -> Result<FrameMap> {
        self.call("/", SIG_SERVER_STATS, FrameMap::new())
    }

    /// Ask the server to stop its worker loop
    pub fn shutdown(&self) -> Result<()> {
        self.commands
            .send(ServerCommand::Shutdown)
            .map_err(|_| SimTreeError::Channel("tree server disconnected".to_string()))
    }
}

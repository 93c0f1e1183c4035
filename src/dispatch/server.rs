//! The tree-owner worker loop
//!
//! The [`TreeServer`] owns the [`Tree`] and runs on its own thread, the
//! *tree owner*. Every mutation enters through its command channel: an
//! inbound frame is decoded, dispatched, and answered with the frame
//! re-encoded around an embedded reply envelope. This single-writer
//! discipline is what lets option triggers re-enter configuration without
//! locks, and it serializes remote calls naturally: commands drain in
//! arrival order.
//!
//! Handler errors never cross the boundary raw: they are wrapped into the
//! reply body's error entry, so the caller receives a
//! [`RemoteFailure`](crate::SimTreeError::RemoteFailure) that preserves
//! the original detail.

use crate::config::RuntimeConfig;
use crate::dispatch::{client::SessionClient, Dispatcher};
use crate::registry::SharedRegistry;
use crate::signal::{error_body, FrameMap, SignalFrame};
use crate::tree::Tree;
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info, warn};

/// Signal name answered by the server itself with its dispatch statistics
pub const SIG_SERVER_STATS: &str = "server_stats";

/// Message sent from a session client to the tree server
#[derive(Debug, Clone)]
pub enum ServerCommand {
    /// An encoded call frame to dispatch
    Frame(String),
    /// Stop the worker loop
    Shutdown,
}

/// Message sent from the tree server back to the session client
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// An encoded frame with its reply envelope embedded
    Reply(String),
}

/// Counters tracked across the server's lifetime
#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchStats {
    /// Frames received on the command channel
    pub frames_received: u64,
    /// Reply envelopes sent back
    pub replies_sent: u64,
    /// Undecodable frames plus dispatches that ended in an error
    pub failures: u64,
}

/// The worker that owns the tree and drains the command queue
pub struct TreeServer {
    tree: Tree,
    dispatcher: Dispatcher,
    config: RuntimeConfig,
    commands: Receiver<ServerCommand>,
    events: Sender<ServerEvent>,
    stats: DispatchStats,
}

impl TreeServer {
    /// Wire a server over existing channels
    pub fn new(
        tree: Tree,
        registry: SharedRegistry,
        config: RuntimeConfig,
        commands: Receiver<ServerCommand>,
        events: Sender<ServerEvent>,
    ) -> TreeServer {
        TreeServer {
            tree,
            dispatcher: Dispatcher::new(registry),
            config,
            commands,
            events,
            stats: DispatchStats::default(),
        }
    }

    /// Take ownership of the tree, spawn the worker thread, and hand back
    /// the session client
    pub fn spawn(
        tree: Tree,
        registry: SharedRegistry,
        config: RuntimeConfig,
    ) -> (std::thread::JoinHandle<()>, SessionClient) {
        let (command_tx, command_rx) = bounded(config.channel_capacity);
        let (event_tx, event_rx) = bounded(config.channel_capacity);
        let client = SessionClient::new(command_tx, event_rx, config.reply_timeout());
        let server = TreeServer::new(tree, registry, config, command_rx, event_tx);
        let handle = std::thread::spawn(move || server.run());
        (handle, client)
    }

    /// Run the worker loop until shutdown or client disconnect
    pub fn run(mut self) {
        info!("tree server started");
        while let Ok(command) = self.commands.recv() {
            match command {
                ServerCommand::Frame(encoded) => self.handle_frame(&encoded),
                ServerCommand::Shutdown => {
                    info!("tree server shutting down");
                    break;
                }
            }
        }
        info!(
            frames = self.stats.frames_received,
            replies = self.stats.replies_sent,
            failures = self.stats.failures,
            "tree server stopped"
        );
    }

    fn handle_frame(&mut self, encoded: &str) {
        self.stats.frames_received += 1;
        let frame = match SignalFrame::decode(encoded) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.failures += 1;
                warn!(error = %e, "dropping undecodable frame");
                return;
            }
        };
        if self.config.log_frames {
            debug!(
                frame_id = %frame.frame_id(),
                receiver = %frame.receiver,
                signal = %frame.signal,
                "frame received"
            );
        }

        let reply = if frame.signal == SIG_SERVER_STATS && frame.receiver.is_root() {
            frame.make_reply(self.stats_body())
        } else {
            match self.dispatcher.dispatch(&mut self.tree, &frame) {
                Ok(Some(reply)) => reply,
                // Signals without a reply body are still acknowledged so
                // the caller's ordered wait completes.
                Ok(None) => frame.make_reply(FrameMap::new()),
                Err(e) => {
                    self.stats.failures += 1;
                    debug!(frame_id = %frame.frame_id(), error = %e, "dispatch failed");
                    frame.make_reply(error_body(e.to_string()))
                }
            }
        };

        let mut envelope = frame;
        envelope.attach_reply(reply);
        match envelope.encode() {
            Ok(encoded) => {
                if self.events.send(ServerEvent::Reply(encoded)).is_ok() {
                    self.stats.replies_sent += 1;
                } else {
                    warn!("client disconnected, dropping reply");
                }
            }
            Err(e) => {
                self.stats.failures += 1;
                warn!(error = %e, "failed to encode reply envelope");
            }
        }
    }

    fn stats_body(&self) -> FrameMap {
        let mut body = FrameMap::new();
        body.set_int("frames_received", self.stats.frames_received as i64);
        body.set_int("replies_sent", self.stats.replies_sent as i64);
        body.set_int("failures", self.stats.failures as i64);
        body
    }
}

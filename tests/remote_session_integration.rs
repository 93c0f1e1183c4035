//! Integration tests for the client/server dispatch session
//!
//! These run the real channel transport: a spawned tree-owner thread
//! draining its command queue, with the client on the test thread.

mod common;

use common::builders::{DemoLibrary, NodeBuilder};
use simtree::config::RuntimeConfig;
use simtree::dispatch::{SessionClient, TreeServer};
use simtree::registry::Registry;
use simtree::signal::{FrameMap, Signal};
use simtree::tree::Tree;
use simtree::SimTreeError;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

fn spawn_demo(timeout_ms: u64) -> (JoinHandle<()>, SessionClient) {
    common::init_tracing();
    let mut registry = Registry::new();
    registry.load_library(Arc::new(DemoLibrary)).unwrap();

    let mut root = NodeBuilder::new("root").type_tag("demo.core.Root").build();
    root.register_signal(Signal::new("stall", "hold the tree owner busy", |_| {
        std::thread::sleep(Duration::from_millis(200));
        Ok(Some(FrameMap::new()))
    }))
    .unwrap();

    let config = RuntimeConfig {
        reply_timeout_ms: timeout_ms,
        ..RuntimeConfig::default()
    };
    TreeServer::spawn(Tree::new(root), registry.into_shared(), config)
}

#[test]
fn test_dependent_call_sequence_is_ordered() {
    let (worker, client) = spawn_demo(2_000);

    // B (configure) depends on A (create) having taken effect; the
    // client does not transmit B until A's reply has arrived.
    let mut options = FrameMap::new();
    options.set_str("name", "c1");
    options.set_str("type", "demo.core.Counter");
    let reply = client.call("/", "create_component", options).unwrap();
    assert_eq!(reply.get_path("path").unwrap().as_str(), "/c1");

    let mut options = FrameMap::new();
    options.set_int("limit", 50);
    client.call("/c1", "configure", options).unwrap();

    let mut options = FrameMap::new();
    options.set_int("step", 42);
    let reply = client.call("/c1", "increment", options).unwrap();
    assert_eq!(reply.get_int("count").unwrap(), 42);

    let stats = client.server_stats().unwrap();
    assert_eq!(stats.get_int("frames_received").unwrap(), 4);
    assert_eq!(stats.get_int("failures").unwrap(), 0);

    client.shutdown().unwrap();
    worker.join().unwrap();
}

#[test]
fn test_remote_handler_error_preserves_detail() {
    let (worker, client) = spawn_demo(2_000);

    let mut options = FrameMap::new();
    options.set_str("name", "c1");
    options.set_str("type", "demo.core.Counter");
    client.call("/", "create_component", options).unwrap();

    let mut options = FrameMap::new();
    options.set_int("step", 1_000);
    let err = client.call("/c1", "increment", options).unwrap_err();
    match err {
        SimTreeError::RemoteFailure(message) => {
            // The original validation error crossed the boundary intact.
            assert!(message.contains("Validation failed"), "got: {}", message);
            assert!(message.contains("exceeds limit"), "got: {}", message);
        }
        other => panic!("expected RemoteFailure, got {:?}", other),
    }

    client.shutdown().unwrap();
    worker.join().unwrap();
}

#[test]
fn test_remote_resolution_failures_surface_through_reply() {
    let (worker, client) = spawn_demo(2_000);

    let err = client
        .call("/nowhere", "list_signals", FrameMap::new())
        .unwrap_err();
    match err {
        SimTreeError::RemoteFailure(message) => {
            assert!(message.contains("Not found"), "got: {}", message)
        }
        other => panic!("expected RemoteFailure, got {:?}", other),
    }

    let err = client.call("/", "no_such_signal", FrameMap::new()).unwrap_err();
    match err {
        SimTreeError::RemoteFailure(message) => {
            assert!(message.contains("Unknown signal"), "got: {}", message)
        }
        other => panic!("expected RemoteFailure, got {:?}", other),
    }

    client.shutdown().unwrap();
    worker.join().unwrap();
}

#[test]
fn test_remote_signature_discovery() {
    let (worker, client) = spawn_demo(2_000);

    let mut options = FrameMap::new();
    options.set_str("name", "c1");
    options.set_str("type", "demo.core.Counter");
    client.call("/", "create_component", options).unwrap();

    // A remote UI can learn the accepted parameters before calling.
    let schema = client.signature("/c1", "increment").unwrap();
    assert_eq!(schema.get_int("step").unwrap(), 1);

    let schema = client.signature("/c1", "configure").unwrap();
    assert_eq!(schema.map("limit").unwrap().get_str("kind").unwrap(), "integer");

    client.shutdown().unwrap();
    worker.join().unwrap();
}

#[test]
fn test_timeout_is_unknown_outcome_and_session_recovers() {
    let (worker, client) = spawn_demo(50);

    // The handler outlives the caller's patience.
    let err = client.call("/", "stall", FrameMap::new()).unwrap_err();
    assert!(matches!(err, SimTreeError::TimedOut(_)));

    // The abandoned call still ran to completion on the server; give it
    // time to finish, then verify the session keeps working and the
    // stale reply is discarded by frame-id matching.
    std::thread::sleep(Duration::from_millis(300));
    let stats = client.server_stats().unwrap();
    assert_eq!(stats.get_int("frames_received").unwrap(), 2);
    // The stall's reply went out even though nobody was waiting for it.
    assert_eq!(stats.get_int("replies_sent").unwrap(), 1);

    client.shutdown().unwrap();
    worker.join().unwrap();
}

#[test]
fn test_notify_orders_before_subsequent_calls() {
    let (worker, client) = spawn_demo(2_000);

    let mut options = FrameMap::new();
    options.set_str("name", "c1");
    options.set_str("type", "demo.core.Counter");
    client.call("/", "create_component", options).unwrap();

    // Fire-and-forget, then a waited call: the queue serializes them.
    client.notify("/c1", "increment", FrameMap::new()).unwrap();
    let reply = client.call("/c1", "increment", FrameMap::new()).unwrap();
    assert_eq!(reply.get_int("count").unwrap(), 2);

    client.shutdown().unwrap();
    worker.join().unwrap();
}

#[test]
fn test_remote_tree_inspection() {
    let (worker, client) = spawn_demo(2_000);

    let mut options = FrameMap::new();
    options.set_str("name", "schemes");
    options.set_str("type", "demo.core.Counter");
    client.call("/", "create_component", options).unwrap();

    let mut options = FrameMap::new();
    options.set_str("name", "euler");
    options.set_str("type", "demo.schemes.Euler");
    options.set_str("capability", "demo.TimeScheme");
    let reply = client.call("/schemes", "create_component", options).unwrap();
    assert_eq!(reply.get_path("path").unwrap().as_str(), "/schemes/euler");

    let listing = client.call("/", "list_tree", FrameMap::new()).unwrap();
    let schemes = listing.map("schemes").unwrap();
    assert_eq!(
        schemes.map("euler").unwrap().get_str("type").unwrap(),
        "demo.schemes.Euler"
    );

    client.shutdown().unwrap();
    worker.join().unwrap();
}

#[test]
fn test_calls_after_shutdown_report_channel_error() {
    let (worker, client) = spawn_demo(2_000);
    client.shutdown().unwrap();
    worker.join().unwrap();

    let err = client.call("/", "list_signals", FrameMap::new()).unwrap_err();
    assert!(matches!(err, SimTreeError::Channel(_)));
}

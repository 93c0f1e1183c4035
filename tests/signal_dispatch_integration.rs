//! Integration tests for local signal dispatch and the standard signals

mod common;

use common::builders::{counter_node, DemoLibrary, NodeBuilder};
use simtree::config::NodeOption;
use simtree::dispatch::Dispatcher;
use simtree::registry::Registry;
use simtree::signal::FrameMap;
use simtree::tree::Tree;
use simtree::SimTreeError;
use std::sync::{Arc, Mutex};

fn setup() -> (Tree, Dispatcher) {
    let mut registry = Registry::new();
    registry.load_library(Arc::new(DemoLibrary)).unwrap();

    let mut tree = Tree::new(NodeBuilder::new("root").type_tag("demo.core.Root").build());
    let counter = counter_node("c1").unwrap();
    tree.attach(tree.root(), counter).unwrap();

    (tree, Dispatcher::new(registry.into_shared()))
}

#[test]
fn test_custom_signal_invocation_with_reply() {
    let (mut tree, dispatcher) = setup();

    let mut options = FrameMap::new();
    options.set_int("step", 3);
    let reply = dispatcher
        .call(&mut tree, "/c1", "increment", options)
        .unwrap()
        .unwrap();
    assert_eq!(reply.get_int("count").unwrap(), 3);

    // Handler state persists on the node between invocations.
    let reply = dispatcher
        .call(&mut tree, "/c1", "increment", FrameMap::new())
        .unwrap()
        .unwrap();
    assert_eq!(reply.get_int("count").unwrap(), 4);
}

#[test]
fn test_handler_error_surfaces_with_original_kind() {
    let (mut tree, dispatcher) = setup();

    let mut options = FrameMap::new();
    options.set_int("step", 1000);
    let err = dispatcher
        .call(&mut tree, "/c1", "increment", options)
        .unwrap_err();
    assert!(matches!(err, SimTreeError::ValidationFailed { .. }));
}

#[test]
fn test_signature_discovery() {
    let (tree, dispatcher) = setup();
    let schema = dispatcher.signature(&tree, "/c1", "increment").unwrap();
    assert_eq!(schema.get_int("step").unwrap(), 1);
}

#[test]
fn test_configure_signature_reflects_declared_options() {
    let (tree, dispatcher) = setup();
    let schema = dispatcher.signature(&tree, "/c1", "configure").unwrap();
    let limit = schema.map("limit").unwrap();
    assert_eq!(limit.get_str("kind").unwrap(), "integer");
    assert_eq!(limit.get_str("default").unwrap(), "10");
}

#[test]
fn test_hidden_signal_excluded_from_listing_but_invocable() {
    let (mut tree, dispatcher) = setup();

    let listing = dispatcher
        .call(&mut tree, "/c1", "list_signals", FrameMap::new())
        .unwrap()
        .unwrap();
    assert!(listing.map("increment").is_some());
    assert!(listing.map("signal_signature").is_none());

    // Still invocable by path + name.
    let mut options = FrameMap::new();
    options.set_str("name", "increment");
    let schema = dispatcher
        .call(&mut tree, "/c1", "signal_signature", options)
        .unwrap()
        .unwrap();
    assert_eq!(schema.get_int("step").unwrap(), 1);
}

#[test]
fn test_configure_signal_matches_direct_configuration() {
    let (mut tree, dispatcher) = setup();
    let fired = Arc::new(Mutex::new(0u32));
    let counter = fired.clone();

    let root = tree.root();
    tree.get_mut(root)
        .unwrap()
        .add_option(NodeOption::new("tolerance", "", 1e-3f64).on_change(move |_, _| {
            *counter.lock().unwrap() += 1;
            Ok(())
        }))
        .unwrap();

    let mut options = FrameMap::new();
    options.set_real("tolerance", 1e-6);
    dispatcher
        .call(&mut tree, "/", "configure", options)
        .unwrap();

    // Triggers fire for frame-driven configuration exactly as for local.
    assert_eq!(*fired.lock().unwrap(), 1);
    let value = tree
        .get(root)
        .unwrap()
        .options()
        .get("tolerance")
        .unwrap()
        .value()
        .clone();
    assert_eq!(value.as_real(), Some(1e-6));
}

#[test]
fn test_configure_signal_rejects_bad_values_without_side_effects() {
    let (mut tree, dispatcher) = setup();
    let c1 = tree.resolve_str("/c1").unwrap();

    let mut options = FrameMap::new();
    options.set_int("limit", 5000);
    let err = dispatcher
        .call(&mut tree, "/c1", "configure", options)
        .unwrap_err();
    assert!(matches!(err, SimTreeError::ValidationFailed { .. }));

    let value = tree.get(c1).unwrap().options().get("limit").unwrap().value().clone();
    assert_eq!(value.as_int(), Some(10));
}

#[test]
fn test_create_component_via_dispatch() {
    let (mut tree, dispatcher) = setup();

    let mut options = FrameMap::new();
    options.set_str("name", "c2");
    options.set_str("type", "demo.core.Counter");
    let reply = dispatcher
        .call(&mut tree, "/", "create_component", options)
        .unwrap()
        .unwrap();
    assert_eq!(reply.get_path("path").unwrap().as_str(), "/c2");

    let listing = dispatcher
        .call(&mut tree, "/", "list_tree", FrameMap::new())
        .unwrap()
        .unwrap();
    assert!(listing.map("c1").is_some());
    assert!(listing.map("c2").is_some());
}

#[test]
fn test_create_component_unknown_type_via_dispatch() {
    let (mut tree, dispatcher) = setup();

    let mut options = FrameMap::new();
    options.set_str("name", "x");
    options.set_str("type", "demo.core.Missing");
    let err = dispatcher
        .call(&mut tree, "/", "create_component", options)
        .unwrap_err();
    assert!(matches!(err, SimTreeError::UnknownType(_)));
}

#[test]
fn test_rename_and_delete_component_via_dispatch() {
    let (mut tree, dispatcher) = setup();

    let mut options = FrameMap::new();
    options.set_str("name", "c1");
    options.set_str("new_name", "counter");
    dispatcher
        .call(&mut tree, "/", "rename_component", options)
        .unwrap();
    assert!(tree.resolve_str("/counter").is_ok());
    assert!(tree.resolve_str("/c1").is_err());

    let mut options = FrameMap::new();
    options.set_str("name", "counter");
    dispatcher
        .call(&mut tree, "/", "delete_component", options)
        .unwrap();
    assert!(tree.resolve_str("/counter").is_err());
}

#[test]
fn test_list_options_reports_restriction() {
    let (mut tree, dispatcher) = setup();
    let listing = dispatcher
        .call(&mut tree, "/c1", "list_options", FrameMap::new())
        .unwrap()
        .unwrap();
    let limit = listing.map("limit").unwrap();
    assert_eq!(limit.get_str("value").unwrap(), "10");
    assert_eq!(limit.get_str("restriction").unwrap(), "[0, 100]");
}

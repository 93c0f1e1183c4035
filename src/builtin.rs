//! Standard signals carried by every node
//!
//! These make the whole object model reachable through the frame
//! protocol: discovery (`list_signals`, `list_options`, `list_tree`,
//! `signal_signature`), configuration (`configure`), and structure
//! editing (`create_component`, `delete_component`, `rename_component`).
//! A remote client needs nothing beyond these to inspect and reshape a
//! tree it has never seen.
//!
//! `signal_signature` is hidden: it is the discovery mechanism itself and
//! has no place in its own listings.

use crate::error::{Result, SimTreeError};
use crate::signal::{FrameMap, Signal, SignalContext};
use crate::tree::{dead_handle, NodeId, Tree};
use crate::types::Value;

/// Signal name: list non-hidden signals
pub const SIG_LIST_SIGNALS: &str = "list_signals";
/// Signal name: list declared options
pub const SIG_LIST_OPTIONS: &str = "list_options";
/// Signal name: recursive subtree listing
pub const SIG_LIST_TREE: &str = "list_tree";
/// Signal name: apply scalar entries to same-named options
pub const SIG_CONFIGURE: &str = "configure";
/// Signal name: build and attach a child by qualified type name
pub const SIG_CREATE_COMPONENT: &str = "create_component";
/// Signal name: detach a child subtree
pub const SIG_DELETE_COMPONENT: &str = "delete_component";
/// Signal name: rename a child
pub const SIG_RENAME_COMPONENT: &str = "rename_component";
/// Signal name: fetch another signal's parameter schema (hidden)
pub const SIG_SIGNAL_SIGNATURE: &str = "signal_signature";

/// The standard signal set registered at node construction
pub(crate) fn standard_signals() -> Vec<Signal> {
    vec![
        Signal::new(SIG_LIST_SIGNALS, "List the signals this node exposes", list_signals)
            .pretty("List Signals"),
        Signal::new(SIG_LIST_OPTIONS, "List the options this node exposes", list_options)
            .pretty("List Options"),
        Signal::new(SIG_LIST_TREE, "List the subtree below this node", list_tree)
            .pretty("List Tree"),
        Signal::new(SIG_CONFIGURE, "Configure options from frame entries", configure)
            .pretty("Configure")
            .with_signature(configure_signature),
        Signal::new(
            SIG_CREATE_COMPONENT,
            "Build a child component from a qualified type name",
            create_component,
        )
        .pretty("Create Component")
        .with_signature(|_, _, map| {
            map.set_str("name", "");
            map.set_str("type", "");
            Ok(())
        }),
        Signal::new(SIG_DELETE_COMPONENT, "Detach a child subtree", delete_component)
            .pretty("Delete Component")
            .with_signature(|_, _, map| {
                map.set_str("name", "");
                Ok(())
            }),
        Signal::new(SIG_RENAME_COMPONENT, "Rename a child", rename_component)
            .pretty("Rename Component")
            .with_signature(|_, _, map| {
                map.set_str("name", "");
                map.set_str("new_name", "");
                Ok(())
            }),
        Signal::new(
            SIG_SIGNAL_SIGNATURE,
            "Fetch the parameter schema of a signal",
            signal_signature,
        )
        .pretty("Signal Signature")
        .hidden(),
    ]
}

fn list_signals(ctx: &mut SignalContext) -> Result<Option<FrameMap>> {
    let node = ctx.tree.get(ctx.node).ok_or_else(|| dead_handle(ctx.node))?;
    let mut body = FrameMap::new();
    for signal in node.signals().filter(|s| !s.is_hidden()) {
        let entry = body.map_mut(signal.name());
        entry.set_str("description", signal.description());
        entry.set_str("pretty_name", signal.pretty_name());
    }
    Ok(Some(body))
}

fn list_options(ctx: &mut SignalContext) -> Result<Option<FrameMap>> {
    let node = ctx.tree.get(ctx.node).ok_or_else(|| dead_handle(ctx.node))?;
    let mut body = FrameMap::new();
    for option in node.options().iter() {
        let entry = body.map_mut(option.name());
        entry.set_str("kind", option.kind().to_string());
        entry.set_str("value", option.value().to_string());
        entry.set_str("description", option.description());
        entry.set_bool("basic", option.is_basic());
        if let Some(restriction) = option.restriction() {
            entry.set_str("restriction", restriction.describe());
        }
    }
    Ok(Some(body))
}

fn list_tree(ctx: &mut SignalContext) -> Result<Option<FrameMap>> {
    fn fill(tree: &Tree, id: NodeId, map: &mut FrameMap) -> Result<()> {
        for child in tree.children(id)? {
            let node = tree.get(child).ok_or_else(|| dead_handle(child))?;
            let entry = map.map_mut(node.name());
            entry.set_str("type", node.type_tag());
            fill(tree, child, entry)?;
        }
        Ok(())
    }

    let node = ctx.tree.get(ctx.node).ok_or_else(|| dead_handle(ctx.node))?;
    let mut body = FrameMap::new();
    body.set_str("type", node.type_tag());
    fill(ctx.tree, ctx.node, &mut body)?;
    Ok(Some(body))
}

fn configure(ctx: &mut SignalContext) -> Result<Option<FrameMap>> {
    let entries: Vec<(String, Value)> = ctx
        .frame
        .options()
        .entries()
        .map(|(name, entry)| match entry {
            crate::signal::FrameEntry::Scalar(value) => Ok((name.to_string(), value.clone())),
            crate::signal::FrameEntry::Array(array) => Err(SimTreeError::TypeMismatch {
                expected: "scalar option value".to_string(),
                found: format!("array of {}", array.kind()),
            }),
        })
        .collect::<Result<_>>()?;

    for (name, value) in entries {
        ctx.tree.configure_value(ctx.node, &name, value)?;
    }
    Ok(None)
}

fn configure_signature(tree: &Tree, id: NodeId, map: &mut FrameMap) -> Result<()> {
    let node = tree.get(id).ok_or_else(|| dead_handle(id))?;
    for option in node.options().iter() {
        let entry = map.map_mut(option.name());
        entry.set_str("kind", option.kind().to_string());
        entry.set_str("default", option.default_value().to_string());
        entry.set_str("description", option.description());
    }
    Ok(())
}

fn create_component(ctx: &mut SignalContext) -> Result<Option<FrameMap>> {
    let name = ctx.frame.options().get_str("name")?.to_string();
    let qualified = ctx.frame.options().get_str("type")?.to_string();

    let node = {
        let registry = ctx
            .registry
            .read()
            .map_err(|_| SimTreeError::Channel("registry lock poisoned".to_string()))?;
        // An optional capability entry turns this into a checked
        // build-by-capability: the concrete type name is still data.
        if ctx.frame.options().has("capability") {
            let capability = ctx.frame.options().get_str("capability")?;
            registry.build_as(capability, &qualified, &name)?
        } else {
            registry.build(&qualified, &name)?
        }
    };
    let id = ctx.tree.attach(ctx.node, node)?;

    let mut body = FrameMap::new();
    body.set_path("path", ctx.tree.path_of(id)?);
    Ok(Some(body))
}

fn delete_component(ctx: &mut SignalContext) -> Result<Option<FrameMap>> {
    let name = ctx.frame.options().get_str("name")?;
    let child = ctx.tree.find_child(ctx.node, name).ok_or_else(|| {
        SimTreeError::NotFound {
            path: ctx.frame.receiver.to_string(),
            segment: name.to_string(),
        }
    })?;
    ctx.tree.detach(child)?;
    Ok(None)
}

fn rename_component(ctx: &mut SignalContext) -> Result<Option<FrameMap>> {
    let name = ctx.frame.options().get_str("name")?;
    let new_name = ctx.frame.options().get_str("new_name")?.to_string();
    let child = ctx.tree.find_child(ctx.node, name).ok_or_else(|| {
        SimTreeError::NotFound {
            path: ctx.frame.receiver.to_string(),
            segment: name.to_string(),
        }
    })?;
    ctx.tree.rename(child, &new_name)?;
    Ok(None)
}

fn signal_signature(ctx: &mut SignalContext) -> Result<Option<FrameMap>> {
    let name = ctx.frame.options().get_str("name")?.to_string();
    let generator = {
        let node = ctx.tree.get(ctx.node).ok_or_else(|| dead_handle(ctx.node))?;
        let signal = node.signal(&name).ok_or_else(|| SimTreeError::UnknownSignal {
            path: ctx.frame.receiver.to_string(),
            signal: name.clone(),
        })?;
        signal.signature_fn().cloned()
    };

    let mut schema = FrameMap::new();
    if let Some(generator) = generator {
        generator(ctx.tree, ctx.node, &mut schema)?;
    }
    Ok(Some(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FnBuilder, Registry};
    use crate::signal::SignalFrame;
    use crate::tree::{Node, NodePath};

    fn context_parts() -> (Tree, crate::registry::SharedRegistry) {
        let mut registry = Registry::new();
        registry
            .register_builder(FnBuilder::new("demo.core.Counter", "demo.Counter", |name| {
                Node::new(name, "demo.core.Counter")
            }))
            .unwrap();
        let tree = Tree::new(Node::new("root", "demo.core.Root").unwrap());
        (tree, registry.into_shared())
    }

    fn invoke(
        tree: &mut Tree,
        registry: &crate::registry::SharedRegistry,
        signal: &str,
        options: FrameMap,
    ) -> Result<Option<FrameMap>> {
        let frame = SignalFrame::call(NodePath::root(), NodePath::root(), signal, options);
        let node = tree.root();
        let handler = tree
            .get(node)
            .unwrap()
            .signal(signal)
            .expect("standard signal")
            .handler();
        let mut ctx = SignalContext {
            tree,
            registry,
            node,
            frame: &frame,
        };
        handler(&mut ctx)
    }

    #[test]
    fn test_list_signals_excludes_hidden() {
        let (mut tree, registry) = context_parts();
        let body = invoke(&mut tree, &registry, SIG_LIST_SIGNALS, FrameMap::new())
            .unwrap()
            .unwrap();
        assert!(body.map(SIG_CONFIGURE).is_some());
        assert!(body.map(SIG_SIGNAL_SIGNATURE).is_none());
    }

    #[test]
    fn test_create_then_delete_component() {
        let (mut tree, registry) = context_parts();
        let mut options = FrameMap::new();
        options.set_str("name", "c1");
        options.set_str("type", "demo.core.Counter");
        let body = invoke(&mut tree, &registry, SIG_CREATE_COMPONENT, options)
            .unwrap()
            .unwrap();
        assert_eq!(body.get_path("path").unwrap().as_str(), "/c1");
        assert!(tree.resolve_str("/c1").is_ok());

        let mut options = FrameMap::new();
        options.set_str("name", "c1");
        invoke(&mut tree, &registry, SIG_DELETE_COMPONENT, options).unwrap();
        assert!(tree.resolve_str("/c1").is_err());
    }

    #[test]
    fn test_create_component_capability_mismatch() {
        let (mut tree, registry) = context_parts();
        let mut options = FrameMap::new();
        options.set_str("name", "c1");
        options.set_str("type", "demo.core.Counter");
        options.set_str("capability", "demo.Gauge");
        let err = invoke(&mut tree, &registry, SIG_CREATE_COMPONENT, options).unwrap_err();
        assert!(matches!(err, SimTreeError::TypeMismatch { .. }));
    }

    #[test]
    fn test_configure_signal_applies_options() {
        let (mut tree, registry) = context_parts();
        let root = tree.root();
        tree.get_mut(root)
            .unwrap()
            .add_option(crate::config::NodeOption::new("limit", "", 10i64))
            .unwrap();

        let mut options = FrameMap::new();
        options.set_int("limit", 42);
        invoke(&mut tree, &registry, SIG_CONFIGURE, options).unwrap();

        let node = tree.get(root).unwrap();
        assert_eq!(node.options().get("limit").unwrap().value().as_int(), Some(42));
    }

    #[test]
    fn test_signature_of_configure_lists_options() {
        let (mut tree, registry) = context_parts();
        let root = tree.root();
        tree.get_mut(root)
            .unwrap()
            .add_option(crate::config::NodeOption::new("limit", "iteration cap", 10i64))
            .unwrap();

        let mut options = FrameMap::new();
        options.set_str("name", SIG_CONFIGURE);
        let schema = invoke(&mut tree, &registry, SIG_SIGNAL_SIGNATURE, options)
            .unwrap()
            .unwrap();
        let limit = schema.map("limit").unwrap();
        assert_eq!(limit.get_str("kind").unwrap(), "integer");
        assert_eq!(limit.get_str("default").unwrap(), "10");
    }

    #[test]
    fn test_list_tree_nests_children() {
        let (mut tree, registry) = context_parts();
        let root = tree.root();
        let child = tree
            .attach(root, Node::new("domain", "demo.core.Group").unwrap())
            .unwrap();
        tree.attach(child, Node::new("mesh", "demo.core.Group").unwrap())
            .unwrap();

        let body = invoke(&mut tree, &registry, SIG_LIST_TREE, FrameMap::new())
            .unwrap()
            .unwrap();
        let domain = body.map("domain").unwrap();
        assert_eq!(domain.get_str("type").unwrap(), "demo.core.Group");
        assert!(domain.map("mesh").is_some());
    }
}

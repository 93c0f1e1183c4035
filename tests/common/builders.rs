//! Test data builders and the demo component library

use simtree::config::{NodeOption, Restriction};
use simtree::registry::{Builder, FnBuilder, Library};
use simtree::signal::{FrameMap, Signal};
use simtree::tree::Node;
use simtree::{Result, SimTreeError, Value};
use std::sync::Arc;

/// Builder for creating plain test nodes
pub struct NodeBuilder {
    name: String,
    type_tag: String,
    basic: bool,
}

impl NodeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_tag: "demo.core.Group".to_string(),
            basic: true,
        }
    }

    pub fn type_tag(mut self, type_tag: &str) -> Self {
        self.type_tag = type_tag.to_string();
        self
    }

    pub fn advanced(mut self) -> Self {
        self.basic = false;
        self
    }

    pub fn build(self) -> Node {
        let mut node = Node::new(self.name, self.type_tag).expect("valid test node");
        node.set_basic(self.basic);
        node
    }
}

/// Construct the demo counter node: a `count` property, a restricted
/// `limit` option, and an `increment` signal that fails past the limit
pub fn counter_node(name: &str) -> Result<Node> {
    let mut node = Node::new(name, "demo.core.Counter")?;
    node.properties_mut().set("count", 0i64);
    node.add_option(
        NodeOption::new("limit", "maximum count", 10i64)
            .with_restriction(Restriction::IntRange { min: 0, max: 100 }),
    )?;
    node.register_signal(
        Signal::new("increment", "increase the count", |ctx| {
            let step = ctx.frame.options().get_int("step").unwrap_or(1);
            let limit = {
                let node = ctx.tree.get(ctx.node).expect("receiver alive");
                node.options()
                    .get("limit")
                    .and_then(|o| o.value().as_int())
                    .unwrap_or(i64::MAX)
            };
            let node = ctx.tree.get_mut(ctx.node).expect("receiver alive");
            let count = node
                .properties()
                .get("count")
                .and_then(Value::as_int)
                .unwrap_or(0)
                + step;
            if count > limit {
                return Err(SimTreeError::ValidationFailed {
                    option: "limit".to_string(),
                    message: format!("count {} exceeds limit {}", count, limit),
                });
            }
            node.properties_mut().set("count", count);
            let mut body = FrameMap::new();
            body.set_int("count", count);
            Ok(Some(body))
        })
        .pretty("Increment")
        .with_signature(|_, _, map| {
            map.set_int("step", 1);
            Ok(())
        }),
    )?;
    Ok(node)
}

fn scheme_node(name: &str, qualified: &str) -> Result<Node> {
    let mut node = Node::new(name, qualified)?;
    node.add_option(
        NodeOption::new("cfl", "Courant number", 0.5f64)
            .with_restriction(Restriction::RealRange { min: 0.0, max: 1.0 }),
    )?;
    Ok(node)
}

/// The demo library: one counter type plus two time schemes sharing the
/// `demo.TimeScheme` capability
pub struct DemoLibrary;

impl Library for DemoLibrary {
    fn name(&self) -> &str {
        "demo"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn builders(&self) -> Vec<Arc<dyn Builder>> {
        let counter: Arc<dyn Builder> =
            FnBuilder::new("demo.core.Counter", "demo.Counter", counter_node);
        let euler: Arc<dyn Builder> =
            FnBuilder::new("demo.schemes.Euler", "demo.TimeScheme", |name| {
                scheme_node(name, "demo.schemes.Euler")
            });
        let rk4: Arc<dyn Builder> =
            FnBuilder::new("demo.schemes.Rk4", "demo.TimeScheme", |name| {
                scheme_node(name, "demo.schemes.Rk4")
            });
        vec![counter, euler, rk4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_builder() {
        let node = NodeBuilder::new("probe")
            .type_tag("demo.core.Marker")
            .advanced()
            .build();
        assert_eq!(node.name(), "probe");
        assert_eq!(node.type_tag(), "demo.core.Marker");
        assert!(!node.is_basic());
    }
}

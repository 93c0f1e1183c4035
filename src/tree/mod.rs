//! The component tree: ownership, addressing, and configuration
//!
//! The tree is a single-owner arena. Parents hold their children by
//! [`NodeId`]; every node is reachable from the distinguished root and is
//! addressed by a unique [`NodePath`]. Handles are generational, so a
//! `NodeId` held across a [`detach`](Tree::detach) reports "gone" on the
//! next [`get`](Tree::get) instead of aliasing freed storage.
//!
//! # Threading
//!
//! The tree is mutated by at most one thread of control at a time, the
//! *tree owner* (see [`TreeServer`](crate::dispatch::TreeServer)). Option
//! triggers may re-enter [`configure`](Tree::configure) on the same or
//! another node; that re-entrancy is safe precisely because all mutation
//! runs on the owner thread, with no locks to recurse into.

pub mod node;
pub mod path;

pub use node::{Node, NodeId, PropertyList};
pub use path::NodePath;

use crate::error::{Result, SimTreeError};
use crate::tree::path::PARENT_SEGMENT;
use crate::types::Value;

pub(crate) fn dead_handle(id: NodeId) -> SimTreeError {
    SimTreeError::NotFound {
        path: id.to_string(),
        segment: "detached node".to_string(),
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// The set of nodes reachable from a distinguished root
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Tree {
    /// Create a tree owning the given root node
    pub fn new(root: Node) -> Tree {
        let mut tree = Tree {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.insert(root);
        tree
    }

    /// The root node's id
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Revalidate a handle and borrow the node, or `None` if it is gone
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Revalidate a handle and borrow the node mutably
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Number of live nodes in the tree
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Whether the tree holds only freed slots (never true: the root lives)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    // ==================== Addressing ====================

    /// Find a direct child by name
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let node = self.get(parent)?;
        node.children
            .iter()
            .copied()
            .find(|&c| self.get(c).map(|n| n.name() == name).unwrap_or(false))
    }

    /// Resolve a path against a base node
    ///
    /// Absolute paths start at the root, relative ones at `base`.
    /// Resolution walks one segment at a time; the error names the first
    /// segment that failed to resolve, not a generic failure.
    pub fn resolve(&self, base: NodeId, path: &NodePath) -> Result<NodeId> {
        let mut current = if path.is_absolute() { self.root } else { base };
        self.get(current).ok_or_else(|| dead_handle(current))?;

        for segment in path.segments() {
            let next = if segment == PARENT_SEGMENT {
                self.get(current)
                    .ok_or_else(|| dead_handle(current))?
                    .parent()
            } else {
                self.find_child(current, segment)
            };
            current = next.ok_or_else(|| SimTreeError::NotFound {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
        }
        Ok(current)
    }

    /// Parse and resolve a path string against the root
    pub fn resolve_str(&self, path: &str) -> Result<NodeId> {
        self.resolve(self.root, &NodePath::new(path)?)
    }

    /// The root-relative path of a node
    pub fn path_of(&self, id: NodeId) -> Result<NodePath> {
        let mut names = Vec::new();
        let mut current = id;
        loop {
            let node = self.get(current).ok_or_else(|| dead_handle(current))?;
            match node.parent() {
                Some(parent) => {
                    names.push(node.name().to_string());
                    current = parent;
                }
                None => break,
            }
        }
        let mut path = NodePath::root();
        for name in names.iter().rev() {
            path = path.join(name)?;
        }
        Ok(path)
    }

    // ==================== Ownership ====================

    /// Attach a detached node under a parent
    ///
    /// Fails with [`DuplicateName`](SimTreeError::DuplicateName) if the
    /// parent already has a child with the node's name.
    pub fn attach(&mut self, parent: NodeId, node: Node) -> Result<NodeId> {
        self.get(parent).ok_or_else(|| dead_handle(parent))?;
        if self.find_child(parent, node.name()).is_some() {
            return Err(SimTreeError::DuplicateName(node.name().to_string()));
        }
        let id = self.insert(node);
        self.get_mut(id).unwrap().parent = Some(parent);
        self.get_mut(parent).unwrap().children.push(id);
        Ok(id)
    }

    /// Detach a node, recursively destroying its subtree bottom-up
    ///
    /// Every handle into the destroyed subtree becomes dead. The root
    /// cannot be detached.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(SimTreeError::Config("cannot detach the root".to_string()));
        }
        let parent = self
            .get(id)
            .ok_or_else(|| dead_handle(id))?
            .parent()
            .ok_or_else(|| dead_handle(id))?;

        self.get_mut(parent)
            .unwrap()
            .children
            .retain(|&c| c != id);

        // Post-order walk so children are freed before their parent.
        let mut order = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
            } else {
                stack.push((current, true));
                if let Some(node) = self.get(current) {
                    for &child in &node.children {
                        stack.push((child, false));
                    }
                }
            }
        }
        for dead in order {
            let slot = &mut self.slots[dead.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(dead.index);
        }
        Ok(())
    }

    /// Rename a node, keeping sibling names unique
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<()> {
        path::validate_name(new_name)?;
        let node = self.get(id).ok_or_else(|| dead_handle(id))?;
        if let Some(parent) = node.parent() {
            if let Some(existing) = self.find_child(parent, new_name) {
                if existing != id {
                    return Err(SimTreeError::DuplicateName(new_name.to_string()));
                }
            }
        }
        self.get_mut(id).unwrap().set_name(new_name.to_string());
        Ok(())
    }

    // ==================== Iteration ====================

    /// The direct children of a node, in attach order
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self
            .get(id)
            .ok_or_else(|| dead_handle(id))?
            .children()
            .to_vec())
    }

    /// Direct children whose declared type tag matches
    pub fn children_with_tag(&self, id: NodeId, tag: &str) -> Result<Vec<NodeId>> {
        Ok(self
            .children(id)?
            .into_iter()
            .filter(|&c| self.get(c).map(|n| n.type_tag() == tag).unwrap_or(false))
            .collect())
    }

    /// All descendants of a node, preorder, the node itself excluded
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.get(id).ok_or_else(|| dead_handle(id))?;
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.get(id).unwrap().children().to_vec();
        stack.reverse();
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.get(current) {
                for &child in node.children().iter().rev() {
                    stack.push(child);
                }
            }
        }
        Ok(out)
    }

    /// Descendants whose capability tag matches
    ///
    /// This is the "all nodes of capability X under this subtree" query;
    /// it filters on the declared tag rather than downcasting anything.
    pub fn descendants_with_capability(&self, id: NodeId, capability: &str) -> Result<Vec<NodeId>> {
        Ok(self
            .descendants(id)?
            .into_iter()
            .filter(|&c| {
                self.get(c)
                    .map(|n| n.capability() == capability)
                    .unwrap_or(false)
            })
            .collect())
    }

    // ==================== Configuration ====================

    /// Configure an option from its serialized (string) form
    ///
    /// The raw value is converted to the option's declared kind before
    /// validation; conversion failures and restriction failures are
    /// distinct error kinds, and both leave the option untouched.
    pub fn configure(&mut self, id: NodeId, option: &str, raw: &str) -> Result<()> {
        let value = {
            let opt = self.option_ref(id, option)?;
            Value::parse_as(opt.kind(), raw)?
        };
        self.configure_value(id, option, value)
    }

    /// Configure an option from an already-decoded value
    ///
    /// On success the current value is updated, any linked storage is
    /// written through, and every registered trigger runs synchronously,
    /// in registration order, before this returns. Triggers may re-enter
    /// configuration on this or other nodes.
    pub fn configure_value(&mut self, id: NodeId, option: &str, value: Value) -> Result<()> {
        let path = self.path_of(id)?;
        let triggers = {
            let node = self.get_mut(id).ok_or_else(|| dead_handle(id))?;
            let opt = node
                .options
                .get_mut(option)
                .ok_or_else(|| SimTreeError::NotFound {
                    path: path.to_string(),
                    segment: option.to_string(),
                })?;
            opt.assign(value)?
        };
        for trigger in triggers {
            trigger(self, id)?;
        }
        Ok(())
    }

    fn option_ref(&self, id: NodeId, option: &str) -> Result<&crate::config::option::NodeOption> {
        let path = self.path_of(id)?;
        let node = self.get(id).ok_or_else(|| dead_handle(id))?;
        node.options()
            .get(option)
            .ok_or_else(|| SimTreeError::NotFound {
                path: path.to_string(),
                segment: option.to_string(),
            })
    }
}

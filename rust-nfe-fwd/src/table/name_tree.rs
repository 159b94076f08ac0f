//! Shared name index.
//!
//! Nodes form a tree keyed by name components and are stored in an arena, so
//! tables refer to each other through small [`NodeId`] handles instead of
//! shared pointers. A node stays alive as long as any table attaches state to
//! it; [`NameTree::cleanup`] prunes nodes that have become empty.

use crate::table::fib;
use crate::table::measurements;
use crate::table::pit::PitToken;
use rust_nfe_common::{Name, NameComponent};
use std::collections::HashMap;

/// Handle to a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One name prefix and the per-table state attached to it.
#[derive(Debug, Default)]
pub struct Node {
    name: Name,
    parent: Option<NodeId>,
    children: HashMap<NameComponent, NodeId>,
    pub(crate) fib: Option<fib::Entry>,
    pub(crate) measurements: Option<measurements::Entry>,
    pub(crate) pit_tokens: Vec<PitToken>,
}

impl Node {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn is_empty(&self) -> bool {
        self.children.is_empty()
            && self.fib.is_none()
            && self.measurements.is_none()
            && self.pit_tokens.is_empty()
    }
}

pub struct NameTree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    by_name: HashMap<Name, NodeId>,
    root: NodeId,
}

impl NameTree {
    pub fn new() -> Self {
        let root = Node::default();
        let mut by_name = HashMap::new();
        by_name.insert(Name::new(), NodeId(0));
        Self {
            nodes: vec![Some(root)],
            free: Vec::new(),
            by_name,
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0].as_ref().unwrap_or_else(|| {
            panic!("stale node id {:?}", id);
        })
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0].as_mut().unwrap_or_else(|| {
            panic!("stale node id {:?}", id);
        })
    }

    /// Finds the node for `name`, creating it and any missing ancestors.
    pub fn lookup(&mut self, name: &Name) -> NodeId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let mut current = self.root;
        let mut prefix = Name::new();
        for component in name.components() {
            prefix.push(component.clone());
            current = match self.node(current).children.get(component) {
                Some(&child) => child,
                None => {
                    let child = self.alloc(Node {
                        name: prefix.clone(),
                        parent: Some(current),
                        ..Node::default()
                    });
                    self.node_mut(current)
                        .children
                        .insert(component.clone(), child);
                    self.by_name.insert(prefix.clone(), child);
                    child
                }
            };
        }
        current
    }

    pub fn find_exact(&self, name: &Name) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Deepest existing node whose name prefixes `name` and satisfies `pred`.
    pub fn longest_prefix_match(
        &self,
        name: &Name,
        pred: impl Fn(&Node) -> bool,
    ) -> Option<NodeId> {
        let mut best = None;
        let mut current = self.root;
        if pred(self.node(current)) {
            best = Some(current);
        }
        for component in name.components() {
            current = match self.node(current).children.get(component) {
                Some(&child) => child,
                None => break,
            };
            if pred(self.node(current)) {
                best = Some(current);
            }
        }
        best
    }

    /// All existing nodes along the path from the root to `name` inclusive.
    pub fn prefixes_of(&self, name: &Name) -> Vec<NodeId> {
        let mut out = vec![self.root];
        let mut current = self.root;
        for component in name.components() {
            current = match self.node(current).children.get(component) {
                Some(&child) => child,
                None => return out,
            };
            out.push(current);
        }
        out
    }

    /// Walks the subtree rooted at `prefix`, if it exists.
    ///
    /// The visitor returns `(accept, descend)`: accepted nodes are collected,
    /// and children are only visited when `descend` is true.
    pub fn partial_enumerate(
        &self,
        prefix: &Name,
        mut visitor: impl FnMut(&Node) -> (bool, bool),
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        let start = match self.find_exact(prefix) {
            Some(id) => id,
            None => return out,
        };
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            let (accept, descend) = visitor(node);
            if accept {
                out.push(id);
            }
            if descend {
                stack.extend(node.children.values().copied());
            }
        }
        out
    }

    /// Erases `id` and any ancestors that carry no state once it is gone.
    pub fn cleanup(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            if id == self.root || !self.node(id).is_empty() {
                return;
            }
            let node = self.nodes[id.0].take().unwrap_or_default();
            self.free.push(id.0);
            self.by_name.remove(&node.name);
            current = node.parent;
            if let (Some(parent), Some(last)) = (node.parent, node.name.components().last()) {
                self.node_mut(parent).children.remove(last);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.len() == 1
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }
}

impl Default for NameTree {
    fn default() -> Self {
        Self::new()
    }
}

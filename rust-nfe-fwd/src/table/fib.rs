//! Forwarding Information Base.
//!
//! FIB entries are attached to name tree nodes; the functions here operate on
//! the shared tree so FIB updates and lookups stay a single tree walk.

use crate::table::name_tree::{NameTree, NodeId};
use log::debug;
use rust_nfe_common::{FaceId, Name};

/// One upstream for a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextHop {
    pub face: FaceId,
    pub cost: u64,
}

/// The next-hop set for one prefix, kept sorted by ascending cost.
#[derive(Debug, Default)]
pub struct Entry {
    next_hops: Vec<NextHop>,
}

impl Entry {
    pub fn next_hops(&self) -> &[NextHop] {
        &self.next_hops
    }

    pub fn has_next_hop(&self, face: FaceId) -> bool {
        self.next_hops.iter().any(|h| h.face == face)
    }

    fn insert(&mut self, face: FaceId, cost: u64) -> bool {
        let is_new = match self.next_hops.iter_mut().find(|h| h.face == face) {
            Some(hop) => {
                hop.cost = cost;
                false
            }
            None => {
                self.next_hops.push(NextHop { face, cost });
                true
            }
        };
        self.next_hops.sort_by_key(|h| h.cost);
        is_new
    }

    fn remove(&mut self, face: FaceId) {
        self.next_hops.retain(|h| h.face != face);
    }

    pub fn is_empty(&self) -> bool {
        self.next_hops.is_empty()
    }
}

/// Adds or updates a next hop; returns true when the hop did not exist.
pub fn add_next_hop(tree: &mut NameTree, prefix: &Name, face: FaceId, cost: u64) -> bool {
    let node = tree.lookup(prefix);
    let entry = tree.node_mut(node).fib.get_or_insert_with(Entry::default);
    let is_new = entry.insert(face, cost);
    if is_new {
        debug!("fib add prefix={} {} cost={}", prefix, face, cost);
    }
    is_new
}

/// Removes one next hop, erasing the entry when it becomes empty.
pub fn remove_next_hop(tree: &mut NameTree, prefix: &Name, face: FaceId) {
    let node = match tree.find_exact(prefix) {
        Some(node) => node,
        None => return,
    };
    let empty = match &mut tree.node_mut(node).fib {
        Some(entry) => {
            entry.remove(face);
            entry.is_empty()
        }
        None => return,
    };
    if empty {
        tree.node_mut(node).fib = None;
        tree.cleanup(node);
    }
}

/// Removes a face from every entry, used when the face is destroyed.
pub fn remove_face(tree: &mut NameTree, face: FaceId) {
    let nodes = tree.partial_enumerate(&Name::new(), |n| (n.fib.is_some(), true));
    for node in nodes {
        let empty = match &mut tree.node_mut(node).fib {
            Some(entry) => {
                entry.remove(face);
                entry.is_empty()
            }
            None => continue,
        };
        if empty {
            tree.node_mut(node).fib = None;
            tree.cleanup(node);
        }
    }
}

/// Longest prefix match: the deepest entry with a non-empty next-hop set.
pub fn longest_prefix_match(tree: &NameTree, name: &Name) -> Option<NodeId> {
    tree.longest_prefix_match(name, |n| n.fib.as_ref().is_some_and(|e| !e.is_empty()))
}

pub fn find_exact<'t>(tree: &'t NameTree, prefix: &Name) -> Option<&'t Entry> {
    let node = tree.find_exact(prefix)?;
    tree.node(node).fib.as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn name(uri: &str) -> Name {
        Name::from_str(uri).unwrap()
    }

    #[test]
    fn next_hops_sorted_by_cost() {
        let mut tree = NameTree::new();
        assert!(add_next_hop(&mut tree, &name("/a"), FaceId(300), 20));
        assert!(add_next_hop(&mut tree, &name("/a"), FaceId(301), 10));
        assert!(!add_next_hop(&mut tree, &name("/a"), FaceId(300), 5));

        let entry = find_exact(&tree, &name("/a")).unwrap();
        let faces: Vec<FaceId> = entry.next_hops().iter().map(|h| h.face).collect();
        assert_eq!(faces, vec![FaceId(300), FaceId(301)]);
    }

    #[test]
    fn lpm_skips_prefixes_without_entries() {
        let mut tree = NameTree::new();
        add_next_hop(&mut tree, &name("/a"), FaceId(300), 1);
        tree.lookup(&name("/a/b/c"));

        let hit = longest_prefix_match(&tree, &name("/a/b/c/d")).unwrap();
        assert_eq!(tree.node(hit).name(), &name("/a"));
        assert!(longest_prefix_match(&tree, &name("/z")).is_none());
    }

    #[test]
    fn removing_last_hop_erases_entry() {
        let mut tree = NameTree::new();
        add_next_hop(&mut tree, &name("/a/b"), FaceId(300), 1);
        remove_next_hop(&mut tree, &name("/a/b"), FaceId(300));
        assert!(find_exact(&tree, &name("/a/b")).is_none());
        assert!(tree.find_exact(&name("/a/b")).is_none());
    }

    #[test]
    fn remove_face_sweeps_all_entries() {
        let mut tree = NameTree::new();
        add_next_hop(&mut tree, &name("/a"), FaceId(300), 1);
        add_next_hop(&mut tree, &name("/b"), FaceId(300), 1);
        add_next_hop(&mut tree, &name("/b"), FaceId(301), 1);
        remove_face(&mut tree, FaceId(300));
        assert!(find_exact(&tree, &name("/a")).is_none());
        assert!(find_exact(&tree, &name("/b")).unwrap().has_next_hop(FaceId(301)));
    }
}

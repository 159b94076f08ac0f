//! Measurements table.
//!
//! Strategies attach per-prefix state here. Entries live on name tree nodes
//! and expire by lifetime; expiry is lazy, an expired entry is reset when it
//! is next fetched and swept out by [`cleanup_expired`].

use crate::clock::Timestamp;
use crate::table::name_tree::{NameTree, NodeId};
use rust_nfe_common::Name;
use std::any::Any;
use std::fmt;
use std::time::Duration;

/// Lifetime granted to a freshly created entry before any extension.
pub const INITIAL_LIFETIME: Duration = Duration::from_secs(4);

/// Per-prefix measurements state with a typed strategy slot.
pub struct Entry {
    pub(crate) expiry: Timestamp,
    info: Option<Box<dyn Any>>,
}

impl Entry {
    pub fn info<T: Any>(&self) -> Option<&T> {
        self.info.as_ref()?.downcast_ref()
    }

    pub fn info_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.info.as_mut()?.downcast_mut()
    }

    pub fn set_info<T: Any>(&mut self, info: T) {
        self.info = Some(Box::new(info));
    }
}

// the info slot is type-erased, so report only its presence
impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("expiry", &self.expiry)
            .field("has_info", &self.info.is_some())
            .finish()
    }
}

/// Fetches the entry for `name`, creating or resetting it as needed.
pub fn get(tree: &mut NameTree, name: &Name, now: Timestamp) -> NodeId {
    let node = tree.lookup(name);
    ensure_entry(tree, node, now);
    node
}

/// Fetches the entry on the parent prefix; None at the root.
pub fn get_parent(tree: &mut NameTree, node: NodeId, now: Timestamp) -> Option<NodeId> {
    let parent = tree.node(node).parent()?;
    ensure_entry(tree, parent, now);
    Some(parent)
}

/// Keeps the entry alive for at least `lifetime` from now.
pub fn extend_lifetime(tree: &mut NameTree, node: NodeId, lifetime: Duration, now: Timestamp) {
    if let Some(entry) = tree.node_mut(node).measurements.as_mut() {
        let expiry = now + lifetime;
        if expiry > entry.expiry {
            entry.expiry = expiry;
        }
    }
}

/// The live entry on `node`, if one exists.
pub fn entry_mut(tree: &mut NameTree, node: NodeId, now: Timestamp) -> Option<&mut Entry> {
    let entry = tree.node_mut(node).measurements.as_mut()?;
    if entry.expiry <= now {
        return None;
    }
    Some(entry)
}

/// Sweeps out expired entries and prunes emptied nodes.
pub fn cleanup_expired(tree: &mut NameTree, now: Timestamp) {
    let expired = tree.partial_enumerate(&Name::new(), |n| {
        let dead = n.measurements.as_ref().is_some_and(|e| e.expiry <= now);
        (dead, true)
    });
    for node in expired {
        tree.node_mut(node).measurements = None;
        tree.cleanup(node);
    }
}

fn ensure_entry(tree: &mut NameTree, node: NodeId, now: Timestamp) {
    let slot = &mut tree.node_mut(node).measurements;
    let stale = slot.as_ref().map_or(true, |e| e.expiry <= now);
    if stale {
        *slot = Some(Entry {
            expiry: now + INITIAL_LIFETIME,
            info: None,
        });
    }
}

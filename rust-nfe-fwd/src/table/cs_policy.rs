//! Content Store eviction policies.
//!
//! A policy tracks entry names in its own order and decides which entries to
//! evict; the store itself only holds the packets. Victims returned by a hook
//! are already forgotten by the policy, the store erases the packets.

use rust_nfe_common::Name;
use std::collections::{BTreeMap, HashMap};

/// Eviction policy interface.
///
/// The store calls the `after_*`/`before_*` hooks as entries are inserted,
/// refreshed, used and erased, and erases whatever names a hook returns.
pub trait Policy {
    fn name(&self) -> &'static str;

    fn limit(&self) -> usize;

    /// Changes the capacity, returning entries to evict to fit the new limit.
    fn set_limit(&mut self, limit: usize) -> Vec<Name>;

    /// A new entry was inserted; returns entries to evict over the limit.
    fn after_insert(&mut self, name: &Name) -> Vec<Name>;

    /// An existing entry was replaced by a newer packet.
    fn after_refresh(&mut self, name: &Name);

    /// The store is erasing this entry for a reason of its own.
    fn before_erase(&mut self, name: &Name);

    /// The entry satisfied a lookup.
    fn before_use(&mut self, name: &Name);
}

/// Instantiates a policy by its config name.
pub fn create(name: &str, limit: usize) -> Option<Box<dyn Policy>> {
    match name {
        LruPolicy::NAME => Some(Box::new(LruPolicy::new(limit))),
        FifoPolicy::NAME => Some(Box::new(FifoPolicy::new(limit))),
        _ => None,
    }
}

pub fn is_known(name: &str) -> bool {
    matches!(name, LruPolicy::NAME | FifoPolicy::NAME)
}

/// Entry names in a priority order maintained through a sequence counter.
#[derive(Default)]
struct OrderedNames {
    by_seq: BTreeMap<u64, Name>,
    seq_of: HashMap<Name, u64>,
    next_seq: u64,
}

impl OrderedNames {
    fn push_back(&mut self, name: &Name) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(old) = self.seq_of.insert(name.clone(), seq) {
            self.by_seq.remove(&old);
        }
        self.by_seq.insert(seq, name.clone());
    }

    fn remove(&mut self, name: &Name) {
        if let Some(seq) = self.seq_of.remove(name) {
            self.by_seq.remove(&seq);
        }
    }

    fn pop_front(&mut self) -> Option<Name> {
        let (&seq, _) = self.by_seq.iter().next()?;
        let name = self.by_seq.remove(&seq)?;
        self.seq_of.remove(&name);
        Some(name)
    }

    fn len(&self) -> usize {
        self.by_seq.len()
    }

    fn evict_to(&mut self, limit: usize) -> Vec<Name> {
        let mut victims = Vec::new();
        while self.len() > limit {
            match self.pop_front() {
                Some(name) => victims.push(name),
                None => break,
            }
        }
        victims
    }
}

/// Evicts the least recently used entry; lookups and refreshes renew.
pub struct LruPolicy {
    names: OrderedNames,
    limit: usize,
}

impl LruPolicy {
    pub const NAME: &'static str = "lru";

    pub fn new(limit: usize) -> Self {
        Self {
            names: OrderedNames::default(),
            limit,
        }
    }
}

impl Policy for LruPolicy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn limit(&self) -> usize {
        self.limit
    }

    fn set_limit(&mut self, limit: usize) -> Vec<Name> {
        self.limit = limit;
        self.names.evict_to(limit)
    }

    fn after_insert(&mut self, name: &Name) -> Vec<Name> {
        self.names.push_back(name);
        self.names.evict_to(self.limit)
    }

    fn after_refresh(&mut self, name: &Name) {
        self.names.push_back(name);
    }

    fn before_erase(&mut self, name: &Name) {
        self.names.remove(name);
    }

    fn before_use(&mut self, name: &Name) {
        self.names.push_back(name);
    }
}

/// Evicts in arrival order; lookups do not renew.
pub struct FifoPolicy {
    names: OrderedNames,
    limit: usize,
}

impl FifoPolicy {
    pub const NAME: &'static str = "fifo";

    pub fn new(limit: usize) -> Self {
        Self {
            names: OrderedNames::default(),
            limit,
        }
    }
}

impl Policy for FifoPolicy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn limit(&self) -> usize {
        self.limit
    }

    fn set_limit(&mut self, limit: usize) -> Vec<Name> {
        self.limit = limit;
        self.names.evict_to(limit)
    }

    fn after_insert(&mut self, name: &Name) -> Vec<Name> {
        self.names.push_back(name);
        self.names.evict_to(self.limit)
    }

    fn after_refresh(&mut self, _name: &Name) {}

    fn before_erase(&mut self, name: &Name) {
        self.names.remove(name);
    }

    fn before_use(&mut self, _name: &Name) {}
}

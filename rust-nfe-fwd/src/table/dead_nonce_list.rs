//! Dead Nonce List.
//!
//! Remembers name+nonce pairs of recently satisfied or expired Interests so
//! that a late duplicate arriving after its PIT entry is gone is still caught
//! as a loop. Entries are stored as 64-bit hashes in arrival order and aged
//! out by lifetime, with a hard capacity bound as a safety valve.

use crate::clock::Timestamp;
use log::warn;
use rust_nfe_common::Name;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// How long a dead nonce stays on the list.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(6);

const CAPACITY: usize = 1 << 16;

pub struct DeadNonceList {
    queue: VecDeque<(Timestamp, u64)>,
    index: HashMap<u64, u32>,
    lifetime: Duration,
}

impl DeadNonceList {
    pub fn new() -> Self {
        Self::with_lifetime(DEFAULT_LIFETIME)
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            index: HashMap::new(),
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Records a dead name+nonce pair.
    pub fn add(&mut self, name: &Name, nonce: u32, now: Timestamp) {
        self.expire(now);
        if self.queue.len() >= CAPACITY {
            warn!("dead nonce list at capacity, dropping oldest entry");
            self.pop_front();
        }
        let key = hash_of(name, nonce);
        self.queue.push_back((now + self.lifetime, key));
        *self.index.entry(key).or_insert(0) += 1;
    }

    /// Whether this name+nonce pair died recently.
    pub fn has(&self, name: &Name, nonce: u32) -> bool {
        self.index.contains_key(&hash_of(name, nonce))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn expire(&mut self, now: Timestamp) {
        while let Some(&(expiry, _)) = self.queue.front() {
            if expiry > now {
                break;
            }
            self.pop_front();
        }
    }

    fn pop_front(&mut self) {
        if let Some((_, key)) = self.queue.pop_front() {
            if let Some(count) = self.index.get_mut(&key) {
                *count -= 1;
                if *count == 0 {
                    self.index.remove(&key);
                }
            }
        }
    }
}

impl Default for DeadNonceList {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_of(name: &Name, nonce: u32) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    nonce.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn name(uri: &str) -> Name {
        Name::from_str(uri).unwrap()
    }

    #[test]
    fn remembers_within_lifetime() {
        let mut dnl = DeadNonceList::new();
        let now = Timestamp::ZERO;
        dnl.add(&name("/a"), 7, now);
        assert!(dnl.has(&name("/a"), 7));
        assert!(!dnl.has(&name("/a"), 8));
        assert!(!dnl.has(&name("/b"), 7));
    }

    #[test]
    fn forgets_after_lifetime() {
        let mut dnl = DeadNonceList::with_lifetime(Duration::from_secs(1));
        let now = Timestamp::ZERO;
        dnl.add(&name("/a"), 7, now);

        let later = now + Duration::from_secs(2);
        dnl.add(&name("/b"), 1, later);
        assert!(!dnl.has(&name("/a"), 7));
        assert_eq!(dnl.len(), 1);
    }

    #[test]
    fn duplicate_pairs_refcount() {
        let mut dnl = DeadNonceList::with_lifetime(Duration::from_secs(4));
        let t0 = Timestamp::ZERO;
        let t1 = t0 + Duration::from_secs(3);
        dnl.add(&name("/a"), 7, t0);
        dnl.add(&name("/a"), 7, t1);

        // first copy ages out, the pair is still dead via the second
        dnl.add(&name("/x"), 1, t0 + Duration::from_secs(5));
        assert!(dnl.has(&name("/a"), 7));
    }
}

//! Pending Interest Table.
//!
//! Entries are identified by a stable [`PitToken`] so that timers and
//! strategies can refer to an entry without holding a borrow; a token whose
//! entry has been erased simply stops resolving. Entries are keyed by the
//! Interest name plus the two matching flags, and each entry is attached to
//! its name tree node for prefix-walk Data matching.

use crate::clock::Timestamp;
use crate::scheduler::TimerHandle;
use crate::table::name_tree::{NameTree, NodeId};
use rust_nfe_common::{FaceId, Interest, Name, NackReason};
use std::any::Any;
use std::collections::HashMap;
use std::time::Duration;

/// Stable handle to a PIT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitToken(u64);

impl PitToken {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

/// A downstream that asked for this Interest.
#[derive(Debug, Clone)]
pub struct InRecord {
    pub face: FaceId,
    pub last_nonce: u32,
    pub expiry: Timestamp,
    /// The last Interest received from this downstream.
    pub interest: Interest,
}

/// An upstream this Interest was forwarded to.
#[derive(Debug, Clone)]
pub struct OutRecord {
    pub face: FaceId,
    pub last_nonce: u32,
    pub expiry: Timestamp,
    /// Set when the upstream answered with a Nack instead of Data.
    pub incoming_nack: Option<NackReason>,
}

/// One pending Interest and its in/out records.
pub struct Entry {
    node: NodeId,
    interest: Interest,
    in_records: Vec<InRecord>,
    out_records: Vec<OutRecord>,
    is_satisfied: bool,
    /// FreshnessPeriod of the Data that satisfied this entry, for the
    /// dead nonce list insertion decision.
    pub(crate) data_freshness_period: Option<Duration>,
    pub(crate) expiry_timer: Option<TimerHandle>,
    strategy_info: Option<Box<dyn Any>>,
}

impl Entry {
    pub fn name(&self) -> &Name {
        &self.interest.name
    }

    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn in_records(&self) -> &[InRecord] {
        &self.in_records
    }

    pub fn out_records(&self) -> &[OutRecord] {
        &self.out_records
    }

    pub fn is_satisfied(&self) -> bool {
        self.is_satisfied
    }

    pub fn mark_satisfied(&mut self) {
        self.is_satisfied = true;
    }

    pub fn get_in_record(&self, face: FaceId) -> Option<&InRecord> {
        self.in_records.iter().find(|r| r.face == face)
    }

    pub fn get_out_record(&self, face: FaceId) -> Option<&OutRecord> {
        self.out_records.iter().find(|r| r.face == face)
    }

    pub fn get_out_record_mut(&mut self, face: FaceId) -> Option<&mut OutRecord> {
        self.out_records.iter_mut().find(|r| r.face == face)
    }

    /// Inserts or refreshes the in-record for `face`.
    pub fn insert_in_record(&mut self, face: FaceId, interest: &Interest, now: Timestamp) {
        let expiry = now + interest.lifetime;
        match self.in_records.iter_mut().find(|r| r.face == face) {
            Some(record) => {
                record.last_nonce = interest.nonce;
                record.expiry = expiry;
                record.interest = interest.clone();
            }
            None => self.in_records.push(InRecord {
                face,
                last_nonce: interest.nonce,
                expiry,
                interest: interest.clone(),
            }),
        }
    }

    /// Inserts or refreshes the out-record for `face`; an incoming Nack mark
    /// is cleared on refresh.
    pub fn insert_out_record(
        &mut self,
        face: FaceId,
        nonce: u32,
        lifetime: Duration,
        now: Timestamp,
    ) {
        let expiry = now + lifetime;
        match self.out_records.iter_mut().find(|r| r.face == face) {
            Some(record) => {
                record.last_nonce = nonce;
                record.expiry = expiry;
                record.incoming_nack = None;
            }
            None => self.out_records.push(OutRecord {
                face,
                last_nonce: nonce,
                expiry,
                incoming_nack: None,
            }),
        }
    }

    pub fn delete_in_record(&mut self, face: FaceId) {
        self.in_records.retain(|r| r.face != face);
    }

    pub fn delete_out_record(&mut self, face: FaceId) {
        self.out_records.retain(|r| r.face != face);
    }

    pub fn clear_in_records(&mut self) {
        self.in_records.clear();
    }

    pub fn has_in_records(&self) -> bool {
        !self.in_records.is_empty()
    }

    pub fn has_unexpired_out_records(&self, now: Timestamp) -> bool {
        self.out_records.iter().any(|r| r.expiry > now)
    }

    /// The latest in-record expiry, used to arm the entry timer.
    pub fn last_in_record_expiry(&self) -> Timestamp {
        self.in_records
            .iter()
            .map(|r| r.expiry)
            .max()
            .unwrap_or(Timestamp::ZERO)
    }

    pub fn strategy_info<T: Any>(&self) -> Option<&T> {
        self.strategy_info.as_ref()?.downcast_ref()
    }

    pub fn strategy_info_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.strategy_info.as_mut()?.downcast_mut()
    }

    pub fn set_strategy_info<T: Any>(&mut self, info: T) {
        self.strategy_info = Some(Box::new(info));
    }

    pub fn strategy_info_or_default<T: Any + Default>(&mut self) -> &mut T {
        let fresh = !matches!(&self.strategy_info, Some(b) if b.is::<T>());
        if fresh {
            self.strategy_info = Some(Box::<T>::default());
        }
        match self.strategy_info.as_mut().and_then(|b| b.downcast_mut()) {
            Some(info) => info,
            None => unreachable!(),
        }
    }
}

#[derive(PartialEq, Eq, Hash, Clone)]
struct Key {
    name: Name,
    can_be_prefix: bool,
    must_be_fresh: bool,
}

impl Key {
    fn of(interest: &Interest) -> Self {
        Self {
            name: interest.name.clone(),
            can_be_prefix: interest.can_be_prefix,
            must_be_fresh: interest.must_be_fresh,
        }
    }
}

#[derive(Default)]
pub struct Pit {
    entries: HashMap<PitToken, Entry>,
    by_key: HashMap<Key, PitToken>,
    next_token: u64,
}

impl Pit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds or creates the entry for `interest`; returns its token and
    /// whether the entry was newly created.
    pub fn insert(&mut self, tree: &mut NameTree, interest: &Interest) -> (PitToken, bool) {
        let key = Key::of(interest);
        if let Some(&token) = self.by_key.get(&key) {
            return (token, false);
        }
        let token = PitToken(self.next_token);
        self.next_token += 1;
        let node = tree.lookup(&interest.name);
        tree.node_mut(node).pit_tokens.push(token);
        self.entries.insert(
            token,
            Entry {
                node,
                interest: interest.clone(),
                in_records: Vec::new(),
                out_records: Vec::new(),
                is_satisfied: false,
                data_freshness_period: None,
                expiry_timer: None,
                strategy_info: None,
            },
        );
        self.by_key.insert(key, token);
        (token, true)
    }

    pub fn find(&self, interest: &Interest) -> Option<PitToken> {
        self.by_key.get(&Key::of(interest)).copied()
    }

    pub fn get(&self, token: PitToken) -> Option<&Entry> {
        self.entries.get(&token)
    }

    pub fn get_mut(&mut self, token: PitToken) -> Option<&mut Entry> {
        self.entries.get_mut(&token)
    }

    /// Erases the entry and detaches it from its name tree node. The caller
    /// is responsible for cancelling its timers.
    pub fn remove(&mut self, tree: &mut NameTree, token: PitToken) -> Option<Entry> {
        let entry = self.entries.remove(&token)?;
        self.by_key.remove(&Key::of(&entry.interest));
        tree.node_mut(entry.node).pit_tokens.retain(|&t| t != token);
        tree.cleanup(entry.node);
        Some(entry)
    }

    /// All entries that `data` satisfies: every entry on a prefix of the Data
    /// name whose matching flags admit it.
    pub fn find_all_data_matches(
        &self,
        tree: &NameTree,
        data: &rust_nfe_common::Data,
    ) -> Vec<PitToken> {
        let mut out = Vec::new();
        for node in tree.prefixes_of(&data.name) {
            for &token in &tree.node(node).pit_tokens {
                let entry = match self.entries.get(&token) {
                    Some(entry) => entry,
                    None => continue,
                };
                let interest = &entry.interest;
                if !interest.can_be_prefix && interest.name.len() != data.name.len() {
                    continue;
                }
                if interest.must_be_fresh && data.freshness_period == Duration::ZERO {
                    continue;
                }
                out.push(token);
            }
        }
        out
    }

    /// Drops all records pointing at a face that went away.
    pub fn remove_face_records(&mut self, face: FaceId) {
        for entry in self.entries.values_mut() {
            entry.delete_in_record(face);
            entry.delete_out_record(face);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_nfe_common::Data;
    use std::str::FromStr;

    fn name(uri: &str) -> Name {
        Name::from_str(uri).unwrap()
    }

    fn interest(uri: &str, nonce: u32) -> Interest {
        Interest::new(name(uri), nonce)
    }

    #[test]
    fn insert_dedups_on_name_and_flags() {
        let mut tree = NameTree::new();
        let mut pit = Pit::new();
        let (a, new_a) = pit.insert(&mut tree, &interest("/a", 1));
        let (b, new_b) = pit.insert(&mut tree, &interest("/a", 2));
        let (c, new_c) = pit.insert(&mut tree, &interest("/a", 3).with_can_be_prefix(true));
        assert!(new_a);
        assert!(!new_b);
        assert!(new_c);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn records_refresh_in_place() {
        let mut tree = NameTree::new();
        let mut pit = Pit::new();
        let (token, _) = pit.insert(&mut tree, &interest("/a", 1));
        let entry = pit.get_mut(token).unwrap();
        let face = FaceId(300);
        entry.insert_in_record(face, &interest("/a", 1), Timestamp::ZERO);
        entry.insert_in_record(face, &interest("/a", 9), Timestamp::from_nanos(5));
        assert_eq!(entry.in_records().len(), 1);
        assert_eq!(entry.get_in_record(face).unwrap().last_nonce, 9);

        entry.insert_out_record(face, 9, Duration::from_secs(4), Timestamp::ZERO);
        entry.get_out_record_mut(face).unwrap().incoming_nack = Some(NackReason::Congestion);
        entry.insert_out_record(face, 10, Duration::from_secs(4), Timestamp::ZERO);
        assert_eq!(entry.out_records().len(), 1);
        assert!(entry.get_out_record(face).unwrap().incoming_nack.is_none());
    }

    #[test]
    fn data_match_respects_flags() {
        let mut tree = NameTree::new();
        let mut pit = Pit::new();
        let (exact, _) = pit.insert(&mut tree, &interest("/a/b", 1));
        let (prefix, _) = pit.insert(&mut tree, &interest("/a", 2).with_can_be_prefix(true));
        let (short, _) = pit.insert(&mut tree, &interest("/a", 3));
        let (fresh, _) = pit.insert(&mut tree, &interest("/a/b", 4).with_must_be_fresh(true));

        let data = Data::new(name("/a/b"), vec![0u8]);
        let matches = pit.find_all_data_matches(&tree, &data);
        assert!(matches.contains(&exact));
        assert!(matches.contains(&prefix));
        assert!(!matches.contains(&short));
        assert!(!matches.contains(&fresh));

        let fresh_data =
            Data::new(name("/a/b"), vec![0u8]).with_freshness_period(Duration::from_secs(1));
        assert!(pit
            .find_all_data_matches(&tree, &fresh_data)
            .contains(&fresh));
    }

    #[test]
    fn remove_detaches_from_tree() {
        let mut tree = NameTree::new();
        let mut pit = Pit::new();
        let (token, _) = pit.insert(&mut tree, &interest("/a/b", 1));
        assert!(tree.find_exact(&name("/a/b")).is_some());
        pit.remove(&mut tree, token);
        assert!(pit.is_empty());
        assert!(tree.find_exact(&name("/a/b")).is_none());
    }

    #[test]
    fn strategy_info_slot() {
        let mut tree = NameTree::new();
        let mut pit = Pit::new();
        let (token, _) = pit.insert(&mut tree, &interest("/a", 1));
        let entry = pit.get_mut(token).unwrap();
        assert!(entry.strategy_info::<u32>().is_none());
        *entry.strategy_info_or_default::<u32>() = 7;
        assert_eq!(entry.strategy_info::<u32>(), Some(&7));
    }
}

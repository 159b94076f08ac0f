//! Content Store.
//!
//! Packets are kept in a `BTreeMap` in canonical name order, so every name
//! under a prefix forms a contiguous run and prefix lookups are a bounded
//! range scan. Eviction order lives in the pluggable
//! [`Policy`](crate::table::cs_policy::Policy).

use crate::clock::Timestamp;
use crate::table::cs_policy::Policy;
use log::{debug, trace};
use rust_nfe_common::{CacheHint, Data, Interest, Name};
use std::collections::BTreeMap;

/// Predicate consulted before admitting a Data packet.
pub type AdmissionPredicate = Box<dyn Fn(&Data) -> bool>;

struct CsEntry {
    data: Data,
    is_unsolicited: bool,
    fresh_until: Timestamp,
}

pub struct Cs {
    entries: BTreeMap<Name, CsEntry>,
    policy: Box<dyn Policy>,
    should_admit: bool,
    should_serve: bool,
    admission: Option<AdmissionPredicate>,
}

impl Cs {
    pub fn new(policy: Box<dyn Policy>) -> Self {
        Self {
            entries: BTreeMap::new(),
            policy,
            should_admit: true,
            should_serve: true,
            admission: None,
        }
    }

    /// Admits `data`, refreshing in place when an entry with the same name
    /// already exists.
    pub fn insert(&mut self, data: Data, is_unsolicited: bool, now: Timestamp) {
        if !self.should_admit || self.policy.limit() == 0 {
            return;
        }
        if data.cache_hint == CacheHint::NoCache {
            trace!("cs reject no-cache data={}", data.name);
            return;
        }
        if let Some(admission) = &self.admission {
            if !admission(&data) {
                trace!("cs reject by admission predicate data={}", data.name);
                return;
            }
        }

        let fresh_until = now + data.freshness_period;
        let name = data.name.clone();
        match self.entries.get_mut(&name) {
            Some(entry) => {
                entry.is_unsolicited = entry.is_unsolicited && is_unsolicited;
                entry.fresh_until = fresh_until;
                entry.data = data;
                self.policy.after_refresh(&name);
            }
            None => {
                self.entries.insert(
                    name.clone(),
                    CsEntry {
                        data,
                        is_unsolicited,
                        fresh_until,
                    },
                );
                for victim in self.policy.after_insert(&name) {
                    debug!("cs evict data={}", victim);
                    self.entries.remove(&victim);
                }
            }
        }
    }

    /// Finds the leftmost entry satisfying `interest`, or None.
    pub fn find(&mut self, interest: &Interest, now: Timestamp) -> Option<&Data> {
        if !self.should_serve {
            return None;
        }
        let hit = self
            .entries
            .range(interest.name.clone()..)
            .take_while(|(name, _)| interest.name.is_prefix_of(name))
            .find(|(name, entry)| {
                if !interest.can_be_prefix && name.len() != interest.name.len() {
                    return false;
                }
                !interest.must_be_fresh || entry.fresh_until > now
            })
            .map(|(name, _)| name.clone())?;

        self.policy.before_use(&hit);
        self.entries.get(&hit).map(|entry| &entry.data)
    }

    /// Erases up to `limit` entries under `prefix`; returns how many went.
    pub fn erase(&mut self, prefix: &Name, limit: usize) -> usize {
        let victims: Vec<Name> = self
            .entries
            .range(prefix.clone()..)
            .take_while(|(name, _)| prefix.is_prefix_of(name))
            .take(limit)
            .map(|(name, _)| name.clone())
            .collect();
        for victim in &victims {
            self.policy.before_erase(victim);
            self.entries.remove(victim);
        }
        victims.len()
    }

    /// Replaces the eviction policy. Only allowed while the store is empty.
    pub fn set_policy(&mut self, policy: Box<dyn Policy>) -> bool {
        if !self.entries.is_empty() {
            return false;
        }
        self.policy = policy;
        true
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn limit(&self) -> usize {
        self.policy.limit()
    }

    pub fn set_limit(&mut self, limit: usize) {
        for victim in self.policy.set_limit(limit) {
            self.entries.remove(&victim);
        }
    }

    pub fn enable_admit(&mut self, on: bool) {
        self.should_admit = on;
    }

    pub fn enable_serve(&mut self, on: bool) {
        self.should_serve = on;
    }

    pub fn set_admission_predicate(&mut self, predicate: Option<AdmissionPredicate>) {
        self.admission = predicate;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

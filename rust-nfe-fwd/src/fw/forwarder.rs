//! The forwarder: packet pipelines over the tables.
//!
//! [`Forwarder`] owns every table and drives the Interest, Data and Nack
//! pipelines. Strategies never see the forwarder itself, only the
//! [`ForwardingContext`] of actions and table views it hands them; this split
//! is what lets a strategy mutate the tables while the strategy choice table
//! that owns it stays untouched.

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::face::{FaceTable, LinkSender};
use crate::fw::algorithm;
use crate::fw::strategy::{Strategy, StrategyRegistry, StrategyTimer};
use crate::fw::unsolicited::{UnsolicitedDataDecision, UnsolicitedDataPolicy};
use crate::scheduler::{Scheduler, TimerEvent, TimerHandle};
use crate::table::cs::Cs;
use crate::table::cs_policy;
use crate::table::dead_nonce_list::DeadNonceList;
use crate::table::fib::{self, NextHop};
use crate::table::measurements;
use crate::table::name_tree::NameTree;
use crate::table::pit::{Entry as PitEntry, Pit, PitToken};
use crate::table::strategy_choice::StrategyChoice;
use log::{debug, trace, warn};
use rust_nfe_common::metrics::Counter;
use rust_nfe_common::types::FACEID_CONTENT_STORE;
use rust_nfe_common::{Data, FaceId, FaceScope, Interest, LinkType, Nack, NackReason, Name};
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

/// Default Content Store capacity in packets.
pub const DEFAULT_CS_CAPACITY: usize = 65536;

/// Packet and pipeline counters.
#[derive(Debug, Default, Clone)]
pub struct ForwarderCounters {
    pub in_interests: Counter,
    pub out_interests: Counter,
    pub in_data: Counter,
    pub out_data: Counter,
    pub in_nacks: Counter,
    pub out_nacks: Counter,
    pub satisfied_interests: Counter,
    pub unsatisfied_interests: Counter,
    pub cs_hits: Counter,
    pub cs_misses: Counter,
}

/// Hooks into pipeline milestones, for management and tests.
pub trait ForwarderObserver {
    fn after_receive_interest(&mut self, _in_face: FaceId, _interest: &Interest) {}
    fn after_receive_data(&mut self, _in_face: FaceId, _data: &Data) {}
    fn after_cs_hit(&mut self, _interest: &Interest, _data: &Data) {}
    fn after_cs_miss(&mut self, _interest: &Interest) {}
    fn before_satisfy_interest(&mut self, _name: &Name, _data: &Data) {}
    fn before_expire_interest(&mut self, _name: &Name) {}
}

/// Tables and actions exposed to strategies.
pub struct ForwardingContext {
    pub(crate) faces: FaceTable,
    pub(crate) name_tree: NameTree,
    pub(crate) pit: Pit,
    pub(crate) cs: Cs,
    pub(crate) dnl: DeadNonceList,
    pub(crate) scheduler: Scheduler,
    clock: Box<dyn Clock>,
    counters: ForwarderCounters,
    observers: Vec<Box<dyn ForwarderObserver>>,
    unsolicited_policy: UnsolicitedDataPolicy,
    network_regions: BTreeSet<Name>,
}

impl ForwardingContext {
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn pit_entry(&self, token: PitToken) -> Option<&PitEntry> {
        self.pit.get(token)
    }

    pub fn pit_entry_mut(&mut self, token: PitToken) -> Option<&mut PitEntry> {
        self.pit.get_mut(token)
    }

    pub fn has_face(&self, face: FaceId) -> bool {
        self.faces.contains(face)
    }

    pub fn face_scope(&self, face: FaceId) -> Option<FaceScope> {
        self.faces.get(face).map(|f| f.scope())
    }

    pub fn face_link_type(&self, face: FaceId) -> Option<LinkType> {
        self.faces.get(face).map(|f| f.link_type())
    }

    /// Next hops for the entry's Interest, honoring its forwarding hint.
    pub fn fib_next_hops(&self, token: PitToken) -> Vec<NextHop> {
        match self.pit.get(token) {
            Some(entry) => self.fib_next_hops_for(entry.interest()),
            None => Vec::new(),
        }
    }

    fn fib_next_hops_for(&self, interest: &Interest) -> Vec<NextHop> {
        if !interest.forwarding_hint.is_empty() {
            for delegation in &interest.forwarding_hint {
                if let Some(node) = fib::longest_prefix_match(&self.name_tree, delegation) {
                    if let Some(entry) = &self.name_tree.node(node).fib {
                        return entry.next_hops().to_vec();
                    }
                }
            }
            return Vec::new();
        }
        match fib::longest_prefix_match(&self.name_tree, &interest.name) {
            Some(node) => match &self.name_tree.node(node).fib {
                Some(entry) => entry.next_hops().to_vec(),
                None => Vec::new(),
            },
            None => Vec::new(),
        }
    }

    pub fn can_forward_to(&self, token: PitToken, face: FaceId) -> bool {
        match self.pit.get(token) {
            Some(entry) => algorithm::can_forward_to(entry, face, self.now()),
            None => false,
        }
    }

    /// Scope check between two faces; unknown faces always violate.
    pub fn would_violate_scope(
        &self,
        in_face: FaceId,
        interest: &Interest,
        out_face: FaceId,
    ) -> bool {
        match (self.face_scope(in_face), self.face_scope(out_face)) {
            (Some(in_scope), Some(out_scope)) => {
                algorithm::would_violate_scope(in_scope, interest, out_scope)
            }
            _ => true,
        }
    }

    /// Outgoing Interest pipeline: records the upstream and emits.
    pub fn send_interest(&mut self, token: PitToken, out_face: FaceId, interest: &Interest) {
        let now = self.now();
        let entry = match self.pit.get_mut(token) {
            Some(entry) => entry,
            None => return,
        };
        entry.insert_out_record(out_face, interest.nonce, interest.lifetime, now);
        let mut outgoing = interest.clone();
        outgoing.next_hop_face = None;
        if let Some(face) = self.faces.get_mut(out_face) {
            face.send_interest(&outgoing);
            self.counters.out_interests.increment();
        }
    }

    /// Outgoing Data pipeline towards one downstream.
    pub fn send_data(&mut self, token: PitToken, data: &Data, out_face: FaceId) {
        if let Some(entry) = self.pit.get_mut(token) {
            entry.delete_in_record(out_face);
        }
        self.put_data(out_face, data);
    }

    /// Sends Data to every pending downstream except the one it came from,
    /// unless that ingress is an ad hoc link.
    pub fn send_data_to_all(&mut self, token: PitToken, data: &Data, in_face: FaceId) {
        let now = self.now();
        let in_link = self.face_link_type(in_face);
        let downstreams: Vec<FaceId> = match self.pit.get(token) {
            Some(entry) => entry
                .in_records()
                .iter()
                .filter(|r| r.expiry > now)
                .filter(|r| r.face != in_face || in_link == Some(LinkType::AdHoc))
                .map(|r| r.face)
                .collect(),
            None => return,
        };
        for downstream in downstreams {
            self.send_data(token, data, downstream);
        }
    }

    /// Outgoing Nack pipeline: only to a point-to-point downstream that has
    /// an in-record, which the Nack consumes.
    pub fn send_nack(&mut self, token: PitToken, out_face: FaceId, reason: NackReason) {
        if self.face_link_type(out_face) != Some(LinkType::PointToPoint) {
            debug!("drop nack {} not point-to-point", out_face);
            return;
        }
        let interest = match self.pit.get(token).and_then(|e| e.get_in_record(out_face)) {
            Some(record) => record.interest.clone(),
            None => {
                debug!("drop nack {} no in-record", out_face);
                return;
            }
        };
        if let Some(entry) = self.pit.get_mut(token) {
            entry.delete_in_record(out_face);
        }
        let nack = Nack::new(interest, reason);
        if let Some(face) = self.faces.get_mut(out_face) {
            face.send_nack(&nack);
            self.counters.out_nacks.increment();
        }
    }

    /// Gives up on the entry: it expires immediately.
    pub fn reject(&mut self, token: PitToken) {
        trace!("reject pit entry");
        self.set_expiry_timer(token, Duration::ZERO);
    }

    /// Re-arms the entry's expiry timer to fire `after` from now.
    pub fn set_expiry_timer(&mut self, token: PitToken, after: Duration) {
        let now = self.now();
        let handle = self
            .scheduler
            .schedule(now, after, TimerEvent::PitExpiry(token));
        if let Some(entry) = self.pit.get_mut(token) {
            if let Some(old) = entry.expiry_timer.replace(handle) {
                self.scheduler.cancel(old);
            }
        } else {
            self.scheduler.cancel(handle);
        }
    }

    /// Arms a strategy timer tied to the entry; stale timers never fire.
    pub fn schedule_strategy_timer(
        &mut self,
        token: PitToken,
        after: Duration,
        timer: StrategyTimer,
    ) -> TimerHandle {
        let now = self.now();
        self.scheduler
            .schedule(now, after, TimerEvent::Strategy { token, timer })
    }

    pub fn cancel_timer(&mut self, handle: TimerHandle) {
        self.scheduler.cancel(handle);
    }

    fn is_in_producer_region(&self, hint: &[Name]) -> bool {
        self.network_regions.iter().any(|region| {
            hint.iter()
                .any(|delegation| delegation.is_prefix_of(region))
        })
    }

    /// Records dead nonces for the entry's out-records, all of them or just
    /// the one towards `upstream`.
    ///
    /// A satisfied entry only needs this when its Data may fall out of caches
    /// before the nonce would have aged out on its own.
    fn insert_dead_nonce_list(&mut self, token: PitToken, upstream: Option<FaceId>) {
        let now = self.now();
        let lifetime = self.dnl.lifetime();
        let entry = match self.pit.get(token) {
            Some(entry) => entry,
            None => return,
        };
        let needed = if entry.is_satisfied() {
            entry.interest().must_be_fresh
                && entry.data_freshness_period.unwrap_or(Duration::ZERO) < lifetime
        } else {
            true
        };
        if !needed {
            return;
        }
        let name = entry.name().clone();
        let nonces: Vec<u32> = entry
            .out_records()
            .iter()
            .filter(|r| upstream.is_none() || upstream == Some(r.face))
            .map(|r| r.last_nonce)
            .collect();
        for nonce in nonces {
            self.dnl.add(&name, nonce, now);
        }
    }

    /// Emits Data on a face, subject to `/localhost` scope control.
    fn put_data(&mut self, out_face: FaceId, data: &Data) {
        if self.face_scope(out_face) == Some(FaceScope::NonLocal)
            && algorithm::is_localhost_name(&data.name)
        {
            debug!("drop data={} scope violation on {}", data.name, out_face);
            return;
        }
        if let Some(face) = self.faces.get_mut(out_face) {
            face.send_data(data);
            self.counters.out_data.increment();
        }
    }

    fn remove_pit_entry(&mut self, token: PitToken) {
        if let Some(entry) = self.pit.remove(&mut self.name_tree, token) {
            if let Some(handle) = entry.expiry_timer {
                self.scheduler.cancel(handle);
            }
        }
    }
}

/// The forwarding engine.
pub struct Forwarder {
    ctx: ForwardingContext,
    strategy_choice: StrategyChoice,
    registry: StrategyRegistry,
}

impl Forwarder {
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        let registry = StrategyRegistry::new();
        let default = match registry.create("multicast") {
            Some(strategy) => strategy,
            // multicast is registered unconditionally
            None => unreachable!(),
        };
        Self {
            ctx: ForwardingContext {
                faces: FaceTable::new(),
                name_tree: NameTree::new(),
                pit: Pit::new(),
                cs: Cs::new(Box::new(cs_policy::LruPolicy::new(DEFAULT_CS_CAPACITY))),
                dnl: DeadNonceList::new(),
                scheduler: Scheduler::new(),
                clock,
                counters: ForwarderCounters::default(),
                observers: Vec::new(),
                unsolicited_policy: UnsolicitedDataPolicy::default(),
                network_regions: BTreeSet::new(),
            },
            strategy_choice: StrategyChoice::new(default),
            registry,
        }
    }

    /* ---------------------------------------------------------------- *
     * Faces and tables
     * ---------------------------------------------------------------- */

    pub fn add_face(
        &mut self,
        scope: FaceScope,
        link_type: LinkType,
        sender: Box<dyn LinkSender>,
    ) -> FaceId {
        let id = self.ctx.faces.add(scope, link_type, sender);
        debug!("created {} scope={:?} link={:?}", id, scope, link_type);
        id
    }

    /// Destroys a face and sweeps its table state.
    pub fn remove_face(&mut self, face: FaceId) {
        self.ctx.faces.remove(face);
        fib::remove_face(&mut self.ctx.name_tree, face);
        self.ctx.pit.remove_face_records(face);
        debug!("destroyed {}", face);
    }

    /// Registers a route; a genuinely new hop triggers the new-next-hop
    /// notification for strategies that opted in.
    pub fn add_next_hop(&mut self, prefix: &Name, face: FaceId, cost: u64) {
        let is_new = fib::add_next_hop(&mut self.ctx.name_tree, prefix, face, cost);
        if is_new {
            self.on_new_next_hop(prefix);
        }
    }

    pub fn remove_next_hop(&mut self, prefix: &Name, face: FaceId) {
        fib::remove_next_hop(&mut self.ctx.name_tree, prefix, face);
    }

    /// Binds a strategy to a prefix; false when the name is unknown.
    pub fn set_strategy(&mut self, prefix: Name, strategy_name: &str) -> bool {
        match self.registry.create(strategy_name) {
            Some(strategy) => {
                debug!("strategy-choice set prefix={} strategy={}", prefix, strategy_name);
                self.strategy_choice.set(prefix, strategy);
                true
            }
            None => false,
        }
    }

    pub fn unset_strategy(&mut self, prefix: &Name) {
        self.strategy_choice.unset(prefix);
    }

    pub fn strategy_name(&self, prefix: &Name) -> Option<&'static str> {
        self.strategy_choice.get_name(prefix)
    }

    pub fn effective_strategy_name(&self, name: &Name) -> &'static str {
        self.strategy_choice.find_effective_name(name)
    }

    pub fn strategy_registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn strategy_registry_mut(&mut self) -> &mut StrategyRegistry {
        &mut self.registry
    }

    pub fn cs(&self) -> &Cs {
        &self.ctx.cs
    }

    pub fn cs_mut(&mut self) -> &mut Cs {
        &mut self.ctx.cs
    }

    pub fn set_unsolicited_policy(&mut self, policy: UnsolicitedDataPolicy) {
        self.ctx.unsolicited_policy = policy;
    }

    pub fn unsolicited_policy(&self) -> UnsolicitedDataPolicy {
        self.ctx.unsolicited_policy
    }

    /// Declares this node part of a producer region named by `region`.
    pub fn add_network_region(&mut self, region: Name) {
        self.ctx.network_regions.insert(region);
    }

    pub fn counters(&self) -> &ForwarderCounters {
        &self.ctx.counters
    }

    pub fn add_observer(&mut self, observer: Box<dyn ForwarderObserver>) {
        self.ctx.observers.push(observer);
    }

    /* ---------------------------------------------------------------- *
     * Timers
     * ---------------------------------------------------------------- */

    /// Runs every timer due by now. Call after advancing the clock or when
    /// `next_deadline` passes.
    pub fn process_timers(&mut self) {
        let now = self.ctx.now();
        while let Some(event) = self.ctx.scheduler.pop_due(now) {
            match event {
                TimerEvent::PitExpiry(token) => self.finalize_interest(token),
                TimerEvent::Strategy { token, timer } => {
                    let name = match self.ctx.pit.get(token) {
                        Some(entry) => entry.name().clone(),
                        None => continue,
                    };
                    let strategy = self.strategy_choice.find_effective_mut(&name);
                    strategy.on_timer(&mut self.ctx, token, timer);
                }
            }
        }
        measurements::cleanup_expired(&mut self.ctx.name_tree, now);
    }

    /// The next instant at which `process_timers` has work to do.
    pub fn next_deadline(&mut self) -> Option<Timestamp> {
        self.ctx.scheduler.next_deadline()
    }

    /* ---------------------------------------------------------------- *
     * Incoming Interest pipeline
     * ---------------------------------------------------------------- */

    pub fn on_interest(&mut self, in_face: FaceId, interest: &Interest) {
        self.ctx.counters.in_interests.increment();
        let (in_scope, in_link) = match self.ctx.faces.get(in_face) {
            Some(face) => (face.scope(), face.link_type()),
            None => {
                warn!("interest from unknown {}", in_face);
                return;
            }
        };
        trace!("{} recv interest={}", in_face, interest);
        for observer in &mut self.ctx.observers {
            observer.after_receive_interest(in_face, interest);
        }

        if in_scope == FaceScope::NonLocal && algorithm::is_localhost_name(&interest.name) {
            debug!("drop interest={} scope violation on {}", interest, in_face);
            return;
        }

        if self.ctx.dnl.has(&interest.name, interest.nonce) {
            self.on_interest_loop(in_face, in_link, interest);
            return;
        }

        // the hint is stripped before the entry is created, so everything
        // downstream (including strategy FIB lookups) sees the plain name
        let mut interest = interest.clone();
        if !interest.forwarding_hint.is_empty()
            && self.ctx.is_in_producer_region(&interest.forwarding_hint)
        {
            trace!("reached producer region, stripping hint from {}", interest);
            interest.forwarding_hint.clear();
        }

        let (token, _) = self.ctx.pit.insert(&mut self.ctx.name_tree, &interest);
        if let Some(entry) = self.ctx.pit.get(token) {
            let dnw = algorithm::find_duplicate_nonce(entry, interest.nonce, in_face);
            let mut has_duplicate = dnw != algorithm::DUPLICATE_NONCE_NONE;
            // a retransmission on a point-to-point link reuses its nonce
            if in_link == LinkType::PointToPoint
                && dnw & algorithm::DUPLICATE_NONCE_IN_SAME != 0
            {
                has_duplicate = false;
            }
            if has_duplicate {
                self.on_interest_loop(in_face, in_link, &interest);
                return;
            }
        }

        let now = self.ctx.now();
        let is_pending = self
            .ctx
            .pit
            .get(token)
            .is_some_and(|e| e.has_in_records());
        if !is_pending {
            if let Some(data) = self.ctx.cs.find(&interest, now).cloned() {
                self.ctx.counters.cs_hits.increment();
                for observer in &mut self.ctx.observers {
                    observer.after_cs_hit(&interest, &data);
                }
                self.on_content_store_hit(in_face, token, data);
                return;
            }
            self.ctx.counters.cs_misses.increment();
            for observer in &mut self.ctx.observers {
                observer.after_cs_miss(&interest);
            }
        }
        self.on_content_store_miss(in_face, token, &interest);
    }

    /// A looped Interest: Nack it back on point-to-point links, otherwise
    /// drop it silently.
    fn on_interest_loop(&mut self, in_face: FaceId, in_link: LinkType, interest: &Interest) {
        if in_link != LinkType::PointToPoint {
            debug!("drop looped interest={} on shared-medium {}", interest, in_face);
        } else {
            debug!("nack looped interest={} on {}", interest, in_face);
            let nack = Nack::new(interest.clone(), NackReason::Duplicate);
            if let Some(face) = self.ctx.faces.get_mut(in_face) {
                face.send_nack(&nack);
                self.ctx.counters.out_nacks.increment();
            }
        }
        let name = interest.name.clone();
        let interest = interest.clone();
        self.dispatch(&name, |strategy, ctx| {
            strategy.after_receive_looped_interest(ctx, in_face, &interest);
        });
    }

    fn on_content_store_hit(&mut self, in_face: FaceId, token: PitToken, data: Data) {
        trace!("cs hit data={}", data.name);
        let name = match self.ctx.pit.get(token) {
            Some(entry) => entry.name().clone(),
            None => return,
        };
        for observer in &mut self.ctx.observers {
            observer.before_satisfy_interest(&name, &data);
        }
        self.dispatch(&name, |strategy, ctx| {
            strategy.before_satisfy_interest(ctx, token, FACEID_CONTENT_STORE, &data);
        });
        if let Some(entry) = self.ctx.pit.get_mut(token) {
            entry.mark_satisfied();
            entry.data_freshness_period = Some(data.freshness_period);
        }
        self.ctx.insert_dead_nonce_list(token, None);
        self.ctx.set_expiry_timer(token, Duration::ZERO);
        self.dispatch(&name, |strategy, ctx| {
            strategy.after_content_store_hit(ctx, token, in_face, &data);
        });
    }

    fn on_content_store_miss(&mut self, in_face: FaceId, token: PitToken, interest: &Interest) {
        let now = self.ctx.now();
        let expiry = match self.ctx.pit.get_mut(token) {
            Some(entry) => {
                entry.insert_in_record(in_face, interest, now);
                entry.last_in_record_expiry()
            }
            None => return,
        };
        self.ctx
            .set_expiry_timer(token, expiry.saturating_duration_since(now));

        if let Some(next_hop) = interest.next_hop_face {
            if self.ctx.faces.contains(next_hop) {
                self.ctx.send_interest(token, next_hop, interest);
            } else {
                debug!("drop interest={} unknown next hop {}", interest, next_hop);
            }
            return;
        }

        let name = interest.name.clone();
        let interest = interest.clone();
        self.dispatch(&name, |strategy, ctx| {
            strategy.after_receive_interest(ctx, in_face, &interest, token);
        });
    }

    /* ---------------------------------------------------------------- *
     * Incoming Data pipeline
     * ---------------------------------------------------------------- */

    pub fn on_data(&mut self, in_face: FaceId, data: &Data) {
        self.ctx.counters.in_data.increment();
        let (in_scope, in_link) = match self.ctx.faces.get(in_face) {
            Some(face) => (face.scope(), face.link_type()),
            None => {
                warn!("data from unknown {}", in_face);
                return;
            }
        };
        trace!("{} recv data={}", in_face, data);
        for observer in &mut self.ctx.observers {
            observer.after_receive_data(in_face, data);
        }

        let now = self.ctx.now();
        let matches = self.ctx.pit.find_all_data_matches(&self.ctx.name_tree, data);
        if matches.is_empty() {
            match self.ctx.unsolicited_policy.decide(in_scope) {
                UnsolicitedDataDecision::Cache => {
                    debug!("cache unsolicited data={}", data.name);
                    self.ctx.cs.insert(data.clone(), true, now);
                }
                UnsolicitedDataDecision::Drop => {
                    debug!("drop unsolicited data={}", data.name);
                }
            }
            return;
        }

        self.ctx.cs.insert(data.clone(), false, now);

        if let [token] = matches[..] {
            let name = match self.ctx.pit.get(token) {
                Some(entry) => entry.name().clone(),
                None => return,
            };
            self.ctx.set_expiry_timer(token, Duration::ZERO);
            for observer in &mut self.ctx.observers {
                observer.before_satisfy_interest(&name, data);
            }
            self.dispatch(&name, |strategy, ctx| {
                strategy.before_satisfy_interest(ctx, token, in_face, data);
            });
            self.dispatch(&name, |strategy, ctx| {
                strategy.after_receive_data(ctx, token, in_face, data);
            });
            if let Some(entry) = self.ctx.pit.get_mut(token) {
                entry.mark_satisfied();
                entry.data_freshness_period = Some(data.freshness_period);
            }
            self.ctx.insert_dead_nonce_list(token, Some(in_face));
            if let Some(entry) = self.ctx.pit.get_mut(token) {
                entry.delete_out_record(in_face);
            }
            return;
        }

        // several entries match: satisfy them all, then fan the Data out to
        // the union of their downstreams
        let mut downstreams: BTreeSet<FaceId> = BTreeSet::new();
        for &token in &matches {
            let name = match self.ctx.pit.get(token) {
                Some(entry) => {
                    for record in entry.in_records() {
                        if record.expiry > now {
                            downstreams.insert(record.face);
                        }
                    }
                    entry.name().clone()
                }
                None => continue,
            };
            self.ctx.set_expiry_timer(token, Duration::ZERO);
            for observer in &mut self.ctx.observers {
                observer.before_satisfy_interest(&name, data);
            }
            self.dispatch(&name, |strategy, ctx| {
                strategy.before_satisfy_interest(ctx, token, in_face, data);
            });
            if let Some(entry) = self.ctx.pit.get_mut(token) {
                entry.mark_satisfied();
                entry.data_freshness_period = Some(data.freshness_period);
            }
            self.ctx.insert_dead_nonce_list(token, Some(in_face));
            if let Some(entry) = self.ctx.pit.get_mut(token) {
                entry.clear_in_records();
                entry.delete_out_record(in_face);
            }
        }
        for downstream in downstreams {
            if downstream == in_face && in_link != LinkType::AdHoc {
                continue;
            }
            self.ctx.put_data(downstream, data);
        }
    }

    /* ---------------------------------------------------------------- *
     * Incoming Nack pipeline
     * ---------------------------------------------------------------- */

    pub fn on_nack(&mut self, in_face: FaceId, nack: &Nack) {
        self.ctx.counters.in_nacks.increment();
        let link = match self.ctx.faces.get(in_face) {
            Some(face) => face.link_type(),
            None => {
                warn!("nack from unknown {}", in_face);
                return;
            }
        };
        trace!("{} recv nack={}", in_face, nack);
        if link != LinkType::PointToPoint {
            debug!("drop nack={} not point-to-point", nack);
            return;
        }
        let token = match self.ctx.pit.find(&nack.interest) {
            Some(token) => token,
            None => {
                debug!("drop nack={} no pit entry", nack);
                return;
            }
        };
        let valid = match self
            .ctx
            .pit
            .get_mut(token)
            .and_then(|e| e.get_out_record_mut(in_face))
        {
            Some(record) if record.last_nonce == nack.interest.nonce => {
                record.incoming_nack = Some(nack.reason);
                true
            }
            Some(_) => {
                debug!("drop nack={} nonce mismatch", nack);
                false
            }
            None => {
                debug!("drop nack={} no out-record", nack);
                false
            }
        };
        if !valid {
            return;
        }

        let now = self.ctx.now();
        let all_nacked = self
            .ctx
            .pit
            .get(token)
            .is_some_and(|e| !algorithm::has_pending_out_records(e, now));
        if all_nacked {
            self.ctx.set_expiry_timer(token, Duration::ZERO);
        }

        let name = nack.interest.name.clone();
        let nack = nack.clone();
        self.dispatch(&name, |strategy, ctx| {
            strategy.after_receive_nack(ctx, in_face, &nack, token);
        });
    }

    /// Reports that a link discarded an outgoing Interest, for example under
    /// congestion, so the governing strategy can react.
    pub fn on_dropped_interest(&mut self, out_face: FaceId, interest: &Interest) {
        debug!("{} dropped interest={}", out_face, interest);
        let name = interest.name.clone();
        let interest = interest.clone();
        self.dispatch(&name, |strategy, ctx| {
            strategy.on_dropped_interest(ctx, out_face, &interest);
        });
    }

    /* ---------------------------------------------------------------- *
     * Entry finalization and route notifications
     * ---------------------------------------------------------------- */

    fn finalize_interest(&mut self, token: PitToken) {
        let (name, satisfied) = match self.ctx.pit.get(token) {
            Some(entry) => (entry.name().clone(), entry.is_satisfied()),
            None => return,
        };
        if satisfied {
            self.ctx.counters.satisfied_interests.increment();
        } else {
            trace!("pit entry expired unsatisfied name={}", name);
            self.ctx.counters.unsatisfied_interests.increment();
            for observer in &mut self.ctx.observers {
                observer.before_expire_interest(&name);
            }
        }
        self.ctx.insert_dead_nonce_list(token, None);
        self.ctx.remove_pit_entry(token);
    }

    /// A new route appeared: offer retry to live entries under the prefix,
    /// skipping subtrees shadowed by a more specific FIB entry.
    fn on_new_next_hop(&mut self, prefix: &Name) {
        let nodes = self.ctx.name_tree.partial_enumerate(prefix, |node| {
            if node.name() != prefix && node.fib.is_some() {
                return (false, false);
            }
            (!node.pit_tokens.is_empty(), true)
        });
        let mut tokens: Vec<PitToken> = Vec::new();
        let mut seen: HashSet<PitToken> = HashSet::new();
        for node in nodes {
            for &token in &self.ctx.name_tree.node(node).pit_tokens {
                if seen.insert(token) {
                    tokens.push(token);
                }
            }
        }
        for token in tokens {
            let name = match self.ctx.pit.get(token) {
                Some(entry) => entry.name().clone(),
                None => continue,
            };
            let strategy = self.strategy_choice.find_effective_mut(&name);
            if !strategy.wants_new_next_hop() {
                continue;
            }
            strategy.after_new_next_hop(&mut self.ctx, token);
        }
    }

    fn dispatch<R>(
        &mut self,
        name: &Name,
        f: impl FnOnce(&mut dyn Strategy, &mut ForwardingContext) -> R,
    ) -> R {
        let strategy = self.strategy_choice.find_effective_mut(name);
        f(strategy, &mut self.ctx)
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}

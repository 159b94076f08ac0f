//! Pipeline integration tests over a deterministic clock and mock faces.

use crate::clock::ManualClock;
use crate::face::LinkSender;
use crate::fw::forwarder::{Forwarder, ForwarderObserver, ForwardingContext};
use crate::fw::strategy::Strategy;
use crate::fw::unsolicited::UnsolicitedDataPolicy;
use crate::table::pit::PitToken;
use rust_nfe_common::{Data, FaceId, FaceScope, Interest, LinkType, Nack, NackReason, Name};
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

#[derive(Default)]
struct Sent {
    interests: Vec<Interest>,
    data: Vec<Data>,
    nacks: Vec<Nack>,
}

struct MockSender(Rc<RefCell<Sent>>);

impl LinkSender for MockSender {
    fn send_interest(&mut self, interest: &Interest) {
        self.0.borrow_mut().interests.push(interest.clone());
    }

    fn send_data(&mut self, data: &Data) {
        self.0.borrow_mut().data.push(data.clone());
    }

    fn send_nack(&mut self, nack: &Nack) {
        self.0.borrow_mut().nacks.push(nack.clone());
    }
}

struct TestBed {
    clock: ManualClock,
    fwd: Forwarder,
}

impl TestBed {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let clock = ManualClock::new();
        let fwd = Forwarder::with_clock(Box::new(clock.clone()));
        Self { clock, fwd }
    }

    fn add_face(&mut self, scope: FaceScope, link: LinkType) -> (FaceId, Rc<RefCell<Sent>>) {
        let sent: Rc<RefCell<Sent>> = Rc::default();
        let id = self
            .fwd
            .add_face(scope, link, Box::new(MockSender(sent.clone())));
        (id, sent)
    }

    fn p2p_face(&mut self) -> (FaceId, Rc<RefCell<Sent>>) {
        self.add_face(FaceScope::NonLocal, LinkType::PointToPoint)
    }

    fn advance(&mut self, d: Duration) {
        self.clock.advance(d);
        self.fwd.process_timers();
    }
}

fn name(uri: &str) -> Name {
    Name::from_str(uri).unwrap()
}

fn interest(uri: &str, nonce: u32) -> Interest {
    Interest::new(name(uri), nonce)
}

#[test]
fn interest_travels_and_data_returns() {
    let mut bed = TestBed::new();
    let (consumer, c_sent) = bed.p2p_face();
    let (producer, p_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(consumer, &interest("/app/video/1", 1));
    assert_eq!(p_sent.borrow().interests.len(), 1);
    assert_eq!(p_sent.borrow().interests[0].name, name("/app/video/1"));

    bed.fwd
        .on_data(producer, &Data::new(name("/app/video/1"), &b"frame"[..]));
    assert_eq!(c_sent.borrow().data.len(), 1);
    assert_eq!(&c_sent.borrow().data[0].content[..], b"frame");

    bed.fwd.process_timers();
    let counters = bed.fwd.counters();
    assert_eq!(counters.satisfied_interests.value(), 1);
    assert_eq!(counters.unsatisfied_interests.value(), 0);
    assert_eq!(counters.out_interests.value(), 1);
    assert_eq!(counters.out_data.value(), 1);
}

#[test]
fn content_store_serves_repeat_request() {
    let mut bed = TestBed::new();
    let (consumer, _) = bed.p2p_face();
    let (producer, p_sent) = bed.p2p_face();
    let (other, o_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(consumer, &interest("/app/x", 1));
    bed.fwd.on_data(producer, &Data::new(name("/app/x"), &b"v"[..]));
    bed.fwd.process_timers();

    bed.fwd.on_interest(other, &interest("/app/x", 2));
    assert_eq!(o_sent.borrow().data.len(), 1);
    // no second trip upstream
    assert_eq!(p_sent.borrow().interests.len(), 1);
    assert_eq!(bed.fwd.counters().cs_hits.value(), 1);
    assert_eq!(bed.fwd.counters().cs_misses.value(), 1);
}

#[test]
fn pending_interests_aggregate() {
    let mut bed = TestBed::new();
    let (a, a_sent) = bed.p2p_face();
    let (b, b_sent) = bed.p2p_face();
    let (producer, p_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(a, &interest("/app/x", 1));
    bed.fwd.on_interest(b, &interest("/app/x", 2));
    // aggregated on the existing pending upstream request
    assert_eq!(p_sent.borrow().interests.len(), 1);

    bed.fwd.on_data(producer, &Data::new(name("/app/x"), &b"v"[..]));
    assert_eq!(a_sent.borrow().data.len(), 1);
    assert_eq!(b_sent.borrow().data.len(), 1);
}

#[test]
fn duplicate_nonce_nacked_on_point_to_point() {
    let mut bed = TestBed::new();
    let (a, _) = bed.p2p_face();
    let (b, b_sent) = bed.p2p_face();
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(a, &interest("/app/x", 7));
    bed.fwd.on_interest(b, &interest("/app/x", 7));

    let nacks = &b_sent.borrow().nacks;
    assert_eq!(nacks.len(), 1);
    assert_eq!(nacks[0].reason, NackReason::Duplicate);
}

#[test]
fn duplicate_nonce_dropped_on_multi_access() {
    let mut bed = TestBed::new();
    let (a, _) = bed.p2p_face();
    let (m, m_sent) = bed.add_face(FaceScope::NonLocal, LinkType::MultiAccess);
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(a, &interest("/app/x", 7));
    bed.fwd.on_interest(m, &interest("/app/x", 7));
    assert!(m_sent.borrow().nacks.is_empty());
}

#[test]
fn looped_interest_on_ad_hoc_is_dropped() {
    let mut bed = TestBed::new();
    let (a, _) = bed.p2p_face();
    let (wireless, w_sent) = bed.add_face(FaceScope::NonLocal, LinkType::AdHoc);
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(a, &interest("/app/x", 7));
    bed.fwd.on_interest(wireless, &interest("/app/x", 7));
    assert!(w_sent.borrow().nacks.is_empty());
}

#[test]
fn retransmission_on_same_point_to_point_face_is_allowed() {
    let mut bed = TestBed::new();
    let (consumer, c_sent) = bed.p2p_face();
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(consumer, &interest("/app/x", 7));
    bed.advance(Duration::from_secs(2));
    bed.fwd.on_interest(consumer, &interest("/app/x", 7));
    assert!(c_sent.borrow().nacks.is_empty());
}

#[test]
fn dead_nonce_list_catches_late_duplicate() {
    let mut bed = TestBed::new();
    let (consumer, c_sent) = bed.p2p_face();
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(consumer, &interest("/app/x", 7));
    // expires unsatisfied; its outgoing nonce lands on the dead nonce list
    bed.advance(Duration::from_secs(5));
    assert_eq!(bed.fwd.counters().unsatisfied_interests.value(), 1);

    bed.fwd.on_interest(consumer, &interest("/app/x", 7));
    let nacks = &c_sent.borrow().nacks;
    assert_eq!(nacks.len(), 1);
    assert_eq!(nacks[0].reason, NackReason::Duplicate);
}

#[test]
fn satisfied_fresh_entry_still_records_its_nonce() {
    let mut bed = TestBed::new();
    let (consumer, c_sent) = bed.p2p_face();
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    // the Data outlives the cache sooner than the nonce would age out,
    // so the nonce must be remembered anyway
    let i = interest("/app/x", 7).with_must_be_fresh(true);
    bed.fwd.on_interest(consumer, &i);
    bed.fwd.on_data(
        producer,
        &Data::new(name("/app/x"), &b"v"[..]).with_freshness_period(Duration::from_secs(1)),
    );
    bed.fwd.process_timers();

    bed.fwd.on_interest(consumer, &i);
    let nacks = &c_sent.borrow().nacks;
    assert_eq!(nacks.len(), 1);
    assert_eq!(nacks[0].reason, NackReason::Duplicate);
}

#[test]
fn satisfied_long_lived_entry_skips_the_dead_nonce_list() {
    let mut bed = TestBed::new();
    let (consumer, c_sent) = bed.p2p_face();
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    let i = interest("/app/x", 7).with_must_be_fresh(true);
    bed.fwd.on_interest(consumer, &i);
    bed.fwd.on_data(
        producer,
        &Data::new(name("/app/x"), &b"v"[..]).with_freshness_period(Duration::from_secs(10)),
    );
    bed.fwd.process_timers();

    // the cached Data stays fresh past the nonce lifetime: a reuse of the
    // nonce is answered from the Content Store, not treated as a loop
    bed.fwd.on_interest(consumer, &i);
    assert!(c_sent.borrow().nacks.is_empty());
    assert_eq!(c_sent.borrow().data.len(), 2);
    assert_eq!(bed.fwd.counters().cs_hits.value(), 1);
}

#[test]
fn pit_expiry_rearms_on_refresh() {
    let mut bed = TestBed::new();
    let (consumer, _) = bed.p2p_face();
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(consumer, &interest("/app/x", 1));
    bed.advance(Duration::from_secs(2));
    // refresh from the same downstream pushes the deadline out
    bed.fwd.on_interest(consumer, &interest("/app/x", 2));

    bed.advance(Duration::from_millis(4500 - 2000));
    assert_eq!(bed.fwd.counters().unsatisfied_interests.value(), 0);

    bed.advance(Duration::from_secs(2));
    assert_eq!(bed.fwd.counters().unsatisfied_interests.value(), 1);
}

#[test]
fn localhost_interest_dropped_from_network_face() {
    let mut bed = TestBed::new();
    let (network, n_sent) = bed.p2p_face();
    let (app, a_sent) = bed.add_face(FaceScope::Local, LinkType::PointToPoint);
    bed.fwd.add_next_hop(&name("/localhost/mgmt"), app, 10);

    bed.fwd.on_interest(network, &interest("/localhost/mgmt/status", 1));
    assert!(a_sent.borrow().interests.is_empty());
    assert!(n_sent.borrow().nacks.is_empty());
}

#[test]
fn localhost_interest_never_leaves_the_host() {
    let mut bed = TestBed::new();
    let (app, a_sent) = bed.add_face(FaceScope::Local, LinkType::PointToPoint);
    let (network, n_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/localhost/mgmt"), network, 10);

    bed.fwd.on_interest(app, &interest("/localhost/mgmt/status", 1));
    assert!(n_sent.borrow().interests.is_empty());
    // nothing to forward to: the downstream learns there is no route
    assert_eq!(a_sent.borrow().nacks.len(), 1);
    assert_eq!(a_sent.borrow().nacks[0].reason, NackReason::NoRoute);
}

#[test]
fn localhop_crosses_at_most_one_link() {
    let mut bed = TestBed::new();
    let (local, _) = bed.add_face(FaceScope::Local, LinkType::PointToPoint);
    let (network_in, _) = bed.p2p_face();
    let (network_out, out_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/localhop"), network_out, 10);

    // entering from the network, it may not leave again
    bed.fwd.on_interest(network_in, &interest("/localhop/sync", 1));
    assert!(out_sent.borrow().interests.is_empty());

    // originating locally, one network hop is fine
    bed.fwd.on_interest(local, &interest("/localhop/sync", 2));
    assert_eq!(out_sent.borrow().interests.len(), 1);
}

#[test]
fn explicit_next_hop_bypasses_the_strategy() {
    let mut bed = TestBed::new();
    let (consumer, _) = bed.p2p_face();
    let (routed, r_sent) = bed.p2p_face();
    let (pinned, p_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), routed, 10);

    let i = interest("/app/x", 1).with_next_hop_face(pinned);
    bed.fwd.on_interest(consumer, &i);
    assert!(r_sent.borrow().interests.is_empty());
    assert_eq!(p_sent.borrow().interests.len(), 1);
    // the override is host-local and must not propagate
    assert!(p_sent.borrow().interests[0].next_hop_face.is_none());
}

#[test]
fn forwarding_hint_steers_and_strips() {
    let mut bed = TestBed::new();
    let (consumer, _) = bed.p2p_face();
    let (edge, e_sent) = bed.p2p_face();
    let (app_route, a_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/region/edge"), edge, 10);
    bed.fwd.add_next_hop(&name("/app"), app_route, 10);

    // outside the producer region: FIB lookup follows the hint
    let hinted = interest("/app/x", 1).with_forwarding_hint(vec![name("/region/edge")]);
    bed.fwd.on_interest(consumer, &hinted);
    assert_eq!(e_sent.borrow().interests.len(), 1);
    assert_eq!(e_sent.borrow().interests[0].forwarding_hint, vec![name("/region/edge")]);
    assert!(a_sent.borrow().interests.is_empty());

    // inside the region: hint is stripped, lookup falls back to the name
    bed.fwd.add_network_region(name("/region/edge/site1"));
    let hinted = interest("/app/y", 2).with_forwarding_hint(vec![name("/region/edge")]);
    bed.fwd.on_interest(consumer, &hinted);
    assert_eq!(a_sent.borrow().interests.len(), 1);
    assert!(a_sent.borrow().interests[0].forwarding_hint.is_empty());
}

#[test]
fn nacked_entry_expires_when_all_upstreams_refuse() {
    let mut bed = TestBed::new();
    let (consumer, _) = bed.p2p_face();
    let (up1, u1_sent) = bed.p2p_face();
    let (up2, u2_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), up1, 10);
    bed.fwd.add_next_hop(&name("/app"), up2, 20);

    let i = interest("/app/x", 1);
    bed.fwd.on_interest(consumer, &i);
    assert_eq!(u1_sent.borrow().interests.len(), 1);
    assert_eq!(u2_sent.borrow().interests.len(), 1);

    bed.fwd.on_nack(up1, &Nack::new(i.clone(), NackReason::Congestion));
    bed.fwd.process_timers();
    assert_eq!(bed.fwd.counters().unsatisfied_interests.value(), 0);

    bed.fwd.on_nack(up2, &Nack::new(i.clone(), NackReason::NoRoute));
    bed.fwd.process_timers();
    assert_eq!(bed.fwd.counters().unsatisfied_interests.value(), 1);
}

#[test]
fn nack_with_stale_nonce_is_ignored() {
    let mut bed = TestBed::new();
    let (consumer, c_sent) = bed.p2p_face();
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(consumer, &interest("/app/x", 1));
    bed.fwd
        .on_nack(producer, &Nack::new(interest("/app/x", 99), NackReason::Congestion));
    bed.fwd.process_timers();
    assert_eq!(bed.fwd.counters().unsatisfied_interests.value(), 0);

    // the entry is still live and Data satisfies it
    bed.fwd.on_data(producer, &Data::new(name("/app/x"), &b"v"[..]));
    assert_eq!(c_sent.borrow().data.len(), 1);
}

#[test]
fn nack_from_multi_access_face_is_dropped() {
    let mut bed = TestBed::new();
    let (consumer, _) = bed.p2p_face();
    let (producer, _) = bed.add_face(FaceScope::NonLocal, LinkType::MultiAccess);
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    let i = interest("/app/x", 1);
    bed.fwd.on_interest(consumer, &i);
    bed.fwd.on_nack(producer, &Nack::new(i, NackReason::Congestion));
    bed.fwd.process_timers();
    assert_eq!(bed.fwd.counters().in_nacks.value(), 1);
    assert_eq!(bed.fwd.counters().unsatisfied_interests.value(), 0);
}

#[test]
fn unsolicited_data_follows_policy() {
    let mut bed = TestBed::new();
    let (consumer, c_sent) = bed.p2p_face();
    let (producer, p_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    // default drop-all: the stray Data is not cached
    bed.fwd.on_data(producer, &Data::new(name("/app/x"), &b"v"[..]));
    bed.fwd.on_interest(consumer, &interest("/app/x", 1));
    assert!(c_sent.borrow().data.is_empty());
    assert_eq!(p_sent.borrow().interests.len(), 1);

    bed.fwd.set_unsolicited_policy(UnsolicitedDataPolicy::AdmitAll);
    bed.fwd.on_data(producer, &Data::new(name("/app/y"), &b"w"[..]));
    bed.fwd.on_interest(consumer, &interest("/app/y", 2));
    assert_eq!(c_sent.borrow().data.len(), 1);
}

#[test]
fn multicast_excludes_ingress_unless_ad_hoc() {
    let mut bed = TestBed::new();
    let (shared, s_sent) = bed.p2p_face();
    let (other, o_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), shared, 10);
    bed.fwd.add_next_hop(&name("/app"), other, 20);

    bed.fwd.on_interest(shared, &interest("/app/x", 1));
    assert!(s_sent.borrow().interests.is_empty());
    assert_eq!(o_sent.borrow().interests.len(), 1);
}

#[test]
fn ad_hoc_ingress_may_be_reused_for_egress() {
    let mut bed = TestBed::new();
    let (wireless, w_sent) = bed.add_face(FaceScope::NonLocal, LinkType::AdHoc);
    bed.fwd.add_next_hop(&name("/app"), wireless, 10);

    bed.fwd.on_interest(wireless, &interest("/app/x", 1));
    assert_eq!(w_sent.borrow().interests.len(), 1);

    // Data also flows back out of the ad hoc ingress
    bed.fwd.on_data(wireless, &Data::new(name("/app/x"), &b"v"[..]));
    assert_eq!(w_sent.borrow().data.len(), 1);
}

#[test]
fn data_satisfies_all_matching_entries_once() {
    let mut bed = TestBed::new();
    let (a, a_sent) = bed.p2p_face();
    let (b, b_sent) = bed.p2p_face();
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd
        .on_interest(a, &interest("/app", 1).with_can_be_prefix(true));
    bed.fwd.on_interest(b, &interest("/app/x", 2));

    bed.fwd.on_data(producer, &Data::new(name("/app/x"), &b"v"[..]));
    assert_eq!(a_sent.borrow().data.len(), 1);
    assert_eq!(b_sent.borrow().data.len(), 1);
    bed.fwd.process_timers();
    assert_eq!(bed.fwd.counters().satisfied_interests.value(), 2);
}

#[test]
fn new_next_hop_reaches_pending_entries() {
    let mut bed = TestBed::new();
    let (consumer, _) = bed.p2p_face();
    let (up1, _) = bed.p2p_face();
    let (up2, u2_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), up1, 10);

    bed.fwd.on_interest(consumer, &interest("/app/x", 1));
    assert!(u2_sent.borrow().interests.is_empty());

    bed.fwd.add_next_hop(&name("/app"), up2, 20);
    assert_eq!(u2_sent.borrow().interests.len(), 1);
}

#[test]
fn face_removal_sweeps_routes() {
    let mut bed = TestBed::new();
    let (consumer, c_sent) = bed.p2p_face();
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.remove_face(producer);
    bed.fwd.on_interest(consumer, &interest("/app/x", 1));
    assert_eq!(c_sent.borrow().nacks.len(), 1);
    assert_eq!(c_sent.borrow().nacks[0].reason, NackReason::NoRoute);
}

#[test]
fn adaptive_strategy_learns_and_prefers_best_upstream() {
    let mut bed = TestBed::new();
    let (consumer, c_sent) = bed.p2p_face();
    let (up1, u1_sent) = bed.p2p_face();
    let (up2, u2_sent) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), up1, 10);
    bed.fwd.add_next_hop(&name("/app"), up2, 20);
    assert!(bed.fwd.set_strategy(name("/app"), "adaptive"));

    // nothing is known yet: the first Interest is deferred, then probed
    bed.fwd.on_interest(consumer, &interest("/app/1", 1));
    assert!(u1_sent.borrow().interests.is_empty());
    bed.advance(Duration::from_millis(4));
    assert_eq!(u1_sent.borrow().interests.len(), 1);

    bed.fwd.on_data(up1, &Data::new(name("/app/1"), &b"v"[..]));
    assert_eq!(c_sent.borrow().data.len(), 1);
    bed.fwd.process_timers();

    // the winner is now preferred and gets the next Interest immediately
    bed.fwd.on_interest(consumer, &interest("/app/2", 2));
    assert_eq!(u1_sent.borrow().interests.len(), 2);
    assert!(u2_sent.borrow().interests.is_empty());

    // if it stays silent past the prediction, flooding reaches the other
    bed.advance(Duration::from_millis(10));
    assert_eq!(u2_sent.borrow().interests.len(), 1);

    bed.fwd.on_data(up2, &Data::new(name("/app/2"), &b"w"[..]));
    assert_eq!(c_sent.borrow().data.len(), 2);

    // and the preference follows the new winner
    bed.fwd.on_interest(consumer, &interest("/app/3", 3));
    assert_eq!(u2_sent.borrow().interests.len(), 2);
}

#[test]
fn adaptive_strategy_rejects_without_routes() {
    let mut bed = TestBed::new();
    let (consumer, _) = bed.p2p_face();
    assert!(bed.fwd.set_strategy(name("/app"), "adaptive"));

    bed.fwd.on_interest(consumer, &interest("/app/x", 1));
    bed.fwd.process_timers();
    assert_eq!(bed.fwd.counters().unsatisfied_interests.value(), 1);
}

#[derive(Default)]
struct Hooks {
    interests: usize,
    data: usize,
    satisfied: usize,
    expired: usize,
    cs_hits: usize,
    cs_misses: usize,
}

struct CountingObserver(Rc<RefCell<Hooks>>);

impl ForwarderObserver for CountingObserver {
    fn after_receive_interest(&mut self, _in_face: FaceId, _interest: &Interest) {
        self.0.borrow_mut().interests += 1;
    }

    fn after_receive_data(&mut self, _in_face: FaceId, _data: &Data) {
        self.0.borrow_mut().data += 1;
    }

    fn after_cs_hit(&mut self, _interest: &Interest, _data: &Data) {
        self.0.borrow_mut().cs_hits += 1;
    }

    fn after_cs_miss(&mut self, _interest: &Interest) {
        self.0.borrow_mut().cs_misses += 1;
    }

    fn before_satisfy_interest(&mut self, _name: &Name, _data: &Data) {
        self.0.borrow_mut().satisfied += 1;
    }

    fn before_expire_interest(&mut self, _name: &Name) {
        self.0.borrow_mut().expired += 1;
    }
}

#[test]
fn observers_see_pipeline_milestones() {
    let mut bed = TestBed::new();
    let hooks: Rc<RefCell<Hooks>> = Rc::default();
    bed.fwd.add_observer(Box::new(CountingObserver(hooks.clone())));

    let (consumer, _) = bed.p2p_face();
    let (producer, _) = bed.p2p_face();
    bed.fwd.add_next_hop(&name("/app"), producer, 10);

    bed.fwd.on_interest(consumer, &interest("/app/x", 1));
    bed.fwd.on_data(producer, &Data::new(name("/app/x"), &b"v"[..]));
    bed.fwd.on_interest(consumer, &interest("/app/x", 2));
    bed.fwd.on_interest(consumer, &interest("/app/unanswered", 3));
    bed.advance(Duration::from_secs(5));

    let hooks = hooks.borrow();
    assert_eq!(hooks.interests, 3);
    assert_eq!(hooks.data, 1);
    // the first /app/x and the cache hit both satisfy
    assert_eq!(hooks.satisfied, 2);
    assert_eq!(hooks.expired, 1);
    assert_eq!(hooks.cs_hits, 1);
    assert_eq!(hooks.cs_misses, 2);
}

#[derive(Default)]
struct StrategyEvents {
    looped: usize,
    dropped: usize,
}

struct RecordingStrategy(Rc<RefCell<StrategyEvents>>);

impl Strategy for RecordingStrategy {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn after_receive_interest(
        &mut self,
        _ctx: &mut ForwardingContext,
        _in_face: FaceId,
        _interest: &Interest,
        _token: PitToken,
    ) {
    }

    fn after_receive_looped_interest(
        &mut self,
        _ctx: &mut ForwardingContext,
        _in_face: FaceId,
        _interest: &Interest,
    ) {
        self.0.borrow_mut().looped += 1;
    }

    fn on_dropped_interest(
        &mut self,
        _ctx: &mut ForwardingContext,
        _out_face: FaceId,
        _interest: &Interest,
    ) {
        self.0.borrow_mut().dropped += 1;
    }
}

#[test]
fn strategies_hear_loops_and_link_drops() {
    let mut bed = TestBed::new();
    let events: Rc<RefCell<StrategyEvents>> = Rc::default();
    let recorded = events.clone();
    bed.fwd
        .strategy_registry_mut()
        .register("recording", move || {
            Box::new(RecordingStrategy(recorded.clone()))
        });
    assert!(bed.fwd.set_strategy(name("/app"), "recording"));

    let (a, _) = bed.p2p_face();
    let (b, b_sent) = bed.p2p_face();

    bed.fwd.on_interest(a, &interest("/app/x", 7));
    bed.fwd.on_interest(b, &interest("/app/x", 7));
    assert_eq!(b_sent.borrow().nacks.len(), 1);
    assert_eq!(events.borrow().looped, 1);

    bed.fwd.on_dropped_interest(b, &interest("/app/x", 7));
    assert_eq!(events.borrow().dropped, 1);
}

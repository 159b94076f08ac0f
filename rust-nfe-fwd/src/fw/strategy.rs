//! The strategy seam.
//!
//! A [`Strategy`] decides where Interests go and how responses propagate for
//! the namespaces it is bound to. The pipelines call into it at fixed points
//! and hand it a [`ForwardingContext`] of actions; everything else about the
//! engine is hidden from it.

use crate::fw::forwarder::ForwardingContext;
use crate::table::pit::PitToken;
use rust_nfe_common::{Data, FaceId, Interest, Nack};
use std::collections::BTreeMap;

/// Strategy-armed timers, re-validated against the PIT when they fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyTimer {
    /// The remembered best upstream did not answer in the predicted time.
    BestFaceTimeout,
    /// Deferred flooding of an Interest to the remaining upstreams.
    Propagate { in_face: FaceId },
}

/// A forwarding strategy.
///
/// Only `after_receive_interest` is mandatory; the default reactions to Data
/// and Nacks fit most strategies.
pub trait Strategy {
    fn name(&self) -> &'static str;

    /// An Interest needs forwarding. The strategy must either send it
    /// upstream or reject the entry.
    fn after_receive_interest(
        &mut self,
        ctx: &mut ForwardingContext,
        in_face: FaceId,
        interest: &Interest,
        token: PitToken,
    );

    /// A lookup was answered from the Content Store.
    fn after_content_store_hit(
        &mut self,
        ctx: &mut ForwardingContext,
        token: PitToken,
        in_face: FaceId,
        data: &Data,
    ) {
        ctx.send_data(token, data, in_face);
    }

    /// Data is about to satisfy the entry; a chance to record measurements.
    fn before_satisfy_interest(
        &mut self,
        _ctx: &mut ForwardingContext,
        _token: PitToken,
        _in_face: FaceId,
        _data: &Data,
    ) {
    }

    /// Data arrived from upstream.
    fn after_receive_data(
        &mut self,
        ctx: &mut ForwardingContext,
        token: PitToken,
        in_face: FaceId,
        data: &Data,
    ) {
        ctx.send_data_to_all(token, data, in_face);
    }

    /// A Nack arrived from upstream. The default is to drop it.
    fn after_receive_nack(
        &mut self,
        _ctx: &mut ForwardingContext,
        _in_face: FaceId,
        _nack: &Nack,
        _token: PitToken,
    ) {
    }

    /// An Interest was recognized as a loop and already answered or dropped
    /// by the pipeline.
    fn after_receive_looped_interest(
        &mut self,
        _ctx: &mut ForwardingContext,
        _in_face: FaceId,
        _interest: &Interest,
    ) {
    }

    /// A link discarded an Interest this node sent out.
    fn on_dropped_interest(
        &mut self,
        _ctx: &mut ForwardingContext,
        _out_face: FaceId,
        _interest: &Interest,
    ) {
    }

    /// A timer armed by this strategy fired while its entry is still alive.
    fn on_timer(&mut self, _ctx: &mut ForwardingContext, _token: PitToken, _timer: StrategyTimer) {}

    /// Whether the strategy wants `after_new_next_hop` notifications.
    fn wants_new_next_hop(&self) -> bool {
        false
    }

    /// A FIB next hop appeared under a prefix with live entries.
    fn after_new_next_hop(&mut self, _ctx: &mut ForwardingContext, _token: PitToken) {}
}

type Factory = Box<dyn Fn() -> Box<dyn Strategy>>;

/// Known strategies, instantiable by config name.
pub struct StrategyRegistry {
    factories: BTreeMap<&'static str, Factory>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        registry.register(crate::fw::multicast::MulticastStrategy::NAME, || {
            Box::new(crate::fw::multicast::MulticastStrategy::new())
        });
        registry.register(crate::fw::adaptive::AdaptiveStrategy::NAME, || {
            Box::new(crate::fw::adaptive::AdaptiveStrategy::new())
        });
        registry
    }

    /// Makes a strategy instantiable under `name`, replacing any previous
    /// factory registered there.
    pub fn register(
        &mut self,
        name: &'static str,
        factory: impl Fn() -> Box<dyn Strategy> + 'static,
    ) {
        self.factories.insert(name, Box::new(factory));
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Strategy>> {
        self.factories.get(name).map(|f| f())
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Adaptive strategy.
//!
//! Remembers, per name prefix, which upstream answered last and how quickly.
//! An Interest goes to the remembered best upstream first with a prediction
//! timer; if the prediction passes without Data, the prediction is raised and
//! the Interest is progressively flooded to the remaining upstreams with
//! randomized deferral. Data lowers the prediction and renews the best
//! upstream.

use crate::fw::algorithm;
use crate::fw::forwarder::ForwardingContext;
use crate::fw::strategy::{Strategy, StrategyTimer};
use crate::table::measurements;
use crate::table::name_tree::NodeId;
use crate::table::pit::PitToken;
use crate::scheduler::TimerHandle;
use log::trace;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rust_nfe_common::types::FACEID_CONTENT_STORE;
use rust_nfe_common::{Data, FaceId, Interest};
use std::time::Duration;

const INITIAL_PREDICTION: Duration = Duration::from_micros(8192);
const MIN_PREDICTION: Duration = Duration::from_micros(127);
const MAX_PREDICTION: Duration = Duration::from_millis(160);

/// Deferral before flooding starts when no best upstream is known.
const DEFER_FIRST_WITHOUT_BEST_FACE: Duration = Duration::from_millis(4);
const DEFER_RANGE_WITHOUT_BEST_FACE: Duration = Duration::from_millis(75);

const MEASUREMENTS_LIFETIME: Duration = Duration::from_secs(16);
const UPDATE_MEASUREMENTS_LEVELS: usize = 2;

/// Per-prefix state, stored in the Measurements table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MeasurementsInfo {
    prediction: Duration,
    best_face: Option<FaceId>,
    previous_face: Option<FaceId>,
}

impl Default for MeasurementsInfo {
    fn default() -> Self {
        Self {
            prediction: INITIAL_PREDICTION,
            best_face: None,
            previous_face: None,
        }
    }
}

impl MeasurementsInfo {
    fn adjust_predict_down(&mut self) {
        self.prediction = MIN_PREDICTION.max(self.prediction - self.prediction / 128);
    }

    fn adjust_predict_up(&mut self) {
        self.prediction = MAX_PREDICTION.min(self.prediction + self.prediction / 8);
    }

    fn update_best_face(&mut self, face: FaceId) {
        if self.best_face == Some(face) {
            self.adjust_predict_down();
        } else {
            self.previous_face = self.best_face;
            self.best_face = Some(face);
        }
    }
}

/// Per-entry timer state, stored in the PIT strategy slot.
#[derive(Debug, Default)]
struct PitInfo {
    best_face_timeout: Option<TimerHandle>,
    propagate_timer: Option<TimerHandle>,
    max_interval: Duration,
}

#[derive(Debug)]
pub struct AdaptiveStrategy {
    rng: SmallRng,
}

impl AdaptiveStrategy {
    pub const NAME: &'static str = "adaptive";

    pub fn new() -> Self {
        Self {
            // jitter only; a fixed seed keeps timer tests reproducible
            rng: SmallRng::seed_from_u64(0x5eed),
        }
    }

    /// Reads the prefix info at `node`, creating it from the parent's info
    /// (one level of inheritance) when absent.
    fn info_at(ctx: &mut ForwardingContext, node: NodeId) -> MeasurementsInfo {
        let now = ctx.now();
        if let Some(entry) = measurements::entry_mut(&mut ctx.name_tree, node, now) {
            if let Some(info) = entry.info::<MeasurementsInfo>() {
                return *info;
            }
        }
        let inherited = ctx
            .name_tree
            .node(node)
            .parent()
            .and_then(|parent| measurements::entry_mut(&mut ctx.name_tree, parent, now))
            .and_then(|entry| entry.info::<MeasurementsInfo>().copied())
            .unwrap_or_default();
        Self::store_info(ctx, node, inherited);
        inherited
    }

    fn store_info(ctx: &mut ForwardingContext, node: NodeId, info: MeasurementsInfo) {
        let now = ctx.now();
        if let Some(entry) = measurements::entry_mut(&mut ctx.name_tree, node, now) {
            entry.set_info(info);
        }
    }

    fn do_propagate(&mut self, ctx: &mut ForwardingContext, token: PitToken, in_face: FaceId) {
        let interest = match ctx.pit_entry(token) {
            Some(entry) => entry.interest().clone(),
            None => return,
        };
        let now = ctx.now();
        let node = measurements::get(&mut ctx.name_tree, &interest.name, now);
        let info = Self::info_at(ctx, node);
        let hops = ctx.fib_next_hops(token);

        if let Some(previous) = info.previous_face {
            if hops.iter().any(|h| h.face == previous)
                && ctx.can_forward_to(token, previous)
                && !ctx.would_violate_scope(in_face, &interest, previous)
            {
                ctx.send_interest(token, previous, &interest);
            }
        }

        let mut forwarded = false;
        for hop in &hops {
            if ctx.can_forward_to(token, hop.face)
                && !ctx.would_violate_scope(in_face, &interest, hop.face)
            {
                ctx.send_interest(token, hop.face, &interest);
                forwarded = true;
                break;
            }
        }
        if !forwarded {
            return;
        }

        // keep flooding the remaining upstreams, spread out randomly
        let max_interval = match ctx.pit_entry(token).and_then(|e| e.strategy_info::<PitInfo>())
        {
            Some(pit_info) if pit_info.max_interval > Duration::ZERO => pit_info.max_interval,
            _ => DEFER_FIRST_WITHOUT_BEST_FACE,
        };
        let defer =
            Duration::from_nanos(self.rng.gen_range(0..max_interval.as_nanos().max(1)) as u64);
        let handle =
            ctx.schedule_strategy_timer(token, defer, StrategyTimer::Propagate { in_face });
        if let Some(entry) = ctx.pit_entry_mut(token) {
            entry.strategy_info_or_default::<PitInfo>().propagate_timer = Some(handle);
        }
    }

    fn timeout_on_best_face(&mut self, ctx: &mut ForwardingContext, token: PitToken) {
        let name = match ctx.pit_entry(token) {
            Some(entry) => entry.name().clone(),
            None => return,
        };
        trace!("best upstream timed out name={}", name);
        let now = ctx.now();
        let mut node = Some(measurements::get(&mut ctx.name_tree, &name, now));
        for _ in 0..UPDATE_MEASUREMENTS_LEVELS {
            let current = match node {
                Some(current) => current,
                None => break,
            };
            let mut info = Self::info_at(ctx, current);
            info.adjust_predict_up();
            Self::store_info(ctx, current, info);
            let now = ctx.now();
            measurements::extend_lifetime(&mut ctx.name_tree, current, MEASUREMENTS_LIFETIME, now);
            node = measurements::get_parent(&mut ctx.name_tree, current, now);
        }
    }
}

impl Strategy for AdaptiveStrategy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn after_receive_interest(
        &mut self,
        ctx: &mut ForwardingContext,
        in_face: FaceId,
        interest: &Interest,
        token: PitToken,
    ) {
        let hops = ctx.fib_next_hops(token);
        if hops.is_empty() {
            ctx.reject(token);
            return;
        }
        // only the first downstream starts the cycle; later downstreams join
        // the existing pending entry
        let now = ctx.now();
        let has_pending = ctx
            .pit_entry(token)
            .is_some_and(|e| algorithm::has_pending_out_records(e, now));
        if has_pending {
            return;
        }

        let node = measurements::get(&mut ctx.name_tree, &interest.name, now);
        let info = Self::info_at(ctx, node);

        let mut defer_first = DEFER_FIRST_WITHOUT_BEST_FACE;
        let mut defer_range = DEFER_RANGE_WITHOUT_BEST_FACE;
        let mut n_upstreams = hops.len();

        if let Some(best) = info.best_face {
            if hops.iter().any(|h| h.face == best)
                && ctx.has_face(best)
                && !ctx.would_violate_scope(in_face, interest, best)
                && ctx.can_forward_to(token, best)
            {
                defer_first = info.prediction;
                defer_range = (defer_first + Duration::from_micros(1)) / 2;
                n_upstreams -= 1;
                ctx.send_interest(token, best, interest);
                let handle = ctx.schedule_strategy_timer(
                    token,
                    info.prediction,
                    StrategyTimer::BestFaceTimeout,
                );
                if let Some(entry) = ctx.pit_entry_mut(token) {
                    entry.strategy_info_or_default::<PitInfo>().best_face_timeout = Some(handle);
                }
            }
        }
        if let Some(previous) = info.previous_face {
            if n_upstreams > 0 && hops.iter().any(|h| h.face == previous) {
                n_upstreams -= 1;
            }
        }

        let max_interval = if n_upstreams > 0 {
            Duration::from_micros(1).max(defer_range * 2 / n_upstreams as u32)
        } else {
            defer_first
        };
        let handle =
            ctx.schedule_strategy_timer(token, defer_first, StrategyTimer::Propagate { in_face });
        if let Some(entry) = ctx.pit_entry_mut(token) {
            let pit_info = entry.strategy_info_or_default::<PitInfo>();
            pit_info.max_interval = max_interval;
            pit_info.propagate_timer = Some(handle);
        }
    }

    fn before_satisfy_interest(
        &mut self,
        ctx: &mut ForwardingContext,
        token: PitToken,
        in_face: FaceId,
        _data: &Data,
    ) {
        let name = match ctx.pit_entry(token) {
            Some(entry) => entry.name().clone(),
            None => return,
        };
        if in_face != FACEID_CONTENT_STORE {
            let first_now = ctx.now();
            let mut node = Some(measurements::get(&mut ctx.name_tree, &name, first_now));
            for _ in 0..UPDATE_MEASUREMENTS_LEVELS {
                let current = match node {
                    Some(current) => current,
                    None => break,
                };
                let now = ctx.now();
                measurements::extend_lifetime(
                    &mut ctx.name_tree,
                    current,
                    MEASUREMENTS_LIFETIME,
                    now,
                );
                let mut info = Self::info_at(ctx, current);
                info.update_best_face(in_face);
                Self::store_info(ctx, current, info);
                node = measurements::get_parent(&mut ctx.name_tree, current, now);
            }
        }

        let handles: Vec<TimerHandle> = match ctx.pit_entry_mut(token) {
            Some(entry) => match entry.strategy_info_mut::<PitInfo>() {
                Some(pit_info) => pit_info
                    .best_face_timeout
                    .take()
                    .into_iter()
                    .chain(pit_info.propagate_timer.take())
                    .collect(),
                None => Vec::new(),
            },
            None => Vec::new(),
        };
        for handle in handles {
            ctx.cancel_timer(handle);
        }
    }

    fn on_timer(&mut self, ctx: &mut ForwardingContext, token: PitToken, timer: StrategyTimer) {
        match timer {
            StrategyTimer::Propagate { in_face } => self.do_propagate(ctx, token, in_face),
            StrategyTimer::BestFaceTimeout => self.timeout_on_best_face(ctx, token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_adjusts_within_bounds() {
        let mut info = MeasurementsInfo::default();
        assert_eq!(info.prediction, INITIAL_PREDICTION);

        while info.prediction > MIN_PREDICTION {
            let before = info.prediction;
            info.adjust_predict_down();
            assert!(info.prediction < before);
        }
        assert_eq!(info.prediction, MIN_PREDICTION);

        while info.prediction < MAX_PREDICTION {
            let before = info.prediction;
            info.adjust_predict_up();
            assert!(info.prediction > before);
        }
        assert_eq!(info.prediction, MAX_PREDICTION);
    }

    #[test]
    fn repeat_winner_sharpens_prediction() {
        let mut info = MeasurementsInfo::default();
        info.update_best_face(FaceId(300));
        assert_eq!(info.best_face, Some(FaceId(300)));
        assert_eq!(info.prediction, INITIAL_PREDICTION);

        info.update_best_face(FaceId(300));
        assert!(info.prediction < INITIAL_PREDICTION);

        info.update_best_face(FaceId(301));
        assert_eq!(info.best_face, Some(FaceId(301)));
        assert_eq!(info.previous_face, Some(FaceId(300)));
    }
}

//! Timer scheduler.
//!
//! Pipelines never block; anything deferred goes through this queue as a
//! [`TimerEvent`] carrying a PIT token that is re-validated when the event
//! fires. Cancellation is idempotent: a cancelled or superseded handle simply
//! never fires.

use crate::clock::Timestamp;
use crate::fw::strategy::StrategyTimer;
use crate::table::pit::PitToken;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

/// Opaque handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// What to do when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A PIT entry's expiry timer: finalize the entry.
    PitExpiry(PitToken),
    /// A strategy-armed timer attached to a PIT entry.
    Strategy {
        token: PitToken,
        timer: StrategyTimer,
    },
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<(Timestamp, u64)>>,
    pending: HashMap<u64, TimerEvent>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `event` to fire `after` the given instant.
    pub fn schedule(&mut self, now: Timestamp, after: Duration, event: TimerEvent) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(id, event);
        self.queue.push(Reverse((now + after, id)));
        TimerHandle(id)
    }

    /// Cancels a timer. Unknown or already-fired handles are a no-op.
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.pending.remove(&handle.0);
    }

    /// Pops the next event due at or before `now`, skipping cancelled timers.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<TimerEvent> {
        while let Some(Reverse((when, id))) = self.queue.peek().copied() {
            if when > now {
                return None;
            }
            self.queue.pop();
            if let Some(event) = self.pending.remove(&id) {
                return Some(event);
            }
            // cancelled; keep draining
        }
        None
    }

    /// The instant of the earliest live timer, if any.
    pub fn next_deadline(&mut self) -> Option<Timestamp> {
        while let Some(Reverse((when, id))) = self.queue.peek().copied() {
            if self.pending.contains_key(&id) {
                return Some(when);
            }
            self.queue.pop();
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(n: u64) -> PitToken {
        PitToken::from_raw(n)
    }

    #[test]
    fn fires_in_time_order() {
        let mut sched = Scheduler::new();
        let now = Timestamp::ZERO;
        sched.schedule(now, Duration::from_millis(20), TimerEvent::PitExpiry(token(2)));
        sched.schedule(now, Duration::from_millis(10), TimerEvent::PitExpiry(token(1)));

        assert_eq!(sched.pop_due(now), None);
        let later = now + Duration::from_millis(30);
        assert_eq!(sched.pop_due(later), Some(TimerEvent::PitExpiry(token(1))));
        assert_eq!(sched.pop_due(later), Some(TimerEvent::PitExpiry(token(2))));
        assert_eq!(sched.pop_due(later), None);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut sched = Scheduler::new();
        let now = Timestamp::ZERO;
        let h = sched.schedule(now, Duration::from_millis(5), TimerEvent::PitExpiry(token(1)));
        sched.cancel(h);
        sched.cancel(h);
        assert_eq!(sched.pop_due(now + Duration::from_millis(10)), None);
        assert!(sched.is_empty());
    }

    #[test]
    fn rearm_results_in_single_firing() {
        let mut sched = Scheduler::new();
        let now = Timestamp::ZERO;
        let h1 = sched.schedule(now, Duration::from_millis(5), TimerEvent::PitExpiry(token(1)));
        sched.cancel(h1);
        let _h2 = sched.schedule(now, Duration::from_millis(5), TimerEvent::PitExpiry(token(1)));

        let later = now + Duration::from_millis(10);
        assert_eq!(sched.pop_due(later), Some(TimerEvent::PitExpiry(token(1))));
        assert_eq!(sched.pop_due(later), None);
    }

    #[test]
    fn next_deadline_skips_cancelled() {
        let mut sched = Scheduler::new();
        let now = Timestamp::ZERO;
        let h = sched.schedule(now, Duration::from_millis(1), TimerEvent::PitExpiry(token(1)));
        sched.schedule(now, Duration::from_millis(9), TimerEvent::PitExpiry(token(2)));
        sched.cancel(h);
        assert_eq!(sched.next_deadline(), Some(now + Duration::from_millis(9)));
    }
}

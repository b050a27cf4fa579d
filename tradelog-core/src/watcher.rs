//! ChangeWatcher: debounce over subtree-mutation notifications.
//!
//! State machine:
//!   Idle --observe(added)--> Armed(deadline)
//!   Armed --observe(added)--> Armed(now + delay)   (re-arm, implicit cancel)
//!   Armed --poll(now >= deadline)--> Idle           (fires exactly once)
//!
//! `observe` never triggers work itself; the owner runs the scan after `poll`
//! reports a fire, so a scan never runs inside a mutation callback.

use std::time::{Duration, Instant};

use crate::document::MutationRecord;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    Armed { deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct ChangeWatcher {
    delay: Duration,
    state: DebounceState,
    fired: u64,
}

impl ChangeWatcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: DebounceState::Idle,
            fired: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Feed one batch of mutation records. Returns true if the timer is (re)armed.
    pub fn observe(&mut self, records: &[MutationRecord], now: Instant) -> bool {
        if !records.iter().any(|r| r.added_nodes > 0) {
            return false;
        }
        self.state = DebounceState::Armed {
            deadline: now + self.delay,
        };
        true
    }

    /// True exactly once per armed period, once `now` reaches the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Armed { deadline } if now >= deadline => {
                self.state = DebounceState::Idle;
                self.fired += 1;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Idle => None,
            DebounceState::Armed { deadline } => Some(deadline),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline().is_some()
    }

    /// How many times the timer has fired.
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl Default for ChangeWatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn removal_only_batches_do_not_arm() {
        let mut w = ChangeWatcher::default();
        let now = Instant::now();
        assert!(!w.observe(&[MutationRecord::removed(3)], now));
        assert!(!w.observe(&[], now));
        assert!(!w.is_armed());
        assert!(!w.poll(now + 10 * DEFAULT_DEBOUNCE));
    }

    #[test]
    fn burst_collapses_into_one_trailing_fire() {
        let mut w = ChangeWatcher::default();
        let t0 = Instant::now();

        // Ten batches, 50ms apart: each lands inside the 200ms window.
        let mut last = t0;
        for i in 0..10u32 {
            last = t0 + 50 * MS * i;
            assert!(w.observe(&[MutationRecord::removed(1), MutationRecord::added(2)], last));
            assert!(!w.poll(last));
        }

        assert_eq!(w.deadline(), Some(last + DEFAULT_DEBOUNCE));
        assert!(!w.poll(last + 199 * MS));
        assert!(w.poll(last + 200 * MS));
        assert!(!w.poll(last + 400 * MS));
        assert_eq!(w.fired(), 1);
    }

    #[test]
    fn separate_bursts_fire_separately() {
        let mut w = ChangeWatcher::new(Duration::from_millis(100));
        let t0 = Instant::now();
        w.observe(&[MutationRecord::added(1)], t0);
        assert!(w.poll(t0 + 100 * MS));
        w.observe(&[MutationRecord::added(1)], t0 + 500 * MS);
        assert!(w.poll(t0 + 650 * MS));
        assert_eq!(w.fired(), 2);
        assert!(!w.is_armed());
    }
}

//! Monotonic virtual clock with absolute-deadline timers.
//!
//! Time is measured in nanoseconds of emulated time. Timers are one-shot; a
//! periodic device re-arms itself from its own callback.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Owner of a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerId {
    /// Display controller scanline timer
    Lcd,
}

#[derive(Debug, Default)]
pub struct VirtualClock {
    now: u64,
    pending: BinaryHeap<Reverse<(u64, TimerId)>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current emulated time in nanoseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Arm `id` to fire at absolute time `at`
    pub fn schedule(&mut self, id: TimerId, at: u64) {
        self.pending.push(Reverse((at, id)));
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.peek().map(|Reverse((at, _))| *at)
    }

    /// Pop the earliest timer due at or before `until`, moving `now` to its
    /// deadline. Deadlines already in the past fire at the current time.
    pub fn pop_due(&mut self, until: u64) -> Option<(u64, TimerId)> {
        match self.pending.peek() {
            Some(Reverse((at, _))) if *at <= until => {}
            _ => return None,
        }
        let Reverse((at, id)) = self.pending.pop()?;
        self.now = self.now.max(at);
        Some((at, id))
    }

    /// Move `now` forward to `until` once every due timer has been handled
    pub fn finish_at(&mut self, until: u64) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut clock = VirtualClock::new();
        clock.schedule(TimerId::Lcd, 300);
        clock.schedule(TimerId::Lcd, 100);

        assert_eq!(clock.pop_due(50), None);
        assert_eq!(clock.pop_due(1_000), Some((100, TimerId::Lcd)));
        assert_eq!(clock.now(), 100);
        assert_eq!(clock.pop_due(1_000), Some((300, TimerId::Lcd)));
        assert_eq!(clock.pop_due(1_000), None);

        clock.finish_at(1_000);
        assert_eq!(clock.now(), 1_000);
    }

    #[test]
    fn time_never_goes_backwards() {
        let mut clock = VirtualClock::new();
        clock.finish_at(500);
        clock.schedule(TimerId::Lcd, 200);

        assert_eq!(clock.pop_due(600), Some((200, TimerId::Lcd)));
        assert_eq!(clock.now(), 500);

        clock.finish_at(100);
        assert_eq!(clock.now(), 500);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Fixed-capacity timer table
//!
//! Slots are either free or pending. `set_timeout` takes the lowest free
//! index, which is also the handle returned to script code. The drain loop
//! lives in [`Context::run_timers`](crate::runtime::Context::run_timers) and
//! pulls work out of the table one [`TimerPoll`] at a time.

use crate::error::{NativeError, Result};
use crate::value::Callable;
use std::sync::Arc;
use std::time::Duration;

/// Slot count used when no capacity is configured
pub const DEFAULT_TIMER_CAPACITY: usize = 16;

/// Handle of a pending timer (its slot index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub usize);

/// A pending slot's payload
#[derive(Debug)]
struct PendingTimer {
    callback: Arc<Callable>,
    deadline_ms: u64,
}

/// What the drain loop should do next
#[derive(Debug)]
pub enum TimerPoll {
    /// Nothing is pending
    Idle,
    /// The earliest timer is due after this long
    Wait(Duration),
    /// This timer is due; its slot is already free
    Fire {
        /// Handle the timer was scheduled under
        id: TimerId,
        /// Callback to invoke with no arguments
        callback: Arc<Callable>,
    },
}

/// Pending-timer table owned by one [`Context`](crate::runtime::Context)
#[derive(Debug)]
pub struct TimerScheduler {
    slots: Vec<Option<PendingTimer>>,
}

impl TimerScheduler {
    /// Create a table with [`DEFAULT_TIMER_CAPACITY`] slots
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TIMER_CAPACITY)
    }

    /// Create a table with `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of pending timers
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check if a handle refers to a pending timer
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.slots.get(id.0).is_some_and(Option::is_some)
    }

    /// Absolute deadline of a pending timer
    pub fn deadline_ms(&self, id: TimerId) -> Option<u64> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|timer| timer.deadline_ms)
    }

    /// Store a callback in the first free slot; negative delays count as 0
    pub fn set_timeout(
        &mut self,
        callback: Arc<Callable>,
        delay_ms: i64,
        now_ms: u64,
    ) -> Result<TimerId> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(NativeError::TooManyTimers)?;

        let delay = u64::try_from(delay_ms).unwrap_or(0);
        let deadline_ms = now_ms.saturating_add(delay);
        self.slots[index] = Some(PendingTimer {
            callback,
            deadline_ms,
        });

        tracing::trace!(timer = index, deadline_ms, "timer scheduled");
        Ok(TimerId(index))
    }

    /// Free a slot; unknown or already free handles are ignored
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        let cleared = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .is_some();
        if cleared {
            tracing::trace!(timer = id.0, "timer cleared");
        }
        cleared
    }

    /// One full scan of the table.
    ///
    /// Picks the pending timer with the smallest remaining delay, lowest index
    /// first among equals. A due timer is removed from the table before it is
    /// handed back, so its callback can reuse the slot.
    pub fn poll(&mut self, now_ms: u64) -> TimerPoll {
        let mut next: Option<(usize, u64)> = None;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(timer) = slot else {
                continue;
            };
            let remaining = timer.deadline_ms.saturating_sub(now_ms);
            if next.is_none_or(|(_, best)| remaining < best) {
                next = Some((index, remaining));
            }
        }

        match next {
            None => TimerPoll::Idle,
            Some((index, 0)) => match self.slots[index].take() {
                Some(timer) => TimerPoll::Fire {
                    id: TimerId(index),
                    callback: timer.callback,
                },
                None => TimerPoll::Idle,
            },
            Some((_, remaining)) => TimerPoll::Wait(Duration::from_millis(remaining)),
        }
    }
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn callback(name: &str) -> Arc<Callable> {
        Arc::new(Callable::native(name, |_cx, _args| Ok(Value::Undefined)))
    }

    fn fired(poll: TimerPoll) -> Option<TimerId> {
        match poll {
            TimerPoll::Fire { id, .. } => Some(id),
            _ => None,
        }
    }

    #[test]
    fn test_first_free_slot_and_capacity() {
        let mut timers = TimerScheduler::with_capacity(3);
        assert_eq!(timers.set_timeout(callback("a"), 10, 0).unwrap(), TimerId(0));
        assert_eq!(timers.set_timeout(callback("b"), 10, 0).unwrap(), TimerId(1));
        assert_eq!(timers.set_timeout(callback("c"), 10, 0).unwrap(), TimerId(2));
        assert!(matches!(
            timers.set_timeout(callback("d"), 10, 0),
            Err(NativeError::TooManyTimers)
        ));

        assert!(timers.clear_timeout(TimerId(1)));
        assert_eq!(timers.set_timeout(callback("e"), 10, 0).unwrap(), TimerId(1));
        assert_eq!(timers.pending(), 3);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut timers = TimerScheduler::new();
        assert!(!timers.clear_timeout(TimerId(0)));
        assert!(!timers.clear_timeout(TimerId(999)));

        let id = timers.set_timeout(callback("a"), 0, 0).unwrap();
        assert!(timers.clear_timeout(id));
        assert!(!timers.clear_timeout(id));
        assert!(!timers.is_pending(id));
    }

    #[test]
    fn test_negative_delay_is_zero() {
        let mut timers = TimerScheduler::new();
        let id = timers.set_timeout(callback("a"), -50, 100).unwrap();
        assert_eq!(timers.deadline_ms(id), Some(100));
    }

    #[test]
    fn test_poll_waits_for_earliest() {
        let mut timers = TimerScheduler::new();
        timers.set_timeout(callback("slow"), 50, 0).unwrap();
        timers.set_timeout(callback("fast"), 10, 0).unwrap();

        assert!(matches!(timers.poll(0), TimerPoll::Wait(d) if d == Duration::from_millis(10)));
        assert_eq!(fired(timers.poll(10)), Some(TimerId(1)));
        assert!(matches!(timers.poll(10), TimerPoll::Wait(d) if d == Duration::from_millis(40)));
        assert_eq!(fired(timers.poll(50)), Some(TimerId(0)));
        assert!(matches!(timers.poll(50), TimerPoll::Idle));
    }

    #[test]
    fn test_poll_fires_one_per_scan_lowest_index_first() {
        let mut timers = TimerScheduler::new();
        timers.set_timeout(callback("a"), 5, 0).unwrap();
        timers.set_timeout(callback("b"), 1, 0).unwrap();
        timers.set_timeout(callback("c"), 5, 0).unwrap();

        // All overdue: each has remaining delay 0, so index order decides
        assert_eq!(fired(timers.poll(100)), Some(TimerId(0)));
        assert_eq!(timers.pending(), 2);
        assert_eq!(fired(timers.poll(100)), Some(TimerId(1)));
        assert_eq!(fired(timers.poll(100)), Some(TimerId(2)));
    }

    #[test]
    fn test_fired_slot_is_free_before_callback() {
        let mut timers = TimerScheduler::with_capacity(1);
        timers.set_timeout(callback("a"), 0, 0).unwrap();
        assert!(matches!(timers.poll(0), TimerPoll::Fire { .. }));
        assert_eq!(timers.set_timeout(callback("b"), 0, 0).unwrap(), TimerId(0));
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delayed task scheduling.
//!
//! Retry backoff and batch debounce windows schedule work through the
//! [`Scheduler`] trait so tests can fire timers deterministically.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A deferred task. Runs at most once.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Schedules a task to run after a delay
pub trait Scheduler: Clone + Send + Sync + 'static {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Handle to a scheduled task. Once cancelled the task never runs.
///
/// Dropping the handle does not cancel the task.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Scheduler backed by tokio timers; must be used inside a runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let handle = TimerHandle::new();
        let token = handle.token();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if !token.is_cancelled() {
                        task();
                    }
                }
            }
        });
        handle
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod manual {
    use super::{Scheduler, Task, TimerHandle};
    use crate::clock::{Clock, FakeClock};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct Timer {
        seq: u64,
        deadline: Instant,
        handle: TimerHandle,
        task: Task,
    }

    #[derive(Default)]
    struct ManualState {
        timers: Vec<Timer>,
        next_seq: u64,
    }

    /// Scheduler that only fires when the test advances its clock.
    #[derive(Clone)]
    pub struct ManualScheduler {
        clock: FakeClock,
        inner: Arc<Mutex<ManualState>>,
    }

    impl ManualScheduler {
        pub fn new(clock: FakeClock) -> Self {
            Self { clock, inner: Arc::new(Mutex::new(ManualState::default())) }
        }

        pub fn clock(&self) -> &FakeClock {
            &self.clock
        }

        /// Number of timers that are scheduled and not cancelled
        pub fn pending(&self) -> usize {
            self.inner.lock().timers.iter().filter(|t| !t.handle.is_cancelled()).count()
        }

        pub fn has_timers(&self) -> bool {
            self.pending() > 0
        }

        /// Earliest deadline among live timers
        pub fn next_deadline(&self) -> Option<Instant> {
            self.inner
                .lock()
                .timers
                .iter()
                .filter(|t| !t.handle.is_cancelled())
                .map(|t| t.deadline)
                .min()
        }

        /// Advance the clock and run every task that has come due, in
        /// deadline order. Returns how many tasks ran.
        pub fn advance(&self, duration: Duration) -> usize {
            self.clock.advance(duration);
            self.fire_due()
        }

        /// Run every task whose deadline is at or before the current time.
        pub fn fire_due(&self) -> usize {
            let mut fired = 0;
            // Tasks may schedule more timers, so pop one at a time
            while let Some(timer) = self.pop_due() {
                if !timer.handle.is_cancelled() {
                    (timer.task)();
                    fired += 1;
                }
            }
            fired
        }

        fn pop_due(&self) -> Option<Timer> {
            let now = self.clock.now();
            let mut state = self.inner.lock();
            state.timers.retain(|t| !t.handle.is_cancelled());
            let index = state
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.deadline <= now)
                .min_by_key(|(_, t)| (t.deadline, t.seq))
                .map(|(i, _)| i)?;
            Some(state.timers.remove(index))
        }
    }

    impl Scheduler for ManualScheduler {
        fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
            let handle = TimerHandle::new();
            let mut state = self.inner.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.timers.push(Timer {
                seq,
                deadline: self.clock.now() + delay,
                handle: handle.clone(),
                task,
            });
            handle
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use manual::ManualScheduler;

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit breaker state machine.
//!
//! ```text
//! CLOSED --(failures >= threshold)--> OPEN
//! OPEN --(queried at/after next_attempt)--> HALF_OPEN
//! HALF_OPEN --(trial succeeds)--> CLOSED
//! HALF_OPEN --(trial fails)--> OPEN
//! ```
//!
//! The breaker owns no timer: the OPEN to HALF_OPEN transition happens when
//! [`CircuitBreaker::can_execute`] is queried after the cool-down.

use parking_lot::Mutex;
use relay_core::{Clock, InvokeError, Observable, Outcome, SystemClock};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerPhase {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

relay_core::simple_display! {
    BreakerPhase {
        Closed => "closed",
        Open => "open",
        HalfOpen => "half_open",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive counted failures that open the breaker
    pub failure_threshold: u32,
    /// Cool-down before a trial call is admitted
    pub reset_timeout_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, reset_timeout_ms: 60_000 }
    }
}

impl BreakerConfig {
    relay_core::setters! {
        set { failure_threshold: u32, reset_timeout_ms: u64 }
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitBreakerState {
    pub phase: BreakerPhase,
    pub failure_count: u32,
    pub last_failure: Option<Instant>,
    /// Earliest time an OPEN breaker admits a trial
    pub next_attempt: Option<Instant>,
    /// A HALF_OPEN trial call is running
    pub trial_in_flight: bool,
}

#[derive(Debug, Default)]
struct BreakerInner {
    state: CircuitBreakerState,
    /// Bumped on every phase change and reset
    generation: u64,
}

/// Short-circuits calls to an operation that keeps failing.
///
/// Clones share state, so one breaker can guard calls issued from many tasks.
/// Outcomes of calls admitted before the latest phase change are ignored.
#[derive(Debug, Clone)]
pub struct CircuitBreaker<C = SystemClock> {
    config: BreakerConfig,
    clock: C,
    inner: Arc<Mutex<BreakerInner>>,
    phase: Observable<BreakerPhase>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn with_clock(config: BreakerConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            inner: Arc::new(Mutex::new(BreakerInner::default())),
            phase: Observable::new(BreakerPhase::Closed),
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn phase(&self) -> &Observable<BreakerPhase> {
        &self.phase
    }

    pub fn snapshot(&self) -> CircuitBreakerState {
        self.inner.lock().state.clone()
    }

    /// Whether a call would be admitted right now.
    ///
    /// Querying an OPEN breaker whose cool-down has elapsed moves it to
    /// HALF_OPEN. A HALF_OPEN breaker reports false while its trial runs.
    pub fn can_execute(&self) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.poll_cooldown(&mut inner, now);
        match inner.state.phase {
            BreakerPhase::Closed => true,
            BreakerPhase::Open => false,
            BreakerPhase::HalfOpen => !inner.state.trial_in_flight,
        }
    }

    /// Run `operation` if the breaker admits it, and record its outcome.
    ///
    /// A rejected call fails with `CircuitOpen` and never runs `operation`.
    /// `CircuitOpen` and `Cancelled` failures returned by `operation` are not
    /// counted. Dropping the returned future before it settles gives the
    /// HALF_OPEN trial slot back without recording anything.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let admission = self.admit()?;
        let outcome = operation().await;
        admission.record(&outcome);
        outcome
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        self.on_success(&mut inner);
    }

    pub fn record_failure(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.on_failure(&mut inner, now);
    }

    /// Force CLOSED with all counters cleared
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let previous = inner.state.phase;
        inner.state = CircuitBreakerState::default();
        inner.generation += 1;
        if previous != BreakerPhase::Closed {
            tracing::info!(from = %previous, "circuit breaker reset");
        }
        self.phase.set(BreakerPhase::Closed);
    }

    /// Claim admission for one call, reserving the trial slot when HALF_OPEN.
    fn admit(&self) -> Result<Admission<'_, C>, InvokeError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        self.poll_cooldown(&mut inner, now);
        let trial = match inner.state.phase {
            BreakerPhase::Closed => false,
            BreakerPhase::HalfOpen if !inner.state.trial_in_flight => {
                inner.state.trial_in_flight = true;
                true
            }
            BreakerPhase::HalfOpen => {
                return Err(InvokeError::CircuitOpen { retry_in: Duration::ZERO })
            }
            BreakerPhase::Open => {
                let retry_in = inner
                    .state
                    .next_attempt
                    .map(|at| at.saturating_duration_since(now))
                    .unwrap_or_default();
                tracing::debug!(retry_in_ms = retry_in.as_millis() as u64, "call rejected");
                return Err(InvokeError::CircuitOpen { retry_in });
            }
        };
        Ok(Admission { breaker: self, generation: inner.generation, trial, settled: false })
    }

    fn on_success(&self, inner: &mut BreakerInner) {
        inner.state.trial_in_flight = false;
        inner.state.failure_count = 0;
        inner.state.next_attempt = None;
        self.transition(inner, BreakerPhase::Closed);
    }

    fn on_failure(&self, inner: &mut BreakerInner, now: Instant) {
        let state = &mut inner.state;
        state.trial_in_flight = false;
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure = Some(now);
        let trip = match state.phase {
            BreakerPhase::HalfOpen => true,
            BreakerPhase::Closed => state.failure_count >= self.config.failure_threshold,
            BreakerPhase::Open => false,
        };
        if trip {
            state.next_attempt = Some(now + self.config.reset_timeout());
            tracing::warn!(
                failure_count = state.failure_count,
                reset_timeout_ms = self.config.reset_timeout_ms,
                "circuit breaker opened"
            );
            self.transition(inner, BreakerPhase::Open);
        }
    }

    fn poll_cooldown(&self, inner: &mut BreakerInner, now: Instant) {
        if inner.state.phase != BreakerPhase::Open {
            return;
        }
        let elapsed = match inner.state.next_attempt {
            Some(at) => now >= at,
            None => true,
        };
        if elapsed {
            self.transition(inner, BreakerPhase::HalfOpen);
        }
    }

    fn transition(&self, inner: &mut BreakerInner, to: BreakerPhase) {
        if inner.state.phase == to {
            return;
        }
        tracing::info!(from = %inner.state.phase, to = %to, "circuit breaker transition");
        inner.state.phase = to;
        inner.generation += 1;
        self.phase.set(to);
    }
}

/// One admitted call, stamped with the phase generation it was admitted in.
///
/// Dropped before [`Admission::record`], it releases the trial slot it holds.
struct Admission<'a, C: Clock> {
    breaker: &'a CircuitBreaker<C>,
    generation: u64,
    trial: bool,
    settled: bool,
}

impl<C: Clock> Admission<'_, C> {
    fn record<T>(mut self, outcome: &Outcome<T>) {
        self.settled = true;
        let breaker = self.breaker;
        let now = breaker.clock.now();
        let mut inner = breaker.inner.lock();
        if inner.generation != self.generation {
            tracing::debug!(
                admitted = self.generation,
                current = inner.generation,
                "ignoring outcome from an earlier breaker phase"
            );
            return;
        }
        match outcome {
            Ok(_) => breaker.on_success(&mut inner),
            Err(error) if error.counts_as_failure() => breaker.on_failure(&mut inner, now),
            Err(_) if self.trial => inner.state.trial_in_flight = false,
            Err(_) => {}
        }
    }
}

impl<C: Clock> Drop for Admission<'_, C> {
    fn drop(&mut self) {
        if self.settled || !self.trial {
            return;
        }
        let mut inner = self.breaker.inner.lock();
        if inner.generation == self.generation {
            tracing::debug!("trial call dropped, releasing slot");
            inner.state.trial_in_flight = false;
        }
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;

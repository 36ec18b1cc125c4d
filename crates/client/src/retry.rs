// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry with exponential backoff and jitter.
//!
//! Delay before retry `i` (0-based) is `min(base * 2^i + jitter, cap)` with
//! jitter uniform in `[0, jitter_ms)`. Retries are scheduled through a
//! [`Scheduler`] and can be cancelled while waiting.

use parking_lot::Mutex;
use rand::Rng;
use relay_core::{Clock, InvokeError, Observable, Outcome, Scheduler, TimerHandle};
use relay_core::{TokioClock, TokioScheduler};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `max_retries + 1`
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub cap_ms: u64,
    /// Upper bound (exclusive) of the random jitter; 0 disables it
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 1000, cap_ms: 30_000, jitter_ms: 1000 }
    }
}

impl RetryPolicy {
    relay_core::setters! {
        set { max_retries: u32, base_delay_ms: u64, cap_ms: u64, jitter_ms: u64 }
    }

    /// Exponential delay for retry `index`, capped, without jitter
    pub fn backoff(&self, index: u32) -> Duration {
        let exp = 2u64.checked_pow(index).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(exp).min(self.cap_ms))
    }

    /// Delay before retry `index`, including jitter
    pub fn delay_for(&self, index: u32) -> Duration {
        let jitter =
            if self.jitter_ms == 0 { 0 } else { rand::thread_rng().gen_range(0..self.jitter_ms) };
        let exp = 2u64.checked_pow(index).unwrap_or(u64::MAX);
        let raw = self.base_delay_ms.saturating_mul(exp).saturating_add(jitter);
        Duration::from_millis(raw.min(self.cap_ms))
    }
}

/// Presentation status of a retried call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStatus {
    Idle,
    InFlight,
    Retrying,
    Failed,
    Succeeded,
}

relay_core::simple_display! {
    RetryStatus {
        Idle => "idle",
        InFlight => "in-flight",
        Retrying => "retrying",
        Failed => "failed",
        Succeeded => "succeeded",
    }
}

/// Snapshot of the current retry session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySession {
    pub attempt: u32,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub scheduled_wake: Option<Instant>,
}

#[derive(Default)]
struct SessionSlot {
    token: Option<CancellationToken>,
    timer: Option<TimerHandle>,
    wake_at: Option<Instant>,
}

impl SessionSlot {
    fn clear(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.wake_at = None;
    }
}

/// Runs an operation, retrying transient failures with backoff.
///
/// One session is active per controller: starting a new `execute` cancels a
/// previous one that is still waiting on its retry timer.
#[derive(Clone)]
pub struct RetryController<S = TokioScheduler, C = TokioClock> {
    policy: RetryPolicy,
    scheduler: S,
    clock: C,
    attempt: Observable<u32>,
    status: Observable<RetryStatus>,
    slot: Arc<Mutex<SessionSlot>>,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_scheduler(policy, TokioScheduler, TokioClock)
    }
}

impl<S: Scheduler, C: Clock> RetryController<S, C> {
    pub fn with_scheduler(policy: RetryPolicy, scheduler: S, clock: C) -> Self {
        Self {
            policy,
            scheduler,
            clock,
            attempt: Observable::new(0),
            status: Observable::new(RetryStatus::Idle),
            slot: Arc::new(Mutex::new(SessionSlot::default())),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Retries performed so far in the current session
    pub fn attempt(&self) -> &Observable<u32> {
        &self.attempt
    }

    pub fn status(&self) -> &Observable<RetryStatus> {
        &self.status
    }

    /// Time left until the scheduled retry fires
    pub fn remaining(&self) -> Option<Duration> {
        let wake_at = self.slot.lock().wake_at?;
        Some(wake_at.saturating_duration_since(self.clock.now()))
    }

    pub fn session(&self) -> RetrySession {
        RetrySession {
            attempt: self.attempt.get(),
            max_retries: self.policy.max_retries,
            base_delay: Duration::from_millis(self.policy.base_delay_ms),
            scheduled_wake: self.slot.lock().wake_at,
        }
    }

    /// Drop any scheduled retry and reset the attempt counter.
    ///
    /// A session waiting on its timer resolves to `Cancelled`. An attempt that
    /// is already in flight finishes and returns its own outcome, without
    /// further retries. No-op when nothing is running.
    pub fn cancel(&self) {
        let active = {
            let mut slot = self.slot.lock();
            let active = slot.token.is_some();
            slot.clear();
            active
        };
        if active {
            tracing::debug!("retry session cancelled");
            self.attempt.set(0);
            self.status.set(RetryStatus::Idle);
        }
    }

    /// Run `operation`, retrying retryable failures until it succeeds or the
    /// retry budget is spent.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Outcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        let token = self.begin_session();
        loop {
            self.status.set(RetryStatus::InFlight);
            let outcome = operation().await;
            if token.is_cancelled() {
                // Superseded or cancelled mid-flight; state belongs to someone else now
                return outcome;
            }
            let error = match outcome {
                Ok(value) => {
                    self.end_session(&token);
                    self.attempt.set(0);
                    self.status.set(RetryStatus::Succeeded);
                    return Ok(value);
                }
                Err(error) => error,
            };

            let attempt = self.attempt.get();
            if !error.is_retryable() {
                tracing::info!(error = %error, attempt, "failure is not retryable");
                return self.fail(&token, error);
            }
            if attempt >= self.policy.max_retries {
                tracing::info!(error = %error, attempt, "retries exhausted");
                return self.fail(&token, error);
            }

            let delay = self.policy.delay_for(attempt);
            self.attempt.set(attempt + 1);
            let wake = self.schedule_wake(delay);
            self.status.set(RetryStatus::Retrying);
            tracing::warn!(
                error = %error,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "operation failed, retry scheduled"
            );

            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(InvokeError::Cancelled),
                woke = wake => {
                    if woke.is_err() {
                        return Err(InvokeError::Cancelled);
                    }
                }
            }
            if !token.is_cancelled() {
                let mut slot = self.slot.lock();
                slot.timer = None;
                slot.wake_at = None;
            }
        }
    }

    fn begin_session(&self) -> CancellationToken {
        let token = CancellationToken::new();
        {
            let mut slot = self.slot.lock();
            slot.clear();
            slot.token = Some(token.clone());
        }
        self.attempt.set(0);
        token
    }

    fn end_session(&self, token: &CancellationToken) {
        let mut slot = self.slot.lock();
        // Leave a newer session's slot alone
        if !token.is_cancelled() {
            slot.token = None;
            slot.timer = None;
            slot.wake_at = None;
        }
    }

    fn fail<T>(&self, token: &CancellationToken, error: InvokeError) -> Outcome<T> {
        self.end_session(token);
        self.status.set(RetryStatus::Failed);
        Err(error)
    }

    fn schedule_wake(&self, delay: Duration) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let timer = self.scheduler.schedule(
            delay,
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        let mut slot = self.slot.lock();
        slot.timer = Some(timer);
        slot.wake_at = Some(self.clock.now() + delay);
        rx
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;

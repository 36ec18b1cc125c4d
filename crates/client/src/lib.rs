// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-client: resilience layers around remote operation calls
//!
//! Each layer works on its own and composes through [`ResilientClient`]:
//! TTL cache, circuit breaker, retry with backoff, then the invocation
//! client over a transport adapter. Grouped calls go through the
//! [`BatchCoalescer`] instead.

pub mod batch;
pub mod breaker;
pub mod cache;
pub mod config;
pub mod events;
pub mod invocation;
pub mod resilient;
pub mod retry;

pub use batch::{BatchCoalescer, BatchConfig, BatchHandle};
pub use breaker::{BreakerConfig, BreakerPhase, CircuitBreaker, CircuitBreakerState};
pub use cache::{CacheConfig, CacheEntry, TtlCache, DEFAULT_TTL};
pub use config::{ConfigError, ResilienceConfig};
pub use events::{emit, EventListener};
pub use invocation::{Invocation, InvocationClient, InvocationState};
pub use resilient::ResilientClient;
pub use retry::{RetryController, RetryPolicy, RetrySession, RetryStatus};

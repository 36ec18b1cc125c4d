//! Shared helpers for the specs.

#![allow(dead_code, unused_imports)]

pub use relay_adapters::{FakeBatchAdapter, FakeInvokeAdapter, GroupedInvokeAdapter};
pub use relay_client::*;
pub use relay_core::{args, FakeClock, InvokeError, ManualScheduler, Outcome};
pub use serde::{Deserialize, Serialize};
pub use serde_json::json;
pub use std::time::Duration;

/// Install a log subscriber honoring `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

pub fn user(id: u64, name: &str) -> serde_json::Value {
    json!({ "id": id, "name": name })
}

/// Retry policy with deterministic delays
pub fn fixed_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::default().max_retries(max_retries).base_delay_ms(1000).jitter_ms(0)
}

/// Scheduler and clock that only move when the test says so
pub fn manual_time() -> (ManualScheduler, FakeClock) {
    let clock = FakeClock::new();
    (ManualScheduler::new(clock.clone()), clock)
}

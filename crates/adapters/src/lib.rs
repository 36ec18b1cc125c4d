// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the transports Relay sits on top of

pub mod batch;
pub mod event;
pub mod invoke;

pub use batch::{BatchAdapter, GroupedInvokeAdapter, DEFAULT_BATCH_COMMAND};
pub use event::{EventAdapter, EventSubscription, LocalEventBus};
pub use invoke::{FnInvokeAdapter, InvokeAdapter};

// Test support exports
#[cfg(any(test, feature = "test-support"))]
pub use batch::FakeBatchAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use invoke::FakeInvokeAdapter;

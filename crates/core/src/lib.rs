// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-core: shared types for the Relay remote-invocation client

pub mod macros;

pub mod clock;
pub mod error;
pub mod observable;
pub mod request;
pub mod timer;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[doc(hidden)]
pub use serde_json as __serde_json;

pub use clock::{Clock, FakeClock, SystemClock, TokioClock};
pub use error::{ErrorKind, InvokeError};
pub use observable::Observable;
pub use request::{Arguments, OperationRequest, Outcome};
#[cfg(any(test, feature = "test-support"))]
pub use timer::ManualScheduler;
pub use timer::{Scheduler, Task, TimerHandle, TokioScheduler};

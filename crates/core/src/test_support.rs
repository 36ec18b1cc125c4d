// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Arguments, OperationRequest};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for error and request types.
pub mod strategies {
    use crate::InvokeError;
    use proptest::prelude::*;
    use std::time::Duration;

    pub fn arb_invoke_error() -> impl Strategy<Value = InvokeError> {
        let message = "[a-z ]{0,16}";
        prop_oneof![
            message.prop_map(InvokeError::TransportUnavailable),
            message.prop_map(InvokeError::OperationNotFound),
            message.prop_map(InvokeError::OperationFailed),
            message.prop_map(InvokeError::InvalidArgument),
            (0u64..120_000).prop_map(|ms| InvokeError::CircuitOpen {
                retry_in: Duration::from_millis(ms)
            }),
            message.prop_map(InvokeError::Usage),
            Just(InvokeError::Cancelled),
        ]
    }

    /// Failures a retry controller will schedule another attempt for
    pub fn arb_transient_error() -> impl Strategy<Value = InvokeError> {
        prop_oneof![
            "[a-z]{1,12}".prop_map(InvokeError::OperationFailed),
            "[a-z]{1,12}".prop_map(InvokeError::TransportUnavailable),
        ]
        .prop_filter("permission failures are not transient", |e| !e.is_permission_denied())
    }
}

// ── Request factory functions ───────────────────────────────────────────────

/// Build a request, panicking on an invalid name. Test use only.
#[allow(clippy::expect_used)]
pub fn request(name: &str, arguments: Arguments) -> OperationRequest {
    OperationRequest::new(name, arguments).expect("test request name must be non-empty")
}

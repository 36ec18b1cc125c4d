// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    transport       = { InvokeError::TransportUnavailable("no ipc".into()),      true },
    failed          = { InvokeError::failed("db locked"),                        true },
    permission      = { InvokeError::failed("Permission denied: fs.write"),      false },
    unauthorized    = { InvokeError::TransportUnavailable("UNAUTHORIZED".into()), false },
    not_found       = { InvokeError::OperationNotFound("get_user".into()),       false },
    invalid         = { InvokeError::InvalidArgument("empty name".into()),       false },
    circuit_open    = { InvokeError::CircuitOpen { retry_in: Duration::ZERO },  false },
    usage           = { InvokeError::Usage("refresh before execute".into()),     false },
    cancelled       = { InvokeError::Cancelled,                                  false },
)]
fn retryable_classification(error: InvokeError, expected: bool) {
    assert_eq!(error.is_retryable(), expected);
}

#[test]
fn permission_match_ignores_case() {
    assert!(InvokeError::failed("User is Unauthorized").is_permission_denied());
    assert!(!InvokeError::failed("timeout").is_permission_denied());
}

#[yare::parameterized(
    failed       = { InvokeError::failed("boom"),                                true },
    transport    = { InvokeError::TransportUnavailable("no ipc".into()),         true },
    not_found    = { InvokeError::OperationNotFound("get_user".into()),          true },
    circuit_open = { InvokeError::CircuitOpen { retry_in: Duration::from_secs(1) }, false },
    cancelled    = { InvokeError::Cancelled,                                     false },
)]
fn breaker_failure_classification(error: InvokeError, expected: bool) {
    assert_eq!(error.counts_as_failure(), expected);
}

#[test]
fn message_strips_kind_prefix() {
    let error = InvokeError::failed("disk full");
    assert_eq!(error.message(), "disk full");
    assert_eq!(error.to_string(), "operation failed: disk full");
}

#[yare::parameterized(
    transport = { ErrorKind::TransportUnavailable, "\"transport_unavailable\"" },
    circuit   = { ErrorKind::CircuitOpen,          "\"circuit_open\"" },
    usage     = { ErrorKind::Usage,                "\"usage\"" },
)]
fn error_kind_serializes_snake_case(kind: ErrorKind, json: &str) {
    assert_eq!(serde_json::to_string(&kind).unwrap(), json);
    assert_eq!(format!("\"{kind}\""), json);
}

#[test]
fn circuit_open_display_reports_remaining_cooldown() {
    let error = InvokeError::CircuitOpen { retry_in: Duration::from_millis(1500) };
    assert_eq!(error.kind(), ErrorKind::CircuitOpen);
    assert_eq!(error.to_string(), "circuit open: next attempt in 1500ms");
}

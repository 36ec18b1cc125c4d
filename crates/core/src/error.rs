// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by every layer of the client stack.
//!
//! Failures are values: lower layers hand them back as settled outcomes and
//! never unwind across an await point.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single operation attempt or of a wrapper around it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// The host environment has no usable transport.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),
    /// The remote side has no operation registered under this name.
    #[error("operation not found: {0}")]
    OperationNotFound(String),
    /// The remote side ran the operation and reported a failure.
    #[error("operation failed: {0}")]
    OperationFailed(String),
    /// Malformed call, e.g. an empty operation name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Rejected by a circuit breaker without reaching the operation.
    #[error("circuit open: next attempt in {}ms", retry_in.as_millis())]
    CircuitOpen { retry_in: Duration },
    /// API misuse, e.g. refreshing before the first execute.
    #[error("usage error: {0}")]
    Usage(String),
    /// A scheduled retry or pending batch was cancelled before it settled.
    #[error("cancelled")]
    Cancelled,
}

/// Serializable discriminant of [`InvokeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TransportUnavailable,
    OperationNotFound,
    OperationFailed,
    InvalidArgument,
    CircuitOpen,
    Usage,
    Cancelled,
}

crate::simple_display! {
    ErrorKind {
        TransportUnavailable => "transport_unavailable",
        OperationNotFound => "operation_not_found",
        OperationFailed => "operation_failed",
        InvalidArgument => "invalid_argument",
        CircuitOpen => "circuit_open",
        Usage => "usage",
        Cancelled => "cancelled",
    }
}

impl InvokeError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::OperationFailed(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TransportUnavailable(_) => ErrorKind::TransportUnavailable,
            Self::OperationNotFound(_) => ErrorKind::OperationNotFound,
            Self::OperationFailed(_) => ErrorKind::OperationFailed,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            Self::Usage(_) => ErrorKind::Usage,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The human-readable part of the failure, without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Self::TransportUnavailable(m)
            | Self::OperationNotFound(m)
            | Self::OperationFailed(m)
            | Self::InvalidArgument(m)
            | Self::Usage(m) => m.clone(),
            Self::CircuitOpen { .. } | Self::Cancelled => self.to_string(),
        }
    }

    /// True when the message mentions `permission` or `unauthorized`.
    pub fn is_permission_denied(&self) -> bool {
        let message = self.message().to_lowercase();
        message.contains("permission") || message.contains("unauthorized")
    }

    /// Only transient transport and remote failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransportUnavailable(_) | Self::OperationFailed(_) => {
                !self.is_permission_denied()
            }
            Self::OperationNotFound(_)
            | Self::InvalidArgument(_)
            | Self::CircuitOpen { .. }
            | Self::Usage(_)
            | Self::Cancelled => false,
        }
    }

    /// Whether this failure should count against a circuit breaker.
    ///
    /// Rejections and cancellations say nothing about the remote side.
    pub fn counts_as_failure(&self) -> bool {
        !matches!(self, Self::CircuitOpen { .. } | Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

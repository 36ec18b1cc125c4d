// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote invocation transport

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use relay_core::{OperationRequest, Outcome};
use serde_json::Value;
use std::sync::Arc;

/// Adapter for invoking a named operation on the remote side
#[async_trait]
pub trait InvokeAdapter: Clone + Send + Sync + 'static {
    /// Run one operation and return its raw JSON result
    async fn invoke(&self, request: &OperationRequest) -> Outcome<Value>;
}

type InvokeFn = dyn Fn(OperationRequest) -> BoxFuture<'static, Outcome<Value>> + Send + Sync;

/// Adapter over a host-supplied invoke function.
///
/// ```ignore
/// let adapter = FnInvokeAdapter::new(|request| Box::pin(async move {
///     bridge.call(request.name(), request.arguments()).await
/// }));
/// ```
#[derive(Clone)]
pub struct FnInvokeAdapter {
    invoke: Arc<InvokeFn>,
}

impl FnInvokeAdapter {
    pub fn new<F>(invoke: F) -> Self
    where
        F: Fn(OperationRequest) -> BoxFuture<'static, Outcome<Value>> + Send + Sync + 'static,
    {
        Self { invoke: Arc::new(invoke) }
    }
}

#[async_trait]
impl InvokeAdapter for FnInvokeAdapter {
    async fn invoke(&self, request: &OperationRequest) -> Outcome<Value> {
        tracing::trace!(operation = request.name(), "invoking host transport");
        (self.invoke)(request.clone()).await
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::InvokeAdapter;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use relay_core::{InvokeError, OperationRequest, Outcome};
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use std::time::Duration;

    /// One scripted response, optionally delivered after a delay
    struct Scripted {
        delay: Duration,
        outcome: Outcome<Value>,
    }

    #[derive(Default)]
    struct FakeInvokeState {
        calls: Vec<OperationRequest>,
        queued: HashMap<String, VecDeque<Scripted>>,
        sticky: HashMap<String, Outcome<Value>>,
        unavailable: bool,
    }

    /// Fake invoke adapter for testing.
    ///
    /// Queued responses are consumed first, then the sticky response for the
    /// operation. Operations with neither fail with `OperationNotFound`.
    #[derive(Clone, Default)]
    pub struct FakeInvokeAdapter {
        inner: Arc<Mutex<FakeInvokeState>>,
    }

    impl FakeInvokeAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Always succeed with `value` for `name`
        pub fn respond(&self, name: &str, value: Value) {
            self.inner.lock().sticky.insert(name.to_string(), Ok(value));
        }

        /// Always fail with `error` for `name`
        pub fn fail(&self, name: &str, error: InvokeError) {
            self.inner.lock().sticky.insert(name.to_string(), Err(error));
        }

        /// Queue a one-shot outcome for the next call to `name`
        pub fn enqueue(&self, name: &str, outcome: Outcome<Value>) {
            self.enqueue_delayed(name, Duration::ZERO, outcome);
        }

        /// Queue a one-shot outcome delivered after `delay`
        pub fn enqueue_delayed(&self, name: &str, delay: Duration, outcome: Outcome<Value>) {
            self.inner
                .lock()
                .queued
                .entry(name.to_string())
                .or_default()
                .push_back(Scripted { delay, outcome });
        }

        /// Simulate a host without a transport
        pub fn set_unavailable(&self, unavailable: bool) {
            self.inner.lock().unavailable = unavailable;
        }

        /// Get all recorded requests
        pub fn calls(&self) -> Vec<OperationRequest> {
            self.inner.lock().calls.clone()
        }

        pub fn call_count(&self, name: &str) -> usize {
            self.inner.lock().calls.iter().filter(|c| c.name() == name).count()
        }
    }

    #[async_trait]
    impl InvokeAdapter for FakeInvokeAdapter {
        async fn invoke(&self, request: &OperationRequest) -> Outcome<Value> {
            let scripted = {
                let mut state = self.inner.lock();
                state.calls.push(request.clone());
                if state.unavailable {
                    return Err(InvokeError::TransportUnavailable("no transport in host".into()));
                }
                let queued = state.queued.get_mut(request.name()).and_then(|q| q.pop_front());
                match queued {
                    Some(scripted) => scripted,
                    None => Scripted {
                        delay: Duration::ZERO,
                        outcome: state.sticky.get(request.name()).cloned().unwrap_or_else(|| {
                            Err(InvokeError::OperationNotFound(request.name().to_string()))
                        }),
                    },
                }
            };
            if !scripted.delay.is_zero() {
                tokio::time::sleep(scripted.delay).await;
            }
            scripted.outcome
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeInvokeAdapter;

#[cfg(test)]
#[path = "invoke_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invocation client: one named operation exposed as observable state.

use parking_lot::Mutex;
use relay_adapters::InvokeAdapter;
use relay_core::{Arguments, InvokeError, Observable, OperationRequest, Outcome};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// A call already dispatched to the transport.
///
/// Resolves to the call's own outcome even when a newer call has superseded
/// it in the observable state. Dropping it detaches the call, which still
/// settles `pending`.
pub struct Invocation<T> {
    task: JoinHandle<Outcome<T>>,
}

impl<T> Future for Invocation<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx).map(|joined| {
            joined.unwrap_or_else(|e| Err(InvokeError::failed(format!("invocation task: {e}"))))
        })
    }
}

/// Point-in-time copy of a client's observable state
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationState<T> {
    pub data: Option<T>,
    pub pending: bool,
    pub error: Option<InvokeError>,
}

struct ClientState<T> {
    data: Observable<Option<T>>,
    pending: Observable<bool>,
    error: Observable<Option<InvokeError>>,
    /// Sequence number of the most recently issued call
    latest: AtomicU64,
    last_request: Mutex<Option<OperationRequest>>,
}

impl<T> ClientState<T> {
    fn settle(&self, seq: u64, request: &OperationRequest, outcome: &Outcome<T>)
    where
        T: Clone,
    {
        if self.latest.load(Ordering::SeqCst) != seq {
            tracing::debug!(operation = request.name(), seq, "discarding superseded response");
            return;
        }
        match outcome {
            Ok(value) => self.data.set(Some(value.clone())),
            Err(e) => {
                tracing::debug!(operation = request.name(), error = %e, "invocation failed");
                self.error.set(Some(e.clone()));
            }
        }
        self.pending.set(false);
    }
}

/// Runs named operations through an [`InvokeAdapter`] and publishes
/// `data`/`pending`/`error` for observers.
///
/// Only the most recently issued call writes to the observables; a slower
/// response from an older call is dropped. Failures leave `data` untouched,
/// so stale data and a fresh error can be visible together.
pub struct InvocationClient<T, A> {
    adapter: A,
    state: Arc<ClientState<T>>,
}

impl<T, A: Clone> Clone for InvocationClient<T, A> {
    fn clone(&self) -> Self {
        Self { adapter: self.adapter.clone(), state: Arc::clone(&self.state) }
    }
}

impl<T, A> InvocationClient<T, A>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    A: InvokeAdapter,
{
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            state: Arc::new(ClientState {
                data: Observable::new(None),
                pending: Observable::new(false),
                error: Observable::new(None),
                latest: AtomicU64::new(0),
                last_request: Mutex::new(None),
            }),
        }
    }

    /// Start a call. `pending` is already true when this returns, and the
    /// request is on its way to the transport. Must be called inside a tokio
    /// runtime.
    ///
    /// A blank name fails here with `InvalidArgument`; every other failure
    /// arrives through the returned future and the `error` observable.
    pub fn execute(
        &self,
        name: impl Into<String>,
        arguments: Arguments,
    ) -> Result<Invocation<T>, InvokeError> {
        let request = OperationRequest::new(name, arguments)?;
        Ok(self.execute_request(request))
    }

    /// Re-run the last request with the same name and arguments
    pub fn refresh(&self) -> Result<Invocation<T>, InvokeError> {
        let request = self.state.last_request.lock().clone().ok_or_else(|| {
            InvokeError::Usage("refresh called before any execute".to_string())
        })?;
        Ok(self.execute_request(request))
    }

    pub fn execute_request(&self, request: OperationRequest) -> Invocation<T> {
        let seq = self.state.latest.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.last_request.lock() = Some(request.clone());
        self.state.pending.set(true);
        self.state.error.set(None);

        let adapter = self.adapter.clone();
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let outcome = adapter.invoke(&request).await.and_then(decode::<T>);
            state.settle(seq, &request, &outcome);
            outcome
        });
        Invocation { task }
    }

    pub fn data(&self) -> &Observable<Option<T>> {
        &self.state.data
    }

    pub fn pending(&self) -> &Observable<bool> {
        &self.state.pending
    }

    pub fn error(&self) -> &Observable<Option<InvokeError>> {
        &self.state.error
    }

    pub fn last_request(&self) -> Option<OperationRequest> {
        self.state.last_request.lock().clone()
    }

    pub fn snapshot(&self) -> InvocationState<T> {
        InvocationState {
            data: self.state.data.get(),
            pending: self.state.pending.get(),
            error: self.state.error.get(),
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Outcome<T> {
    serde_json::from_value(value)
        .map_err(|e| InvokeError::OperationFailed(format!("unexpected response shape: {e}")))
}

#[cfg(test)]
#[path = "invocation_tests.rs"]
mod tests;

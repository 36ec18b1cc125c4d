// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch coalescer: operations added within one debounce window travel in a
//! single grouped transport call.
//!
//! Every add restarts the window timer. When it finally fires, the window's
//! items are swapped out under the lock and dispatched in submission order;
//! the i-th result settles the i-th handle.

use crate::invocation::decode;
use parking_lot::Mutex;
use relay_adapters::{BatchAdapter, DEFAULT_BATCH_COMMAND};
use relay_core::{Arguments, InvokeError, OperationRequest, Outcome};
use relay_core::{Scheduler, TimerHandle, TokioScheduler};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub debounce_ms: u64,
    /// Flush as soon as a window holds this many items
    pub max_batch_size: Option<usize>,
    /// Command used when grouping over a plain invoke transport
    pub command: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 50, max_batch_size: None, command: DEFAULT_BATCH_COMMAND.to_string() }
    }
}

impl BatchConfig {
    relay_core::setters! {
        set { debounce_ms: u64 }
        into { command: String }
        option { max_batch_size: usize }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Deferred result of one coalesced operation.
///
/// Resolves to `Cancelled` if its batch was dropped before settling.
#[derive(Debug)]
pub struct BatchHandle {
    rx: oneshot::Receiver<Outcome<Value>>,
}

impl BatchHandle {
    /// Await the result and decode it into `T`
    pub async fn into_typed<T: DeserializeOwned>(self) -> Outcome<T> {
        decode(self.await?)
    }
}

impl Future for BatchHandle {
    type Output = Outcome<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|r| r.unwrap_or_else(|_| Err(InvokeError::Cancelled)))
    }
}

struct PendingItem {
    request: OperationRequest,
    tx: oneshot::Sender<Outcome<Value>>,
}

#[derive(Default)]
struct BatchWindow {
    items: Vec<PendingItem>,
    timer: Option<TimerHandle>,
    /// Bumped on every add and flush; a timer only flushes its own generation
    generation: u64,
}

impl BatchWindow {
    fn take(&mut self) -> Vec<PendingItem> {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.generation += 1;
        std::mem::take(&mut self.items)
    }
}

/// Collects operations into debounced groups for a [`BatchAdapter`].
///
/// Clones share the same window.
#[derive(Clone)]
pub struct BatchCoalescer<B, S = TokioScheduler> {
    adapter: B,
    scheduler: S,
    config: BatchConfig,
    window: Arc<Mutex<BatchWindow>>,
}

impl<B: BatchAdapter> BatchCoalescer<B> {
    pub fn new(adapter: B, config: BatchConfig) -> Self {
        Self::with_scheduler(adapter, config, TokioScheduler)
    }
}

impl<B: BatchAdapter, S: Scheduler> BatchCoalescer<B, S> {
    pub fn with_scheduler(adapter: B, config: BatchConfig, scheduler: S) -> Self {
        Self { adapter, scheduler, config, window: Arc::new(Mutex::new(BatchWindow::default())) }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Items waiting in the current window
    pub fn pending_len(&self) -> usize {
        self.window.lock().items.len()
    }

    /// Queue an operation for the current window.
    ///
    /// Dispatch is spawned on the tokio runtime, so flushing requires one.
    pub fn add_operation(
        &self,
        name: impl Into<String>,
        arguments: Arguments,
    ) -> Result<BatchHandle, InvokeError> {
        let request = OperationRequest::new(name, arguments)?;
        let (tx, rx) = oneshot::channel();

        let full = {
            let mut window = self.window.lock();
            window.items.push(PendingItem { request, tx });
            let len = window.items.len();
            if self.config.max_batch_size.is_some_and(|max| len >= max) {
                Some(window.take())
            } else {
                if let Some(timer) = window.timer.take() {
                    timer.cancel();
                }
                window.generation += 1;
                let generation = window.generation;
                let this = self.clone();
                window.timer = Some(self.scheduler.schedule(
                    self.config.debounce(),
                    Box::new(move || this.flush_generation(generation)),
                ));
                None
            }
        };

        if let Some(items) = full {
            tracing::debug!(size = items.len(), "batch full, flushing early");
            self.dispatch(items);
        }
        Ok(BatchHandle { rx })
    }

    /// Flush the current window without waiting for the timer.
    /// Returns how many operations were dispatched.
    pub fn flush_now(&self) -> usize {
        let items = self.window.lock().take();
        let len = items.len();
        self.dispatch(items);
        len
    }

    fn flush_generation(&self, generation: u64) {
        let items = {
            let mut window = self.window.lock();
            if window.generation != generation {
                return;
            }
            window.timer = None;
            window.take()
        };
        self.dispatch(items);
    }

    fn dispatch(&self, items: Vec<PendingItem>) {
        if items.is_empty() {
            return;
        }
        let adapter = self.adapter.clone();
        tokio::spawn(run_batch(adapter, items));
    }
}

async fn run_batch<B: BatchAdapter>(adapter: B, items: Vec<PendingItem>) {
    let (requests, senders): (Vec<_>, Vec<_>) =
        items.into_iter().map(|item| (item.request, item.tx)).unzip();
    tracing::info!(size = requests.len(), "flushing batch");

    let failure = match adapter.invoke_batch(&requests).await {
        Ok(results) if results.len() == requests.len() => {
            for (tx, result) in senders.into_iter().zip(results) {
                let _ = tx.send(result);
            }
            return;
        }
        Ok(results) => InvokeError::failed(format!(
            "batch returned {} results for {} operations",
            results.len(),
            requests.len()
        )),
        Err(InvokeError::OperationFailed(message)) => InvokeError::OperationFailed(message),
        Err(other) => InvokeError::OperationFailed(other.to_string()),
    };

    tracing::warn!(size = requests.len(), error = %failure, "batch failed");
    for tx in senders {
        let _ = tx.send(Err(failure.clone()));
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;

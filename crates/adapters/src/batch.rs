// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Grouped transport: many operations in one round trip

use crate::invoke::InvokeAdapter;
use async_trait::async_trait;
use relay_core::{Arguments, InvokeError, OperationRequest, Outcome};
use serde::Deserialize;
use serde_json::{json, Value};

/// Command the grouped adapter invokes when none is configured
pub const DEFAULT_BATCH_COMMAND: &str = "batch_execute";

/// Adapter that executes an ordered group of operations in one call.
///
/// On success the returned vector holds one outcome per request, in request
/// order. An `Err` fails the whole group.
#[async_trait]
pub trait BatchAdapter: Clone + Send + Sync + 'static {
    async fn invoke_batch(&self, requests: &[OperationRequest]) -> Outcome<Vec<Outcome<Value>>>;
}

/// Per-item outcome as it appears in a grouped response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ItemOutcome {
    Ok(Value),
    Err(String),
}

/// [`BatchAdapter`] that sends the whole group through one invocation of a
/// single command on an [`InvokeAdapter`].
///
/// The command receives `{"operations": [{"name", "arguments"}, ...]}` and must
/// answer with an array. Elements shaped `{"ok": v}` / `{"err": msg}` carry
/// their own outcome; any other element is that item's success value.
#[derive(Clone)]
pub struct GroupedInvokeAdapter<A> {
    inner: A,
    command: String,
}

impl<A: InvokeAdapter> GroupedInvokeAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self::with_command(inner, DEFAULT_BATCH_COMMAND)
    }

    pub fn with_command(inner: A, command: impl Into<String>) -> Self {
        Self { inner, command: command.into() }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl<A: InvokeAdapter> BatchAdapter for GroupedInvokeAdapter<A> {
    async fn invoke_batch(&self, requests: &[OperationRequest]) -> Outcome<Vec<Outcome<Value>>> {
        let mut arguments = Arguments::new();
        arguments.insert("operations".to_string(), json!(requests));
        let grouped = OperationRequest::new(self.command.clone(), arguments)?;

        let response = self.inner.invoke(&grouped).await?;
        let Value::Array(items) = response else {
            return Err(InvokeError::failed(format!(
                "{} returned a non-array response",
                self.command
            )));
        };
        Ok(items.into_iter().map(decode_item).collect())
    }
}

fn decode_item(item: Value) -> Outcome<Value> {
    let tagged = matches!(&item, Value::Object(map) if map.len() == 1
        && (map.contains_key("ok") || map.contains_key("err")));
    if !tagged {
        return Ok(item);
    }
    match serde_json::from_value::<ItemOutcome>(item.clone()) {
        Ok(ItemOutcome::Ok(value)) => Ok(value),
        Ok(ItemOutcome::Err(message)) => Err(InvokeError::OperationFailed(message)),
        // {"err": <non-string>} and friends are plain values
        Err(_) => Ok(item),
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::BatchAdapter;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use relay_core::{InvokeError, OperationRequest, Outcome};
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeBatchState {
        batches: Vec<Vec<OperationRequest>>,
        scripted: VecDeque<Outcome<Vec<Outcome<Value>>>>,
    }

    /// Fake grouped transport.
    ///
    /// Scripted responses are consumed in order. Without one, every item
    /// succeeds with `{"name": ..., "arguments": ...}` echoed back.
    #[derive(Clone, Default)]
    pub struct FakeBatchAdapter {
        inner: Arc<Mutex<FakeBatchState>>,
    }

    impl FakeBatchAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn enqueue(&self, response: Outcome<Vec<Outcome<Value>>>) {
            self.inner.lock().scripted.push_back(response);
        }

        pub fn fail_next(&self, error: InvokeError) {
            self.enqueue(Err(error));
        }

        /// Get every grouped call received, in order
        pub fn batches(&self) -> Vec<Vec<OperationRequest>> {
            self.inner.lock().batches.clone()
        }
    }

    #[async_trait]
    impl BatchAdapter for FakeBatchAdapter {
        async fn invoke_batch(
            &self,
            requests: &[OperationRequest],
        ) -> Outcome<Vec<Outcome<Value>>> {
            let mut state = self.inner.lock();
            state.batches.push(requests.to_vec());
            match state.scripted.pop_front() {
                Some(response) => response,
                None => Ok(requests
                    .iter()
                    .map(|r| Ok(serde_json::json!({ "name": r.name(), "arguments": r.arguments() })))
                    .collect()),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBatchAdapter;

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;

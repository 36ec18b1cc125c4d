// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event listener: forwards a transport event stream into an observable.

use relay_adapters::{EventAdapter, EventSubscription};
use relay_core::{InvokeError, Observable, Outcome};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Latest decoded payload of one named event.
///
/// Forwarding stops on [`unlisten`](Self::unlisten), on drop, or when the
/// transport closes the subscription.
pub struct EventListener<T> {
    event: String,
    payload: Observable<Option<T>>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl<T> EventListener<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Subscribe to `event` and start forwarding its payloads.
    pub async fn listen<A: EventAdapter>(adapter: &A, event: &str) -> Outcome<Self> {
        let subscription = adapter.subscribe(event).await?;
        let payload = Observable::new(None);
        let token = CancellationToken::new();
        let task = tokio::spawn(forward(subscription, payload.clone(), token.clone()));
        tracing::debug!(event, "listening");
        Ok(Self { event: event.to_string(), payload, token, task })
    }
}

impl<T> EventListener<T> {
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn payload(&self) -> &Observable<Option<T>> {
        &self.payload
    }

    pub fn latest(&self) -> Option<T>
    where
        T: Clone,
    {
        self.payload.get()
    }

    pub fn is_listening(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }

    /// Stop forwarding. Idempotent; the last payload stays readable.
    pub fn unlisten(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!(event = %self.event, "unlistening");
            self.token.cancel();
        }
    }
}

impl<T> Drop for EventListener<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn forward<T: DeserializeOwned>(
    mut subscription: EventSubscription,
    payload: Observable<Option<T>>,
    token: CancellationToken,
) {
    loop {
        let value = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            value = subscription.recv() => match value {
                Some(value) => value,
                None => break,
            },
        };
        match serde_json::from_value::<T>(value) {
            Ok(decoded) => payload.set(Some(decoded)),
            Err(e) => {
                tracing::warn!(event = subscription.event(), error = %e, "skipping undecodable payload")
            }
        }
    }
    subscription.unsubscribe();
}

/// Serialize `payload` and publish it under `event`.
pub async fn emit<A, P>(adapter: &A, event: &str, payload: &P) -> Outcome<()>
where
    A: EventAdapter,
    P: Serialize + ?Sized,
{
    let value = serde_json::to_value(payload)
        .map_err(|e| InvokeError::InvalidArgument(format!("payload is not serializable: {e}")))?;
    adapter.publish(event, value).await
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;

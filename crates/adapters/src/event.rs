// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event transport: named publish/subscribe of JSON payloads

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{InvokeError, Outcome};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Adapter for subscribing to and publishing named events
#[async_trait]
pub trait EventAdapter: Clone + Send + Sync + 'static {
    /// Start receiving payloads published under `event`
    async fn subscribe(&self, event: &str) -> Outcome<EventSubscription>;

    /// Deliver `payload` to every current subscriber of `event`
    async fn publish(&self, event: &str, payload: Value) -> Outcome<()>;
}

/// Stream of payloads for one event. Dropping it unsubscribes.
#[derive(Debug)]
pub struct EventSubscription {
    event: String,
    rx: mpsc::UnboundedReceiver<Value>,
}

impl EventSubscription {
    pub fn new(event: impl Into<String>, rx: mpsc::UnboundedReceiver<Value>) -> Self {
        Self { event: event.into(), rx }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Next payload, or `None` once the transport closed the subscription
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }

    /// Stop receiving; payloads already delivered can still be drained
    pub fn unsubscribe(&mut self) {
        self.rx.close();
    }
}

/// In-process event bus.
///
/// Subscribers whose [`EventSubscription`] was dropped are pruned on the
/// next publish to that event.
#[derive(Clone, Default)]
pub struct LocalEventBus {
    subscribers: Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live subscribers of `event`
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.subscribers
            .lock()
            .get(event)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventAdapter for LocalEventBus {
    async fn subscribe(&self, event: &str) -> Outcome<EventSubscription> {
        if event.trim().is_empty() {
            return Err(InvokeError::InvalidArgument("event name must not be empty".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().entry(event.to_string()).or_default().push(tx);
        tracing::debug!(event, "subscribed");
        Ok(EventSubscription::new(event, rx))
    }

    async fn publish(&self, event: &str, payload: Value) -> Outcome<()> {
        let mut subscribers = self.subscribers.lock();
        let Some(subs) = subscribers.get_mut(event) else {
            return Ok(());
        };
        subs.retain(|tx| tx.send(payload.clone()).is_ok());
        if subs.is_empty() {
            subscribers.remove(event);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[tokio::test]
async fn publish_reaches_every_subscriber() {
    let bus = LocalEventBus::new();
    let mut a = bus.subscribe("download-progress").await.unwrap();
    let mut b = bus.subscribe("download-progress").await.unwrap();
    assert_eq!(bus.subscriber_count("download-progress"), 2);

    bus.publish("download-progress", json!({ "percent": 40 })).await.unwrap();

    assert_eq!(a.recv().await, Some(json!({ "percent": 40 })));
    assert_eq!(b.recv().await, Some(json!({ "percent": 40 })));
    assert_eq!(a.event(), "download-progress");
}

#[tokio::test]
async fn publish_without_subscribers_is_ok() {
    let bus = LocalEventBus::new();
    bus.publish("nobody", json!(null)).await.unwrap();
    assert_eq!(bus.subscriber_count("nobody"), 0);
}

#[tokio::test]
async fn dropped_subscription_is_pruned() {
    let bus = LocalEventBus::new();
    let sub = bus.subscribe("tick").await.unwrap();
    let mut kept = bus.subscribe("tick").await.unwrap();
    drop(sub);
    assert_eq!(bus.subscriber_count("tick"), 1);

    bus.publish("tick", json!(1)).await.unwrap();
    assert_eq!(kept.recv().await, Some(json!(1)));
}

#[tokio::test]
async fn unsubscribe_stops_new_payloads() {
    let bus = LocalEventBus::new();
    let mut sub = bus.subscribe("tick").await.unwrap();
    bus.publish("tick", json!(1)).await.unwrap();
    sub.unsubscribe();
    bus.publish("tick", json!(2)).await.unwrap();

    assert_eq!(sub.recv().await, Some(json!(1)));
    assert_eq!(sub.recv().await, None);
}

#[tokio::test]
async fn empty_event_name_is_rejected() {
    let bus = LocalEventBus::new();
    let err = bus.subscribe("").await.unwrap_err();
    assert!(matches!(err, InvokeError::InvalidArgument(_)));
}

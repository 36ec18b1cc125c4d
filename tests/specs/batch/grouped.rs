//! Batch coalescer specs
//!
//! Coalesced operations travel as one `batch_execute` call and each handle
//! settles with the result at its own position.

use crate::prelude::*;

fn coalescer(
    transport: &FakeInvokeAdapter,
) -> (BatchCoalescer<GroupedInvokeAdapter<FakeInvokeAdapter>, ManualScheduler>, ManualScheduler) {
    init_tracing();
    let (scheduler, _) = manual_time();
    let grouped = GroupedInvokeAdapter::new(transport.clone());
    (BatchCoalescer::with_scheduler(grouped, BatchConfig::default(), scheduler.clone()), scheduler)
}

#[tokio::test]
async fn three_operations_within_ten_ms_share_one_call() {
    let transport = FakeInvokeAdapter::new();
    transport.respond("batch_execute", json!([{ "ok": 1 }, { "err": "no such user" }, 3]));
    let (batch, scheduler) = coalescer(&transport);

    let first = batch.add_operation("get_user", args! { "id" => 1 }).unwrap();
    scheduler.advance(Duration::from_millis(4));
    let second = batch.add_operation("get_user", args! { "id" => 2 }).unwrap();
    scheduler.advance(Duration::from_millis(6));
    let third = batch.add_operation("count_users", args! {}).unwrap();
    scheduler.advance(Duration::from_millis(50));

    assert_eq!(first.await, Ok(json!(1)));
    assert_eq!(second.await, Err(InvokeError::failed("no such user")));
    assert_eq!(third.await, Ok(json!(3)));

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    similar_asserts::assert_eq!(
        calls[0].arguments()["operations"],
        json!([
            { "name": "get_user", "arguments": { "id": 1 } },
            { "name": "get_user", "arguments": { "id": 2 } },
            { "name": "count_users", "arguments": {} },
        ])
    );
}

#[tokio::test]
async fn rejected_group_fails_every_caller_alike() {
    let transport = FakeInvokeAdapter::new();
    transport.fail("batch_execute", InvokeError::failed("gateway timeout"));
    let (batch, scheduler) = coalescer(&transport);

    let handles: Vec<_> = (1..=3)
        .map(|id| batch.add_operation("get_user", args! { "id" => id }).unwrap())
        .collect();
    scheduler.advance(Duration::from_millis(50));

    for handle in handles {
        assert_eq!(handle.await, Err(InvokeError::failed("gateway timeout")));
    }
    assert_eq!(transport.call_count("batch_execute"), 1);
}

#[tokio::test]
async fn non_array_response_fails_the_group() {
    let transport = FakeInvokeAdapter::new();
    transport.respond("batch_execute", json!({ "unexpected": true }));
    let (batch, scheduler) = coalescer(&transport);

    let handle = batch.add_operation("get_user", args! {}).unwrap();
    scheduler.advance(Duration::from_millis(50));
    assert!(matches!(handle.await, Err(InvokeError::OperationFailed(_))));
}

#[tokio::test]
async fn typed_results_decode_per_item() {
    let transport = FakeInvokeAdapter::new();
    transport.respond("batch_execute", json!([{ "ok": { "id": 1, "name": "ada" } }]));
    let (batch, scheduler) = coalescer(&transport);

    let handle = batch.add_operation("get_user", args! { "id" => 1 }).unwrap();
    scheduler.advance(Duration::from_millis(50));
    let user: User = handle.into_typed().await.unwrap();
    assert_eq!(user, User { id: 1, name: "ada".into() });
}

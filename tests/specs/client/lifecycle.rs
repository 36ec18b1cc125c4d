//! Invocation client lifecycle specs
//!
//! pending/data/error move together: pending rises before the first
//! suspension and falls with exactly one of data or error updated.

use crate::prelude::*;

fn client() -> (InvocationClient<User, FakeInvokeAdapter>, FakeInvokeAdapter) {
    init_tracing();
    let adapter = FakeInvokeAdapter::new();
    (InvocationClient::new(adapter.clone()), adapter)
}

#[tokio::test]
async fn success_settles_data_and_clears_pending() {
    let (client, adapter) = client();
    adapter.respond("get_user", user(1, "ada"));

    let call = client.execute("get_user", args! { "id" => 1 }).unwrap();
    assert!(client.pending().get());

    call.await.unwrap();
    similar_asserts::assert_eq!(
        client.snapshot(),
        InvocationState { data: Some(User { id: 1, name: "ada".into() }), pending: false, error: None }
    );
}

#[tokio::test]
async fn failure_settles_error_and_keeps_data() {
    let (client, adapter) = client();
    adapter.enqueue("get_user", Ok(user(1, "ada")));
    adapter.enqueue("get_user", Err(InvokeError::OperationNotFound("get_user".into())));

    client.execute("get_user", args! { "id" => 1 }).unwrap().await.unwrap();
    let mut pending = client.pending().subscribe();
    let _ = client.refresh().unwrap().await;

    assert!(pending.has_changed().unwrap());
    let state = client.snapshot();
    assert!(!state.pending);
    assert_eq!(state.error, Some(InvokeError::OperationNotFound("get_user".into())));
    assert_eq!(state.data.map(|u| u.id), Some(1));
}

#[tokio::test]
async fn misuse_is_reported_without_reaching_the_transport() {
    let (client, adapter) = client();
    assert!(matches!(client.refresh().err(), Some(InvokeError::Usage(_))));
    assert!(matches!(client.execute(" ", args! {}).err(), Some(InvokeError::InvalidArgument(_))));
    assert!(adapter.calls().is_empty());
    assert!(!client.pending().get());
}

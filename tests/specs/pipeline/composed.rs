//! Composed client specs
//!
//! Cache, breaker and retry layered over one transport, configured from TOML.

use crate::prelude::*;

const CONFIG: &str = r#"
[cache]
ttl_ms = 5000

[retry]
max_retries = 2
base_delay_ms = 100
jitter_ms = 0

[breaker]
failure_threshold = 2
reset_timeout_ms = 1000
"#;

fn client() -> (ResilientClient<User, FakeInvokeAdapter>, FakeInvokeAdapter) {
    init_tracing();
    let config = ResilienceConfig::from_toml_str(CONFIG).unwrap();
    config.validate().unwrap();
    let adapter = FakeInvokeAdapter::new();
    (ResilientClient::from_config(adapter.clone(), &config), adapter)
}

#[tokio::test(start_paused = true)]
async fn transient_failure_is_retried_then_cached() {
    let (client, adapter) = client();
    adapter.enqueue("get_user", Err(InvokeError::TransportUnavailable("reconnecting".into())));
    adapter.respond("get_user", user(1, "ada"));

    let started = tokio::time::Instant::now();
    let ada = client.call("get_user", args! { "id" => 1 }).await.unwrap();
    assert_eq!(ada.name, "ada");
    assert_eq!(started.elapsed(), Duration::from_millis(100));

    tokio::time::sleep(Duration::from_millis(4000)).await;
    client.call("get_user", args! { "id" => 1 }).await.unwrap();
    assert_eq!(adapter.call_count("get_user"), 2);

    tokio::time::sleep(Duration::from_millis(2000)).await;
    client.call("get_user", args! { "id" => 1 }).await.unwrap();
    assert_eq!(adapter.call_count("get_user"), 3);
    assert_eq!(client.data().get(), Some(User { id: 1, name: "ada".into() }));
}

#[tokio::test(start_paused = true)]
async fn persistent_outage_opens_the_breaker_then_recovers() {
    let (client, adapter) = client();
    adapter.fail("get_user", InvokeError::failed("database offline"));

    for _ in 0..2 {
        let err = client.call("get_user", args! { "id" => 2 }).await.unwrap_err();
        assert_eq!(err, InvokeError::failed("database offline"));
    }
    // Two calls, three attempts each
    assert_eq!(adapter.call_count("get_user"), 6);
    let breaker = client.breaker().unwrap();
    assert_eq!(breaker.phase().get(), BreakerPhase::Open);

    let rejected = client.call("get_user", args! { "id" => 2 }).await;
    assert!(matches!(rejected, Err(InvokeError::CircuitOpen { .. })));
    assert_eq!(adapter.call_count("get_user"), 6);
    assert_eq!(client.error().get(), Some(InvokeError::failed("database offline")));

    adapter.respond("get_user", user(2, "grace"));
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let grace = client.call("get_user", args! { "id" => 2 }).await.unwrap();
    assert_eq!(grace.name, "grace");
    assert_eq!(breaker.phase().get(), BreakerPhase::Closed);
    assert_eq!(client.error().get(), None);
}

#[tokio::test(start_paused = true)]
async fn invalidated_entry_is_fetched_again() {
    let (client, adapter) = client();
    adapter.enqueue("get_user", Ok(user(3, "lin")));
    adapter.enqueue("get_user", Ok(user(3, "lin-renamed")));

    client.call("get_user", args! { "id" => 3 }).await.unwrap();
    client.invalidate("get_user", args! { "id" => 3 }).unwrap();
    let renamed = client.call("get_user", args! { "id" => 3 }).await.unwrap();
    assert_eq!(renamed.name, "lin-renamed");
}

#[tokio::test(start_paused = true)]
async fn concurrent_calls_retry_independently() {
    let (client, adapter) = client();
    adapter.enqueue("get_user", Err(InvokeError::TransportUnavailable("reconnecting".into())));
    adapter.respond("get_user", user(1, "ada"));
    adapter.respond("get_owner", user(2, "grace"));

    let started = tokio::time::Instant::now();
    let (ada, grace) = tokio::join!(
        client.call("get_user", args! { "id" => 1 }),
        client.call("get_owner", args! { "id" => 2 }),
    );

    assert_eq!(ada.unwrap().name, "ada");
    assert_eq!(grace.unwrap().name, "grace");
    assert_eq!(started.elapsed(), Duration::from_millis(100));
    let breaker = client.breaker().unwrap();
    assert_eq!(breaker.phase().get(), BreakerPhase::Closed);
    assert_eq!(breaker.snapshot().failure_count, 0);
}

//! TTL cache specs

use crate::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn value_is_visible_until_ttl_elapses() {
    let clock = FakeClock::new();
    let cache: TtlCache<u32, _> = TtlCache::with_clock(clock.clone(), DEFAULT_TTL);

    cache.set_with_ttl("k", 7, Duration::from_millis(250));
    assert_eq!(cache.get("k"), Some(7));

    clock.advance(Duration::from_millis(250));
    assert_eq!(cache.get("k"), None);
}

#[tokio::test]
async fn get_user_is_memoized_for_its_ttl() {
    init_tracing();
    let clock = FakeClock::new();
    let cache: TtlCache<User, _> = TtlCache::with_clock(clock.clone(), DEFAULT_TTL);
    let adapter = FakeInvokeAdapter::new();
    adapter.respond("get_user", user(1, "ada"));
    let client: InvocationClient<User, _> = InvocationClient::new(adapter.clone());

    let request = relay_core::OperationRequest::new("get_user", args! { "id" => 1 }).unwrap();
    let key = request.cache_key();
    let produced = AtomicUsize::new(0);
    let fetch = || {
        produced.fetch_add(1, Ordering::SeqCst);
        client.execute_request(request.clone())
    };
    let ttl = Some(Duration::from_millis(5000));

    cache.get_or_compute(&key, ttl, fetch).await.unwrap();
    clock.advance(Duration::from_millis(4000));
    let hit = cache.get_or_compute(&key, ttl, fetch).await.unwrap();
    assert_eq!(hit.name, "ada");
    assert_eq!(produced.load(Ordering::SeqCst), 1);

    clock.advance(Duration::from_millis(2000));
    cache.get_or_compute(&key, ttl, fetch).await.unwrap();
    assert_eq!(produced.load(Ordering::SeqCst), 2);
    assert_eq!(adapter.call_count("get_user"), 2);
}

//! Circuit breaker specs

use crate::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[tokio::test]
async fn breaker_cycles_closed_open_half_open_closed() {
    init_tracing();
    let clock = FakeClock::new();
    let config = BreakerConfig::default().failure_threshold(3).reset_timeout_ms(60_000);
    let breaker = CircuitBreaker::with_clock(config, clock.clone());
    let calls = AtomicUsize::new(0);
    let failing = || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(InvokeError::failed("timeout")) }
    };

    for _ in 0..3 {
        let _ = breaker.execute(failing).await;
    }
    assert_eq!(breaker.phase().get(), BreakerPhase::Open);
    assert!(!breaker.can_execute());

    let rejected = breaker.execute(failing).await;
    assert!(matches!(rejected, Err(InvokeError::CircuitOpen { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    clock.advance(Duration::from_millis(60_000));
    assert!(breaker.can_execute());
    assert_eq!(breaker.phase().get(), BreakerPhase::HalfOpen);

    breaker.execute(|| async { Ok::<_, InvokeError>(()) }).await.unwrap();
    let state = breaker.snapshot();
    assert_eq!(state.phase, BreakerPhase::Closed);
    assert_eq!(state.failure_count, 0);
}

#[tokio::test]
async fn failed_trial_reopens() {
    let clock = FakeClock::new();
    let config = BreakerConfig::default().failure_threshold(3).reset_timeout_ms(60_000);
    let breaker = CircuitBreaker::with_clock(config, clock.clone());

    for _ in 0..3 {
        let _ = breaker.execute(|| async { Err::<(), _>(InvokeError::failed("timeout")) }).await;
    }
    clock.advance(Duration::from_millis(60_000));
    assert!(breaker.can_execute());

    let _ = breaker.execute(|| async { Err::<(), _>(InvokeError::failed("still down")) }).await;
    assert_eq!(breaker.phase().get(), BreakerPhase::Open);
    assert!(!breaker.can_execute());
}

//! Retry controller specs

use crate::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn permanent_failure_is_attempted_four_times() {
    init_tracing();
    let retry = RetryController::new(fixed_retry(3));
    let started = tokio::time::Instant::now();
    let mut seen = Vec::new();

    let outcome: Outcome<()> = retry
        .execute(|| {
            seen.push(started.elapsed());
            async { Err(InvokeError::failed("disk full")) }
        })
        .await;

    assert!(outcome.is_err());
    assert_eq!(seen.len(), 4);
    let delays: Vec<_> = seen.windows(2).map(|w| w[1] - w[0]).collect();
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(retry.status().get(), RetryStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn permission_failure_is_never_rescheduled() {
    let retry = RetryController::new(fixed_retry(3));
    let calls = AtomicUsize::new(0);

    let outcome: Outcome<()> = retry
        .execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(InvokeError::failed("unauthorized: token expired")) }
        })
        .await;

    assert!(outcome.unwrap_err().is_permission_denied());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(retry.remaining(), None);
}

#[tokio::test]
async fn cancelled_retry_never_fires() {
    let (scheduler, clock) = manual_time();
    let retry = RetryController::with_scheduler(fixed_retry(3), scheduler.clone(), clock);
    let calls = Arc::new(AtomicUsize::new(0));
    let mut status = retry.status().subscribe();

    let waiting = tokio::spawn({
        let retry = retry.clone();
        let calls = Arc::clone(&calls);
        async move {
            retry
                .execute(move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(InvokeError::failed("flaky")) }
                })
                .await
        }
    });
    status.wait_for(|s| *s == RetryStatus::Retrying).await.unwrap();
    assert_eq!(retry.remaining(), Some(Duration::from_millis(1000)));

    retry.cancel();
    assert_eq!(waiting.await.unwrap(), Err(InvokeError::Cancelled));
    assert_eq!(scheduler.advance(Duration::from_secs(10)), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(retry.attempt().get(), 0);
}

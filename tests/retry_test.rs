use event_vibe::retry::{execute, RetryConfig};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Fails with `message` for the first `failures` calls, then succeeds.
fn flaky(
    failures: u32,
    message: &'static str,
    calls: Arc<AtomicU32>,
) -> impl FnMut() -> std::future::Ready<Result<u32, String>> {
    move || {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= failures {
            std::future::ready(Err(message.to_string()))
        } else {
            std::future::ready(Ok(n))
        }
    }
}

#[tokio::test(start_paused = true)]
async fn succeeds_after_k_failures_with_k_plus_one_calls() {
    let config = RetryConfig::default();
    for k in 0..=config.max_retries {
        let calls = Arc::new(AtomicU32::new(0));
        let result = execute(&config, flaky(k, "HTTP 503: unavailable", calls.clone())).await;
        assert_eq!(result, Ok(k + 1));
        assert_eq!(calls.load(Ordering::SeqCst), k + 1);
    }
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_retries_plus_one() {
    let config = RetryConfig::default();
    let calls = Arc::new(AtomicU32::new(0));

    let result = execute(&config, flaky(10, "API error: 429 - Too many requests", calls.clone())).await;

    assert_eq!(result, Err("API error: 429 - Too many requests".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), config.max_retries + 1);
}

#[tokio::test(start_paused = true)]
async fn waits_follow_exponential_backoff() {
    let config = RetryConfig::default();
    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();

    let _ = execute(&config, flaky(10, "read ECONNRESET", calls)).await;

    // 1s + 2s + 4s before the second, third and fourth attempts.
    assert_eq!(started.elapsed(), Duration::from_millis(7000));
}

#[tokio::test(start_paused = true)]
async fn backoff_is_capped_at_max_delay() {
    let config = RetryConfig::default().max_retries(5);
    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();

    let _ = execute(&config, flaky(10, "HTTP 502: bad gateway", calls.clone())).await;

    // 1 + 2 + 4 + 8 + 10 (capped)
    assert_eq!(started.elapsed(), Duration::from_millis(25_000));
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[tokio::test(start_paused = true)]
async fn non_retryable_error_is_attempted_once() {
    let config = RetryConfig::default();
    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();

    let result = execute(&config, flaky(10, "API error: 400 - Bad request", calls.clone())).await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn credential_rejection_is_not_retried() {
    let config = RetryConfig::default();
    let calls = Arc::new(AtomicU32::new(0));

    let result = execute(
        &config,
        flaky(10, "HTTP 401: AI backend rejected the configured credential", calls.clone()),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

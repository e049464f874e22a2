// ==========================
// tests/unit/rate_limit_tests.rs
// ==========================
//! Login limiter over the in-memory counter store
use backend_lib::auth::{AuthRateLimiter, RateLimitDecision};
use backend_lib::counter::{CounterStore, MemoryCounterStore};
use std::sync::Arc;
use std::time::Duration;

const WINDOW: Duration = Duration::from_secs(15 * 60);

#[tokio::test(start_paused = true)]
async fn test_five_attempts_then_limited_then_reset() {
    let limiter = AuthRateLimiter::new(Arc::new(MemoryCounterStore::new()), 5, WINDOW);

    for _ in 0..5 {
        assert!(limiter.check_and_increment("10.0.0.1").await.is_allowed());
    }
    assert!(matches!(
        limiter.check_and_increment("10.0.0.1").await,
        RateLimitDecision::Limited { .. }
    ));

    tokio::time::advance(WINDOW).await;
    assert!(limiter.check_and_increment("10.0.0.1").await.is_allowed());
}

#[tokio::test(start_paused = true)]
async fn test_limiter_uses_prefixed_keys() {
    let store = Arc::new(MemoryCounterStore::new());
    let limiter = AuthRateLimiter::new(store.clone(), 5, WINDOW);

    limiter.check_and_increment("10.0.0.1").await;
    limiter.check_and_increment("10.0.0.1").await;

    let value = store
        .incr_with_expiry("rate_limit:login:10.0.0.1", WINDOW)
        .await
        .unwrap();
    assert_eq!(value.count, 3);
}

#[tokio::test(start_paused = true)]
async fn test_expired_counters_are_purged() {
    let store = Arc::new(MemoryCounterStore::new());
    let limiter = AuthRateLimiter::new(store.clone(), 5, WINDOW);

    for client in ["a", "b", "c"] {
        limiter.check_and_increment(client).await;
    }
    assert_eq!(store.len(), 3);

    tokio::time::advance(WINDOW + Duration::from_secs(1)).await;
    assert_eq!(store.purge_expired(), 3);
    assert!(store.is_empty());
}

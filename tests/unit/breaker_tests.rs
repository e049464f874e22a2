// ==========================
// tests/unit/breaker_tests.rs
// ==========================
//! Circuit breaker behavior through the public API
use backend_lib::breaker::{BreakerConfig, CircuitBreakerRegistry, CircuitError, CircuitState};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn registry() -> CircuitBreakerRegistry {
    CircuitBreakerRegistry::new(BreakerConfig {
        interval: Some(Duration::from_secs(10)),
        reset_timeout: Duration::from_secs(30),
        half_open_max_requests: 1,
        min_requests: 3,
        failure_ratio: 0.6,
        consecutive_failure_threshold: 5,
        call_timeout: None,
    })
}

#[tokio::test(start_paused = true)]
async fn test_breaker_lifecycle() {
    let registry = registry();
    let breaker = registry.get_or_create("orders");
    let invocations = AtomicU32::new(0);

    let call = |fail: bool| {
        let invocations = &invocations;
        let breaker = breaker.clone();
        async move {
            breaker
                .execute(|| async move {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    if fail {
                        Err("unavailable")
                    } else {
                        Ok(())
                    }
                })
                .await
        }
    };

    for _ in 0..3 {
        assert!(matches!(call(true).await, Err(CircuitError::Inner(_))));
    }
    assert!(matches!(call(false).await, Err(CircuitError::Open)));
    assert_eq!(invocations.load(Ordering::SeqCst), 3);

    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    assert!(call(false).await.is_ok());
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(invocations.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_breakers_fail_independently() {
    let registry = registry();
    let orders = registry.get_or_create("orders");
    let holdings = registry.get_or_create("holdings");

    for _ in 0..3 {
        let _ = orders.execute(|| async { Err::<(), _>("down") }).await;
    }

    assert_eq!(orders.state(), CircuitState::Open);
    assert_eq!(holdings.state(), CircuitState::Closed);
    assert!(holdings.execute(|| async { Ok::<_, ()>(1) }).await.is_ok());

    assert_eq!(
        registry.snapshot(),
        vec![
            ("holdings".to_string(), CircuitState::Closed),
            ("orders".to_string(), CircuitState::Open),
        ]
    );
}

// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for login attempts.

use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

use crate::counter::CounterStore;
use crate::metrics::AUTH_RATE_LIMIT_STORE_ERRORS;

/// Default number of attempts per window
pub const DEFAULT_MAX_ATTEMPTS: u64 = 5;

/// Default window (15 minutes)
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

const KEY_PREFIX: &str = "rate_limit:login:";

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u64 },
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Fixed-window limiter for login attempts, keyed by client
#[derive(Clone)]
pub struct AuthRateLimiter {
    store: Arc<dyn CounterStore>,
    max_attempts: u64,
    window: Duration,
}

impl AuthRateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, max_attempts: u64, window: Duration) -> Self {
        Self {
            store,
            max_attempts,
            window,
        }
    }

    /// Count an attempt by `client_key` and decide whether it may proceed.
    ///
    /// Every attempt counts, successful or not. If the counter store fails
    /// the attempt is allowed.
    pub async fn check_and_increment(&self, client_key: &str) -> RateLimitDecision {
        let key = format!("{KEY_PREFIX}{client_key}");

        match self.store.incr_with_expiry(&key, self.window).await {
            Ok(value) if value.count <= self.max_attempts => RateLimitDecision::Allowed {
                remaining: self.max_attempts - value.count,
            },
            Ok(value) => RateLimitDecision::Limited {
                retry_after: value.expires_at.saturating_duration_since(Instant::now()),
            },
            Err(e) => {
                counter!(AUTH_RATE_LIMIT_STORE_ERRORS).increment(1);
                warn!(error = %e, client = %client_key, "rate limit store failed, allowing attempt");
                RateLimitDecision::Allowed {
                    remaining: self.max_attempts,
                }
            },
        }
    }
}

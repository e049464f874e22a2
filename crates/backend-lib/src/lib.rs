// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the trading desk API.

pub mod auth;
pub mod breaker;
pub mod config;
pub mod counter;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod portfolio;
pub mod router;
pub mod storage;
pub mod telemetry;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthRateLimiter, AuthService, DefaultAuth, TokenCodec};
use crate::breaker::{BreakerConfig, CircuitBreakerRegistry};
use crate::config::Settings;
use crate::counter::CounterStore;
use crate::error::AppError;
use crate::portfolio::PortfolioService;
use crate::storage::UserStore;

pub use router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Per-route circuit breakers
    pub breakers: Arc<CircuitBreakerRegistry>,
    /// Login attempt limiter
    pub login_limiter: Arc<AuthRateLimiter>,
    /// Portfolio views
    pub portfolio: Arc<PortfolioService>,
    /// Loaded settings
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Wire the application from validated settings and its backing stores
    pub fn new(
        settings: Settings,
        users: Arc<dyn UserStore>,
        counters: Arc<dyn CounterStore>,
    ) -> Result<Self, AppError> {
        let tokens = TokenCodec::new(&settings.auth)
            .map_err(|e| AppError::Internal(format!("token codec: {e}")))?;
        let auth = Arc::new(DefaultAuth::new(
            users,
            Arc::new(tokens),
            settings.auth.password_cost_log_n,
        ));

        let breakers = Arc::new(CircuitBreakerRegistry::new(BreakerConfig::from(
            &settings.circuit_breaker,
        )));

        let login_limiter = Arc::new(AuthRateLimiter::new(
            counters,
            settings.rate_limit.login_max_attempts,
            settings.rate_limit.login_window(),
        ));

        Ok(Self {
            auth,
            breakers,
            login_limiter,
            portfolio: Arc::new(PortfolioService::new()),
            settings: Arc::new(settings),
        })
    }

    /// State backed by in-memory stores
    pub fn in_memory(settings: Settings) -> Result<Self, AppError> {
        Self::new(
            settings,
            Arc::new(storage::MemoryUserStore::new()),
            Arc::new(counter::MemoryCounterStore::new()),
        )
    }
}

// ============================
// crates/backend-lib/src/breaker/mod.rs
// ============================
//! Circuit breakers guarding request handling.
//!
//! A breaker starts `Closed` and counts outcomes. When the counts meet the
//! trip rule it opens and rejects calls without running them. After the
//! reset timeout the next call finds it `HalfOpen`, where a limited number
//! of trial calls decide between closing again and reopening.

mod registry;

pub use registry::CircuitBreakerRegistry;

use metrics::counter;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::CircuitBreakerSettings;
use crate::metrics::BREAKER_STATE_CHANGES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        };
        f.write_str(name)
    }
}

/// Outcome counters for the current generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub requests: u32,
    pub total_successes: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
}

impl Counts {
    fn on_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    fn on_success(&mut self) {
        self.total_successes = self.total_successes.saturating_add(1);
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.consecutive_failures = 0;
    }

    fn on_failure(&mut self) {
        self.total_failures = self.total_failures.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_successes = 0;
    }

    /// Failures over requests, 0.0 when nothing was counted
    pub fn failure_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            f64::from(self.total_failures) / f64::from(self.requests)
        }
    }
}

/// Tuning knobs for a breaker
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    /// Period after which closed-state counts are cleared; `None` never clears
    pub interval: Option<Duration>,
    /// Time spent open before trial calls are admitted
    pub reset_timeout: Duration,
    /// Trial calls admitted while half-open, and successes needed to close
    pub half_open_max_requests: u32,
    /// Requests needed in a generation before the ratio rule applies
    pub min_requests: u32,
    /// Failure ratio that trips the breaker once `min_requests` is reached
    pub failure_ratio: f64,
    /// Consecutive failures that trip the breaker regardless of the ratio
    pub consecutive_failure_threshold: u32,
    /// Per-call time limit; a call running longer counts as a failure
    pub call_timeout: Option<Duration>,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self::from(&CircuitBreakerSettings::default())
    }
}

impl From<&CircuitBreakerSettings> for BreakerConfig {
    fn from(settings: &CircuitBreakerSettings) -> Self {
        Self {
            interval: settings.interval(),
            reset_timeout: settings.reset_timeout(),
            half_open_max_requests: settings.half_open_max_requests.max(1),
            min_requests: settings.min_requests,
            failure_ratio: settings.failure_ratio,
            consecutive_failure_threshold: settings.error_threshold,
            call_timeout: settings.timeout(),
        }
    }
}

impl BreakerConfig {
    fn should_trip(&self, counts: &Counts) -> bool {
        (counts.requests >= self.min_requests && counts.failure_ratio() >= self.failure_ratio)
            || counts.consecutive_failures >= self.consecutive_failure_threshold
    }
}

/// Why a guarded call did not produce the operation's own result
#[derive(Error, Debug)]
pub enum CircuitError<E> {
    #[error("circuit breaker is open")]
    Open,

    #[error("too many trial requests while half-open")]
    TooManyTrialRequests,

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation failed: {0:?}")]
    Inner(E),
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    generation: u64,
    counts: Counts,
    /// Closed: end of the counting interval. Open: end of the cool-down.
    expiry: Option<Instant>,
}

/// A single named circuit breaker. All transitions happen under one lock.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        let expiry = config.interval.map(|i| Instant::now() + i);
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry,
            }),
        }
    }

    /// Current state, applying any transition that time alone has caused
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.current_state(&mut inner, Instant::now());
        inner.state
    }

    /// Counts of the current generation
    pub fn counts(&self) -> Counts {
        let mut inner = self.inner.lock();
        self.current_state(&mut inner, Instant::now());
        inner.counts
    }

    /// Run `op` under the breaker.
    ///
    /// Rejected calls never invoke `op`. `Err` results and timeouts count as
    /// failures; a call dropped before completing counts as a failure too,
    /// so a half-open trial slot cannot leak.
    pub async fn execute<T, E, F, Fut>(&self, op: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let generation = self.before_request::<E>()?;
        let mut guard = CallGuard {
            breaker: self,
            generation,
            finished: false,
        };

        let outcome = match self.config.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, op()).await {
                Ok(result) => result.map_err(CircuitError::Inner),
                Err(_) => Err(CircuitError::Timeout(limit)),
            },
            None => op().await.map_err(CircuitError::Inner),
        };

        guard.finish(outcome.is_ok());
        outcome
    }

    fn before_request<E>(&self) -> Result<u64, CircuitError<E>> {
        let mut inner = self.inner.lock();
        self.current_state(&mut inner, Instant::now());

        match inner.state {
            CircuitState::Open => return Err(CircuitError::Open),
            CircuitState::HalfOpen
                if inner.counts.requests >= self.config.half_open_max_requests =>
            {
                return Err(CircuitError::TooManyTrialRequests)
            },
            _ => {},
        }

        inner.counts.on_request();
        Ok(inner.generation)
    }

    fn after_request(&self, before: u64, success: bool) {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        self.current_state(&mut inner, now);

        // Outcomes from an earlier generation no longer describe this one.
        if inner.generation != before {
            return;
        }

        if success {
            self.on_success(&mut inner, now);
        } else {
            self.on_failure(&mut inner, now);
        }
    }

    fn on_success(&self, inner: &mut BreakerInner, now: Instant) {
        match inner.state {
            CircuitState::Closed => inner.counts.on_success(),
            CircuitState::HalfOpen => {
                inner.counts.on_success();
                if inner.counts.consecutive_successes >= self.config.half_open_max_requests {
                    self.set_state(inner, CircuitState::Closed, now);
                }
            },
            CircuitState::Open => {},
        }
    }

    fn on_failure(&self, inner: &mut BreakerInner, now: Instant) {
        match inner.state {
            CircuitState::Closed => {
                inner.counts.on_failure();
                if self.config.should_trip(&inner.counts) {
                    self.set_state(inner, CircuitState::Open, now);
                }
            },
            CircuitState::HalfOpen => self.set_state(inner, CircuitState::Open, now),
            CircuitState::Open => {},
        }
    }

    fn current_state(&self, inner: &mut BreakerInner, now: Instant) {
        match inner.state {
            CircuitState::Closed => {
                if inner.expiry.is_some_and(|expiry| expiry <= now) {
                    self.new_generation(inner, now);
                }
            },
            CircuitState::Open => {
                if inner.expiry.is_some_and(|expiry| expiry <= now) {
                    self.set_state(inner, CircuitState::HalfOpen, now);
                }
            },
            CircuitState::HalfOpen => {},
        }
    }

    fn set_state(&self, inner: &mut BreakerInner, state: CircuitState, now: Instant) {
        if inner.state == state {
            return;
        }

        let previous = inner.state;
        inner.state = state;
        self.new_generation(inner, now);

        counter!(BREAKER_STATE_CHANGES, "breaker" => self.name.clone(), "to" => state.to_string())
            .increment(1);
        if state == CircuitState::Open {
            warn!(breaker = %self.name, from = %previous, to = %state, "circuit breaker state changed");
        } else {
            info!(breaker = %self.name, from = %previous, to = %state, "circuit breaker state changed");
        }
    }

    fn new_generation(&self, inner: &mut BreakerInner, now: Instant) {
        inner.generation += 1;
        inner.counts = Counts::default();
        inner.expiry = match inner.state {
            CircuitState::Closed => self.config.interval.map(|i| now + i),
            CircuitState::Open => Some(now + self.config.reset_timeout),
            CircuitState::HalfOpen => None,
        };
    }
}

/// Records a failure if the guarded future is dropped before finishing
struct CallGuard<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    finished: bool,
}

impl CallGuard<'_> {
    fn finish(&mut self, success: bool) {
        self.finished = true;
        self.breaker.after_request(self.generation, success);
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.breaker.after_request(self.generation, false);
        }
    }
}

// ============================
// crates/backend-lib/src/counter.rs
// ============================
//! Expiring counters backing the login rate limiter.
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::storage::StoreError;

/// Current value of a counter and when it disappears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterValue {
    pub count: u64,
    pub expires_at: Instant,
}

/// A key-value store of counters with atomic increment-with-expiry.
///
/// The expiry is fixed when a key is created and is not pushed back by later
/// increments.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment `key`, creating it with a count of 1 and a lifetime of
    /// `window` if it does not exist or has expired.
    async fn incr_with_expiry(&self, key: &str, window: Duration)
        -> Result<CounterValue, StoreError>;
}

/// Process-local counter store
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, CounterValue>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired counter, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.counters.len();
        self.counters.retain(|_, value| value.expires_at > now);
        before.saturating_sub(self.counters.len())
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr_with_expiry(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<CounterValue, StoreError> {
        let now = Instant::now();
        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| CounterValue {
                count: 0,
                expires_at: now + window,
            });

        if entry.expires_at <= now {
            entry.count = 0;
            entry.expires_at = now + window;
        }
        entry.count += 1;

        Ok(*entry)
    }
}

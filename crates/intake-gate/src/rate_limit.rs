//! Per-caller token buckets.
//!
//! Each caller key owns a bucket of `capacity` tokens that refills linearly
//! over `window`. A request takes one token or is refused with the time
//! until the next token arrives.
//!
//! A bucket left alone for a whole window is back at full credit, which is
//! exactly what a fresh bucket holds, so such buckets are dropped. The
//! limiter sweeps at most once per window; the store only ever holds keys
//! seen within roughly the last two windows.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::RateLimited;

/// Stored state of one caller's bucket.
///
/// Credit is kept in token-milliseconds: one token costs `window` ms of
/// credit and every elapsed millisecond adds `capacity`, so refill is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub credit: u64,
    pub updated_millis: u64,
}

/// Holds buckets by caller key.
///
/// `update` must run `apply` as one atomic read-modify-write per key: two
/// concurrent callers must never both observe the same last token.
pub trait BucketStore: Send + Sync {
    /// Runs `apply` on the bucket for `key`, inserting `fresh` first when the
    /// key is unknown, and returns what `apply` returned.
    fn update(&self, key: &str, fresh: Bucket, apply: &mut dyn FnMut(&mut Bucket) -> bool)
    -> bool;

    /// Drops every bucket last updated at or before `cutoff_millis`.
    fn evict_idle(&self, cutoff_millis: u64);

    /// Number of tracked keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Buckets in a map behind a single lock.
#[derive(Debug, Default)]
pub struct InMemoryBucketStore {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl InMemoryBucketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BucketStore for InMemoryBucketStore {
    fn update(
        &self,
        key: &str,
        fresh: Bucket,
        apply: &mut dyn FnMut(&mut Bucket) -> bool,
    ) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(key.to_string()).or_insert(fresh);
        apply(bucket)
    }

    fn evict_idle(&self, cutoff_millis: u64) {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.updated_millis > cutoff_millis);
        let evicted = before - buckets.len();
        if evicted > 0 {
            debug!(evicted, remaining = buckets.len(), "evicted idle buckets");
        }
    }

    fn len(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Token-bucket limiter over an injectable clock and store.
#[derive(Clone)]
pub struct RateLimiter {
    capacity: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    store: Arc<dyn BucketStore>,
    next_sweep_millis: Arc<AtomicU64>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("capacity", &self.capacity)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// `capacity` requests per `window`, system clock, in-memory store.
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            window: window.max(Duration::from_millis(1)),
            clock: Arc::new(SystemClock),
            store: Arc::new(InMemoryBucketStore::new()),
            next_sweep_millis: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn BucketStore>) -> Self {
        self.store = store;
        self
    }

    /// Takes one token for `key`.
    pub fn check(&self, key: &str) -> Result<(), RateLimited> {
        let now = self.clock.now_millis();
        let capacity = u64::from(self.capacity);
        let cost = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);
        let full = capacity.saturating_mul(cost);
        let mut retry_after_ms = 0;
        self.sweep_idle(now, cost);

        let fresh = Bucket {
            credit: full,
            updated_millis: now,
        };
        let admitted = self.store.update(key, fresh, &mut |bucket: &mut Bucket| {
            let elapsed = now.saturating_sub(bucket.updated_millis);
            bucket.credit = bucket
                .credit
                .saturating_add(elapsed.saturating_mul(capacity))
                .min(full);
            bucket.updated_millis = now.max(bucket.updated_millis);
            if bucket.credit >= cost {
                bucket.credit -= cost;
                true
            } else {
                retry_after_ms = (cost - bucket.credit).div_ceil(capacity);
                false
            }
        });

        if admitted {
            Ok(())
        } else {
            debug!(key, retry_after_ms, "rate limited");
            Err(RateLimited {
                key: key.to_string(),
                retry_after_ms,
            })
        }
    }

    fn sweep_idle(&self, now: u64, window_ms: u64) {
        let due = self.next_sweep_millis.load(Ordering::Relaxed);
        if now < due {
            return;
        }
        let next = now.saturating_add(window_ms);
        if self
            .next_sweep_millis
            .compare_exchange(due, next, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            self.store.evict_idle(now.saturating_sub(window_ms));
        }
    }
}

//! Per-athlete result cache with expiry
//!
//! Holds the last computed [`RecoveryAnalysis`] per athlete and analysis kind.
//!
//! Features:
//! - One live entry per (athlete, kind); a new `put` replaces the old entry
//! - Read-time eviction: `get` never returns an entry once `now ≥ expires_at`
//! - Explicit and background sweeps of expired entries
//! - Hit/miss/expiry metrics
//!
//! Entries live in a sharded [`DashMap`], so concurrent readers never contend on
//! a global lock. Removal is idempotent: a sweep and a lazy read-time eviction
//! racing on the same key both succeed.

use crate::clock::{Clock, SystemClock};
use crate::models::RecoveryAnalysis;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Default validity window of a cached analysis
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Kind of cached analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Recovery,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub athlete_id: String,
    pub kind: AnalysisKind,
}

impl CacheKey {
    pub fn new(athlete_id: &str, kind: AnalysisKind) -> Self {
        Self {
            athlete_id: athlete_id.to_string(),
            kind,
        }
    }
}

/// Cached analysis with its validity window
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub athlete_id: String,
    pub kind: AnalysisKind,
    pub payload: Arc<RecoveryAnalysis>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// An entry is expired from `expires_at` onwards
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Cache statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    pub total_lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Entries dropped at read time because they had expired
    pub expirations: u64,
    /// Entries dropped by sweeps
    pub evictions: u64,
}

impl CacheMetrics {
    /// Get hit rate as percentage
    pub fn hit_rate(&self) -> f64 {
        if self.total_lookups == 0 {
            return 0.0;
        }
        (self.cache_hits as f64 / self.total_lookups as f64) * 100.0
    }
}

#[derive(Debug, Default)]
struct Counters {
    lookups: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
}

/// Result cache keyed by athlete and analysis kind
pub struct ResultCache {
    entries: DashMap<CacheKey, CacheEntry>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    counters: Counters,
}

impl ResultCache {
    /// Create a cache with the default 24 hour TTL
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, Duration::hours(DEFAULT_TTL_HOURS))
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            default_ttl,
            counters: Counters::default(),
        }
    }

    /// Cache on wall-clock time with the default TTL
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Current time according to the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fetch a live entry, evicting it if it has expired
    pub fn get(&self, athlete_id: &str, kind: AnalysisKind) -> Option<Arc<RecoveryAnalysis>> {
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);
        let key = CacheKey::new(athlete_id, kind);
        let now = self.clock.now();

        // The shard read guard must be released before removing
        let live = self.entries.get(&key).map(|entry| {
            if entry.is_expired_at(now) {
                None
            } else {
                Some(Arc::clone(&entry.payload))
            }
        });

        match live {
            Some(Some(payload)) => {
                debug!(athlete_id, ?kind, "Cache hit");
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(payload)
            }
            Some(None) => {
                if self
                    .entries
                    .remove_if(&key, |_, entry| entry.is_expired_at(now))
                    .is_some()
                {
                    self.counters.expirations.fetch_add(1, Ordering::Relaxed);
                }
                debug!(athlete_id, ?kind, "Cache entry expired");
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                debug!(athlete_id, ?kind, "Cache miss");
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store an analysis, replacing any previous entry for the same key
    pub fn put(
        &self,
        athlete_id: &str,
        kind: AnalysisKind,
        analysis: Arc<RecoveryAnalysis>,
        ttl: Duration,
    ) {
        let created_at = self.clock.now();
        let entry = CacheEntry {
            athlete_id: athlete_id.to_string(),
            kind,
            payload: analysis,
            created_at,
            expires_at: created_at + ttl,
        };
        debug!(athlete_id, ?kind, expires_at = %entry.expires_at, "Caching analysis");
        self.entries.insert(CacheKey::new(athlete_id, kind), entry);
    }

    /// Store with the cache's default TTL
    pub fn put_default(&self, athlete_id: &str, kind: AnalysisKind, analysis: Arc<RecoveryAnalysis>) {
        self.put(athlete_id, kind, analysis, self.default_ttl);
    }

    /// Inspect an entry without eviction or metrics
    pub fn peek(&self, athlete_id: &str, kind: AnalysisKind) -> Option<CacheEntry> {
        self.entries
            .get(&CacheKey::new(athlete_id, kind))
            .map(|entry| entry.clone())
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn invalidate_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let expired = entry.is_expired_at(now);
            if expired {
                removed += 1;
            }
            !expired
        });

        if removed > 0 {
            self.counters
                .evictions
                .fetch_add(removed as u64, Ordering::Relaxed);
            info!(removed, "Swept expired cache entries");
        }
        removed
    }

    /// Drop all entries for one athlete
    pub fn invalidate(&self, athlete_id: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let matches = key.athlete_id == athlete_id;
            if matches {
                removed += 1;
            }
            !matches
        });
        removed
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            total_lookups: self.counters.lookups.load(Ordering::Relaxed),
            cache_hits: self.counters.hits.load(Ordering::Relaxed),
            cache_misses: self.counters.misses.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// Periodically sweep expired entries on the current tokio runtime
    ///
    /// Abort the returned handle to stop the sweeper.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                cache.invalidate_expired();
            }
        })
    }
}

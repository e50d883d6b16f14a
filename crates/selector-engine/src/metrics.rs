//! Per-chain hit metrics

use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;

/// Process-lifetime counters for one selector chain
///
/// Created lazily on the first resolution attempt for a key and mutated only
/// through [`MetricsStore`], which serializes updates per key.
#[derive(Debug, Clone, Serialize)]
pub struct SelectorHitMetrics {
    /// Chain key these counters belong to
    pub chain_key: String,

    /// Successful resolutions per selector index (0 = primary)
    pub hits: HashMap<usize, u64>,

    /// Resolutions where every selector failed
    pub misses: u64,

    /// Total wall-clock time spent resolving this key (milliseconds)
    pub total_time_ms: f64,
}

impl SelectorHitMetrics {
    fn new(chain_key: impl Into<String>) -> Self {
        Self {
            chain_key: chain_key.into(),
            hits: HashMap::new(),
            misses: 0,
            total_time_ms: 0.0,
        }
    }

    /// Hits recorded at a given selector index
    pub fn hits_at(&self, index: usize) -> u64 {
        self.hits.get(&index).copied().unwrap_or(0)
    }

    /// Total resolution attempts (hits across all indices plus misses)
    pub fn total_attempts(&self) -> u64 {
        self.hits.values().sum::<u64>() + self.misses
    }

    /// Fraction of attempts that resolved with any selector
    pub fn success_rate(&self) -> f64 {
        let total = self.total_attempts();
        if total == 0 {
            return 0.0;
        }
        self.hits.values().sum::<u64>() as f64 / total as f64
    }

    /// Fraction of attempts that resolved with the primary selector
    pub fn primary_hit_rate(&self) -> f64 {
        let total = self.total_attempts();
        if total == 0 {
            return 0.0;
        }
        self.hits_at(0) as f64 / total as f64
    }

    /// Selector index with the most hits, if any hit was recorded
    pub fn best_index(&self) -> Option<usize> {
        self.hits
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(index, _)| *index)
    }
}

/// Store of per-chain hit metrics
///
/// Backed by a concurrent map; the entry API gives single-writer-at-a-time
/// updates per key so concurrent resolutions never lose counts.
#[derive(Default)]
pub struct MetricsStore {
    inner: DashMap<String, SelectorHitMetrics>,
}

impl MetricsStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful resolution at `index` for `key`
    pub fn record_hit(&self, key: &str, index: usize, elapsed_ms: f64) {
        let mut entry = self
            .inner
            .entry(key.to_string())
            .or_insert_with(|| SelectorHitMetrics::new(key));
        *entry.hits.entry(index).or_insert(0) += 1;
        entry.total_time_ms += elapsed_ms;
    }

    /// Record a full-chain miss for `key`
    pub fn record_miss(&self, key: &str, elapsed_ms: f64) {
        let mut entry = self
            .inner
            .entry(key.to_string())
            .or_insert_with(|| SelectorHitMetrics::new(key));
        entry.misses += 1;
        entry.total_time_ms += elapsed_ms;
    }

    /// Snapshot the metrics for one key
    pub fn snapshot(&self, key: &str) -> Option<SelectorHitMetrics> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    /// Snapshot all tracked keys
    pub fn snapshot_all(&self) -> Vec<SelectorHitMetrics> {
        self.inner.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Drop all counters
    pub fn reset(&self) {
        self.inner.clear();
    }
}

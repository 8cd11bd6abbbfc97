//! Load metrics for a language session.
//!
//! Tracks how often a language switch was served from the registry's cache,
//! how often a loader had to run, and how many switches were superseded by a
//! later request before they finished.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters owned by one session.
#[derive(Debug, Default)]
pub struct LoadMetrics {
    /// Switches whose dataset was already available
    cache_hits: AtomicUsize,

    /// Switches that had to wait for a loader
    cache_misses: AtomicUsize,

    /// Loader invocations
    loader_calls: AtomicUsize,

    /// Loader invocations that failed
    loader_failures: AtomicUsize,

    /// Switches discarded because a newer request arrived
    superseded: AtomicUsize,
}

impl LoadMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_loader_call(&self) {
        self.loader_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_loader_failure(&self) {
        self.loader_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn loader_calls(&self) -> usize {
        self.loader_calls.load(Ordering::Relaxed)
    }

    pub fn loader_failures(&self) -> usize {
        self.loader_failures.load(Ordering::Relaxed)
    }

    pub fn superseded(&self) -> usize {
        self.superseded.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_switches = hits + misses;
        let cache_hit_rate = if total_switches > 0 {
            (hits as f64 / total_switches as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.loader_calls();
        let failures = self.loader_failures();
        let loader_success_rate = if calls > 0 {
            ((calls - failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            loader_calls: calls,
            loader_failures: failures,
            loader_success_rate,
            superseded: self.superseded(),
        }
    }
}

/// Snapshot of a session's load statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    pub loader_calls: usize,
    pub loader_failures: usize,

    /// Loader success rate as a percentage (0-100)
    pub loader_success_rate: f64,

    pub superseded: usize,
}

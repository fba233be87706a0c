//! Telemetry counters for one DOM state engine.
//!
//! Counters live on the engine instance so independent engines never share
//! numbers; the CLI surfaces them through [`EngineMetrics::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::model::MatchStrategy;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricCounter {
    pub total: u64,
    pub avg_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheMetric {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResolveBreakdown {
    pub model: u64,
    pub exact: u64,
    pub substring: u64,
    pub token_set: u64,
    pub unresolved: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub listing: MetricCounter,
    pub listing_cache: CacheMetric,
    pub resolve: MetricCounter,
    pub resolve_by_strategy: ResolveBreakdown,
    pub model_failures: u64,
}

#[derive(Debug, Default)]
pub struct EngineMetrics {
    listing_total: AtomicU64,
    listing_cache_hit: AtomicU64,
    listing_cache_miss: AtomicU64,
    listing_lat_ns: AtomicU64,
    listing_lat_samples: AtomicU64,

    resolve_total: AtomicU64,
    resolve_lat_ns: AtomicU64,
    resolve_lat_samples: AtomicU64,
    resolve_model: AtomicU64,
    resolve_exact: AtomicU64,
    resolve_substring: AtomicU64,
    resolve_token_set: AtomicU64,
    resolve_unresolved: AtomicU64,

    model_failures: AtomicU64,
}

impl EngineMetrics {
    pub fn record_listing(&self, cache_hit: bool, duration: Duration) {
        self.listing_total.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.listing_cache_hit.fetch_add(1, Ordering::Relaxed);
        } else {
            self.listing_cache_miss.fetch_add(1, Ordering::Relaxed);
        }
        record_latency(&self.listing_lat_ns, &self.listing_lat_samples, duration);
    }

    pub fn record_resolve(&self, strategy: Option<MatchStrategy>, duration: Duration) {
        self.resolve_total.fetch_add(1, Ordering::Relaxed);
        let bucket = match strategy {
            Some(MatchStrategy::Model) => &self.resolve_model,
            Some(MatchStrategy::Exact) => &self.resolve_exact,
            Some(MatchStrategy::Substring) => &self.resolve_substring,
            Some(MatchStrategy::TokenSet) => &self.resolve_token_set,
            None => &self.resolve_unresolved,
        };
        bucket.fetch_add(1, Ordering::Relaxed);
        record_latency(&self.resolve_lat_ns, &self.resolve_lat_samples, duration);
    }

    pub fn record_model_failure(&self) {
        self.model_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            listing: make_counter(
                self.listing_total.load(Ordering::Relaxed),
                self.listing_lat_ns.load(Ordering::Relaxed),
                self.listing_lat_samples.load(Ordering::Relaxed),
            ),
            listing_cache: make_cache_metric(
                self.listing_cache_hit.load(Ordering::Relaxed),
                self.listing_cache_miss.load(Ordering::Relaxed),
            ),
            resolve: make_counter(
                self.resolve_total.load(Ordering::Relaxed),
                self.resolve_lat_ns.load(Ordering::Relaxed),
                self.resolve_lat_samples.load(Ordering::Relaxed),
            ),
            resolve_by_strategy: ResolveBreakdown {
                model: self.resolve_model.load(Ordering::Relaxed),
                exact: self.resolve_exact.load(Ordering::Relaxed),
                substring: self.resolve_substring.load(Ordering::Relaxed),
                token_set: self.resolve_token_set.load(Ordering::Relaxed),
                unresolved: self.resolve_unresolved.load(Ordering::Relaxed),
            },
            model_failures: self.model_failures.load(Ordering::Relaxed),
        }
    }
}

fn make_counter(total: u64, nanos: u64, samples: u64) -> MetricCounter {
    let avg_ms = if samples == 0 {
        0.0
    } else {
        (nanos as f64 / samples as f64) / 1_000_000.0
    };
    MetricCounter { total, avg_ms }
}

fn make_cache_metric(hits: u64, misses: u64) -> CacheMetric {
    let total = hits + misses;
    let hit_rate = if total == 0 {
        0.0
    } else {
        hits as f64 * 100.0 / total as f64
    };
    CacheMetric {
        hits,
        misses,
        hit_rate,
    }
}

fn record_latency(total_ns: &AtomicU64, samples: &AtomicU64, duration: Duration) {
    let nanos = duration_to_nanos(duration);
    total_ns.fetch_add(nanos, Ordering::Relaxed);
    samples.fetch_add(1, Ordering::Relaxed);
}

fn duration_to_nanos(duration: Duration) -> u64 {
    let nanos = duration.as_nanos();
    if nanos > u64::MAX as u128 {
        u64::MAX
    } else {
        nanos as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_rate_is_a_percentage() {
        let metrics = EngineMetrics::default();
        metrics.record_listing(false, Duration::from_millis(2));
        metrics.record_listing(true, Duration::from_millis(0));
        metrics.record_listing(true, Duration::from_millis(0));
        metrics.record_listing(true, Duration::from_millis(0));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.listing.total, 4);
        assert_eq!(snapshot.listing_cache.hit_rate, 75.0);
    }

    #[test]
    fn resolve_outcomes_are_bucketed() {
        let metrics = EngineMetrics::default();
        metrics.record_resolve(Some(MatchStrategy::Exact), Duration::ZERO);
        metrics.record_resolve(None, Duration::ZERO);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.resolve.total, 2);
        assert_eq!(snapshot.resolve_by_strategy.exact, 1);
        assert_eq!(snapshot.resolve_by_strategy.unresolved, 1);
    }
}

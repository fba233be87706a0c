use std::time::Duration;

use tracing::debug;

use crate::metrics::EngineMetrics;
use crate::model::MatchStrategy;

pub fn emit_listing(
    metrics: &EngineMetrics,
    url: &str,
    cache_hit: bool,
    element_count: usize,
    duration: Duration,
) {
    metrics.record_listing(cache_hit, duration);
    debug!(
        target: "perceiver.events",
        url,
        cache_hit,
        element_count,
        "structural.listing.completed"
    );
}

pub fn emit_resolve(
    metrics: &EngineMetrics,
    description: &str,
    strategy: Option<MatchStrategy>,
    candidate_count: usize,
    duration: Duration,
) {
    metrics.record_resolve(strategy, duration);
    debug!(
        target: "perceiver.events",
        description,
        strategy = strategy.map(|s| s.as_str()).unwrap_or("none"),
        candidate_count,
        "structural.resolve.completed"
    );
}

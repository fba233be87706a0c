use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub(crate) struct OrchestratorMetrics {
    created: AtomicU64,
    reused: AtomicU64,
    evicted: AtomicU64,
    swept: AtomicU64,
    attempts: AtomicU64,
    exhausted: AtomicU64,
}

fn increment(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl OrchestratorMetrics {
    pub fn record_created(&self) {
        increment(&self.created);
    }

    pub fn record_reused(&self) {
        increment(&self.reused);
    }

    pub fn record_evicted(&self) {
        increment(&self.evicted);
    }

    pub fn record_swept(&self, count: usize) {
        self.swept.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_attempt(&self) {
        increment(&self.attempts);
    }

    pub fn record_exhausted(&self) {
        increment(&self.exhausted);
    }

    pub fn snapshot(&self) -> OrchestratorMetricsSnapshot {
        OrchestratorMetricsSnapshot {
            windows_created: self.created.load(Ordering::Relaxed),
            windows_reused: self.reused.load(Ordering::Relaxed),
            stale_evicted: self.evicted.load(Ordering::Relaxed),
            windows_swept: self.swept.load(Ordering::Relaxed),
            relay_attempts: self.attempts.load(Ordering::Relaxed),
            relays_exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrchestratorMetricsSnapshot {
    pub windows_created: u64,
    pub windows_reused: u64,
    pub stale_evicted: u64,
    pub windows_swept: u64,
    pub relay_attempts: u64,
    pub relays_exhausted: u64,
}

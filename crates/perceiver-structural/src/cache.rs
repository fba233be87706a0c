use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::model::ElementDescriptor;

struct CachedListing {
    generation: u64,
    elements: Vec<ElementDescriptor>,
    stored_at: Instant,
}

/// Whole-document interactive element listings keyed by document URL.
///
/// Entries expire by TTL only. An entry recorded for an older document
/// generation is treated as a miss even while its TTL is still running.
#[derive(Default)]
pub struct ElementCache {
    entries: DashMap<String, CachedListing>,
    ttl_ms: AtomicU64,
}

impl ElementCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms: AtomicU64::new(duration_to_millis(ttl)),
        }
    }

    pub fn put(&self, url: &str, generation: u64, elements: Vec<ElementDescriptor>) {
        self.entries.insert(
            url.to_string(),
            CachedListing {
                generation,
                elements,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn set_ttl(&self, ttl: Duration) {
        self.ttl_ms
            .store(duration_to_millis(ttl), Ordering::Relaxed);
    }

    pub fn ttl(&self) -> Duration {
        millis_to_duration(self.ttl_ms.load(Ordering::Relaxed))
    }

    pub fn get(&self, url: &str, generation: u64) -> Option<Vec<ElementDescriptor>> {
        let ttl = self.ttl();
        if let Some(entry) = self.entries.get(url) {
            if entry.generation == generation && entry.stored_at.elapsed() <= ttl {
                return Some(entry.elements.clone());
            }
        }
        self.entries.remove(url);
        None
    }

    pub fn invalidate(&self, url: &str) {
        self.entries.remove(url);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    let millis = duration.as_millis();
    if millis > u128::from(u64::MAX) {
        u64::MAX
    } else {
        millis as u64
    }
}

fn millis_to_duration(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Lifetime of a cached whole-document element listing.
    pub cache_ttl: Duration,
    /// Upper bound on one text model round trip.
    pub model_timeout: Duration,
    /// Cap on descriptor text, in characters.
    pub text_limit: usize,
    /// Ancestor levels used when building a selector.
    pub selector_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5),
            model_timeout: Duration::from_secs(10),
            text_limit: 200,
            selector_depth: 5,
        }
    }
}

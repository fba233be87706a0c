//! Tab bridge configuration.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Deadline for one tab round trip, in milliseconds.
    pub deadline_ms: u64,
    /// Capacity of the bridge event broadcast channel.
    pub event_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 30_000,
            event_capacity: 64,
        }
    }
}

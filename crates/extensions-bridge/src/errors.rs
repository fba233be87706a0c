use pagepilot_core_types::TabId;
use thiserror::Error;

/// Errors surfaced by the bridge.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Nothing is listening in the target tab (no content script, or it
    /// was detached by a navigation).
    #[error("no receiver in {0}")]
    NoReceiver(TabId),
    #[error("{tab} did not reply within {after_ms}ms")]
    Timeout { tab: TabId, after_ms: u64 },
    #[error("channel to {0} closed before a reply")]
    ChannelClosed(TabId),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("request failed: {0}")]
    Failed(String),
}

impl BridgeError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

//! Error types for action verbs

use perceiver_structural::PerceiverError;
use thiserror::Error;

/// Failures surfaced by the action executor. Every variant is recorded in the
/// action history before being returned to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// No element matches the description
    #[error("no element matches `{0}`")]
    NotFound(String),

    /// The element exists but is not in a state that allows the action
    #[error("precondition failed for `{description}`: {reason}")]
    Precondition {
        description: String,
        /// Judge reason, e.g. `not_clickable(disabled)`
        reason: String,
        /// Individual unmet conditions
        unmet: Vec<String>,
    },

    /// A wait or page load did not complete in time
    #[error("timed out after {after_ms}ms waiting for {what}")]
    Timeout { what: String, after_ms: u64 },

    /// The orchestrator or the target tab could not be reached
    #[error("context unavailable: {0}")]
    ContextUnavailable(String),

    /// The orchestrator refused or failed a navigation
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The caller supplied an unusable argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The action ran but its effect could not be observed afterwards
    #[error("action not confirmed: {0}")]
    Unconfirmed(String),

    /// Some form fields could not be filled; the others were applied
    #[error("form fields failed: {}", .failed.join("; "))]
    PartialFill { failed: Vec<String> },

    /// Internal error (should not happen in normal operation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Timeouts and unreachable contexts may succeed when tried again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ActionError::Timeout { .. } | ActionError::ContextUnavailable(_)
        )
    }
}

impl From<PerceiverError> for ActionError {
    fn from(err: PerceiverError) -> Self {
        match err {
            PerceiverError::ElementNotFound(what) => ActionError::NotFound(what),
            PerceiverError::StaleElement { .. } => ActionError::ContextUnavailable(err.to_string()),
            PerceiverError::InvalidSelector { .. } => ActionError::InvalidArgument(err.to_string()),
            other => ActionError::Internal(other.to_string()),
        }
    }
}

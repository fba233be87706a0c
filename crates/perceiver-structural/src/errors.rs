use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerceiverError {
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("stale element: recorded generation {recorded}, document is at {current}")]
    StaleElement { recorded: u64, current: u64 },
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("text model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("text model timed out")]
    ModelTimeout,
    #[error("internal error: {0}")]
    Internal(String),
}

impl PerceiverError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<crate::selector::SelectorError> for PerceiverError {
    fn from(err: crate::selector::SelectorError) -> Self {
        Self::InvalidSelector {
            selector: err.selector,
            reason: err.reason,
        }
    }
}

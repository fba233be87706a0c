use extensions_bridge::BridgeError;
use pagepilot_core_types::{TabId, TaskId, WindowId};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("{0} no longer exists")]
    WindowNotFound(WindowId),
    #[error("{0} no longer exists")]
    TabNotFound(TabId),
    #[error("no automation window for task {0}")]
    NoWindow(TaskId),
    #[error("invalid url `{0}`")]
    InvalidUrl(String),
    #[error("browser call failed: {0}")]
    Browser(String),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl OrchestratorError {
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Attempt count for exhausted retries, surfaced in failure replies.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            OrchestratorError::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

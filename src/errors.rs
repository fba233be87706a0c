//! Error handling module

use action_primitives::ActionError;
use data_extractor::ExtractError;
use thiserror::Error;
use window_orchestrator::OrchestratorError;

#[derive(Debug, Error)]
pub enum PagePilotError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("page source error: {0}")]
    Source(String),
    #[error("invalid plan: {0}")]
    Plan(String),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PagePilotError {
    pub fn source_error(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }
}

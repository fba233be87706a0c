use async_trait::async_trait;

use crate::messages::{OrchestratorReply, OrchestratorRequest};

/// The acting context's view of the orchestrator: one request in, one
/// plain-data reply out.
#[async_trait]
pub trait OrchestratorPort: Send + Sync {
    async fn request(&self, request: OrchestratorRequest) -> OrchestratorReply;
}

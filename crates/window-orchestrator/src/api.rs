use std::time::Duration;

use async_trait::async_trait;
use extensions_bridge::{OrchestratorPort, OrchestratorReply, OrchestratorRequest};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::OrchestratorError;
use crate::orchestrator::WindowOrchestrator;

impl WindowOrchestrator {
    /// Entry point for the message contract. Every request gets exactly one
    /// reply; failures come back as `{success: false, error}`.
    pub async fn handle(&self, request: OrchestratorRequest) -> OrchestratorReply {
        let kind = request.kind();
        debug!(kind, "orchestrator request");
        let reply = self.dispatch(request).await;
        match reply {
            Ok(reply) => reply,
            Err(err) => {
                warn!(kind, error = %err, "orchestrator request failed");
                OrchestratorReply::Failure {
                    success: false,
                    error: err.to_string(),
                    attempts: err.attempts(),
                }
            }
        }
    }

    /// Raw JSON entry point; an unknown or missing `type` is answered with a
    /// failure reply.
    pub async fn handle_json(&self, message: Value) -> Value {
        match OrchestratorRequest::from_value(message) {
            Ok(request) => self.handle(request).await.to_value(),
            Err(err) => {
                warn!(error = %err, "rejected orchestrator message");
                OrchestratorReply::failure(err).to_value()
            }
        }
    }

    async fn dispatch(
        &self,
        request: OrchestratorRequest,
    ) -> Result<OrchestratorReply, OrchestratorError> {
        let reply = match request {
            OrchestratorRequest::NavigateAutomationWindow { task_id, url } => {
                let ensured = self.navigate_in_window(&task_id, &url).await?;
                OrchestratorReply::Navigated {
                    success: true,
                    tab_id: ensured.tab_id,
                    window_id: ensured.window_id,
                }
            }
            OrchestratorRequest::CreateAutomationWindow {
                task_id,
                url,
                options,
            } => {
                let ensured = self
                    .ensure_window(&task_id, url.as_deref(), &options)
                    .await?;
                OrchestratorReply::WindowReady {
                    success: true,
                    window_id: ensured.window_id,
                    tab_id: ensured.tab_id,
                    reused: ensured.reused,
                }
            }
            OrchestratorRequest::CloseAutomationWindow { task_id } => {
                self.close_window(&task_id).await;
                OrchestratorReply::Closed { success: true }
            }
            OrchestratorRequest::WaitForPageLoad { tab_id, timeout } => {
                let timeout = timeout
                    .map(Duration::from_millis)
                    .unwrap_or(self.config().retry.load_timeout);
                let load = self.wait_for_load(tab_id, timeout).await?;
                OrchestratorReply::PageLoad {
                    success: true,
                    tab_id,
                    url: load.url,
                    timeout: (!load.settled).then_some(true),
                }
            }
            OrchestratorRequest::ExtractFromTab { tab_id, data_type } => {
                let data = self.extract_from_tab(tab_id, data_type.as_deref()).await?;
                OrchestratorReply::Extracted {
                    success: true,
                    data,
                }
            }
            OrchestratorRequest::ExtractSearchResultsFromTab { tab_id } => {
                let found = self.extract_search_results_from_tab(tab_id).await?;
                OrchestratorReply::SearchResults {
                    success: true,
                    results: found.results,
                    debug: found.debug,
                }
            }
        };
        Ok(reply)
    }
}

#[async_trait]
impl OrchestratorPort for WindowOrchestrator {
    async fn request(&self, request: OrchestratorRequest) -> OrchestratorReply {
        self.handle(request).await
    }
}

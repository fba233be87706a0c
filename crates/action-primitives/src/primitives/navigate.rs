//! Navigate and search verbs. Both act through the orchestrator, never on the
//! acting document directly.

use data_extractor::SearchResults;
use extensions_bridge::{OrchestratorReply, OrchestratorRequest};
use tracing::{debug, info};
use url::{form_urlencoded, Url};

use crate::errors::ActionError;
use crate::primitives::ActionExecutor;
use crate::types::NavigateOutcome;

pub async fn execute_navigate(
    executor: &ActionExecutor,
    url: &str,
) -> Result<NavigateOutcome, ActionError> {
    let target = Url::parse(url.trim())
        .map_err(|err| ActionError::InvalidArgument(format!("`{url}` is not a URL: {err}")))?;
    let port = executor.orchestrator()?;
    info!(url = %target, task = %executor.task_id(), "executing navigate");

    let reply = port
        .request(OrchestratorRequest::NavigateAutomationWindow {
            task_id: executor.task_id().clone(),
            url: target.to_string(),
        })
        .await;
    let (tab_id, window_id) = match reply {
        OrchestratorReply::Navigated {
            tab_id, window_id, ..
        } => (tab_id, window_id),
        OrchestratorReply::Failure { error, .. } => return Err(ActionError::Navigation(error)),
        other => return Err(unexpected("NAVIGATE_AUTOMATION_WINDOW", &other)),
    };
    executor.set_tab(tab_id);

    let load_timeout = executor.options().load_timeout;
    let reply = port
        .request(OrchestratorRequest::WaitForPageLoad {
            tab_id,
            timeout: Some(load_timeout.as_millis() as u64),
        })
        .await;
    match reply {
        OrchestratorReply::PageLoad {
            timeout: Some(true),
            ..
        } => Err(ActionError::Timeout {
            what: format!("load of {target}"),
            after_ms: load_timeout.as_millis() as u64,
        }),
        OrchestratorReply::PageLoad { url, .. } => {
            debug!(%tab_id, %url, "page loaded");
            Ok(NavigateOutcome {
                tab_id,
                window_id,
                url,
            })
        }
        OrchestratorReply::Failure { error, .. } => Err(ActionError::ContextUnavailable(error)),
        other => Err(unexpected("WAIT_FOR_PAGE_LOAD", &other)),
    }
}

pub fn search_url(template: &str, query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
    template.replace("{query}", &encoded)
}

pub async fn execute_search(
    executor: &ActionExecutor,
    query: &str,
) -> Result<SearchResults, ActionError> {
    if query.trim().is_empty() {
        return Err(ActionError::InvalidArgument("empty search query".into()));
    }
    let url = search_url(&executor.options().search_url_template, query);
    info!(query, %url, "executing search");
    let navigated = execute_navigate(executor, &url).await?;

    let reply = executor
        .orchestrator()?
        .request(OrchestratorRequest::ExtractSearchResultsFromTab {
            tab_id: navigated.tab_id,
        })
        .await;
    match reply {
        OrchestratorReply::SearchResults { results, debug, .. } => {
            Ok(SearchResults { results, debug })
        }
        OrchestratorReply::Failure { error, .. } => Err(ActionError::ContextUnavailable(error)),
        other => Err(unexpected("EXTRACT_SEARCH_RESULTS_FROM_TAB", &other)),
    }
}

fn unexpected(request: &str, reply: &OrchestratorReply) -> ActionError {
    ActionError::Internal(format!("unexpected reply to {request}: {}", reply.to_value()))
}

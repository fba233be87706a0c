//! Action verbs
//!
//! Seven verbs: navigate, click, type_text, search, scroll, wait and
//! fill_form. Interactive verbs resolve their target through the DOM state
//! engine; navigate and search go through the orchestrator. Every invocation
//! appends exactly one [`ActionRecord`] to the history.

mod click;
mod fill_form;
mod navigate;
mod scroll;
mod type_text;
mod wait;

use std::sync::Arc;

use async_trait::async_trait;
use data_extractor::SearchResults;
use extensions_bridge::OrchestratorPort;
use pagepilot_core_types::{now_millis, TabId, TaskId};
use parking_lot::{Mutex, RwLock};
use perceiver_structural::{DomStateEngine, ElementDescriptor};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::ActionError;
use crate::types::{
    ActionHistory, ActionRecord, ExecutorOptions, FilledField, FormField, NavigateOutcome,
    ScrollDirection, ScrollPosition, WaitOutcome, WaitTarget,
};

/// The verb surface of the executor.
#[async_trait]
pub trait ActionPrimitives: Send + Sync {
    /// Point the task's automation window at `url` and wait for it to load
    async fn navigate(&self, url: &str) -> Result<NavigateOutcome, ActionError>;

    /// Click the element best matching `description`
    async fn click(&self, description: &str) -> Result<ElementDescriptor, ActionError>;

    /// Replace the value of a text field, one character at a time
    async fn type_text(
        &self,
        description: &str,
        text: &str,
    ) -> Result<ElementDescriptor, ActionError>;

    /// Run a web search in the automation window and return its results
    async fn search(&self, query: &str) -> Result<SearchResults, ActionError>;

    /// Scroll the viewport; `amount` defaults to one viewport height
    async fn scroll(
        &self,
        direction: ScrollDirection,
        amount: Option<f64>,
    ) -> Result<ScrollPosition, ActionError>;

    /// Wait for a duration, a document predicate or a visible element
    async fn wait(&self, target: WaitTarget) -> Result<WaitOutcome, ActionError>;

    /// Fill several fields in order; fails if any field failed
    async fn fill_form(&self, fields: &[FormField]) -> Result<Vec<FilledField>, ActionError>;
}

/// Executes verbs against one acting document and, for navigation, one
/// orchestrator.
pub struct ActionExecutor {
    engine: RwLock<Arc<DomStateEngine>>,
    orchestrator: Option<Arc<dyn OrchestratorPort>>,
    task_id: TaskId,
    options: ExecutorOptions,
    history: Arc<Mutex<ActionHistory>>,
    tab: Mutex<Option<TabId>>,
}

impl ActionExecutor {
    pub fn new(engine: Arc<DomStateEngine>, options: ExecutorOptions) -> Self {
        Self {
            engine: RwLock::new(engine),
            orchestrator: None,
            task_id: TaskId::new(),
            history: Arc::new(Mutex::new(ActionHistory::new(options.history_capacity))),
            options,
            tab: Mutex::new(None),
        }
    }

    pub fn with_orchestrator(mut self, task_id: TaskId, port: Arc<dyn OrchestratorPort>) -> Self {
        self.task_id = task_id;
        self.orchestrator = Some(port);
        self
    }

    /// Act on a different document from now on, e.g. the automation tab
    /// after a navigation.
    pub fn bind(&self, engine: Arc<DomStateEngine>) {
        *self.engine.write() = engine;
    }

    pub fn engine(&self) -> Arc<DomStateEngine> {
        self.engine.read().clone()
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Automation tab addressed by the last successful navigation.
    pub fn tab(&self) -> Option<TabId> {
        *self.tab.lock()
    }

    pub(crate) fn set_tab(&self, tab: TabId) {
        *self.tab.lock() = Some(tab);
    }

    pub(crate) fn orchestrator(&self) -> Result<&Arc<dyn OrchestratorPort>, ActionError> {
        self.orchestrator
            .as_ref()
            .ok_or_else(|| ActionError::ContextUnavailable("no orchestrator configured".into()))
    }

    /// Records oldest first.
    pub fn history(&self) -> Vec<ActionRecord> {
        self.history.lock().snapshot()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    fn record<T: Serialize>(
        &self,
        action: &str,
        target: &str,
        outcome: Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        let document_url = self.engine().document().read().url().to_string();
        let record = match &outcome {
            Ok(value) => {
                info!(action, target, "action succeeded");
                ActionRecord {
                    action: action.to_string(),
                    target: target.to_string(),
                    success: true,
                    result: serde_json::to_value(value).ok(),
                    error: None,
                    timestamp_ms: now_millis(),
                    document_url,
                }
            }
            Err(err) => {
                warn!(action, target, error = %err, "action failed");
                ActionRecord {
                    action: action.to_string(),
                    target: target.to_string(),
                    success: false,
                    result: None,
                    error: Some(err.to_string()),
                    timestamp_ms: now_millis(),
                    document_url,
                }
            }
        };
        self.history.lock().push(record);
        outcome
    }
}

#[async_trait]
impl ActionPrimitives for ActionExecutor {
    async fn navigate(&self, url: &str) -> Result<NavigateOutcome, ActionError> {
        let outcome = navigate::execute_navigate(self, url).await;
        self.record("navigate", url, outcome)
    }

    async fn click(&self, description: &str) -> Result<ElementDescriptor, ActionError> {
        let outcome = click::execute_click(self, description).await;
        self.record("click", description, outcome)
    }

    async fn type_text(
        &self,
        description: &str,
        text: &str,
    ) -> Result<ElementDescriptor, ActionError> {
        let outcome = type_text::execute_type_text(self, description, text).await;
        self.record("type", description, outcome)
    }

    async fn search(&self, query: &str) -> Result<SearchResults, ActionError> {
        let outcome = navigate::execute_search(self, query).await;
        self.record("search", query, outcome)
    }

    async fn scroll(
        &self,
        direction: ScrollDirection,
        amount: Option<f64>,
    ) -> Result<ScrollPosition, ActionError> {
        let outcome = scroll::execute_scroll(self, direction, amount).await;
        self.record("scroll", &format!("{direction:?}").to_lowercase(), outcome)
    }

    async fn wait(&self, target: WaitTarget) -> Result<WaitOutcome, ActionError> {
        let label = target.to_string();
        let outcome = wait::execute_wait(self, target).await;
        self.record("wait", &label, outcome)
    }

    async fn fill_form(&self, fields: &[FormField]) -> Result<Vec<FilledField>, ActionError> {
        let label = fields
            .iter()
            .map(|field| field.field.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let outcome = fill_form::execute_fill_form(self, fields).await;
        self.record("fill_form", &label, outcome)
    }
}

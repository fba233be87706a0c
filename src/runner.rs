//! Sequential step runner.
//!
//! Drives a [`Plan`] through the action executor against the in-memory
//! browser. After every navigation the executor is re-bound to the document
//! of the automation tab, and the task window is closed when the plan ends.

use std::sync::Arc;

use action_primitives::{
    ActionExecutor, ActionPrimitives, ActionRecord, FormField, ScrollDirection, WaitTarget,
};
use extensions_bridge::{BridgeConfig, TabBridge};
use pagepilot_core_types::TaskId;
use perceiver_structural::{DomStateEngine, ElementDescriptor, LiveDocument, SharedDocument};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use window_orchestrator::{InMemoryBrowser, OrchestratorError, PageSource, WindowOrchestrator};

use crate::config::Config;
use crate::errors::PagePilotError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub task_id: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Step {
    Navigate {
        url: String,
    },
    Click {
        target: String,
    },
    Type {
        target: String,
        text: String,
    },
    Search {
        query: String,
    },
    Scroll {
        direction: ScrollDirection,
        #[serde(default)]
        amount: Option<f64>,
    },
    /// Either a humantime `duration` or an `element` to wait for.
    Wait {
        #[serde(default)]
        duration: Option<String>,
        #[serde(default)]
        element: Option<String>,
    },
    Fill {
        fields: Vec<FormField>,
    },
    Extract {
        #[serde(default)]
        data_type: Option<String>,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Navigate { .. } => "navigate",
            Step::Click { .. } => "click",
            Step::Type { .. } => "type",
            Step::Search { .. } => "search",
            Step::Scroll { .. } => "scroll",
            Step::Wait { .. } => "wait",
            Step::Fill { .. } => "fill",
            Step::Extract { .. } => "extract",
        }
    }
}

impl Plan {
    pub fn from_yaml(content: &str) -> Result<Self, PagePilotError> {
        let plan: Plan =
            serde_yaml::from_str(content).map_err(|err| PagePilotError::Plan(err.to_string()))?;
        if plan.steps.is_empty() {
            return Err(PagePilotError::Plan("plan has no steps".to_string()));
        }
        Ok(plan)
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
            .as_deref()
            .map(TaskId::from)
            .unwrap_or_else(TaskId::new)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub task_id: TaskId,
    /// False when a step failed; the remaining steps were not run.
    pub completed: bool,
    pub steps: Vec<StepReport>,
    pub history: Vec<ActionRecord>,
}

pub struct PlanRunner {
    browser: Arc<InMemoryBrowser>,
    orchestrator: Arc<WindowOrchestrator>,
    config: Config,
}

impl PlanRunner {
    pub fn new(source: Arc<dyn PageSource>, config: &Config) -> Self {
        let bridge = TabBridge::new(BridgeConfig::default());
        let browser = Arc::new(InMemoryBrowser::new(source, bridge));
        let orchestrator = Arc::new(WindowOrchestrator::new(
            browser.clone(),
            config.orchestrator_config(),
        ));
        Self {
            browser,
            orchestrator,
            config: config.clone(),
        }
    }

    pub fn browser(&self) -> &Arc<InMemoryBrowser> {
        &self.browser
    }

    pub fn orchestrator(&self) -> &Arc<WindowOrchestrator> {
        &self.orchestrator
    }

    fn engine_over(&self, document: SharedDocument) -> Arc<DomStateEngine> {
        Arc::new(DomStateEngine::with_options(
            document,
            self.config.engine_options(),
        ))
    }

    #[instrument(skip_all, fields(steps = plan.steps.len()))]
    pub async fn run(&self, plan: &Plan) -> RunReport {
        let task_id = plan.task_id();
        let executor = ActionExecutor::new(
            self.engine_over(LiveDocument::blank().into_shared()),
            self.config.executor_options(),
        )
        .with_orchestrator(task_id.clone(), self.orchestrator.clone());

        let mut steps = Vec::with_capacity(plan.steps.len());
        let mut completed = true;
        for (index, step) in plan.steps.iter().enumerate() {
            match self.run_step(&executor, step).await {
                Ok(output) => {
                    info!(index, action = step.name(), "step succeeded");
                    steps.push(StepReport {
                        index,
                        action: step.name(),
                        success: true,
                        output: Some(output),
                        error: None,
                    });
                }
                Err(err) => {
                    warn!(index, action = step.name(), error = %err, "step failed; stopping plan");
                    steps.push(StepReport {
                        index,
                        action: step.name(),
                        success: false,
                        output: None,
                        error: Some(err.to_string()),
                    });
                    completed = false;
                    break;
                }
            }
        }

        self.orchestrator.close_window(&task_id).await;
        RunReport {
            task_id,
            completed,
            steps,
            history: executor.history(),
        }
    }

    async fn run_step(
        &self,
        executor: &ActionExecutor,
        step: &Step,
    ) -> Result<Value, PagePilotError> {
        let output = match step {
            Step::Navigate { url } => {
                let outcome = executor.navigate(url).await?;
                self.rebind(executor)?;
                serde_json::to_value(outcome)?
            }
            Step::Search { query } => {
                let found = executor.search(query).await?;
                self.rebind(executor)?;
                serde_json::to_value(found)?
            }
            Step::Click { target } => describe(&executor.click(target).await?),
            Step::Type { target, text } => describe(&executor.type_text(target, text).await?),
            Step::Scroll { direction, amount } => {
                serde_json::to_value(executor.scroll(*direction, *amount).await?)?
            }
            Step::Wait { duration, element } => {
                let target = wait_target(duration.as_deref(), element.as_deref())?;
                serde_json::to_value(executor.wait(target).await?)?
            }
            Step::Fill { fields } => serde_json::to_value(executor.fill_form(fields).await?)?,
            Step::Extract { data_type } => {
                let tab = executor.tab().ok_or_else(|| {
                    PagePilotError::Plan("extract needs an open page; navigate first".to_string())
                })?;
                let data = self
                    .orchestrator
                    .extract_from_tab(tab, data_type.as_deref())
                    .await?;
                serde_json::to_value(data)?
            }
        };
        Ok(output)
    }

    /// Point the executor at the automation tab's live document.
    fn rebind(&self, executor: &ActionExecutor) -> Result<(), PagePilotError> {
        let tab = executor
            .tab()
            .ok_or_else(|| PagePilotError::Plan("navigation did not report a tab".to_string()))?;
        let document = self
            .browser
            .document(tab)
            .ok_or(OrchestratorError::TabNotFound(tab))?;
        executor.bind(self.engine_over(document));
        Ok(())
    }
}

fn describe(descriptor: &ElementDescriptor) -> Value {
    json!({
        "selector": descriptor.selector,
        "tag": descriptor.tag_name,
        "text": descriptor.text,
    })
}

fn wait_target(
    duration: Option<&str>,
    element: Option<&str>,
) -> Result<WaitTarget, PagePilotError> {
    match (duration, element) {
        (Some(duration), None) => humantime::parse_duration(duration)
            .map(WaitTarget::Duration)
            .map_err(|err| PagePilotError::Plan(format!("invalid wait duration `{duration}`: {err}"))),
        (None, Some(element)) => Ok(WaitTarget::Element(element.to_string())),
        _ => Err(PagePilotError::Plan(
            "wait takes exactly one of `duration` or `element`".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn plans_parse_from_yaml() {
        let plan = Plan::from_yaml(
            r#"
task_id: signup
steps:
  - action: navigate
    url: https://app.test/
  - action: scroll
    direction: down
  - action: wait
    duration: 250ms
  - action: fill
    fields:
      - field: Email
        value: ada@example.test
  - action: extract
"#,
        )
        .unwrap();
        assert_eq!(plan.task_id().as_str(), "signup");
        assert_eq!(plan.steps.len(), 5);
        assert_eq!(
            plan.steps[1],
            Step::Scroll {
                direction: ScrollDirection::Down,
                amount: None
            }
        );
        assert_eq!(plan.steps[4], Step::Extract { data_type: None });
    }

    #[test]
    fn empty_and_unknown_steps_are_rejected() {
        assert!(Plan::from_yaml("steps: []").is_err());
        assert!(Plan::from_yaml("steps:\n  - action: teleport\n").is_err());
    }

    #[test]
    fn wait_needs_exactly_one_target() {
        assert!(matches!(
            wait_target(Some("1s"), None),
            Ok(WaitTarget::Duration(d)) if d == Duration::from_secs(1)
        ));
        assert!(wait_target(None, None).is_err());
        assert!(wait_target(Some("1s"), Some("Done")).is_err());
        assert!(wait_target(Some("whenever"), None).is_err());
    }
}

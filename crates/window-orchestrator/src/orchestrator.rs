use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use data_extractor::{ExtractionResult, SearchResults};
use extensions_bridge::{TabReply, TabRequest, WindowOptions};
use pagepilot_core_types::{ScheduledTask, TabId, TaskId};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::OrchestratorError;
use crate::metrics::{OrchestratorMetrics, OrchestratorMetricsSnapshot};
use crate::model::{AutomationWindow, EnsuredWindow, LoadOutcome, OrchestratorConfig};
use crate::port::{BrowserPort, TabStatus, WindowSpec};

/// Owns one automation window per task and relays requests into its tabs.
pub struct WindowOrchestrator {
    browser: Arc<dyn BrowserPort>,
    config: OrchestratorConfig,
    windows: DashMap<TaskId, AutomationWindow>,
    metrics: OrchestratorMetrics,
}

impl WindowOrchestrator {
    pub fn new(browser: Arc<dyn BrowserPort>, config: OrchestratorConfig) -> Self {
        Self {
            browser,
            config,
            windows: DashMap::new(),
            metrics: OrchestratorMetrics::default(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn metrics(&self) -> OrchestratorMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn window(&self, task_id: &TaskId) -> Option<AutomationWindow> {
        self.windows.get(task_id).map(|entry| entry.value().clone())
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Default options for windows created on behalf of a navigation.
    pub fn default_window_options(&self) -> WindowOptions {
        WindowOptions {
            minimized: self.config.start_minimized,
            ..WindowOptions::default()
        }
    }

    /// Return the task's window, creating it when missing or when the tracked
    /// handle no longer exists. A `url` is loaded into the origin tab either
    /// way.
    #[instrument(skip_all, fields(task = %task_id))]
    pub async fn ensure_window(
        &self,
        task_id: &TaskId,
        url: Option<&str>,
        options: &WindowOptions,
    ) -> Result<EnsuredWindow, OrchestratorError> {
        if let Some(url) = url {
            validate_url(url)?;
        }

        let tracked = self.window(task_id);
        if let Some(window) = tracked {
            match self.browser.probe_window(window.window_id).await {
                Ok(()) => {
                    if let Some(url) = url {
                        self.browser.update_tab(window.origin_tab_id, url).await?;
                    }
                    self.metrics.record_reused();
                    debug!(window = %window.window_id, "reusing automation window");
                    return Ok(EnsuredWindow {
                        window_id: window.window_id,
                        tab_id: window.origin_tab_id,
                        reused: true,
                    });
                }
                Err(err) => {
                    warn!(window = %window.window_id, error = %err, "automation window is gone; recreating");
                    self.windows.remove(task_id);
                    self.metrics.record_evicted();
                }
            }
        }

        let spec = WindowSpec {
            url: url.map(str::to_string),
            focused: options.focused,
            width: options.width,
            height: options.height,
        };
        let created = self.browser.create_window(&spec).await?;
        if options.minimized {
            if let Err(err) = self.browser.minimize_window(created.window_id).await {
                warn!(window = %created.window_id, error = %err, "could not minimize automation window");
            }
        }
        self.windows.insert(
            task_id.clone(),
            AutomationWindow::new(task_id.clone(), created.window_id, created.tab_id),
        );
        self.metrics.record_created();
        info!(window = %created.window_id, tab = %created.tab_id, "automation window created");
        Ok(EnsuredWindow {
            window_id: created.window_id,
            tab_id: created.tab_id,
            reused: false,
        })
    }

    pub async fn navigate_in_window(
        &self,
        task_id: &TaskId,
        url: &str,
    ) -> Result<EnsuredWindow, OrchestratorError> {
        let options = self.default_window_options();
        let ensured = self.ensure_window(task_id, Some(url), &options).await?;
        info!(task = %task_id, tab = %ensured.tab_id, url, "navigated automation tab");
        Ok(ensured)
    }

    /// Open another tab in the task's window.
    pub async fn open_tab(&self, task_id: &TaskId, url: &str) -> Result<TabId, OrchestratorError> {
        validate_url(url)?;
        let options = self.default_window_options();
        let ensured = self.ensure_window(task_id, None, &options).await?;
        let tab = self.browser.open_tab(ensured.window_id, url).await?;
        self.windows
            .get_mut(task_id)
            .ok_or_else(|| OrchestratorError::NoWindow(task_id.clone()))?
            .track_tab(tab);
        debug!(task = %task_id, %tab, url, "opened tab");
        Ok(tab)
    }

    /// Forget the task's window and close it. Returns false when the task had
    /// no window.
    pub async fn close_window(&self, task_id: &TaskId) -> bool {
        let Some((_, window)) = self.windows.remove(task_id) else {
            return false;
        };
        if let Err(err) = self.browser.remove_window(window.window_id).await {
            warn!(window = %window.window_id, error = %err, "window was already gone");
        }
        info!(task = %task_id, window = %window.window_id, "automation window closed");
        true
    }

    /// Poll the tab's status until it reports complete or `timeout` passes.
    pub async fn wait_for_load(
        &self,
        tab: TabId,
        timeout: Duration,
    ) -> Result<LoadOutcome, OrchestratorError> {
        let started = Instant::now();
        loop {
            let info = self.browser.tab_info(tab).await?;
            if info.status == TabStatus::Complete {
                return Ok(LoadOutcome {
                    settled: true,
                    url: info.url,
                });
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                debug!(%tab, waited_ms = elapsed.as_millis() as u64, "tab still loading");
                return Ok(LoadOutcome {
                    settled: false,
                    url: info.url,
                });
            }
            sleep(self.config.load_poll_interval.min(timeout - elapsed)).await;
        }
    }

    pub async fn extract_from_tab(
        &self,
        tab: TabId,
        data_type: Option<&str>,
    ) -> Result<ExtractionResult, OrchestratorError> {
        let request = TabRequest::ExtractData {
            data_type: data_type.map(str::to_string),
        };
        self.relay(tab, request, |reply| match reply {
            TabReply::Data { data, .. } => Ok(data),
            TabReply::Failure { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        })
        .await
    }

    pub async fn extract_search_results_from_tab(
        &self,
        tab: TabId,
    ) -> Result<SearchResults, OrchestratorError> {
        self.relay(tab, TabRequest::ExtractSearchResults, |reply| match reply {
            TabReply::SearchResults { results, debug, .. } => Ok(SearchResults { results, debug }),
            TabReply::Failure { error, .. } => Err(error),
            other => Err(unexpected(&other)),
        })
        .await
    }

    /// Send `request` into the tab with the retry policy: wait for load
    /// before every attempt, settle before the first, back off linearly
    /// between attempts. Missing and failed replies are both retried.
    #[instrument(skip_all, fields(%tab, op = request.kind()))]
    async fn relay<T, F>(
        &self,
        tab: TabId,
        request: TabRequest,
        accept: F,
    ) -> Result<T, OrchestratorError>
    where
        F: Fn(TabReply) -> Result<T, String>,
    {
        let policy = &self.config.retry;
        let mut last = String::from("no attempt made");
        for attempt in 1..=policy.max_attempts {
            self.metrics.record_attempt();
            match self.browser.tab_info(tab).await {
                Ok(info) if info.status == TabStatus::Complete => {}
                Ok(_) => {
                    let load = self.wait_for_load(tab, policy.load_timeout).await?;
                    if !load.settled {
                        debug!(attempt, "tab did not finish loading; trying anyway");
                    }
                }
                Err(err) => return Err(err),
            }
            if attempt == 1 && !policy.first_attempt_settle.is_zero() {
                sleep(policy.first_attempt_settle).await;
            }

            let outcome = self
                .browser
                .send_to_tab(tab, request.clone(), self.config.message_deadline)
                .await;
            match outcome {
                Ok(reply) => match accept(reply) {
                    Ok(value) => {
                        info!(attempt, "tab request succeeded");
                        return Ok(value);
                    }
                    Err(error) => last = error,
                },
                Err(err) => last = err.to_string(),
            }
            warn!(attempt, max = policy.max_attempts, error = %last, "tab request attempt failed");
            if attempt < policy.max_attempts {
                sleep(policy.backoff(attempt)).await;
            }
        }
        self.metrics.record_exhausted();
        Err(OrchestratorError::Exhausted {
            attempts: policy.max_attempts,
            last,
        })
    }

    /// Close every window older than the configured maximum age.
    pub async fn sweep_stale(&self) -> usize {
        let max_age = self.config.max_window_age;
        let stale: Vec<TaskId> = self
            .windows
            .iter()
            .filter(|entry| entry.value().age() >= max_age)
            .map(|entry| entry.key().clone())
            .collect();
        let mut closed = 0;
        for task_id in stale {
            if self.close_window(&task_id).await {
                closed += 1;
            }
        }
        self.metrics.record_swept(closed);
        if closed > 0 {
            info!(closed, "swept stale automation windows");
        }
        closed
    }

    /// Run [`Self::sweep_stale`] every sweep period until the handle drops.
    pub fn spawn_sweeper(self: &Arc<Self>) -> ScheduledTask {
        let orchestrator = Arc::downgrade(self);
        ScheduledTask::every("window-sweep", self.config.sweep_period, move || {
            let orchestrator = orchestrator.clone();
            async move {
                if let Some(orchestrator) = orchestrator.upgrade() {
                    orchestrator.sweep_stale().await;
                }
            }
        })
    }
}

fn validate_url(url: &str) -> Result<(), OrchestratorError> {
    Url::parse(url)
        .map(|_| ())
        .map_err(|_| OrchestratorError::InvalidUrl(url.to_string()))
}

fn unexpected(reply: &TabReply) -> String {
    let shape = match reply {
        TabReply::Failure { .. } => "failure",
        TabReply::SearchResults { .. } => "search results",
        TabReply::Data { .. } => "extracted data",
        TabReply::Login { .. } => "login check",
    };
    format!("unexpected {shape} reply")
}

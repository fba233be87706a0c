use std::time::Duration;

use pagepilot_core_types::{TabId, TaskId, WindowId};
use serde::Serialize;
use tokio::time::Instant;

/// The browsing window owned on behalf of one task.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationWindow {
    pub task_id: TaskId,
    pub window_id: WindowId,
    /// Tabs in the order they were opened; the origin tab comes first.
    pub tab_ids: Vec<TabId>,
    pub origin_tab_id: TabId,
    pub created_at_ms: i64,
    #[serde(skip)]
    pub(crate) opened: Instant,
}

impl AutomationWindow {
    pub(crate) fn new(task_id: TaskId, window_id: WindowId, origin_tab_id: TabId) -> Self {
        Self {
            task_id,
            window_id,
            tab_ids: vec![origin_tab_id],
            origin_tab_id,
            created_at_ms: pagepilot_core_types::now_millis(),
            opened: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.opened.elapsed()
    }

    pub(crate) fn track_tab(&mut self, tab: TabId) {
        if !self.tab_ids.contains(&tab) {
            self.tab_ids.push(tab);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsuredWindow {
    pub window_id: WindowId,
    pub tab_id: TabId,
    pub reused: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOutcome {
    pub settled: bool,
    pub url: String,
}

/// Retry policy for requests relayed into a tab.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Bound on the pre-attempt wait for a tab that is still loading.
    pub load_timeout: Duration,
    /// Extra wait before the first attempt only, while the content script
    /// attaches.
    pub first_attempt_settle: Duration,
    /// Delay after attempt `n` is `n * backoff_step`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            load_timeout: Duration::from_secs(15),
            first_attempt_settle: Duration::from_secs(1),
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub retry: RetryPolicy,
    pub load_poll_interval: Duration,
    /// Deadline for a single message round trip into a tab.
    pub message_deadline: Duration,
    pub sweep_period: Duration,
    pub max_window_age: Duration,
    pub start_minimized: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            load_poll_interval: Duration::from_millis(100),
            message_deadline: Duration::from_secs(30),
            sweep_period: Duration::from_secs(24 * 60 * 60),
            max_window_age: Duration::from_secs(60 * 60),
            start_minimized: true,
        }
    }
}

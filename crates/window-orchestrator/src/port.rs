use std::time::Duration;

use async_trait::async_trait;
use extensions_bridge::{TabReply, TabRequest};
use pagepilot_core_types::{TabId, WindowId};
use serde::Serialize;

use crate::error::OrchestratorError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub tab_id: TabId,
    pub window_id: WindowId,
    pub url: String,
    pub status: TabStatus,
}

/// Creation parameters for a new window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowSpec {
    pub url: Option<String>,
    pub focused: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreatedWindow {
    pub window_id: WindowId,
    pub tab_id: TabId,
}

/// Privileged browser surface the orchestrator drives.
#[async_trait]
pub trait BrowserPort: Send + Sync {
    async fn create_window(&self, spec: &WindowSpec) -> Result<CreatedWindow, OrchestratorError>;

    /// Fails with [`OrchestratorError::WindowNotFound`] once the window is gone.
    async fn probe_window(&self, window: WindowId) -> Result<(), OrchestratorError>;

    async fn minimize_window(&self, window: WindowId) -> Result<(), OrchestratorError>;

    async fn remove_window(&self, window: WindowId) -> Result<(), OrchestratorError>;

    async fn open_tab(&self, window: WindowId, url: &str) -> Result<TabId, OrchestratorError>;

    async fn update_tab(&self, tab: TabId, url: &str) -> Result<(), OrchestratorError>;

    async fn tab_info(&self, tab: TabId) -> Result<TabInfo, OrchestratorError>;

    async fn send_to_tab(
        &self,
        tab: TabId,
        request: TabRequest,
        deadline: Duration,
    ) -> Result<TabReply, OrchestratorError>;
}

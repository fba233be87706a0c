//! Message contract between the acting context, the orchestrator and the
//! tab-local agents.
//!
//! Requests are tagged by a SCREAMING_SNAKE_CASE `type` field with camelCase
//! fields. Replies are plain data and always carry `success`.

use data_extractor::{ExtractionResult, LoginCheck, SearchDebug, SearchResult};
use pagepilot_core_types::{TabId, TaskId, WindowId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::BridgeError;

/// How a freshly created automation window is presented.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowOptions {
    pub focused: bool,
    pub minimized: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            focused: false,
            minimized: true,
            width: None,
            height: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum OrchestratorRequest {
    NavigateAutomationWindow {
        task_id: TaskId,
        url: String,
    },
    CreateAutomationWindow {
        task_id: TaskId,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        options: WindowOptions,
    },
    CloseAutomationWindow {
        task_id: TaskId,
    },
    WaitForPageLoad {
        tab_id: TabId,
        /// Milliseconds; the orchestrator default applies when absent.
        #[serde(default)]
        timeout: Option<u64>,
    },
    ExtractFromTab {
        tab_id: TabId,
        #[serde(default)]
        data_type: Option<String>,
    },
    ExtractSearchResultsFromTab {
        tab_id: TabId,
    },
}

impl OrchestratorRequest {
    pub const TYPES: [&'static str; 6] = [
        "NAVIGATE_AUTOMATION_WINDOW",
        "CREATE_AUTOMATION_WINDOW",
        "CLOSE_AUTOMATION_WINDOW",
        "WAIT_FOR_PAGE_LOAD",
        "EXTRACT_FROM_TAB",
        "EXTRACT_SEARCH_RESULTS_FROM_TAB",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorRequest::NavigateAutomationWindow { .. } => Self::TYPES[0],
            OrchestratorRequest::CreateAutomationWindow { .. } => Self::TYPES[1],
            OrchestratorRequest::CloseAutomationWindow { .. } => Self::TYPES[2],
            OrchestratorRequest::WaitForPageLoad { .. } => Self::TYPES[3],
            OrchestratorRequest::ExtractFromTab { .. } => Self::TYPES[4],
            OrchestratorRequest::ExtractSearchResultsFromTab { .. } => Self::TYPES[5],
        }
    }

    /// Decode a raw message. A missing or unrecognised `type` is a protocol
    /// error, never a silent no-op.
    pub fn from_value(value: Value) -> Result<Self, BridgeError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::protocol("message has no `type` field"))?;
        if !Self::TYPES.contains(&kind) {
            return Err(BridgeError::protocol(format!("unknown message type `{kind}`")));
        }
        serde_json::from_value(value).map_err(|err| BridgeError::protocol(err.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum OrchestratorReply {
    Failure {
        success: bool,
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attempts: Option<u32>,
    },
    SearchResults {
        success: bool,
        results: Vec<SearchResult>,
        debug: SearchDebug,
    },
    Extracted {
        success: bool,
        data: ExtractionResult,
    },
    WindowReady {
        success: bool,
        window_id: WindowId,
        tab_id: TabId,
        reused: bool,
    },
    PageLoad {
        success: bool,
        tab_id: TabId,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout: Option<bool>,
    },
    Navigated {
        success: bool,
        tab_id: TabId,
        window_id: WindowId,
    },
    Closed {
        success: bool,
    },
}

impl OrchestratorReply {
    pub fn failure(error: impl ToString) -> Self {
        OrchestratorReply::Failure {
            success: false,
            error: error.to_string(),
            attempts: None,
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            OrchestratorReply::Failure { success, .. }
            | OrchestratorReply::SearchResults { success, .. }
            | OrchestratorReply::Extracted { success, .. }
            | OrchestratorReply::WindowReady { success, .. }
            | OrchestratorReply::PageLoad { success, .. }
            | OrchestratorReply::Navigated { success, .. }
            | OrchestratorReply::Closed { success } => *success,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OrchestratorReply::Failure { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self)
            .unwrap_or_else(|err| serde_json::json!({ "success": false, "error": err.to_string() }))
    }
}

/// Requests handled inside one tab by its agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum TabRequest {
    ExtractData {
        #[serde(default)]
        data_type: Option<String>,
    },
    ExtractSearchResults,
    CheckLoginRequired,
}

impl TabRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            TabRequest::ExtractData { .. } => "EXTRACT_DATA",
            TabRequest::ExtractSearchResults => "EXTRACT_SEARCH_RESULTS",
            TabRequest::CheckLoginRequired => "CHECK_LOGIN_REQUIRED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum TabReply {
    Failure {
        success: bool,
        error: String,
    },
    SearchResults {
        success: bool,
        results: Vec<SearchResult>,
        debug: SearchDebug,
    },
    Data {
        success: bool,
        data: ExtractionResult,
        url: String,
        title: String,
    },
    Login {
        success: bool,
        #[serde(flatten)]
        check: LoginCheck,
    },
}

impl TabReply {
    pub fn failure(error: impl ToString) -> Self {
        TabReply::Failure {
            success: false,
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            TabReply::Failure { success, .. }
            | TabReply::SearchResults { success, .. }
            | TabReply::Data { success, .. }
            | TabReply::Login { success, .. } => *success,
        }
    }
}

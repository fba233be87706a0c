//! Window orchestrator for PagePilot.
//!
//! Runs in the privileged context: owns one automation window per task,
//! waits for tab loads and relays extraction requests into tabs with a
//! bounded, backed-off retry policy. [`InMemoryBrowser`] is a complete
//! [`BrowserPort`] for tests and the command line runner.

pub mod api;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod port;

pub use error::OrchestratorError;
pub use memory::{InMemoryBrowser, PageSource, StaticPages};
pub use metrics::OrchestratorMetricsSnapshot;
pub use model::{AutomationWindow, EnsuredWindow, LoadOutcome, OrchestratorConfig, RetryPolicy};
pub use orchestrator::WindowOrchestrator;
pub use port::{BrowserPort, CreatedWindow, TabInfo, TabStatus, WindowSpec};

//! PagePilot library
//!
//! Configuration, page sources and the step runner that tie the engine
//! crates together; exposed for the binary and for integration testing.

pub mod cli;
pub mod config;
pub mod errors;
pub mod page_source;
pub mod runner;

pub use config::Config;
pub use errors::PagePilotError;
pub use page_source::{load_fixture_pages, HttpPageSource};
pub use runner::{Plan, PlanRunner, RunReport, Step, StepReport};

//! Action executor for PagePilot
//!
//! This crate turns natural-language steps into document interactions:
//! - navigate, click, type, search, scroll, wait and fill_form verbs
//! - precondition checks with named unmet conditions
//! - a bounded history with one record per verb invocation

pub mod errors;
mod locator;
mod primitives;
pub mod types;
mod waiting;

pub use errors::*;
pub use locator::Intent;
pub use primitives::*;
pub use types::*;
pub use waiting::poll_until;

//! Resolve → verify → bring into view, shared by the interactive verbs

use std::time::Duration;

use perceiver_structural::judges;
use perceiver_structural::resolver::rank;
use perceiver_structural::{DomStateEngine, ElementDescriptor, JudgeReport};
use tracing::debug;

use crate::errors::ActionError;

/// What the caller is about to do with the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Click,
    Edit,
}

/// Resolve a description to one element.
///
/// The engine only offers visible, clickable candidates. When it finds
/// nothing, the same cascade is run over every interactive element so that a
/// hidden or disabled match is reported as a failed precondition instead of
/// as missing.
pub async fn locate(
    engine: &DomStateEngine,
    description: &str,
) -> Result<ElementDescriptor, ActionError> {
    if let Some(found) = engine.resolve(description).await {
        return Ok(found);
    }
    let everything = engine.list_interactive_elements(None);
    match rank::deterministic_match(&everything, description) {
        Some((index, strategy)) => {
            debug!(
                description,
                strategy = strategy.as_str(),
                "matched an element that is not a resolution candidate"
            );
            everything
                .into_iter()
                .nth(index)
                .ok_or_else(|| ActionError::NotFound(description.to_string()))
        }
        None => Err(ActionError::NotFound(description.to_string())),
    }
}

pub fn verify(
    description: &str,
    descriptor: &ElementDescriptor,
    intent: Intent,
) -> Result<(), ActionError> {
    let report = match intent {
        Intent::Click => judges::clickable(&descriptor.state),
        Intent::Edit => judges::editable(&descriptor.state),
    };
    if report.ok {
        Ok(())
    } else {
        Err(unmet(description, report))
    }
}

fn unmet(description: &str, report: JudgeReport) -> ActionError {
    ActionError::Precondition {
        description: description.to_string(),
        reason: report.reason,
        unmet: report.issues,
    }
}

/// Scroll the element into view when it is not already inside the viewport,
/// wait `settle`, and return a fresh descriptor. A click target that is still
/// covered by another element afterwards fails its precondition.
pub async fn bring_into_view(
    engine: &DomStateEngine,
    description: &str,
    descriptor: ElementDescriptor,
    intent: Intent,
    settle: Duration,
) -> Result<ElementDescriptor, ActionError> {
    let fresh = if descriptor.state.is_in_viewport {
        descriptor
    } else {
        engine.document().write().scroll_into_view(descriptor.node);
        engine.invalidate();
        debug!(description, node = %descriptor.node, "scrolled into view; settling");
        tokio::time::sleep(settle).await;
        engine.refresh(&descriptor)?
    };
    if intent == Intent::Click && fresh.state.is_obscured {
        return Err(ActionError::Precondition {
            description: description.to_string(),
            reason: "not_clickable(obscured)".to_string(),
            unmet: vec!["obscured".to_string()],
        });
    }
    Ok(fresh)
}

//! Click verb

use perceiver_structural::{ElementDescriptor, EventKind};
use tracing::{debug, info};

use crate::errors::ActionError;
use crate::locator::{self, Intent};
use crate::primitives::ActionExecutor;

/// Resolve → verify clickable → bring into view → click → confirm the click
/// event reached the element.
pub async fn execute_click(
    executor: &ActionExecutor,
    description: &str,
) -> Result<ElementDescriptor, ActionError> {
    info!(description, "executing click");
    let engine = executor.engine();

    let target = locator::locate(&engine, description).await?;
    locator::verify(description, &target, Intent::Click)?;
    let target = locator::bring_into_view(
        &engine,
        description,
        target,
        Intent::Click,
        executor.options().settle_delay,
    )
    .await?;

    {
        let mut doc = engine.document().write();
        let before = doc.events_for(target.node).count();
        doc.click(target.node);
        let delivered = doc
            .events_for(target.node)
            .skip(before)
            .any(|event| event.kind == EventKind::Click);
        if !delivered {
            return Err(ActionError::Unconfirmed(format!(
                "click did not reach {}",
                target.selector
            )));
        }
    }
    engine.invalidate();
    debug!(selector = %target.selector, "click delivered");
    Ok(target)
}

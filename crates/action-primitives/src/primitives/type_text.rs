//! Type verb

use perceiver_structural::{ElementDescriptor, EventKind, NodeId};
use tracing::{debug, info};

use crate::errors::ActionError;
use crate::locator::{self, Intent};
use crate::primitives::ActionExecutor;

/// Resolve → verify editable → bring into view → focus, clear, insert each
/// character followed by an input event, then one change event → confirm the
/// stored value.
pub async fn execute_type_text(
    executor: &ActionExecutor,
    description: &str,
    text: &str,
) -> Result<ElementDescriptor, ActionError> {
    info!(description, text_length = text.chars().count(), "executing type");
    let engine = executor.engine();

    let target = locator::locate(&engine, description).await?;
    locator::verify(description, &target, Intent::Edit)?;
    let target = locator::bring_into_view(
        &engine,
        description,
        target,
        Intent::Edit,
        executor.options().settle_delay,
    )
    .await?;

    type_into(executor, target.node, text)?;
    debug!(selector = %target.selector, "text typed");
    Ok(target)
}

/// Keystroke simulation on an already verified field.
pub(crate) fn type_into(
    executor: &ActionExecutor,
    node: NodeId,
    text: &str,
) -> Result<(), ActionError> {
    let engine = executor.engine();
    {
        let mut doc = engine.document().write();
        doc.focus(node);
        doc.set_value(node, "");
        for ch in text.chars() {
            doc.insert_char(node, ch);
            doc.dispatch(node, EventKind::Input, Some(ch.to_string()));
        }
        doc.dispatch(node, EventKind::Change, Some(text.to_string()));
        let stored = doc.value(node).unwrap_or_default();
        if stored != text {
            return Err(ActionError::Unconfirmed(format!(
                "field holds `{stored}` after typing `{text}`"
            )));
        }
    }
    engine.invalidate();
    Ok(())
}

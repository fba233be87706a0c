//! Scroll verb

use tracing::info;

use crate::errors::ActionError;
use crate::primitives::ActionExecutor;
use crate::types::{ScrollDirection, ScrollPosition};

pub async fn execute_scroll(
    executor: &ActionExecutor,
    direction: ScrollDirection,
    amount: Option<f64>,
) -> Result<ScrollPosition, ActionError> {
    if let Some(amount) = amount {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ActionError::InvalidArgument(format!(
                "scroll amount must be a non-negative number, got {amount}"
            )));
        }
    }
    let engine = executor.engine();
    let position = {
        let mut doc = engine.document().write();
        let current = doc.viewport();
        let step = amount.unwrap_or(current.height);
        match direction {
            ScrollDirection::Up => doc.scroll_by(0.0, -step),
            ScrollDirection::Down => doc.scroll_by(0.0, step),
            ScrollDirection::Top => doc.scroll_to(current.scroll_x, 0.0),
            ScrollDirection::Bottom => {
                let (_, max_y) = doc.max_scroll();
                doc.scroll_to(current.scroll_x, max_y);
            }
        }
        let viewport = doc.viewport();
        ScrollPosition {
            x: viewport.scroll_x,
            y: viewport.scroll_y,
        }
    };
    engine.invalidate();
    info!(?direction, x = position.x, y = position.y, "scrolled");
    Ok(position)
}

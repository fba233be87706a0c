//! Wait verb

use tokio::time::{sleep, Instant};
use tracing::info;

use crate::errors::ActionError;
use crate::primitives::ActionExecutor;
use crate::types::{WaitOutcome, WaitTarget};
use crate::waiting::poll_until;

pub async fn execute_wait(
    executor: &ActionExecutor,
    target: WaitTarget,
) -> Result<WaitOutcome, ActionError> {
    info!(target = %target, "executing wait");
    let options = executor.options();
    let waited_ms = match target {
        WaitTarget::Duration(duration) => {
            let started = Instant::now();
            sleep(duration).await;
            started.elapsed().as_millis() as u64
        }
        WaitTarget::Predicate(check) => {
            poll_until("predicate", options.wait_timeout, options.poll_interval, || {
                let engine = executor.engine();
                let met = check(&engine.document().read());
                async move { met }
            })
            .await?
        }
        WaitTarget::Element(description) => {
            let what = format!("element `{description}`");
            let description = description.as_str();
            poll_until(&what, options.wait_timeout, options.poll_interval, move || async move {
                executor
                    .engine()
                    .resolve(description)
                    .await
                    .map(|found| found.state.is_visible)
                    .unwrap_or(false)
            })
            .await?
        }
    };
    Ok(WaitOutcome { waited_ms })
}

//! Polling used by `wait` and by orchestrator-routed verbs

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::errors::ActionError;

/// Poll `check` every `interval` until it returns true or `timeout` has
/// elapsed. The check runs once immediately. Returns the waited time in ms.
pub async fn poll_until<F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<u64, ActionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let started = Instant::now();
    let deadline = started + timeout;
    let mut polls = 0u32;
    loop {
        polls += 1;
        if check().await {
            debug!(what, polls, "wait condition met");
            return Ok(started.elapsed().as_millis() as u64);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(ActionError::Timeout {
                what: what.to_string(),
                after_ms: timeout.as_millis() as u64,
            });
        }
        sleep(interval.min(deadline - now)).await;
    }
}

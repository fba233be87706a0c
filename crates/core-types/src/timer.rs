//! Cancellable scheduled work.
//!
//! Background timers (load completion, periodic sweeps) are owned through a
//! [`ScheduledTask`] handle instead of being spawned and forgotten. Dropping the
//! handle cancels the task. All waiting goes through `tokio::time`, so tests can
//! pause and advance the clock deterministically.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct ScheduledTask {
    name: &'static str,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Run `work` once after `delay` unless cancelled first.
    pub fn after<F>(name: &'static str, delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {
                    debug!(task = name, "scheduled task cancelled before firing");
                }
                _ = tokio::time::sleep(delay) => {
                    work.await;
                }
            }
        });
        Self {
            name,
            token,
            handle: Some(handle),
        }
    }

    /// Run `tick` every `period`, starting one period from now.
    pub fn every<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = child.cancelled() => {
                        debug!(task = name, "periodic task cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        tick().await;
                    }
                }
            }
        });
        Self {
            name,
            token,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(true)
    }

    /// Wait for the task to stop, whether it fired or was cancelled.
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

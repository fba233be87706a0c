//! Registry of tab endpoints and the request/reply round trip to them.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use pagepilot_core_types::TabId;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::agent::TabEndpoint;
use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::messages::{TabReply, TabRequest};

/// Logical channel identifier; a new one is issued on every attach.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

pub type BridgeEventBus = broadcast::Sender<BridgeEvent>;

/// Events emitted by the bridge to observers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BridgeEvent {
    ChannelOpen { tab: TabId, channel: ChannelId },
    ChannelClosed { tab: TabId, channel: ChannelId },
    InvokeOk { tab: TabId, op: String },
    InvokeFail { tab: TabId, op: String, error: String },
}

struct Attached {
    channel: ChannelId,
    endpoint: Arc<dyn TabEndpoint>,
}

/// Routes tab-local requests to whatever endpoint is attached to a tab.
pub struct TabBridge {
    events: BridgeEventBus,
    config: BridgeConfig,
    endpoints: DashMap<TabId, Attached>,
}

impl TabBridge {
    pub fn new(config: BridgeConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Arc::new(Self {
            events,
            config,
            endpoints: DashMap::new(),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    pub fn default_deadline(&self) -> Duration {
        Duration::from_millis(self.config.deadline_ms)
    }

    /// Attach an endpoint, replacing any previous one for the tab.
    pub fn attach(&self, tab: TabId, endpoint: Arc<dyn TabEndpoint>) -> ChannelId {
        let channel = ChannelId::new();
        if let Some(previous) = self.endpoints.insert(tab, Attached { channel, endpoint }) {
            let _ = self.events.send(BridgeEvent::ChannelClosed {
                tab,
                channel: previous.channel,
            });
        }
        let _ = self.events.send(BridgeEvent::ChannelOpen { tab, channel });
        debug!(%tab, "tab endpoint attached");
        channel
    }

    pub fn detach(&self, tab: TabId) -> bool {
        match self.endpoints.remove(&tab) {
            Some((_, attached)) => {
                let _ = self.events.send(BridgeEvent::ChannelClosed {
                    tab,
                    channel: attached.channel,
                });
                debug!(%tab, "tab endpoint detached");
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self, tab: TabId) -> bool {
        self.endpoints.contains_key(&tab)
    }

    pub fn endpoint(&self, tab: TabId) -> Option<Arc<dyn TabEndpoint>> {
        self.endpoints
            .get(&tab)
            .map(|attached| attached.endpoint.clone())
    }

    /// Send one request and wait for its single reply.
    ///
    /// The handler runs on its own task and answers through a oneshot, so
    /// a handler that finishes without replying surfaces as
    /// [`BridgeError::ChannelClosed`].
    pub async fn invoke(
        &self,
        tab: TabId,
        request: TabRequest,
        deadline: Option<Duration>,
    ) -> Result<TabReply, BridgeError> {
        let op = request.kind().to_string();
        let deadline = deadline.unwrap_or_else(|| self.default_deadline());
        let result = self.round_trip(tab, request, deadline).await;
        match &result {
            Ok(_) => {
                let _ = self.events.send(BridgeEvent::InvokeOk { tab, op });
            }
            Err(err) => {
                warn!(%tab, op = %op, error = %err, "tab request failed");
                let _ = self.events.send(BridgeEvent::InvokeFail {
                    tab,
                    op,
                    error: err.to_string(),
                });
            }
        }
        result
    }

    async fn round_trip(
        &self,
        tab: TabId,
        request: TabRequest,
        deadline: Duration,
    ) -> Result<TabReply, BridgeError> {
        let endpoint = self.endpoint(tab).ok_or(BridgeError::NoReceiver(tab))?;
        let (reply_tx, reply_rx) = oneshot::channel();
        let handler = tokio::spawn(async move {
            let reply = endpoint.handle(request).await;
            let _ = reply_tx.send(reply);
        });
        match tokio::time::timeout(deadline, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(BridgeError::ChannelClosed(tab)),
            Err(_) => {
                handler.abort();
                Err(BridgeError::Timeout {
                    tab,
                    after_ms: deadline.as_millis() as u64,
                })
            }
        }
    }
}

//! PagePilot extensions bridge.
//!
//! Carries the cross-context message contract: typed orchestrator and
//! tab-local requests, the tab-local [`TabAgent`] that answers extraction
//! and login checks, and the [`TabBridge`] that routes requests to
//! whichever agent is attached to a tab.

pub mod agent;
pub mod channel;
pub mod config;
pub mod errors;
pub mod messages;
pub mod port;

pub use agent::{TabAgent, TabEndpoint};
pub use channel::{BridgeEvent, BridgeEventBus, ChannelId, TabBridge};
pub use config::BridgeConfig;
pub use errors::BridgeError;
pub use messages::{OrchestratorReply, OrchestratorRequest, TabReply, TabRequest, WindowOptions};
pub use port::OrchestratorPort;

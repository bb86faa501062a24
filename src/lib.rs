//! Discord bridge for a Minecraft proxy.
//!
//! Relays proxy events (startup, backend registration, joins, chat) to a
//! Discord channel and watches every registered backend server, announcing
//! when one goes down or comes back.

pub mod backends;
pub mod config;
pub mod discord;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::BridgeConfig;
pub use health::LivenessMonitor;
pub use lifecycle::Shutdown;

//! Discord delivery subsystem.
//!
//! # Data Flow
//! ```text
//! relay event / monitor transition
//!     → message.rs (render Outgoing: rich webhook payload + plain fallback)
//!     → transport.rs (choose channel)
//!         → webhook.rs  when a webhook URL is configured
//!         → channel.rs  bot-token channel post otherwise
//! ```
//!
//! # Design Decisions
//! - Monitor notifications are fire-and-forget; failures are logged only
//! - Relay events are awaited in order so chat lines keep their sequence

pub mod channel;
pub mod message;
pub mod transport;
pub mod webhook;

pub use message::Outgoing;
pub use transport::{dispatch, DiscordTransport, NotifyError, Outbox, StatusNotifier};

//! Proxy event relay.
//!
//! # Data Flow
//! ```text
//! host process (stdin, JSON lines) ─┐
//! startup (proxy started)          ─┼→ mpsc<ProxyEvent>
//!                                   │
//!                                   └→ forwarder.rs render → discord outbox
//! ```
//!
//! # Design Decisions
//! - One consumer task keeps Discord output in event order
//! - Server switches are not announced
//! - Backends the monitor watches get their status from the monitor only
//! - Delivery failures are logged; the relay keeps going

pub mod events;
pub mod forwarder;
pub mod ingest;

pub use events::ProxyEvent;
pub use forwarder::Relay;
pub use ingest::read_events;

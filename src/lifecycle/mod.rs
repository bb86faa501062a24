//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     config → relay task → proxy-started notice → monitor (warmup, ticks)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → scheduler jobs stop → relay drains queued events and exits
//!             → proxy-stopping notice is awaited before the process exits
//! ```
//!
//! # Design Decisions
//! - One shared `Shutdown` handle, cloned into every background task
//! - Triggering is idempotent and visible to tasks started afterwards
//! - Backend status is owned by the monitor, never posted from config alone

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown;
pub use startup::{RunningBridge, Startup};

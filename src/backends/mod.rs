//! Backend registry.
//!
//! # Data Flow
//! ```text
//! config [[backends]]
//!     → directory.rs (name → address, swapped atomically)
//!     → health monitor: target snapshot per cycle, address per probe
//!
//! On config reload:
//!     directory.rs replace → BackendChanges
//!     → relay announces registered / unregistered backends
//! ```

pub mod directory;

pub use directory::{BackendChanges, BackendDirectory};

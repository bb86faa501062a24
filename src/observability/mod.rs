//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! health / relay / discord / config
//!     → tracing events (backend, transition, error fields)
//!     → logging.rs subscriber (plain text or JSON lines on stdout)
//! ```

pub mod logging;

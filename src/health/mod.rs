//! Backend liveness monitoring.
//!
//! # Data Flow
//! ```text
//! Warmup (once, awaited):
//!     targets.rs snapshot
//!     → probe.rs / ping.rs per backend, in parallel
//!     → policy.rs on_warmup
//!     → state.rs seed (Up announced, failures seeded silently)
//!
//! Tick (every interval, scheduler.rs):
//!     targets.rs snapshot → state.rs drops departed backends
//!     → probe each backend in parallel, bounded by the probe timeout
//!     → under the backend's lock: policy.rs on_tick, write state,
//!       announce through sink.rs
//! ```
//!
//! # Design Decisions
//! - Timeouts, errors and panics in a probe are all plain failures
//! - A backend never confirmed up needs two failures before it is reported
//!   down; a confirmed one needs a single failure
//! - Decisions are taken against the state at write time, never a stale read
//! - Results from a probe older than the last applied one are dropped

pub mod active;
pub mod ping;
pub mod policy;
pub mod probe;
pub mod scheduler;
pub mod sink;
pub mod state;
pub mod targets;

pub use active::{CycleReport, LivenessMonitor, MonitorSettings};
pub use ping::ServerListPing;
pub use probe::{Probe, ProbeError, ProbeOutcome};
pub use scheduler::{Scheduler, TokioScheduler};
pub use sink::{NotificationSink, Transition};
pub use state::{Observed, TargetState, TargetStateStore};
pub use targets::TargetSource;

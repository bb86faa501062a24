//! Notification sink consumed by the liveness monitor.

use std::fmt;

/// A reported change in a target's liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Up,
    Down,
}

impl Transition {
    pub fn is_up(self) -> bool {
        matches!(self, Transition::Up)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Up => f.write_str("up"),
            Transition::Down => f.write_str("down"),
        }
    }
}

/// Receives liveness transitions.
///
/// Called from inside the target's critical section, so implementations
/// must hand delivery off (spawn, channel send) instead of blocking.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, target: &str, transition: Transition);
}

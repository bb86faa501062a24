//! Threshold policy for liveness transitions.
//!
//! Pure functions from (prior state, probe outcome) to (new state, what to
//! announce). No clocks, locks or IO live here.
//!
//! ```text
//! success          → Up, failures = 0, announce Up unless already Up
//! failure          → failures += 1
//!   prior Up       → threshold RUNTIME_FAILS (1)
//!   otherwise      → threshold STARTUP_FAILS (2)
//!   at threshold   → Down, announce Down unless already announced Down
//! warmup success   → Up, announce Up
//! warmup failure   → Down seed, failures = 1, announce nothing
//! ```

use crate::health::probe::ProbeOutcome;
use crate::health::sink::Transition;
use crate::health::state::{Observed, TargetState};

/// Failures needed to report a target that was confirmed up.
pub const RUNTIME_FAILS: u32 = 1;

/// Failures needed to report a target that was never confirmed up.
pub const STARTUP_FAILS: u32 = 2;

/// Outcome of applying one probe result to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: TargetState,
    pub emit: Option<Transition>,
}

/// Consecutive failures required before a target is reported down.
pub fn failure_threshold(prior: Observed) -> u32 {
    match prior {
        Observed::Up => RUNTIME_FAILS,
        Observed::Unknown | Observed::Down => STARTUP_FAILS,
    }
}

/// Decide the warmup scan result for a target.
///
/// A failure seeds the counter at 1 so one more failure on the first tick
/// reaches `STARTUP_FAILS`.
pub fn on_warmup(outcome: ProbeOutcome) -> Decision {
    match outcome {
        ProbeOutcome::Success => Decision {
            state: up(),
            emit: Some(Transition::Up),
        },
        ProbeOutcome::Failure => Decision {
            state: TargetState {
                observed: Observed::Down,
                consecutive_failures: 1,
                reported: false,
            },
            emit: None,
        },
    }
}

/// Decide a steady-state probe result against the prior state.
pub fn on_tick(prior: TargetState, outcome: ProbeOutcome) -> Decision {
    match outcome {
        ProbeOutcome::Success => Decision {
            state: up(),
            emit: (!prior.reports(Observed::Up)).then_some(Transition::Up),
        },
        ProbeOutcome::Failure => {
            let failures = prior.consecutive_failures.saturating_add(1);
            let crossed = failures >= failure_threshold(prior.observed);

            if crossed && !prior.reports(Observed::Down) {
                Decision {
                    state: TargetState {
                        observed: Observed::Down,
                        consecutive_failures: failures,
                        reported: true,
                    },
                    emit: Some(Transition::Down),
                }
            } else {
                Decision {
                    state: TargetState {
                        consecutive_failures: failures,
                        ..prior
                    },
                    emit: None,
                }
            }
        }
    }
}

fn up() -> TargetState {
    TargetState {
        observed: Observed::Up,
        consecutive_failures: 0,
        reported: true,
    }
}

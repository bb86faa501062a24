//! Active liveness monitoring.
//!
//! # Responsibilities
//! - Run the one-time warmup scan before anything else
//! - Probe every target concurrently on each tick
//! - Apply the threshold policy under the target's lock
//! - Announce transitions to the notification sink

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinSet;
use tokio::time;

use crate::config::MonitorConfig;
use crate::health::policy;
use crate::health::probe::{Probe, ProbeError, ProbeOutcome};
use crate::health::scheduler::Scheduler;
use crate::health::sink::{NotificationSink, Transition};
use crate::health::state::TargetStateStore;
use crate::health::targets::TargetSource;

/// Timing knobs for the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Time between ticks.
    pub interval: Duration,
    /// Deadline for a single probe.
    pub probe_timeout: Duration,
    /// Extra time warmup waits on top of `probe_timeout`.
    pub warmup_grace: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(3),
            warmup_grace: Duration::from_secs(2),
        }
    }
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            interval: config.interval(),
            probe_timeout: config.probe_timeout(),
            warmup_grace: config.warmup_grace(),
        }
    }
}

/// Summary of one warmup or tick cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Probes issued.
    pub probed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Transitions handed to the sink.
    pub announced: usize,
    /// Results dropped because a newer probe had landed or the target left.
    pub discarded: usize,
    /// Warmup probes still running when the warmup deadline passed.
    pub unsettled: usize,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Warmup,
    Tick,
}

struct ProbeRecord {
    outcome: ProbeOutcome,
    /// `None` when the result was discarded.
    applied: Option<Option<Transition>>,
}

/// Decides, per cycle, which backends changed liveness.
pub struct LivenessMonitor {
    probe: Arc<dyn Probe>,
    sink: Arc<dyn NotificationSink>,
    store: TargetStateStore,
    settings: MonitorSettings,
    next_seq: AtomicU64,
}

impl LivenessMonitor {
    pub fn new(
        probe: Arc<dyn Probe>,
        sink: Arc<dyn NotificationSink>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            probe,
            sink,
            store: TargetStateStore::new(),
            settings,
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &TargetStateStore {
        &self.store
    }

    pub fn settings(&self) -> MonitorSettings {
        self.settings
    }

    /// Warm up, then tick every interval until the scheduler shuts down.
    pub fn start(
        self: Arc<Self>,
        targets: Arc<dyn TargetSource>,
        scheduler: Arc<dyn Scheduler>,
    ) {
        tracing::info!(
            interval = ?self.settings.interval,
            probe_timeout = ?self.settings.probe_timeout,
            "Liveness monitor starting"
        );

        let interval = self.settings.interval;
        let ticker = Arc::clone(&scheduler);
        scheduler.run_once(Box::new(move || {
            async move {
                self.run_warmup(targets.snapshot()).await;

                ticker.run_periodically(
                    Box::new(move || {
                        let monitor = Arc::clone(&self);
                        let targets = Arc::clone(&targets);
                        async move {
                            monitor.run_tick(targets.snapshot()).await;
                        }
                        .boxed()
                    }),
                    interval,
                );
            }
            .boxed()
        }));
    }

    /// Establish initial state without ever announcing a target as down.
    ///
    /// Returns once every probe settled or `probe_timeout + warmup_grace`
    /// passed, whichever comes first.
    pub async fn run_warmup(self: &Arc<Self>, targets: Vec<String>) -> CycleReport {
        let mut set = JoinSet::new();
        for target in targets {
            self.spawn_probe(&mut set, target, Phase::Warmup);
        }

        let mut report = CycleReport {
            probed: set.len(),
            ..Default::default()
        };

        let deadline = self.settings.probe_timeout + self.settings.warmup_grace;
        if time::timeout(deadline, collect(&mut set, &mut report))
            .await
            .is_err()
        {
            report.unsettled = set.len();
            tracing::warn!(
                unsettled = report.unsettled,
                deadline = ?deadline,
                "Warmup deadline passed with probes still running"
            );
            set.detach_all();
        }

        tracing::info!(
            probed = report.probed,
            up = report.succeeded,
            pending = report.failed,
            "Warmup scan complete"
        );
        report
    }

    /// Probe every target once and announce the transitions.
    pub async fn run_tick(self: &Arc<Self>, targets: Vec<String>) -> CycleReport {
        let removed = self.store.retain(&targets);
        if !removed.is_empty() {
            tracing::debug!(removed = ?removed, "Forgetting backends that left the target set");
        }

        let mut set = JoinSet::new();
        for target in targets {
            self.spawn_probe(&mut set, target, Phase::Tick);
        }

        let mut report = CycleReport {
            probed: set.len(),
            ..Default::default()
        };
        collect(&mut set, &mut report).await;

        tracing::debug!(
            probed = report.probed,
            failed = report.failed,
            announced = report.announced,
            discarded = report.discarded,
            "Probe cycle complete"
        );
        report
    }

    fn spawn_probe(self: &Arc<Self>, set: &mut JoinSet<ProbeRecord>, target: String, phase: Phase) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = self.store.handle(&target);
        let monitor = Arc::clone(self);

        set.spawn(async move {
            let result = monitor.probe_once(&target).await;
            if let Err(e) = &result {
                tracing::debug!(backend = %target, error = %e, "Probe failed");
            }
            let outcome = ProbeOutcome::from(&result);

            let applied = handle.update(seq, |state| {
                let decision = match phase {
                    Phase::Warmup => policy::on_warmup(outcome),
                    Phase::Tick => policy::on_tick(*state, outcome),
                };
                *state = decision.state;
                if let Some(transition) = decision.emit {
                    monitor.announce(&target, transition);
                }
                decision.emit
            });

            if applied.is_none() {
                tracing::debug!(backend = %target, seq, "Discarded superseded probe result");
            }
            ProbeRecord { outcome, applied }
        });
    }

    /// Run the probe under the timeout. Timeouts and panics are failures.
    async fn probe_once(&self, target: &str) -> Result<(), ProbeError> {
        let attempt = AssertUnwindSafe(self.probe.probe(target)).catch_unwind();
        match time::timeout(self.settings.probe_timeout, attempt).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ProbeError::Panicked),
            Err(_) => Err(ProbeError::Timeout(self.settings.probe_timeout)),
        }
    }

    fn announce(&self, target: &str, transition: Transition) {
        tracing::info!(backend = %target, transition = %transition, "Backend liveness changed");
        let delivered =
            std::panic::catch_unwind(AssertUnwindSafe(|| self.sink.notify(target, transition)));
        if delivered.is_err() {
            tracing::error!(backend = %target, "Notification sink panicked");
        }
    }
}

async fn collect(set: &mut JoinSet<ProbeRecord>, report: &mut CycleReport) {
    while let Some(joined) = set.join_next().await {
        let record = match joined {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, "Probe task failed");
                report.failed += 1;
                continue;
            }
        };

        match record.outcome {
            ProbeOutcome::Success => report.succeeded += 1,
            ProbeOutcome::Failure => report.failed += 1,
        }
        match record.applied {
            Some(Some(_)) => report.announced += 1,
            Some(None) => {}
            None => report.discarded += 1,
        }
    }
}

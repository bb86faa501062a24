//! Scheduling primitives the monitor runs on.
//!
//! The monitor only needs three operations: run now, run after a delay and
//! run every interval. `TokioScheduler` maps them onto spawned tasks that
//! stop when the shutdown broadcast fires.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::lifecycle::Shutdown;

/// A job run a single time.
pub type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// A job run on every interval.
pub type RepeatingJob = Box<dyn FnMut() -> BoxFuture<'static, ()> + Send>;

pub trait Scheduler: Send + Sync {
    /// Run `job` as soon as possible.
    fn run_once(&self, job: Job);

    /// Run `job` once after `delay`.
    fn run_after_delay(&self, job: Job, delay: Duration);

    /// Run `job` every `interval`, starting one interval from now.
    ///
    /// Each run is spawned on its own, so a slow run never delays the next.
    fn run_periodically(&self, job: RepeatingJob, interval: Duration);
}

/// Scheduler backed by the Tokio runtime.
#[derive(Clone)]
pub struct TokioScheduler {
    shutdown: Shutdown,
}

impl TokioScheduler {
    pub fn new(shutdown: Shutdown) -> Self {
        Self { shutdown }
    }
}

impl Scheduler for TokioScheduler {
    fn run_once(&self, job: Job) {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = job() => {}
                _ = shutdown.wait() => {
                    tracing::debug!("Scheduled job cancelled by shutdown");
                }
            }
        });
    }

    fn run_after_delay(&self, job: Job, delay: Duration) {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(delay) => job().await,
                _ = shutdown.wait() => {
                    tracing::debug!("Delayed job cancelled by shutdown");
                }
            }
        });
    }

    fn run_periodically(&self, mut job: RepeatingJob, interval: Duration) {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tokio::spawn(job());
                    }
                    _ = shutdown.wait() => {
                        tracing::debug!("Periodic job received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        });
    }
}

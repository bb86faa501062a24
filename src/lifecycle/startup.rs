//! Startup orchestration.
//!
//! # Order
//! relay task → proxy-started notice → backend directory → liveness monitor
//!
//! Backend status at boot comes only from the monitor's warmup scan, so a
//! configured backend that is down is never announced as started. Config
//! reloads swap the directory and leave new backends to the next tick.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backends::{BackendChanges, BackendDirectory};
use crate::config::BridgeConfig;
use crate::discord::{Outbox, StatusNotifier};
use crate::health::{
    LivenessMonitor, MonitorSettings, Scheduler, ServerListPing, TargetSource, TokioScheduler,
};
use crate::lifecycle::Shutdown;
use crate::relay::{ProxyEvent, Relay};

/// Everything needed to bring the bridge up.
pub struct Startup {
    config: BridgeConfig,
    outbox: Arc<dyn Outbox>,
    settings: MonitorSettings,
}

impl Startup {
    pub fn new(config: BridgeConfig, outbox: Arc<dyn Outbox>) -> Self {
        let settings = MonitorSettings::from(&config.monitor);
        Self {
            config,
            outbox,
            settings,
        }
    }

    /// Override the monitor timing taken from `[monitor]`.
    pub fn with_monitor_settings(mut self, settings: MonitorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Spawn the relay and, when enabled, the liveness monitor.
    pub fn launch(self, shutdown: &Shutdown) -> RunningBridge {
        let directory = Arc::new(BackendDirectory::new(&self.config.backends));

        let mut relay = Relay::new(Arc::clone(&self.outbox), self.config.proxy.name.clone());
        if self.config.monitor.enabled {
            relay = relay.with_monitored(Arc::clone(&directory));
        }
        let relay = Arc::new(relay);

        let (events, events_rx) = mpsc::unbounded_channel();
        let _ = events.send(ProxyEvent::ProxyStarted);
        let relay_task = tokio::spawn(Arc::clone(&relay).run(events_rx, shutdown.clone()));

        let monitor = if self.config.monitor.enabled {
            let monitor = Arc::new(LivenessMonitor::new(
                Arc::new(ServerListPing::new(Arc::clone(&directory))),
                Arc::new(StatusNotifier::new(Arc::clone(&self.outbox))),
                self.settings,
            ));
            let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(shutdown.clone()));
            let targets: Arc<dyn TargetSource> = Arc::clone(&directory) as Arc<dyn TargetSource>;
            Arc::clone(&monitor).start(targets, scheduler);
            Some(monitor)
        } else {
            tracing::info!("Liveness monitor disabled");
            None
        };

        tracing::info!(
            backends = directory.len(),
            monitor = monitor.is_some(),
            "Bridge started"
        );

        RunningBridge {
            events,
            directory,
            relay,
            relay_task,
            monitor,
        }
    }
}

/// Handles to a launched bridge.
pub struct RunningBridge {
    events: mpsc::UnboundedSender<ProxyEvent>,
    directory: Arc<BackendDirectory>,
    relay: Arc<Relay>,
    relay_task: JoinHandle<()>,
    monitor: Option<Arc<LivenessMonitor>>,
}

impl RunningBridge {
    /// Sender for proxy events (stdin intake, tests).
    pub fn events(&self) -> mpsc::UnboundedSender<ProxyEvent> {
        self.events.clone()
    }

    pub fn directory(&self) -> &Arc<BackendDirectory> {
        &self.directory
    }

    pub fn monitor(&self) -> Option<&Arc<LivenessMonitor>> {
        self.monitor.as_ref()
    }

    /// Swap in the backend set of a reloaded config.
    ///
    /// Nothing is posted here. With the monitor on, added backends are
    /// announced once a tick sees them up and removed ones are forgotten on
    /// the next tick.
    pub fn apply_reload(&self, config: &BridgeConfig) -> BackendChanges {
        let changes = self.directory.replace(&config.backends);
        if self.monitor.is_none() && !changes.is_empty() {
            tracing::debug!("Monitor disabled, reloaded backends are not watched");
        }
        changes
    }

    /// Wait for the relay to finish, then announce the proxy stopping.
    ///
    /// Call after `shutdown` has been triggered.
    pub async fn stop(self) {
        drop(self.events);
        if let Err(e) = self.relay_task.await {
            tracing::error!(error = %e, "Relay task failed");
        }
        if let Err(e) = self.relay.handle(ProxyEvent::ProxyStopping).await {
            tracing::warn!(error = %e, "Failed to announce proxy stop");
        }
        tracing::info!("Bridge stopped");
    }
}

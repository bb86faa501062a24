//! Event → Discord forwarding.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backends::BackendDirectory;
use crate::discord::message;
use crate::discord::{NotifyError, Outbox, Outgoing};
use crate::lifecycle::Shutdown;
use crate::relay::events::ProxyEvent;

/// Server name used for chat from a player with no current server.
pub const UNKNOWN_SERVER: &str = "unknown";

/// Forwards proxy events to Discord in arrival order.
pub struct Relay {
    outbox: Arc<dyn Outbox>,
    proxy_name: String,
    /// Backends whose status belongs to the liveness monitor.
    monitored: Option<Arc<BackendDirectory>>,
}

impl Relay {
    pub fn new(outbox: Arc<dyn Outbox>, proxy_name: impl Into<String>) -> Self {
        Self {
            outbox,
            proxy_name: proxy_name.into(),
            monitored: None,
        }
    }

    /// Leave register/unregister notices for backends in `directory` to the
    /// liveness monitor, which only reports what it has observed.
    pub fn with_monitored(mut self, directory: Arc<BackendDirectory>) -> Self {
        self.monitored = Some(directory);
        self
    }

    fn is_monitored(&self, server: &str) -> bool {
        self.monitored
            .as_ref()
            .is_some_and(|directory| directory.contains(server))
    }

    /// Render an event. `None` for events that are not forwarded.
    pub fn render(&self, event: &ProxyEvent) -> Option<Outgoing> {
        let outgoing = match event {
            ProxyEvent::ProxyStarted => message::server_status(&self.proxy_name, true),
            ProxyEvent::ProxyStopping => message::server_status(&self.proxy_name, false),
            ProxyEvent::ServerRegistered { server } | ProxyEvent::ServerUnregistered { server }
                if self.is_monitored(server) =>
            {
                return None
            }
            ProxyEvent::ServerRegistered { server } => message::server_status(server, true),
            ProxyEvent::ServerUnregistered { server } => message::server_status(server, false),
            ProxyEvent::PlayerJoined { player } => message::player_joined(player),
            ProxyEvent::PlayerLeft { player } => message::player_left(player),
            ProxyEvent::PlayerChat {
                server,
                player,
                message: text,
            } => message::chat(server.as_deref().unwrap_or(UNKNOWN_SERVER), player, text),
            // Server switches are intentionally not announced.
            ProxyEvent::ServerSwitch { .. } => return None,
        };
        Some(outgoing)
    }

    /// Render and deliver one event, waiting for Discord to accept it.
    pub async fn handle(&self, event: ProxyEvent) -> Result<(), NotifyError> {
        match self.render(&event) {
            Some(outgoing) => self.outbox.deliver(outgoing).await,
            None => Ok(()),
        }
    }

    /// Forward events from `events` until shutdown or the channel closes.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<ProxyEvent>,
        shutdown: Shutdown,
    ) {
        tracing::info!("Relay started");
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::info!("Event channel closed, relay exiting");
                        break;
                    };
                    tracing::debug!(event = ?event, "Forwarding proxy event");
                    if let Err(e) = self.handle(event).await {
                        tracing::warn!(error = %e, "Failed to forward proxy event");
                    }
                }
                _ = shutdown.wait() => {
                    let mut drained = 0usize;
                    while let Ok(event) = events.try_recv() {
                        if let Err(e) = self.handle(event).await {
                            tracing::warn!(error = %e, "Failed to forward proxy event");
                        }
                        drained += 1;
                    }
                    tracing::info!(drained, "Relay received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

//! Discord bridge (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   host proxy ──JSON lines──▶ relay::ingest ──▶ relay::Relay ──┐
//!                                                                ├──▶ discord outbox
//!   config reload ──▶ backends::directory                        │
//!                          │                                     │
//!                          ▼                                     │
//!                  health::LivenessMonitor ──── transitions ─────┘
//!                  (warmup, then a tick every interval)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;

use discord_bridge::config::{load_config, watcher::ConfigWatcher};
use discord_bridge::discord::{DiscordTransport, Outbox};
use discord_bridge::lifecycle::{wait_for_shutdown, Shutdown, Startup};
use discord_bridge::observability::logging;
use discord_bridge::relay::read_events;

#[derive(Parser, Debug)]
#[command(name = "discord-bridge", version, about = "Minecraft proxy to Discord bridge")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: PathBuf,

    /// Read proxy events as JSON lines from stdin
    #[arg(long)]
    events_stdin: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability);

    tracing::info!(
        config = %cli.config.display(),
        backends = config.backends.len(),
        monitor = config.monitor.enabled,
        "discord-bridge v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let outbox: Arc<dyn Outbox> = Arc::new(DiscordTransport::from_config(&config.discord)?);
    let shutdown = Shutdown::new();
    let bridge = Startup::new(config, outbox).launch(&shutdown);

    if cli.events_stdin {
        let tx = bridge.events();
        tokio::spawn(async move {
            let forwarded = read_events(BufReader::new(tokio::io::stdin()), tx).await;
            tracing::info!(forwarded, "Event input closed");
        });
    }

    // Config reload
    let (watcher, mut updates) = ConfigWatcher::new(&cli.config);
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    };

    let signal = wait_for_shutdown(&shutdown);
    tokio::pin!(signal);
    loop {
        tokio::select! {
            Some(update) = updates.recv() => {
                bridge.apply_reload(&update);
            }
            _ = &mut signal => break,
        }
    }

    bridge.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

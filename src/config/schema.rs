//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Discord credentials and delivery channels.
    pub discord: DiscordConfig,

    /// Identity of the proxy this bridge runs beside.
    pub proxy: ProxyIdentity,

    /// Backend liveness monitor settings.
    pub monitor: MonitorConfig,

    /// Backend server definitions (the monitored targets).
    pub backends: Vec<BackendConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Discord configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token used for the plain channel fallback.
    pub bot_token: String,

    /// Channel receiving plain messages.
    pub channel_id: String,

    /// Optional webhook URL. When set, status and chat go through the webhook.
    pub webhook_url: Option<String>,

    /// Base URL of the Discord REST API.
    pub api_base: String,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: String::new(),
            webhook_url: None,
            api_base: "https://discord.com/api/v10".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl DiscordConfig {
    /// The webhook URL, ignoring blank values.
    pub fn webhook(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Proxy identity used in start/stop notices.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyIdentity {
    /// Display name of the proxy.
    pub name: String,
}

impl Default for ProxyIdentity {
    fn default() -> Self {
        Self {
            name: "Velocity".to_string(),
        }
    }
}

/// Liveness monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Enable the liveness monitor.
    pub enabled: bool,

    /// Interval between probe cycles in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub probe_timeout_secs: u64,

    /// Extra time the warmup scan waits beyond the probe timeout.
    pub warmup_grace_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            probe_timeout_secs: 3,
            warmup_grace_secs: 2,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn warmup_grace(&self) -> Duration {
        Duration::from_secs(self.warmup_grace_secs)
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier, as registered with the proxy.
    pub name: String,

    /// Backend address (e.g., "127.0.0.1:25566").
    pub address: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: BridgeConfig = toml::from_str("").unwrap();
        assert!(config.monitor.enabled);
        assert_eq!(config.monitor.interval(), Duration::from_secs(10));
        assert_eq!(config.monitor.probe_timeout(), Duration::from_secs(3));
        assert_eq!(config.proxy.name, "Velocity");
        assert!(config.backends.is_empty());
    }

    #[test]
    fn parses_backends_and_discord() {
        let raw = r#"
            [discord]
            bot_token = "token"
            channel_id = "1234"
            webhook_url = "https://discord.com/api/webhooks/1/abc"

            [[backends]]
            name = "lobby"
            address = "127.0.0.1:25566"

            [[backends]]
            name = "survival"
            address = "127.0.0.1:25567"
        "#;
        let config: BridgeConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[1].name, "survival");
        assert_eq!(
            config.discord.webhook(),
            Some("https://discord.com/api/webhooks/1/abc")
        );
    }

    #[test]
    fn blank_webhook_is_ignored() {
        let discord = DiscordConfig {
            webhook_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(discord.webhook(), None);
    }
}

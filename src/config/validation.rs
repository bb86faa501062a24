//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check backend names are unique and addresses resolvable in form
//! - Validate value ranges (intervals and timeouts > 0)
//! - Require at least one Discord delivery channel
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::BridgeConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("monitor.{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("backend name must not be empty")]
    EmptyBackendName,

    #[error("duplicate backend name '{0}'")]
    DuplicateBackend(String),

    #[error("backend '{name}' has invalid address '{address}'")]
    InvalidAddress { name: String, address: String },

    #[error("discord: either webhook_url or both bot_token and channel_id are required")]
    NoDeliveryChannel,

    #[error("discord.webhook_url is not a valid URL: {0}")]
    InvalidWebhookUrl(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let monitor = &config.monitor;
    if monitor.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration { field: "interval_secs" });
    }
    if monitor.probe_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration { field: "probe_timeout_secs" });
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        if backend.name.trim().is_empty() {
            errors.push(ValidationError::EmptyBackendName);
            continue;
        }
        if !seen.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.name.clone()));
        }
        if !is_valid_address(&backend.address) {
            errors.push(ValidationError::InvalidAddress {
                name: backend.name.clone(),
                address: backend.address.clone(),
            });
        }
    }

    let discord = &config.discord;
    match discord.webhook() {
        Some(raw) => {
            if let Err(e) = url::Url::parse(raw) {
                errors.push(ValidationError::InvalidWebhookUrl(e.to_string()));
            }
        }
        None => {
            if discord.bot_token.is_empty() || discord.channel_id.is_empty() {
                errors.push(ValidationError::NoDeliveryChannel);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Accepts `ip:port` or `host:port`.
fn is_valid_address(address: &str) -> bool {
    if address.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

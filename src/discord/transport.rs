//! Delivery channel selection.
//!
//! # Responsibilities
//! - Pick the webhook for rich messages, the bot channel otherwise
//! - Offer awaited delivery and fire-and-forget dispatch
//! - Feed liveness transitions from the monitor into Discord

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::DiscordConfig;
use crate::discord::channel::BotChannel;
use crate::discord::message::{self, Outgoing, WebhookMessage};
use crate::discord::webhook::WebhookClient;
use crate::health::{NotificationSink, Transition};

/// Errors raised while delivering a message.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("bot token is not a valid header value")]
    InvalidToken,

    #[error("no delivery channel configured")]
    NotConfigured,
}

pub(crate) async fn check_response(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Something that can deliver rendered messages.
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn deliver(&self, message: Outgoing) -> Result<(), NotifyError>;
}

/// Deliver `message` in the background; failures are logged and dropped.
pub fn dispatch(outbox: Arc<dyn Outbox>, message: Outgoing) {
    tokio::spawn(async move {
        if let Err(e) = outbox.deliver(message).await {
            tracing::warn!(error = %e, "Discord delivery failed");
        }
    });
}

/// Webhook first, bot channel as fallback.
#[derive(Clone)]
pub struct DiscordTransport {
    webhook: Option<WebhookClient>,
    channel: Option<BotChannel>,
}

impl DiscordTransport {
    pub fn new(webhook: Option<WebhookClient>, channel: Option<BotChannel>) -> Self {
        Self { webhook, channel }
    }

    /// Build the transport from configuration.
    pub fn from_config(config: &DiscordConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let webhook = config
            .webhook()
            .map(|url| WebhookClient::new(client.clone(), url));

        let channel = if config.bot_token.is_empty() || config.channel_id.is_empty() {
            None
        } else {
            Some(BotChannel::new(
                client,
                &config.api_base,
                &config.channel_id,
                &config.bot_token,
            )?)
        };

        if webhook.is_none() && channel.is_none() {
            return Err(NotifyError::NotConfigured);
        }

        tracing::info!(
            webhook = webhook.is_some(),
            channel = channel.is_some(),
            "Discord transport ready"
        );
        Ok(Self { webhook, channel })
    }

    pub fn has_webhook(&self) -> bool {
        self.webhook.is_some()
    }
}

#[async_trait]
impl Outbox for DiscordTransport {
    async fn deliver(&self, message: Outgoing) -> Result<(), NotifyError> {
        match (message, &self.webhook, &self.channel) {
            (Outgoing::Rich { webhook: payload, .. }, Some(webhook), _) => {
                webhook.send(&payload).await
            }
            (Outgoing::Rich { fallback, .. }, None, Some(channel)) => channel.send(&fallback).await,
            (Outgoing::Plain(text), _, Some(channel)) => channel.send(&text).await,
            (Outgoing::Plain(text), Some(webhook), None) => {
                let payload = WebhookMessage {
                    username: None,
                    content: Some(text),
                    embeds: Vec::new(),
                };
                webhook.send(&payload).await
            }
            (_, None, None) => Err(NotifyError::NotConfigured),
        }
    }
}

/// Turns monitor transitions into server status messages.
pub struct StatusNotifier {
    outbox: Arc<dyn Outbox>,
}

impl StatusNotifier {
    pub fn new(outbox: Arc<dyn Outbox>) -> Self {
        Self { outbox }
    }
}

impl NotificationSink for StatusNotifier {
    fn notify(&self, target: &str, transition: Transition) {
        dispatch(
            Arc::clone(&self.outbox),
            message::server_status(target, transition.is_up()),
        );
    }
}

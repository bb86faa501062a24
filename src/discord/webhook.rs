//! Discord webhook client.

use reqwest::Client;
use tracing::debug;

use crate::discord::message::WebhookMessage;
use crate::discord::transport::{check_response, NotifyError};

/// Posts messages to a single webhook URL.
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
}

impl WebhookClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Execute the webhook with `message`.
    pub async fn send(&self, message: &WebhookMessage) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(message).send().await?;
        check_response(response).await?;
        debug!(username = ?message.username, "Webhook message sent");
        Ok(())
    }
}

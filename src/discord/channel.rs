//! Bot-authenticated channel client, used when no webhook is configured.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tracing::debug;

use crate::discord::message::ChannelMessage;
use crate::discord::transport::{check_response, NotifyError};

/// Posts plain messages to one text channel as the bot user.
#[derive(Clone)]
pub struct BotChannel {
    client: Client,
    endpoint: String,
    authorization: HeaderValue,
}

impl BotChannel {
    pub fn new(
        client: Client,
        api_base: &str,
        channel_id: &str,
        bot_token: &str,
    ) -> Result<Self, NotifyError> {
        let mut authorization = HeaderValue::from_str(&format!("Bot {}", bot_token))
            .map_err(|_| NotifyError::InvalidToken)?;
        authorization.set_sensitive(true);

        Ok(Self {
            client,
            endpoint: format!(
                "{}/channels/{}/messages",
                api_base.trim_end_matches('/'),
                channel_id
            ),
            authorization,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post `text` to the channel.
    pub async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let body = ChannelMessage {
            content: text.to_string(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, self.authorization.clone())
            .json(&body)
            .send()
            .await?;
        check_response(response).await?;
        debug!("Channel message sent");
        Ok(())
    }
}

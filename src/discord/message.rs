//! Outgoing message shapes and their rendering.

use serde::Serialize;

/// Embed colour for "started" / "joined".
pub const COLOR_UP: u32 = 0x2ECC71;

/// Embed colour for "stopped" / "left".
pub const COLOR_DOWN: u32 = 0xE74C3C;

pub const STATUS_UP_BODY: &str = ":white_check_mark:起動しました。";
pub const STATUS_DOWN_BODY: &str = ":octagonal_sign:停止しました。";

/// Webhook execute payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub color: u32,
    pub description: String,
}

/// Create-message payload for the bot channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelMessage {
    pub content: String,
}

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Goes through the webhook; `fallback` is posted to the channel when
    /// no webhook is configured.
    Rich {
        webhook: WebhookMessage,
        fallback: String,
    },
    /// Plain channel text.
    Plain(String),
}

impl Outgoing {
    /// The text a reader would see in the plain channel.
    pub fn text(&self) -> &str {
        match self {
            Outgoing::Rich { fallback, .. } => fallback,
            Outgoing::Plain(text) => text,
        }
    }
}

/// Server started/stopped notice, posted under the server's name.
pub fn server_status(server: &str, is_up: bool) -> Outgoing {
    let (body, color) = if is_up {
        (STATUS_UP_BODY, COLOR_UP)
    } else {
        (STATUS_DOWN_BODY, COLOR_DOWN)
    };

    Outgoing::Rich {
        webhook: WebhookMessage {
            username: Some(server.to_string()),
            content: None,
            embeds: vec![Embed {
                color,
                description: body.to_string(),
            }],
        },
        fallback: format!("[{}] {}", server, body),
    }
}

/// In-game chat line, posted as `[server]player`.
pub fn chat(server: &str, player: &str, message: &str) -> Outgoing {
    Outgoing::Rich {
        webhook: WebhookMessage {
            username: Some(format!("[{}]{}", server, player)),
            content: Some(message.to_string()),
            embeds: Vec::new(),
        },
        fallback: format!("[{}]{}: {}", server, player, message),
    }
}

pub fn player_joined(player: &str) -> Outgoing {
    Outgoing::Plain(format!("{}が参加しました。", player))
}

pub fn player_left(player: &str) -> Outgoing {
    Outgoing::Plain(format!("{}が退出しました。", player))
}

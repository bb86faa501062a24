//! Proxy events forwarded to Discord.

use serde::{Deserialize, Serialize};

/// Something that happened on the proxy.
///
/// Serialized as one JSON object per line, tagged by `type`:
/// `{"type":"player_chat","server":"lobby","player":"Steve","message":"hi"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProxyEvent {
    ProxyStarted,
    ProxyStopping,
    ServerRegistered {
        server: String,
    },
    ServerUnregistered {
        server: String,
    },
    PlayerJoined {
        player: String,
    },
    PlayerLeft {
        player: String,
    },
    PlayerChat {
        #[serde(default)]
        server: Option<String>,
        player: String,
        message: String,
    },
    ServerSwitch {
        player: String,
        #[serde(default)]
        from: Option<String>,
        to: String,
    },
}

//! Server list ping probe.
//!
//! Speaks the game's status handshake against a backend:
//! ```text
//! → [len][0x00][VarInt protocol][String host][u16 port][VarInt 1]   handshake
//! → [len][0x00]                                                      status request
//! ← [len][0x00][VarInt n][n bytes JSON]                              status response
//! ```
//! A backend counts as alive once it answers with a well-formed status
//! document.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::backends::BackendDirectory;
use crate::health::probe::{Probe, ProbeError};

/// Protocol version sent in the handshake. Backends answer status requests
/// for any version.
pub const STATUS_PROTOCOL_VERSION: i32 = -1;

/// Upper bound for a status frame; favicons make these a few KiB.
const MAX_FRAME_LEN: usize = 2 * 1024 * 1024;

/// Fields of the status document we look at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusResponse {
    pub version: Option<StatusVersion>,
    pub players: Option<StatusPlayers>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusPlayers {
    pub online: u32,
    pub max: u32,
}

/// Probe that pings the backend registered under the target name.
pub struct ServerListPing {
    directory: Arc<BackendDirectory>,
    protocol_version: i32,
}

impl ServerListPing {
    pub fn new(directory: Arc<BackendDirectory>) -> Self {
        Self {
            directory,
            protocol_version: STATUS_PROTOCOL_VERSION,
        }
    }

    pub fn with_protocol_version(mut self, protocol_version: i32) -> Self {
        self.protocol_version = protocol_version;
        self
    }
}

#[async_trait]
impl Probe for ServerListPing {
    async fn probe(&self, target: &str) -> Result<(), ProbeError> {
        let address = self
            .directory
            .address_of(target)
            .ok_or_else(|| ProbeError::UnknownTarget(target.to_string()))?;

        let status = ping(&address, self.protocol_version).await?;
        tracing::trace!(
            backend = %target,
            version = status.version.as_ref().map(|v| v.name.as_str()).unwrap_or(""),
            online = status.players.as_ref().map(|p| p.online).unwrap_or(0),
            "Status ping answered"
        );
        Ok(())
    }
}

/// Perform one status exchange with `address` (`host:port`).
pub async fn ping(address: &str, protocol_version: i32) -> Result<StatusResponse, ProbeError> {
    let (host, port) = split_address(address)?;

    let mut stream = TcpStream::connect(address).await?;
    stream.set_nodelay(true)?;

    let mut request = handshake_packet(protocol_version, host, port);
    request.extend_from_slice(&status_request_packet());
    stream.write_all(&request).await?;
    stream.flush().await?;

    let body = read_frame(&mut stream).await?;
    parse_status(&body)
}

fn split_address(address: &str) -> Result<(&str, u16), ProbeError> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| ProbeError::Protocol(format!("address '{}' has no port", address)))?;
    let port = port
        .parse()
        .map_err(|_| ProbeError::Protocol(format!("address '{}' has an invalid port", address)))?;
    Ok((host.trim_start_matches('[').trim_end_matches(']'), port))
}

pub(crate) fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7F == 0 {
            buf.push(value as u8);
            return;
        }
        buf.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
}

/// Decode a VarInt from the front of `buf`, returning it with its length.
pub(crate) fn decode_varint(buf: &[u8]) -> Option<(i32, usize)> {
    let mut value: u32 = 0;
    for (i, byte) in buf.iter().take(5).enumerate() {
        value |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value as i32, i + 1));
        }
    }
    None
}

async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<i32, ProbeError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = reader.read_u8().await?;
        value |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(ProbeError::Protocol("VarInt longer than 5 bytes".into()))
}

fn frame(body: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 5);
    write_varint(&mut out, body.len() as i32);
    out.extend_from_slice(&body);
    out
}

pub(crate) fn handshake_packet(protocol_version: i32, host: &str, port: u16) -> Vec<u8> {
    let mut body = Vec::with_capacity(host.len() + 16);
    write_varint(&mut body, 0x00);
    write_varint(&mut body, protocol_version);
    write_varint(&mut body, host.len() as i32);
    body.extend_from_slice(host.as_bytes());
    body.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut body, 1);
    frame(body)
}

pub(crate) fn status_request_packet() -> Vec<u8> {
    frame(vec![0x00])
}

async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProbeError> {
    let len = read_varint(reader).await?;
    let len = usize::try_from(len)
        .ok()
        .filter(|len| (1..=MAX_FRAME_LEN).contains(len))
        .ok_or_else(|| ProbeError::Protocol(format!("invalid frame length {}", len)))?;

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

pub(crate) fn parse_status(body: &[u8]) -> Result<StatusResponse, ProbeError> {
    let (packet_id, id_len) =
        decode_varint(body).ok_or_else(|| ProbeError::Protocol("truncated packet id".into()))?;
    if packet_id != 0x00 {
        return Err(ProbeError::Protocol(format!(
            "unexpected packet id {:#04x}",
            packet_id
        )));
    }

    let rest = &body[id_len..];
    let (str_len, len_len) =
        decode_varint(rest).ok_or_else(|| ProbeError::Protocol("truncated string length".into()))?;
    let json = usize::try_from(str_len)
        .ok()
        .and_then(|n| rest.get(len_len..len_len + n))
        .ok_or_else(|| ProbeError::Protocol("status string exceeds frame".into()))?;

    serde_json::from_slice(json).map_err(|e| ProbeError::Protocol(format!("bad status JSON: {}", e)))
}

//! Shared utilities for integration tests.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use discord_bridge::health::{NotificationSink, Probe, ProbeError, Transition};

/// Probe whose answers are set per target by the test.
///
/// Queued steps are consumed first; after that the steady answer repeats.
/// Targets with no script fail.
#[derive(Default)]
pub struct ScriptedProbe {
    scripts: Mutex<HashMap<String, Script>>,
}

#[derive(Default)]
struct Script {
    queued: VecDeque<Step>,
    steady: bool,
}

#[derive(Clone, Copy)]
enum Pause {
    None,
    /// Yields to the runtime while waiting.
    Sleep(Duration),
    /// Holds the worker thread, so no timeout can interrupt it.
    Block(Duration),
}

#[derive(Clone, Copy)]
struct Step {
    ok: bool,
    pause: Pause,
}

#[allow(dead_code)]
impl ScriptedProbe {
    /// Answer every later probe of `target` with `ok`.
    pub fn set(&self, target: &str, ok: bool) {
        self.scripts
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .steady = ok;
    }

    /// Answer the next unanswered probe of `target` with `ok` after `delay`.
    pub fn push(&self, target: &str, ok: bool, delay: Duration) {
        self.scripts
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .queued
            .push_back(Step {
                ok,
                pause: if delay.is_zero() {
                    Pause::None
                } else {
                    Pause::Sleep(delay)
                },
            });
    }

    /// Answer the next unanswered probe of `target` with `ok` after
    /// blocking its worker thread for `duration`.
    pub fn push_blocking(&self, target: &str, ok: bool, duration: Duration) {
        self.scripts
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_default()
            .queued
            .push_back(Step {
                ok,
                pause: Pause::Block(duration),
            });
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, target: &str) -> Result<(), ProbeError> {
        let step = {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.entry(target.to_string()).or_default();
            let steady = Step {
                ok: script.steady,
                pause: Pause::None,
            };
            script.queued.pop_front().unwrap_or(steady)
        };
        match step.pause {
            Pause::None => {}
            Pause::Sleep(delay) => tokio::time::sleep(delay).await,
            Pause::Block(duration) => std::thread::sleep(duration),
        }
        if step.ok {
            Ok(())
        } else {
            Err(ProbeError::Protocol(format!("{} scripted to fail", target)))
        }
    }
}

/// Sink that records every transition.
#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<(String, Transition)>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn all(&self) -> Vec<(String, Transition)> {
        self.seen.lock().unwrap().clone()
    }

    pub fn for_target(&self, target: &str) -> Vec<Transition> {
        self.all()
            .into_iter()
            .filter(|(t, _)| t == target)
            .map(|(_, transition)| transition)
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, target: &str, transition: Transition) {
        self.seen
            .lock()
            .unwrap()
            .push((target.to_string(), transition));
    }
}

fn write_varint(buf: &mut Vec<u8>, value: i32) {
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

async fn read_varint(socket: &mut TcpStream) -> std::io::Result<i32> {
    let mut value: u32 = 0;
    for i in 0..5 {
        let byte = socket.read_u8().await?;
        value |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            break;
        }
    }
    Ok(value as i32)
}

async fn skip_frame(socket: &mut TcpStream) -> std::io::Result<()> {
    let len = read_varint(socket).await?;
    let mut body = vec![0u8; len.max(0) as usize];
    socket.read_exact(&mut body).await?;
    Ok(())
}

/// Framed status response carrying `json`, optionally with another packet id.
#[allow(dead_code)]
pub fn status_frame(packet_id: i32, json: &str) -> Vec<u8> {
    let mut body = Vec::new();
    write_varint(&mut body, packet_id);
    write_varint(&mut body, json.len() as i32);
    body.extend_from_slice(json.as_bytes());

    let mut frame = Vec::new();
    write_varint(&mut frame, body.len() as i32);
    frame.extend_from_slice(&body);
    frame
}

/// Start a mock game server that reads the handshake and status request,
/// then answers with `reply` and closes.
#[allow(dead_code)]
pub async fn start_status_server(reply: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let reply = reply.clone();
            tokio::spawn(async move {
                if skip_frame(&mut socket).await.is_err() || skip_frame(&mut socket).await.is_err()
                {
                    return;
                }
                let _ = socket.write_all(&reply).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Start a server that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// One request seen by the capture server.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

/// Start a mock HTTP endpoint that records JSON POSTs and answers `status`.
#[allow(dead_code)]
pub async fn start_capture_server(
    status: u16,
) -> (SocketAddr, mpsc::UnboundedReceiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    let _ = tx.send(request);
                }
                let reason = if status < 300 { "OK" } else { "Error" };
                let body = if status < 300 { "" } else { "{\"message\":\"rejected\"}" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    (addr, rx)
}

async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().ok()?,
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = serde_json::from_slice(&buf[header_end..header_end + content_length]).ok()?;
    Some(CapturedRequest {
        path,
        authorization,
        body,
    })
}

/// Receive the next captured request or fail after a second.
#[allow(dead_code)]
pub async fn next_request(rx: &mut mpsc::UnboundedReceiver<CapturedRequest>) -> CapturedRequest {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no request captured")
        .expect("capture server stopped")
}

/// Everything captured until the endpoint stays quiet for `quiet`.
#[allow(dead_code)]
pub async fn collect_for(
    rx: &mut mpsc::UnboundedReceiver<CapturedRequest>,
    quiet: Duration,
) -> Vec<CapturedRequest> {
    let mut seen = Vec::new();
    while let Ok(Some(request)) = tokio::time::timeout(quiet, rx.recv()).await {
        seen.push(request);
    }
    seen
}

//! Bridge startup, reload and stop against mock servers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use discord_bridge::config::{BackendConfig, BridgeConfig};
use discord_bridge::discord::message::{COLOR_DOWN, COLOR_UP};
use discord_bridge::discord::{DiscordTransport, Outbox};
use discord_bridge::health::{MonitorSettings, Observed};
use discord_bridge::lifecycle::{Shutdown, Startup};
use discord_bridge::relay::ProxyEvent;

mod common;
use common::{collect_for, next_request, CapturedRequest};

const STATUS_JSON: &str = r#"{"version":{"name":"1.20.4","protocol":765},"players":{"max":20,"online":0}}"#;

fn config(webhook: SocketAddr, backends: &[(&str, SocketAddr)]) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.discord.webhook_url = Some(format!("http://{}/api/webhooks/1/token", webhook));
    config.backends = backends
        .iter()
        .map(|(name, addr)| BackendConfig {
            name: name.to_string(),
            address: addr.to_string(),
        })
        .collect();
    config
}

fn outbox(config: &BridgeConfig) -> Arc<dyn Outbox> {
    Arc::new(DiscordTransport::from_config(&config.discord).unwrap())
}

fn settings(interval: Duration) -> MonitorSettings {
    MonitorSettings {
        interval,
        probe_timeout: Duration::from_millis(100),
        warmup_grace: Duration::from_millis(50),
    }
}

fn posts_for<'a>(posts: &'a [CapturedRequest], username: &str) -> Vec<&'a CapturedRequest> {
    posts
        .iter()
        .filter(|p| p.body["username"] == username)
        .collect()
}

async fn live_backend() -> SocketAddr {
    common::start_status_server(common::status_frame(0x00, STATUS_JSON)).await
}

#[tokio::test]
async fn unreachable_backend_is_not_announced_at_startup() {
    let (webhook, mut posts) = common::start_capture_server(204).await;
    let dead = common::closed_address().await;
    let config = config(webhook, &[("deadbackend", dead)]);

    let shutdown = Shutdown::new();
    let bridge = Startup::new(config.clone(), outbox(&config))
        .with_monitor_settings(settings(Duration::from_secs(10)))
        .launch(&shutdown);

    let seen = collect_for(&mut posts, Duration::from_millis(400)).await;
    assert_eq!(seen.len(), 1, "unexpected posts: {:?}", seen);
    assert_eq!(seen[0].body["username"], "Velocity");
    assert_eq!(seen[0].body["embeds"][0]["color"], COLOR_UP);

    let state = bridge
        .monitor()
        .unwrap()
        .store()
        .get("deadbackend")
        .unwrap();
    assert_eq!(state.observed, Observed::Down);
    assert!(!state.reported);

    shutdown.trigger();
    bridge.stop().await;
    let stopped = next_request(&mut posts).await;
    assert_eq!(stopped.body["username"], "Velocity");
    assert_eq!(stopped.body["embeds"][0]["color"], COLOR_DOWN);
}

#[tokio::test]
async fn live_backend_is_announced_once_at_startup() {
    let (webhook, mut posts) = common::start_capture_server(204).await;
    let lobby = live_backend().await;
    let config = config(webhook, &[("lobby", lobby)]);

    let shutdown = Shutdown::new();
    let _bridge = Startup::new(config.clone(), outbox(&config))
        .with_monitor_settings(settings(Duration::from_secs(10)))
        .launch(&shutdown);

    let seen = collect_for(&mut posts, Duration::from_millis(400)).await;
    assert_eq!(posts_for(&seen, "Velocity").len(), 1);
    let lobby_posts = posts_for(&seen, "lobby");
    assert_eq!(lobby_posts.len(), 1);
    assert_eq!(lobby_posts[0].body["embeds"][0]["color"], COLOR_UP);

    shutdown.trigger();
}

#[tokio::test]
async fn reloaded_backends_are_announced_by_the_monitor_only() {
    let (webhook, mut posts) = common::start_capture_server(204).await;
    let initial = config(webhook, &[]);

    let shutdown = Shutdown::new();
    let bridge = Startup::new(initial.clone(), outbox(&initial))
        .with_monitor_settings(settings(Duration::from_millis(100)))
        .launch(&shutdown);
    assert_eq!(next_request(&mut posts).await.body["username"], "Velocity");

    let survival = live_backend().await;
    let creative = common::closed_address().await;
    let changes = bridge.apply_reload(&config(
        webhook,
        &[("survival", survival), ("creative", creative)],
    ));
    assert_eq!(changes.registered, vec!["creative", "survival"]);

    let seen = collect_for(&mut posts, Duration::from_millis(500)).await;
    let survival_posts = posts_for(&seen, "survival");
    assert_eq!(survival_posts.len(), 1, "posts: {:?}", seen);
    assert_eq!(survival_posts[0].body["embeds"][0]["color"], COLOR_UP);
    assert!(posts_for(&seen, "creative")
        .iter()
        .all(|p| p.body["embeds"][0]["color"] == COLOR_DOWN));

    // Dropping a backend is silent; the monitor just forgets it.
    bridge.apply_reload(&config(webhook, &[("creative", creative)]));
    let seen = collect_for(&mut posts, Duration::from_millis(400)).await;
    assert!(posts_for(&seen, "survival").is_empty(), "posts: {:?}", seen);
    assert!(bridge.monitor().unwrap().store().get("survival").is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn register_events_for_monitored_backends_are_silent() {
    let (webhook, mut posts) = common::start_capture_server(204).await;
    let lobby = live_backend().await;
    let config = config(webhook, &[("lobby", lobby)]);

    let shutdown = Shutdown::new();
    let bridge = Startup::new(config.clone(), outbox(&config))
        .with_monitor_settings(settings(Duration::from_secs(10)))
        .launch(&shutdown);
    collect_for(&mut posts, Duration::from_millis(400)).await;

    let events = bridge.events();
    events
        .send(ProxyEvent::ServerUnregistered {
            server: "lobby".into(),
        })
        .unwrap();
    events
        .send(ProxyEvent::ServerRegistered {
            server: "event".into(),
        })
        .unwrap();

    let seen = collect_for(&mut posts, Duration::from_millis(300)).await;
    assert_eq!(seen.len(), 1, "posts: {:?}", seen);
    assert_eq!(seen[0].body["username"], "event");
    assert_eq!(
        bridge.monitor().unwrap().store().get("lobby").map(|s| s.observed),
        Some(Observed::Up)
    );

    shutdown.trigger();
}

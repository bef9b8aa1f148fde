// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::Duration;
use tracing::{error, info, warn};

use envisalink_bridge::{ActionRequest, Session, SessionConfig, SessionEvent, SessionHandle};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "envisalink2mqtt")]
#[command(about = "Bridge between an Envisalink alarm panel interface and MQTT")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Config {
    panel: PanelToml,
    mqtt: MqttToml,
    #[serde(default)]
    partition_names: HashMap<String, String>,
    #[serde(default)]
    zone_names: HashMap<String, ZoneNameToml>,
    #[serde(default)]
    user_names: HashMap<String, String>,
}

/// A zone entry is either a display name or `false` (configured but with
/// its display name suppressed).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZoneNameToml {
    Name(String),
    Suppressed(bool),
}

#[derive(Debug, Deserialize)]
struct PanelToml {
    host: String,
    #[serde(default = "default_panel_port")]
    port: u16,
    password: String,
    alarm_code: String,
    #[serde(default = "default_retry_delay")]
    retry_delay_secs: u64,
    #[serde(default)]
    verify_inbound_checksum: bool,
}

fn default_panel_port() -> u16 {
    4025
}
fn default_retry_delay() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
struct MqttToml {
    url: String,
    #[serde(default = "default_client_id")]
    client_id: String,
    #[serde(default = "default_subscribe_topic")]
    subscribe_topic: String,
    #[serde(default = "default_publish_topic")]
    publish_topic: String,
}

fn default_client_id() -> String {
    "envisalink-bridge".to_string()
}
fn default_subscribe_topic() -> String {
    "envisalink/cmd".to_string()
}
fn default_publish_topic() -> String {
    "envisalink".to_string()
}

fn build_session_config(config: &Config) -> Result<SessionConfig> {
    let mut builder = SessionConfig::builder()
        .host(&config.panel.host)
        .port(config.panel.port)
        .password(&config.panel.password)
        .alarm_code(&config.panel.alarm_code)
        .retry_delay_secs(config.panel.retry_delay_secs)
        .verify_inbound_checksum(config.panel.verify_inbound_checksum);

    for (id, name) in &config.partition_names {
        let id: u8 = id
            .parse()
            .with_context(|| format!("invalid partition number: {id}"))?;
        builder = builder.partition_name(id, name);
    }
    for (id, entry) in &config.zone_names {
        let id: u16 = id
            .parse()
            .with_context(|| format!("invalid zone number: {id}"))?;
        builder = match entry {
            ZoneNameToml::Name(name) => builder.zone_name(id, name),
            ZoneNameToml::Suppressed(_) => builder.zone_unnamed(id),
        };
    }
    for (code, name) in &config.user_names {
        let code: u16 = code
            .parse()
            .with_context(|| format!("invalid usercode: {code}"))?;
        builder = builder.user_name(code, name);
    }

    Ok(builder.build())
}

// ---------------------------------------------------------------------------
// MQTT JSON types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct MqttStateChange {
    now: u64,
    op: String,
    kind: envisalink_bridge::EventKind,
    code: u16,
    target: u16,
    message: String,
    status: envisalink_bridge::DefaultStatus,
}

#[derive(Serialize)]
struct MqttSimpleEvent {
    now: u64,
    op: String,
}

// Inbound command (subscribed)
#[derive(Deserialize)]
struct MqttCommand {
    op: String,
    #[serde(default)]
    code: Option<String>,
}

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

async fn publish_json(client: &AsyncClient, topic: &str, payload: &impl Serialize) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            if let Err(e) = client.publish(topic, QoS::AtLeastOnce, false, json).await {
                error!("Failed to publish to {topic}: {e}");
            }
        }
        Err(e) => error!("Failed to serialize MQTT payload: {e}"),
    }
}

async fn publish_session_event(client: &AsyncClient, topic: &str, event: SessionEvent) {
    match event {
        SessionEvent::StateChange(change) => {
            let msg = MqttStateChange {
                now: now_epoch_ms(),
                op: "STATE_CHANGE".to_string(),
                kind: change.kind,
                code: change.code,
                target: change.target,
                message: change.message,
                status: change.status,
            };
            publish_json(client, topic, &msg).await;
        }
        other => {
            let op = match other {
                SessionEvent::Connected => "CONNECTED",
                SessionEvent::Disconnected => "DISCONNECTED",
                SessionEvent::LoggedIn => "LOGGED_IN",
                SessionEvent::StateChange(_) => unreachable!(),
            };
            let msg = MqttSimpleEvent {
                now: now_epoch_ms(),
                op: op.to_string(),
            };
            publish_json(client, topic, &msg).await;
        }
    }
}

async fn handle_command(cmd: MqttCommand, handle: &SessionHandle) {
    let action = match cmd.op.as_str() {
        "ARM" => ActionRequest::Arm,
        "ARM_STAY" => ActionRequest::StayArm,
        "ARM_CODE" => match cmd.code {
            Some(code) => ActionRequest::ArmWithCode { code },
            None => {
                warn!("ARM_CODE: missing code");
                return;
            }
        },
        "DISARM" => ActionRequest::Disarm { code: cmd.code },
        "REFRESH" => ActionRequest::Refresh,
        "PGM" => ActionRequest::Pgm,
        other => {
            warn!("Unknown command: {other}");
            return;
        }
    };

    if let Err(e) = handle.request(action).await {
        error!("Failed to submit action: {e}");
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=debug). Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();

    let config_text =
        std::fs::read_to_string(&cli.config).context("Failed to read config file")?;
    let config: Config = toml::from_str(&config_text).context("Failed to parse config file")?;

    let session_config = build_session_config(&config)?;
    info!(
        "Starting session for panel at {}:{}",
        session_config.host, session_config.port
    );

    let (session, handle) = Session::new(session_config);
    let mut session_task = tokio::spawn(session.run());

    // MQTT client
    let (mqtt_host, mqtt_port) = parse_mqtt_url(&config.mqtt.url)?;
    let mut mqtt_opts = MqttOptions::new(&config.mqtt.client_id, mqtt_host, mqtt_port);
    mqtt_opts.set_keep_alive(Duration::from_secs(30));
    let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 256);

    let subscribe_topic = config.mqtt.subscribe_topic;
    let publish_topic = config.mqtt.publish_topic;

    // Task 1: session events → MQTT
    let client_events = client.clone();
    let topic_events = publish_topic.clone();
    let mut event_rx = handle.subscribe();
    let event_handle = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    publish_session_event(&client_events, &topic_events, event).await;
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event receiver lagged, missed {n} events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    info!("Event channel closed");
                    break;
                }
            }
        }
    });

    // Task 2: MQTT event loop (receives messages, submits actions)
    let cmd_handle = handle.clone();
    let sub_topic = subscribe_topic.clone();
    let client_cmds = client.clone();
    let mqtt_handle = tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // (Re)subscribe after every broker connect/reconnect;
                    // rumqttc does not auto-resubscribe.
                    info!("MQTT: connected, subscribing to {sub_topic}");
                    if let Err(e) = client_cmds.subscribe(&sub_topic, QoS::AtLeastOnce).await {
                        error!("Failed to subscribe to {sub_topic}: {e}");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(msg))) => {
                    if msg.topic == sub_topic {
                        let payload = String::from_utf8_lossy(&msg.payload);
                        match serde_json::from_str::<MqttCommand>(&payload) {
                            Ok(cmd) => {
                                info!("MQTT command received: {payload}");
                                handle_command(cmd, &cmd_handle).await;
                            }
                            Err(e) => warn!("Failed to parse MQTT command: {e}"),
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT event loop error: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    info!("Bridge running. Send SIGINT/SIGTERM to stop.");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
        }
        result = &mut session_task => {
            // The session only ends on its own for a fatal error
            // (rejected password) or a clean shutdown.
            event_handle.abort();
            mqtt_handle.abort();
            match result {
                Ok(session_result) => session_result.context("Session terminated")?,
                Err(e) => anyhow::bail!("Session task panicked: {e}"),
            }
            return Ok(());
        }
    }

    event_handle.abort();
    mqtt_handle.abort();
    session_task.abort();
    info!("Shutdown complete");
    Ok(())
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port_str) = stripped
        .rsplit_once(':')
        .context("MQTT URL must be in format mqtt://host:port")?;

    let port: u16 = port_str.parse().context("Invalid MQTT port number")?;

    Ok((host.to_string(), port))
}

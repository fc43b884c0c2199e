//! CLI for tvhub
//!
//! Subcommands:
//! - `server`: run the WebSocket hub
//! - `watch`: connect to a hub, subscribe to a topic and print what arrives
//! - `press`: send a single remote keypress to the configured TV

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::connect_async;
use tracing::{error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use tvhub::config::{Settings, load_config};
use tvhub::device::RokuClient;
use tvhub::hub::Hub;
use tvhub::topics::{PowerStateDriver, ROKU_POWER, Unconfigured};
use tvhub::transport::start_websocket_server;
use tvhub::utils::{DeviceError, Result, logging};

#[derive(Parser)]
#[command(name = "tvhub")]
enum Command {
    /// Start the WebSocket hub
    Server,
    /// Subscribe to a topic on a running hub and print every message
    Watch {
        #[arg(long, default_value = "ws://127.0.0.1:8080/ws/app")]
        url: String,
        #[arg(long, default_value = ROKU_POWER)]
        topic: String,
    },
    /// Send one keypress (e.g. Home, PowerOn, VolumeUp) to the TV
    Press { key: String },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Command::parse()).await {
        // config errors happen before logging is set up
        logging::init("info");
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(cmd: Command) -> Result<()> {
    let config = load_config()?;
    logging::init(&config.log.level);

    match cmd {
        Command::Server => run_server(config).await,
        Command::Watch { url, topic } => run_watch(&url, &topic).await,
        Command::Press { key } => run_press(&config, &key).await,
    }
}

async fn run_server(config: Settings) -> Result<()> {
    let hub = Arc::new(Hub::new());
    let interval = Duration::from_millis(config.roku.poll_interval_ms);

    match RokuClient::from_settings(&config.roku) {
        Ok(client) => {
            info!("Polling Roku at {}", client.base_url());
            PowerStateDriver::register(&hub, client, interval);
        }
        Err(DeviceError::NotConfigured) => {
            warn!("No Roku configured; {ROKU_POWER} will report offline");
            PowerStateDriver::register(&hub, Unconfigured, interval);
        }
        Err(e) => return Err(e.into()),
    }

    tokio::select! {
        res = start_websocket_server(&config.server, hub) => {
            res?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_watch(url: &str, topic: &str) -> Result<()> {
    let (mut ws_stream, _response) = connect_async(url).await?;

    let subscribe = json!({ "type": "subscribe", "topic": topic });
    ws_stream
        .send(WsMessage::text(subscribe.to_string()))
        .await?;
    info!("Subscribed to {topic} on {url}");

    while let Some(msg) = ws_stream.next().await {
        match msg? {
            WsMessage::Text(text) => println!("{text}"),
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    info!("Connection closed by server");
    Ok(())
}

async fn run_press(config: &Settings, key: &str) -> Result<()> {
    let client = RokuClient::from_settings(&config.roku)?;
    client.keypress(key).await?;
    info!("Sent {key} to {}", client.base_url());
    Ok(())
}

//! tvctl — entry point.
//!
//! Thin wrapper over the `tvctl` library: parses the action, loads the stored
//! pairing credential, runs the session, prints the outcome, and exits
//! non-zero on any failure.  All protocol state lives in
//! [`tvctl::application::session`].
//!
//! # Usage
//!
//! ```text
//! tvctl --host <IP> [--port 3000] <ACTION> [PARAM]
//!
//! Actions:
//!   pair              Pair with the TV (one-time; confirm on screen)
//!   off               Turn the TV off
//!   info              Print TV system information
//!   input <ID>        Switch input (HDMI_1, HDMI_2, …)
//!   app <ID>          Launch an app by webOS id
//!   volume <N>        Set volume (0–100)
//!   mute              Mute the audio
//!   wake <MAC|IP>     Send a wake-on-LAN packet (no --host needed)
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable  | Default | Description            |
//! |-----------|---------|------------------------|
//! | `TV_HOST` | —       | TV address             |
//! | `TV_PORT` | `3000`  | SSAP WebSocket port    |

use std::net::IpAddr;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use ssap_core::wake::MacAddr;
use ssap_core::DeviceEndpoint;
use tvctl::application::commands::{self, TvCommand};
use tvctl::application::session::TvSession;
use tvctl::domain::config::ClientConfig;
use tvctl::infrastructure::arp;
use tvctl::infrastructure::keystore::KeyStore;
use tvctl::infrastructure::wol;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Command-line remote control for webOS TVs.
#[derive(Debug, Parser)]
#[command(name = "tvctl", about = "Control a webOS TV over the SSAP WebSocket protocol", version)]
struct Cli {
    /// TV hostname or IP address (required for every action except `wake`).
    #[arg(long, short = 'H', env = "TV_HOST")]
    host: Option<String>,

    /// SSAP WebSocket port on the TV.
    #[arg(long, default_value_t = 3000, env = "TV_PORT")]
    port: u16,

    /// Per-request timeout in seconds (also bounds connection establishment).
    #[arg(long, default_value_t = 10)]
    request_timeout: u64,

    /// Pairing timeout in seconds (the user has to confirm on the TV).
    #[arg(long, default_value_t = 30)]
    pairing_timeout: u64,

    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Pair with the TV (one-time setup; accept the prompt on screen).
    Pair,
    /// Turn the TV off.
    Off,
    /// Print TV system information.
    Info,
    /// Switch input source.
    Input {
        /// Input id, e.g. HDMI_1.
        input_id: String,
    },
    /// Launch an app by its webOS app id.
    App {
        /// App id, e.g. netflix or youtube.leanback.v4.
        app_id: String,
    },
    /// Set the volume.
    Volume {
        /// Volume level 0–100.
        level: u8,
    },
    /// Mute the audio.
    Mute,
    /// Send a wake-on-LAN magic packet to power the TV on.
    Wake {
        /// Hardware address (e.g. dc:03:98:18:49:1c), or the TV's IP
        /// address to resolve through the system ARP table.
        target: String,
        /// Broadcast address to send to.
        #[arg(long, default_value = "255.255.255.255")]
        broadcast: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides; default keeps the CLI quiet except for warnings.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    if let Action::Wake { target, broadcast } = &cli.action {
        let (target, broadcast) = (target.clone(), broadcast.clone());
        return run_wake(&target, &broadcast).await;
    }
    run_tv_action(cli).await
}

/// Handles `wake`: resolve the target to a MAC if needed, send the packet.
/// No session is opened — the TV is presumed off.
async fn run_wake(target: &str, broadcast: &str) -> anyhow::Result<()> {
    let mac = match target.parse::<MacAddr>() {
        Ok(mac) => mac,
        Err(_) => {
            let ip: IpAddr = target.parse().with_context(|| {
                format!("{target:?} is neither a MAC address nor an IP address")
            })?;
            let mac = arp::resolve_mac(ip).await?;
            info!("resolved {ip} to {mac} through the ARP table");
            mac
        }
    };
    let broadcast: IpAddr = broadcast
        .parse()
        .with_context(|| format!("invalid broadcast address {broadcast:?}"))?;

    wol::send_wake(&mac, broadcast)
        .await
        .context("failed to send wake-on-LAN packet")?;
    println!("wake packet sent to {mac}; the TV should power on within a few seconds");
    Ok(())
}

/// Handles every session-backed action: connect, register, dispatch, close.
async fn run_tv_action(cli: Cli) -> anyhow::Result<()> {
    let host = cli
        .host
        .context("--host (or TV_HOST) is required for TV commands")?;
    let endpoint = DeviceEndpoint::new(host, cli.port);

    let config = ClientConfig {
        endpoint: endpoint.clone(),
        request_timeout: Duration::from_secs(cli.request_timeout),
        pairing_timeout: Duration::from_secs(cli.pairing_timeout),
    };

    let keystore = KeyStore::open().context("cannot locate the credential directory")?;
    debug!("credential directory: {}", keystore.dir().display());
    let stored = keystore.load(&endpoint);
    if stored.is_some() {
        info!("using saved pairing key");
    }

    let session = TvSession::connect(config).await?;

    if matches!(cli.action, Action::Pair) && stored.is_none() {
        println!("pairing request sent; please accept the connection on your TV screen");
    }
    let new_key = session.register(stored.as_deref()).await?;

    // A failed write is reported but never revokes a pairing the TV already
    // confirmed for this run.
    if let Some(key) = &new_key {
        match keystore.save(&endpoint, key) {
            Ok(()) => info!("pairing key saved for future use"),
            Err(e) => warn!("pairing succeeded but the key could not be stored: {e}"),
        }
    }

    let command = match &cli.action {
        Action::Pair => {
            println!("paired with {endpoint}");
            session.close().await;
            return Ok(());
        }
        Action::Off => TvCommand::Off,
        Action::Info => TvCommand::Info,
        Action::Input { input_id } => TvCommand::Input(input_id.clone()),
        Action::App { app_id } => TvCommand::App(app_id.clone()),
        Action::Volume { level } => TvCommand::Volume(*level),
        Action::Mute => TvCommand::Mute,
        Action::Wake { .. } => unreachable!("wake is handled before a session is opened"),
    };

    let result = commands::execute(&session, &command).await;
    session.close().await;

    let payload = result?;
    if matches!(command, TvCommand::Info) {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}", command.success_message());
    }
    Ok(())
}

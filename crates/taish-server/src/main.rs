//! TAI shell: entry point.
//!
//! Serves the line-oriented transponder control protocol on one TCP port.
//! An operator connects with any line-mode client (`nc`, `telnet`), loads a
//! vendor backend, initializes it, and manages the modules it reports.
//!
//! # Usage
//!
//! ```text
//! taish [OPTIONS]
//!
//! Options:
//!   -i, --ip <IP>          Address to listen on [default: 0.0.0.0]
//!   -p, --port <PORT>      Port to listen on [default: 4501]
//!   -c, --config <PATH>    Config file [default: platform config dir]
//!       --load <BACKEND>   Load a backend before accepting connections
//!       --init             Initialize the loaded backend at startup
//! ```
//!
//! CLI values override the config file.  `RUST_LOG` overrides the configured
//! log level.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use taish_server::application::embed::ShellHandle;
use taish_server::application::shell::Shell;
use taish_server::infrastructure::dispatcher::Dispatcher;
use taish_server::infrastructure::network::ConnectionManager;
use taish_server::infrastructure::presence::PresenceChannel;
use taish_server::infrastructure::storage::{load_config, AppConfig};
use taish_server::infrastructure::vendor::SimulatorLoader;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Control shell for optical transponder modules.
#[derive(Debug, Parser)]
#[command(name = "taish", about = "Line-oriented control shell for TAI transponders", version)]
struct Cli {
    /// IP address to listen on.
    #[arg(short = 'i', long = "ip", env = "TAISH_IP")]
    ip: Option<String>,

    /// TCP port to listen on.
    #[arg(short, long, env = "TAISH_PORT")]
    port: Option<u16>,

    /// Path of the TOML config file.
    #[arg(short, long, env = "TAISH_CONFIG")]
    config: Option<PathBuf>,

    /// Backend to load at startup (e.g. `simulator`).
    #[arg(long, value_name = "BACKEND")]
    load: Option<String>,

    /// Initialize the backend at startup.  Requires a backend to load.
    #[arg(long)]
    init: bool,
}

impl Cli {
    /// Overlays the command line on top of `config`.
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(ip) = self.ip {
            config.server.bind_address = ip;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(backend) = self.load {
            config.shell.autoload = Some(backend);
        }
        if self.init {
            config.shell.autoinit = true;
        }
        config
    }
}

/// Socket address to listen on.
///
/// # Errors
///
/// Returns an error if `bind_address` is not an IP address.
fn listen_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    let ip: std::net::IpAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("invalid listen address: '{}'", config.server.bind_address))?;
    Ok(SocketAddr::new(ip, config.server.port))
}

/// Resolves once Ctrl+C is received.  Never resolves if the handler cannot
/// be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone();
    let config = cli.apply(
        load_config(config_path.as_deref()).context("failed to load configuration")?,
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.shell.log_level)),
        )
        .init();

    let addr = listen_addr(&config)?;
    info!("TAI shell starting on {addr}");

    let presence = PresenceChannel::new();
    let loader = Arc::new(SimulatorLoader::new(config.simulator.clone()));
    let handle = ShellHandle::new(Shell::new(loader, presence.callback()));

    match &config.shell.autoload {
        Some(backend) => {
            handle
                .load(backend)
                .await
                .with_context(|| format!("failed to load backend `{backend}`"))?;
            if config.shell.autoinit {
                handle.init().await.context("failed to initialize backend")?;
            }
        }
        None if config.shell.autoinit => warn!("--init ignored: no backend to load"),
        None => {}
    }

    let connections = ConnectionManager::bind(addr)
        .await
        .context("failed to start listener")?;
    let dispatcher = Dispatcher::new(handle.shared(), presence, connections);

    dispatcher
        .run(shutdown_signal())
        .await
        .context("dispatcher stopped on a fatal error")?;

    info!("TAI shell stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

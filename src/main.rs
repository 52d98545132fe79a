use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::net::lookup_host;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::Cli;
use crapvpn::config::{self, TunnelConfig};
use crapvpn::device;
use crapvpn::tunnel::{bind_socket, Relay, TunnelEndpoint};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    let config = resolve_config(&cli)?;
    run_tunnel(config).await
}

fn init_logging(cli: &Cli) {
    let subscriber =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&cli.log_level));

    match cli.log_format.as_str() {
        "json" => {
            subscriber
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            subscriber.with(tracing_subscriber::fmt::layer()).init();
        }
    }
}

/// Merge the optional config file with command-line overrides and validate
/// the result before any handle is opened.
fn resolve_config(cli: &Cli) -> anyhow::Result<TunnelConfig> {
    let file = match &cli.config {
        Some(path) => config::load_config(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => config::FileConfig::default(),
    };
    let tunnel = file.tunnel;

    let hex_key = cli
        .hex_key
        .clone()
        .or(tunnel.hex_key)
        .context("no encryption key given (--hex-key or config file)")?;
    let peer_host = cli
        .peer_host
        .clone()
        .or(tunnel.peer_host)
        .context("no peer host given (--peer-host or config file)")?;

    let config = TunnelConfig {
        interface: cli
            .interface
            .clone()
            .or(tunnel.interface)
            .unwrap_or_else(|| config::DEFAULT_INTERFACE.to_string()),
        local_ip: cli.local_ip,
        peer_ip: cli.peer_ip,
        listen_port: cli
            .listen_port
            .or(tunnel.listen_port)
            .unwrap_or(config::DEFAULT_PORT),
        peer_host,
        peer_port: cli
            .peer_port
            .or(tunnel.peer_port)
            .unwrap_or(config::DEFAULT_PORT),
        key: config::parse_hex_key(&hex_key)?,
    };
    config.validate()?;
    Ok(config)
}

async fn run_tunnel(config: TunnelConfig) -> anyhow::Result<()> {
    let device = device::open(&config.interface)
        .with_context(|| format!("failed to open TUN device '{}'", config.interface))?;
    device::configure_point_to_point(&config.interface, config.local_ip, config.peer_ip)
        .await
        .with_context(|| format!("failed to configure interface '{}'", config.interface))?;

    let peer = resolve_peer(&config.peer_host, config.peer_port).await?;
    let listen = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    let socket =
        bind_socket(listen).with_context(|| format!("failed to bind UDP socket on {listen}"))?;

    tracing::info!(
        "Tunnel up: {} ({} <-> {}), listening on {}, peer {}",
        config.interface,
        config.local_ip,
        config.peer_ip,
        listen,
        peer
    );

    let endpoint = TunnelEndpoint::new(device, socket, peer);
    let relay = Relay::new(endpoint, config.key.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    relay.run(shutdown_rx).await?;
    tracing::info!("Tunnel stopped");
    Ok(())
}

/// Resolve the peer's host and port to a single socket address.
async fn resolve_peer(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let target = format!("{host}:{port}");
    let mut addrs = lookup_host(&target)
        .await
        .with_context(|| format!("failed to resolve '{target}'"))?;
    addrs
        .next()
        .with_context(|| format!("no addresses found for '{target}'"))
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C (SIGINT)");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}

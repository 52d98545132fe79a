use clap::Parser;
use std::net::Ipv4Addr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crapvpn")]
#[command(author, version, about = "Point-to-point IP tunnel over UDP", long_about = None)]
pub struct Cli {
    /// Optional TOML configuration file; command-line flags take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Encryption key (hex encoded), shared out-of-band with the peer
    #[arg(short = 'k', long)]
    pub hex_key: Option<String>,

    /// Remote peer host name or address
    #[arg(short = 'p', long)]
    pub peer_host: Option<String>,

    /// UDP port to listen on
    #[arg(long)]
    pub listen_port: Option<u16>,

    /// UDP port the peer listens on
    #[arg(long)]
    pub peer_port: Option<u16>,

    /// TUN interface name
    #[arg(long)]
    pub interface: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (json, plain)
    #[arg(long, default_value = "plain")]
    pub log_format: String,

    /// IP address assigned to the local end of the tunnel interface
    pub local_ip: Ipv4Addr,

    /// IP address of the remote end of the tunnel interface
    pub peer_ip: Ipv4Addr,
}

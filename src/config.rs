use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// UDP port used by both ends when none is configured.
pub const DEFAULT_PORT: u16 = 1337;

/// Interface name used when none is configured.
pub const DEFAULT_INTERFACE: &str = "tun0";

// Linux IFNAMSIZ, including the trailing NUL.
const MAX_INTERFACE_NAME: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// On-disk configuration. Every field is optional; command-line arguments
/// take precedence over the file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub tunnel: TunnelSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct TunnelSection {
    pub interface: Option<String>,
    pub listen_port: Option<u16>,
    pub peer_host: Option<String>,
    pub peer_port: Option<u16>,
    pub hex_key: Option<String>,
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path)?;
    let config = toml::from_str(&raw)?;
    Ok(config)
}

/// Fully resolved tunnel settings, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct TunnelConfig {
    pub interface: String,
    pub local_ip: Ipv4Addr,
    pub peer_ip: Ipv4Addr,
    pub listen_port: u16,
    pub peer_host: String,
    pub peer_port: u16,
    pub key: Vec<u8>,
}

impl TunnelConfig {
    /// Reject configurations the tunnel must not start with. Contract
    /// violations are caught here, before any handle is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.is_empty() {
            return Err(ConfigError::ValidationError(
                "encryption key must not be empty".to_string(),
            ));
        }
        if self.interface.is_empty() {
            return Err(ConfigError::ValidationError(
                "interface name must not be empty".to_string(),
            ));
        }
        if self.interface.len() >= MAX_INTERFACE_NAME {
            return Err(ConfigError::ValidationError(format!(
                "interface name '{}' must be shorter than {} bytes",
                self.interface, MAX_INTERFACE_NAME
            )));
        }
        if self.peer_host.is_empty() {
            return Err(ConfigError::ValidationError(
                "peer host must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decode a hex-encoded key shared out-of-band with the peer.
pub fn parse_hex_key(hex_key: &str) -> Result<Vec<u8>, ConfigError> {
    let key = hex::decode(hex_key.trim())
        .map_err(|e| ConfigError::ValidationError(format!("invalid hex key: {e}")))?;
    if key.is_empty() {
        return Err(ConfigError::ValidationError(
            "encryption key must not be empty".to_string(),
        ));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> TunnelConfig {
        TunnelConfig {
            interface: DEFAULT_INTERFACE.to_string(),
            local_ip: Ipv4Addr::new(10, 0, 0, 1),
            peer_ip: Ipv4Addr::new(10, 0, 0, 2),
            listen_port: DEFAULT_PORT,
            peer_host: "192.0.2.10".to_string(),
            peer_port: DEFAULT_PORT,
            key: vec![0x2a, 0x00],
        }
    }

    #[test]
    fn test_parse_hex_key() {
        assert_eq!(parse_hex_key("2a00").unwrap(), vec![0x2a, 0x00]);
        assert_eq!(parse_hex_key(" deadbeef \n").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_parse_hex_key_rejects_garbage() {
        assert!(matches!(
            parse_hex_key("zz"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            parse_hex_key("abc"),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_parse_hex_key_rejects_empty() {
        assert!(matches!(
            parse_hex_key(""),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_key() {
        let mut config = valid_config();
        config.key.clear();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_long_interface_name() {
        let mut config = valid_config();
        config.interface = "a-very-long-interface-name".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[tunnel]
interface = "vpn0"
listen_port = 4000
peer_host = "203.0.113.7"
hex_key = "2a00"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.tunnel.interface.as_deref(), Some("vpn0"));
        assert_eq!(config.tunnel.listen_port, Some(4000));
        assert_eq!(config.tunnel.peer_host.as_deref(), Some("203.0.113.7"));
        assert_eq!(config.tunnel.peer_port, None);
        assert_eq!(config.tunnel.hex_key.as_deref(), Some("2a00"));
    }

    #[test]
    fn test_load_config_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = load_config(&path).unwrap();
        assert!(config.tunnel.interface.is_none());
        assert!(config.tunnel.hex_key.is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(matches!(
            load_config(Path::new("/nonexistent/config.toml")),
            Err(ConfigError::ReadError(_))
        ));
    }
}

//! TUN device creation and interface configuration.
//!
//! The tunnel core treats the device as an opaque packet pipe; everything
//! here runs once at startup. Address assignment goes through `ip(8)` rather
//! than netlink, matching what an operator would run by hand:
//! `ip link set <dev> up` and `ip addr add <local> peer <peer> dev <dev>`.

use std::net::Ipv4Addr;

use thiserror::Error;
use tokio::process::Command;
use tun::AsyncDevice;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to create TUN device: {0}")]
    Create(#[from] tun::Error),

    #[error("failed to run `{command}`: {source}")]
    CommandIo {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Open the named TUN device.
///
/// Packet information is disabled so each read and write carries exactly one
/// raw IP packet.
pub fn open(name: &str) -> Result<AsyncDevice, DeviceError> {
    let mut config = tun::configure();
    config.name(name);

    #[cfg(target_os = "linux")]
    config.platform(|platform| {
        platform.packet_information(false);
    });

    Ok(tun::create_as_async(&config)?)
}

/// Bring the interface up and assign the point-to-point address pair.
pub async fn configure_point_to_point(
    name: &str,
    local: Ipv4Addr,
    peer: Ipv4Addr,
) -> Result<(), DeviceError> {
    run_ip(&["link", "set", name, "up"]).await?;
    run_ip(&[
        "addr",
        "add",
        &local.to_string(),
        "peer",
        &peer.to_string(),
        "dev",
        name,
    ])
    .await?;
    Ok(())
}

async fn run_ip(args: &[&str]) -> Result<(), DeviceError> {
    let command = format!("ip {}", args.join(" "));
    tracing::debug!("Running `{}`", command);

    let output = Command::new("ip")
        .args(args)
        .output()
        .await
        .map_err(|source| DeviceError::CommandIo {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(DeviceError::CommandFailed {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

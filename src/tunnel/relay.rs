use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::crypto;
use crate::tunnel::endpoint::{EndpointError, IoEvent, TunnelEndpoint};
use crate::tunnel::frame;

// The readiness wait wakes at least this often so liveness can be traced
// even when both handles are idle. Protocol correctness does not depend on
// it; nothing is sent on the wire for a tick.
const LIVENESS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// The tunnel's event loop.
///
/// Multiplexes the TUN device and the peer socket, driving both directions:
/// packets from the device are encrypted, framed, and sent to the peer;
/// datagrams from the peer are validated, decrypted, and written back to the
/// device. Runs until a fatal I/O error or a shutdown request; there is no
/// handshake or teardown exchange with the peer.
pub struct Relay<D> {
    endpoint: TunnelEndpoint<D>,
    key: Vec<u8>,
    forwarded: u64,
    delivered: u64,
}

impl<D> Relay<D>
where
    D: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(endpoint: TunnelEndpoint<D>, key: Vec<u8>) -> Self {
        assert!(!key.is_empty(), "tunnel key must not be empty");
        Self {
            endpoint,
            key,
            forwarded: 0,
            delivered: 0,
        }
    }

    /// Service both endpoints until shutdown is requested or an I/O error
    /// makes the tunnel unusable. Handles are released on every exit path.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), RelayError> {
        let mut liveness = interval(LIVENESS_INTERVAL);
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("Shutdown requested, stopping tunnel");
                    return Ok(());
                }
                event = self.endpoint.ready() => match event? {
                    IoEvent::Interface(packet) => self.forward_outbound(&packet).await?,
                    IoEvent::Peer(datagram) => self.deliver_inbound(&datagram).await?,
                },
                _ = liveness.tick() => {
                    tracing::trace!(
                        "Tunnel alive: {} packets forwarded, {} delivered",
                        self.forwarded,
                        self.delivered
                    );
                }
            }
        }
    }

    /// Device -> peer: encrypt, frame, send as one datagram.
    async fn forward_outbound(&mut self, packet: &[u8]) -> Result<(), RelayError> {
        let ciphertext = crypto::transform(packet, &self.key);
        let datagram = frame::encode(&ciphertext);
        self.endpoint.send_to_peer(&datagram).await?;

        self.forwarded += 1;
        tracing::trace!("Forwarded {} byte packet to peer", packet.len());
        Ok(())
    }

    /// Peer -> device: validate the frame, decrypt, write.
    ///
    /// Datagrams that fail frame validation are dropped without surfacing an
    /// error; discarding unparseable traffic is the protocol's only defense
    /// against noise and must not stop the loop.
    async fn deliver_inbound(&mut self, datagram: &[u8]) -> Result<(), RelayError> {
        let ciphertext = match frame::decode(datagram) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::trace!("Dropping {} byte datagram: {}", datagram.len(), error);
                return Ok(());
            }
        };

        let packet = crypto::transform(ciphertext, &self.key);
        self.endpoint.write_to_interface(&packet).await?;

        self.delivered += 1;
        tracing::trace!("Delivered {} byte packet to interface", packet.len());
        Ok(())
    }
}

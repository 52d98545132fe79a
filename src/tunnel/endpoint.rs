use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UdpSocket;

/// Largest chunk read from the TUN device in one call; also bounds a
/// received datagram.
pub const MAX_PACKET_SIZE: usize = 65535;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("TUN device I/O failed: {0}")]
    Device(#[source] io::Error),

    #[error("UDP socket I/O failed: {0}")]
    Socket(#[source] io::Error),

    #[error("short write to TUN device: wrote {written} of {len} bytes")]
    ShortWrite { written: usize, len: usize },

    #[error("TUN device closed")]
    DeviceClosed,
}

/// Data produced by one of the endpoint's two handles becoming readable.
#[derive(Debug)]
pub enum IoEvent {
    /// A packet read from the TUN device.
    Interface(Vec<u8>),
    /// A datagram received on the peer-facing socket.
    Peer(Vec<u8>),
}

/// Bind the tunnel's UDP socket with address reuse enabled.
pub fn bind_socket(listen: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(listen), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&listen.into())?;
    UdpSocket::from_std(socket.into())
}

/// The tunnel's I/O endpoint: the TUN device handle, the UDP socket, and the
/// fixed peer address. Created once at startup and owned exclusively by the
/// relay for the process lifetime.
///
/// Generic over the device so tests can substitute an in-memory stream for
/// the real `tun::AsyncDevice`.
pub struct TunnelEndpoint<D> {
    device: D,
    socket: UdpSocket,
    peer: SocketAddr,
}

impl<D> TunnelEndpoint<D>
where
    D: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(device: D, socket: UdpSocket, peer: SocketAddr) -> Self {
        Self {
            device,
            socket,
            peer,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Wait until either handle has data and return what it produced.
    ///
    /// Both reads are datagram-granular, so losing the race within the
    /// `select!` consumes nothing.
    pub async fn ready(&mut self) -> Result<IoEvent, EndpointError> {
        let mut device_buf = vec![0u8; MAX_PACKET_SIZE];
        let mut socket_buf = vec![0u8; MAX_PACKET_SIZE];

        tokio::select! {
            read = self.device.read(&mut device_buf) => {
                match read.map_err(EndpointError::Device)? {
                    // IP packets are never empty; a zero read means the
                    // device went away.
                    0 => Err(EndpointError::DeviceClosed),
                    len => {
                        device_buf.truncate(len);
                        Ok(IoEvent::Interface(device_buf))
                    }
                }
            }
            received = self.socket.recv_from(&mut socket_buf) => {
                let (len, _source) = received.map_err(EndpointError::Socket)?;
                socket_buf.truncate(len);
                Ok(IoEvent::Peer(socket_buf))
            }
        }
    }

    /// Read one raw packet from the TUN device.
    pub async fn read_from_interface(&mut self) -> Result<Vec<u8>, EndpointError> {
        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let len = self
            .device
            .read(&mut buf)
            .await
            .map_err(EndpointError::Device)?;
        if len == 0 {
            return Err(EndpointError::DeviceClosed);
        }
        buf.truncate(len);
        Ok(buf)
    }

    /// Write one raw packet back to the TUN device. The device either takes
    /// the whole packet or the write is an error.
    pub async fn write_to_interface(&mut self, packet: &[u8]) -> Result<(), EndpointError> {
        let written = self
            .device
            .write(packet)
            .await
            .map_err(EndpointError::Device)?;
        if written != packet.len() {
            return Err(EndpointError::ShortWrite {
                written,
                len: packet.len(),
            });
        }
        Ok(())
    }

    /// Send one encoded frame as a single datagram to the fixed peer. Frames
    /// are never fragmented or coalesced.
    pub async fn send_to_peer(&self, frame: &[u8]) -> Result<(), EndpointError> {
        self.socket
            .send_to(frame, self.peer)
            .await
            .map_err(EndpointError::Socket)?;
        Ok(())
    }

    /// Receive one datagram payload. The source address is not checked;
    /// frame validation is the only defense against foreign traffic.
    pub async fn receive_from_peer(&self) -> Result<Vec<u8>, EndpointError> {
        let mut buf = vec![0u8; MAX_PACKET_SIZE];
        let (len, _source) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(EndpointError::Socket)?;
        buf.truncate(len);
        Ok(buf)
    }
}

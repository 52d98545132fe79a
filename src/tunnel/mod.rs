pub mod endpoint;
pub mod frame;
pub mod relay;

pub use endpoint::{bind_socket, EndpointError, IoEvent, TunnelEndpoint, MAX_PACKET_SIZE};
pub use frame::{FrameError, HEADER_SIZE, MAGIC, MAX_PAYLOAD_SIZE};
pub use relay::{Relay, RelayError};

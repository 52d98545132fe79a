//! crapvpn - a point-to-point IP tunnel over UDP
//!
//! crapvpn reads raw IP packets from a TUN device, obscures them with a
//! repeating-key XOR cipher, wraps them in a small length-framed datagram,
//! and forwards them to a single fixed peer over UDP. Received datagrams are
//! validated, decrypted, and written back to the TUN device. Transport is
//! strictly best-effort: unordered, unreliable, fire-and-forget.
//!
//! The XOR cipher is deliberately weak and provides no confidentiality; it
//! is part of the wire protocol, not a security mechanism.

pub mod config;
pub mod crypto;
pub mod device;
pub mod tunnel;

pub use config::TunnelConfig;
pub use tunnel::{Relay, TunnelEndpoint};

//! Connection management
//!
//! This module handles:
//! * Transport abstraction (TCP vs Unix socket)
//! * Connection lifecycle (handshake, charset negotiation, close)
//! * State machine enforcement
//! * I/O statistics

mod ack;
mod conn;
mod state;
mod stats;
mod transport;

pub use conn::{Connection, ConnectionConfig, ConnectionConfigBuilder};
pub use state::ConnectionState;
pub use stats::Stats;
pub use transport::{Socket, Transport, TransportProtocol};

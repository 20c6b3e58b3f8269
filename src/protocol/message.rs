//! Protocol message types

use super::constants::markers;
use bytes::Bytes;

/// Packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Payload length (24 bits)
    pub payload_len: usize,
    /// Sequence id
    pub sequence_id: u8,
}

/// One logical packet, reassembled if the server split it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Sequence id of the first frame
    pub sequence_id: u8,
    /// Payload without headers
    pub payload: Bytes,
}

/// Server greeting (Handshake v10)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    /// Protocol version (always 10)
    pub protocol_version: u8,
    /// Human-readable server version, e.g. "8.0.36"
    pub server_version: String,
    /// Connection (thread) id assigned by the server
    pub connection_id: u32,
    /// Server capability flags
    pub capability_flags: u32,
    /// Default server character set / collation id
    pub character_set: u8,
    /// Server status flags
    pub status_flags: u16,
    /// Auth plugin data (nonce), both parts joined, trailing NUL removed
    pub auth_plugin_data: Bytes,
    /// Auth plugin name
    pub auth_plugin_name: String,
}

/// Decoded ERR packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// MySQL error code, e.g. 1045
    pub code: u16,
    /// Five-character SQL state, when the server sent one
    pub sql_state: Option<String>,
    /// Message, verbatim
    pub message: String,
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ERROR {}", self.code)?;
        if let Some(ref state) = self.sql_state {
            write!(f, " ({})", state)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ServerError {}

/// Acknowledgement kind, decided by the first payload byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// OK packet
    Ok,
    /// ERR packet
    Err,
    /// Anything else
    Unrecognized,
}

impl Acknowledgement {
    /// Classify a payload using the given OK/ERR markers
    pub fn classify(payload: &[u8], ok: u8, err: u8) -> Self {
        match payload.first() {
            Some(&b) if b == ok => Acknowledgement::Ok,
            Some(&b) if b == err => Acknowledgement::Err,
            _ => Acknowledgement::Unrecognized,
        }
    }

    /// Classify a payload using the MySQL markers
    pub fn of(payload: &[u8]) -> Self {
        Self::classify(payload, markers::OK, markers::ERR)
    }
}

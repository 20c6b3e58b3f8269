//! Error types

use crate::protocol::ServerError;
use std::io;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while opening, negotiating or closing a connection
#[derive(Debug, Error)]
pub enum Error {
    /// Dial, read or write failure on the transport
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// The peer closed the stream, or the connection was already closed locally
    #[error("connection closed")]
    ConnectionClosed,

    /// A packet the codec could not decode
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Well-formed ERR packet reported by the server
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// Acknowledgement whose first byte is neither OK nor ERR
    #[error("unrecognized acknowledgement (payload: {})", hex::encode(.payload))]
    UnrecognizedAcknowledgement {
        /// Raw payload as received
        payload: Vec<u8>,
    },

    /// Invalid configuration or connection string
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Illegal connection state transition
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },
}

impl Error {
    /// Stable label for logs and metrics
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(_) | Error::ConnectionClosed => "transport",
            Error::Protocol(_) => "protocol",
            Error::Server(_) => "server",
            Error::UnrecognizedAcknowledgement { .. } => "unrecognized_ack",
            Error::Config(_) => "config",
            Error::InvalidState { .. } => "state",
        }
    }

    /// Whether opening a fresh connection with the same parameters may succeed.
    ///
    /// Only transport failures qualify. Server errors need different input
    /// (credentials, database) and protocol faults point at a version mismatch.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::ConnectionClosed)
    }

    /// The server-reported error, if this is one
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            Error::Server(err) => Some(err),
            _ => None,
        }
    }
}

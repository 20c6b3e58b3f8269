//! mysql-wire: the MySQL connection phase, synchronously
//!
//! This crate opens a connection to a MySQL-compatible server and takes it through the
//! connection phase: the Handshake v10 greeting, the HandshakeResponse41 authentication
//! reply, the server's acknowledgement, and a final `SET NAMES utf8`. A [`Connection`] is
//! only ever handed to the caller once every one of those steps has succeeded.
//!
//! The protocol codec sits behind the [`protocol::Codec`] trait. [`protocol::MySqlCodec`] is
//! the implementation used by [`Connection::open`].
//!
//! ```no_run
//! use mysql_wire::Connection;
//!
//! let mut conn = Connection::open("root", "secret", "tcp", "127.0.0.1:3306", "app")?;
//! tracing::info!(syscalls = conn.stats().syscalls, "connected");
//! conn.close()?;
//! # Ok::<(), mysql_wire::Error>(())
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod protocol;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ConnectionInfo;
pub use connection::{
    Connection, ConnectionConfig, ConnectionConfigBuilder, ConnectionState, Socket, Stats,
    Transport, TransportProtocol,
};
pub use error::{Error, Result};
pub use protocol::{Codec, MySqlCodec, ServerError};

//! Core connection type

use super::ack::check_acknowledgement;
use super::state::ConnectionState;
use super::stats::Stats;
use super::transport::{Socket, Transport, TransportProtocol};
use crate::protocol::constants::SET_NAMES_UTF8;
use crate::protocol::{Codec, MySqlCodec, PacketStream};
use crate::{Error, Result};
use bytes::Bytes;
use std::fmt;
use std::io;
use std::time::{Duration, Instant};

/// Connection configuration
///
/// Stores the dial target, credentials and optional timeouts.
/// Use `ConnectionConfig::builder()` for timeouts and connection attributes.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Username
    pub user: String,
    /// Password (optional)
    pub password: Option<String>,
    /// Transport protocol
    pub protocol: TransportProtocol,
    /// `host:port` for TCP, filesystem path for Unix sockets
    pub address: String,
    /// Initial database; empty for none
    pub database: String,
    /// Connect timeout, per resolved address
    pub connect_timeout: Option<Duration>,
    /// Socket read timeout
    pub read_timeout: Option<Duration>,
    /// Socket write timeout
    pub write_timeout: Option<Duration>,
    /// Connection attributes sent with the auth response
    pub attributes: Vec<(String, String)>,
}

impl ConnectionConfig {
    /// Create new configuration with defaults
    ///
    /// # Defaults
    ///
    /// - `protocol`: tcp
    /// - `password`: None
    /// - timeouts: None (block indefinitely)
    /// - `attributes`: none
    pub fn new(
        address: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self::builder(address, database, user).build()
    }

    /// Create a builder for advanced configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use mysql_wire::ConnectionConfig;
    /// use std::time::Duration;
    ///
    /// let config = ConnectionConfig::builder("127.0.0.1:3306", "shop", "app")
    ///     .password("secret")
    ///     .connect_timeout(Duration::from_secs(5))
    ///     .read_timeout(Duration::from_secs(30))
    ///     .build();
    /// assert_eq!(config.database, "shop");
    /// ```
    pub fn builder(
        address: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
    ) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder {
            user: user.into(),
            password: None,
            protocol: TransportProtocol::default(),
            address: address.into(),
            database: database.into(),
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            attributes: Vec::new(),
        }
    }

    /// Set password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set transport protocol
    pub fn protocol(mut self, protocol: TransportProtocol) -> Self {
        self.protocol = protocol;
        self
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("protocol", &self.protocol)
            .field("address", &self.address)
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Builder for creating `ConnectionConfig` with advanced options
#[derive(Clone)]
pub struct ConnectionConfigBuilder {
    user: String,
    password: Option<String>,
    protocol: TransportProtocol,
    address: String,
    database: String,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    attributes: Vec<(String, String)>,
}

impl ConnectionConfigBuilder {
    /// Set the password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the transport protocol
    ///
    /// Default: tcp
    pub fn protocol(mut self, protocol: TransportProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set TCP connection timeout
    ///
    /// Default: None (OS default)
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Set socket read timeout
    ///
    /// Default: None (block indefinitely). A read that times out fails the handshake with
    /// a transport error.
    pub fn read_timeout(mut self, duration: Duration) -> Self {
        self.read_timeout = Some(duration);
        self
    }

    /// Set socket write timeout
    ///
    /// Default: None (block indefinitely)
    pub fn write_timeout(mut self, duration: Duration) -> Self {
        self.write_timeout = Some(duration);
        self
    }

    /// Add a connection attribute (`_client_name`, `program_name`, ...)
    ///
    /// Sent only if the server advertises `CLIENT_CONNECT_ATTRS`.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Build the configuration
    pub fn build(self) -> ConnectionConfig {
        ConnectionConfig {
            user: self.user,
            password: self.password,
            protocol: self.protocol,
            address: self.address,
            database: self.database,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            attributes: self.attributes,
        }
    }
}

impl fmt::Debug for ConnectionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.clone().build(), f)
    }
}

/// An authenticated MySQL connection
///
/// Only ever handed out in the `Ready` state: the greeting, authentication and
/// `SET NAMES utf8` have all been acknowledged by the server.
pub struct Connection<S = Transport> {
    stream: Option<PacketStream<S>>,
    state: ConnectionState,
    quit: Bytes,
    closed_stats: Stats,
    server_version: String,
    connection_id: u32,
    character_set: u8,
}

impl Connection<Transport> {
    /// Dial `address` over `protocol` and run the handshake
    ///
    /// `protocol` is one of `tcp`, `tcp4`, `tcp6` or `unix`. An empty `password` sends an
    /// empty auth response; an empty `database` selects none.
    pub fn open(
        username: &str,
        password: &str,
        protocol: &str,
        address: &str,
        database: &str,
    ) -> Result<Self> {
        let protocol: TransportProtocol = protocol.parse()?;
        let config = ConnectionConfig::builder(address, database, username)
            .protocol(protocol)
            .password(password)
            .build();
        Self::open_with_config(&config)
    }

    /// Dial and handshake using a full configuration
    pub fn open_with_config(config: &ConnectionConfig) -> Result<Self> {
        let span = handshake_span(config);
        let _enter = span.enter();
        let started = Instant::now();

        let codec = MySqlCodec::with_attributes(config.attributes.clone());
        let result = dial(config).and_then(|transport| {
            tracing::debug!(transport = transport.kind(), "transport connected");
            Self::establish(transport, &codec, config)
        });
        finish(result, started)
    }
}

impl<S: Socket> Connection<S> {
    /// Run the handshake over an already-open socket
    ///
    /// On failure the socket is shut down and dropped before the error is returned.
    pub fn handshake<C: Codec>(socket: S, codec: &C, config: &ConnectionConfig) -> Result<Self> {
        let span = handshake_span(config);
        let _enter = span.enter();
        let started = Instant::now();
        finish(Self::establish(socket, codec, config), started)
    }

    fn establish<C: Codec>(socket: S, codec: &C, config: &ConnectionConfig) -> Result<Self> {
        let mut conn = Connection {
            stream: Some(PacketStream::new(socket)),
            state: ConnectionState::Initial,
            quit: codec.build_quit(),
            closed_stats: Stats::default(),
            server_version: String::new(),
            connection_id: 0,
            character_set: 0,
        };

        match conn.run_handshake(codec, config) {
            Ok(()) => Ok(conn),
            Err(e) => {
                conn.abort();
                Err(e)
            }
        }
    }

    fn run_handshake<C: Codec>(&mut self, codec: &C, config: &ConnectionConfig) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;

        self.state.transition(ConnectionState::AwaitingGreeting)?;
        let greeting = codec.read_greeting(stream)?;
        tracing::debug!(
            server_version = %greeting.server_version,
            connection_id = greeting.connection_id,
            auth_plugin = %greeting.auth_plugin_name,
            "greeting received"
        );

        self.state.transition(ConnectionState::SendingAuthResponse)?;
        let response = codec.build_auth_response(
            greeting.capability_flags,
            greeting.character_set,
            &config.user,
            config.password.as_deref().unwrap_or(""),
            &greeting.auth_plugin_data,
            &config.database,
            &greeting.auth_plugin_name,
        );
        stream.write_packet(&response)?;

        self.state.transition(ConnectionState::AwaitingAuthAck)?;
        let ack = codec.read_next_packet(stream)?;
        check_acknowledgement(codec, &ack.payload)?;
        tracing::debug!("authentication acknowledged");

        self.state.transition(ConnectionState::NegotiatingCharset)?;
        stream.reset_sequence();
        stream.write_packet(&codec.build_text_query(SET_NAMES_UTF8))?;
        let ack = codec.read_next_packet(stream)?;
        check_acknowledgement(codec, &ack.payload)?;
        tracing::debug!(charset = "utf8", "character set negotiated");

        self.server_version = greeting.server_version;
        self.connection_id = greeting.connection_id;
        self.character_set = greeting.character_set;
        self.state.transition(ConnectionState::Ready)?;
        Ok(())
    }

    /// Tear down after a failed handshake
    fn abort(&mut self) {
        self.state = ConnectionState::Closed;
        if let Some(stream) = self.stream.take() {
            self.closed_stats = Stats {
                syscalls: stream.syscalls(),
            };
            let mut socket = stream.into_inner();
            if let Err(e) = socket.shutdown() {
                tracing::debug!(error = %e, "socket shutdown after failed handshake");
            }
        }
    }

    /// Close the connection
    ///
    /// Sends `COM_QUIT` (best-effort), then shuts the socket down and releases it. Closing
    /// an already-closed connection returns [`Error::ConnectionClosed`].
    pub fn close(&mut self) -> Result<()> {
        let mut stream = self.stream.take().ok_or(Error::ConnectionClosed)?;
        self.state.transition(ConnectionState::Closed)?;

        stream.reset_sequence();
        if let Err(e) = stream.write_packet(&self.quit) {
            tracing::debug!(error = %e, "failed to send quit");
        }
        self.closed_stats = Stats {
            syscalls: stream.syscalls(),
        };

        let mut socket = stream.into_inner();
        match socket.shutdown() {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
            Err(e) => return Err(e.into()),
        }

        crate::metrics::counters::connection_closed();
        tracing::info!(syscalls = self.closed_stats.syscalls, "connection closed");
        Ok(())
    }
}

impl<S> Connection<S> {
    /// Get current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Cumulative I/O statistics since the stream was opened
    ///
    /// After [`close`](Self::close) this keeps returning the count captured at close.
    pub fn stats(&self) -> Stats {
        match &self.stream {
            Some(stream) => Stats {
                syscalls: stream.syscalls(),
            },
            None => self.closed_stats,
        }
    }

    /// Server version from the greeting
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// Connection (thread) id assigned by the server
    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    /// Character set id announced in the greeting
    pub fn character_set(&self) -> u8 {
        self.character_set
    }
}

impl<S> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("server_version", &self.server_version)
            .field("connection_id", &self.connection_id)
            .field("stats", &self.stats())
            .finish()
    }
}

fn handshake_span(config: &ConnectionConfig) -> tracing::Span {
    tracing::info_span!(
        "handshake",
        user = %config.user,
        database = %config.database,
        address = %config.address
    )
}

fn dial(config: &ConnectionConfig) -> Result<Transport> {
    let mut transport = Transport::dial(config.protocol, &config.address, config.connect_timeout)?;
    if let Err(e) = transport.set_timeouts(config.read_timeout, config.write_timeout) {
        if let Err(shutdown) = transport.shutdown() {
            tracing::debug!(error = %shutdown, "socket shutdown after failed timeout setup");
        }
        return Err(e);
    }
    Ok(transport)
}

fn finish<S>(result: Result<Connection<S>>, started: Instant) -> Result<Connection<S>> {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(conn) => {
            let syscalls = conn.stats().syscalls;
            crate::metrics::counters::handshake_succeeded();
            crate::metrics::histograms::handshake_duration(elapsed_ms);
            crate::metrics::histograms::handshake_syscalls(syscalls);
            tracing::info!(
                server_version = %conn.server_version,
                connection_id = conn.connection_id,
                syscalls,
                elapsed_ms,
                "connection ready"
            );
        }
        Err(e) => {
            crate::metrics::counters::handshake_failed(e.category());
            tracing::warn!(category = e.category(), error = %e, "handshake failed");
        }
    }
    result
}

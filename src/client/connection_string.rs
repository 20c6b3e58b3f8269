//! Connection string parsing
//!
//! Supports formats:
//! * mysql://[user[:password]@]host[:port][/database][?params]
//! * mysql:///database (Unix socket, default location)
//! * mysql://[user[:password]@]/database?socket=/path/to/mysqld.sock (Unix socket, custom path)
//!
//! Query parameters: `socket`, `protocol` (`tcp`, `tcp4`, `tcp6`, `unix`),
//! `connect_timeout`, `read_timeout`, `write_timeout` (seconds, 0 for none).
//! User and password are percent-decoded.

use crate::connection::{ConnectionConfig, TransportProtocol};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default MySQL TCP port
pub const DEFAULT_PORT: u16 = 3306;

/// Parsed connection info
#[derive(Clone)]
pub struct ConnectionInfo {
    /// Transport protocol
    pub protocol: TransportProtocol,
    /// Host (for TCP)
    pub host: Option<String>,
    /// Port (for TCP)
    pub port: Option<u16>,
    /// Unix socket path
    pub unix_socket: Option<PathBuf>,
    /// Database name; empty for none
    pub database: String,
    /// Username
    pub user: String,
    /// Password
    pub password: Option<String>,
    /// Connect timeout
    pub connect_timeout: Option<Duration>,
    /// Read timeout
    pub read_timeout: Option<Duration>,
    /// Write timeout
    pub write_timeout: Option<Duration>,
}

impl std::fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("unix_socket", &self.unix_socket)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

/// Resolve the default server socket
fn resolve_default_socket() -> Option<PathBuf> {
    // Debian/Ubuntu, then Fedora/Arch, then the compiled-in default
    for path in &[
        "/var/run/mysqld/mysqld.sock",
        "/run/mysqld/mysqld.sock",
        "/tmp/mysql.sock",
    ] {
        if Path::new(path).exists() {
            return Some(PathBuf::from(path));
        }
    }
    None
}

/// Extract a query parameter value from a query string
fn parse_query_param(query_string: &str, param: &str) -> Option<String> {
    let query = query_string.trim_start_matches('?');
    if query.is_empty() {
        return None;
    }

    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == param {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Parse a timeout given in whole seconds; `0` disables it
fn parse_timeout(query_string: &str, param: &str) -> Result<Option<Duration>> {
    match parse_query_param(query_string, param) {
        None => Ok(None),
        Some(value) => {
            let secs: u64 = value
                .parse()
                .map_err(|_| Error::Config(format!("invalid {}: '{}'", param, value)))?;
            Ok((secs > 0).then_some(Duration::from_secs(secs)))
        }
    }
}

/// Split `host[:port]`, accepting bracketed IPv6 literals
fn split_host_port(host_port: &str) -> Result<(String, u16)> {
    let (host, port) = if let Some(inner) = host_port.strip_prefix('[') {
        let (host, after) = inner
            .split_once(']')
            .ok_or_else(|| Error::Config("unterminated '[' in host".into()))?;
        (host, after.strip_prefix(':'))
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    };

    let port = match port {
        Some(p) => p
            .parse()
            .map_err(|_| Error::Config(format!("invalid port: '{}'", p)))?,
        None => DEFAULT_PORT,
    };
    Ok((host.to_string(), port))
}

/// Percent-decode a userinfo component
fn decode_component(raw: &str) -> Result<String> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::Config(format!("invalid percent-encoding in '{}'", raw)))
}

impl ConnectionInfo {
    /// Parse connection string
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix("mysql://")
            .or_else(|| s.strip_prefix("mariadb://"))
            .ok_or_else(|| Error::Config("connection string must start with mysql://".into()))?;

        let (rest, query_string) = match rest.find('?') {
            Some(pos) => rest.split_at(pos),
            None => (rest, ""),
        };

        let (authority, database) = match rest.split_once('/') {
            Some((authority, db)) => (authority, db.to_string()),
            None => (rest, String::new()),
        };

        // '@' is only a separator inside the authority; the password may itself contain one
        let (auth, host_port) = match authority.rfind('@') {
            Some(pos) => (Some(&authority[..pos]), &authority[pos + 1..]),
            None => (None, authority),
        };

        let (user, password) = match auth {
            Some(auth) => match auth.split_once(':') {
                Some((user, pass)) => (decode_component(user)?, Some(decode_component(pass)?)),
                None => (decode_component(auth)?, None),
            },
            None => (whoami::username(), None),
        };
        let user = if user.is_empty() {
            whoami::username()
        } else {
            user
        };

        let protocol = match parse_query_param(query_string, "protocol") {
            Some(p) => p.parse()?,
            None if host_port.is_empty() => TransportProtocol::Unix,
            None if parse_query_param(query_string, "socket").is_some() => {
                TransportProtocol::Unix
            }
            None => TransportProtocol::Tcp,
        };

        let (host, port, unix_socket) = if protocol == TransportProtocol::Unix {
            let socket = match parse_query_param(query_string, "socket") {
                Some(path) => PathBuf::from(path),
                None => resolve_default_socket().ok_or_else(|| {
                    Error::Config(
                        "could not locate the MySQL Unix socket. Set the socket query parameter explicitly."
                            .into(),
                    )
                })?,
            };
            (None, None, Some(socket))
        } else {
            if host_port.is_empty() {
                return Err(Error::Config(format!(
                    "protocol={} requires a host",
                    protocol
                )));
            }
            let (host, port) = split_host_port(host_port)?;
            (Some(host), Some(port), None)
        };

        Ok(Self {
            protocol,
            host,
            port,
            unix_socket,
            database,
            user,
            password,
            connect_timeout: parse_timeout(query_string, "connect_timeout")?,
            read_timeout: parse_timeout(query_string, "read_timeout")?,
            write_timeout: parse_timeout(query_string, "write_timeout")?,
        })
    }

    /// Dial address: `host:port` for TCP, the socket path for Unix sockets
    pub fn address(&self) -> String {
        if let Some(ref path) = self.unix_socket {
            return path.display().to_string();
        }
        let host = self.host.as_deref().unwrap_or("localhost");
        let port = self.port.unwrap_or(DEFAULT_PORT);
        if host.contains(':') {
            format!("[{}]:{}", host, port)
        } else {
            format!("{}:{}", host, port)
        }
    }

    /// Convert to ConnectionConfig
    pub fn to_config(&self) -> ConnectionConfig {
        let mut builder = ConnectionConfig::builder(self.address(), &self.database, &self.user)
            .protocol(self.protocol);
        if let Some(ref password) = self.password {
            builder = builder.password(password);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.read_timeout {
            builder = builder.read_timeout(timeout);
        }
        if let Some(timeout) = self.write_timeout {
            builder = builder.write_timeout(timeout);
        }
        builder.build()
    }
}

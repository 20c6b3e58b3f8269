//! Transport abstraction (TCP vs Unix socket)

use crate::{Error, Result};
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// A blocking byte stream the connection can shut down
pub trait Socket: Read + Write {
    /// Shut down both directions of the stream
    fn shutdown(&mut self) -> io::Result<()>;
}

impl Socket for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

#[cfg(unix)]
impl Socket for UnixStream {
    fn shutdown(&mut self) -> io::Result<()> {
        UnixStream::shutdown(self, Shutdown::Both)
    }
}

/// Transport protocol name accepted by [`Connection::open`](crate::Connection::open)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportProtocol {
    /// TCP, any address family
    #[default]
    Tcp,
    /// TCP over IPv4 only
    Tcp4,
    /// TCP over IPv6 only
    Tcp6,
    /// Unix domain socket; the address is a filesystem path
    Unix,
}

impl TransportProtocol {
    /// Protocol name as accepted by `FromStr`
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportProtocol::Tcp => "tcp",
            TransportProtocol::Tcp4 => "tcp4",
            TransportProtocol::Tcp6 => "tcp6",
            TransportProtocol::Unix => "unix",
        }
    }

    fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            TransportProtocol::Tcp4 => addr.is_ipv4(),
            TransportProtocol::Tcp6 => addr.is_ipv6(),
            _ => true,
        }
    }
}

impl FromStr for TransportProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(TransportProtocol::Tcp),
            "tcp4" => Ok(TransportProtocol::Tcp4),
            "tcp6" => Ok(TransportProtocol::Tcp6),
            "unix" => Ok(TransportProtocol::Unix),
            _ => Err(Error::Config(format!(
                "unknown transport protocol '{}' (expected tcp, tcp4, tcp6 or unix)",
                s
            ))),
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport layer abstraction
#[derive(Debug)]
pub enum Transport {
    /// TCP socket
    Tcp(TcpStream),
    /// Unix domain socket
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Transport {
    /// Dial `address` over `protocol`
    ///
    /// `timeout` bounds each TCP connect attempt; it is ignored for Unix sockets.
    pub fn dial(
        protocol: TransportProtocol,
        address: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        match protocol {
            TransportProtocol::Unix => Self::connect_unix(Path::new(address)),
            _ => Self::connect_tcp(protocol, address, timeout),
        }
    }

    /// Connect via TCP, trying each resolved address the protocol allows in turn
    pub fn connect_tcp(
        protocol: TransportProtocol,
        address: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut last_err = None;
        for addr in address.to_socket_addrs()?.filter(|a| protocol.accepts(a)) {
            let attempt = match timeout {
                Some(t) => TcpStream::connect_timeout(&addr, t),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(Transport::Tcp(stream));
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("no {} address found for {}", protocol, address),
                )
            })
            .into())
    }

    /// Connect via Unix socket
    #[cfg(unix)]
    pub fn connect_unix(path: &Path) -> Result<Self> {
        Ok(Transport::Unix(UnixStream::connect(path)?))
    }

    /// Connect via Unix socket
    #[cfg(not(unix))]
    pub fn connect_unix(path: &Path) -> Result<Self> {
        Err(Error::Config(format!(
            "unix sockets are not supported on this platform ({})",
            path.display()
        )))
    }

    /// Apply read/write timeouts; `None` blocks indefinitely
    pub fn set_timeouts(&self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        match self {
            Transport::Tcp(stream) => {
                stream.set_read_timeout(read)?;
                stream.set_write_timeout(write)?;
            }
            #[cfg(unix)]
            Transport::Unix(stream) => {
                stream.set_read_timeout(read)?;
                stream.set_write_timeout(write)?;
            }
        }
        Ok(())
    }

    /// Transport kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Transport::Tcp(_) => "tcp",
            #[cfg(unix)]
            Transport::Unix(_) => "unix",
        }
    }
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Transport::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Transport::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Transport::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Transport::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Transport::Unix(stream) => stream.flush(),
        }
    }
}

impl Socket for Transport {
    fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Transport::Tcp(stream) => Socket::shutdown(stream),
            #[cfg(unix)]
            Transport::Unix(stream) => Socket::shutdown(stream),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("tcp".parse::<TransportProtocol>().unwrap(), TransportProtocol::Tcp);
        assert_eq!("TCP4".parse::<TransportProtocol>().unwrap(), TransportProtocol::Tcp4);
        assert_eq!("tcp6".parse::<TransportProtocol>().unwrap(), TransportProtocol::Tcp6);
        assert_eq!("unix".parse::<TransportProtocol>().unwrap(), TransportProtocol::Unix);
        assert!(matches!(
            "udp".parse::<TransportProtocol>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_protocol_display_round_trips() {
        for p in [
            TransportProtocol::Tcp,
            TransportProtocol::Tcp4,
            TransportProtocol::Tcp6,
            TransportProtocol::Unix,
        ] {
            assert_eq!(p.to_string().parse::<TransportProtocol>().unwrap(), p);
        }
    }

    #[test]
    fn test_tcp_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = Transport::dial(TransportProtocol::Tcp, &addr.to_string(), None);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_tcp6_rejects_ipv4_literal() {
        let err = Transport::dial(TransportProtocol::Tcp6, "127.0.0.1:3306", None).unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::AddrNotAvailable),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_tcp_connect_and_timeouts() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let transport = Transport::dial(
            TransportProtocol::Tcp4,
            &addr,
            Some(Duration::from_secs(5)),
        )
        .unwrap();
        assert_eq!(transport.kind(), "tcp");
        transport
            .set_timeouts(Some(Duration::from_secs(1)), Some(Duration::from_secs(1)))
            .unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_connect_missing_path() {
        let result = Transport::dial(
            TransportProtocol::Unix,
            "/nonexistent/mysql-wire-test.sock",
            None,
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }
}

//! In-memory server fixtures for unit tests

use crate::connection::Socket;
use crate::protocol::constants::{capabilities, charsets, markers, PROTOCOL_VERSION};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

/// Nonce sent in every fixture greeting
pub const NONCE: [u8; 20] = [
    0x3a, 0x23, 0x5c, 0x7d, 0x11, 0x65, 0x2f, 0x4b, 0x59, 0x70, 0x06, 0x3e, 0x68, 0x21, 0x57,
    0x0f, 0x2e, 0x48, 0x74, 0x13,
];

/// Capabilities advertised by the fixture server
pub const SERVER_CAPABILITIES: u32 = capabilities::CLIENT_DEFAULT
    | capabilities::CLIENT_CONNECT_WITH_DB
    | capabilities::CLIENT_FOUND_ROWS
    | capabilities::CLIENT_DEPRECATE_EOF;

/// Handshake v10 payload for server "8.0.36", connection id 42
pub fn greeting_payload(flags: u32, plugin: &str) -> Vec<u8> {
    let mut out = vec![PROTOCOL_VERSION];
    out.extend_from_slice(b"8.0.36\0");
    out.extend_from_slice(&42u32.to_le_bytes());
    out.extend_from_slice(&NONCE[..8]);
    out.push(0);
    out.extend_from_slice(&(flags as u16).to_le_bytes());
    out.push(charsets::UTF8MB4_GENERAL_CI);
    out.extend_from_slice(&0x0002u16.to_le_bytes());
    out.extend_from_slice(&((flags >> 16) as u16).to_le_bytes());
    out.push(21);
    out.extend_from_slice(&[0; 10]);
    out.extend_from_slice(&NONCE[8..]);
    out.push(0);
    if !plugin.is_empty() {
        out.extend_from_slice(plugin.as_bytes());
        out.push(0);
    }
    out
}

/// OK packet: no affected rows, no insert id, autocommit
pub fn ok_payload() -> Vec<u8> {
    vec![markers::OK, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]
}

/// ERR packet with a SQL state
pub fn err_payload(code: u16, sql_state: &str, message: &str) -> Vec<u8> {
    let mut out = vec![markers::ERR];
    out.extend_from_slice(&code.to_le_bytes());
    out.push(markers::SQL_STATE);
    out.extend_from_slice(sql_state.as_bytes());
    out.extend_from_slice(message.as_bytes());
    out
}

/// Frame a payload as one packet
pub fn frame(sequence_id: u8, payload: &[u8]) -> Vec<u8> {
    let len = (payload.len() as u32).to_le_bytes();
    let mut out = Vec::with_capacity(payload.len() + 4);
    out.extend_from_slice(&len[..3]);
    out.push(sequence_id);
    out.extend_from_slice(payload);
    out
}

/// Server side of a well-behaved handshake, one chunk per read: greeting, auth OK,
/// `SET NAMES` OK
pub fn happy_script() -> Vec<Vec<u8>> {
    vec![
        frame(0, &greeting_payload(SERVER_CAPABILITIES, "mysql_native_password")),
        frame(2, &ok_payload()),
        frame(1, &ok_payload()),
    ]
}

/// What a [`ScriptedSocket`] observed, shared with the test after the socket moves
#[derive(Debug, Default)]
pub struct SocketLog {
    /// Bytes written by the client, in order
    pub written: Vec<u8>,
    /// Number of `shutdown` calls
    pub shutdowns: usize,
    /// Whether the socket has been dropped
    pub dropped: bool,
}

/// Socket that replays scripted server chunks and records client writes
///
/// Each `read` returns at most one chunk; an empty script reads as EOF.
#[derive(Debug)]
pub struct ScriptedSocket {
    reads: VecDeque<Vec<u8>>,
    pos: usize,
    max_write: usize,
    fail_writes: bool,
    log: Arc<Mutex<SocketLog>>,
}

impl ScriptedSocket {
    pub fn new(reads: Vec<Vec<u8>>) -> (Self, Arc<Mutex<SocketLog>>) {
        let log = Arc::new(Mutex::new(SocketLog::default()));
        let socket = Self {
            reads: reads.into(),
            pos: 0,
            max_write: usize::MAX,
            fail_writes: false,
            log: Arc::clone(&log),
        };
        (socket, log)
    }

    /// Accept at most `n` bytes per write call
    pub fn with_max_write(mut self, n: usize) -> Self {
        self.max_write = n;
        self
    }

    /// Fail every write with `BrokenPipe`
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl Read for ScriptedSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.reads.front() else {
            return Ok(0);
        };
        let rest = &chunk[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        if self.pos == chunk.len() {
            self.reads.pop_front();
            self.pos = 0;
        }
        Ok(n)
    }
}

impl Write for ScriptedSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted write failure"));
        }
        let n = buf.len().min(self.max_write);
        lock(&self.log).written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Socket for ScriptedSocket {
    fn shutdown(&mut self) -> io::Result<()> {
        lock(&self.log).shutdowns += 1;
        Ok(())
    }
}

impl Drop for ScriptedSocket {
    fn drop(&mut self) {
        lock(&self.log).dropped = true;
    }
}

fn lock(log: &Mutex<SocketLog>) -> std::sync::MutexGuard<'_, SocketLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Route `tracing` output through the test harness; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

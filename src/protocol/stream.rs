//! Packet framing over a blocking byte stream

use super::constants::{CLIENT_MAX_PACKET_SIZE, MAX_PAYLOAD_LEN};
use super::decode::split_frame;
use super::encode::encode_frames;
use super::message::{Packet, PacketHeader};
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use std::io::{self, Read, Write};

const READ_CHUNK: usize = 8192;

/// Framing layer around a raw stream
///
/// Wrapping does no I/O. The stream tracks the packet sequence id, keeps bytes read
/// past the current packet for the next call, and counts every `read`/`write` call
/// made on the inner stream.
#[derive(Debug)]
pub struct PacketStream<S> {
    inner: S,
    read_buf: BytesMut,
    sequence_id: u8,
    syscalls: u64,
}

impl<S> PacketStream<S> {
    /// Wrap a connected stream
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            sequence_id: 0,
            syscalls: 0,
        }
    }

    /// Number of read/write calls made on the inner stream so far
    pub fn syscalls(&self) -> u64 {
        self.syscalls
    }

    /// Sequence id expected on the next packet (read or written)
    pub fn sequence_id(&self) -> u8 {
        self.sequence_id
    }

    /// Start a new command: the next written packet carries sequence id 0
    pub fn reset_sequence(&mut self) {
        self.sequence_id = 0;
    }

    /// Unwrap the inner stream, discarding buffered bytes
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Read + Write> PacketStream<S> {
    /// Read the next logical packet, joining frames split at the payload limit
    ///
    /// A joined payload larger than the advertised max packet size is a protocol error.
    pub fn next_packet(&mut self) -> Result<Packet> {
        let (header, first) = self.next_frame()?;
        if header.payload_len < MAX_PAYLOAD_LEN {
            return Ok(Packet {
                sequence_id: header.sequence_id,
                payload: first,
            });
        }

        let mut payload = BytesMut::from(&first[..]);
        loop {
            let (next, chunk) = self.next_frame()?;
            if payload.len() + chunk.len() > CLIENT_MAX_PACKET_SIZE as usize {
                return Err(Error::Protocol(format!(
                    "packet exceeds max packet size of {} bytes",
                    CLIENT_MAX_PACKET_SIZE
                )));
            }
            payload.extend_from_slice(&chunk);
            if next.payload_len < MAX_PAYLOAD_LEN {
                break;
            }
        }

        Ok(Packet {
            sequence_id: header.sequence_id,
            payload: payload.freeze(),
        })
    }

    /// Write one logical packet and flush
    pub fn write_packet(&mut self, payload: &[u8]) -> Result<()> {
        let (frames, next) = encode_frames(payload, self.sequence_id);
        self.sequence_id = next;
        self.write_all(&frames)?;
        self.inner.flush()?;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<(PacketHeader, Bytes)> {
        loop {
            if let Some((header, payload)) = split_frame(&mut self.read_buf) {
                if header.sequence_id != self.sequence_id {
                    return Err(Error::Protocol(format!(
                        "packet out of order: expected sequence id {}, got {}",
                        self.sequence_id, header.sequence_id
                    )));
                }
                self.sequence_id = header.sequence_id.wrapping_add(1);
                return Ok((header, payload));
            }

            if self.fill_buf()? == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }

    fn fill_buf(&mut self) -> Result<usize> {
        let start = self.read_buf.len();
        self.read_buf.resize(start + READ_CHUNK, 0);
        loop {
            self.syscalls += 1;
            match self.inner.read(&mut self.read_buf[start..]) {
                Ok(n) => {
                    self.read_buf.truncate(start + n);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.read_buf.truncate(start);
                    return Err(e.into());
                }
            }
        }
    }

    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            self.syscalls += 1;
            match self.inner.write(buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write whole packet",
                    )
                    .into())
                }
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

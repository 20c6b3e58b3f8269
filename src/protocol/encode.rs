//! Protocol message encoding

use super::constants::{
    capabilities, commands, CLIENT_MAX_PACKET_SIZE, HEADER_LEN, MAX_PAYLOAD_LEN,
    RESPONSE_RESERVED_LEN,
};
use crate::auth::scramble_for_plugin;
use bytes::{BufMut, Bytes, BytesMut};

/// Fields of a HandshakeResponse41 payload
#[derive(Debug, Clone, Copy)]
pub struct HandshakeResponse<'a> {
    /// Capability flags advertised by the server
    pub server_flags: u32,
    /// Character set id to request
    pub character_set: u8,
    /// Username
    pub username: &'a str,
    /// Password, raw; scrambled here according to `auth_plugin_name`
    pub password: &'a str,
    /// Nonce from the greeting
    pub auth_plugin_data: &'a [u8],
    /// Initial database; empty for none
    pub database: &'a str,
    /// Auth plugin named in the greeting
    pub auth_plugin_name: &'a str,
    /// Connection attributes
    pub attributes: &'a [(String, String)],
}

impl HandshakeResponse<'_> {
    /// Client flags sent back: the client's defaults the server also supports,
    /// plus database and attribute flags when they are used
    pub fn client_flags(&self) -> u32 {
        let mut flags = capabilities::CLIENT_DEFAULT & self.server_flags;
        if !self.database.is_empty() {
            flags |= capabilities::CLIENT_CONNECT_WITH_DB & self.server_flags;
        }
        if !self.attributes.is_empty() {
            flags |= capabilities::CLIENT_CONNECT_ATTRS & self.server_flags;
        }
        flags
    }
}

/// Encode a HandshakeResponse41 payload
pub fn encode_handshake_response(resp: &HandshakeResponse<'_>) -> Bytes {
    let flags = resp.client_flags();
    let auth = scramble_for_plugin(resp.auth_plugin_name, resp.password, resp.auth_plugin_data);

    let mut buf = BytesMut::with_capacity(128);
    buf.put_u32_le(flags);
    buf.put_u32_le(CLIENT_MAX_PACKET_SIZE);
    buf.put_u8(resp.character_set);
    buf.put_bytes(0, RESPONSE_RESERVED_LEN);

    put_cstr(&mut buf, resp.username);

    if flags & capabilities::CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA != 0 {
        put_lenenc_bytes(&mut buf, &auth);
    } else if flags & capabilities::CLIENT_SECURE_CONNECTION != 0 {
        // 1-byte length prefix
        let len = auth.len().min(u8::MAX as usize);
        buf.put_u8(len as u8);
        buf.put_slice(&auth[..len]);
    } else {
        buf.put_slice(&auth);
        buf.put_u8(0);
    }

    if flags & capabilities::CLIENT_CONNECT_WITH_DB != 0 {
        put_cstr(&mut buf, resp.database);
    }

    if flags & capabilities::CLIENT_PLUGIN_AUTH != 0 {
        put_cstr(&mut buf, resp.auth_plugin_name);
    }

    if flags & capabilities::CLIENT_CONNECT_ATTRS != 0 {
        let mut attrs = BytesMut::new();
        for (key, value) in resp.attributes {
            put_lenenc_bytes(&mut attrs, key.as_bytes());
            put_lenenc_bytes(&mut attrs, value.as_bytes());
        }
        put_lenenc_bytes(&mut buf, &attrs);
    }

    buf.freeze()
}

/// Encode a `COM_QUERY` payload
pub fn encode_query(text: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + text.len());
    buf.put_u8(commands::COM_QUERY);
    buf.put_slice(text.as_bytes());
    buf.freeze()
}

/// Encode a `COM_QUIT` payload
pub fn encode_quit() -> Bytes {
    Bytes::from_static(&[commands::COM_QUIT])
}

/// Frame a payload into one or more packets starting at `sequence_id`
///
/// Payloads of [`MAX_PAYLOAD_LEN`] bytes or more are split; a payload that is an
/// exact multiple of the limit ends with an empty packet. Returns the frames and
/// the sequence id that follows them.
pub fn encode_frames(payload: &[u8], sequence_id: u8) -> (BytesMut, u8) {
    let frames = payload.len() / MAX_PAYLOAD_LEN + 1;
    let mut buf = BytesMut::with_capacity(payload.len() + frames * HEADER_LEN);
    let mut seq = sequence_id;

    let mut chunks = payload.chunks(MAX_PAYLOAD_LEN);
    loop {
        let chunk = chunks.next().unwrap_or(&[]);
        put_header(&mut buf, chunk.len(), seq);
        buf.put_slice(chunk);
        seq = seq.wrapping_add(1);
        if chunk.len() < MAX_PAYLOAD_LEN {
            break;
        }
    }

    (buf, seq)
}

fn put_header(buf: &mut BytesMut, len: usize, sequence_id: u8) {
    let len = (len as u32).to_le_bytes();
    buf.put_slice(&len[..3]);
    buf.put_u8(sequence_id);
}

fn put_cstr(buf: &mut BytesMut, value: &str) {
    buf.put_slice(value.as_bytes());
    buf.put_u8(0);
}

/// Length-encoded integer
pub fn put_lenenc_int(buf: &mut BytesMut, value: u64) {
    match value {
        0..=250 => buf.put_u8(value as u8),
        251..=0xFFFF => {
            buf.put_u8(0xFC);
            buf.put_u16_le(value as u16);
        }
        0x1_0000..=0xFF_FFFF => {
            buf.put_u8(0xFD);
            buf.put_slice(&(value as u32).to_le_bytes()[..3]);
        }
        _ => {
            buf.put_u8(0xFE);
            buf.put_u64_le(value);
        }
    }
}

fn put_lenenc_bytes(buf: &mut BytesMut, data: &[u8]) {
    put_lenenc_int(buf, data.len() as u64);
    buf.put_slice(data);
}

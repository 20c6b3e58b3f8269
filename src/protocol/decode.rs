//! Protocol message decoding

use super::constants::{auth_plugins, capabilities, markers, HEADER_LEN, PROTOCOL_VERSION};
use super::message::{Greeting, PacketHeader, ServerError};
use crate::{Error, Result};
use bytes::{Buf, Bytes, BytesMut};

/// Decode a packet header
///
/// Returns `None` if fewer than [`HEADER_LEN`] bytes are available.
pub fn decode_header(data: &[u8]) -> Option<PacketHeader> {
    if data.len() < HEADER_LEN {
        return None;
    }
    let payload_len = u32::from_le_bytes([data[0], data[1], data[2], 0]) as usize;
    Some(PacketHeader {
        payload_len,
        sequence_id: data[3],
    })
}

/// Split one complete frame off the front of `data`
///
/// Returns `None` and leaves `data` untouched when the frame is incomplete; the
/// caller reads more bytes and tries again.
pub fn split_frame(data: &mut BytesMut) -> Option<(PacketHeader, Bytes)> {
    let header = decode_header(data)?;
    if data.len() < HEADER_LEN + header.payload_len {
        return None;
    }
    data.advance(HEADER_LEN);
    let payload = data.split_to(header.payload_len).freeze();
    Some((header, payload))
}

/// Parse a Handshake v10 greeting payload
///
/// A server that refuses the connection outright (too many connections, blocked
/// host) sends an ERR packet instead; that is returned as [`Error::Server`].
pub fn parse_greeting(payload: &[u8]) -> Result<Greeting> {
    if payload.first() == Some(&markers::ERR) {
        return Err(Error::Server(parse_error_packet(payload)?));
    }

    let mut buf = payload;

    let protocol_version = take_u8(&mut buf, "protocol version")?;
    if protocol_version != PROTOCOL_VERSION {
        return Err(Error::Protocol(format!(
            "unsupported handshake protocol version {} (expected {})",
            protocol_version, PROTOCOL_VERSION
        )));
    }

    let server_version = take_cstr(&mut buf, "server version")?;
    let connection_id = take_u32_le(&mut buf, "connection id")?;
    let auth_data_1 = take_bytes(&mut buf, 8, "auth plugin data part 1")?;
    take_bytes(&mut buf, 1, "filler")?;
    let caps_lower = take_u16_le(&mut buf, "capability flags (lower)")?;
    let character_set = take_u8(&mut buf, "character set")?;
    let status_flags = take_u16_le(&mut buf, "status flags")?;
    let caps_upper = take_u16_le(&mut buf, "capability flags (upper)")?;
    let capability_flags = u32::from(caps_lower) | (u32::from(caps_upper) << 16);

    if capability_flags & capabilities::CLIENT_PROTOCOL_41 == 0 {
        return Err(Error::Protocol(
            "server does not support the 4.1 protocol".into(),
        ));
    }

    let auth_data_len = take_u8(&mut buf, "auth plugin data length")? as usize;
    take_bytes(&mut buf, 10, "reserved")?;

    let mut auth_plugin_data = BytesMut::with_capacity(21);
    auth_plugin_data.extend_from_slice(auth_data_1);
    if capability_flags & capabilities::CLIENT_SECURE_CONNECTION != 0 {
        let len = auth_data_len.saturating_sub(8).max(13);
        let part2 = take_bytes(&mut buf, len, "auth plugin data part 2")?;
        let part2 = part2.strip_suffix(&[0]).unwrap_or(part2);
        auth_plugin_data.extend_from_slice(part2);
    }

    let auth_plugin_name = if capability_flags & capabilities::CLIENT_PLUGIN_AUTH != 0 {
        // Some 5.5 servers omit the terminating NUL
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        String::from_utf8_lossy(&buf[..end]).into_owned()
    } else {
        auth_plugins::MYSQL_NATIVE_PASSWORD.to_string()
    };

    Ok(Greeting {
        protocol_version,
        server_version,
        connection_id,
        capability_flags,
        character_set,
        status_flags,
        auth_plugin_data: auth_plugin_data.freeze(),
        auth_plugin_name,
    })
}

/// Parse an ERR packet payload (marker byte included)
pub fn parse_error_packet(payload: &[u8]) -> Result<ServerError> {
    let mut buf = payload;

    let marker = take_u8(&mut buf, "ERR marker")?;
    if marker != markers::ERR {
        return Err(Error::Protocol(format!(
            "expected ERR packet, got marker 0x{:02X}",
            marker
        )));
    }

    let code = take_u16_le(&mut buf, "error code")?;

    let sql_state = if buf.first() == Some(&markers::SQL_STATE) {
        buf.advance(1);
        let state = take_bytes(&mut buf, 5, "SQL state")?;
        Some(String::from_utf8_lossy(state).into_owned())
    } else {
        None
    };

    let message = String::from_utf8_lossy(buf).into_owned();

    Ok(ServerError {
        code,
        sql_state,
        message,
    })
}

fn truncated(field: &str) -> Error {
    Error::Protocol(format!("truncated packet: missing {}", field))
}

fn take_u8(buf: &mut &[u8], field: &str) -> Result<u8> {
    if buf.remaining() < 1 {
        return Err(truncated(field));
    }
    Ok(buf.get_u8())
}

fn take_u16_le(buf: &mut &[u8], field: &str) -> Result<u16> {
    if buf.remaining() < 2 {
        return Err(truncated(field));
    }
    Ok(buf.get_u16_le())
}

fn take_u32_le(buf: &mut &[u8], field: &str) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(truncated(field));
    }
    Ok(buf.get_u32_le())
}

fn take_bytes<'a>(buf: &mut &'a [u8], len: usize, field: &str) -> Result<&'a [u8]> {
    let slice: &'a [u8] = *buf;
    if slice.len() < len {
        return Err(truncated(field));
    }
    let (head, tail) = slice.split_at(len);
    *buf = tail;
    Ok(head)
}

fn take_cstr(buf: &mut &[u8], field: &str) -> Result<String> {
    let slice = *buf;
    let end = slice.iter().position(|&b| b == 0).ok_or_else(|| {
        Error::Protocol(format!("missing null terminator in {}", field))
    })?;
    let value = String::from_utf8_lossy(&slice[..end]).into_owned();
    *buf = &slice[end + 1..];
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::charsets;
    use crate::testing::{greeting_payload, SERVER_CAPABILITIES, NONCE};

    #[test]
    fn test_decode_header() {
        let header = decode_header(&[0x2c, 0x01, 0x00, 0x07]).unwrap();
        assert_eq!(header.payload_len, 300);
        assert_eq!(header.sequence_id, 7);
        assert!(decode_header(&[0x01, 0x00, 0x00]).is_none());
    }

    #[test]
    fn test_split_frame_waits_for_full_payload() {
        let mut data = BytesMut::from(&[0x03, 0x00, 0x00, 0x01, 0x00, 0x00][..]);
        assert!(split_frame(&mut data).is_none());
        assert_eq!(data.len(), 6);

        data.extend_from_slice(&[0x00, 0xAA]);
        let (header, payload) = split_frame(&mut data).unwrap();
        assert_eq!(header.sequence_id, 1);
        assert_eq!(&payload[..], &[0x00, 0x00, 0x00]);
        assert_eq!(&data[..], &[0xAA]);
    }

    #[test]
    fn test_parse_greeting() {
        let payload = greeting_payload(SERVER_CAPABILITIES, "mysql_native_password");
        let greeting = parse_greeting(&payload).unwrap();

        assert_eq!(greeting.protocol_version, 10);
        assert_eq!(greeting.server_version, "8.0.36");
        assert_eq!(greeting.connection_id, 42);
        assert_eq!(greeting.capability_flags, SERVER_CAPABILITIES);
        assert_eq!(greeting.character_set, charsets::UTF8MB4_GENERAL_CI);
        assert_eq!(greeting.status_flags, 0x0002);
        assert_eq!(&greeting.auth_plugin_data[..], &NONCE[..]);
        assert_eq!(greeting.auth_plugin_name, "mysql_native_password");
    }

    #[test]
    fn test_parse_greeting_without_plugin_auth_defaults_to_native() {
        let flags = SERVER_CAPABILITIES & !capabilities::CLIENT_PLUGIN_AUTH;
        let payload = greeting_payload(flags, "");
        let greeting = parse_greeting(&payload).unwrap();
        assert_eq!(greeting.auth_plugin_name, "mysql_native_password");
        assert_eq!(greeting.auth_plugin_data.len(), 20);
    }

    #[test]
    fn test_parse_greeting_plugin_name_without_terminator() {
        let mut payload = greeting_payload(SERVER_CAPABILITIES, "caching_sha2_password");
        assert_eq!(payload.pop(), Some(0));
        let greeting = parse_greeting(&payload).unwrap();
        assert_eq!(greeting.auth_plugin_name, "caching_sha2_password");
    }

    #[test]
    fn test_parse_greeting_rejects_protocol_version() {
        let mut payload = greeting_payload(SERVER_CAPABILITIES, "mysql_native_password");
        payload[0] = 9;
        let err = parse_greeting(&payload).unwrap_err();
        assert!(matches!(err, Error::Protocol(ref msg) if msg.contains("version 9")));
    }

    #[test]
    fn test_parse_greeting_rejects_pre_41_server() {
        let flags = SERVER_CAPABILITIES & !capabilities::CLIENT_PROTOCOL_41;
        let payload = greeting_payload(flags, "mysql_native_password");
        assert!(matches!(parse_greeting(&payload), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_parse_greeting_truncated() {
        let payload = greeting_payload(SERVER_CAPABILITIES, "mysql_native_password");
        for len in [0, 1, 5, 12, 20, 30, 40] {
            let err = parse_greeting(&payload[..len]).unwrap_err();
            assert!(
                matches!(err, Error::Protocol(_)),
                "len {} should fail with a protocol error",
                len
            );
        }
    }

    #[test]
    fn test_parse_greeting_err_packet() {
        let mut payload = vec![0xFF, 0x10, 0x04];
        payload.extend_from_slice(b"Too many connections");
        match parse_greeting(&payload) {
            Err(Error::Server(err)) => {
                assert_eq!(err.code, 1040);
                assert_eq!(err.sql_state, None);
                assert_eq!(err.message, "Too many connections");
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_packet_with_sql_state() {
        let mut payload = vec![0xFF, 0x15, 0x04, b'#'];
        payload.extend_from_slice(b"28000");
        payload.extend_from_slice(b"Access denied for user 'app'@'%' (using password: YES)");

        let err = parse_error_packet(&payload).unwrap();
        assert_eq!(err.code, 1045);
        assert_eq!(err.sql_state.as_deref(), Some("28000"));
        assert_eq!(
            err.message,
            "Access denied for user 'app'@'%' (using password: YES)"
        );
    }

    #[test]
    fn test_parse_error_packet_malformed() {
        assert!(matches!(parse_error_packet(&[]), Err(Error::Protocol(_))));
        assert!(matches!(parse_error_packet(&[0xFF, 0x15]), Err(Error::Protocol(_))));
        assert!(matches!(
            parse_error_packet(&[0xFF, 0x15, 0x04, b'#', b'2', b'8']),
            Err(Error::Protocol(_))
        ));
        assert!(matches!(
            parse_error_packet(&[0x00, 0x15, 0x04]),
            Err(Error::Protocol(_))
        ));
    }
}

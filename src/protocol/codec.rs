//! Codec boundary between the connection and the wire format

use super::constants::{auth_plugins, markers};
use super::decode::{parse_error_packet, parse_greeting};
use super::encode::{encode_handshake_response, encode_query, encode_quit, HandshakeResponse};
use super::message::{Greeting, Packet, ServerError};
use super::stream::PacketStream;
use crate::Result;
use bytes::Bytes;
use std::io::{Read, Write};

/// Protocol codec used by [`Connection`](crate::Connection)
///
/// The connection drives the handshake sequence; everything that knows the byte layout of a
/// message lives behind this trait. Implementations receive raw credentials and do their own
/// hashing.
pub trait Codec {
    /// First payload byte of an OK acknowledgement
    const OK: u8;

    /// First payload byte of an ERR acknowledgement
    const ERR: u8;

    /// Read and parse the server greeting
    fn read_greeting<S: Read + Write>(&self, stream: &mut PacketStream<S>) -> Result<Greeting>;

    /// Build the authentication response payload
    #[allow(clippy::too_many_arguments)]
    fn build_auth_response(
        &self,
        flags: u32,
        charset: u8,
        username: &str,
        password: &str,
        auth_data: &[u8],
        database: &str,
        auth_plugin_name: &str,
    ) -> Bytes;

    /// Build a text command payload
    fn build_text_query(&self, text: &str) -> Bytes;

    /// Read the next packet
    fn read_next_packet<S: Read + Write>(&self, stream: &mut PacketStream<S>) -> Result<Packet>;

    /// Decode an ERR payload
    fn parse_error_packet(&self, payload: &[u8]) -> Result<ServerError>;

    /// Build the payload sent when closing the connection
    fn build_quit(&self) -> Bytes {
        encode_quit()
    }
}

/// The MySQL client/server protocol, 4.1 flavour
#[derive(Debug, Clone, Default)]
pub struct MySqlCodec {
    attributes: Vec<(String, String)>,
}

impl MySqlCodec {
    /// Codec that sends no connection attributes
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec that sends the given connection attributes when the server accepts them
    pub fn with_attributes(attributes: Vec<(String, String)>) -> Self {
        Self { attributes }
    }

    /// Connection attributes sent in the auth response
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}

impl Codec for MySqlCodec {
    const OK: u8 = markers::OK;
    const ERR: u8 = markers::ERR;

    fn read_greeting<S: Read + Write>(&self, stream: &mut PacketStream<S>) -> Result<Greeting> {
        let packet = stream.next_packet()?;
        parse_greeting(&packet.payload)
    }

    fn build_auth_response(
        &self,
        flags: u32,
        charset: u8,
        username: &str,
        password: &str,
        auth_data: &[u8],
        database: &str,
        auth_plugin_name: &str,
    ) -> Bytes {
        let plugin = if auth_plugin_name.is_empty() {
            auth_plugins::MYSQL_NATIVE_PASSWORD
        } else {
            auth_plugin_name
        };
        encode_handshake_response(&HandshakeResponse {
            server_flags: flags,
            character_set: charset,
            username,
            password,
            auth_plugin_data: auth_data,
            database,
            auth_plugin_name: plugin,
            attributes: &self.attributes,
        })
    }

    fn build_text_query(&self, text: &str) -> Bytes {
        encode_query(text)
    }

    fn read_next_packet<S: Read + Write>(&self, stream: &mut PacketStream<S>) -> Result<Packet> {
        stream.next_packet()
    }

    fn parse_error_packet(&self, payload: &[u8]) -> Result<ServerError> {
        parse_error_packet(payload)
    }
}

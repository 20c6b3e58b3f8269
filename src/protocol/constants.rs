//! MySQL protocol constants

/// Handshake protocol version spoken by every server since 3.21
pub const PROTOCOL_VERSION: u8 = 10;

/// Packet header length (3-byte payload length + 1-byte sequence id)
pub const HEADER_LEN: usize = 4;

/// Largest payload a single packet can carry; longer payloads are split
pub const MAX_PAYLOAD_LEN: usize = 0x00FF_FFFF;

/// Max packet size advertised in the handshake response (16 MiB)
pub const CLIENT_MAX_PACKET_SIZE: u32 = 0x0100_0000;

/// Number of reserved zero bytes in HandshakeResponse41
pub const RESPONSE_RESERVED_LEN: usize = 23;

/// Text command sent once the connection is authenticated
pub const SET_NAMES_UTF8: &str = "SET NAMES utf8";

/// First payload byte of generic response packets
pub mod markers {
    /// OK packet
    pub const OK: u8 = 0x00;

    /// EOF packet / auth switch request
    pub const EOF: u8 = 0xFE;

    /// ERR packet
    pub const ERR: u8 = 0xFF;

    /// Marker preceding the SQL state in an ERR packet
    pub const SQL_STATE: u8 = b'#';
}

/// Capability flags
pub mod capabilities {
    /// New, more secure passwords
    pub const CLIENT_LONG_PASSWORD: u32 = 0x0000_0001;

    /// Found instead of affected rows
    pub const CLIENT_FOUND_ROWS: u32 = 0x0000_0002;

    /// Get all column flags
    pub const CLIENT_LONG_FLAG: u32 = 0x0000_0004;

    /// Database name can be specified on connect
    pub const CLIENT_CONNECT_WITH_DB: u32 = 0x0000_0008;

    /// 4.1 protocol
    pub const CLIENT_PROTOCOL_41: u32 = 0x0000_0200;

    /// Switch to SSL after handshake
    pub const CLIENT_SSL: u32 = 0x0000_0800;

    /// Transaction status flags in OK packets
    pub const CLIENT_TRANSACTIONS: u32 = 0x0000_2000;

    /// 4.1 authentication
    pub const CLIENT_SECURE_CONNECTION: u32 = 0x0000_8000;

    /// Multiple result sets
    pub const CLIENT_MULTI_RESULTS: u32 = 0x0002_0000;

    /// Pluggable authentication
    pub const CLIENT_PLUGIN_AUTH: u32 = 0x0008_0000;

    /// Connection attributes
    pub const CLIENT_CONNECT_ATTRS: u32 = 0x0010_0000;

    /// Length-encoded auth response
    pub const CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA: u32 = 0x0020_0000;

    /// OK packets replace EOF packets
    pub const CLIENT_DEPRECATE_EOF: u32 = 0x0100_0000;

    /// Flags the client asks for, intersected with what the server offers
    pub const CLIENT_DEFAULT: u32 = CLIENT_LONG_PASSWORD
        | CLIENT_LONG_FLAG
        | CLIENT_PROTOCOL_41
        | CLIENT_TRANSACTIONS
        | CLIENT_SECURE_CONNECTION
        | CLIENT_MULTI_RESULTS
        | CLIENT_PLUGIN_AUTH
        | CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA;
}

/// Command bytes
pub mod commands {
    /// Close the connection
    pub const COM_QUIT: u8 = 0x01;

    /// Text query
    pub const COM_QUERY: u8 = 0x03;
}

/// Character set / collation ids
pub mod charsets {
    /// utf8_general_ci
    pub const UTF8_GENERAL_CI: u8 = 33;

    /// utf8mb4_general_ci
    pub const UTF8MB4_GENERAL_CI: u8 = 45;

    /// binary
    pub const BINARY: u8 = 63;
}

/// Authentication plugin names
pub mod auth_plugins {
    /// SHA-1 based scramble (default before MySQL 8.0)
    pub const MYSQL_NATIVE_PASSWORD: &str = "mysql_native_password";

    /// SHA-256 based scramble (default since MySQL 8.0)
    pub const CACHING_SHA2_PASSWORD: &str = "caching_sha2_password";

    /// Plaintext password
    pub const MYSQL_CLEAR_PASSWORD: &str = "mysql_clear_password";
}

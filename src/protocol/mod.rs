//! MySQL client/server protocol
//!
//! Only the connection phase is implemented: the Handshake v10 greeting,
//! HandshakeResponse41, OK/ERR acknowledgements, plus the `COM_QUERY` and `COM_QUIT`
//! commands the connection needs.

pub mod codec;
pub mod constants;
pub mod decode;
pub mod encode;
pub mod message;
pub mod stream;

pub use codec::{Codec, MySqlCodec};
pub use decode::{decode_header, parse_error_packet, parse_greeting, split_frame};
pub use encode::{encode_frames, encode_handshake_response, encode_query, encode_quit};
pub use message::{Acknowledgement, Greeting, Packet, PacketHeader, ServerError};
pub use stream::PacketStream;

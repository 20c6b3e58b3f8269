//! Acknowledgement interpretation shared by the auth and charset steps

use crate::protocol::{Acknowledgement, Codec};
use crate::{Error, Result};

/// Map an acknowledgement payload to success or an error
///
/// OK is success. ERR is decoded with the codec and returned as [`Error::Server`]; a
/// malformed ERR packet surfaces the codec's parse error instead. Anything else, an empty
/// payload included, is [`Error::UnrecognizedAcknowledgement`].
pub(crate) fn check_acknowledgement<C: Codec>(codec: &C, payload: &[u8]) -> Result<()> {
    match Acknowledgement::classify(payload, C::OK, C::ERR) {
        Acknowledgement::Ok => Ok(()),
        Acknowledgement::Err => Err(Error::Server(codec.parse_error_packet(payload)?)),
        Acknowledgement::Unrecognized => Err(Error::UnrecognizedAcknowledgement {
            payload: payload.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MySqlCodec;
    use crate::testing::{err_payload, ok_payload};

    #[test]
    fn test_ok_is_success() {
        assert!(check_acknowledgement(&MySqlCodec::new(), &ok_payload()).is_ok());
    }

    #[test]
    fn test_err_carries_server_fields() {
        let payload = err_payload(1045, "28000", "Access denied for user 'app'@'%'");
        match check_acknowledgement(&MySqlCodec::new(), &payload) {
            Err(Error::Server(err)) => {
                assert_eq!(err.code, 1045);
                assert_eq!(err.sql_state.as_deref(), Some("28000"));
                assert_eq!(err.message, "Access denied for user 'app'@'%'");
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_err_is_protocol_error() {
        let err = check_acknowledgement(&MySqlCodec::new(), &[0xFF, 0x15]).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_other_markers_are_unrecognized() {
        for payload in [vec![0xFE, 0x6d, 0x79], vec![0x01, 0x03], vec![]] {
            match check_acknowledgement(&MySqlCodec::new(), &payload) {
                Err(Error::UnrecognizedAcknowledgement { payload: got }) => {
                    assert_eq!(got, payload)
                }
                other => panic!("expected unrecognized ack, got {:?}", other),
            }
        }
    }
}

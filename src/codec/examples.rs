//! Shared example message codec for tests and documentation.
//!
//! The pair serializes any type carrying bincode's `Encode` and `Decode`
//! derives with the standard configuration. Real protocols supply their own
//! encoder and decoder; this one exists so tests and examples do not each
//! hand-roll a codec.

use bincode::{Decode, Encode, config, decode_from_slice, encode_to_vec};
use bytes::BytesMut;

use super::{CodecError, MessageDecoder, MessageEncoder};

/// Encoder for any bincode-encodable message type.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeEncoder;

impl<M: Encode> MessageEncoder<M> for BincodeEncoder {
    fn encode(&self, message: &M, dst: &mut BytesMut) -> Result<(), CodecError> {
        let bytes = encode_to_vec(message, config::standard())
            .map_err(|error| CodecError::Encode(Box::new(error)))?;
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}

/// Decoder for any bincode-decodable message type.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeDecoder;

impl<M: Decode<()>> MessageDecoder<M> for BincodeDecoder {
    fn decode(&self, frame: BytesMut) -> Result<M, CodecError> {
        let (message, _consumed) = decode_from_slice(&frame, config::standard())
            .map_err(|error| CodecError::Decode(Box::new(error)))?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
    struct Probe {
        sequence: u32,
        body: String,
    }

    #[test]
    fn encoded_messages_decode_unchanged() {
        let probe = Probe {
            sequence: 7,
            body: "status".to_owned(),
        };
        let mut payload = BytesMut::new();
        BincodeEncoder.encode(&probe, &mut payload).expect("encode");
        let decoded: Probe = BincodeDecoder.decode(payload).expect("decode");
        assert_eq!(decoded, probe);
    }

    #[test]
    fn truncated_payload_is_a_decode_error() {
        let mut payload = BytesMut::new();
        BincodeEncoder
            .encode(
                &Probe {
                    sequence: 7,
                    body: "status".to_owned(),
                },
                &mut payload,
            )
            .expect("encode");
        payload.truncate(payload.len() - 1);
        let denied: Result<Probe, _> = BincodeDecoder.decode(payload);
        assert!(matches!(denied, Err(CodecError::Decode(_))));
    }
}

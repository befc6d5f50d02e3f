//! Codec seams for the per-connection pipeline.
//!
//! The wire format of a protocol is owned by its codec collaborator. This
//! module defines the three seams the pipeline composes: a frame delimiter
//! that splits the byte stream into discrete frames, and a stateless
//! encoder/decoder pair converting between frame payloads and protocol
//! messages. A length-prefixed delimiter is provided as the default framing.

use std::io;

use bytes::{Buf, BufMut, BytesMut};

#[doc(hidden)]
pub mod examples;

/// Minimum frame length in bytes.
///
/// Frame-length caps passed to [`LengthPrefixedFraming::max_frame_length`]
/// are clamped to at least this value.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Maximum frame length in bytes (16 MiB).
///
/// Frame-length caps are clamped to at most this value to prevent unbounded
/// buffer growth from a hostile or corrupt length prefix.
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// Errors produced by codec stages.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The byte stream violates the framing format.
    #[error("malformed frame: {0}")]
    Framing(String),
    /// A frame exceeded the configured maximum length.
    #[error("frame of {length} bytes exceeds the {max} byte maximum")]
    FrameTooLarge {
        /// Length announced by the frame.
        length: usize,
        /// Configured maximum.
        max: usize,
    },
    /// A message could not be encoded into a frame payload.
    #[error("failed to encode message")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// A frame payload could not be decoded into a message.
    #[error("failed to decode message")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// I/O failure inside a codec stage.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Byte order used for encoding and decoding length prefixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

/// Format of the length prefix preceding each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthFormat {
    bytes: usize,
    endianness: Endianness,
}

impl LengthFormat {
    /// Create a new [`LengthFormat`].
    #[must_use]
    pub const fn new(bytes: usize, endianness: Endianness) -> Self { Self { bytes, endianness } }

    /// Two byte big-endian prefix.
    #[must_use]
    pub const fn u16_be() -> Self { Self::new(2, Endianness::Big) }

    /// Two byte little-endian prefix.
    #[must_use]
    pub const fn u16_le() -> Self { Self::new(2, Endianness::Little) }

    /// Four byte big-endian prefix.
    #[must_use]
    pub const fn u32_be() -> Self { Self::new(4, Endianness::Big) }

    /// Four byte little-endian prefix.
    #[must_use]
    pub const fn u32_le() -> Self { Self::new(4, Endianness::Little) }

    /// Eight byte big-endian prefix.
    #[must_use]
    pub const fn u64_be() -> Self { Self::new(8, Endianness::Big) }

    /// Width of the prefix in bytes.
    #[must_use]
    pub const fn bytes(&self) -> usize { self.bytes }

    /// Byte order of the prefix.
    #[must_use]
    pub const fn endianness(&self) -> Endianness { self.endianness }

    fn read_len(&self, prefix: &[u8]) -> Result<usize, CodecError> {
        let mut cursor = prefix;
        let value = match (self.bytes, self.endianness) {
            (1, _) => u64::from(cursor.get_u8()),
            (2, Endianness::Big) => u64::from(cursor.get_u16()),
            (2, Endianness::Little) => u64::from(cursor.get_u16_le()),
            (4, Endianness::Big) => u64::from(cursor.get_u32()),
            (4, Endianness::Little) => u64::from(cursor.get_u32_le()),
            (8, Endianness::Big) => cursor.get_u64(),
            (8, Endianness::Little) => cursor.get_u64_le(),
            _ => {
                return Err(CodecError::Framing(format!(
                    "unsupported length prefix size {}",
                    self.bytes
                )));
            }
        };
        usize::try_from(value)
            .map_err(|_| CodecError::Framing("length prefix exceeds addressable memory".into()))
    }

    fn write_len(&self, len: usize, dst: &mut BytesMut) -> Result<(), CodecError> {
        let overflow = |_: std::num::TryFromIntError| {
            CodecError::Framing(format!(
                "frame length {len} does not fit a {} byte prefix",
                self.bytes
            ))
        };
        match (self.bytes, self.endianness) {
            (1, _) => dst.put_u8(u8::try_from(len).map_err(overflow)?),
            (2, Endianness::Big) => dst.put_u16(u16::try_from(len).map_err(overflow)?),
            (2, Endianness::Little) => dst.put_u16_le(u16::try_from(len).map_err(overflow)?),
            (4, Endianness::Big) => dst.put_u32(u32::try_from(len).map_err(overflow)?),
            (4, Endianness::Little) => dst.put_u32_le(u32::try_from(len).map_err(overflow)?),
            (8, Endianness::Big) => dst.put_u64(u64::try_from(len).map_err(overflow)?),
            (8, Endianness::Little) => dst.put_u64_le(u64::try_from(len).map_err(overflow)?),
            _ => {
                return Err(CodecError::Framing(format!(
                    "unsupported length prefix size {}",
                    self.bytes
                )));
            }
        }
        Ok(())
    }
}

impl Default for LengthFormat {
    fn default() -> Self { Self::u32_be() }
}

/// Converts the raw byte stream into discrete frames and wraps outbound
/// payloads for transmission.
///
/// A delimiter may keep per-connection state between calls, so every
/// connection receives a fresh instance from a [`FrameDelimiterFactory`].
pub trait FrameDelimiter: Send {
    /// Attempt to extract the next complete frame from `src`.
    ///
    /// Returns `Ok(None)` when more bytes are required. Bytes belonging to a
    /// returned frame, including its delimiters, are consumed from `src`.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when the bytes in `src` violate the framing
    /// format.
    fn deframe(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, CodecError>;

    /// Wrap `payload` as exactly one frame and append it to `dst`.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when the payload cannot be represented as a
    /// single frame.
    fn enframe(&mut self, payload: &[u8], dst: &mut BytesMut) -> Result<(), CodecError>;
}

/// Produces one fresh frame delimiter per connection.
pub trait FrameDelimiterFactory: Send + Sync {
    /// Create a delimiter for a new connection.
    fn frame_delimiter(&self) -> Box<dyn FrameDelimiter>;
}

/// Stateless conversion from protocol messages to frame payloads.
///
/// One encoder instance is shared by reference across every connection in
/// the process. The `Send + Sync` bounds are the thread-safety contract the
/// codec collaborator must meet; nothing is re-verified at run time.
pub trait MessageEncoder<M>: Send + Sync {
    /// Encode `message` into `dst` as exactly one frame payload.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when the message cannot be encoded.
    fn encode(&self, message: &M, dst: &mut BytesMut) -> Result<(), CodecError>;
}

/// Stateless conversion from frame payloads to protocol messages.
///
/// Shared by reference across connections under the same contract as
/// [`MessageEncoder`].
pub trait MessageDecoder<M>: Send + Sync {
    /// Decode one complete frame payload into a message.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] when the payload cannot be decoded.
    fn decode(&self, frame: BytesMut) -> Result<M, CodecError>;
}

/// Length-prefixed framing, the default frame delimiter.
///
/// The value doubles as configuration and factory: it captures the prefix
/// format and the frame-length cap, and yields one delimiter per connection.
///
/// # Examples
///
/// ```
/// use hawser::codec::{FrameDelimiterFactory, LengthFormat, LengthPrefixedFraming};
///
/// let framing = LengthPrefixedFraming::new(LengthFormat::u32_be()).max_frame_length(1 << 20);
/// let _delimiter = framing.frame_delimiter();
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LengthPrefixedFraming {
    format: LengthFormat,
    max_frame_length: usize,
}

impl LengthPrefixedFraming {
    /// Create a framing configuration with the provided [`LengthFormat`].
    #[must_use]
    pub const fn new(format: LengthFormat) -> Self {
        Self {
            format,
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }

    /// Cap the length of a single frame.
    ///
    /// The value is clamped to `MIN_FRAME_LENGTH..=MAX_FRAME_LENGTH`.
    #[must_use]
    pub fn max_frame_length(mut self, value: usize) -> Self {
        self.max_frame_length = clamp_frame_length(value);
        self
    }

    /// The configured frame-length cap.
    #[must_use]
    pub const fn max_frame_length_value(&self) -> usize { self.max_frame_length }

    /// The configured prefix format.
    #[must_use]
    pub const fn format(&self) -> LengthFormat { self.format }
}

impl Default for LengthPrefixedFraming {
    fn default() -> Self { Self::new(LengthFormat::default()) }
}

impl FrameDelimiterFactory for LengthPrefixedFraming {
    fn frame_delimiter(&self) -> Box<dyn FrameDelimiter> {
        Box::new(LengthPrefixedDelimiter {
            format: self.format,
            max_frame_length: self.max_frame_length,
        })
    }
}

/// Delimiter instance produced by [`LengthPrefixedFraming`].
pub struct LengthPrefixedDelimiter {
    format: LengthFormat,
    max_frame_length: usize,
}

impl FrameDelimiter for LengthPrefixedDelimiter {
    fn deframe(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, CodecError> {
        let header = self.format.bytes();
        if src.len() < header {
            return Ok(None);
        }
        let length = self.format.read_len(&src[..header])?;
        if length > self.max_frame_length {
            return Err(CodecError::FrameTooLarge {
                length,
                max: self.max_frame_length,
            });
        }
        if src.len() < header + length {
            return Ok(None);
        }
        src.advance(header);
        Ok(Some(src.split_to(length)))
    }

    fn enframe(&mut self, payload: &[u8], dst: &mut BytesMut) -> Result<(), CodecError> {
        if payload.len() > self.max_frame_length {
            return Err(CodecError::FrameTooLarge {
                length: payload.len(),
                max: self.max_frame_length,
            });
        }
        dst.reserve(self.format.bytes() + payload.len());
        self.format.write_len(payload.len(), dst)?;
        dst.extend_from_slice(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn delimiter() -> Box<dyn FrameDelimiter> { LengthPrefixedFraming::default().frame_delimiter() }

    #[test]
    fn incomplete_header_yields_no_frame() {
        let mut src = BytesMut::from(&[0u8, 0, 0][..]);
        let frame = delimiter().deframe(&mut src).expect("deframe");
        assert!(frame.is_none());
        assert_eq!(src.len(), 3);
    }

    #[test]
    fn incomplete_payload_yields_no_frame() {
        let mut src = BytesMut::new();
        src.put_u32(8);
        src.extend_from_slice(b"half");
        let frame = delimiter().deframe(&mut src).expect("deframe");
        assert!(frame.is_none());
    }

    #[test]
    fn complete_frame_is_extracted_and_consumed() {
        let mut delimiter = delimiter();
        let mut src = BytesMut::new();
        delimiter.enframe(b"request", &mut src).expect("enframe");
        src.extend_from_slice(&[0xAA]);

        let frame = delimiter.deframe(&mut src).expect("deframe").expect("frame");
        assert_eq!(&frame[..], b"request");
        assert_eq!(&src[..], &[0xAA], "trailing bytes stay buffered");
    }

    #[test]
    fn oversized_announced_length_is_rejected() {
        let mut delimiter = LengthPrefixedFraming::default()
            .max_frame_length(MIN_FRAME_LENGTH)
            .frame_delimiter();
        let mut src = BytesMut::new();
        src.put_u32(u32::try_from(MIN_FRAME_LENGTH + 1).expect("fits"));
        let denied = delimiter.deframe(&mut src);
        assert!(matches!(denied, Err(CodecError::FrameTooLarge { .. })));
    }

    #[test]
    fn payload_wider_than_prefix_is_rejected() {
        let mut delimiter = LengthPrefixedFraming::new(LengthFormat::u16_be())
            .max_frame_length(MAX_FRAME_LENGTH)
            .frame_delimiter();
        let payload = vec![0u8; usize::from(u16::MAX) + 1];
        let denied = delimiter.enframe(&payload, &mut BytesMut::new());
        assert!(matches!(denied, Err(CodecError::Framing(_))));
    }

    #[rstest]
    #[case(LengthFormat::u16_be())]
    #[case(LengthFormat::u16_le())]
    #[case(LengthFormat::u32_be())]
    #[case(LengthFormat::u32_le())]
    #[case(LengthFormat::u64_be())]
    fn prefix_formats_round_trip(#[case] format: LengthFormat) {
        let mut delimiter = LengthPrefixedFraming::new(format).frame_delimiter();
        let mut wire = BytesMut::new();
        delimiter.enframe(b"payload", &mut wire).expect("enframe");
        let frame = delimiter.deframe(&mut wire).expect("deframe").expect("frame");
        assert_eq!(&frame[..], b"payload");
        assert!(wire.is_empty());
    }

    #[test]
    fn frame_length_cap_is_clamped() {
        let framing = LengthPrefixedFraming::default().max_frame_length(1);
        assert_eq!(framing.max_frame_length_value(), MIN_FRAME_LENGTH);
        let framing = LengthPrefixedFraming::default().max_frame_length(usize::MAX);
        assert_eq!(framing.max_frame_length_value(), MAX_FRAME_LENGTH);
    }
}

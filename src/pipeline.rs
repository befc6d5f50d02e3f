//! Per-connection pipeline assembly.
//!
//! Every connection processes bytes through the same fixed stage chain:
//! frame delimiter, then encoder, then decoder, then the caller's handler.
//! The order is wire-compatible by construction: outbound messages are
//! encoded and framed before they leave the process, and inbound bytes are
//! deframed and decoded before the handler sees them.

use std::sync::Arc;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    bootstrap::BufferPolicy,
    codec::{FrameDelimiter, FrameDelimiterFactory, MessageDecoder, MessageEncoder},
    error::TransportError,
    handler::Handler,
};

/// Identifies one pipeline stage. Stage order is part of the wire contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageKind {
    /// Splits the byte stream into discrete frames. Always first.
    FrameDelimiter,
    /// Converts outbound messages into frame payloads.
    Encoder,
    /// Converts inbound frame payloads into messages.
    Decoder,
    /// The caller's event handler. Always last.
    Handler,
}

/// The fixed stage order of every assembled pipeline.
pub const STAGE_ORDER: [StageKind; 4] = [
    StageKind::FrameDelimiter,
    StageKind::Encoder,
    StageKind::Decoder,
    StageKind::Handler,
];

/// Named pipeline initializer passed into the bootstrap factory.
///
/// The assembler owns the codec collaborator's three seams. The encoder and
/// decoder are shared by reference with every pipeline it assembles; the
/// delimiter factory yields a fresh instance per connection.
pub struct PipelineAssembler<M> {
    delimiter_factory: Arc<dyn FrameDelimiterFactory>,
    encoder: Arc<dyn MessageEncoder<M>>,
    decoder: Arc<dyn MessageDecoder<M>>,
}

impl<M> PipelineAssembler<M> {
    /// Create an assembler from the codec collaborator's stages.
    #[must_use]
    pub fn new(
        delimiter_factory: Arc<dyn FrameDelimiterFactory>,
        encoder: Arc<dyn MessageEncoder<M>>,
        decoder: Arc<dyn MessageDecoder<M>>,
    ) -> Self {
        Self {
            delimiter_factory,
            encoder,
            decoder,
        }
    }

    /// Assemble the stage chain for one connection, placing `handler` last.
    #[must_use]
    pub fn assemble(&self, handler: Arc<dyn Handler<M>>) -> Pipeline<M>
    where
        M: Send + 'static,
    {
        // Delimiter first and handler last; the order between them is part
        // of the wire contract.
        Pipeline {
            stages: STAGE_ORDER.to_vec(),
            delimiter: self.delimiter_factory.frame_delimiter(),
            encoder: Arc::clone(&self.encoder),
            decoder: Arc::clone(&self.decoder),
            handler,
        }
    }
}

/// One connection's assembled stage chain.
pub struct Pipeline<M: Send + 'static> {
    stages: Vec<StageKind>,
    delimiter: Box<dyn FrameDelimiter>,
    encoder: Arc<dyn MessageEncoder<M>>,
    decoder: Arc<dyn MessageDecoder<M>>,
    handler: Arc<dyn Handler<M>>,
}

impl<M: Send + 'static> Pipeline<M> {
    /// Stage kinds in execution order.
    #[must_use]
    pub fn stage_kinds(&self) -> &[StageKind] { &self.stages }

    /// The encoder stage, shared by reference across connections.
    #[must_use]
    pub fn encoder(&self) -> &Arc<dyn MessageEncoder<M>> { &self.encoder }

    /// The decoder stage, shared by reference across connections.
    #[must_use]
    pub fn decoder(&self) -> &Arc<dyn MessageDecoder<M>> { &self.decoder }

    /// Split into the wire-facing codec stages and the terminal handler.
    pub(crate) fn into_wire_parts(
        self,
        buffers: BufferPolicy,
    ) -> (WireCodec<M>, Arc<dyn Handler<M>>) {
        (
            WireCodec {
                delimiter: self.delimiter,
                encoder: self.encoder,
                decoder: self.decoder,
                scratch: BytesMut::new(),
                buffers,
            },
            self.handler,
        )
    }
}

/// Adapter driving the three codec stages as one framed transport codec.
///
/// Inbound bytes pass the delimiter and then the decoder; outbound messages
/// pass the encoder and then the delimiter. The handler stage is driven by
/// the connection task, not by this adapter.
pub(crate) struct WireCodec<M> {
    delimiter: Box<dyn FrameDelimiter>,
    encoder: Arc<dyn MessageEncoder<M>>,
    decoder: Arc<dyn MessageDecoder<M>>,
    scratch: BytesMut,
    buffers: BufferPolicy,
}

impl<M> Decoder for WireCodec<M> {
    type Item = M;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<M>, TransportError> {
        let Some(frame) = self.delimiter.deframe(src)? else {
            return Ok(None);
        };
        Ok(Some(self.decoder.decode(frame)?))
    }
}

impl<M> Encoder<M> for WireCodec<M> {
    type Error = TransportError;

    fn encode(&mut self, message: M, dst: &mut BytesMut) -> Result<(), TransportError> {
        self.scratch.clear();
        self.encoder.encode(&message, &mut self.scratch)?;
        self.delimiter.enframe(&self.scratch, dst)?;
        if self.buffers == BufferPolicy::PerMessage {
            self.scratch = BytesMut::new();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::codec::{CodecError, LengthPrefixedFraming};

    struct NullHandler;

    #[async_trait]
    impl Handler<Bytes> for NullHandler {
        async fn on_message(&self, _message: Bytes) {}

        async fn on_error(&self, _error: TransportError) {}
    }

    struct PayloadEncoder;

    impl MessageEncoder<Bytes> for PayloadEncoder {
        fn encode(&self, message: &Bytes, dst: &mut BytesMut) -> Result<(), CodecError> {
            dst.extend_from_slice(message);
            Ok(())
        }
    }

    struct PayloadDecoder;

    impl MessageDecoder<Bytes> for PayloadDecoder {
        fn decode(&self, frame: BytesMut) -> Result<Bytes, CodecError> { Ok(frame.freeze()) }
    }

    fn assembler() -> PipelineAssembler<Bytes> {
        PipelineAssembler::new(
            Arc::new(LengthPrefixedFraming::default()),
            Arc::new(PayloadEncoder),
            Arc::new(PayloadDecoder),
        )
    }

    #[test]
    fn stages_assemble_in_wire_order() {
        let pipeline = assembler().assemble(Arc::new(NullHandler));
        assert_eq!(pipeline.stage_kinds(), STAGE_ORDER.as_slice());
    }

    #[test]
    fn wire_codec_round_trips_a_message() {
        let pipeline = assembler().assemble(Arc::new(NullHandler));
        let (mut codec, _handler) = pipeline.into_wire_parts(BufferPolicy::Pooled);

        let mut wire = BytesMut::new();
        codec
            .encode(Bytes::from_static(b"call"), &mut wire)
            .expect("encode");
        let decoded = codec.decode(&mut wire).expect("decode").expect("message");
        assert_eq!(decoded, Bytes::from_static(b"call"));
        assert!(wire.is_empty());
    }

    #[test]
    fn partial_frames_wait_for_more_bytes() {
        let pipeline = assembler().assemble(Arc::new(NullHandler));
        let (mut codec, _handler) = pipeline.into_wire_parts(BufferPolicy::Pooled);

        let mut wire = BytesMut::new();
        codec
            .encode(Bytes::from_static(b"split-me"), &mut wire)
            .expect("encode");
        let tail = wire.split_off(3);

        assert!(codec.decode(&mut wire).expect("decode").is_none());
        wire.unsplit(tail);
        let decoded = codec.decode(&mut wire).expect("decode").expect("message");
        assert_eq!(decoded, Bytes::from_static(b"split-me"));
    }

    #[test]
    fn pooled_scratch_retains_capacity_between_messages() {
        let pipeline = assembler().assemble(Arc::new(NullHandler));
        let (mut codec, _handler) = pipeline.into_wire_parts(BufferPolicy::Pooled);

        let mut wire = BytesMut::new();
        codec
            .encode(Bytes::from(vec![0u8; 512]), &mut wire)
            .expect("encode");
        let capacity = codec.scratch.capacity();
        assert!(capacity >= 512);
        codec
            .encode(Bytes::from_static(b"small"), &mut wire)
            .expect("encode");
        assert_eq!(codec.scratch.capacity(), capacity);
    }
}

//! Utilities for exercising `hawser` templates against in-process servers.
//!
//! The helpers pair a recording [`Handler`] implementation with framed
//! local servers, so tests can open real connections and assert on the
//! exact event sequence a handler observed.
//!
//! ```rust,no_run
//! use hawser::{TransportConfig, TransportContext};
//! use hawser_testing::{payload_assembler, recording_factory};
//!
//! # fn example() -> Result<(), hawser::TransportError> {
//! let context = TransportContext::new(TransportConfig::default())?;
//! let (factory, handlers) = recording_factory();
//! let template = context
//!     .bootstrap(payload_assembler())
//!     .handler_factory(factory)
//!     .build()?;
//! # let _ = (template, handlers);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};
use hawser::{
    Handler, PipelineAssembler,
    codec::{CodecError, LengthPrefixedFraming, MessageDecoder, MessageEncoder},
};

mod recording;
mod servers;

pub use recording::{HandlerEvent, RecordingHandler};
pub use servers::{spawn_burst_server, spawn_echo_server};

/// Encoder treating each `Bytes` message as one raw frame payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct PayloadEncoder;

impl MessageEncoder<Bytes> for PayloadEncoder {
    fn encode(&self, message: &Bytes, dst: &mut BytesMut) -> Result<(), CodecError> {
        dst.extend_from_slice(message);
        Ok(())
    }
}

/// Decoder treating each frame payload as one `Bytes` message.
#[derive(Clone, Copy, Debug, Default)]
pub struct PayloadDecoder;

impl MessageDecoder<Bytes> for PayloadDecoder {
    fn decode(&self, frame: BytesMut) -> Result<Bytes, CodecError> { Ok(frame.freeze()) }
}

/// Assembler wiring the payload codec behind default length-prefixed
/// framing.
///
/// The framing matches [`spawn_echo_server`] and [`spawn_burst_server`],
/// which speak four byte big-endian length prefixes.
#[must_use]
pub fn payload_assembler() -> PipelineAssembler<Bytes> {
    PipelineAssembler::new(
        Arc::new(LengthPrefixedFraming::default()),
        Arc::new(PayloadEncoder),
        Arc::new(PayloadDecoder),
    )
}

/// Handler factory that records every handler it creates.
///
/// Returns the factory and the registry of created handlers, in creation
/// order. The factory is synchronous, so after `template.connect(..)`
/// returns, the connection's handler is already in the registry.
#[must_use]
pub fn recording_factory() -> (
    impl Fn() -> Arc<dyn Handler<Bytes>> + Send + Sync + 'static,
    Arc<Mutex<Vec<Arc<RecordingHandler>>>>,
) {
    let registry = Arc::new(Mutex::new(Vec::new()));
    let handlers = Arc::clone(&registry);
    let factory = move || -> Arc<dyn Handler<Bytes>> {
        let handler = RecordingHandler::new();
        handlers
            .lock()
            .expect("handler registry poisoned")
            .push(Arc::clone(&handler));
        handler
    };
    (factory, registry)
}

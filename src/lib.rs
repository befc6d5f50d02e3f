//! Client-side transport bootstrap for binary RPC connections.
//!
//! `hawser` owns the pieces an RPC client needs before the first request
//! byte exists: a shared pool of asynchronous I/O worker threads, a channel
//! resolver pairing each socket backend with its event loop, and the
//! per-connection pipeline of framing, encoding, decoding, and the caller's
//! handler, assembled in a fixed wire-compatible order. Message semantics,
//! request correlation, retries, and timer enforcement belong to the layers
//! above.
//!
//! Configuration is read once at startup into a
//! [`TransportContext`]; call sites build immutable [`Bootstrap`] templates
//! from it and open any number of concurrent connections per template.

pub mod bootstrap;
pub mod channel;
pub mod codec;
pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod timeout;
pub mod worker;

pub use bootstrap::{Bootstrap, BootstrapBuilder, BufferPolicy, SocketOptions};
pub use channel::{ChannelDriver, ChannelKind, EventLoopKind};
pub use codec::{
    CodecError,
    Endianness,
    FrameDelimiter,
    FrameDelimiterFactory,
    LengthFormat,
    LengthPrefixedFraming,
    MessageDecoder,
    MessageEncoder,
};
pub use config::TransportConfig;
pub use connection::Connection;
pub use context::TransportContext;
pub use error::TransportError;
pub use handler::{Handler, HandlerFactory};
pub use pipeline::{Pipeline, PipelineAssembler, STAGE_ORDER, StageKind};
pub use timeout::TimeoutPolicy;
pub use worker::{WorkerPool, WorkerPoolManager, default_worker_threads};

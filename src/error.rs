//! Canonical error types for the transport bootstrap.
//!
//! Configuration problems surface synchronously while a context, pool, or
//! template is constructed. Runtime I/O and codec failures on an open
//! connection are routed through the handler's `on_error` callback instead,
//! because connect and socket I/O are asynchronous.

use std::io;

use crate::channel::{ChannelKind, EventLoopKind};

/// Errors emitted by `hawser` operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The configured channel kind is not available on this platform.
    #[error("channel kind `{requested}` is not supported on this platform")]
    UnsupportedChannel {
        /// The kind that failed to resolve.
        requested: ChannelKind,
    },
    /// The shared worker pool serves a different event-loop kind than the
    /// channel driver requires.
    #[error("worker pool runs a {pool:?} event loop but the channel driver requires {driver:?}")]
    EventLoopMismatch {
        /// Event-loop kind the pool was created with.
        pool: EventLoopKind,
        /// Event-loop kind the channel driver requires.
        driver: EventLoopKind,
    },
    /// A configuration value failed to parse.
    #[error("invalid value for {key}: {message}")]
    InvalidConfig {
        /// Configuration key that carried the rejected value.
        key: &'static str,
        /// Why the value was rejected.
        message: String,
    },
    /// A connection template was built without a handler factory.
    #[error("a connection handler factory is required")]
    MissingHandler,
    /// The worker pool's runtime could not be started.
    #[error("failed to start worker pool: {0}")]
    PoolStart(#[source] io::Error),
    /// The connection has closed and no longer accepts outbound messages.
    #[error("connection closed")]
    ConnectionClosed,
    /// A codec stage rejected inbound or outbound data.
    #[error("codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),
    /// Transport-level I/O failure.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

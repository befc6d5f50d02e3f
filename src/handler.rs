//! The caller-supplied terminal pipeline stage.

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;

use crate::error::TransportError;

/// Connection event handler, the last stage of every pipeline.
///
/// A handler only ever observes fully-framed, fully-decoded messages, in the
/// order they arrived on the wire. Callbacks run on a shared worker thread
/// that also services other connections, so implementations must never
/// block; anything that waits must `await`.
///
/// `on_connect` and `on_disconnect` default to no-ops.
#[async_trait]
pub trait Handler<M: Send + 'static>: Send + Sync {
    /// Called once when the connection to `peer` is established.
    async fn on_connect(&self, _peer: SocketAddr) {}

    /// Called for every decoded inbound message, in wire order.
    async fn on_message(&self, message: M);

    /// Called once when an established connection ends, after the final
    /// message or error for that connection.
    async fn on_disconnect(&self, _peer: SocketAddr) {}

    /// Called when connecting fails or an established connection hits an
    /// I/O or codec error. Each failure is reported exactly once.
    async fn on_error(&self, error: TransportError);
}

/// Produces one fresh handler per connection opened from a template.
pub type HandlerFactory<M> = Arc<dyn Fn() -> Arc<dyn Handler<M>> + Send + Sync>;

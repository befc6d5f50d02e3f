//! Immutable connection templates.
//!
//! A [`Bootstrap`] captures everything needed to open outbound connections:
//! the shared worker pool, the channel driver, the fixed socket options, the
//! named pipeline assembler, and the caller's handler factory. Templates
//! hold no per-connection state, so one template may be used from many
//! threads to open many simultaneous connections without locking.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpSocket;

use crate::{
    channel::ChannelDriver,
    connection::{self, Connection},
    context::TransportContext,
    error::TransportError,
    handler::{Handler, HandlerFactory},
    pipeline::PipelineAssembler,
    timeout::TimeoutPolicy,
    worker::WorkerPool,
};

/// Buffer allocation strategy for a connection's wire loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferPolicy {
    /// Encode and read buffers retain their capacity across messages.
    Pooled,
    /// Buffers are released after every message.
    PerMessage,
}

/// Socket options applied to every connection opened from a template.
///
/// Templates bake in the options an RPC client wants on every connection:
/// keep-alive probing to detect dead peers, and `TCP_NODELAY` so small
/// request frames are written without coalescing delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SocketOptions {
    nodelay: bool,
    keepalive: Option<Duration>,
}

impl SocketOptions {
    /// The fixed option set every template uses.
    #[must_use]
    pub const fn rpc_defaults() -> Self {
        Self {
            nodelay: true,
            keepalive: Some(Duration::from_secs(60)),
        }
    }

    /// Whether `TCP_NODELAY` is set.
    #[must_use]
    pub const fn nodelay(&self) -> bool { self.nodelay }

    /// Keep-alive probe idle time, when probing is enabled.
    #[must_use]
    pub const fn keepalive(&self) -> Option<Duration> { self.keepalive }

    pub(crate) fn apply(&self, socket: &TcpSocket) -> std::io::Result<()> {
        socket.set_nodelay(self.nodelay)?;
        match self.keepalive {
            Some(idle) => {
                socket.set_keepalive(true)?;
                let sock_ref = SockRef::from(socket);
                sock_ref.set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))?;
            }
            None => socket.set_keepalive(false)?,
        }
        Ok(())
    }
}

/// Builder for [`Bootstrap`] templates.
///
/// Only the handler factory is configurable; socket options, buffer policy,
/// and the timeout policy are fixed per template.
pub struct BootstrapBuilder<'ctx, M: Send + 'static> {
    context: &'ctx TransportContext,
    assembler: PipelineAssembler<M>,
    handler_factory: Option<HandlerFactory<M>>,
}

impl<'ctx, M: Send + 'static> BootstrapBuilder<'ctx, M> {
    pub(crate) fn new(context: &'ctx TransportContext, assembler: PipelineAssembler<M>) -> Self {
        Self {
            context,
            assembler,
            handler_factory: None,
        }
    }

    /// Supply the factory producing one fresh handler per connection.
    #[must_use]
    pub fn handler_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Handler<M>> + Send + Sync + 'static,
    {
        self.handler_factory = Some(Arc::new(factory));
        self
    }

    /// Finish the template.
    ///
    /// The first template built against a context creates the shared worker
    /// pool; later builds reuse it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::MissingHandler`] when no handler factory
    /// was supplied; no template or pipeline is produced in that case. Pool
    /// creation and event-loop mismatch errors propagate unchanged.
    pub fn build(self) -> Result<Bootstrap<M>, TransportError> {
        let handler_factory = self.handler_factory.ok_or(TransportError::MissingHandler)?;
        let driver = self.context.driver();
        let pool = self.context.worker_pool()?;
        if pool.event_loop() != driver.event_loop() {
            return Err(TransportError::EventLoopMismatch {
                pool: pool.event_loop(),
                driver: driver.event_loop(),
            });
        }
        tracing::debug!(
            channel = %driver.channel(),
            event_loop = ?driver.event_loop(),
            "built connection template"
        );
        Ok(Bootstrap {
            pool,
            driver,
            options: SocketOptions::rpc_defaults(),
            buffers: BufferPolicy::Pooled,
            assembler: self.assembler,
            handler_factory,
            timeout: self.context.timeout(),
        })
    }
}

/// An immutable, reusable template for opening outbound connections.
///
/// # Examples
///
/// ```no_run
/// use std::{net::SocketAddr, sync::Arc};
///
/// use bytes::Bytes;
/// use hawser::{
///     TransportConfig, TransportContext,
///     codec::LengthPrefixedFraming,
///     pipeline::PipelineAssembler,
/// };
/// # use hawser::codec::{CodecError, MessageDecoder, MessageEncoder};
/// # use bytes::BytesMut;
/// # struct RawEncoder;
/// # impl MessageEncoder<Bytes> for RawEncoder {
/// #     fn encode(&self, message: &Bytes, dst: &mut BytesMut) -> Result<(), CodecError> {
/// #         dst.extend_from_slice(message);
/// #         Ok(())
/// #     }
/// # }
/// # struct RawDecoder;
/// # impl MessageDecoder<Bytes> for RawDecoder {
/// #     fn decode(&self, frame: BytesMut) -> Result<Bytes, CodecError> { Ok(frame.freeze()) }
/// # }
/// # struct Printer;
/// # #[async_trait::async_trait]
/// # impl hawser::Handler<Bytes> for Printer {
/// #     async fn on_message(&self, message: Bytes) { println!("{message:?}"); }
/// #     async fn on_error(&self, error: hawser::TransportError) { eprintln!("{error}"); }
/// # }
///
/// # fn main() -> Result<(), hawser::TransportError> {
/// let context = TransportContext::new(TransportConfig::from_env()?)?;
/// let assembler = PipelineAssembler::new(
///     Arc::new(LengthPrefixedFraming::default()),
///     Arc::new(RawEncoder),
///     Arc::new(RawDecoder),
/// );
/// let template = context
///     .bootstrap(assembler)
///     .handler_factory(|| Arc::new(Printer))
///     .build()?;
///
/// let addr: SocketAddr = "10.0.0.7:29999".parse().expect("valid socket address");
/// let connection = template.connect(addr);
/// connection.send(Bytes::from_static(b"ping"))?;
/// # Ok(())
/// # }
/// ```
pub struct Bootstrap<M: Send + 'static> {
    pool: Arc<WorkerPool>,
    driver: ChannelDriver,
    options: SocketOptions,
    buffers: BufferPolicy,
    assembler: PipelineAssembler<M>,
    handler_factory: HandlerFactory<M>,
    timeout: TimeoutPolicy,
}

impl<M: Send + 'static> Bootstrap<M> {
    /// Open a connection to `addr`.
    ///
    /// A fresh handler is taken from the factory, the pipeline is assembled
    /// around it, and the dial is spawned onto the shared pool. The handle
    /// is returned immediately; connect failures are delivered to the
    /// handler's `on_error`, never returned here.
    pub fn connect(&self, addr: SocketAddr) -> Connection<M> {
        let handler = (self.handler_factory)();
        let pipeline = self.assembler.assemble(handler);
        connection::open(
            &self.pool,
            self.driver,
            self.options,
            self.buffers,
            pipeline,
            addr,
        )
    }

    /// The response-wait duration, fixed for the template's lifetime.
    #[must_use]
    pub const fn response_timeout(&self) -> Duration { self.timeout.response_wait() }

    /// The timeout policy shared with every template from this context.
    #[must_use]
    pub const fn timeout_policy(&self) -> TimeoutPolicy { self.timeout }

    /// Socket options applied to every connection.
    #[must_use]
    pub const fn socket_options(&self) -> SocketOptions { self.options }

    /// Buffer strategy used by every connection's wire loop.
    #[must_use]
    pub const fn buffer_policy(&self) -> BufferPolicy { self.buffers }

    /// The pool servicing this template's connections.
    #[must_use]
    pub fn worker_pool(&self) -> &Arc<WorkerPool> { &self.pool }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpSocket;

    use super::*;

    #[test]
    fn rpc_defaults_favour_latency_and_liveness() {
        let options = SocketOptions::rpc_defaults();
        assert!(options.nodelay());
        assert!(options.keepalive().is_some());
    }

    #[tokio::test]
    async fn rpc_defaults_apply_to_a_socket() {
        let socket = TcpSocket::new_v4().expect("socket");
        SocketOptions::rpc_defaults().apply(&socket).expect("apply");
        assert!(socket.nodelay().expect("read nodelay"));
        assert!(socket.keepalive().expect("read keepalive"));
    }
}

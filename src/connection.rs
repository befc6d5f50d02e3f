//! Connection handles and the per-connection wire loop.
//!
//! Each connection is serviced by one task on the shared worker pool. The
//! task owns the socket and the assembled pipeline; within a connection,
//! stages run strictly in assembly order and inbound messages reach the
//! handler in the order they arrived. Nothing is ordered across distinct
//! connections.

use std::{io, net::SocketAddr};

use futures::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_util::codec::Framed;

use crate::{
    bootstrap::{BufferPolicy, SocketOptions},
    channel::ChannelDriver,
    error::TransportError,
    pipeline::Pipeline,
    worker::WorkerPool,
};

/// Initial read-buffer reservation for a pooled connection.
const INITIAL_READ_CAPACITY: usize = 64 * 1024;

/// Handle to one outbound connection.
///
/// The handle only queues outbound messages; all I/O happens on the shared
/// worker pool. Dropping the handle closes the connection after flushing
/// queued messages.
pub struct Connection<M> {
    peer: SocketAddr,
    outbound: mpsc::UnboundedSender<M>,
}

impl<M> Connection<M> {
    /// The remote address this connection dials.
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr { self.peer }

    /// Queue `message` for transmission.
    ///
    /// Messages are encoded and framed on the worker pool, in submission
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectionClosed`] once the connection has
    /// ended; the failure that ended it was already delivered to the
    /// handler's `on_error`.
    pub fn send(&self, message: M) -> Result<(), TransportError> {
        self.outbound
            .send(message)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    /// Whether the connection has ended.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.outbound.is_closed() }

    /// Close the connection, flushing queued messages first.
    pub fn close(self) { drop(self); }
}

pub(crate) fn open<M: Send + 'static>(
    pool: &WorkerPool,
    driver: ChannelDriver,
    options: SocketOptions,
    buffers: BufferPolicy,
    pipeline: Pipeline<M>,
    addr: SocketAddr,
) -> Connection<M> {
    let (outbound, queued) = mpsc::unbounded_channel();
    pool.spawn(run(driver, options, buffers, pipeline, addr, queued));
    Connection {
        peer: addr,
        outbound,
    }
}

async fn run<M: Send + 'static>(
    driver: ChannelDriver,
    options: SocketOptions,
    buffers: BufferPolicy,
    pipeline: Pipeline<M>,
    addr: SocketAddr,
    mut queued: mpsc::UnboundedReceiver<M>,
) {
    let (codec, handler) = pipeline.into_wire_parts(buffers);
    let stream = match dial(driver, options, addr).await {
        Ok(stream) => stream,
        Err(error) => {
            tracing::debug!(peer = %addr, error = %error, "connect failed");
            handler.on_error(TransportError::Io(error)).await;
            return;
        }
    };
    handler.on_connect(addr).await;

    let mut framed = Framed::new(stream, codec);
    if buffers == BufferPolicy::Pooled {
        framed.read_buffer_mut().reserve(INITIAL_READ_CAPACITY);
    }

    loop {
        tokio::select! {
            message = queued.recv() => match message {
                Some(message) => {
                    if let Err(error) = framed.send(message).await {
                        handler.on_error(error).await;
                        break;
                    }
                }
                None => {
                    // Handle dropped; flush pending frames, then finish.
                    let _ = framed.close().await;
                    break;
                }
            },
            inbound = framed.next() => match inbound {
                Some(Ok(message)) => handler.on_message(message).await,
                Some(Err(error)) => {
                    handler.on_error(error).await;
                    break;
                }
                None => break,
            },
        }
    }

    tracing::debug!(peer = %addr, "connection ended");
    handler.on_disconnect(addr).await;
}

async fn dial(
    driver: ChannelDriver,
    options: SocketOptions,
    addr: SocketAddr,
) -> io::Result<TcpStream> {
    let socket = driver.socket_for(addr)?;
    options.apply(&socket)?;
    socket.connect(addr).await
}

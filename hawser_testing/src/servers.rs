//! Framed local servers for driving client connections in tests.
//!
//! Both servers speak four byte big-endian length-prefixed frames, matching
//! the default [`LengthPrefixedFraming`](hawser::codec::LengthPrefixedFraming)
//! used by [`payload_assembler`](crate::payload_assembler).

use std::{io, net::SocketAddr};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Spawn an echo server on an ephemeral local port.
///
/// Every frame received on a connection is written back unchanged. Returns
/// the bound address and the accept-loop task; abort the task to stop the
/// server.
///
/// # Errors
///
/// Returns an [`io::Error`] when the listener cannot be bound.
pub async fn spawn_echo_server() -> io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
                while let Some(Ok(frame)) = framed.next().await {
                    if framed.send(frame.freeze()).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    Ok((addr, task))
}

/// Spawn a server that writes `frames` to each connection in order, then
/// closes it.
///
/// # Errors
///
/// Returns an [`io::Error`] when the listener cannot be bound.
pub async fn spawn_burst_server(frames: Vec<Bytes>) -> io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let burst = frames.clone();
            tokio::spawn(async move {
                let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
                for frame in burst {
                    if framed.send(frame).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    Ok((addr, task))
}

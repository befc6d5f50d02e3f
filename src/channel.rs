//! Channel kind resolution.
//!
//! A configured [`ChannelKind`] names the socket readiness backend used for
//! client connections. [`resolve`] pairs the kind with the event loop that
//! must service it, producing a [`ChannelDriver`]. The driver is the single
//! authority consulted for both socket creation and worker pool creation, so
//! the two can never diverge.

use std::{fmt, io, net::SocketAddr};

use tokio::net::TcpSocket;

use crate::error::TransportError;

/// Socket readiness backends selectable from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    /// Portable readiness polling, available on every platform.
    Poll,
    /// `epoll`-backed readiness, Linux and Android only.
    Epoll,
    /// `kqueue`-backed readiness, macOS and the BSDs only.
    Kqueue,
}

impl ChannelKind {
    /// The library default (currently [`Poll`](Self::Poll)).
    pub const DEFAULT: ChannelKind = ChannelKind::Poll;

    /// Parse a configuration value into a channel kind.
    ///
    /// Names are matched case-insensitively. Returns `None` for unknown
    /// names; platform availability is checked later by [`resolve`].
    ///
    /// # Examples
    ///
    /// ```
    /// use hawser::channel::ChannelKind;
    ///
    /// assert_eq!(ChannelKind::from_name("epoll"), Some(ChannelKind::Epoll));
    /// assert_eq!(ChannelKind::from_name("rdma"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "poll" => Some(Self::Poll),
            "epoll" => Some(Self::Epoll),
            "kqueue" => Some(Self::Kqueue),
            _ => None,
        }
    }

    /// Whether this kind is available on the current platform.
    #[must_use]
    pub const fn supported(self) -> bool {
        match self {
            Self::Poll => true,
            Self::Epoll => cfg!(any(target_os = "linux", target_os = "android")),
            Self::Kqueue => cfg!(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd",
            )),
        }
    }

    const fn event_loop(self) -> EventLoopKind {
        match self {
            Self::Poll => EventLoopKind::Poll,
            Self::Epoll => EventLoopKind::Epoll,
            Self::Kqueue => EventLoopKind::Kqueue,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Poll => "poll",
            Self::Epoll => "epoll",
            Self::Kqueue => "kqueue",
        };
        f.write_str(name)
    }
}

/// Event-loop kinds a worker pool can be created for.
///
/// Every pool records the kind it was created with; a pool of one kind must
/// never service sockets resolved for another.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventLoopKind {
    /// Services [`ChannelKind::Poll`] sockets.
    Poll,
    /// Services [`ChannelKind::Epoll`] sockets.
    Epoll,
    /// Services [`ChannelKind::Kqueue`] sockets.
    Kqueue,
}

/// The resolved pairing of socket capability and event-loop kind.
#[derive(Clone, Copy, Debug)]
pub struct ChannelDriver {
    channel: ChannelKind,
    event_loop: EventLoopKind,
}

impl ChannelDriver {
    /// The channel kind this driver was resolved from.
    #[must_use]
    pub const fn channel(&self) -> ChannelKind { self.channel }

    /// The event-loop kind a worker pool must run to service this driver's
    /// sockets.
    #[must_use]
    pub const fn event_loop(&self) -> EventLoopKind { self.event_loop }

    /// Open an unconnected TCP socket suitable for dialling `addr`.
    pub(crate) fn socket_for(&self, addr: SocketAddr) -> io::Result<TcpSocket> {
        if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
    }
}

/// Resolve `kind` into the driver shared by socket and pool creation.
///
/// # Errors
///
/// Returns [`TransportError::UnsupportedChannel`] when `kind` is not
/// available on the current platform. The failure is raised here, at
/// startup, never deferred to connect time.
///
/// # Examples
///
/// ```
/// use hawser::channel::{self, ChannelKind, EventLoopKind};
///
/// let driver = channel::resolve(ChannelKind::Poll)?;
/// assert_eq!(driver.event_loop(), EventLoopKind::Poll);
/// # Ok::<(), hawser::TransportError>(())
/// ```
pub fn resolve(kind: ChannelKind) -> Result<ChannelDriver, TransportError> {
    if !kind.supported() {
        return Err(TransportError::UnsupportedChannel { requested: kind });
    }
    Ok(ChannelDriver {
        channel: kind,
        event_loop: kind.event_loop(),
    })
}

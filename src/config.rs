//! Startup configuration for the transport bootstrap.
//!
//! Configuration is read exactly once at process start and then carried,
//! immutable, by the [`TransportContext`](crate::context::TransportContext).
//! It covers the channel kind, the worker-thread-count hint, the
//! response-wait duration, and the worker thread-name prefix.

use std::time::Duration;

use crate::{channel::ChannelKind, error::TransportError};

/// Environment variable naming the channel kind (`poll`, `epoll`, `kqueue`).
pub const ENV_CHANNEL: &str = "HAWSER_CHANNEL";
/// Environment variable with the worker-thread-count hint; `0` selects the
/// platform default.
pub const ENV_WORKER_THREADS: &str = "HAWSER_WORKER_THREADS";
/// Environment variable with the response-wait duration in milliseconds.
pub const ENV_RESPONSE_TIMEOUT_MS: &str = "HAWSER_RESPONSE_TIMEOUT_MS";

const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_THREAD_NAME_PREFIX: &str = "rpc-client-worker";

/// Immutable transport configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use hawser::{channel::ChannelKind, config::TransportConfig};
///
/// let config = TransportConfig::default()
///     .channel(ChannelKind::Poll)
///     .worker_threads(4)
///     .response_timeout(Duration::from_secs(10));
/// assert_eq!(config.worker_threads_value(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct TransportConfig {
    channel: ChannelKind,
    worker_threads: usize,
    response_timeout: Duration,
    thread_name_prefix: String,
}

impl TransportConfig {
    /// Create a configuration with library defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channel: ChannelKind::DEFAULT,
            worker_threads: 0,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_owned(),
        }
    }

    /// Read configuration from the `HAWSER_*` environment variables.
    ///
    /// Unset variables fall back to library defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidConfig`] when a set variable fails to
    /// parse.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TransportError> {
        let mut config = Self::new();
        if let Some(raw) = lookup(ENV_CHANNEL) {
            let channel =
                ChannelKind::from_name(&raw).ok_or_else(|| TransportError::InvalidConfig {
                    key: ENV_CHANNEL,
                    message: format!("unknown channel kind {raw:?}"),
                })?;
            config = config.channel(channel);
        }
        if let Some(raw) = lookup(ENV_WORKER_THREADS) {
            let count = raw.parse().map_err(|_| TransportError::InvalidConfig {
                key: ENV_WORKER_THREADS,
                message: format!("expected a thread count, got {raw:?}"),
            })?;
            config = config.worker_threads(count);
        }
        if let Some(raw) = lookup(ENV_RESPONSE_TIMEOUT_MS) {
            let millis: u64 = raw.parse().map_err(|_| TransportError::InvalidConfig {
                key: ENV_RESPONSE_TIMEOUT_MS,
                message: format!("expected milliseconds, got {raw:?}"),
            })?;
            config = config.response_timeout(Duration::from_millis(millis));
        }
        Ok(config)
    }

    /// Select the socket readiness backend.
    #[must_use]
    pub fn channel(mut self, channel: ChannelKind) -> Self {
        self.channel = channel;
        self
    }

    /// Hint the worker-thread count; `0` selects the platform default.
    #[must_use]
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.worker_threads = count;
        self
    }

    /// Set the response-wait duration exposed to callers.
    #[must_use]
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set the prefix applied to worker thread names.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// The configured channel kind.
    #[must_use]
    pub const fn channel_value(&self) -> ChannelKind { self.channel }

    /// The configured worker-thread hint.
    #[must_use]
    pub const fn worker_threads_value(&self) -> usize { self.worker_threads }

    /// The configured response-wait duration.
    #[must_use]
    pub const fn response_timeout_value(&self) -> Duration { self.response_timeout }

    /// The configured worker thread-name prefix.
    #[must_use]
    pub fn thread_name_prefix_value(&self) -> &str { &self.thread_name_prefix }
}

impl Default for TransportConfig {
    fn default() -> Self { Self::new() }
}

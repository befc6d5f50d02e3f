//! Process-wide transport context.
//!
//! The context replaces mutable global state: it is built once at process
//! start from a [`TransportConfig`] and passed by reference to every call
//! site that opens connections. It owns the resolved channel driver, the
//! timeout policy, and the initialize-once guard around the shared worker
//! pool.

use std::sync::Arc;

use crate::{
    bootstrap::BootstrapBuilder,
    channel::{self, ChannelDriver},
    config::TransportConfig,
    error::TransportError,
    pipeline::PipelineAssembler,
    timeout::TimeoutPolicy,
    worker::{WorkerPool, WorkerPoolManager},
};

/// Shared state for all client connections in the process.
///
/// # Examples
///
/// ```
/// use hawser::{TransportConfig, TransportContext};
///
/// let context = TransportContext::new(TransportConfig::default())?;
/// # Ok::<(), hawser::TransportError>(())
/// ```
pub struct TransportContext {
    config: TransportConfig,
    driver: ChannelDriver,
    timeout: TimeoutPolicy,
    pools: WorkerPoolManager,
}

impl TransportContext {
    /// Resolve `config` into a context.
    ///
    /// The channel kind is resolved here, so an unsupported selection fails
    /// at startup rather than at connect time. The worker pool is not yet
    /// created; the first template demand creates it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnsupportedChannel`] when the configured
    /// channel kind is unavailable on this platform.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let driver = channel::resolve(config.channel_value())?;
        let timeout = TimeoutPolicy::new(config.response_timeout_value());
        Ok(Self {
            config,
            driver,
            timeout,
            pools: WorkerPoolManager::new(),
        })
    }

    /// The resolved channel driver shared by pool and socket creation.
    #[must_use]
    pub const fn driver(&self) -> ChannelDriver { self.driver }

    /// The response-wait policy shared by every template.
    #[must_use]
    pub const fn timeout(&self) -> TimeoutPolicy { self.timeout }

    /// Return the shared worker pool, creating it on first demand.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::PoolStart`] when the pool's runtime fails
    /// to start.
    pub fn worker_pool(&self) -> Result<Arc<WorkerPool>, TransportError> {
        self.pools.get_or_create(
            &self.driver,
            self.config.worker_threads_value(),
            self.config.thread_name_prefix_value(),
        )
    }

    /// Start building a connection template around `assembler`.
    #[must_use]
    pub fn bootstrap<M: Send + 'static>(
        &self,
        assembler: PipelineAssembler<M>,
    ) -> BootstrapBuilder<'_, M> {
        BootstrapBuilder::new(self, assembler)
    }
}

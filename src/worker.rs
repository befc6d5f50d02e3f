//! Shared asynchronous I/O worker pool.
//!
//! One pool services every client connection in the process. It is created
//! lazily on first demand, matched to the resolved channel driver, and then
//! reused for the life of the process. [`WorkerPoolManager`] guards
//! initialization so concurrent first callers construct exactly one pool.

use std::{
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use tokio::{
    runtime::{Builder, Handle, Runtime},
    task::JoinHandle,
};

use crate::{
    channel::{ChannelDriver, EventLoopKind},
    error::TransportError,
};

/// Worker-thread count used when the configured hint is zero.
///
/// Twice the logical CPU count, the usual default for readiness-driven I/O
/// pools.
#[must_use]
pub fn default_worker_threads() -> usize {
    thread::available_parallelism().map_or(2, |count| count.get() * 2)
}

/// A fixed-size pool of I/O worker threads multiplexing all client
/// connections.
///
/// The pool owns a multi-threaded runtime; no thread is ever dedicated to a
/// single connection. Dropping the pool shuts the runtime down in the
/// background without joining its threads, so a pool held until process exit
/// never delays shutdown.
pub struct WorkerPool {
    handle: Handle,
    runtime: Option<Runtime>,
    event_loop: EventLoopKind,
    worker_threads: usize,
    name_prefix: String,
}

impl WorkerPool {
    fn start(
        driver: &ChannelDriver,
        worker_threads: usize,
        name_prefix: &str,
    ) -> Result<Self, TransportError> {
        let threads = if worker_threads == 0 {
            default_worker_threads()
        } else {
            worker_threads
        };
        let prefix = name_prefix.to_owned();
        let thread_prefix = prefix.clone();
        let counter = AtomicUsize::new(0);
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads)
            .thread_name_fn(move || {
                let id = counter.fetch_add(1, Ordering::Relaxed);
                format!("{thread_prefix}-{id}")
            })
            .enable_io()
            .enable_time()
            .build()
            .map_err(TransportError::PoolStart)?;
        tracing::info!(
            event_loop = ?driver.event_loop(),
            worker_threads = threads,
            name_prefix = %prefix,
            "started shared worker pool"
        );
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
            event_loop: driver.event_loop(),
            worker_threads: threads,
            name_prefix: prefix,
        })
    }

    /// Event-loop kind the pool was created for.
    #[must_use]
    pub const fn event_loop(&self) -> EventLoopKind { self.event_loop }

    /// Number of worker threads in the pool.
    #[must_use]
    pub const fn worker_threads(&self) -> usize { self.worker_threads }

    /// Prefix applied to worker thread names.
    #[must_use]
    pub fn name_prefix(&self) -> &str { &self.name_prefix }

    /// Spawn `future` onto the pool.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Worker threads must never hold the process open; detach instead of
        // joining.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Lazily creates and hands out the process-wide [`WorkerPool`].
///
/// The manager is the initialize-once guard around the shared pool: the
/// first successful [`get_or_create`](Self::get_or_create) fixes the pool's
/// parameters and every later call receives the same pool.
pub struct WorkerPoolManager {
    pool: Mutex<Option<Arc<WorkerPool>>>,
}

impl WorkerPoolManager {
    /// Create an empty manager; the pool is constructed on first demand.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pool: Mutex::new(None),
        }
    }

    /// Return the shared pool, creating it on the first call.
    ///
    /// Later calls return the same pool regardless of `worker_threads` and
    /// `name_prefix`; divergent values are logged and discarded. A later
    /// call whose driver requires a different event-loop kind is rejected
    /// rather than handed a pool that cannot service its sockets.
    ///
    /// Concurrent first calls construct exactly one pool.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::EventLoopMismatch`] when the existing pool
    /// runs a different event loop than `driver` requires, and
    /// [`TransportError::PoolStart`] when the runtime fails to start.
    pub fn get_or_create(
        &self,
        driver: &ChannelDriver,
        worker_threads: usize,
        name_prefix: &str,
    ) -> Result<Arc<WorkerPool>, TransportError> {
        let mut slot = self.pool.lock().expect("worker pool guard poisoned");
        if let Some(pool) = slot.as_ref() {
            if pool.event_loop() != driver.event_loop() {
                return Err(TransportError::EventLoopMismatch {
                    pool: pool.event_loop(),
                    driver: driver.event_loop(),
                });
            }
            let divergent_threads = worker_threads != 0 && worker_threads != pool.worker_threads();
            if divergent_threads || name_prefix != pool.name_prefix() {
                tracing::warn!(
                    requested_threads = worker_threads,
                    pool_threads = pool.worker_threads(),
                    requested_prefix = %name_prefix,
                    pool_prefix = %pool.name_prefix(),
                    "worker pool already created; divergent request ignored"
                );
            }
            return Ok(Arc::clone(pool));
        }
        let pool = Arc::new(WorkerPool::start(driver, worker_threads, name_prefix)?);
        *slot = Some(Arc::clone(&pool));
        Ok(pool)
    }
}

impl Default for WorkerPoolManager {
    fn default() -> Self { Self::new() }
}

//! Integration tests for shared worker pool creation.
//!
//! The pool must be created exactly once per context regardless of how many
//! threads demand it, and configuration problems must surface at creation
//! time rather than when a connection is opened.

use std::{sync::Arc, thread};

use hawser::{
    ChannelKind, TransportConfig, TransportContext, TransportError, channel,
    worker::{WorkerPoolManager, default_worker_threads},
};

mod common;
use common::TestResult;

#[test]
fn concurrent_first_demands_create_exactly_one_pool() -> TestResult {
    let context = Arc::new(TransportContext::new(TransportConfig::default())?);

    let mut demands = Vec::new();
    for _ in 0..8 {
        let context = Arc::clone(&context);
        demands.push(thread::spawn(move || context.worker_pool()));
    }
    let pools = demands
        .into_iter()
        .map(|demand| demand.join().expect("join demand thread"))
        .collect::<Result<Vec<_>, _>>()?;

    let first = &pools[0];
    assert!(
        pools.iter().all(|pool| Arc::ptr_eq(first, pool)),
        "every caller's handle must refer to the one shared pool"
    );
    Ok(())
}

#[test]
fn zero_thread_hint_selects_platform_default() -> TestResult {
    let context = TransportContext::new(TransportConfig::default())?;
    let pool = context.worker_pool()?;
    assert_eq!(pool.worker_threads(), default_worker_threads());
    Ok(())
}

#[test]
fn later_divergent_requests_reuse_first_pool() -> TestResult {
    let manager = WorkerPoolManager::new();
    let driver = channel::resolve(ChannelKind::Poll)?;

    let first = manager.get_or_create(&driver, 2, "alpha")?;
    let second = manager.get_or_create(&driver, 7, "beta")?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.worker_threads(), 2, "first writer fixes the thread count");
    assert_eq!(second.name_prefix(), "alpha", "first writer fixes the prefix");
    Ok(())
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[test]
fn mismatched_event_loop_kind_is_rejected() -> TestResult {
    let manager = WorkerPoolManager::new();
    let poll = channel::resolve(ChannelKind::Poll)?;
    let epoll = channel::resolve(ChannelKind::Epoll)?;

    manager.get_or_create(&poll, 1, "worker")?;
    let denied = manager.get_or_create(&epoll, 1, "worker");
    assert!(matches!(
        denied,
        Err(TransportError::EventLoopMismatch { .. })
    ));
    Ok(())
}

#[test]
fn unsupported_channel_kind_fails_at_creation_not_connect() {
    let foreign = if cfg!(any(target_os = "linux", target_os = "android")) {
        ChannelKind::Kqueue
    } else {
        ChannelKind::Epoll
    };
    let denied = TransportContext::new(TransportConfig::default().channel(foreign));
    assert!(matches!(
        denied,
        Err(TransportError::UnsupportedChannel { requested }) if requested == foreign
    ));
}

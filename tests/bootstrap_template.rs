//! Integration tests for connection template behaviour.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use hawser::{BufferPolicy, TransportConfig, TransportContext};
use hawser_testing::{payload_assembler, recording_factory, spawn_echo_server};

mod common;
use common::TestResult;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn template_reports_configured_timeout() -> TestResult {
    let config = TransportConfig::default().response_timeout(Duration::from_millis(1500));
    let context = TransportContext::new(config)?;
    let (factory, _handlers) = recording_factory();
    let template = context
        .bootstrap(payload_assembler())
        .handler_factory(factory)
        .build()?;

    assert_eq!(template.response_timeout(), Duration::from_millis(1500));
    // Repeated reads observe the same fixed value.
    assert_eq!(template.response_timeout(), Duration::from_millis(1500));
    assert_eq!(
        template.timeout_policy().response_wait(),
        Duration::from_millis(1500)
    );
    Ok(())
}

#[test]
fn template_bakes_in_fixed_options() -> TestResult {
    let context = TransportContext::new(TransportConfig::default())?;
    let (factory, _handlers) = recording_factory();
    let template = context
        .bootstrap(payload_assembler())
        .handler_factory(factory)
        .build()?;

    assert!(template.socket_options().nodelay());
    assert!(template.socket_options().keepalive().is_some());
    assert_eq!(template.buffer_policy(), BufferPolicy::Pooled);
    Ok(())
}

#[tokio::test]
async fn connections_from_one_template_are_isolated() -> TestResult {
    common::init_tracing();
    let (addr, server) = spawn_echo_server().await?;
    let context = TransportContext::new(TransportConfig::default())?;
    let (factory, handlers) = recording_factory();
    let template = Arc::new(
        context
            .bootstrap(payload_assembler())
            .handler_factory(factory)
            .build()?,
    );

    let first = template.connect(addr);
    let second = template.connect(addr);
    assert_eq!(first.peer_addr(), addr);

    first.send(Bytes::from_static(b"alpha"))?;
    second.send(Bytes::from_static(b"beta"))?;

    let (handler_first, handler_second) = {
        let registry = handlers.lock().expect("handler registry");
        (Arc::clone(&registry[0]), Arc::clone(&registry[1]))
    };
    tokio::time::timeout(WAIT, handler_first.wait_for_messages(1)).await?;
    tokio::time::timeout(WAIT, handler_second.wait_for_messages(1)).await?;

    assert_eq!(handler_first.messages(), vec![Bytes::from_static(b"alpha")]);
    assert_eq!(handler_second.messages(), vec![Bytes::from_static(b"beta")]);

    server.abort();
    Ok(())
}

#[tokio::test]
async fn template_is_usable_from_many_threads() -> TestResult {
    let (addr, server) = spawn_echo_server().await?;
    let context = TransportContext::new(TransportConfig::default())?;
    let (factory, handlers) = recording_factory();
    let template = Arc::new(
        context
            .bootstrap(payload_assembler())
            .handler_factory(factory)
            .build()?,
    );

    let openers: Vec<_> = (0..4u8)
        .map(|n| {
            let template = Arc::clone(&template);
            std::thread::spawn(move || {
                let connection = template.connect(addr);
                connection
                    .send(Bytes::from(vec![n]))
                    .map(|()| connection)
            })
        })
        .collect();
    let connections: Vec<_> = openers
        .into_iter()
        .map(|opener| opener.join().expect("join opener thread"))
        .collect::<Result<_, _>>()?;

    let watchers: Vec<_> = {
        let registry = handlers.lock().expect("handler registry");
        registry.iter().map(Arc::clone).collect()
    };
    assert_eq!(watchers.len(), 4);
    for watcher in &watchers {
        tokio::time::timeout(WAIT, watcher.wait_for_messages(1)).await?;
        assert_eq!(watcher.messages().len(), 1);
    }

    drop(connections);
    server.abort();
    Ok(())
}

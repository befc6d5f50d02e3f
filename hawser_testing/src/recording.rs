//! A handler that records every callback it receives.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use bytes::Bytes;
use hawser::{Handler, TransportError};
use tokio::sync::Notify;

/// One observed handler callback.
#[derive(Clone, Debug)]
pub enum HandlerEvent {
    /// `on_connect` fired for the given peer.
    Connected(SocketAddr),
    /// `on_message` fired with the given payload.
    Message(Bytes),
    /// `on_disconnect` fired for the given peer.
    Disconnected(SocketAddr),
    /// `on_error` fired; the error is kept as its display form.
    Error(String),
}

/// Handler recording every callback for later assertions.
///
/// Waiters are woken on every recorded event, so tests can await a
/// condition over the observed sequence instead of sleeping.
pub struct RecordingHandler {
    events: Mutex<Vec<HandlerEvent>>,
    changed: Notify,
}

impl RecordingHandler {
    /// Create a handler with an empty event log.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            changed: Notify::new(),
        })
    }

    /// Snapshot of the events observed so far, in callback order.
    #[must_use]
    pub fn events(&self) -> Vec<HandlerEvent> {
        self.events.lock().expect("event log poisoned").clone()
    }

    /// Payloads of the `Message` events observed so far.
    #[must_use]
    pub fn messages(&self) -> Vec<Bytes> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HandlerEvent::Message(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    /// Display forms of the `Error` events observed so far.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HandlerEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Wait until `predicate` holds over the observed event sequence.
    pub async fn wait_until(&self, predicate: impl Fn(&[HandlerEvent]) -> bool) {
        loop {
            let notified = self.changed.notified();
            if predicate(&self.events()) {
                return;
            }
            notified.await;
        }
    }

    /// Wait until at least `count` messages have been observed.
    pub async fn wait_for_messages(&self, count: usize) {
        self.wait_until(|events| {
            events
                .iter()
                .filter(|event| matches!(event, HandlerEvent::Message(_)))
                .count()
                >= count
        })
        .await;
    }

    /// Wait until at least one error has been observed.
    pub async fn wait_for_error(&self) {
        self.wait_until(|events| {
            events
                .iter()
                .any(|event| matches!(event, HandlerEvent::Error(_)))
        })
        .await;
    }

    /// Wait until the disconnect callback has been observed.
    pub async fn wait_for_disconnect(&self) {
        self.wait_until(|events| {
            events
                .iter()
                .any(|event| matches!(event, HandlerEvent::Disconnected(_)))
        })
        .await;
    }

    fn record(&self, event: HandlerEvent) {
        self.events.lock().expect("event log poisoned").push(event);
        self.changed.notify_waiters();
    }
}

#[async_trait]
impl Handler<Bytes> for RecordingHandler {
    async fn on_connect(&self, peer: SocketAddr) { self.record(HandlerEvent::Connected(peer)); }

    async fn on_message(&self, message: Bytes) { self.record(HandlerEvent::Message(message)); }

    async fn on_disconnect(&self, peer: SocketAddr) {
        self.record(HandlerEvent::Disconnected(peer));
    }

    async fn on_error(&self, error: TransportError) {
        self.record(HandlerEvent::Error(error.to_string()));
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscribe orchestration.
//!
//! Receives raw payloads from the transport, decodes them and invokes
//! the registered handler with the record and an opaque caller context.
//! The handler slot is the orchestration layer's only mutable state and
//! sits behind a mutex, so registration from another thread while the
//! delivery loop runs is safe; registration is last-write-wins.
//!
//! Malformed inbound lines are not fatal to the loop: they are logged,
//! counted and skipped.

use crate::decode::{decode, DecodedRecord};
use crate::error::{Error, Result};
use crate::transport::{InboundMessage, QoS, Transport};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often the delivery loop re-checks the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

type Handler<C> = Arc<dyn Fn(&DecodedRecord, &C) + Send + Sync>;

/// Cloneable handle that asks a running delivery loop to exit.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request the loop to exit after the in-flight message.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Delivery counters, updated from the loop, readable from anywhere.
#[derive(Debug, Default)]
struct SubscriberStats {
    records_delivered: AtomicU64,
    lines_rejected: AtomicU64,
}

/// Point-in-time snapshot of the delivery counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Records decoded and handed to the handler.
    pub records_delivered: u64,
    /// Payloads skipped (malformed line or non-UTF-8).
    pub lines_rejected: u64,
}

/// Subscribes to a topic and dispatches decoded records to a handler.
///
/// `C` is an opaque context value passed through to the handler on every
/// invocation: connection handles, channels, whatever the caller needs.
pub struct Subscriber<T: Transport, C = ()> {
    transport: T,
    topic: String,
    qos: QoS,
    context: C,
    handler: Mutex<Option<Handler<C>>>,
    stop: Arc<AtomicBool>,
    stats: SubscriberStats,
}

impl<T: Transport, C> Subscriber<T, C> {
    /// Create a subscriber over a connected transport.
    ///
    /// The topic subscription itself is issued when [`run`](Self::run)
    /// starts.
    pub fn new(transport: T, topic: impl Into<String>, qos: QoS, context: C) -> Self {
        Self {
            transport,
            topic: topic.into(),
            qos,
            context,
            handler: Mutex::new(None),
            stop: Arc::new(AtomicBool::new(false)),
            stats: SubscriberStats::default(),
        }
    }

    /// Register the record handler. Replaces any previous handler
    /// (last-write-wins).
    pub fn set_handler(&self, handler: impl Fn(&DecodedRecord, &C) + Send + Sync + 'static) {
        *self.handler.lock() = Some(Arc::new(handler));
    }

    /// Whether a handler is currently registered.
    pub fn has_handler(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// A handle other threads can use to stop [`run`](Self::run).
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Request the delivery loop to exit.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Subscribe and deliver records until stopped or the transport
    /// fails.
    ///
    /// # Errors
    ///
    /// Fails fast with [`Error::NoHandlerRegistered`] when no handler has
    /// been set; transport failures (including a terminated delivery
    /// loop) propagate to the caller.
    pub fn run(&mut self) -> Result<()> {
        if !self.has_handler() {
            return Err(Error::NoHandlerRegistered);
        }
        self.transport.subscribe(&self.topic, self.qos)?;
        log::info!("subscribed to {}", self.topic);

        while !self.stop.load(Ordering::Relaxed) {
            self.poll(POLL_INTERVAL)?;
        }
        Ok(())
    }

    /// Receive and dispatch at most one message.
    ///
    /// Returns `Ok(true)` if a message was processed (delivered or
    /// skipped), `Ok(false)` if the timeout elapsed with nothing to do.
    pub fn poll(&mut self, timeout: Duration) -> Result<bool> {
        if !self.has_handler() {
            return Err(Error::NoHandlerRegistered);
        }
        let msg = match self.transport.recv(timeout)? {
            Some(msg) => msg,
            None => return Ok(false),
        };
        self.dispatch(&msg);
        Ok(true)
    }

    /// Current delivery counters.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_delivered: self.stats.records_delivered.load(Ordering::Relaxed),
            lines_rejected: self.stats.lines_rejected.load(Ordering::Relaxed),
        }
    }

    /// Disconnect the transport, consuming the subscriber.
    pub fn close(mut self) -> Result<()> {
        self.transport.disconnect()
    }

    fn dispatch(&self, msg: &InboundMessage) {
        let text = match std::str::from_utf8(&msg.payload) {
            Ok(text) => text,
            Err(_) => {
                log::warn!("skipping non-UTF-8 payload on {}", msg.topic);
                self.stats.lines_rejected.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        match decode(text) {
            Ok(record) => {
                let handler = self.handler.lock().clone();
                if let Some(handler) = handler {
                    handler(&record, &self.context);
                    self.stats.records_delivered.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                log::warn!("skipping malformed line on {}: {}", msg.topic, e);
                self.stats.lines_rejected.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn collecting_subscriber(
        transport: MockTransport,
    ) -> (
        Subscriber<MockTransport>,
        Arc<Mutex<Vec<DecodedRecord>>>,
    ) {
        let subscriber = Subscriber::new(transport, "home/#", QoS::AtLeastOnce, ());
        let seen: Arc<Mutex<Vec<DecodedRecord>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        subscriber.set_handler(move |record, _| sink.lock().push(record.clone()));
        (subscriber, seen)
    }

    #[test]
    fn test_run_without_handler_fails_fast() {
        let mut subscriber: Subscriber<MockTransport> =
            Subscriber::new(MockTransport::new(), "home/#", QoS::AtMostOnce, ());

        match subscriber.run() {
            Err(Error::NoHandlerRegistered) => {}
            other => panic!("expected NoHandlerRegistered, got {:?}", other),
        }
        // Nothing was subscribed
        assert!(subscriber.transport.subscriptions.is_empty());
    }

    #[test]
    fn test_run_delivers_decoded_records() {
        let transport = MockTransport::with_inbound(
            "home/temp/bed/",
            &["temp,room=bed value=33 1000", "temp,room=attic value=31 2000"],
        );
        let (mut subscriber, seen) = collecting_subscriber(transport);

        // The mock reports a closed connection once drained; the loop
        // surfaces that as a transport error after delivering everything.
        match subscriber.run() {
            Err(Error::Transport(_)) => {}
            other => panic!("expected Transport error at drain, got {:?}", other),
        }

        let records = seen.lock();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].measurement, "temp");
        assert_eq!(records[0].tags.get("room"), Some("bed"));
        assert_eq!(records[0].field("value"), Some("33"));
        assert_eq!(records[1].timestamp_ns, 2000);

        assert_eq!(subscriber.stats().records_delivered, 2);
        assert_eq!(
            subscriber.transport.subscriptions,
            vec![("home/#".to_string(), QoS::AtLeastOnce)]
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped_not_fatal() {
        let transport = MockTransport::with_inbound(
            "home/temp/bed/",
            &["only-two segments", "temp value=1 1000"],
        );
        let (mut subscriber, seen) = collecting_subscriber(transport);

        let _ = subscriber.run();

        let records = seen.lock();
        assert_eq!(records.len(), 1, "good line after bad one still delivers");
        assert_eq!(records[0].field("value"), Some("1"));

        let stats = subscriber.stats();
        assert_eq!(stats.records_delivered, 1);
        assert_eq!(stats.lines_rejected, 1);
    }

    #[test]
    fn test_set_handler_is_last_write_wins() {
        let mut transport = MockTransport::with_inbound("t", &["m value=1 1"]);
        transport.close_when_drained = false;
        let subscriber: Subscriber<MockTransport> =
            Subscriber::new(transport, "t", QoS::AtMostOnce, ());

        let first_calls = Arc::new(AtomicU64::new(0));
        let second_calls = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&first_calls);
        subscriber.set_handler(move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let counter = Arc::clone(&second_calls);
        subscriber.set_handler(move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let mut subscriber = subscriber;
        assert!(subscriber.poll(Duration::from_millis(10)).expect("poll"));
        assert!(!subscriber.poll(Duration::from_millis(10)).expect("poll"));

        assert_eq!(first_calls.load(Ordering::Relaxed), 0);
        assert_eq!(second_calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_context_reaches_handler() {
        let mut transport = MockTransport::with_inbound("t", &["m value=1 1"]);
        transport.close_when_drained = false;
        let subscriber: Subscriber<MockTransport, String> =
            Subscriber::new(transport, "t", QoS::AtMostOnce, "greenhouse-7".to_string());

        let seen_ctx = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&seen_ctx);
        subscriber.set_handler(move |_, ctx: &String| {
            *sink.lock() = ctx.clone();
        });

        let mut subscriber = subscriber;
        subscriber.poll(Duration::from_millis(10)).expect("poll");

        assert_eq!(*seen_ctx.lock(), "greenhouse-7");
    }

    #[test]
    fn test_stop_handle_ends_run() {
        let mut transport = MockTransport::new();
        transport.close_when_drained = false;
        let (mut subscriber, _seen) = collecting_subscriber(transport);

        let handle = subscriber.stop_handle();
        handle.stop();

        // Stop requested before entry: run subscribes, then exits cleanly
        subscriber.run().expect("run");
        assert_eq!(subscriber.transport.subscriptions.len(), 1);
    }

    #[test]
    fn test_close_disconnects_transport() {
        let (subscriber, _seen) = collecting_subscriber(MockTransport::new());
        subscriber.close().expect("close");
    }
}

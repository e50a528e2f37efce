// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MQTT transport backed by `rumqttc`'s synchronous client.
//!
//! `connect` spawns the network event thread (the broker's delivery
//! context); inbound publishes are forwarded into a channel drained by
//! `recv`, so decode and handler invocation never run on the network
//! thread. `disconnect` stops and joins the thread; `Drop` does the same
//! on abnormal exit paths.
//!
//! Retry and reconnect policy belongs to `rumqttc`: after the initial
//! handshake, connection errors are logged and the event loop keeps
//! polling, which re-establishes the session.

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::transport::{InboundMessage, QoS, Transport};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use rumqttc::{Client, Event, MqttOptions, Packet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Broker keep-alive interval when none is configured.
const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// How long `connect` waits for the broker handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request queue capacity handed to the rumqttc client.
const REQUEST_CAP: usize = 64;

/// Backoff between event-loop polls after a post-handshake error.
const RECONNECT_PAUSE: Duration = Duration::from_millis(200);

/// Synchronous MQTT transport.
pub struct MqttTransport {
    client: Client,
    incoming: Receiver<InboundMessage>,
    stopping: Arc<AtomicBool>,
    event_thread: Option<JoinHandle<()>>,
}

impl MqttTransport {
    /// Connect to a broker and start the network event thread.
    ///
    /// Blocks until the broker acknowledges the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the handshake fails or does not
    /// complete within the connect timeout.
    pub fn connect(host: &str, port: u16, client_id: &str) -> Result<Self> {
        Self::connect_with_keep_alive(host, port, client_id, DEFAULT_KEEP_ALIVE)
    }

    /// Connect using broker settings from a [`BridgeConfig`].
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let broker = &config.broker;
        Self::connect_with_keep_alive(
            &broker.host,
            broker.port,
            broker.client_id.as_deref().unwrap_or("lineflux"),
            Duration::from_secs(broker.keep_alive_secs.unwrap_or(60)),
        )
    }

    /// Connect with an explicit keep-alive interval.
    pub fn connect_with_keep_alive(
        host: &str,
        port: u16,
        client_id: &str,
        keep_alive: Duration,
    ) -> Result<Self> {
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(keep_alive);

        let (client, mut connection) = Client::new(options, REQUEST_CAP);
        let (incoming_tx, incoming_rx) = unbounded();
        let (status_tx, status_rx) = bounded(1);
        let stopping = Arc::new(AtomicBool::new(false));

        let thread_stopping = Arc::clone(&stopping);
        let event_thread = thread::Builder::new()
            .name("lineflux-mqtt".to_string())
            .spawn(move || {
                event_loop(&mut connection, &incoming_tx, &status_tx, &thread_stopping);
            })?;

        let mut transport = Self {
            client,
            incoming: incoming_rx,
            stopping,
            event_thread: Some(event_thread),
        };

        match status_rx.recv_timeout(CONNECT_TIMEOUT) {
            Ok(Ok(())) => Ok(transport),
            Ok(Err(cause)) => {
                transport.shutdown();
                Err(Error::Transport(format!(
                    "connect to {}:{} failed: {}",
                    host, port, cause
                )))
            }
            Err(_) => {
                transport.shutdown();
                Err(Error::Transport(format!(
                    "connect to {}:{} timed out",
                    host, port
                )))
            }
        }
    }

    /// Stop the event loop and join the network thread.
    fn shutdown(&mut self) {
        self.stopping.store(true, Ordering::Relaxed);
        if let Err(e) = self.client.disconnect() {
            log::debug!("mqtt disconnect request failed: {}", e);
        }
        if let Some(handle) = self.event_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Transport for MqttTransport {
    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<()> {
        self.client
            .publish(topic, to_mqtt_qos(qos), false, payload)
            .map_err(|e| Error::Transport(e.to_string()))
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<()> {
        self.client
            .subscribe(topic, to_mqtt_qos(qos))
            .map_err(|e| Error::Transport(e.to_string()))
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<InboundMessage>> {
        match self.incoming.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(msg)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::Transport("mqtt event loop terminated".to_string()))
            }
        }
    }

    fn disconnect(&mut self) -> Result<()> {
        self.shutdown();
        log::info!("disconnected from broker");
        Ok(())
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if self.event_thread.is_some() {
            self.shutdown();
        }
    }
}

/// Drive the rumqttc connection, forwarding inbound publishes.
///
/// Sends exactly one handshake outcome on `status`: `Ok` on the first
/// ConnAck, `Err` if the connection fails before one arrives.
fn event_loop(
    connection: &mut rumqttc::Connection,
    incoming: &Sender<InboundMessage>,
    status: &Sender<std::result::Result<(), String>>,
    stopping: &AtomicBool,
) {
    let mut session_up = false;

    for event in connection.iter() {
        if stopping.load(Ordering::Relaxed) {
            break;
        }
        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                if !session_up {
                    session_up = true;
                    let _ = status.send(Ok(()));
                }
                log::info!("mqtt session established");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let msg = InboundMessage {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                };
                if incoming.send(msg).is_err() {
                    // Receiver dropped: transport is gone
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                if !session_up {
                    let _ = status.send(Err(e.to_string()));
                    break;
                }
                log::warn!("mqtt connection error: {}; retrying", e);
                thread::sleep(RECONNECT_PAUSE);
            }
        }
    }
}

fn to_mqtt_qos(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qos_maps_to_rumqttc_levels() {
        assert_eq!(to_mqtt_qos(QoS::AtMostOnce), rumqttc::QoS::AtMostOnce);
        assert_eq!(to_mqtt_qos(QoS::AtLeastOnce), rumqttc::QoS::AtLeastOnce);
        assert_eq!(to_mqtt_qos(QoS::ExactlyOnce), rumqttc::QoS::ExactlyOnce);
    }

    #[test]
    fn test_connect_refused_surfaces_transport_error() {
        // Port 1 on localhost is not a broker; the handshake must fail
        // with a typed error instead of hanging or exiting.
        match MqttTransport::connect("127.0.0.1", 1, "lineflux-test") {
            Err(Error::Transport(msg)) => assert!(msg.contains("127.0.0.1")),
            Ok(_) => panic!("connect to a closed port should not succeed"),
            Err(other) => panic!("expected Transport error, got {:?}", other),
        }
    }
}

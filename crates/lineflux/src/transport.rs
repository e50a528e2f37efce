// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Broker transport boundary.
//!
//! The broker client is an external collaborator behind the [`Transport`]
//! trait: connection management, retry and reconnect all live on the
//! other side of this seam. The crate ships one implementation,
//! [`MqttTransport`](crate::MqttTransport), behind the default `mqtt`
//! feature.

use crate::error::Result;
use std::time::Duration;

/// Message delivery guarantee level, owned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    /// Fire-and-forget (level 0).
    AtMostOnce,
    /// Acknowledged delivery, possible duplicates (level 1).
    AtLeastOnce,
    /// Exactly-once handshake (level 2).
    ExactlyOnce,
}

impl QoS {
    /// Map a numeric QoS level (0, 1, 2) to the enum.
    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            0 => Some(QoS::AtMostOnce),
            1 => Some(QoS::AtLeastOnce),
            2 => Some(QoS::ExactlyOnce),
            _ => None,
        }
    }

    /// The numeric wire level.
    pub fn as_u8(self) -> u8 {
        match self {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }
}

impl Default for QoS {
    /// Exactly-once, matching the publisher client's historical default.
    fn default() -> Self {
        QoS::ExactlyOnce
    }
}

/// A message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message arrived on.
    pub topic: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

/// Pub/sub transport seam.
///
/// Implementations are connected on construction and release their
/// network resources on [`disconnect`](Transport::disconnect), including
/// after errors, so abnormal exit paths do not leak event threads.
pub trait Transport: Send {
    /// Publish a payload to a topic at the given QoS.
    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<()>;

    /// Subscribe to a topic at the given QoS.
    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<()>;

    /// Receive the next inbound message, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` when no message arrived within the timeout.
    /// A broken or terminated delivery loop is an error.
    fn recv(&mut self, timeout: Duration) -> Result<Option<InboundMessage>>;

    /// Disconnect from the broker and stop the delivery loop.
    fn disconnect(&mut self) -> Result<()>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qos_numeric_mapping() {
        assert_eq!(QoS::from_u8(0), Some(QoS::AtMostOnce));
        assert_eq!(QoS::from_u8(1), Some(QoS::AtLeastOnce));
        assert_eq!(QoS::from_u8(2), Some(QoS::ExactlyOnce));
        assert_eq!(QoS::from_u8(3), None);

        assert_eq!(QoS::AtMostOnce.as_u8(), 0);
        assert_eq!(QoS::AtLeastOnce.as_u8(), 1);
        assert_eq!(QoS::ExactlyOnce.as_u8(), 2);
    }

    #[test]
    fn test_qos_default_is_exactly_once() {
        assert_eq!(QoS::default(), QoS::ExactlyOnce);
    }
}

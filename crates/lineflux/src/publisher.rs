// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish orchestration.
//!
//! Thin pipeline over the codec parts: normalize the timestamp, derive
//! the destination table and topic, encode the line, hand it to the
//! transport. There is no internal buffering: each call is synchronous
//! with respect to line construction, and transport delivery semantics
//! (QoS, retry) stay with the transport.

use crate::error::Result;
use crate::line;
use crate::measurement::{FieldSet, Measurement, TagSet};
use crate::routing::{self, TopicPolicy};
use crate::timestamp::{self, TimeSpec};
use crate::transport::{QoS, Transport};

/// Publishes measurements as Line Protocol payloads.
pub struct Publisher<T: Transport> {
    transport: T,
    qos: QoS,
    policy: TopicPolicy,
}

impl<T: Transport> Publisher<T> {
    /// Create a publisher over a connected transport.
    pub fn new(transport: T, qos: QoS, policy: TopicPolicy) -> Self {
        Self {
            transport,
            qos,
            policy,
        }
    }

    /// Build one measurement and publish it.
    ///
    /// The destination table (measurement name) defaults to the first
    /// tag's value when `dest_table` is `None`; the publish topic is
    /// derived from `base_topic` per the configured [`TopicPolicy`].
    ///
    /// # Errors
    ///
    /// Propagates [`Error::InvalidTimestamp`](crate::Error::InvalidTimestamp),
    /// [`Error::EmptyTagSet`](crate::Error::EmptyTagSet),
    /// [`Error::EmptyFieldSet`](crate::Error::EmptyFieldSet) and any
    /// transport failure.
    pub fn publish(
        &mut self,
        base_topic: &str,
        tags: &TagSet,
        fields: &FieldSet,
        timestamp: impl Into<TimeSpec>,
        dest_table: Option<&str>,
    ) -> Result<()> {
        let timestamp_ns = timestamp::normalize(timestamp)?;
        let table = routing::destination_table(dest_table, tags)?;
        let topic = routing::derive_topic(base_topic, tags, self.policy);

        let measurement = Measurement {
            name: table,
            tags: tags.clone(),
            fields: fields.clone(),
            timestamp_ns,
        };
        let payload = line::encode(&measurement)?;

        log::debug!("publish {} <- {}", topic, payload);
        self.transport.publish(&topic, payload.as_bytes(), self.qos)
    }

    /// Disconnect the transport, consuming the publisher.
    pub fn close(mut self) -> Result<()> {
        self.transport.disconnect()
    }

    /// The QoS level used for publishes.
    pub fn qos(&self) -> QoS {
        self.qos
    }

    /// The topic derivation policy.
    pub fn topic_policy(&self) -> TopicPolicy {
        self.policy
    }
}

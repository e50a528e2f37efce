// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # lineflux - InfluxDB Line Protocol over MQTT
//!
//! A minimal bridge between an MQTT broker and the InfluxDB Line
//! Protocol text encoding. Producers hand over a measurement name, tags,
//! fields and a timestamp; consumers get decoded records back through a
//! callback.
//!
//! ```text
//! Publisher:  tags/fields/timestamp --> derive table+topic --> encode --> publish
//! Subscriber: deliver --> decode --> DecodedRecord --> user handler
//! ```
//!
//! This crate provides:
//! - Line Protocol encoding with escape handling and typed field values
//! - Escape-aware decoding back into structured records
//! - Timestamp normalization (epoch floats, calendar strings, `chrono`
//!   datetimes) to nanosecond integers, UTC-only
//! - Destination table and topic derivation from tag sets
//! - Thin publish/subscribe orchestration over a [`Transport`] seam,
//!   with an MQTT implementation behind the default `mqtt` feature
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lineflux::{FieldSet, MqttTransport, Publisher, QoS, TagSet, TopicPolicy};
//!
//! fn main() -> lineflux::Result<()> {
//!     let transport = MqttTransport::connect("localhost", 1883, "sensor-1")?;
//!     let mut publisher = Publisher::new(transport, QoS::AtLeastOnce, TopicPolicy::TagPath);
//!
//!     let mut tags = TagSet::new();
//!     tags.insert("measurement_type", "temp");
//!     tags.insert("room", "bed");
//!
//!     let mut fields = FieldSet::new();
//!     fields.insert("temp", 33.0);
//!
//!     // Publishes "temp,measurement_type=temp,room=bed temp=33 <ns>"
//!     // to topic "home/temp/bed/"
//!     publisher.publish("home", &tags, &fields, 1656086785.0, None)?;
//!     publisher.close()
//! }
//! ```
//!
//! # Wire format
//!
//! ```text
//! measurement[,tag=value]* field=value[,field=value]* timestamp_ns
//! ```
//!
//! Three segments separated by exactly two unescaped spaces. This shape
//! is the binding compatibility surface: consumers expecting it must
//! keep receiving it unchanged.

/// YAML bridge configuration.
pub mod config;
/// Line Protocol decoding into structured records.
pub mod decode;
/// Crate-wide error type and result alias.
pub mod error;
/// Line Protocol encoding and escape rules.
pub mod line;
/// Measurement data model (tag sets, field sets, field values).
pub mod measurement;
/// MQTT transport backed by rumqttc (feature `mqtt`).
#[cfg(feature = "mqtt")]
pub mod mqtt;
/// Publish orchestration.
pub mod publisher;
/// Destination table and topic derivation.
pub mod routing;
/// Subscribe orchestration and handler dispatch.
pub mod subscriber;
/// Timestamp normalization to nanosecond epoch integers.
pub mod timestamp;
/// Broker transport seam (QoS, trait, inbound messages).
pub mod transport;

pub use config::{BridgeConfig, BrokerConfig};
pub use decode::{decode, DecodedRecord};
pub use error::{Error, Result};
pub use line::encode;
pub use measurement::{FieldSet, FieldValue, Measurement, TagSet};
#[cfg(feature = "mqtt")]
pub use mqtt::MqttTransport;
pub use publisher::Publisher;
pub use routing::{derive_topic, destination_table, TopicPolicy};
pub use subscriber::{StatsSnapshot, StopHandle, Subscriber};
pub use timestamp::{normalize, TimeSpec};
pub use transport::{InboundMessage, QoS, Transport};

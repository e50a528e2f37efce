// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML configuration for the bridge.

use crate::error::Result;
use crate::routing::TopicPolicy;
use crate::transport::QoS;
use serde::Deserialize;
use std::path::Path;

/// Top-level bridge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Broker connection settings.
    pub broker: BrokerConfig,
    /// Base publish/subscribe topic.
    pub base_topic: String,
    /// Numeric QoS level (0, 1, 2). None = 2.
    pub qos: Option<u8>,
    /// Topic derivation policy. None = tag-path.
    pub topic_policy: Option<TopicPolicy>,
}

/// Broker connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Broker host name or address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// MQTT client identifier. None = "lineflux".
    pub client_id: Option<String>,
    /// Keep-alive interval in seconds. None = 60.
    pub keep_alive_secs: Option<u64>,
}

impl BridgeConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: BridgeConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// The configured QoS as a typed level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQos`](crate::Error::InvalidQos) for levels
    /// outside 0..=2.
    pub fn qos(&self) -> Result<QoS> {
        let level = self.qos.unwrap_or(2);
        QoS::from_u8(level).ok_or(crate::error::Error::InvalidQos(level))
    }

    /// The configured topic policy, defaulting to tag-path.
    pub fn topic_policy(&self) -> TopicPolicy {
        self.topic_policy.unwrap_or_default()
    }
}

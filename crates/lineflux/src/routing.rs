// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Destination table and publish topic derivation.
//!
//! When a caller omits the destination table, it defaults to the value of
//! the first tag in insertion order. Topic derivation is a single code
//! path selected by [`TopicPolicy`].

use crate::error::{Error, Result};
use crate::measurement::TagSet;
use serde::Deserialize;

/// How the publish topic is derived from the base topic and tag set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopicPolicy {
    /// Publish to the base topic unchanged.
    Fixed,
    /// Append every tag value as a path segment with a trailing separator:
    /// `base/value1/value2/.../`. Lets subscribers filter by a tag-value
    /// prefix.
    #[default]
    TagPath,
}

/// Derive the destination table name.
///
/// An explicit table name wins; otherwise the **value** of the first tag
/// in insertion order is used.
///
/// # Errors
///
/// Returns [`Error::EmptyTagSet`] when no explicit table is given and the
/// tag set is empty.
pub fn destination_table(explicit: Option<&str>, tags: &TagSet) -> Result<String> {
    match explicit {
        Some(table) if !table.is_empty() => Ok(table.to_string()),
        _ => tags
            .first()
            .map(|(_, value)| value.to_string())
            .ok_or(Error::EmptyTagSet),
    }
}

/// Derive the publish topic from a base topic and tag set.
///
/// With [`TopicPolicy::TagPath`] and a non-empty tag set, tag values are
/// appended as path segments with a trailing `/`; an empty tag set leaves
/// the base topic unchanged (there are no segments to append).
pub fn derive_topic(base: &str, tags: &TagSet, policy: TopicPolicy) -> String {
    match policy {
        TopicPolicy::Fixed => base.to_string(),
        TopicPolicy::TagPath => {
            if tags.is_empty() {
                return base.to_string();
            }
            let mut topic = base.trim_end_matches('/').to_string();
            for (_, value) in tags.iter() {
                topic.push('/');
                topic.push_str(value);
            }
            topic.push('/');
            topic
        }
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Line Protocol encoder.
//!
//! Wire format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! Exactly two unescaped spaces separate the three segments. Tags are
//! emitted in insertion order, not sorted; downstream consumers that key
//! on topic or line text see a deterministic ordering.
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use crate::error::{Error, Result};
use crate::measurement::Measurement;

/// Encode a measurement as a single Line Protocol string.
///
/// Measurement names, tag keys/values and field keys are escaped per the
/// Line Protocol rules; string field values are quoted by
/// [`FieldValue::to_line_protocol`](crate::FieldValue::to_line_protocol).
///
/// # Errors
///
/// Returns [`Error::EmptyFieldSet`] if the measurement has no fields;
/// the wire format is invalid without at least one.
pub fn encode(m: &Measurement) -> Result<String> {
    if m.fields.is_empty() {
        return Err(Error::EmptyFieldSet);
    }

    let mut line = escape_measurement(&m.name);

    for (key, value) in m.tags.iter() {
        line.push(',');
        line.push_str(&escape_tag_key(key));
        line.push('=');
        line.push_str(&escape_tag_value(value));
    }

    line.push(' ');

    for (i, (key, value)) in m.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_field_key(key));
        line.push('=');
        line.push_str(&value.to_line_protocol());
    }

    line.push(' ');
    line.push_str(&m.timestamp_ns.to_string());

    Ok(line)
}

/// Escape a measurement name.
/// Spaces and commas must be escaped with backslash.
pub(crate) fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Escape a tag key.
/// Commas, equals signs, and spaces must be escaped.
pub(crate) fn escape_tag_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

/// Escape a tag value.
/// Commas, equals signs, and spaces must be escaped.
pub(crate) fn escape_tag_value(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

/// Escape a field key.
/// Commas, equals signs, and spaces must be escaped.
pub(crate) fn escape_field_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

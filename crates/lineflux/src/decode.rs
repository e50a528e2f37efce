// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Line Protocol decoder.
//!
//! Splits a raw payload into measurement+tags, fields and timestamp and
//! produces a [`DecodedRecord`]. Splitting honors backslash escapes and
//! double-quoted field values, so lines produced by [`crate::line::encode`]
//! round-trip; plain unescaped lines decode identically to a naive
//! single-space split.
//!
//! Field values keep their raw textual form (`42i`, `"hi"`, `3.5`); the
//! decoder does not re-infer types.

use crate::error::{Error, Result};
use crate::measurement::TagSet;

/// A decoded Line Protocol record.
///
/// Created per inbound message, handed to the subscriber's handler, then
/// discarded; nothing is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    /// Measurement name (unescaped).
    pub measurement: String,
    /// Tag set, unescaped, in wire order.
    pub tags: TagSet,
    /// Field keys (unescaped) to raw textual values, in wire order.
    pub fields: Vec<(String, String)>,
    /// Nanoseconds since the Unix epoch.
    pub timestamp_ns: i64,
}

impl DecodedRecord {
    /// Look up a field's raw textual value by key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Decode a raw Line Protocol payload.
///
/// Surrounding whitespace is trimmed, then the payload must split into
/// exactly three segments on unescaped spaces: `head`, `fields`,
/// `timestamp`. Tag and field tokens without an unescaped `=` are
/// silently skipped.
///
/// # Errors
///
/// Returns [`Error::MalformedLine`] if the segment count is not three or
/// the trailing timestamp is not a base-10 integer.
pub fn decode(raw: &str) -> Result<DecodedRecord> {
    let trimmed = raw.trim();
    let segments = split_unescaped(trimmed, ' ');
    if segments.len() != 3 {
        return Err(Error::MalformedLine(format!(
            "expected three space-separated segments, found {}",
            segments.len()
        )));
    }

    let (measurement, tags) = parse_head(&segments[0]);
    let fields = parse_fields(&segments[1]);
    let timestamp_ns: i64 = segments[2].parse().map_err(|_| {
        Error::MalformedLine(format!("timestamp '{}' is not an integer", segments[2]))
    })?;

    Ok(DecodedRecord {
        measurement,
        tags,
        fields,
        timestamp_ns,
    })
}

/// Split the head segment into measurement name and tag set.
fn parse_head(head: &str) -> (String, TagSet) {
    let mut tokens = split_unescaped(head, ',').into_iter();
    let measurement = tokens.next().map(|t| unescape(&t)).unwrap_or_default();

    let mut tags = TagSet::new();
    for token in tokens {
        if let Some((key, value)) = split_once_unescaped(&token, '=') {
            tags.insert(unescape(key), unescape(value));
        }
        // Tokens without '=' are skipped
    }
    (measurement, tags)
}

/// Split the fields segment into (key, raw value) pairs.
///
/// The parsed mapping is returned to the caller and attached to the
/// record; keys are unescaped, values keep their wire text.
fn parse_fields(segment: &str) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for token in split_unescaped(segment, ',') {
        if let Some((key, value)) = split_once_unescaped(&token, '=') {
            fields.push((unescape(key), value.to_string()));
        }
    }
    fields
}

/// Split on every unescaped, unquoted occurrence of `delim`.
///
/// Backslash-escaped characters and characters inside double quotes do
/// not delimit. Tokens retain their raw text (escapes intact).
fn split_unescaped(s: &str, delim: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    let mut in_quotes = false;

    for c in s.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c == delim && !in_quotes => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    if escaped {
        // Trailing lone backslash
        current.push('\\');
    }
    parts.push(current);
    parts
}

/// Split on the first unescaped `delim`, or `None` if there is none.
fn split_once_unescaped(s: &str, delim: char) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == delim {
            return Some((&s[..i], &s[i + c.len_utf8()..]));
        }
    }
    None
}

/// Remove one level of backslash escaping.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;
    for c in s.chars() {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            out.push(c);
        }
    }
    if escaped {
        out.push('\\');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::encode;
    use crate::measurement::Measurement;

    #[test]
    fn test_decode_basic_line() {
        let record = decode("cpu,host=a,region=us value=1 1000").expect("decode");

        assert_eq!(record.measurement, "cpu");
        assert_eq!(record.tags.get("host"), Some("a"));
        assert_eq!(record.tags.get("region"), Some("us"));
        // Regression: the parsed field map must reach the record
        assert!(!record.fields.is_empty());
        assert_eq!(record.field("value"), Some("1"));
        assert_eq!(record.timestamp_ns, 1000);
    }

    #[test]
    fn test_decode_trims_surrounding_whitespace() {
        let record = decode("  cpu value=1 1000\n").expect("decode");
        assert_eq!(record.measurement, "cpu");
        assert_eq!(record.timestamp_ns, 1000);
    }

    #[test]
    fn test_decode_two_segments_is_malformed() {
        match decode("cpu,host=a value=1") {
            Err(Error::MalformedLine(msg)) => assert!(msg.contains("2")),
            other => panic!("expected MalformedLine, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_four_segments_is_malformed() {
        assert!(matches!(
            decode("cpu value=1 1000 trailing"),
            Err(Error::MalformedLine(_))
        ));
    }

    #[test]
    fn test_decode_non_integer_timestamp_is_malformed() {
        match decode("cpu value=1 tomorrow") {
            Err(Error::MalformedLine(msg)) => assert!(msg.contains("tomorrow")),
            other => panic!("expected MalformedLine, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_skips_tokens_without_equals() {
        let record = decode("cpu,host=a,oddtoken value=1,stray 1000").expect("decode");

        assert_eq!(record.tags.len(), 1);
        assert_eq!(record.tags.get("host"), Some("a"));
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.field("value"), Some("1"));
    }

    #[test]
    fn test_decode_keeps_raw_field_text() {
        let record = decode("m count=42i,msg=\"hi\",ratio=0.5 7").expect("decode");

        assert_eq!(record.field("count"), Some("42i"));
        assert_eq!(record.field("msg"), Some("\"hi\""));
        assert_eq!(record.field("ratio"), Some("0.5"));
    }

    #[test]
    fn test_decode_negative_timestamp() {
        let record = decode("m f=1i -42").expect("decode");
        assert_eq!(record.timestamp_ns, -42);
    }

    #[test]
    fn test_decode_escaped_delimiters() {
        let record =
            decode("my\\ measurement,tag\\ key=tag\\,value field\\=key=1 99").expect("decode");

        assert_eq!(record.measurement, "my measurement");
        assert_eq!(record.tags.get("tag key"), Some("tag,value"));
        assert_eq!(record.field("field=key"), Some("1"));
        assert_eq!(record.timestamp_ns, 99);
    }

    #[test]
    fn test_decode_quoted_field_value_with_spaces() {
        let record = decode("m msg=\"hello world, again\" 5").expect("decode");
        assert_eq!(record.field("msg"), Some("\"hello world, again\""));
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let mut m = Measurement::new("net traffic", 1_656_086_785_126_144_000);
        m.tags.insert("iface", "eth0");
        m.tags.insert("site", "lab,west");
        m.fields.insert("rx", 1024i64);
        m.fields.insert("status", "up \"main\"");
        m.fields.insert("load", 0.75);

        let line = encode(&m).expect("encode");
        let record = decode(&line).expect("decode");

        assert_eq!(record.measurement, m.name);
        let tags: Vec<(&str, &str)> = record.tags.iter().collect();
        assert_eq!(tags, vec![("iface", "eth0"), ("site", "lab,west")]);
        assert_eq!(record.field("rx"), Some("1024i"));
        assert_eq!(record.field("status"), Some("\"up \\\"main\\\"\""));
        assert_eq!(record.field("load"), Some("0.75"));
        assert_eq!(record.timestamp_ns, m.timestamp_ns);
    }
}

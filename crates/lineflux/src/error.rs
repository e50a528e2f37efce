// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.
//!
//! All failure modes are deterministic and locally classifiable; the
//! library returns them to the caller and never terminates the process.

use std::fmt;

/// Errors returned by lineflux operations.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Wire format errors
    // ========================================================================
    /// Timestamp input could not be normalized to epoch nanoseconds.
    InvalidTimestamp(String),
    /// Encode attempted with no fields (the wire format requires at least one).
    EmptyFieldSet,
    /// Decode input does not match the three-segment line shape, or its
    /// timestamp suffix is not a base-10 integer.
    MalformedLine(String),

    // ========================================================================
    // Routing errors
    // ========================================================================
    /// Destination table derivation needs a tag but none was given.
    EmptyTagSet,

    // ========================================================================
    // Orchestration errors
    // ========================================================================
    /// Subscriber loop started before a handler was registered.
    NoHandlerRegistered,

    // ========================================================================
    // Transport errors
    // ========================================================================
    /// Broker transport operation failed (connect, publish, delivery loop).
    Transport(String),

    // ========================================================================
    // Configuration errors
    // ========================================================================
    /// QoS level outside 0..=2.
    InvalidQos(u8),
    /// YAML parsing failed.
    Yaml(serde_yaml::Error),
    /// File I/O failed.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidTimestamp(input) => {
                write!(
                    f,
                    "'{}' is not a valid timestamp (expected epoch seconds or \
                     'YYYY-MM-DD HH:MM:SS[.ffffff]')",
                    input
                )
            }
            Error::EmptyFieldSet => {
                write!(f, "measurement has no fields (at least one is required)")
            }
            Error::MalformedLine(msg) => write!(f, "malformed line: {}", msg),
            Error::EmptyTagSet => {
                write!(f, "no destination table given and tag set is empty")
            }
            Error::NoHandlerRegistered => {
                write!(f, "subscriber loop started without a message handler")
            }
            Error::Transport(msg) => write!(f, "transport error: {}", msg),
            Error::InvalidQos(level) => {
                write!(f, "invalid QoS level: {} (must be 0, 1 or 2)", level)
            }
            Error::Yaml(e) => write!(f, "YAML parse error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Yaml(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Yaml(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages_name_the_failure() {
        assert!(Error::EmptyFieldSet.to_string().contains("no fields"));
        assert!(Error::EmptyTagSet.to_string().contains("tag set is empty"));
        assert!(Error::InvalidQos(7).to_string().contains("7"));
        assert!(Error::InvalidTimestamp("nope".to_string())
            .to_string()
            .contains("nope"));
        assert!(Error::MalformedLine("two segments".to_string())
            .to_string()
            .contains("two segments"));
    }

    #[test]
    fn test_source_forwards_wrapped_errors() {
        use std::error::Error as _;

        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(io.source().is_some());
        assert!(Error::EmptyFieldSet.source().is_none());
    }
}

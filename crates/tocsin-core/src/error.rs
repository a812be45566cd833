// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tocsin incident bot.

use thiserror::Error;

/// The primary error type used across all Tocsin traits and core operations.
#[derive(Debug, Error)]
pub enum TocsinError {
    /// Configuration errors (invalid TOML, missing required fields, bad ids).
    #[error("configuration error: {0}")]
    Config(String),

    /// Snapshot persistence errors (I/O, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (send failure, closed inbound queue).
    #[error("chat error: {message}")]
    Chat {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Issue tracker errors.
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// A record would violate one of its invariants.
    #[error("validation error: {0}")]
    Validation(String),

    /// A record referenced by id does not exist.
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TocsinError {
    /// Wraps any I/O or serialization failure as a storage error.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage { source: err.into() }
    }

    /// Returns true if this error came from the chat transport.
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::Chat { .. })
    }
}

/// Typed failures reported by an issue tracker.
///
/// The incident workflow only distinguishes success from failure, but the
/// variants are kept distinct so logs say what actually went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// Ticket creation is disabled (no tracker configured).
    #[error("tracker is not configured")]
    Disabled,

    /// The tracker could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Credentials were rejected (HTTP 401).
    #[error("authentication rejected")]
    Authentication,

    /// Credentials are valid but lack permission (HTTP 403).
    #[error("permission denied: {0}")]
    Permission(String),

    /// The referenced issue or resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The tracker rejected the submitted fields (HTTP 400).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Too many requests (HTTP 429).
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-success status.
    #[error("unexpected status {status}: {body}")]
    Unexpected { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl TrackerError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout | Self::RateLimited { .. } => true,
            Self::Unexpected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_error_converts_into_tocsin_error() {
        let err: TocsinError = TrackerError::Authentication.into();
        assert!(matches!(err, TocsinError::Tracker(TrackerError::Authentication)));
        assert_eq!(err.to_string(), "tracker error: authentication rejected");
    }

    #[test]
    fn transient_classification() {
        assert!(TrackerError::Timeout.is_transient());
        assert!(TrackerError::RateLimited { retry_after_secs: Some(5) }.is_transient());
        assert!(
            TrackerError::Unexpected {
                status: 503,
                body: String::new()
            }
            .is_transient()
        );
        assert!(!TrackerError::Validation("summary".into()).is_transient());
        assert!(!TrackerError::Disabled.is_transient());
    }

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = TocsinError::NotFound {
            kind: "alarm",
            id: "FA-1".into(),
        };
        assert_eq!(err.to_string(), "alarm `FA-1` not found");
    }
}

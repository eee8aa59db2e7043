// src/error.rs

//! Unified error handling for the harvester.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Unified application error type.
///
/// Covers failures surfaced to the caller as errors. Transport and
/// parse failures during a run are not among them: the orchestrator
/// absorbs those into the result's terminal reason instead.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL construction failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Request or configuration rejected before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl HarvestError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Failure of one logical RPC call, classed for retry policy.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Provider signalled rate limiting (HTTP 429-equivalent)
    #[error("rate limited by provider (status {status})")]
    RateLimited { status: u16 },

    /// Provider-side failure (HTTP 5xx-equivalent)
    #[error("server error (status {status})")]
    ServerError { status: u16 },

    /// The request did not complete within its deadline
    #[error("request timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// Connection-level failure before any response arrived
    #[error("network unreachable: {message}")]
    NetworkUnreachable { message: String },

    /// Anything else; surfaced immediately, never retried
    #[error("non-retryable transport failure: {message}")]
    NonRetryable { message: String },
}

impl TransportError {
    /// The retry class of this failure.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::RateLimited { .. } => FailureClass::RateLimited,
            Self::ServerError { .. } => FailureClass::ServerError,
            Self::Timeout { .. } => FailureClass::Timeout,
            Self::NetworkUnreachable { .. } => FailureClass::NetworkUnreachable,
            Self::NonRetryable { .. } => FailureClass::NonRetryable,
        }
    }

    /// Create a non-retryable error.
    pub fn non_retryable(message: impl fmt::Display) -> Self {
        Self::NonRetryable {
            message: message.to_string(),
        }
    }
}

/// Retry class of a transport failure.
///
/// Replaces stringly-typed retry branching with an explicit enum keyed
/// into a fixed delay-schedule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    RateLimited,
    ServerError,
    Timeout,
    NetworkUnreachable,
    NonRetryable,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Timeout => "timeout",
            Self::NetworkUnreachable => "network_unreachable",
            Self::NonRetryable => "non_retryable",
        }
    }
}

/// Per-page or per-record decode failure.
///
/// Field-level failures are absorbed into sentinel values; only an
/// unresolvable identity aborts a record.
#[derive(Error, Debug)]
pub enum ParseError {
    /// No extraction tier could resolve the record's identity
    #[error("review identity could not be resolved on page {page}")]
    UnresolvableIdentity { page: usize },

    /// The payload body was not decodable as the provider envelope
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_class_mapping() {
        assert_eq!(
            TransportError::RateLimited { status: 429 }.class(),
            FailureClass::RateLimited
        );
        assert_eq!(
            TransportError::ServerError { status: 503 }.class(),
            FailureClass::ServerError
        );
        assert_eq!(
            TransportError::Timeout {
                elapsed: Duration::from_secs(30)
            }
            .class(),
            FailureClass::Timeout
        );
        assert_eq!(
            TransportError::non_retryable("404").class(),
            FailureClass::NonRetryable
        );
    }

    #[test]
    fn test_class_names() {
        assert_eq!(FailureClass::RateLimited.as_str(), "rate_limited");
        assert_eq!(FailureClass::NonRetryable.as_str(), "non_retryable");
    }
}

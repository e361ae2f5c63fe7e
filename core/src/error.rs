//! Error taxonomy for the Kaizen client.
//!
//! # Design
//! Every failure a caller can see is a `KaizenError`. The HTTP-derived kinds
//! (`Auth`, `RateLimit`, `Validation`, `Api`) are produced by the error mapper
//! from a response; `Transport` covers failures where no response exists.
//! `Validation` is also raised locally by facades before any request is sent,
//! in which case it carries no status.
//!
//! Nothing in this crate retries. A `RateLimit` error carries the server's
//! `retry_after` hint so callers can decide for themselves.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KaizenError>;

/// Errors returned by every client and facade call.
#[derive(Debug, Error)]
pub enum KaizenError {
    /// The server rejected the credentials (HTTP 401 or 403).
    #[error("authentication failed ({status}): {message}")]
    Auth {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    /// The request was throttled (HTTP 429).
    #[error("rate limit exceeded: {message} (retry after {retry_after}s)")]
    RateLimit {
        message: String,
        retry_after: u64,
        request_id: Option<String>,
    },

    /// Malformed input, detected locally (`status` is `None`) or reported by
    /// the server with a `field` in the error body.
    #[error("invalid {}: {message}", .field.as_deref().unwrap_or("request"))]
    Validation {
        field: Option<String>,
        message: String,
        status: Option<u16>,
        request_id: Option<String>,
    },

    /// No HTTP response was received.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Any other non-success response.
    #[error("HTTP {status}: {message}")]
    Api {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    /// A call needed configuration that could not be resolved (the API key).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A success response body did not have the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl KaizenError {
    /// Local validation failure for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        KaizenError::Validation {
            field: Some(field.into()),
            message: message.into(),
            status: None,
            request_id: None,
        }
    }

    /// HTTP status associated with the error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            KaizenError::Auth { status, .. } | KaizenError::Api { status, .. } => Some(*status),
            KaizenError::RateLimit { .. } => Some(429),
            KaizenError::Validation { status, .. } => *status,
            _ => None,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            KaizenError::Auth { .. } => "AUTH_ERROR",
            KaizenError::RateLimit { .. } => "RATE_LIMIT",
            KaizenError::Validation { .. } => "VALIDATION_ERROR",
            KaizenError::Transport(TransportError::Timeout) => "TIMEOUT",
            KaizenError::Transport(_) => "TRANSPORT_ERROR",
            KaizenError::Api { .. } => "API_ERROR",
            KaizenError::Configuration(_) => "CONFIGURATION_ERROR",
            KaizenError::Serialization(_) => "SERIALIZATION_ERROR",
            KaizenError::Deserialization(_) => "DESERIALIZATION_ERROR",
        }
    }

    /// Value of the server's `X-Request-ID` header, when the error came from a response.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            KaizenError::Auth { request_id, .. }
            | KaizenError::RateLimit { request_id, .. }
            | KaizenError::Validation { request_id, .. }
            | KaizenError::Api { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Server-suggested wait before retrying a throttled call.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            KaizenError::RateLimit { retry_after, .. } => Some(Duration::from_secs(*retry_after)),
            _ => None,
        }
    }
}

/// Failures below HTTP: nothing was received from the server.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("could not connect: {0}")]
    Connect(String),

    /// A response arrived but its body was larger than the transport accepts.
    #[error("response body exceeds {0} bytes")]
    ResponseTooLarge(u64),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_validation_has_no_status() {
        let err = KaizenError::validation("records", "must be positive");
        assert_eq!(err.status(), None);
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.to_string(), "invalid records: must be positive");
    }

    #[test]
    fn rate_limit_exposes_retry_hint() {
        let err = KaizenError::RateLimit {
            message: "slow down".to_string(),
            retry_after: 12,
            request_id: Some("req-1".to_string()),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(12)));
        assert_eq!(err.request_id(), Some("req-1"));
    }

    #[test]
    fn timeout_has_distinct_code() {
        let err = KaizenError::from(TransportError::Timeout);
        assert_eq!(err.code(), "TIMEOUT");
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "transport failure: request timed out");
    }
}

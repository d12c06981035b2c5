//! Error types returned by the external service boundary.

use std::time::Duration;

use thiserror::Error;

/// A failed call against the hosting platform.
///
/// Variants distinguish the outcomes the migration engine reacts to
/// differently: transient failures are retried by the client, everything
/// else is surfaced to the phase that issued the call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("abuse detection triggered: {message}")]
    Abuse {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("could not decode response: {message}")]
    Decode { message: String },

    #[error("unexpected response {status}: {message}")]
    Unexpected { status: u16, message: String },

    #[error("invalid url `{url}`: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("cancelled before the request was sent")]
    Cancelled,
}

impl ApiError {
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Whether the client may retry the call that produced this error.
    ///
    /// Never true for the abuse signal.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Server { .. } | Self::Network { .. }
        )
    }

    /// Delay suggested by the service, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } | Self::Abuse { retry_after, .. } => {
                *retry_after
            }
            _ => None,
        }
    }
}

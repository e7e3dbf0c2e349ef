//! Channel error types.

use std::time::Duration;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported by a channel client.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The message or attachment does not exist (anymore).
    #[error("not found: {0}")]
    NotFound(String),

    /// The channel refused the request because of rate limits.
    #[error("rate limited, retry after {}ms", .retry_after.as_millis())]
    RateLimited {
        /// Delay advertised by the channel.
        retry_after: Duration,
    },

    /// The channel answered with an unexpected status.
    #[error("request failed with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request was cancelled before it completed.
    #[error("request cancelled")]
    Cancelled,
}

impl ChannelError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a transport error from any error or message.
    #[must_use]
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    /// Create an invalid response error.
    #[must_use]
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether the error means the target does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

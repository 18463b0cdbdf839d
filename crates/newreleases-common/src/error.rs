//! Common error types used throughout newreleases.
//!
//! The variants mirror the catalog service's failure taxonomy so retry and
//! escalation decisions can match on structure instead of message text.

use std::time::Duration;

/// Minimum wait applied to a rate-limit response, whether or not the service
/// supplied a `Retry-After` hint.
pub const MIN_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Common error type for newreleases.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A date, id, or other field could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The catalog service asked us to slow down.
    #[error("Rate limited by catalog service (retry after {}s)", retry_after.as_secs())]
    RateLimited {
        /// How long to wait before issuing the next request.
        retry_after: Duration,
    },

    /// The access token is missing, expired, or lacks the required scope.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The requested resource does not exist (or no longer resolves).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The catalog service returned an error status.
    #[error("Catalog service error [{status}]: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The request never produced a response (connect failure, timeout, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// A response arrived but its body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every artist in a run failed; nothing useful can be reported.
    #[error("All {failed} artists failed to retrieve releases")]
    AllArtistsFailed {
        /// Number of artists that were attempted and failed.
        failed: usize,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a RateLimited error, clamping the wait to [`MIN_RETRY_AFTER`].
    pub fn rate_limited(retry_after: Option<Duration>) -> Self {
        let retry_after = retry_after
            .unwrap_or(MIN_RETRY_AFTER)
            .max(MIN_RETRY_AFTER);
        Self::RateLimited { retry_after }
    }

    /// Create a new Unauthorized error.
    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Server error.
    pub fn server<S: Into<String>>(status: u16, msg: S) -> Self {
        Self::Server {
            status,
            message: msg.into(),
        }
    }

    /// Create a new Network error.
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new Decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// The server-provided wait, if this is a rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Errors worth one generic retry: the request may succeed if repeated.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Server { .. } | Self::Network(_) | Self::Decode(_)
        )
    }

    /// Errors that must abort the whole run instead of one artist.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

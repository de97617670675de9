use std::fmt;

/// Boxed error carried by [`TransportError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response body captured on a failed request.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorBody {
    Json(serde_json::Value),
    Text(String),
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Failure raised by a [`Transport`](crate::Transport) before any HTTP status was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connectivity failure; retried while the budget allows.
    #[error("network error: {0}")]
    Network(#[source] BoxError),
    /// Any other transport failure; never retried.
    #[error("transport error: {0}")]
    Other(#[source] BoxError),
}

impl TransportError {
    pub fn network(err: impl Into<BoxError>) -> Self {
        Self::Network(err.into())
    }

    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum DeereError {
    /// Non-success HTTP status without a more specific kind.
    #[error("http error {status}: {message}")]
    Api {
        message: String,
        status: u16,
        status_text: String,
        body: Option<ErrorBody>,
    },
    /// HTTP 429 after the retry budget was spent.
    #[error("rate limited ({status}): {message}")]
    RateLimit {
        message: String,
        status: u16,
        status_text: String,
        /// Seconds from the `Retry-After` response header.
        retry_after: Option<u64>,
        body: Option<ErrorBody>,
    },
    /// HTTP 401 or 403.
    #[error("authorization error {status}: {message}")]
    Auth {
        message: String,
        status: u16,
        status_text: String,
        body: Option<ErrorBody>,
    },
    /// Every attempt exceeded its timeout.
    #[error("Request timeout")]
    Timeout,
    /// The caller's cancellation token fired.
    #[error("Request cancelled")]
    Cancelled,
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
    /// Response body could not be decoded into the requested type.
    #[error("decode error: {0}")]
    Decode(String),
    /// A header name or value (including the bearer token) is not valid HTTP.
    #[error("invalid header {0}")]
    InvalidHeader(String),
}

impl DeereError {
    /// HTTP status of the failure, `0` when no status was received.
    pub fn status(&self) -> u16 {
        match self {
            Self::Api { status, .. } | Self::RateLimit { status, .. } | Self::Auth { status, .. } => {
                *status
            }
            _ => 0,
        }
    }

    pub fn status_text(&self) -> &str {
        match self {
            Self::Api { status_text, .. }
            | Self::RateLimit { status_text, .. }
            | Self::Auth { status_text, .. } => status_text,
            Self::Timeout => "Timeout",
            Self::Cancelled => "Cancelled",
            _ => "",
        }
    }

    /// Human-readable message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::RateLimit { message, .. } | Self::Auth { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }

    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Api { body, .. } | Self::RateLimit { body, .. } | Self::Auth { body, .. } => {
                body.as_ref()
            }
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimit { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

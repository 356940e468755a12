//! Error types for the dispatcher and the REST client

/// Result of a request issued through the dispatcher
pub type RestResult<T> = Result<T, DispatchError<RestError>>;

/// Why a submitted operation did not produce a value
#[derive(Debug, thiserror::Error)]
pub enum DispatchError<E> {
    /// The operation itself failed; never retried
    #[error(transparent)]
    Operation(E),

    /// The dispatcher shut down before the operation could complete
    #[error("Dispatcher shut down")]
    Shutdown,

    /// The operation panicked; its bucket keeps serving other operations
    #[error("Operation panicked")]
    Panicked,
}

impl<E> DispatchError<E> {
    /// Get the operation error, if any
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Shutdown | Self::Panicked => None,
        }
    }
}

/// REST client errors
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// Non-2xx, non-429 response
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),
}

impl RestError {
    /// HTTP status, if the server answered
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

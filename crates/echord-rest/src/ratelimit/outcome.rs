//! What an operation reports back to the dispatcher.

use std::time::Duration;

use super::headers::RateLimitHeaders;

/// Successful completion, optionally carrying the server's quota metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Completed<T> {
    pub value: T,
    pub headers: Option<RateLimitHeaders>,
}

impl<T> Completed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            headers: None,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: RateLimitHeaders) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Failure reported by an operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationError<E> {
    /// Throttled by the server; the dispatcher waits and runs the operation again
    RateLimited {
        retry_after: Duration,
        global: bool,
        /// Quota metadata sent along with the rejection
        headers: Option<RateLimitHeaders>,
    },
    /// Terminal failure, handed to the caller as is
    Failed(E),
}

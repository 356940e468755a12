//! Gateway error types

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Socket-level failure
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    /// Frame was not valid JSON or did not match the expected shape
    #[error("Failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// zlib-stream frame could not be inflated
    #[error("Failed to inflate frame: {0}")]
    Decompress(#[from] flate2::DecompressError),

    /// Frame decoded but its content is unusable
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The client was destroyed
    #[error("Gateway client destroyed")]
    Destroyed,
}

impl From<tungstenite::Error> for GatewayError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;

//! Events delivered to the application

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::GatewayEventType;
use crate::error::GatewayError;
use crate::protocol::CloseCode;

/// Everything the gateway client reports to the application
#[derive(Debug)]
pub enum GatewayEvent {
    /// A new session was established
    Ready(ReadyEvent),
    /// An interrupted session was resumed; missed dispatches were replayed before this
    Resumed,
    /// Any other dispatch
    Dispatch(DispatchEvent),
    /// The socket closed; a reconnect may follow
    Close(CloseEvent),
    /// A non-fatal failure (undecodable frame, socket error)
    Error(GatewayError),
}

/// Payload of the READY dispatch
#[derive(Debug, Clone)]
pub struct ReadyEvent {
    pub session_id: String,
    pub resume_url: Option<String>,
    /// The full READY payload (user, guilds, application)
    pub data: Value,
}

/// A named dispatch forwarded verbatim
#[derive(Debug, Clone)]
pub struct DispatchEvent {
    /// Event name as sent by the server
    pub name: String,
    /// Parsed event type; `None` for names this client does not know
    pub kind: Option<GatewayEventType>,
    pub sequence: Option<u64>,
    pub data: Value,
}

impl DispatchEvent {
    #[must_use]
    pub fn new(name: String, sequence: Option<u64>, data: Value) -> Self {
        let kind = GatewayEventType::from_name(&name);
        Self {
            name,
            kind,
            sequence,
            data,
        }
    }

    /// Decode the payload into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}

/// Socket closure reported before any reconnect attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    pub code: u16,
    pub reason: String,
}

impl CloseEvent {
    /// The gateway close code, when the code is in the gateway range
    #[must_use]
    pub fn close_code(&self) -> Option<CloseCode> {
        CloseCode::from_u16(self.code)
    }
}

//! Instructions the session hands back to its driver

use std::fmt;
use std::time::Duration;

use crate::events::GatewayEvent;
use crate::protocol::GatewayMessage;

/// Side effect requested by the session state machine
#[derive(Debug)]
pub enum SessionAction {
    /// Write a frame to the socket
    Send(GatewayMessage),
    /// (Re)start the heartbeat timer with this period
    StartHeartbeat(Duration),
    /// Deliver an event to the application
    Emit(GatewayEvent),
    /// Tear the socket down and connect again
    Reconnect(DisconnectCause),
}

/// Why a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectCause {
    /// The socket was closed by the server or failed
    Remote,
    /// Server sent op 7
    ReconnectRequested,
    /// Server sent op 9
    InvalidSession,
    /// A heartbeat went unacknowledged for a full interval
    Zombie,
}

impl DisconnectCause {
    /// Whether the client itself closed the socket
    #[must_use]
    pub const fn is_client_initiated(self) -> bool {
        !matches!(self, Self::Remote)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote close",
            Self::ReconnectRequested => "reconnect requested",
            Self::InvalidSession => "invalid session",
            Self::Zombie => "heartbeat not acknowledged",
        }
    }
}

impl fmt::Display for DisconnectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the driver should do after a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Wait `delay`, then open a new socket
    Reconnect { delay: Duration, resume: bool },
    /// Do not reconnect
    Stop,
}

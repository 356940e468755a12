//! Connection lifecycle states

use std::fmt;

/// Where the client is in its connect / identify / resume cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No socket and no pending reconnect
    #[default]
    Disconnected,
    /// Socket is being opened
    Connecting,
    /// Socket open, Identify sent, waiting for READY
    Identifying,
    /// Socket open, Resume sent, waiting for RESUMED
    Resuming,
    /// Session established
    Connected,
    /// Socket closed, waiting before the next attempt
    Reconnecting,
    /// Torn down by the application; terminal
    Destroyed,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// A socket is open (handshake may still be in progress)
    #[must_use]
    pub const fn has_socket(self) -> bool {
        matches!(self, Self::Identifying | Self::Resuming | Self::Connected)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Destroyed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Identifying => "identifying",
            Self::Resuming => "resuming",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

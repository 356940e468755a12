//! Op codes carried in the `op` field of every gateway frame

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which peer is allowed to put an op code on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Only the client sends it
    Outbound,
    /// Only the gateway sends it
    Inbound,
    /// Either side may send it
    Both,
}

/// A frame's op code
///
/// Voice ops (4 and 5) are not part of this client and fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum OpCode {
    Dispatch = 0,
    Heartbeat = 1,
    Identify = 2,
    PresenceUpdate = 3,
    Resume = 6,
    Reconnect = 7,
    RequestGuildMembers = 8,
    InvalidSession = 9,
    Hello = 10,
    HeartbeatAck = 11,
}

/// Raw op code with no [`OpCode`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid op code: {0}")]
pub struct UnknownOpCode(pub u8);

impl OpCode {
    /// Every supported op code, in wire order
    pub const ALL: [Self; 10] = [
        Self::Dispatch,
        Self::Heartbeat,
        Self::Identify,
        Self::PresenceUpdate,
        Self::Resume,
        Self::Reconnect,
        Self::RequestGuildMembers,
        Self::InvalidSession,
        Self::Hello,
        Self::HeartbeatAck,
    ];

    #[must_use]
    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_u8() == raw)
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Heartbeat => Direction::Both,
            Self::Identify | Self::PresenceUpdate | Self::Resume | Self::RequestGuildMembers => {
                Direction::Outbound
            }
            Self::Dispatch | Self::Reconnect | Self::InvalidSession | Self::Hello | Self::HeartbeatAck => {
                Direction::Inbound
            }
        }
    }

    /// The client may send this op
    #[must_use]
    pub const fn is_outbound(self) -> bool {
        !matches!(self.direction(), Direction::Inbound)
    }

    /// The gateway may send this op
    #[must_use]
    pub const fn is_inbound(self) -> bool {
        !matches!(self.direction(), Direction::Outbound)
    }
}

impl TryFrom<u8> for OpCode {
    type Error = UnknownOpCode;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::from_u8(raw).ok_or(UnknownOpCode(raw))
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op.as_u8()
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug of a fieldless variant is its name
        write!(f, "{self:?}({})", self.as_u8())
    }
}

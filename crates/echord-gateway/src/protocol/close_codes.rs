//! Close codes in the 4000 range that the gateway ends sockets with

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway-defined close code
///
/// Standard WebSocket codes (1000, 1006, ...) have no variant here; see
/// [`CloseCode::allows_reconnect`] for how raw values are judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    UnknownError = 4000,
    UnknownOpcode = 4001,
    DecodeError = 4002,
    NotAuthenticated = 4003,
    /// Bad token
    AuthenticationFailed = 4004,
    AlreadyAuthenticated = 4005,
    /// Resume carried a stale `seq`
    InvalidSequence = 4007,
    RateLimited = 4008,
    SessionTimeout = 4009,
    InvalidShard = 4010,
    ShardingRequired = 4011,
    InvalidApiVersion = 4012,
    InvalidIntents = 4013,
    /// Privileged intent not enabled for the application
    DisallowedIntents = 4014,
}

impl CloseCode {
    pub const ALL: [Self; 14] = [
        Self::UnknownError,
        Self::UnknownOpcode,
        Self::DecodeError,
        Self::NotAuthenticated,
        Self::AuthenticationFailed,
        Self::AlreadyAuthenticated,
        Self::InvalidSequence,
        Self::RateLimited,
        Self::SessionTimeout,
        Self::InvalidShard,
        Self::ShardingRequired,
        Self::InvalidApiVersion,
        Self::InvalidIntents,
        Self::DisallowedIntents,
    ];

    #[must_use]
    pub fn from_u16(raw: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_u16() == raw)
    }

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Codes caused by the client's own configuration; reconnecting with the
    /// same token, shard or intents would fail the same way.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed
                | Self::InvalidShard
                | Self::ShardingRequired
                | Self::InvalidApiVersion
                | Self::InvalidIntents
                | Self::DisallowedIntents
        )
    }

    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        !self.is_fatal()
    }

    /// Judge a raw close code; anything outside the table is retried
    #[must_use]
    pub fn allows_reconnect(raw: u16) -> bool {
        Self::from_u16(raw).is_none_or(Self::should_reconnect)
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnknownError => "the gateway hit an unknown error",
            Self::UnknownOpcode => "an op code the gateway does not accept was sent",
            Self::DecodeError => "a payload could not be decoded",
            Self::NotAuthenticated => "a payload was sent before identifying",
            Self::AuthenticationFailed => "the token was rejected",
            Self::AlreadyAuthenticated => "identify was sent twice",
            Self::InvalidSequence => "resume used an invalid sequence",
            Self::RateLimited => "payloads were sent too quickly",
            Self::SessionTimeout => "the session timed out",
            Self::InvalidShard => "the shard was invalid",
            Self::ShardingRequired => "too many guilds for a single shard",
            Self::InvalidApiVersion => "the gateway version is not supported",
            Self::InvalidIntents => "the intents value was malformed",
            Self::DisallowedIntents => "a privileged intent is not enabled",
        }
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}: {}", self.as_u16(), self, self.description())
    }
}

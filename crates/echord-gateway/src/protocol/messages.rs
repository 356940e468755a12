//! The `{op, d, s, t}` envelope every gateway frame shares

use super::{
    HelloPayload, IdentifyPayload, OpCode, PresenceUpdatePayload, RequestGuildMembersPayload,
    ResumePayload,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One gateway frame
///
/// `t` and `s` are only set on dispatches (op 0). Servers send them as
/// explicit nulls on other ops, which decodes the same as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    pub op: OpCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    #[serde(default)]
    pub d: Option<Value>,
}

impl GatewayMessage {
    fn outbound(op: OpCode, payload: impl Serialize) -> Self {
        // Payload types are plain structs; to_value cannot fail for them
        let d = serde_json::to_value(payload).unwrap_or(Value::Null);
        Self { op, t: None, s: None, d: Some(d) }
    }

    /// Op 1; `d` is the last sequence seen, or null before the first dispatch
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self {
            op: OpCode::Heartbeat,
            t: None,
            s: None,
            d: Some(last_sequence.map_or(Value::Null, Value::from)),
        }
    }

    #[must_use]
    pub fn identify(payload: &IdentifyPayload) -> Self {
        Self::outbound(OpCode::Identify, payload)
    }

    #[must_use]
    pub fn presence_update(payload: &PresenceUpdatePayload) -> Self {
        Self::outbound(OpCode::PresenceUpdate, payload)
    }

    #[must_use]
    pub fn resume(payload: &ResumePayload) -> Self {
        Self::outbound(OpCode::Resume, payload)
    }

    #[must_use]
    pub fn request_guild_members(payload: &RequestGuildMembersPayload) -> Self {
        Self::outbound(OpCode::RequestGuildMembers, payload)
    }

    /// Decode the payload of a Hello; `None` for other ops or a malformed `d`
    pub fn as_hello(&self) -> Option<HelloPayload> {
        if self.op != OpCode::Hello {
            return None;
        }
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// For op 9, whether the session may be resumed; anything but `true` means no
    pub fn as_invalid_session(&self) -> Option<bool> {
        if self.op != OpCode::InvalidSession {
            return None;
        }
        Some(self.d.as_ref().and_then(Value::as_bool).unwrap_or(false))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Decode an inflated binary frame
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op {}", self.op)?;
        match (&self.t, self.s) {
            (Some(t), Some(s)) => write!(f, " {t} #{s}"),
            (Some(t), None) => write!(f, " {t}"),
            _ => Ok(()),
        }
    }
}

//! Gateway protocol definitions
//!
//! Frame envelope, op codes, close codes and the typed `d` payloads.

mod close_codes;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::GatewayMessage;
pub use opcodes::{Direction, OpCode, UnknownOpCode};
pub use payloads::{
    Activity, HelloPayload, IdentifyPayload, IdentifyProperties, PresenceUpdatePayload,
    ReadyPayload, RequestGuildMembersPayload, ResumePayload, Status,
};

//! Op code handlers
//!
//! Handles incoming server frames based on their operation code. Handlers are
//! synchronous: they update the [`SessionState`] and describe side effects as
//! [`SessionAction`]s for the runner to perform.

mod dispatch;
mod heartbeat;
mod hello;
mod reconnect;

pub use dispatch::DispatchHandler;
pub use heartbeat::HeartbeatHandler;
pub use hello::HelloHandler;
pub use reconnect::ReconnectHandler;

use serde_json::Value;

use crate::connection::SessionState;
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{GatewayMessage, OpCode};
use crate::session::SessionAction;

/// Route incoming server frames to the matching handler
pub struct FrameDispatcher;

impl FrameDispatcher {
    /// Handle one decoded server frame
    ///
    /// The sequence number, when present, is recorded before routing so that
    /// any heartbeat produced by the frame already carries it.
    pub fn dispatch(
        state: &mut SessionState,
        message: GatewayMessage,
    ) -> GatewayResult<Vec<SessionAction>> {
        if let Some(seq) = message.s {
            state.update_sequence(seq);
        }

        if !message.op.is_inbound() {
            tracing::warn!(op = %message.op, "Received client-only op code from server");
            return Err(GatewayError::InvalidPayload(format!(
                "unexpected op code {}",
                message.op
            )));
        }

        match message.op {
            OpCode::Hello => {
                let hello = message
                    .as_hello()
                    .filter(|hello| hello.heartbeat_interval > 0)
                    .ok_or_else(|| GatewayError::InvalidPayload("Invalid Hello payload".to_string()))?;

                Ok(HelloHandler::handle(state, &hello))
            }
            OpCode::Heartbeat => Ok(HeartbeatHandler::handle_request(state)),
            OpCode::HeartbeatAck => Ok(HeartbeatHandler::handle_ack(state)),
            OpCode::Reconnect => Ok(ReconnectHandler::handle_reconnect(state)),
            OpCode::InvalidSession => {
                let resumable = message.as_invalid_session().unwrap_or(false);
                Ok(ReconnectHandler::handle_invalid_session(state, resumable))
            }
            OpCode::Dispatch => {
                let name = message.t.ok_or_else(|| {
                    GatewayError::InvalidPayload("Dispatch without event name".to_string())
                })?;

                DispatchHandler::handle(state, name, message.s, message.d.unwrap_or(Value::Null))
            }
            // Client-only ops were rejected above
            OpCode::Identify | OpCode::PresenceUpdate | OpCode::Resume | OpCode::RequestGuildMembers => {
                Ok(Vec::new())
            }
        }
    }
}

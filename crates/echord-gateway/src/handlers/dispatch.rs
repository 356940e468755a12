//! Dispatch handler (op 0)

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::connection::{ConnectionState, SessionState};
use crate::error::GatewayResult;
use crate::events::{DispatchEvent, GatewayEvent, ReadyEvent};
use crate::protocol::ReadyPayload;
use crate::session::SessionAction;

/// Routes named events; READY and RESUMED also complete the handshake
pub struct DispatchHandler;

impl DispatchHandler {
    pub fn handle(
        state: &mut SessionState,
        name: String,
        sequence: Option<u64>,
        data: Value,
    ) -> GatewayResult<Vec<SessionAction>> {
        let event = match name.as_str() {
            "READY" => {
                let ready = ReadyPayload::deserialize(&data)?;
                state.record_ready(ready.session_id.clone(), ready.resume_gateway_url.clone());
                state.set_status(ConnectionState::Connected);

                info!(session_id = %ready.session_id, "Session ready");

                GatewayEvent::Ready(ReadyEvent {
                    session_id: ready.session_id,
                    resume_url: ready.resume_gateway_url,
                    data,
                })
            }
            "RESUMED" => {
                state.set_status(ConnectionState::Connected);
                info!(session_id = ?state.session_id(), seq = ?state.sequence(), "Session resumed");
                GatewayEvent::Resumed
            }
            _ => {
                debug!(event = %name, seq = ?sequence, "Dispatch received");
                GatewayEvent::Dispatch(DispatchEvent::new(name, sequence, data))
            }
        };

        Ok(vec![SessionAction::Emit(event)])
    }
}

//! Hello handler (op 10)

use tracing::debug;

use crate::connection::SessionState;
use crate::protocol::{GatewayMessage, HelloPayload};
use crate::session::SessionAction;

/// Starts the heartbeat once the server announces its interval
pub struct HelloHandler;

impl HelloHandler {
    /// Start the timer and send the first heartbeat right away
    pub fn handle(state: &mut SessionState, hello: &HelloPayload) -> Vec<SessionAction> {
        let interval = hello.interval();
        state.set_heartbeat_interval(interval);
        state.heartbeat_sent(tokio::time::Instant::now());

        debug!(
            heartbeat_interval_ms = hello.heartbeat_interval,
            "Hello received, starting heartbeat"
        );

        vec![
            SessionAction::StartHeartbeat(interval),
            SessionAction::Send(GatewayMessage::heartbeat(state.sequence())),
        ]
    }
}

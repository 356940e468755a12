//! Heartbeat handler (op 1, op 11 and timer ticks)

use tokio::time::Instant;
use tracing::{trace, warn};

use crate::connection::SessionState;
use crate::protocol::GatewayMessage;
use crate::session::{DisconnectCause, SessionAction};

/// Keeps the connection alive and detects zombie connections
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Heartbeat timer fired
    ///
    /// If the previous heartbeat was never acknowledged the connection is
    /// treated as dead and no further heartbeat is sent on it.
    pub fn tick(state: &mut SessionState) -> Vec<SessionAction> {
        if !state.is_heartbeat_acked() {
            warn!(
                session_id = ?state.session_id(),
                "Heartbeat not acknowledged, connection is a zombie"
            );
            return vec![SessionAction::Reconnect(DisconnectCause::Zombie)];
        }

        state.heartbeat_sent(Instant::now());
        trace!(seq = ?state.sequence(), "Sending heartbeat");

        vec![SessionAction::Send(GatewayMessage::heartbeat(state.sequence()))]
    }

    /// Server asked for an immediate heartbeat (op 1)
    pub fn handle_request(state: &mut SessionState) -> Vec<SessionAction> {
        trace!(seq = ?state.sequence(), "Heartbeat requested by server");
        vec![SessionAction::Send(GatewayMessage::heartbeat(state.sequence()))]
    }

    /// Server acknowledged our heartbeat (op 11)
    pub fn handle_ack(state: &mut SessionState) -> Vec<SessionAction> {
        state.heartbeat_acked(Instant::now());
        trace!(latency_ms = ?state.latency().map(|l| l.as_millis()), "Heartbeat acknowledged");
        Vec::new()
    }
}

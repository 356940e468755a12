//! Reconnect (op 7) and Invalid Session (op 9) handler

use tracing::{info, warn};

use crate::connection::SessionState;
use crate::session::{DisconnectCause, SessionAction};

/// Handles server requests to drop the current connection
pub struct ReconnectHandler;

impl ReconnectHandler {
    /// Server asked the client to reconnect; the session stays resumable
    pub fn handle_reconnect(state: &SessionState) -> Vec<SessionAction> {
        info!(session_id = ?state.session_id(), "Server requested reconnect");
        vec![SessionAction::Reconnect(DisconnectCause::ReconnectRequested)]
    }

    /// Server rejected the session
    ///
    /// When `resumable` is false the session is forgotten and the next
    /// connection identifies from scratch.
    pub fn handle_invalid_session(state: &mut SessionState, resumable: bool) -> Vec<SessionAction> {
        warn!(
            session_id = ?state.session_id(),
            resumable,
            "Session invalidated by server"
        );

        if !resumable {
            state.invalidate();
        }

        vec![SessionAction::Reconnect(DisconnectCause::InvalidSession)]
    }
}

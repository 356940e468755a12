//! Session data
//!
//! What the client knows about its logical session: the resume token, the
//! last sequence and heartbeat bookkeeping.

use std::time::Duration;
use tokio::time::Instant;

use super::ConnectionState;

/// Mutable session data owned by a single [`Session`](crate::Session)
#[derive(Debug, Clone)]
pub struct SessionState {
    status: ConnectionState,
    session_id: Option<String>,
    sequence: Option<u64>,
    resume_url: Option<String>,
    heartbeat_interval: Option<Duration>,
    heartbeat_acked: bool,
    last_heartbeat_sent: Option<Instant>,
    latency: Option<Duration>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: ConnectionState::Disconnected,
            session_id: None,
            sequence: None,
            resume_url: None,
            heartbeat_interval: None,
            heartbeat_acked: true,
            last_heartbeat_sent: None,
            latency: None,
        }
    }
}

impl SessionState {
    pub fn status(&self) -> ConnectionState {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: ConnectionState) {
        self.status = status;
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Last sequence number received
    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    /// Endpoint advertised for resuming this session
    pub fn resume_url(&self) -> Option<&str> {
        self.resume_url.as_deref()
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    pub fn is_heartbeat_acked(&self) -> bool {
        self.heartbeat_acked
    }

    /// Round trip of the last acknowledged heartbeat
    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    /// Resume needs both the session id and a sequence; partial state
    /// falls back to a fresh Identify
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence.is_some()
    }

    /// Overwrite the stored sequence; ordering is trusted to the server
    pub(crate) fn update_sequence(&mut self, sequence: u64) {
        self.sequence = Some(sequence);
    }

    pub(crate) fn record_ready(&mut self, session_id: String, resume_url: Option<String>) {
        self.session_id = Some(session_id);
        self.resume_url = resume_url;
    }

    pub(crate) fn set_heartbeat_interval(&mut self, interval: Duration) {
        self.heartbeat_interval = Some(interval);
    }

    /// A heartbeat went out; it stays unacknowledged until op 11 arrives
    pub(crate) fn heartbeat_sent(&mut self, now: Instant) {
        self.heartbeat_acked = false;
        self.last_heartbeat_sent = Some(now);
    }

    pub(crate) fn heartbeat_acked(&mut self, now: Instant) {
        self.heartbeat_acked = true;
        if let Some(sent) = self.last_heartbeat_sent {
            self.latency = Some(now.saturating_duration_since(sent));
        }
    }

    /// Forget the session so the next connection identifies from scratch
    pub(crate) fn invalidate(&mut self) {
        self.session_id = None;
        self.sequence = None;
        self.resume_url = None;
    }

    /// Reset per-connection bookkeeping; session identity is kept
    pub(crate) fn reset_connection(&mut self) {
        self.heartbeat_interval = None;
        self.heartbeat_acked = true;
        self.last_heartbeat_sent = None;
    }

    /// Drop everything, including the session identity
    pub(crate) fn clear(&mut self) {
        self.invalidate();
        self.reset_connection();
        self.latency = None;
    }
}

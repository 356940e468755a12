//! Gateway session state machine
//!
//! [`Session`] holds everything that decides *what* happens on the
//! connection: identify or resume, heartbeat liveness, reconnect policy. It
//! performs no I/O; the runner feeds it socket and timer events and carries
//! out the [`SessionAction`]s it returns.

mod action;
mod backoff;

pub use action::{DisconnectCause, NextStep, SessionAction};
pub use backoff::Backoff;

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::connection::{ConnectionState, SessionState};
use crate::error::GatewayResult;
use crate::events::CloseEvent;
use crate::handlers::{FrameDispatcher, HeartbeatHandler};
use crate::protocol::{CloseCode, GatewayMessage, IdentifyPayload, ResumePayload};

/// One logical gateway session, across any number of sockets
pub struct Session {
    config: GatewayConfig,
    state: SessionState,
    backoff: Backoff,
}

impl Session {
    pub fn new(config: GatewayConfig) -> Self {
        let backoff = Backoff::new(config.reconnect_base, config.reconnect_max);
        Self {
            config,
            state: SessionState::default(),
            backoff,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> ConnectionState {
        self.state.status()
    }

    /// URL for the next socket: the advertised resume endpoint when the
    /// session can be resumed, the configured endpoint otherwise
    pub fn connect_url(&self) -> String {
        let base = match self.state.resume_url() {
            Some(url) if self.state.can_resume() => url,
            _ => self.config.url.as_str(),
        };
        self.config.endpoint(base)
    }

    /// A new socket is about to be opened
    pub fn begin_connect(&mut self) -> String {
        self.state.set_status(ConnectionState::Connecting);
        self.connect_url()
    }

    /// The socket opened: resume if possible, identify otherwise
    pub fn on_open(&mut self) -> Vec<SessionAction> {
        self.state.reset_connection();

        if let Some(resume) = self.resume_payload() {
            info!(session_id = %resume.session_id, seq = resume.seq, "Resuming session");
            self.state.set_status(ConnectionState::Resuming);
            vec![SessionAction::Send(GatewayMessage::resume(&resume))]
        } else {
            info!(intents = %self.config.intents, "Identifying");
            self.state.set_status(ConnectionState::Identifying);
            vec![SessionAction::Send(GatewayMessage::identify(&self.identify_payload()))]
        }
    }

    /// A text frame arrived
    pub fn on_text(&mut self, text: &str) -> GatewayResult<Vec<SessionAction>> {
        self.on_frame(text.as_bytes())
    }

    /// A complete (already inflated) frame arrived
    pub fn on_frame(&mut self, bytes: &[u8]) -> GatewayResult<Vec<SessionAction>> {
        let message = GatewayMessage::from_slice(bytes)?;
        self.on_message(message)
    }

    pub fn on_message(&mut self, message: GatewayMessage) -> GatewayResult<Vec<SessionAction>> {
        let actions = FrameDispatcher::dispatch(&mut self.state, message)?;

        if self.state.status().is_connected() && self.backoff.attempts() > 0 {
            debug!("Connection established, resetting backoff");
            self.backoff.reset();
        }

        Ok(actions)
    }

    /// The heartbeat timer fired
    pub fn on_heartbeat_tick(&mut self) -> Vec<SessionAction> {
        HeartbeatHandler::tick(&mut self.state)
    }

    /// The socket closed, by either side
    ///
    /// Returns the close event for the application and what to do next.
    pub fn on_close(&mut self, code: u16, reason: &str, cause: DisconnectCause) -> (CloseEvent, NextStep) {
        let was_connected = self.state.status().is_connected();
        self.state.reset_connection();

        let event = CloseEvent {
            code,
            reason: reason.to_string(),
        };

        if self.state.status().is_terminal() {
            return (event, NextStep::Stop);
        }

        if cause == DisconnectCause::Remote && !CloseCode::allows_reconnect(code) {
            warn!(code, reason, "Gateway closed with a fatal code, not reconnecting");
            self.state.set_status(ConnectionState::Disconnected);
            return (event, NextStep::Stop);
        }

        let resume = self.state.can_resume();
        let delay = match cause {
            // A resume attempt that dies before RESUMED backs off like a fresh connect
            DisconnectCause::Remote if resume && was_connected => Duration::ZERO,
            DisconnectCause::Remote => self.backoff.next_delay(),
            DisconnectCause::ReconnectRequested | DisconnectCause::Zombie => Duration::ZERO,
            DisconnectCause::InvalidSession => self.config.invalid_session_delay,
        };

        info!(
            code,
            reason,
            %cause,
            resume,
            delay_ms = delay.as_millis() as u64,
            "Gateway connection closed"
        );

        self.state.set_status(ConnectionState::Reconnecting);
        (event, NextStep::Reconnect { delay, resume })
    }

    /// Opening a socket failed; returns how long to wait before retrying
    pub fn on_connect_failed(&mut self) -> Duration {
        self.state.set_status(ConnectionState::Reconnecting);
        self.backoff.next_delay()
    }

    /// Forget everything; the session cannot be used afterwards
    pub fn destroy(&mut self) {
        if self.state.status().is_terminal() {
            return;
        }
        self.state.clear();
        self.backoff.reset();
        self.state.set_status(ConnectionState::Destroyed);
        info!("Gateway session destroyed");
    }

    fn identify_payload(&self) -> IdentifyPayload {
        IdentifyPayload {
            token: self.config.token.clone(),
            intents: self.config.intents,
            properties: self.config.properties.clone(),
            large_threshold: self.config.large_threshold,
            shard: self.config.shard,
            presence: self.config.presence.clone(),
        }
    }

    fn resume_payload(&self) -> Option<ResumePayload> {
        let session_id = self.state.session_id()?;
        let seq = self.state.sequence()?;
        Some(ResumePayload {
            token: self.config.token.clone(),
            session_id: session_id.to_string(),
            seq,
        })
    }
}

//! Application-side handle to a running gateway client

use tokio::sync::{mpsc, watch};

use crate::connection::ConnectionState;
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{GatewayMessage, PresenceUpdatePayload, RequestGuildMembersPayload};

/// Commands from handles to the runner task
#[derive(Debug)]
pub(crate) enum GatewayCommand {
    Send(GatewayMessage),
    Destroy,
}

/// Cloneable handle to a [`GatewayClient`](super::GatewayClient)
///
/// Dropping every handle has the same effect as [`destroy`](Self::destroy).
#[derive(Debug, Clone)]
pub struct GatewayHandle {
    commands: mpsc::Sender<GatewayCommand>,
    status: watch::Receiver<ConnectionState>,
}

impl GatewayHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<GatewayCommand>,
        status: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self { commands, status }
    }

    /// Current connection state
    pub fn status(&self) -> ConnectionState {
        *self.status.borrow()
    }

    /// Subscribe to connection state changes
    pub fn watch_status(&self) -> watch::Receiver<ConnectionState> {
        self.status.clone()
    }

    /// Wait until the client reaches `wanted`
    ///
    /// Fails with [`GatewayError::Destroyed`] if the client stops first.
    pub async fn wait_for_status(&self, wanted: ConnectionState) -> GatewayResult<()> {
        let mut status = self.status.clone();
        status
            .wait_for(|current| *current == wanted)
            .await
            .map(|_| ())
            .map_err(|_| GatewayError::Destroyed)
    }

    /// Queue a raw frame; frames queued while no session is open are dropped
    pub async fn send(&self, message: GatewayMessage) -> GatewayResult<()> {
        self.commands
            .send(GatewayCommand::Send(message))
            .await
            .map_err(|_| GatewayError::Destroyed)
    }

    /// Change the bot's status and activities (op 3)
    pub async fn update_presence(&self, presence: &PresenceUpdatePayload) -> GatewayResult<()> {
        self.send(GatewayMessage::presence_update(presence)).await
    }

    /// Ask for guild members; they arrive as `GUILD_MEMBERS_CHUNK` dispatches (op 8)
    pub async fn request_guild_members(&self, request: &RequestGuildMembersPayload) -> GatewayResult<()> {
        self.send(GatewayMessage::request_guild_members(request)).await
    }

    /// Close the connection with 1000 and stop the client
    ///
    /// Safe to call repeatedly and from any state. Returns once the runner has
    /// stopped emitting events.
    pub async fn destroy(&self) {
        if self.commands.send(GatewayCommand::Destroy).await.is_err() {
            return;
        }
        let mut status = self.status.clone();
        let _ = status.wait_for(|current| current.is_terminal()).await;
    }
}

//! Gateway client runner
//!
//! A single task owns the socket, the heartbeat timer and the [`Session`], so
//! inbound frames, heartbeat ticks and handle commands never race each other.

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use super::handle::{GatewayCommand, GatewayHandle};
use crate::config::GatewayConfig;
use crate::connection::{ConnectionState, ZlibStreamInflater};
use crate::error::{GatewayError, GatewayResult};
use crate::events::GatewayEvent;
use crate::protocol::GatewayMessage;
use crate::session::{DisconnectCause, NextStep, Session, SessionAction};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketSink = SplitSink<Socket, Message>;

/// Buffer size for queued handle commands
const COMMAND_BUFFER_SIZE: usize = 64;

/// Normal closure, sent on destroy
const CLOSE_NORMAL: u16 = 1000;

/// Sent when the client drops a connection it wants to resume; anything but
/// 1000/1001 keeps the session alive on the server
const CLOSE_RECONNECT: u16 = 4000;

/// Reported when a close frame carries no status
const CLOSE_NO_STATUS: u16 = 1005;

/// Reported when the socket dies without a close frame
const CLOSE_ABNORMAL: u16 = 1006;

/// Entry point for the gateway connection
pub struct GatewayClient;

impl GatewayClient {
    /// Spawn the connection task
    ///
    /// Returns a handle for commands and the stream of events. Must be called
    /// inside a tokio runtime.
    pub fn connect(config: GatewayConfig) -> (GatewayHandle, mpsc::UnboundedReceiver<GatewayEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let (status_tx, status_rx) = watch::channel(ConnectionState::Disconnected);

        let runner = Runner {
            session: Session::new(config),
            events: event_tx,
            commands: command_rx,
            status: status_tx,
        };
        tokio::spawn(runner.run());

        (GatewayHandle::new(command_tx, status_rx), event_rx)
    }
}

/// How one socket's lifetime ended
enum Exit {
    Closed {
        code: u16,
        reason: String,
        cause: DisconnectCause,
    },
    Destroyed,
}

struct Runner {
    session: Session,
    events: mpsc::UnboundedSender<GatewayEvent>,
    commands: mpsc::Receiver<GatewayCommand>,
    status: watch::Sender<ConnectionState>,
}

impl Runner {
    async fn run(mut self) {
        loop {
            let url = self.session.begin_connect();
            self.sync_status();
            info!(url = %url, "Connecting to gateway");

            let socket = match self.open(&url).await {
                None => break,
                Some(Ok(socket)) => socket,
                Some(Err(e)) => {
                    let delay = self.session.on_connect_failed();
                    self.sync_status();
                    warn!(error = %e, delay_ms = delay.as_millis() as u64, "Gateway connection failed");
                    self.emit(GatewayEvent::Error(e.into()));

                    if self.pause(delay).await {
                        continue;
                    }
                    break;
                }
            };

            match self.drive(socket).await {
                Exit::Destroyed => break,
                Exit::Closed { code, reason, cause } => {
                    let (event, next) = self.session.on_close(code, &reason, cause);
                    self.sync_status();
                    self.emit(GatewayEvent::Close(event));

                    match next {
                        NextStep::Stop => break,
                        NextStep::Reconnect { delay, .. } => {
                            if !self.pause(delay).await {
                                break;
                            }
                        }
                    }
                }
            }
        }

        self.sync_status();
        debug!(status = %self.session.status(), "Gateway runner stopped");
    }

    /// Open a socket; `None` if the client was destroyed meanwhile
    async fn open(&mut self, url: &str) -> Option<Result<Socket, tungstenite::Error>> {
        let connect = connect_async(url);
        tokio::pin!(connect);

        loop {
            tokio::select! {
                result = &mut connect => return Some(result.map(|(socket, _)| socket)),
                command = self.commands.recv() => {
                    if !self.idle_command(command) {
                        return None;
                    }
                }
            }
        }
    }

    /// Wait before reconnecting; `false` if the client was destroyed meanwhile
    async fn pause(&mut self, delay: Duration) -> bool {
        if delay.is_zero() {
            return true;
        }
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return true,
                command = self.commands.recv() => {
                    if !self.idle_command(command) {
                        return false;
                    }
                }
            }
        }
    }

    /// Handle a command while no session is open; `false` means stop
    fn idle_command(&mut self, command: Option<GatewayCommand>) -> bool {
        match command {
            Some(GatewayCommand::Send(message)) => {
                warn!(op = %message.op, "Dropping frame sent while disconnected");
                true
            }
            Some(GatewayCommand::Destroy) | None => {
                self.session.destroy();
                self.sync_status();
                false
            }
        }
    }

    /// Run one socket until it closes or the client is destroyed
    async fn drive(&mut self, socket: Socket) -> Exit {
        let (mut sink, mut stream) = socket.split();
        let mut inflater = self.session.config().compress.then(ZlibStreamInflater::new);
        let mut heartbeat: Option<Interval> = None;

        let actions = self.session.on_open();
        self.sync_status();
        if let Some(exit) = self.apply(actions, &mut sink, &mut heartbeat).await {
            return exit;
        }

        loop {
            tokio::select! {
                frame = stream.next() => {
                    let result = match frame {
                        Some(Ok(Message::Text(text))) => self.session.on_text(&text),
                        Some(Ok(Message::Binary(bytes))) => match inflater.as_mut() {
                            Some(inflater) => match inflater.push(&bytes) {
                                Ok(Some(payload)) => self.session.on_frame(&payload),
                                Ok(None) => continue,
                                Err(e) => Err(e),
                            },
                            None => self.session.on_frame(&bytes),
                        },
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame.map_or((CLOSE_NO_STATUS, String::new()), |f| {
                                (u16::from(f.code), f.reason.into_owned())
                            });
                            return Exit::Closed { code, reason, cause: DisconnectCause::Remote };
                        }
                        // Ping replies are handled by tungstenite
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            warn!(error = %e, "Gateway socket error");
                            self.emit(GatewayEvent::Error(e.into()));
                            return Exit::Closed {
                                code: CLOSE_ABNORMAL,
                                reason: String::new(),
                                cause: DisconnectCause::Remote,
                            };
                        }
                        None => {
                            return Exit::Closed {
                                code: CLOSE_ABNORMAL,
                                reason: String::new(),
                                cause: DisconnectCause::Remote,
                            };
                        }
                    };

                    match result {
                        Ok(actions) => {
                            self.sync_status();
                            if let Some(exit) = self.apply(actions, &mut sink, &mut heartbeat).await {
                                return exit;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Dropping undecodable frame");
                            self.emit(GatewayEvent::Error(e));
                        }
                    }
                }
                () = next_tick(&mut heartbeat) => {
                    let actions = self.session.on_heartbeat_tick();
                    if let Some(exit) = self.apply(actions, &mut sink, &mut heartbeat).await {
                        return exit;
                    }
                }
                command = self.commands.recv() => match command {
                    Some(GatewayCommand::Send(message)) => {
                        if self.session.status().is_connected() {
                            if let Err(e) = send_frame(&mut sink, &message).await {
                                warn!(error = %e, op = %message.op, "Failed to send frame");
                                self.emit(GatewayEvent::Error(e));
                            }
                        } else {
                            warn!(op = %message.op, status = %self.session.status(), "Dropping frame sent before session is ready");
                        }
                    }
                    Some(GatewayCommand::Destroy) | None => {
                        close(&mut sink, CLOSE_NORMAL, "destroyed").await;
                        self.session.destroy();
                        self.sync_status();
                        return Exit::Destroyed;
                    }
                }
            }
        }
    }

    /// Carry out session actions; returns an exit if one of them ends the socket
    async fn apply(
        &mut self,
        actions: Vec<SessionAction>,
        sink: &mut SocketSink,
        heartbeat: &mut Option<Interval>,
    ) -> Option<Exit> {
        for action in actions {
            match action {
                SessionAction::Send(message) => {
                    if let Err(e) = send_frame(sink, &message).await {
                        warn!(error = %e, op = %message.op, "Failed to send frame");
                        self.emit(GatewayEvent::Error(e));
                    }
                }
                SessionAction::StartHeartbeat(period) => {
                    let mut timer = interval_at(Instant::now() + period, period);
                    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    *heartbeat = Some(timer);
                }
                SessionAction::Emit(event) => self.emit(event),
                SessionAction::Reconnect(cause) => {
                    close(sink, CLOSE_RECONNECT, cause.as_str()).await;
                    return Some(Exit::Closed {
                        code: CLOSE_RECONNECT,
                        reason: cause.to_string(),
                        cause,
                    });
                }
            }
        }
        None
    }

    fn emit(&self, event: GatewayEvent) {
        if self.events.send(event).is_err() {
            trace!("Event receiver dropped, discarding event");
        }
    }

    fn sync_status(&self) {
        let current = self.session.status();
        self.status.send_if_modified(|status| {
            if *status == current {
                false
            } else {
                *status = current;
                true
            }
        });
    }
}

/// Resolves on the next heartbeat tick; never while no timer is running
async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn send_frame(sink: &mut SocketSink, message: &GatewayMessage) -> GatewayResult<()> {
    let json = message.to_json()?;
    trace!(op = %message.op, "Sending frame");
    sink.send(Message::Text(json)).await.map_err(GatewayError::from)
}

async fn close(sink: &mut SocketSink, code: u16, reason: &'static str) {
    let frame = CloseFrame {
        code: WsCloseCode::from(code),
        reason: Cow::Borrowed(reason),
    };
    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
        debug!(error = %e, "Close frame not delivered");
    }
}

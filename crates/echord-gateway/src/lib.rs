//! # echord-gateway
//!
//! Client side of the real-time WebSocket gateway.
//!
//! ## Features
//!
//! - **Session**: identify on a fresh socket, resume after a drop, reconnect with backoff
//! - **Heartbeat**: periodic op 1 frames with zombie detection when an ack is missed
//! - **Compression**: optional zlib-stream transport inflation
//! - **Events**: READY, RESUMED, dispatches and closes delivered over a channel
//!
//! ## Example
//!
//! ```ignore
//! use echord_gateway::{GatewayClient, GatewayConfig, GatewayEvent};
//!
//! let (handle, mut events) = GatewayClient::connect(GatewayConfig::new(token, intents));
//! while let Some(event) = events.recv().await {
//!     if let GatewayEvent::Dispatch(dispatch) = event {
//!         println!("{} #{:?}", dispatch.name, dispatch.sequence);
//!     }
//! }
//! handle.destroy().await;
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod handlers;
pub mod protocol;
pub mod session;

pub use client::{GatewayClient, GatewayHandle};
pub use config::{GatewayConfig, DEFAULT_GATEWAY_URL, DEFAULT_GATEWAY_VERSION};
pub use connection::{ConnectionState, SessionState, ZlibStreamInflater};
pub use error::{GatewayError, GatewayResult};
pub use events::{CloseEvent, DispatchEvent, GatewayEvent, GatewayEventType, ReadyEvent};
pub use protocol::{
    Activity, CloseCode, GatewayMessage, OpCode, PresenceUpdatePayload, RequestGuildMembersPayload,
    Status,
};
pub use session::{Backoff, DisconnectCause, NextStep, Session, SessionAction};

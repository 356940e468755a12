//! Gateway events
//!
//! Typed events the client hands to the application.

mod event_types;
mod payloads;

pub use event_types::GatewayEventType;
pub use payloads::{CloseEvent, DispatchEvent, GatewayEvent, ReadyEvent};

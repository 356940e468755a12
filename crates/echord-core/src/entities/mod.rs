//! Entity records decoded from gateway and REST payloads
//!
//! Only the fields the typed caches index are modeled; unknown fields are ignored.

mod channel;
mod guild;
mod message;
mod user;

pub use channel::{Channel, ChannelType};
pub use guild::Guild;
pub use message::Message;
pub use user::User;

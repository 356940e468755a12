//! # echord-core
//!
//! Value objects and the entity records the client mirrors from the remote API.
//! This crate has no dependencies on transport, caching or the async runtime.

pub mod entities;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Channel, ChannelType, Guild, Message, User};
pub use value_objects::{GatewayIntents, Snowflake, SnowflakeParseError};

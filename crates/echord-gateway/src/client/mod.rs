//! Gateway client
//!
//! [`GatewayClient::connect`] spawns the connection task and returns a
//! [`GatewayHandle`] plus the event stream.

mod handle;
mod runner;

pub use handle::GatewayHandle;
pub use runner::GatewayClient;

//! Connection state
//!
//! Per-connection transport details and the session data that survives reconnects.

mod compression;
mod session;
mod state;

pub use compression::ZlibStreamInflater;
pub use session::SessionState;
pub use state::ConnectionState;

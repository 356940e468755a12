//! Generic bounded store.

mod entity_cache;
mod options;

pub use entity_cache::EntityCache;
pub use options::{CacheOptions, SweepFilter};

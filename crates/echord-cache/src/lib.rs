//! # echord-cache
//!
//! Local mirror of remote entities.
//!
//! ## Features
//!
//! - **EntityCache**: generic key/value store with LRU eviction on insert
//! - **TTL**: cache-wide idle expiry plus optional per-entry deadlines
//! - **Sweeping**: background timer removing expired or filtered entries
//! - **Typed caches**: guild, channel, message and user caches with lookup helpers
//!
//! ## Example
//!
//! ```ignore
//! use echord_cache::{CacheManager, CacheOptions, EntityCache};
//!
//! let cache: EntityCache<String, u32> =
//!     EntityCache::new(CacheOptions::default().with_max_size(2));
//! cache.set("a".into(), 1);
//! assert_eq!(cache.get(&"a".into()), Some(1));
//!
//! let caches = CacheManager::new();
//! caches.users.set(user.id, user);
//! ```

pub mod entities;
pub mod manager;
pub mod store;

pub use entities::{ChannelCache, GuildCache, MessageCache, UserCache};
pub use manager::CacheManager;
pub use store::{CacheOptions, EntityCache, SweepFilter};

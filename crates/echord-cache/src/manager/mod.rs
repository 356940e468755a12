//! Aggregate of the typed caches.

mod cache_manager;

pub use cache_manager::CacheManager;

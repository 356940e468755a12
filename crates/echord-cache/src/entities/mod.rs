//! Typed caches over the mirrored entity records.

mod channel_cache;
mod guild_cache;
mod message_cache;
mod user_cache;

pub use channel_cache::ChannelCache;
pub use guild_cache::GuildCache;
pub use message_cache::MessageCache;
pub use user_cache::UserCache;

/// Exact match, or case-insensitive substring match
fn name_matches(candidate: &str, query: &str, exact: bool) -> bool {
    if exact {
        candidate == query
    } else {
        candidate.to_lowercase().contains(&query.to_lowercase())
    }
}

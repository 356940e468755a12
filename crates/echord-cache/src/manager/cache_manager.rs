//! One cache per mirrored entity kind.

use echord_common::CacheSettings;
use tracing::debug;

use crate::entities::{ChannelCache, GuildCache, MessageCache, UserCache};

/// Holds the guild, channel, message and user caches
///
/// Must be constructed inside a tokio runtime for the message cache's
/// background sweep to run.
pub struct CacheManager {
    pub guilds: GuildCache,
    pub channels: ChannelCache,
    pub messages: MessageCache,
    pub users: UserCache,
}

impl CacheManager {
    /// Create caches with their per-kind defaults
    pub fn new() -> Self {
        Self::from_settings(&CacheSettings::default())
    }

    /// Create caches, overlaying configured overrides on the defaults
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            guilds: GuildCache::from_settings(&settings.guilds),
            channels: ChannelCache::from_settings(&settings.channels),
            messages: MessageCache::from_settings(&settings.messages),
            users: UserCache::from_settings(&settings.users),
        }
    }

    pub fn clear(&self) {
        self.guilds.clear();
        self.channels.clear();
        self.messages.clear();
        self.users.clear();
    }

    /// Sweep every cache, returning the total number of entries removed
    pub fn sweep(&self) -> usize {
        let removed = self.guilds.sweep(None)
            + self.channels.sweep(None)
            + self.messages.sweep(None)
            + self.users.sweep(None);
        debug!(removed, "Swept all caches");
        removed
    }

    /// Stop every background sweep
    pub fn destroy(&self) {
        self.guilds.destroy();
        self.channels.destroy();
        self.messages.destroy();
        self.users.destroy();
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

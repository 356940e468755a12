//! Channel cache.

use echord_common::CacheKindSettings;
use echord_core::{Channel, ChannelType, Snowflake};
use std::ops::Deref;

use super::name_matches;
use crate::store::{CacheOptions, EntityCache};

/// Cache of channels keyed by ID
pub struct ChannelCache {
    inner: EntityCache<Snowflake, Channel>,
}

impl ChannelCache {
    /// Large guilds can have many channels
    pub const DEFAULT_MAX_SIZE: usize = 1000;

    pub fn new() -> Self {
        Self::with_options(Self::default_options())
    }

    pub fn with_options(options: CacheOptions<Snowflake, Channel>) -> Self {
        Self {
            inner: EntityCache::new(options),
        }
    }

    pub fn from_settings(settings: &CacheKindSettings) -> Self {
        Self::with_options(Self::default_options().apply(settings))
    }

    pub fn default_options() -> CacheOptions<Snowflake, Channel> {
        CacheOptions::default().with_max_size(Self::DEFAULT_MAX_SIZE)
    }

    /// Channels without a name (DMs) never match
    pub fn find_by_name(&self, name: &str, exact: bool) -> Option<Channel> {
        self.inner.find_one(|channel| {
            channel
                .name
                .as_deref()
                .is_some_and(|n| name_matches(n, name, exact))
        })
    }

    pub fn find_all_by_name(&self, name: &str, exact: bool) -> Vec<Channel> {
        self.inner.find_many(|channel| {
            channel
                .name
                .as_deref()
                .is_some_and(|n| name_matches(n, name, exact))
        })
    }

    pub fn find_by_type(&self, kind: ChannelType) -> Vec<Channel> {
        self.inner.find_many(|channel| channel.kind == kind)
    }

    pub fn find_by_guild(&self, guild_id: Snowflake) -> Vec<Channel> {
        self.inner
            .find_many(|channel| channel.guild_id == Some(guild_id))
    }

    pub fn find_by_category(&self, category_id: Snowflake) -> Vec<Channel> {
        self.inner
            .find_many(|channel| channel.parent_id == Some(category_id))
    }

    pub fn find_text_channels(&self) -> Vec<Channel> {
        self.find_by_type(ChannelType::GuildText)
    }

    pub fn find_voice_channels(&self) -> Vec<Channel> {
        self.find_by_type(ChannelType::GuildVoice)
    }

    pub fn find_categories(&self) -> Vec<Channel> {
        self.find_by_type(ChannelType::GuildCategory)
    }

    pub fn find_threads(&self) -> Vec<Channel> {
        self.inner.find_many(|channel| channel.kind.is_thread())
    }
}

impl Default for ChannelCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for ChannelCache {
    type Target = EntityCache<Snowflake, Channel>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

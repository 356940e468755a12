//! Message cache.

use chrono::{DateTime, Utc};
use echord_common::CacheKindSettings;
use echord_core::{Message, Snowflake};
use std::ops::Deref;
use std::time::Duration;

use super::name_matches;
use crate::store::{CacheOptions, EntityCache};

/// Cache of recent messages keyed by ID
///
/// Messages expire after an hour without access and are swept every five
/// minutes unless configured otherwise.
pub struct MessageCache {
    inner: EntityCache<Snowflake, Message>,
}

impl MessageCache {
    pub const DEFAULT_MAX_SIZE: usize = 200;
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

    pub fn new() -> Self {
        Self::with_options(Self::default_options())
    }

    pub fn with_options(options: CacheOptions<Snowflake, Message>) -> Self {
        Self {
            inner: EntityCache::new(options),
        }
    }

    pub fn from_settings(settings: &CacheKindSettings) -> Self {
        Self::with_options(Self::default_options().apply(settings))
    }

    pub fn default_options() -> CacheOptions<Snowflake, Message> {
        CacheOptions::default()
            .with_max_size(Self::DEFAULT_MAX_SIZE)
            .with_ttl(Self::DEFAULT_TTL)
            .with_sweep_interval(Self::DEFAULT_SWEEP_INTERVAL)
    }

    pub fn find_by_content(&self, content: &str, exact: bool) -> Option<Message> {
        self.inner
            .find_one(|message| name_matches(&message.content, content, exact))
    }

    pub fn find_all_by_content(&self, content: &str, exact: bool) -> Vec<Message> {
        self.inner
            .find_many(|message| name_matches(&message.content, content, exact))
    }

    pub fn find_by_author(&self, author_id: Snowflake) -> Vec<Message> {
        self.inner
            .find_many(|message| message.author.id == author_id)
    }

    pub fn find_by_channel(&self, channel_id: Snowflake) -> Vec<Message> {
        self.inner
            .find_many(|message| message.channel_id == channel_id)
    }

    pub fn find_pinned(&self) -> Vec<Message> {
        self.inner.find_many(|message| message.pinned)
    }

    /// Messages sent strictly before `date`
    pub fn find_before(&self, date: DateTime<Utc>) -> Vec<Message> {
        self.inner.find_many(|message| message.timestamp < date)
    }

    /// Messages sent strictly after `date`
    pub fn find_after(&self, date: DateTime<Utc>) -> Vec<Message> {
        self.inner.find_many(|message| message.timestamp > date)
    }

    pub fn find_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Message> {
        self.inner
            .find_many(|message| message.timestamp > start && message.timestamp < end)
    }
}

impl Default for MessageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for MessageCache {
    type Target = EntityCache<Snowflake, Message>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

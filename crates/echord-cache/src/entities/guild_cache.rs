//! Guild cache.

use echord_common::CacheKindSettings;
use echord_core::{Guild, Snowflake};
use std::ops::Deref;

use super::name_matches;
use crate::store::{CacheOptions, EntityCache};

/// Cache of guilds keyed by ID
pub struct GuildCache {
    inner: EntityCache<Snowflake, Guild>,
}

impl GuildCache {
    /// Most bots are in fewer guilds than this
    pub const DEFAULT_MAX_SIZE: usize = 100;

    pub fn new() -> Self {
        Self::with_options(Self::default_options())
    }

    pub fn with_options(options: CacheOptions<Snowflake, Guild>) -> Self {
        Self {
            inner: EntityCache::new(options),
        }
    }

    pub fn from_settings(settings: &CacheKindSettings) -> Self {
        Self::with_options(Self::default_options().apply(settings))
    }

    pub fn default_options() -> CacheOptions<Snowflake, Guild> {
        CacheOptions::default().with_max_size(Self::DEFAULT_MAX_SIZE)
    }

    pub fn find_by_name(&self, name: &str, exact: bool) -> Option<Guild> {
        self.inner
            .find_one(|guild| name_matches(&guild.name, name, exact))
    }

    pub fn find_all_by_name(&self, name: &str, exact: bool) -> Vec<Guild> {
        self.inner
            .find_many(|guild| name_matches(&guild.name, name, exact))
    }

    pub fn find_by_owner(&self, owner_id: Snowflake) -> Vec<Guild> {
        self.inner
            .find_many(|guild| guild.owner_id == Some(owner_id))
    }
}

impl Default for GuildCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for GuildCache {
    type Target = EntityCache<Snowflake, Guild>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

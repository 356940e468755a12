//! User cache.

use echord_common::CacheKindSettings;
use echord_core::{Snowflake, User};
use std::ops::Deref;

use super::name_matches;
use crate::store::{CacheOptions, EntityCache};

/// Cache of users keyed by ID
pub struct UserCache {
    inner: EntityCache<Snowflake, User>,
}

impl UserCache {
    pub const DEFAULT_MAX_SIZE: usize = 1000;

    pub fn new() -> Self {
        Self::with_options(Self::default_options())
    }

    pub fn with_options(options: CacheOptions<Snowflake, User>) -> Self {
        Self {
            inner: EntityCache::new(options),
        }
    }

    pub fn from_settings(settings: &CacheKindSettings) -> Self {
        Self::with_options(Self::default_options().apply(settings))
    }

    pub fn default_options() -> CacheOptions<Snowflake, User> {
        CacheOptions::default().with_max_size(Self::DEFAULT_MAX_SIZE)
    }

    pub fn find_by_username(&self, username: &str, exact: bool) -> Option<User> {
        self.inner
            .find_one(|user| name_matches(&user.username, username, exact))
    }

    pub fn find_all_by_username(&self, username: &str, exact: bool) -> Vec<User> {
        self.inner
            .find_many(|user| name_matches(&user.username, username, exact))
    }

    /// Find by `username#discriminator`, or bare username for migrated accounts
    pub fn find_by_tag(&self, tag: &str) -> Option<User> {
        self.inner.find_one(|user| user.tag() == tag)
    }

    pub fn find_bots(&self) -> Vec<User> {
        self.inner.find_many(|user| user.bot)
    }

    pub fn find_system_users(&self) -> Vec<User> {
        self.inner.find_many(|user| user.system)
    }
}

impl Default for UserCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for UserCache {
    type Target = EntityCache<Snowflake, User>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

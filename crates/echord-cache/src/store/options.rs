//! Cache construction options.

use echord_common::CacheKindSettings;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Predicate selecting entries to drop during a sweep
pub type SweepFilter<K, V> = Arc<dyn Fn(&K, &V) -> bool + Send + Sync>;

/// Options for an [`EntityCache`](super::EntityCache)
pub struct CacheOptions<K, V> {
    /// Maximum number of entries; `None` means unbounded
    pub max_size: Option<usize>,
    /// Idle time after which an entry is eligible for sweeping
    pub ttl: Option<Duration>,
    /// Period of the background sweep; `None` disables the timer
    pub sweep_interval: Option<Duration>,
    /// Filter applied by sweeps that do not pass their own
    pub sweep_filter: Option<SweepFilter<K, V>>,
}

impl<K, V> Default for CacheOptions<K, V> {
    fn default() -> Self {
        Self {
            max_size: None,
            ttl: None,
            sweep_interval: None,
            sweep_filter: None,
        }
    }
}

impl<K, V> Clone for CacheOptions<K, V> {
    fn clone(&self) -> Self {
        Self {
            max_size: self.max_size,
            ttl: self.ttl,
            sweep_interval: self.sweep_interval,
            sweep_filter: self.sweep_filter.clone(),
        }
    }
}

impl<K, V> fmt::Debug for CacheOptions<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .field("sweep_interval", &self.sweep_interval)
            .field("sweep_filter", &self.sweep_filter.is_some())
            .finish()
    }
}

impl<K, V> CacheOptions<K, V> {
    #[must_use]
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn with_sweep_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&K, &V) -> bool + Send + Sync + 'static,
    {
        self.sweep_filter = Some(Arc::new(filter));
        self
    }

    /// Overlay configured overrides; unset fields keep the current value
    #[must_use]
    pub fn apply(mut self, settings: &CacheKindSettings) -> Self {
        if let Some(max_size) = settings.max_size {
            self.max_size = Some(max_size);
        }
        if let Some(ttl) = settings.ttl {
            self.ttl = Some(ttl);
        }
        if let Some(interval) = settings.sweep_interval {
            self.sweep_interval = Some(interval);
        }
        self
    }
}

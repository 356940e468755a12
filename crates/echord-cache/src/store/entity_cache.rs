//! Bounded key/value store with LRU eviction and TTL sweeping.
//!
//! Eviction by capacity happens synchronously inside `set`. Expiry is lazy:
//! a stale entry stays readable until a sweep pass removes it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use super::options::{CacheOptions, SweepFilter};

struct CacheEntry<V> {
    value: V,
    last_access: Instant,
    /// Monotonic access counter, orders entries touched within the same instant
    access_tick: u64,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant, ttl: Option<Duration>) -> bool {
        let idle = ttl.is_some_and(|ttl| now.saturating_duration_since(self.last_access) > ttl);
        let deadline = self.expires_at.is_some_and(|at| now >= at);
        idle || deadline
    }
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    tick: u64,
}

impl<K: Eq + Hash, V> CacheState<K, V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_lru(&mut self) -> bool
    where
        K: Clone,
    {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.access_tick)
            .map(|(key, _)| key.clone());

        match oldest {
            Some(key) => self.entries.remove(&key).is_some(),
            None => false,
        }
    }
}

struct Shared<K, V> {
    state: Mutex<CacheState<K, V>>,
    max_size: Option<usize>,
    ttl: Option<Duration>,
    sweep_filter: Option<SweepFilter<K, V>>,
}

impl<K: Eq + Hash, V> Shared<K, V> {
    fn sweep(&self, filter: Option<&dyn Fn(&K, &V) -> bool>) -> usize {
        let configured = self
            .sweep_filter
            .as_deref()
            .map(|f| f as &dyn Fn(&K, &V) -> bool);
        let filter = filter.or(configured);

        let now = Instant::now();
        let mut state = self.state.lock();
        let before = state.entries.len();

        state.entries.retain(|key, entry| {
            let expired = entry.is_expired(now, self.ttl);
            let matched = filter.is_some_and(|f| f(key, &entry.value));
            !(expired || matched)
        });

        before - state.entries.len()
    }
}

/// Generic entity cache
///
/// All operations on one instance are serialized through a single lock,
/// including the background sweep. Values are returned by clone.
pub struct EntityCache<K, V> {
    shared: Arc<Shared<K, V>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> EntityCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Create a cache; starts the sweep timer when `sweep_interval` is set
    pub fn new(options: CacheOptions<K, V>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                tick: 0,
            }),
            // a zero capacity would make every insert evict itself
            max_size: options.max_size.map(|n| n.max(1)),
            ttl: options.ttl,
            sweep_filter: options.sweep_filter,
        });

        let sweeper = options
            .sweep_interval
            .and_then(|every| spawn_sweeper(Arc::downgrade(&shared), every));

        Self {
            shared,
            sweeper: Mutex::new(sweeper),
        }
    }

    /// Get a value, refreshing its access time
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.shared.state.lock();
        let tick = state.next_tick();
        let entry = state.entries.get_mut(key)?;
        entry.last_access = Instant::now();
        entry.access_tick = tick;
        Some(entry.value.clone())
    }

    /// Get a value without touching its access time
    pub fn peek(&self, key: &K) -> Option<V> {
        self.shared
            .state
            .lock()
            .entries
            .get(key)
            .map(|entry| entry.value.clone())
    }

    /// Insert or replace a value
    ///
    /// A new key inserted at capacity evicts the least recently used entry
    /// first. Replacing a value keeps any per-entry TTL already installed.
    pub fn set(&self, key: K, value: V) {
        let mut state = self.shared.state.lock();
        let tick = state.next_tick();
        let now = Instant::now();

        if let Some(entry) = state.entries.get_mut(&key) {
            entry.value = value;
            entry.last_access = now;
            entry.access_tick = tick;
            return;
        }

        if let Some(max) = self.shared.max_size {
            if state.entries.len() >= max && state.evict_lru() {
                trace!(max_size = max, "Evicted least recently used cache entry");
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                value,
                last_access: now,
                access_tick: tick,
                expires_at: None,
            },
        );
    }

    /// Remove one entry, returning whether it was present
    pub fn delete(&self, key: &K) -> bool {
        self.shared.state.lock().entries.remove(key).is_some()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.shared.state.lock().entries.clear();
    }

    /// Remove expired entries and entries matching the filter
    ///
    /// Falls back to the configured sweep filter when `filter` is `None`.
    /// Returns the number of entries removed.
    pub fn sweep(&self, filter: Option<&dyn Fn(&K, &V) -> bool>) -> usize {
        self.shared.sweep(filter)
    }

    /// Install (`Some`) or clear (`None`) an expiry deadline for one entry
    ///
    /// A duration too large to express as a deadline means the entry never
    /// expires. Returns `false` if the key is not cached.
    pub fn set_entry_ttl(&self, key: &K, ttl: Option<Duration>) -> bool {
        let mut state = self.shared.state.lock();
        match state.entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
                true
            }
            None => false,
        }
    }

    /// First value matching the predicate, in no particular order
    pub fn find_one<P>(&self, predicate: P) -> Option<V>
    where
        P: Fn(&V) -> bool,
    {
        self.shared
            .state
            .lock()
            .entries
            .values()
            .find(|entry| predicate(&entry.value))
            .map(|entry| entry.value.clone())
    }

    /// All values matching the predicate
    pub fn find_many<P>(&self, predicate: P) -> Vec<V>
    where
        P: Fn(&V) -> bool,
    {
        self.shared
            .state
            .lock()
            .entries
            .values()
            .filter(|entry| predicate(&entry.value))
            .map(|entry| entry.value.clone())
            .collect()
    }

    /// Get several values; missing keys are skipped
    pub fn get_many<'a, I>(&self, keys: I) -> Vec<V>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        keys.into_iter().filter_map(|key| self.get(key)).collect()
    }

    pub fn set_many<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// Delete several keys, returning how many were present
    pub fn delete_many<'a, I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        keys.into_iter().filter(|key| self.delete(key)).count()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.shared.state.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<K> {
        self.shared.state.lock().entries.keys().cloned().collect()
    }

    /// Stop the background sweep; entries are kept
    pub fn destroy(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            debug!("Cache sweeper stopped");
        }
    }
}

impl<K, V> Default for EntityCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl<K, V> Drop for EntityCache<K, V> {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

fn spawn_sweeper<K, V>(shared: Weak<Shared<K, V>>, every: Duration) -> Option<JoinHandle<()>>
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    if every.is_zero() {
        warn!("Ignoring zero cache sweep interval");
        return None;
    }

    let Ok(runtime) = Handle::try_current() else {
        warn!("No tokio runtime available, cache sweeping disabled");
        return None;
    };

    let Some(first) = Instant::now().checked_add(every) else {
        warn!(?every, "Cache sweep interval out of range, cache sweeping disabled");
        return None;
    };

    Some(runtime.spawn(async move {
        let mut ticker = interval_at(first, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(cache) = shared.upgrade() else {
                break;
            };

            let removed = cache.sweep(None);
            if removed > 0 {
                debug!(removed, "Cache sweep removed entries");
            }
        }
    }))
}

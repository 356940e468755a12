//! Learned mapping from endpoints to server bucket hashes.

use dashmap::DashMap;
use tracing::debug;

use super::route::Route;

/// Maps `"{METHOD} {template}"` to the bucket hash the server reported for it
#[derive(Debug, Default)]
pub struct BucketRegistry {
    hashes: DashMap<String, String>,
}

impl BucketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket key for a route: `"{hash}:{major}"` once learned, otherwise
    /// the route's provisional key
    pub fn resolve(&self, route: &Route) -> String {
        match self.hashes.get(&route.endpoint()) {
            Some(hash) => format!("{}:{}", hash.value(), route.major()),
            None => route.provisional_key(),
        }
    }

    /// Record the hash reported for an endpoint
    pub fn learn(&self, endpoint: &str, hash: &str) {
        let previous = self.hashes.insert(endpoint.to_string(), hash.to_string());
        if previous.as_deref() != Some(hash) {
            debug!(endpoint, bucket = hash, "Learned rate limit bucket");
        }
    }

    pub fn hash_for(&self, endpoint: &str) -> Option<String> {
        self.hashes.get(endpoint).map(|h| h.value().clone())
    }
}

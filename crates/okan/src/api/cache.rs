//! TTL-based caching for query results.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::time::{Duration, Instant};

/// Identifies a cached query: the resource it reads plus the scope it was read for
/// (usually a user id, or a slug for public pages).
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct QueryKey {
    resource: &'static str,
    scope: String,
}

impl QueryKey {
    pub fn new(resource: &'static str, scope: impl Into<String>) -> Self {
        Self {
            resource,
            scope: scope.into(),
        }
    }

    /// A key for data that does not depend on who is asking.
    pub fn global(resource: &'static str) -> Self {
        Self::new(resource, "")
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.scope.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}:{}", self.resource, self.scope)
        }
    }
}

/// A session key derived from an access token, used for identity cache lookups.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct SessionKey(String);

impl SessionKey {
    /// Creates a session key from a raw access token.
    ///
    /// The token is hashed to avoid keeping bearer credentials in memory as map keys.
    pub fn from_token(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let result = hasher.finalize();
        // First 16 bytes as hex
        Self(hex::encode(&result[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show first 8 chars for privacy
        write!(f, "{}...", &self.0[..8.min(self.0.len())])
    }
}

#[derive(Clone)]
struct CachedEntry<V> {
    value: V,
    cached_at: Instant,
    ttl: Duration,
}

impl<V> CachedEntry<V> {
    fn is_fresh(&self) -> bool {
        self.cached_at.elapsed() < self.ttl
    }
}

/// Thread-safe TTL cache.
///
/// Uses DashMap for concurrent access without external locking. Entries older than their TTL
/// are treated as missing and dropped on access.
pub struct QueryCache<V, K = QueryKey>
where
    K: std::hash::Hash + Eq,
{
    entries: DashMap<K, CachedEntry<V>>,
    default_ttl: Duration,
}

impl<V, K> QueryCache<V, K>
where
    V: Clone,
    K: std::hash::Hash + Eq + Clone,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Gets a cached value if it exists and hasn't expired.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).and_then(|entry| {
            if entry.is_fresh() {
                Some(entry.value.clone())
            } else {
                drop(entry);
                self.entries.remove(key);
                None
            }
        })
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.entries.insert(
            key,
            CachedEntry {
                value,
                cached_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Returns the cached value, or runs `fetch` and caches its result.
    ///
    /// Errors are returned as-is and never cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }

        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Invalidates (removes) a cached entry.
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Removes every entry whose key matches `predicate`.
    pub fn invalidate_where(&self, predicate: impl Fn(&K) -> bool) {
        self.entries.retain(|key, _| !predicate(key));
    }

    /// Returns the number of entries in the cache (including expired ones).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes expired entries from the cache.
    pub fn cleanup_expired(&self) {
        self.entries.retain(|_, entry| entry.is_fresh());
    }

    pub fn stats(&self) -> CacheStats {
        let mut total = 0;
        let mut expired = 0;

        for entry in self.entries.iter() {
            total += 1;
            if !entry.is_fresh() {
                expired += 1;
            }
        }

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

impl<V: Clone> QueryCache<V, QueryKey> {
    /// Drops every scope cached for `resource`.
    pub fn invalidate_resource(&self, resource: &str) {
        self.invalidate_where(|key| key.resource() == resource);
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

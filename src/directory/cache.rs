//! Single-entry TTL cache for the merged directory

use crate::config::MAX_CACHE_TTL_SECS;
use crate::directory::Directory;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub refreshes: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> u32 {
        let lookups = self.hits + self.misses;
        if lookups > 0 {
            (self.hits as f32 / lookups as f32 * 100.0) as u32
        } else {
            0
        }
    }
}

/// The last directory built and when it goes stale. Replaced as a whole, never edited.
#[derive(Debug, Clone)]
struct CacheEntry {
    directory: Option<Arc<Directory>>,
    expires_at: Instant,
}

/// Holds "the directory as of the last successful fetch".
///
/// Expiry is checked lazily on `get`; nothing is refreshed in the background
/// and nothing is evicted. Directory and expiry live under one lock, so a
/// reader never sees one without the other.
pub struct DirectoryCache {
    entry: RwLock<CacheEntry>,
    stats: RwLock<CacheStats>,
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryCache {
    pub fn new() -> Self {
        Self {
            entry: RwLock::new(CacheEntry {
                directory: None,
                expires_at: Instant::now(),
            }),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Cached directory if still fresh; `None` is a miss and triggers nothing
    pub async fn get(&self) -> Option<Arc<Directory>> {
        let fresh = self.peek().await;

        let mut stats = self.stats.write().await;
        if fresh.is_some() {
            stats.hits += 1;
            tracing::trace!("Directory cache hit");
        } else {
            stats.misses += 1;
            tracing::debug!("Directory cache miss");
        }
        fresh
    }

    /// Like `get`, but leaves the hit/miss counters alone
    pub async fn peek(&self) -> Option<Arc<Directory>> {
        let entry = self.entry.read().await;
        match &entry.directory {
            Some(directory) if Instant::now() < entry.expires_at => Some(directory.clone()),
            _ => None,
        }
    }

    /// Replace the entry; it expires `ttl` from now, capped at `MAX_CACHE_TTL_SECS`
    pub async fn put(&self, directory: Arc<Directory>, ttl: Duration) {
        let ttl = ttl.min(Duration::from_secs(MAX_CACHE_TTL_SECS));
        let destinations = directory.len();
        {
            let mut entry = self.entry.write().await;
            *entry = CacheEntry {
                directory: Some(directory),
                expires_at: Instant::now() + ttl,
            };
        }
        self.stats.write().await.refreshes += 1;

        tracing::info!(
            destinations = destinations,
            ttl_secs = ttl.as_secs(),
            "Directory cached"
        );
    }

    /// Time left before the current entry goes stale
    pub async fn time_to_live(&self) -> Option<Duration> {
        let entry = self.entry.read().await;
        entry.directory.as_ref()?;
        entry.expires_at.checked_duration_since(Instant::now())
    }

    pub async fn get_stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    /// Log cache statistics (for periodic monitoring)
    pub async fn log_stats(&self) {
        let stats = self.get_stats().await;

        tracing::info!(
            hits = stats.hits,
            misses = stats.misses,
            refreshes = stats.refreshes,
            hit_rate = stats.hit_rate(),
            "Directory cache statistics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{Destination, DestinationKind};

    fn directory(ids: &[&str]) -> Arc<Directory> {
        Arc::new(Directory::new(
            ids.iter()
                .map(|id| Destination {
                    id: id.to_string(),
                    display_name: id.to_string(),
                    secondary_label: None,
                    kind: DestinationKind::Channel,
                    is_private: false,
                    is_archived: false,
                    member_count: None,
                })
                .collect(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_cache_misses() {
        let cache = DirectoryCache::new();

        assert!(cache.get().await.is_none());
        assert!(cache.time_to_live().await.is_none());
        assert_eq!(cache.get_stats().await.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_within_ttl_returns_stored_directory() {
        let cache = DirectoryCache::new();
        let stored = directory(&["C1", "U1"]);

        cache.put(stored.clone(), Duration::from_secs(60)).await;
        tokio::time::advance(Duration::from_secs(59)).await;

        let cached = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&cached, &stored));
        assert_eq!(cache.time_to_live().await, Some(Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_after_ttl_misses() {
        let cache = DirectoryCache::new();

        cache.put(directory(&["C1"]), Duration::from_secs(60)).await;
        tokio::time::advance(Duration::from_secs(60)).await;

        assert!(cache.get().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_replaces_whole_entry() {
        let cache = DirectoryCache::new();

        cache.put(directory(&["C1"]), Duration::from_secs(10)).await;
        tokio::time::advance(Duration::from_secs(5)).await;
        let newer = directory(&["C2", "C3"]);
        cache.put(newer.clone(), Duration::from_secs(10)).await;
        tokio::time::advance(Duration::from_secs(8)).await;

        let cached = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&cached, &newer));

        let stats = cache.get_stats().await;
        assert_eq!(stats.refreshes, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.hit_rate(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_is_capped() {
        let cache = DirectoryCache::new();

        cache.put(directory(&["C1"]), Duration::MAX).await;

        assert!(cache.get().await.is_some());
        assert_eq!(
            cache.time_to_live().await,
            Some(Duration::from_secs(MAX_CACHE_TTL_SECS))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_peek_does_not_count() {
        let cache = DirectoryCache::new();

        assert!(cache.peek().await.is_none());
        cache.put(directory(&["C1"]), Duration::from_secs(60)).await;
        assert!(cache.peek().await.is_some());

        let stats = cache.get_stats().await;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_is_never_served() {
        let cache = DirectoryCache::new();

        cache.put(directory(&["C1"]), Duration::ZERO).await;

        assert!(cache.get().await.is_none());
    }
}

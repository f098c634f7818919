//! Process-wide byte cache in front of [`Storage`].
//!
//! Shared by every session. Entries are whole file images keyed like the
//! storage they came from; the total size is bounded in bytes and the
//! least-recently-used entries are evicted first.

use std::io;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use crate::storage::Storage;

/// A cached file image.
pub type CachedBytes = Arc<[u8]>;

/// Keyed byte cache. Every operation is safe to call concurrently for any
/// keys without external locking.
pub trait FileCache: Send + Sync {
    /// The cached image for `key`, reading it from `storage` on a miss.
    ///
    /// # Errors
    /// The storage read error on a miss; nothing is cached in that case.
    fn get_or_load(&self, key: &str, storage: &dyn Storage) -> io::Result<CachedBytes>;

    /// Install `bytes` as the image for `key`.
    fn replace(&self, key: &str, bytes: CachedBytes);

    /// Drop the entry for `key`. Returns whether one existed.
    fn delete(&self, key: &str) -> bool;

    /// Total bytes currently held.
    fn size_bytes(&self) -> usize;
}

/// Hit / miss / eviction counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from memory.
    pub hits: u64,
    /// Lookups that went to storage.
    pub misses: u64,
    /// Entries dropped to stay under the byte budget.
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups served from memory.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// [`FileCache`] backed by an LRU list under a single mutex. Storage reads
/// happen outside the lock.
pub struct LruFileCache {
    capacity_bytes: usize,
    inner: Mutex<LruInner>,
}

struct LruInner {
    entries: LruCache<String, CachedBytes>,
    size_bytes: usize,
    stats: CacheStats,
}

impl LruInner {
    fn remove(&mut self, key: &str) -> bool {
        match self.entries.pop(key) {
            Some(old) => {
                self.size_bytes -= old.len();
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, key: &str, bytes: CachedBytes, capacity: usize) {
        self.remove(key);
        // An image bigger than the whole budget is served but not kept.
        if bytes.len() > capacity {
            debug!(key, bytes = bytes.len(), capacity, "Entry exceeds cache capacity");
            return;
        }
        self.size_bytes += bytes.len();
        self.entries.push(key.to_string(), bytes);
        while self.size_bytes > capacity {
            let Some((evicted, old)) = self.entries.pop_lru() else {
                break;
            };
            self.size_bytes -= old.len();
            self.stats.evictions += 1;
            debug!(key = %evicted, bytes = old.len(), "Cache entry evicted");
        }
    }
}

impl LruFileCache {
    /// Empty cache holding at most `capacity_bytes`.
    #[must_use]
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            inner: Mutex::new(LruInner {
                entries: LruCache::unbounded(),
                size_bytes: 0,
                stats: CacheStats::default(),
            }),
        }
    }

    /// Byte budget.
    #[must_use]
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Whether `key` is cached, without touching its recency.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains(key)
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }
}

impl FileCache for LruFileCache {
    fn get_or_load(&self, key: &str, storage: &dyn Storage) -> io::Result<CachedBytes> {
        {
            let mut inner = self.inner.lock();
            if let Some(bytes) = inner.entries.get(key).cloned() {
                inner.stats.hits += 1;
                return Ok(bytes);
            }
            inner.stats.misses += 1;
        }

        let loaded: CachedBytes = storage.read(key)?.into();

        let mut inner = self.inner.lock();
        // Another session may have loaded or replaced the key meanwhile.
        if let Some(existing) = inner.entries.get(key) {
            return Ok(Arc::clone(existing));
        }
        inner.insert(key, Arc::clone(&loaded), self.capacity_bytes);
        Ok(loaded)
    }

    fn replace(&self, key: &str, bytes: CachedBytes) {
        self.inner.lock().insert(key, bytes, self.capacity_bytes);
    }

    fn delete(&self, key: &str) -> bool {
        self.inner.lock().remove(key)
    }

    fn size_bytes(&self) -> usize {
        self.inner.lock().size_bytes
    }
}

impl std::fmt::Debug for LruFileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LruFileCache")
            .field("capacity_bytes", &self.capacity_bytes)
            .field("entries", &inner.entries.len())
            .field("size_bytes", &inner.size_bytes)
            .field("stats", &inner.stats)
            .finish()
    }
}

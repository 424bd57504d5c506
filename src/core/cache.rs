//! File helpers and a small in-memory LRU cache
//!
//! The LRU cache keeps per-run lookups (valuation pages keyed by player slug)
//! so players listed by two clubs in the same season are fetched once.

use lru::LruCache;
use std::{
    fs,
    hash::Hash,
    io::{Read, Write},
    num::NonZeroUsize,
    path::Path,
    sync::Mutex,
};

/// Try to read a file into a String
pub fn try_read_to_string(path: &Path) -> Option<String> {
    let mut f = fs::File::open(path).ok()?;
    let mut s = String::new();

    f.read_to_string(&mut s).ok()?;

    Some(s)
}

/// Write a string to file, creating parent directories
pub fn write_string(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut f = fs::File::create(path)?;
    f.write_all(contents.as_bytes())
}

/// Thread-safe LRU cache for values that are cheap to clone
pub struct MemoryCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    inner: Mutex<LruCache<K, V>>,
    capacity: usize,
}

impl<K, V> MemoryCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Create a cache holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            capacity: cap.get(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(key).cloned()
    }

    pub fn put(&self, key: K, value: V) {
        let mut cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(key, value);
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// (entries, capacity)
    pub fn stats(&self) -> (usize, usize) {
        let cache = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        (cache.len(), self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read_round_trip_creates_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        write_string(&path, "{\"ok\":true}").unwrap();
        assert_eq!(try_read_to_string(&path).as_deref(), Some("{\"ok\":true}"));
    }

    #[test]
    fn test_read_missing_file_is_none() {
        let dir = tempdir().unwrap();
        assert!(try_read_to_string(&dir.path().join("missing.txt")).is_none());
    }

    #[test]
    fn test_memory_cache_evicts_least_recent() {
        let cache: MemoryCache<String, u32> = MemoryCache::new(2);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);

        // touch "a" so "b" becomes the eviction candidate
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        cache.put("c".to_string(), 3);

        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"c".to_string()), Some(3));
        assert_eq!(cache.stats(), (2, 2));
    }

    #[test]
    fn test_memory_cache_zero_capacity_holds_one() {
        let cache: MemoryCache<u8, u8> = MemoryCache::new(0);
        cache.put(1, 1);
        assert_eq!(cache.stats(), (1, 1));
        cache.clear();
        assert_eq!(cache.stats(), (0, 1));
    }
}

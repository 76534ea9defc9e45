//! Bounded LRU cache of canonicalized sounds.
//!
//! Canonicalization (clipping, stereo expansion, resampling) is expensive
//! enough that repeating it for every presentation of the same stimulus
//! would dominate trial setup. The cache maps a stable identity of the
//! source - a file path, or a caller-chosen id for in-memory buffers - to
//! the canonical result. Eviction is strict LRU. The cache lives inside the
//! engine, so reconfiguring the engine (which may change the target rate)
//! naturally discards every entry.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use resona_core::CanonicalSound;

/// Default number of cached sounds.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Stable identity of a cached sound's source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A sound loaded from a file.
    Path(PathBuf),
    /// An in-memory buffer, identified by a caller-chosen id.
    Id(u64),
}

/// Bounded strict-LRU map from source identity to canonicalized sound.
#[derive(Debug)]
pub struct SoundCache {
    capacity: usize,
    map: HashMap<CacheKey, CanonicalSound>,
    /// Keys ordered least- to most-recently used.
    order: VecDeque<CacheKey>,
}

impl SoundCache {
    /// A cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// A cache bounded to `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        SoundCache {
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The configured bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a key, marking it most-recently used on a hit.
    pub fn get(&mut self, key: &CacheKey) -> Option<CanonicalSound> {
        if let Some(sound) = self.map.get(key) {
            let sound = sound.clone();
            self.touch(key);
            Some(sound)
        } else {
            None
        }
    }

    /// Look up a key, computing and inserting the canonical sound on a
    /// miss.
    pub fn get_or_insert_with(
        &mut self,
        key: CacheKey,
        compute: impl FnOnce() -> CanonicalSound,
    ) -> CanonicalSound {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let sound = compute();
        self.insert(key, sound.clone());
        sound
    }

    /// Insert (or replace) an entry, evicting the least-recently used one
    /// when full.
    pub fn insert(&mut self, key: CacheKey, sound: CanonicalSound) {
        if self.map.contains_key(&key) {
            self.map.insert(key.clone(), sound);
            self.touch(&key);
            return;
        }
        if self.map.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.map.remove(&evicted);
            }
        }
        self.map.insert(key.clone(), sound);
        self.order.push_back(key);
    }

    /// Discard every entry.
    pub fn flush(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

impl Default for SoundCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sound(tag: i16) -> CanonicalSound {
        CanonicalSound::from_interleaved(vec![tag, tag], 44100).unwrap()
    }

    #[test]
    fn test_insert_within_capacity_keeps_all() {
        let mut cache = SoundCache::with_capacity(4);
        for i in 0..3 {
            cache.insert(CacheKey::Id(i), sound(i as i16));
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_eviction_is_strict_lru() {
        let mut cache = SoundCache::with_capacity(3);
        for i in 0..3u64 {
            cache.insert(CacheKey::Id(i), sound(i as i16));
        }
        // Touch 0 so 1 becomes the oldest.
        assert!(cache.get(&CacheKey::Id(0)).is_some());
        cache.insert(CacheKey::Id(3), sound(3));

        assert_eq!(cache.len(), 3);
        assert!(cache.get(&CacheKey::Id(1)).is_none(), "LRU entry survived");
        assert!(cache.get(&CacheKey::Id(0)).is_some());
        assert!(cache.get(&CacheKey::Id(2)).is_some());
        assert!(cache.get(&CacheKey::Id(3)).is_some());
    }

    #[test]
    fn test_capacity_bound_holds() {
        let mut cache = SoundCache::with_capacity(8);
        for i in 0..100u64 {
            cache.insert(CacheKey::Id(i), sound(0));
        }
        assert_eq!(cache.len(), 8);
        // The most recent 8 are the survivors.
        for i in 92..100 {
            assert!(cache.get(&CacheKey::Id(i)).is_some());
        }
    }

    #[test]
    fn test_get_or_insert_computes_once() {
        let mut cache = SoundCache::with_capacity(4);
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_insert_with(CacheKey::Id(7), || {
                calls += 1;
                sound(7)
            });
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_flush_empties() {
        let mut cache = SoundCache::with_capacity(4);
        cache.insert(CacheKey::Id(1), sound(1));
        cache.insert(CacheKey::Path(PathBuf::from("a.wav")), sound(2));
        cache.flush();
        assert!(cache.is_empty());
        assert!(cache.get(&CacheKey::Id(1)).is_none());
    }
}

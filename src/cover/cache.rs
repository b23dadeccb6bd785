//! Fixed-capacity in-memory cache with least-recently-used eviction.
//!
//! Every value leaving the cache through `put` is returned to the caller.
//! Values may hold large buffers, so the caller decides how to release them
//! rather than having the cache drop them silently.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use parking_lot::Mutex;

/// Outcome of [`BoundedCache::put_if_absent`].
#[derive(Debug)]
pub struct Insertion<V> {
    /// The value now cached under the key
    pub current: V,
    /// Evicted entry, or the offered value when the key was already cached
    pub displaced: Option<V>,
}

struct Inner<K, V> {
    entries: HashMap<K, V>,
    /// Front = least recently used
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.clone());
    }

    fn evict_oldest(&mut self) -> Option<V> {
        let oldest = self.order.pop_front()?;
        self.entries.remove(&oldest)
    }

    /// Insert a key known to be absent, evicting first when full.
    fn insert_new(&mut self, key: K, value: V, capacity: usize) -> Option<V> {
        let evicted = if self.entries.len() >= capacity {
            self.evict_oldest()
        } else {
            None
        };
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        evicted
    }
}

/// Thread-safe LRU cache holding at most `capacity` entries.
///
/// Each operation runs under a single lock, so no caller can observe a
/// half-finished insertion or eviction.
pub struct BoundedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be at least 1");
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check presence without touching recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Get a cached value, marking it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let value = inner.entries.get(key)?.clone();
        inner.touch(key);
        Some(value)
    }

    /// Insert or replace the value for `key`.
    ///
    /// Returns the replaced value, or the least recently used entry if one
    /// had to be evicted to make room. The caller owns whatever comes back.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let mut inner = self.inner.lock();
        if let Some(old) = inner.entries.get_mut(&key) {
            let replaced = std::mem::replace(old, value);
            inner.touch(&key);
            return Some(replaced);
        }
        inner.insert_new(key, value, self.capacity)
    }

    /// Insert `value` unless `key` is already cached.
    ///
    /// When the key is present the existing value wins, is marked most
    /// recently used, and `value` comes back as `displaced`. Otherwise the
    /// value is inserted and any evicted entry comes back as `displaced`.
    pub fn put_if_absent(&self, key: K, value: V) -> Insertion<V> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.entries.get(&key).cloned() {
            inner.touch(&key);
            return Insertion {
                current: existing,
                displaced: Some(value),
            };
        }
        let current = value.clone();
        let displaced = inner.insert_new(key, value, self.capacity);
        Insertion { current, displaced }
    }

    /// Remove every entry and hand the values back, oldest first.
    pub fn drain(&self) -> Vec<V> {
        let mut inner = self.inner.lock();
        let mut values = Vec::with_capacity(inner.entries.len());
        while let Some(value) = inner.evict_oldest() {
            values.push(value);
        }
        values
    }
}

//! Hash multimap with set-valued buckets.
//!
//! Buckets are created on first insert and removed when they empty, so a
//! multimap that has had every pair removed holds no memory for old keys.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

/// Map from keys to sets of values.
#[derive(Clone, Debug)]
pub struct MultiMap<K, V> {
    map: FxHashMap<K, FxHashSet<V>>,
}

impl<K: Eq + Hash, V: Eq + Hash> MultiMap<K, V> {
    pub fn new() -> Self {
        MultiMap {
            map: FxHashMap::default(),
        }
    }

    /// Add a pair. Returns `false` if it was already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.map.entry(key).or_default().insert(value)
    }

    /// Remove a pair. Returns `false` if it was not present.
    pub fn remove(&mut self, key: &K, value: &V) -> bool {
        let Some(bucket) = self.map.get_mut(key) else {
            return false;
        };
        let removed = bucket.remove(value);
        if bucket.is_empty() {
            self.map.remove(key);
        }
        removed
    }

    /// Iterate over the values stored under `key`.
    pub fn get<'a>(&'a self, key: &K) -> impl Iterator<Item = &'a V> + 'a {
        self.map.get(key).into_iter().flatten()
    }

    pub fn contains(&self, key: &K, value: &V) -> bool {
        self.map.get(key).is_some_and(|bucket| bucket.contains(value))
    }

    /// Number of values stored under `key`.
    pub fn count(&self, key: &K) -> usize {
        self.map.get(key).map_or(0, FxHashSet::len)
    }

    /// Total number of pairs.
    pub fn len(&self) -> usize {
        self.map.values().map(FxHashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }
}

impl<K: Eq + Hash, V: Eq + Hash> Default for MultiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;

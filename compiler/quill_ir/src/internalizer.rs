//! Refcounted structural deduplication.
//!
//! An [`Internalizer`] keeps exactly one live copy of every distinct value it
//! has been handed, together with a count of how many times that value has been
//! acquired and not yet released. The parser uses it as its match bank: each
//! derivation of a match acquires the match once, so the count doubles as the
//! match's support count and the match disappears when its last derivation
//! does.

use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;

/// Outcome of [`Internalizer::acquire`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Acquired {
    /// The value was not present and has been stored with a count of one.
    Created,
    /// The value was already present; its count has been incremented.
    Shared,
}

/// Refcounted set of structurally deduplicated values.
pub struct Internalizer<T> {
    counts: FxHashMap<T, u32>,
}

impl<T: Eq + Hash> Internalizer<T> {
    pub fn new() -> Self {
        Internalizer {
            counts: FxHashMap::default(),
        }
    }

    /// Increment the count of `value`, storing it first if it is new.
    pub fn acquire(&mut self, value: T) -> Acquired {
        let count = self.counts.entry(value).or_insert(0);
        *count += 1;
        if *count == 1 {
            Acquired::Created
        } else {
            Acquired::Shared
        }
    }

    /// Decrement the count of `value`.
    ///
    /// Returns the remaining count (zero when the value was dropped), or `None`
    /// if the value was not present.
    pub fn release(&mut self, value: &T) -> Option<u32> {
        let count = self.counts.get_mut(value)?;
        debug_assert!(*count > 0);
        *count -= 1;
        if *count > 0 {
            return Some(*count);
        }
        self.counts.remove(value);
        Some(0)
    }

    /// Current count of a value; zero if absent.
    pub fn count(&self, value: &T) -> u32 {
        self.counts.get(value).copied().unwrap_or(0)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.counts.contains_key(value)
    }

    /// Number of distinct live values.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate over live values with their counts, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, u32)> {
        self.counts.iter().map(|(value, &count)| (value, count))
    }
}

impl<T: Eq + Hash> Default for Internalizer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Internalizer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Internalizer")
            .field("live", &self.counts.len())
            .finish()
    }
}

//! Per-position fact storage.
//!
//! Every position that facts can be about owns an [`Annotations`] multiset
//! bucketed by annotation kind, so that enumerating "all matches ending here"
//! touches only matches. [`FactAnnotations`] layers the bookkeeping for
//! negative-sense facts on top: such a fact is true while its marker is absent,
//! so the justified ones have to be remembered separately to be retracted when
//! the position goes away.

use std::fmt;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// A value that can be attached to a position.
pub trait Annotation: Clone + Eq + Hash {
    type Kind: Copy + Eq + Hash + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

/// Multiset of annotations bucketed by kind.
#[derive(Clone, Debug)]
pub struct Annotations<A: Annotation> {
    buckets: FxHashMap<A::Kind, FxHashMap<A, u32>>,
}

impl<A: Annotation> Annotations<A> {
    pub fn new() -> Self {
        Annotations {
            buckets: FxHashMap::default(),
        }
    }

    pub fn has(&self, annotation: &A) -> bool {
        self.count(annotation) > 0
    }

    /// Multiplicity of `annotation`.
    pub fn count(&self, annotation: &A) -> u32 {
        self.buckets
            .get(&annotation.kind())
            .and_then(|bucket| bucket.get(annotation))
            .copied()
            .unwrap_or(0)
    }

    /// The stored instance equal to `annotation`.
    pub fn get(&self, annotation: &A) -> Option<&A> {
        self.buckets
            .get(&annotation.kind())?
            .get_key_value(annotation)
            .map(|(stored, _)| stored)
    }

    /// Insert one copy. Returns whether the annotation was not present before.
    pub fn add(&mut self, annotation: A) -> bool {
        let count = self
            .buckets
            .entry(annotation.kind())
            .or_default()
            .entry(annotation)
            .or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Remove one copy. Returns whether the last copy went.
    pub fn remove(&mut self, annotation: &A) -> bool {
        let kind = annotation.kind();
        let Some(bucket) = self.buckets.get_mut(&kind) else {
            return false;
        };
        let Some(count) = bucket.get_mut(annotation) else {
            return false;
        };
        *count -= 1;
        if *count > 0 {
            return false;
        }
        bucket.remove(annotation);
        if bucket.is_empty() {
            self.buckets.remove(&kind);
        }
        true
    }

    /// Distinct annotations of one kind, in no particular order.
    pub fn of_kind(&self, kind: A::Kind) -> impl Iterator<Item = &A> {
        self.buckets.get(&kind).into_iter().flat_map(FxHashMap::keys)
    }

    /// Distinct annotations of every kind.
    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.buckets.values().flat_map(FxHashMap::keys)
    }

    /// Number of distinct annotations.
    pub fn len(&self) -> usize {
        self.buckets.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl<A: Annotation> Default for Annotations<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Annotations of a position that facts are about.
///
/// Positive facts are present while true. Negative facts are stored as a
/// marker that is present while they are false.
#[derive(Clone, Debug)]
pub struct FactAnnotations<A: Annotation> {
    positive: Annotations<A>,
    markers: Annotations<A>,
    justified_negations: FxHashSet<A>,
}

impl<A: Annotation> FactAnnotations<A> {
    pub fn new() -> Self {
        FactAnnotations {
            positive: Annotations::new(),
            markers: Annotations::new(),
            justified_negations: FxHashSet::default(),
        }
    }

    pub fn has(&self, annotation: &A) -> bool {
        self.positive.has(annotation)
    }

    pub fn get(&self, annotation: &A) -> Option<&A> {
        self.positive.get(annotation)
    }

    pub fn add(&mut self, annotation: A) -> bool {
        self.positive.add(annotation)
    }

    pub fn remove(&mut self, annotation: &A) -> bool {
        self.positive.remove(annotation)
    }

    pub fn of_kind(&self, kind: A::Kind) -> impl Iterator<Item = &A> {
        self.positive.of_kind(kind)
    }

    /// Whether a negative-sense fact currently holds.
    pub fn holds_negation(&self, negation: &A) -> bool {
        !self.markers.has(negation)
    }

    /// Make a negative-sense fact true. Returns whether it was false.
    pub fn justify_negation(&mut self, negation: A) -> bool {
        let changed = self.markers.remove(&negation);
        self.justified_negations.insert(negation);
        changed
    }

    /// Make a negative-sense fact false. Returns whether it was true.
    pub fn unjustify_negation(&mut self, negation: A) -> bool {
        if self.markers.has(&negation) {
            return false;
        }
        self.justified_negations.remove(&negation);
        self.markers.add(negation);
        true
    }

    /// Mark a negative-sense fact false without telling anyone.
    ///
    /// Only sound while nothing can have been derived from the fact, as when
    /// the position has just been created.
    pub fn surreptitiously_make_false(&mut self, negation: A) {
        self.justified_negations.remove(&negation);
        if !self.markers.has(&negation) {
            self.markers.add(negation);
        }
    }

    /// Every fact currently true here: the positive annotations and the
    /// justified negations.
    pub fn justified(&self) -> SmallVec<[A; 8]> {
        self.positive
            .iter()
            .chain(&self.justified_negations)
            .cloned()
            .collect()
    }

    /// Whether no positive fact is annotated here.
    pub fn is_empty(&self) -> bool {
        self.positive.is_empty()
    }
}

impl<A: Annotation> Default for FactAnnotations<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;

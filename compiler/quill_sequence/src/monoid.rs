//! The algebra a [`MonoidSequence`](crate::MonoidSequence) sums over.

/// An associative combination with an identity element.
///
/// `a.combine(b)` means "a followed by b"; implementations need not be
/// commutative. Types whose combination is commutative should set
/// [`COMMUTATIVE`](Monoid::COMMUTATIVE), which lets the sequence fold an
/// inserted element into its ancestors' caches instead of re-summing them.
pub trait Monoid: Clone {
    /// Whether `a.combine(b) == b.combine(a)` for all values.
    const COMMUTATIVE: bool = false;

    /// The element that leaves every value unchanged under `combine`.
    fn identity() -> Self;

    /// Combine `self` followed by `other`.
    #[must_use]
    fn combine(&self, other: &Self) -> Self;
}

/// A monoid whose running sums can be searched.
///
/// The order must be compatible with combination: for any `a`, `b`,
/// `a.combine(b).precedes(a)` never holds. Running sums then only grow, so a
/// binary descent can find the first position at which they pass a target.
pub trait MonoidOrd: Monoid {
    /// Strict "less than".
    fn precedes(&self, other: &Self) -> bool;
}

//! Ordered sequences of monoid elements with fast interval sums.
//!
//! A [`MonoidSequence`] stores its elements in the leaves of a weight-balanced
//! binary tree. Every internal vertex caches the combined value of its left
//! subtree, which is enough to answer prefix sums, interval sums and
//! "first position whose running sum passes a target" queries in polylogarithmic
//! time, and to keep those caches current under insertion and erasure.
//!
//! Positions are addressed by [`Cursor`]s. A cursor names a leaf through a
//! generational slot index, so it stays valid across edits elsewhere in the
//! sequence and is detectably stale once its own leaf is erased.

mod monoid;
mod sequence;

pub use monoid::{Monoid, MonoidOrd};
pub use sequence::{Cursor, Iter, Leaf, MonoidSequence};

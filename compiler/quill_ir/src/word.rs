//! Interned token text identifier.

use std::fmt;

/// Interned token text.
///
/// Words are only meaningful together with the [`Vocabulary`](crate::Vocabulary)
/// that produced them. Two words from the same vocabulary are equal exactly
/// when their texts are equal.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Word(u32);

crate::static_assert_size!(Word, 4);

impl Word {
    /// Pre-interned empty text.
    pub const EMPTY: Word = Word(0);

    /// Create from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Word(raw)
    }

    /// Get the raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({})", self.0)
    }
}

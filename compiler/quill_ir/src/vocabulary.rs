//! Session-owned interner for token texts.
//!
//! Every token text the lexer produces is interned here so that the parser can
//! compare literals in O(1). The vocabulary is append-only: a word stays valid
//! for the lifetime of the session even after the last token spelling it is
//! removed, which keeps grammar literals stable across edits.

use super::Word;
use rustc_hash::FxHashMap;

/// Append-only string interner.
pub struct Vocabulary {
    /// Map from text to its word.
    map: FxHashMap<Box<str>, Word>,
    /// Storage for texts, indexed by word.
    strings: Vec<Box<str>>,
}

impl Vocabulary {
    /// Create a vocabulary holding only the empty text.
    pub fn new() -> Self {
        let mut vocabulary = Vocabulary {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        vocabulary.strings.push(Box::from(""));
        vocabulary.map.insert(Box::from(""), Word::EMPTY);
        vocabulary
    }

    /// Intern a text, returning its word.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` distinct texts are interned.
    pub fn intern(&mut self, text: &str) -> Word {
        if let Some(&word) = self.map.get(text) {
            return word;
        }
        let raw = u32::try_from(self.strings.len())
            .unwrap_or_else(|_| panic!("vocabulary exceeded {} words", u32::MAX));
        let word = Word::from_raw(raw);
        self.strings.push(Box::from(text));
        self.map.insert(Box::from(text), word);
        word
    }

    /// Find the word for a text without interning it.
    pub fn get(&self, text: &str) -> Option<Word> {
        self.map.get(text).copied()
    }

    /// Look up the text of a word.
    pub fn lookup(&self, word: Word) -> &str {
        debug_assert!(word.index() < self.strings.len(), "word from another vocabulary");
        self.strings.get(word.index()).map_or("", |text| text)
    }

    /// Number of interned texts, including the empty text.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Always false: the empty text is pre-interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vocabulary")
            .field("len", &self.strings.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;

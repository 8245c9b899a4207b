//! Tokens as monoid elements.

use std::borrow::Cow;
use std::ptr;

use quill_ir::{Vocabulary, Word};
use quill_lexer_core::{LexerEffect, LexicalEffect, LexicalState, RawToken, INITIAL_LEXICAL_STATE};
use quill_sequence::{Cursor, Monoid, MonoidOrd, MonoidSequence};

/// The text of a buffer, one leaf per token.
pub type TokenSequence = MonoidSequence<Token>;

/// Summary of a run of text.
///
/// A leaf token knows its text; sums of several tokens only know the counts,
/// whether the run is all whitespace, and the composed lexical effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    codepoint_count: u32,
    line_count: u32,
    text: Option<Word>,
    only_whitespace: bool,
    effect: Cow<'static, LexerEffect>,
}

impl Token {
    /// Intern a freshly lexed token.
    pub fn from_raw(raw: &RawToken, vocabulary: &mut Vocabulary) -> Self {
        Token {
            codepoint_count: u32::try_from(raw.codepoint_count()).unwrap_or(u32::MAX),
            line_count: raw.line_count,
            text: Some(vocabulary.intern(&raw.text)),
            only_whitespace: raw.only_whitespace,
            effect: Cow::Borrowed(raw.effect.effect()),
        }
    }

    /// Search key for [`MonoidSequence::find`]: finds the token holding the
    /// codepoint at `index`.
    pub fn codepoint_target(index: usize) -> Self {
        Token {
            codepoint_count: u32::try_from(index).unwrap_or(u32::MAX),
            ..Self::identity()
        }
    }

    #[inline]
    pub fn codepoint_count(&self) -> usize {
        self.codepoint_count as usize
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    /// The interned text; `None` for sums.
    #[inline]
    pub fn text(&self) -> Option<Word> {
        self.text
    }

    #[inline]
    pub fn is_only_whitespace(&self) -> bool {
        self.only_whitespace
    }

    #[inline]
    pub fn effect(&self) -> &LexerEffect {
        &self.effect
    }

    /// The lexical state after this text, given the state before it.
    #[inline]
    pub fn state_after(&self, before: LexicalState) -> LexicalState {
        self.effect.apply(before)
    }

    fn has_plain_effect(&self) -> bool {
        matches!(self.effect, Cow::Borrowed(effect) if ptr::eq(effect, LexicalEffect::PlainText.effect()))
    }
}

impl Monoid for Token {
    fn identity() -> Self {
        Token {
            codepoint_count: 0,
            line_count: 0,
            text: None,
            only_whitespace: true,
            effect: Cow::Borrowed(LexicalEffect::PlainText.effect()),
        }
    }

    fn combine(&self, other: &Self) -> Self {
        // Most tokens are plain words; skip composing with the identity.
        let effect = if other.has_plain_effect() {
            self.effect.clone()
        } else if self.has_plain_effect() {
            other.effect.clone()
        } else {
            Cow::Owned(self.effect.then(&other.effect))
        };
        Token {
            codepoint_count: self.codepoint_count + other.codepoint_count,
            line_count: self.line_count + other.line_count,
            text: None,
            only_whitespace: self.only_whitespace && other.only_whitespace,
            effect,
        }
    }
}

impl MonoidOrd for Token {
    fn precedes(&self, other: &Self) -> bool {
        self.codepoint_count < other.codepoint_count
    }
}

/// The lexical state just before `cursor`.
pub fn state_before(tokens: &TokenSequence, cursor: Cursor) -> LexicalState {
    tokens.prefix_sum(cursor).state_after(INITIAL_LEXICAL_STATE)
}

/// The text of the token at `cursor`, or `None` at the end.
pub fn text_at<'a>(
    tokens: &TokenSequence,
    vocabulary: &'a Vocabulary,
    cursor: Cursor,
) -> Option<&'a str> {
    let word = tokens.get(cursor)?.text?;
    Some(vocabulary.lookup(word))
}

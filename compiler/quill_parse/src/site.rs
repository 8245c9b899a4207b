//! Positions that parser facts are about.

use std::fmt;

use bitflags::bitflags;
use quill_ir::{Vocabulary, Word};
use quill_lexer::Token;
use quill_lexer_core::codepoints::is_i7_punctuation;
use quill_lexer_core::{LexicalState, LexicalSuperstate};
use quill_sequence::Leaf;

/// Number the client gave a buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub u32);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A significant token of a buffer or one of its sentinels.
///
/// The sentinels bracket the token stream so that "first token" and "last
/// token" are ordinary adjacency facts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Site {
    Start,
    Token(Leaf),
    End,
}

impl Site {
    #[inline]
    pub fn leaf(self) -> Option<Leaf> {
        match self {
            Site::Token(leaf) => Some(leaf),
            Site::Start | Site::End => None,
        }
    }
}

bitflags! {
    /// Terminal classes and context of a significant token.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct TokenTraits: u8 {
        /// Only ASCII digits.
        const DIGITS = 1 << 0;
        /// Does not start with I7 punctuation.
        const WORD = 1 << 1;
        /// Starts with a letter.
        const NAME_WORD = 1 << 2;
        /// A full stop, semicolon or colon in prose.
        const SENTENCE_END = 1 << 3;
        /// A free-standing comma.
        const COMMA = 1 << 4;
        /// Lies in plain I7 prose on both sides.
        const PROSE = 1 << 5;
    }
}

fn is_prose(state: LexicalState) -> bool {
    !state.in_comment()
        && matches!(
            state.superstate(),
            LexicalSuperstate::I7 | LexicalSuperstate::I7InExtract
        )
}

impl TokenTraits {
    /// Classify a token text seen between two lexical states.
    pub fn classify(text: &str, before: LexicalState, after: LexicalState) -> Self {
        let mut traits = TokenTraits::empty();
        if is_prose(before) && is_prose(after) {
            traits |= TokenTraits::PROSE;
        }
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            traits |= TokenTraits::DIGITS;
        }
        if let Some(first) = text.chars().next() {
            if !is_i7_punctuation(first) {
                traits |= TokenTraits::WORD;
            }
            if first.is_alphabetic() {
                traits |= TokenTraits::NAME_WORD;
            }
        }
        if matches!(text, "." | ";" | ":") && traits.contains(TokenTraits::PROSE) {
            traits |= TokenTraits::SENTENCE_END;
        }
        if text == "," {
            traits |= TokenTraits::COMMA;
        }
        traits
    }
}

/// What the parser knows about a site, fixed for the life of its record.
///
/// Derivations consult only this cached copy, never the live token, so a
/// site's facts can be retracted after its token has already been replaced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SiteInfo {
    pub text: Option<Word>,
    pub traits: TokenTraits,
}

impl SiteInfo {
    pub const SENTINEL: SiteInfo = SiteInfo {
        text: None,
        traits: TokenTraits::empty(),
    };

    /// The info of a token lexed after `before`, or `None` if the parser
    /// skips it: whitespace, and anything touching an I7 comment.
    pub fn of_token(token: &Token, before: LexicalState, vocabulary: &Vocabulary) -> Option<Self> {
        let after = token.state_after(before);
        if token.is_only_whitespace() || before.in_comment() || after.in_comment() {
            return None;
        }
        let text = token.text()?;
        Some(SiteInfo {
            text: Some(text),
            traits: TokenTraits::classify(vocabulary.lookup(text), before, after),
        })
    }

    #[inline]
    pub fn is_prose(&self) -> bool {
        self.traits.contains(TokenTraits::PROSE)
    }

    #[inline]
    pub fn is_sentence_end(&self) -> bool {
        self.traits.contains(TokenTraits::SENTENCE_END)
    }

    #[inline]
    pub fn is_comma(&self) -> bool {
        self.traits.contains(TokenTraits::COMMA)
    }
}

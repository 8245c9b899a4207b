//! Quill lexer core - codepoint classification and lexical state tracking.
//!
//! This crate turns Inform 7 source text into raw tokens, each tagged with the
//! effect it has on the lexical state (which of the nested I7, I6, string,
//! substitution, comment and documentation contexts the text is in). Effects
//! form a monoid, so the lexical state at any point of a buffer is the initial
//! state run through the combined effect of everything before it.
//!
//! # Layers
//!
//! - [`codepoints`]: the fixed character classes the lexer dispatches on
//! - [`LexicalState`]: superstate plus I7 comment depth
//! - [`LexerEffect`]: finitely represented state transformer, composable
//! - [`Lexer`]: push-driven state machine emitting [`RawToken`]s

pub mod codepoints;
mod effect;
mod lexer;
mod state;

pub use effect::{LexerEffect, LexicalEffect};
pub use lexer::{Lexer, RawToken};
pub use state::{LexicalState, LexicalSuperstate, INITIAL_LEXICAL_STATE};

/// Codepoint fed after the last real codepoint to force a final flush.
///
/// U+FFFF is a noncharacter reserved for internal use, so it never occurs in
/// client text.
pub const TERMINATOR: char = '\u{FFFF}';

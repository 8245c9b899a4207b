//! Incremental lexing for Quill.
//!
//! Buffers keep their text as a [`TokenSequence`]: a monoid sequence of
//! [`Token`] summaries, so the codepoint offset, line count and lexical state
//! at any token are prefix sums. Edits go through the [`relexer`], which
//! re-lexes only the tokens an edit can reach, and [`highlight`] turns the
//! resulting lexical states into highlight events.

pub mod highlight;
pub mod relexer;
mod token;

pub use highlight::{rehighlight, HighlightCode, HighlightEvent, HighlightRun, HighlightSupport};
pub use relexer::{Edit, EditOutOfRange, RelexOutcome, RelexPlan};
pub use token::{state_before, text_at, Token, TokenSequence};

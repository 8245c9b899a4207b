//! Incremental relexing.
//!
//! An edit replaces the codepoints `lo..hi` with new text. Rather than lexing
//! the whole buffer again, the relexer:
//!
//! 1. backs up from the edit over the earlier tokens that the first altered
//!    codepoint could combine with,
//! 2. lexes those tokens, the edited text, and then the old tokens after the
//!    edit one by one, until one of them starts a fresh token exactly as it
//!    did before,
//! 3. replaces the consumed tokens with the new ones.
//!
//! Planning and applying are separate so that a caller can retract whatever
//! it attached to the doomed tokens while they still exist.

use quill_ir::Vocabulary;
use quill_lexer_core::codepoints::{is_i7_punctuation, is_lexical_delimiter_letter};
use quill_lexer_core::{Lexer, LexicalState, RawToken, TERMINATOR};
use quill_sequence::{Cursor, Leaf};
use thiserror::Error;
use tracing::debug;

use crate::token::{state_before, text_at, Token, TokenSequence};

/// Replace the codepoints `lo..hi` with `text`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Edit<'a> {
    pub lo: usize,
    pub hi: usize,
    pub text: &'a str,
}

impl<'a> Edit<'a> {
    pub fn remove(lo: usize, hi: usize) -> Self {
        Edit { lo, hi, text: "" }
    }

    pub fn insert(at: usize, text: &'a str) -> Self {
        Edit {
            lo: at,
            hi: at,
            text,
        }
    }

    /// Whether the edit changes nothing.
    pub fn is_empty(&self) -> bool {
        self.lo == self.hi && self.text.is_empty()
    }
}

/// An edit whose range does not fit the buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("edit range {lo}..{hi} does not fit a buffer of {len} codepoints")]
pub struct EditOutOfRange {
    pub lo: usize,
    pub hi: usize,
    pub len: usize,
}

/// What an edit will do to a token sequence, computed without changing it.
#[derive(Clone, Debug)]
pub struct RelexPlan {
    start: Cursor,
    replaced: usize,
    tokens: Vec<RawToken>,
    pre_state: LexicalState,
    old_post_state: LexicalState,
}

/// Where an applied edit changed the token sequence.
#[derive(Clone, Debug)]
pub struct RelexOutcome {
    /// Lexical state before the first relexed token.
    pub pre_state: LexicalState,
    /// The first new token, or `end` if the edit left no new tokens.
    pub start: Cursor,
    /// The first old token kept after the relexed ones.
    pub end: Cursor,
    /// Lexical state that held before `end` prior to the edit.
    pub old_post_state: LexicalState,
    /// The new tokens, in order.
    pub inserted: Vec<Leaf>,
}

// === Backing Up ===

/// Token texts of `\n---- DOCUMENTATION ----\n` read backwards from the
/// closing line break to the opening one.
const BREAK_CHAIN: [&str; 11] = [
    "-",
    "-",
    "-",
    "-",
    " ",
    "DOCUMENTATION",
    " ",
    "-",
    "-",
    "-",
    "-",
];

const FROM_NEWLINE: usize = 0;
const FROM_HYPHENS: usize = 4;
const FROM_SECOND_SPACE: usize = 5;
const FROM_DOCUMENTATION: usize = 6;
const FROM_FIRST_SPACE: usize = 7;

/// Back up from `cursor` over the tokens that could combine with `first`,
/// the first codepoint of the text to be lexed at `cursor`.
fn backup(tokens: &TokenSequence, vocabulary: &Vocabulary, cursor: Cursor, first: char) -> Cursor {
    if tokens.is_empty() {
        return cursor;
    }
    match first {
        ' ' | '-' | '\n' | '\r' => backup_over_documentation_break(tokens, vocabulary, cursor, first),
        _ if is_lexical_delimiter_letter(first) => {
            backup_over_documentation_break(tokens, vocabulary, cursor, first)
        }
        // `+` may follow `(`; `)` may follow `-` or `+`.
        '+' | ')' => tokens.prev(cursor),
        // A run of quotes is lexed as a whole; so is the run a removal leaves
        // at the very end.
        '\'' | TERMINATOR => backup_over_single_quotes(tokens, vocabulary, cursor),
        _ if is_i7_punctuation(first) => cursor,
        _ => tokens.prev(cursor),
    }
}

fn backup_over_single_quotes(tokens: &TokenSequence, vocabulary: &Vocabulary, mut cursor: Cursor) -> Cursor {
    while cursor != tokens.begin() {
        let probe = tokens.prev(cursor);
        if text_at(tokens, vocabulary, probe) != Some("'") {
            break;
        }
        cursor = probe;
    }
    cursor
}

fn backup_over_documentation_break(
    tokens: &TokenSequence,
    vocabulary: &Vocabulary,
    cursor: Cursor,
    first: char,
) -> Cursor {
    let text = |cursor| text_at(tokens, vocabulary, cursor);
    // Whatever else happens, `first` may simply extend the previous token.
    let mut cursor = tokens.prev(cursor);
    let entry = match first {
        '\n' | '\r' => FROM_NEWLINE,
        ' ' if text(cursor) == Some("DOCUMENTATION") => FROM_SECOND_SPACE,
        ' ' => FROM_FIRST_SPACE,
        '-' => {
            // Up to three more hyphens of the same group.
            for _ in 0..3 {
                if text(cursor) != Some("-") {
                    break;
                }
                cursor = tokens.prev(cursor);
            }
            FROM_HYPHENS
        }
        _ => {
            // Letters may complete a partial `DOCUMENTATION`.
            if text(cursor).is_some_and(|t| t.chars().all(is_lexical_delimiter_letter)) {
                cursor = tokens.prev(cursor);
            }
            FROM_DOCUMENTATION
        }
    };
    for expected in &BREAK_CHAIN[entry..] {
        if text(cursor) != Some(*expected) {
            break;
        }
        cursor = tokens.prev(cursor);
    }
    cursor
}

// === Planning ===

/// Work out how `edit` re-lexes `tokens`.
///
/// Returns `Ok(None)` for an edit that changes nothing.
pub fn plan(
    tokens: &TokenSequence,
    vocabulary: &Vocabulary,
    edit: Edit<'_>,
) -> Result<Option<RelexPlan>, EditOutOfRange> {
    let len = tokens.total().codepoint_count();
    if edit.lo > edit.hi || edit.hi > len {
        return Err(EditOutOfRange {
            lo: edit.lo,
            hi: edit.hi,
            len,
        });
    }
    if edit.is_empty() {
        return Ok(None);
    }

    let offset = |cursor| tokens.prefix_sum(cursor).codepoint_count();
    let text = |cursor| text_at(tokens, vocabulary, cursor).unwrap_or_default();

    // Tokens the edit touches are lexed again from scratch: the part of the
    // first before `lo`, the new text, and the part of the last after `hi`.
    let first = tokens.find(&Token::codepoint_target(edit.lo));
    let lead = edit.lo - offset(first);
    let mut middle = String::new();
    let resume = if lead > 0 || edit.hi > edit.lo {
        let last = if edit.hi > edit.lo {
            tokens.find(&Token::codepoint_target(edit.hi - 1))
        } else {
            first
        };
        let trail = edit.hi - offset(last);
        middle.extend(text(first).chars().take(lead));
        middle.push_str(edit.text);
        middle.extend(text(last).chars().skip(trail));
        tokens.next(last)
    } else {
        middle.push_str(edit.text);
        first
    };

    let first_altered = middle
        .chars()
        .next()
        .or_else(|| text(resume).chars().next())
        .unwrap_or(TERMINATOR);
    let start = backup(tokens, vocabulary, first, first_altered);

    let mut lexer = Lexer::new();
    let mut cursor = start;
    while cursor != first {
        text(cursor).chars().for_each(|c| lexer.push(c));
        cursor = tokens.next(cursor);
    }
    middle.chars().for_each(|c| lexer.push(c));

    let mut cursor = resume;
    loop {
        let mut suffix = text(cursor).chars();
        let Some(head) = suffix.next() else {
            lexer.push(TERMINATOR);
            break;
        };
        lexer.push(head);
        if lexer.most_recent_codepoint_did_not_combine() {
            break;
        }
        suffix.for_each(|c| lexer.push(c));
        cursor = tokens.next(cursor);
    }

    let replaced = tokens.rank(cursor) - tokens.rank(start);
    let new_tokens = lexer.into_results();
    debug!(
        lo = edit.lo,
        hi = edit.hi,
        replaced,
        lexed = new_tokens.len(),
        "planned relex"
    );
    Ok(Some(RelexPlan {
        start,
        replaced,
        tokens: new_tokens,
        pre_state: state_before(tokens, start),
        old_post_state: state_before(tokens, cursor),
    }))
}

impl RelexPlan {
    /// The first token to be replaced.
    pub fn start(&self) -> Cursor {
        self.start
    }

    /// How many old tokens, from [`start`](Self::start), the new ones replace.
    pub fn replaced_count(&self) -> usize {
        self.replaced
    }

    /// The replacement tokens.
    pub fn tokens(&self) -> &[RawToken] {
        &self.tokens
    }

    pub fn pre_state(&self) -> LexicalState {
        self.pre_state
    }

    pub fn old_post_state(&self) -> LexicalState {
        self.old_post_state
    }

    /// Lexical state after the replacement tokens.
    pub fn new_post_state(&self) -> LexicalState {
        self.tokens
            .iter()
            .fold(self.pre_state, |state, token| token.effect.apply(state))
    }

    /// The old tokens the plan replaces, in order.
    pub fn replaced_leaves(&self, tokens: &TokenSequence) -> Vec<Leaf> {
        let mut leaves = Vec::with_capacity(self.replaced);
        let mut cursor = self.start;
        for _ in 0..self.replaced {
            leaves.extend(cursor.leaf());
            cursor = tokens.next(cursor);
        }
        leaves
    }

    /// Carry out the plan. `tokens` must not have changed since planning.
    pub fn apply(self, tokens: &mut TokenSequence, vocabulary: &mut Vocabulary) -> RelexOutcome {
        let mut end = self.start;
        for _ in 0..self.replaced {
            end = tokens.erase(end);
        }
        let mut inserted = Vec::with_capacity(self.tokens.len());
        for raw in &self.tokens {
            let position = tokens.insert(end, Token::from_raw(raw, vocabulary));
            inserted.extend(position.leaf());
        }
        let start = inserted
            .first()
            .and_then(|&leaf| tokens.cursor(leaf))
            .unwrap_or(end);
        RelexOutcome {
            pre_state: self.pre_state,
            start,
            end,
            old_post_state: self.old_post_state,
            inserted,
        }
    }
}

/// Plan and apply an edit in one step.
pub fn relex(
    tokens: &mut TokenSequence,
    vocabulary: &mut Vocabulary,
    edit: Edit<'_>,
) -> Result<Option<RelexOutcome>, EditOutOfRange> {
    Ok(plan(tokens, vocabulary, edit)?.map(|plan| plan.apply(tokens, vocabulary)))
}

impl RelexOutcome {
    /// Kept tokens after the relexed ones whose preceding lexical state the
    /// edit changed, up to the point where old and new states agree again.
    pub fn restated(&self, tokens: &TokenSequence) -> Vec<Leaf> {
        let mut old = self.old_post_state;
        let mut new = state_before(tokens, self.end);
        let mut cursor = self.end;
        let mut leaves = Vec::new();
        while old != new {
            let Some(token) = tokens.get(cursor) else {
                break;
            };
            leaves.extend(cursor.leaf());
            old = token.state_after(old);
            new = token.state_after(new);
            cursor = tokens.next(cursor);
        }
        leaves
    }
}

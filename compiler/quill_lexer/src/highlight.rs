//! Lexical highlighting.
//!
//! A token's highlight is a pure function of the lexical states on either
//! side of it. After an edit, [`rehighlight`] walks from the first relexed
//! token until the new states agree with the old ones again, and reports the
//! affected range as one removal followed by merged additions.
//!
//! Highlight codes share the width of a codepoint so they can travel in the
//! same stream as text. Their numbering is hierarchical: the low byte picks a
//! delimiter or variant of the code in the byte above it, and the third byte
//! picks a family. A client that does not support a code gets the nearest
//! supported ancestor instead.

use std::fmt;

use bitflags::bitflags;
use quill_lexer_core::{LexicalState, LexicalSuperstate, INITIAL_LEXICAL_STATE};

use crate::relexer::RelexOutcome;
use crate::token::TokenSequence;

/// Highlight code as sent to the client.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HighlightCode(u32);

macro_rules! highlight_codes {
    ($($(#[$doc:meta])* $name:ident = $value:literal, bit $bit:literal;)*) => {
        impl HighlightCode {
            $($(#[$doc])* pub const $name: HighlightCode = HighlightCode($value);)*

            /// Every code, in numeric order.
            pub const ALL: &'static [HighlightCode] = &[$(HighlightCode::$name,)*];

            /// The protocol name of the code.
            pub fn name(self) -> &'static str {
                match self.0 {
                    $($value => stringify!($name),)*
                    _ => "UNKNOWN",
                }
            }

            /// The support flag for this code.
            pub fn support_flag(self) -> HighlightSupport {
                match self.0 {
                    $($value => HighlightSupport::$name,)*
                    _ => HighlightSupport::empty(),
                }
            }
        }

        bitflags! {
            /// Set of highlight codes a client has declared support for.
            #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
            pub struct HighlightSupport: u32 {
                $(const $name = 1 << $bit;)*
            }
        }
    };
}

highlight_codes! {
    ORDINARY_I7 = 0x0000_0000, bit 0;
    /// `(+` and `+)`
    I7_DELIMITER = 0x0000_0001, bit 1;
    ORDINARY_I6 = 0x0001_0000, bit 2;
    /// `(-` and `-)`
    I6_DELIMITER = 0x0001_0001, bit 3;
    I6_DIRECTIVE = 0x0001_0002, bit 4;
    I6_KEYWORD = 0x0001_0004, bit 5;
    I6_FUNCTION = 0x0001_0100, bit 6;
    /// `[` and `]` around a routine
    I6_FUNCTION_DELIMITER = 0x0001_0101, bit 7;
    I6_PROPERTY_LIKE = 0x0001_0102, bit 8;
    I6_PROPERTY_LIKE_DELIMITER = 0x0001_0103, bit 9;
    VM_ASSEMBLY = 0x0002_0000, bit 10;
    /// `@`
    VM_ASSEMBLY_DELIMITER = 0x0002_0001, bit 11;
    COMMENT = 0x0003_0000, bit 12;
    /// `!`, `[` and `]`
    COMMENT_DELIMITER = 0x0003_0001, bit 13;
    DOCUMENTATION = 0x0003_0100, bit 14;
    /// `---- DOCUMENTATION ----`
    DOCUMENTATION_DELIMITER = 0x0003_0101, bit 15;
    /// `*:`
    PASTE_MARKER = 0x0003_0103, bit 16;
    CHARACTER_LITERAL = 0x0004_0000, bit 17;
    /// `'`
    CHARACTER_LITERAL_DELIMITER = 0x0004_0001, bit 18;
    STRING_LITERAL = 0x0004_0100, bit 19;
    /// `"`
    STRING_LITERAL_DELIMITER = 0x0004_0101, bit 20;
    CHARACTER_ESCAPE = 0x0004_0200, bit 21;
    /// `@` and `@@`
    CHARACTER_ESCAPE_DELIMITER = 0x0004_0201, bit 22;
    SUBSTITUTION = 0x0004_0300, bit 23;
    /// `[` and `]` in a string
    SUBSTITUTION_DELIMITER = 0x0004_0301, bit 24;
}

impl HighlightCode {
    /// The code for a raw protocol value, if it names one.
    pub fn from_raw(raw: u32) -> Option<Self> {
        let code = HighlightCode(raw);
        Self::ALL.contains(&code).then_some(code)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The next more general code, or `None` for [`ORDINARY_I7`](Self::ORDINARY_I7).
    pub fn parent(self) -> Option<Self> {
        let raw = self.0;
        let parent = if raw & 0xFF != 0 {
            raw & !0xFF
        } else if raw & 0xFF00 != 0 {
            raw & !0xFFFF
        } else if raw != 0 {
            0
        } else {
            return None;
        };
        Some(HighlightCode(parent))
    }
}

impl fmt::Debug for HighlightCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#x})", self.name(), self.0)
    }
}

impl fmt::Display for HighlightCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl HighlightSupport {
    /// What a plain client can show: prose, comments, documentation and
    /// strings.
    pub const BASIC: HighlightSupport = HighlightSupport::ORDINARY_I7
        .union(HighlightSupport::COMMENT)
        .union(HighlightSupport::DOCUMENTATION)
        .union(HighlightSupport::STRING_LITERAL);

    pub fn supports(self, code: HighlightCode) -> bool {
        self.contains(code.support_flag())
    }

    /// `code`, or its nearest supported ancestor.
    pub fn resolve(self, code: HighlightCode) -> HighlightCode {
        let mut code = code;
        while !self.supports(code) {
            match code.parent() {
                Some(parent) => code = parent,
                None => break,
            }
        }
        code
    }
}

impl Default for HighlightSupport {
    fn default() -> Self {
        HighlightSupport::all()
    }
}

// === Classification ===

/// Coarse context of a lexical state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Context {
    I7,
    I6,
    I7Comment,
    I6Comment,
    Documentation,
    Character,
    String,
    Substitution,
}

fn context_of(state: LexicalState) -> Context {
    use LexicalSuperstate as S;
    if state.in_comment() {
        return Context::I7Comment;
    }
    match state.superstate() {
        S::I6 | S::I6InRoutine | S::I6InExtract | S::I6InRoutineInExtract => Context::I6,
        S::I6Comment
        | S::I6CommentInRoutine
        | S::I6CommentInExtract
        | S::I6CommentInRoutineInExtract => Context::I6Comment,
        S::I7ExtensionDocumentation => Context::Documentation,
        S::I6Character
        | S::I6CharacterInRoutine
        | S::I6CharacterInExtract
        | S::I6CharacterInRoutineInExtract => Context::Character,
        S::I7String
        | S::I6String
        | S::I6StringInRoutine
        | S::I7StringInI6
        | S::I7StringInI6Comment
        | S::I7StringInI6InRoutine
        | S::I7StringInI6CommentInRoutine
        | S::I7StringInExtract
        | S::I6StringInExtract
        | S::I6StringInRoutineInExtract
        | S::I7StringInI6InExtract
        | S::I7StringInI6CommentInExtract
        | S::I7StringInI6InRoutineInExtract
        | S::I7StringInI6CommentInRoutineInExtract => Context::String,
        S::I7Substitution
        | S::I7SubstitutionInI6
        | S::I7SubstitutionInI6Comment
        | S::I7SubstitutionInI6InRoutine
        | S::I7SubstitutionInI6CommentInRoutine
        | S::I7SubstitutionInExtract
        | S::I7SubstitutionInI6InExtract
        | S::I7SubstitutionInI6CommentInExtract
        | S::I7SubstitutionInI6InRoutineInExtract
        | S::I7SubstitutionInI6CommentInRoutineInExtract => Context::Substitution,
        _ => Context::I7,
    }
}

/// Whether the state lies in a documentation extract. Extract superstates
/// are declared last.
fn is_extract(state: LexicalState) -> bool {
    state.superstate() >= LexicalSuperstate::I7InExtract
}

/// Whether the state is I7 embedded in I6.
fn is_self_nested(state: LexicalState) -> bool {
    use LexicalSuperstate as S;
    matches!(
        state.superstate(),
        S::I7InI6
            | S::I7StringInI6
            | S::I7SubstitutionInI6
            | S::I7InI6Comment
            | S::I7StringInI6Comment
            | S::I7SubstitutionInI6Comment
            | S::I7InI6InRoutine
            | S::I7StringInI6InRoutine
            | S::I7SubstitutionInI6InRoutine
            | S::I7InI6CommentInRoutine
            | S::I7StringInI6CommentInRoutine
            | S::I7SubstitutionInI6CommentInRoutine
            | S::I7InI6InExtract
            | S::I7StringInI6InExtract
            | S::I7SubstitutionInI6InExtract
            | S::I7InI6CommentInExtract
            | S::I7StringInI6CommentInExtract
            | S::I7SubstitutionInI6CommentInExtract
            | S::I7InI6InRoutineInExtract
            | S::I7StringInI6InRoutineInExtract
            | S::I7SubstitutionInI6InRoutineInExtract
            | S::I7InI6CommentInRoutineInExtract
            | S::I7StringInI6CommentInRoutineInExtract
            | S::I7SubstitutionInI6CommentInRoutineInExtract
    )
}

/// The highlight of a token that moves the lexer from `before` to `after`.
pub fn highlight_code(before: LexicalState, after: LexicalState) -> HighlightCode {
    type H = HighlightCode;
    let from = context_of(before);
    match context_of(after) {
        Context::I7 => match from {
            Context::I6 if is_self_nested(after) => H::I7_DELIMITER,
            Context::I6 | Context::I6Comment => H::I6_DELIMITER,
            Context::I7Comment => H::COMMENT_DELIMITER,
            Context::String | Context::Substitution => H::STRING_LITERAL_DELIMITER,
            _ => H::ORDINARY_I7,
        },
        Context::I6 => match from {
            Context::I7 if is_self_nested(before) => H::I7_DELIMITER,
            Context::I7 => H::I6_DELIMITER,
            Context::Character => H::CHARACTER_LITERAL_DELIMITER,
            Context::String => H::STRING_LITERAL_DELIMITER,
            _ => H::ORDINARY_I6,
        },
        Context::I7Comment | Context::I6Comment => match from {
            Context::I7 | Context::I6 | Context::Documentation => H::COMMENT_DELIMITER,
            _ => H::COMMENT,
        },
        Context::Documentation => {
            if from == Context::I7 && !is_extract(before) {
                H::DOCUMENTATION_DELIMITER
            } else {
                H::DOCUMENTATION
            }
        }
        Context::Character => match from {
            Context::I6 => H::CHARACTER_LITERAL_DELIMITER,
            _ => H::CHARACTER_LITERAL,
        },
        Context::String => match from {
            Context::I7 | Context::I6 => H::STRING_LITERAL_DELIMITER,
            Context::Substitution => H::SUBSTITUTION_DELIMITER,
            _ => H::STRING_LITERAL,
        },
        Context::Substitution => match from {
            Context::String => H::SUBSTITUTION_DELIMITER,
            _ => H::SUBSTITUTION,
        },
    }
}

// === Runs and Events ===

/// A highlighted codepoint range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HighlightRun {
    pub lo: usize,
    pub hi: usize,
    pub code: HighlightCode,
}

/// A change to a buffer's highlights.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HighlightEvent {
    /// Forget every highlight in `lo..hi`.
    Remove { lo: usize, hi: usize },
    Add(HighlightRun),
}

impl fmt::Display for HighlightEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightEvent::Remove { lo, hi } => write!(f, "remove {lo}..{hi}"),
            HighlightEvent::Add(run) => write!(f, "add {}..{} {}", run.lo, run.hi, run.code),
        }
    }
}

/// Merges adjacent tokens with the same code.
struct RunBuilder {
    position: usize,
    open: Option<(usize, HighlightCode)>,
    runs: Vec<HighlightRun>,
}

impl RunBuilder {
    fn new(position: usize) -> Self {
        RunBuilder {
            position,
            open: None,
            runs: Vec::new(),
        }
    }

    fn push(&mut self, width: usize, code: HighlightCode) {
        match self.open {
            Some((_, open)) if open == code => {}
            _ => {
                self.close();
                self.open = Some((self.position, code));
            }
        }
        self.position += width;
    }

    fn close(&mut self) {
        if let Some((lo, code)) = self.open.take() {
            if lo < self.position {
                self.runs.push(HighlightRun {
                    lo,
                    hi: self.position,
                    code,
                });
            }
        }
    }

    fn finish(mut self) -> Vec<HighlightRun> {
        self.close();
        self.runs
    }
}

/// Highlight runs for a whole buffer.
pub fn highlight_all(tokens: &TokenSequence, support: HighlightSupport) -> Vec<HighlightRun> {
    let mut runs = RunBuilder::new(0);
    let mut before = INITIAL_LEXICAL_STATE;
    for (_, token) in tokens.iter() {
        let after = token.state_after(before);
        runs.push(token.codepoint_count(), support.resolve(highlight_code(before, after)));
        before = after;
    }
    runs.finish()
}

/// Highlight changes after an edit.
///
/// Walks from the first relexed token, through the relexed range and on
/// until the lexical state matches what it was before the edit.
pub fn rehighlight(
    tokens: &TokenSequence,
    outcome: &RelexOutcome,
    support: HighlightSupport,
) -> Vec<HighlightEvent> {
    if outcome.start.is_end() {
        return Vec::new();
    }
    let lo = tokens.prefix_sum(outcome.start).codepoint_count();
    let mut runs = RunBuilder::new(lo);
    let mut past_relexed = false;
    let mut old_before = outcome.old_post_state;
    let mut before = outcome.pre_state;
    let mut cursor = outcome.start;
    while let Some(token) = tokens.get(cursor) {
        past_relexed |= cursor == outcome.end;
        if past_relexed {
            if old_before == before {
                break;
            }
            old_before = token.state_after(old_before);
        }
        let after = token.state_after(before);
        runs.push(token.codepoint_count(), support.resolve(highlight_code(before, after)));
        before = after;
        cursor = tokens.next(cursor);
    }
    let hi = runs.position;
    if lo == hi {
        return Vec::new();
    }
    std::iter::once(HighlightEvent::Remove { lo, hi })
        .chain(runs.finish().into_iter().map(HighlightEvent::Add))
        .collect()
}

#[cfg(test)]
mod tests;

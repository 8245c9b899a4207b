//! Push-driven Inform 7 lexer.
//!
//! Codepoints are fed one at a time with [`Lexer::push`]. The lexer
//! accumulates the current token's text and flushes a [`RawToken`] whenever a
//! codepoint cannot extend it. Feeding [`TERMINATOR`] flushes whatever is
//! pending.
//!
//! # Documentation breaks
//!
//! `\n---- DOCUMENTATION ----\n` is a single token. The lexer matches it
//! optimistically after any line break followed by a hyphen. If the match
//! fails partway, it re-feeds the buffered codepoints from the undecided state
//! with documentation breaks inhibited once, so the same prefix lexes as
//! ordinary line break, hyphen and word tokens.

use crate::codepoints::{is_i7_letter, is_i7_punctuation, is_whitespace};
use crate::{LexicalEffect, TERMINATOR};

const DOCUMENTATION_BREAK: &[char] = &[
    '\n', '-', '-', '-', '-', ' ', 'D', 'O', 'C', 'U', 'M', 'E', 'N', 'T', 'A', 'T', 'I', 'O',
    'N', ' ', '-', '-', '-', '-', '\n',
];

/// Matched prefix length at which only the closing line break remains.
const DOCUMENTATION_BREAK_BODY: usize = DOCUMENTATION_BREAK.len() - 1;

/// One lexed token before interning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawToken {
    pub text: String,
    /// Whether the token is nothing but whitespace (line breaks included).
    pub only_whitespace: bool,
    pub effect: LexicalEffect,
    /// Line breaks the token counts as.
    pub line_count: u32,
}

impl RawToken {
    pub fn codepoint_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    Undecided,
    AfterSingleQuote,
    AfterTwoSingleQuotes,
    InWhitespace,
    AfterCarriageReturn,
    AfterLineFeed,
    AfterNewline,
    InIndentation,
    InWord,
    AfterOpenParenthesis,
    AfterHyphen,
    AfterPlus,
    InDocumentationBreak,
    AfterDocumentationBreakEndedByCarriageReturn,
    AfterDocumentationBreakEndedByLineFeed,
    AfterDocumentationBreakEndedByNewline,
    InIndentationAfterDocumentationBreak,
}

/// Incremental codepoint-to-token state machine.
#[derive(Clone, Debug)]
pub struct Lexer {
    mode: Mode,
    documentation_break_inhibited: bool,
    /// Only meaningful in [`Mode::InDocumentationBreak`].
    documentation_break_match_count: usize,
    accumulator: String,
    accumulated: usize,
    results: Vec<RawToken>,
}

impl Lexer {
    pub fn new() -> Self {
        Lexer {
            mode: Mode::Undecided,
            documentation_break_inhibited: false,
            documentation_break_match_count: 0,
            accumulator: String::new(),
            accumulated: 0,
            results: Vec::new(),
        }
    }

    /// Lex a complete text.
    pub fn lex(text: &str) -> Vec<RawToken> {
        let mut lexer = Lexer::new();
        for c in text.chars() {
            lexer.push(c);
        }
        lexer.finish()
    }

    /// Feed the terminator and return every token.
    pub fn finish(mut self) -> Vec<RawToken> {
        self.push(TERMINATOR);
        self.results
    }

    /// Tokens flushed so far, dropping anything still pending.
    pub fn into_results(self) -> Vec<RawToken> {
        self.results
    }

    /// Tokens flushed so far.
    pub fn results(&self) -> &[RawToken] {
        &self.results
    }

    /// Whether the last codepoint pushed began a fresh token instead of
    /// extending the one before it.
    ///
    /// A pending single quote never counts as fresh: whether it is a
    /// delimiter depends on the quotes around it.
    pub fn most_recent_codepoint_did_not_combine(&self) -> bool {
        self.accumulated == 1
            && !matches!(
                self.mode,
                Mode::AfterSingleQuote | Mode::AfterTwoSingleQuotes
            )
    }

    /// Feed one codepoint.
    pub fn push(&mut self, c: char) {
        match self.mode {
            Mode::Undecided => self.undecided(c),
            Mode::AfterSingleQuote => self.after_single_quote(c),
            Mode::AfterTwoSingleQuotes => self.after_two_single_quotes(c),
            Mode::InWhitespace => self.in_whitespace(c),
            Mode::AfterCarriageReturn => self.after_line_break(c, '\n'),
            Mode::AfterLineFeed => self.after_line_break(c, '\r'),
            Mode::AfterNewline => self.after_newline(c),
            Mode::InIndentation => self.in_indentation(c),
            Mode::InWord => self.in_word(c),
            Mode::AfterOpenParenthesis => self.after_open_parenthesis(c),
            Mode::AfterHyphen => self.after_hyphen(c),
            Mode::AfterPlus => self.after_plus(c),
            Mode::InDocumentationBreak => self.in_documentation_break(c),
            Mode::AfterDocumentationBreakEndedByCarriageReturn => {
                self.after_documentation_break(c, Some('\n'));
            }
            Mode::AfterDocumentationBreakEndedByLineFeed => {
                self.after_documentation_break(c, Some('\r'));
            }
            Mode::AfterDocumentationBreakEndedByNewline => self.after_documentation_break(c, None),
            Mode::InIndentationAfterDocumentationBreak => {
                self.in_indentation_after_documentation_break(c);
            }
        }
    }

    // === Accumulator ===

    fn accumulate(&mut self, c: char) {
        self.accumulator.push(c);
        self.accumulated += 1;
    }

    fn accumulate_to(&mut self, c: char, mode: Mode) {
        self.accumulate(c);
        self.mode = mode;
        if mode == Mode::InDocumentationBreak {
            self.documentation_break_match_count = 2;
        }
    }

    fn flush(&mut self, only_whitespace: bool, effect: LexicalEffect, line_count: u32) {
        self.results.push(RawToken {
            text: std::mem::take(&mut self.accumulator),
            only_whitespace,
            effect,
            line_count,
        });
        self.accumulated = 0;
    }

    fn accumulate_and_flush(&mut self, c: char, only_whitespace: bool, effect: LexicalEffect) {
        self.accumulate(c);
        self.flush(only_whitespace, effect, 0);
        self.mode = Mode::Undecided;
    }

    fn flush_and_restart(
        &mut self,
        c: char,
        only_whitespace: bool,
        effect: LexicalEffect,
        line_count: u32,
    ) {
        self.flush(only_whitespace, effect, line_count);
        self.undecided(c);
    }

    /// Abandon a documentation break match: replay the buffered codepoints
    /// with the break inhibited, then `c`.
    fn relex(&mut self, c: char) {
        self.documentation_break_inhibited = true;
        let earlier = std::mem::take(&mut self.accumulator);
        self.accumulated = 0;
        self.mode = Mode::Undecided;
        for earlier_codepoint in earlier.chars() {
            self.push(earlier_codepoint);
        }
        self.push(c);
    }

    // === States ===

    fn undecided(&mut self, c: char) {
        match c {
            TERMINATOR => {}
            '\n' => self.accumulate_to(c, Mode::AfterLineFeed),
            '\r' => self.accumulate_to(c, Mode::AfterCarriageReturn),
            '(' => self.accumulate_to(c, Mode::AfterOpenParenthesis),
            '-' => self.accumulate_to(c, Mode::AfterHyphen),
            '+' => self.accumulate_to(c, Mode::AfterPlus),
            '\'' => self.accumulate_to(c, Mode::AfterSingleQuote),
            '"' => self.accumulate_and_flush(c, false, LexicalEffect::DoubleQuote),
            '[' => self.accumulate_and_flush(c, false, LexicalEffect::LeftBracket),
            ']' => self.accumulate_and_flush(c, false, LexicalEffect::RightBracket),
            '!' => self.accumulate_and_flush(c, false, LexicalEffect::Bang),
            _ if is_whitespace(c) => self.accumulate_to(c, Mode::InWhitespace),
            _ if is_i7_punctuation(c) => {
                self.accumulate_and_flush(c, false, LexicalEffect::PlainText);
            }
            _ => self.accumulate_to(c, Mode::InWord),
        }
    }

    fn after_single_quote(&mut self, c: char) {
        if c == '\'' {
            self.flush(false, LexicalEffect::SingleQuote, 0);
            self.accumulate_to(c, Mode::AfterTwoSingleQuotes);
        } else {
            self.flush_and_restart(c, false, LexicalEffect::SingleQuote, 0);
        }
    }

    /// The middle quote of `'''` is an ordinary character.
    fn after_two_single_quotes(&mut self, c: char) {
        if c == '\'' {
            self.flush(false, LexicalEffect::PlainText, 0);
            self.accumulate_and_flush(c, false, LexicalEffect::SingleQuote);
        } else {
            self.flush_and_restart(c, false, LexicalEffect::SingleQuote, 0);
        }
    }

    fn in_whitespace(&mut self, c: char) {
        if is_whitespace(c) && c != '\r' && c != '\n' {
            self.accumulate(c);
        } else {
            self.flush_and_restart(c, true, LexicalEffect::PlainText, 0);
        }
    }

    /// After a lone `\r` or `\n`; `pair` is the codepoint completing a
    /// two-codepoint newline.
    fn after_line_break(&mut self, c: char, pair: char) {
        if c == pair {
            self.accumulate_to(c, Mode::AfterNewline);
        } else {
            self.after_newline(c);
        }
    }

    fn after_newline(&mut self, c: char) {
        match c {
            '\t' => self.accumulate_to(c, Mode::InIndentation),
            '-' if !self.documentation_break_inhibited => {
                self.accumulate_to(c, Mode::InDocumentationBreak);
            }
            _ => {
                if c == '-' {
                    self.documentation_break_inhibited = false;
                }
                self.flush_and_restart(c, true, LexicalEffect::BareNewline, 1);
            }
        }
    }

    fn in_indentation(&mut self, c: char) {
        if c == '\t' {
            self.accumulate(c);
        } else {
            self.flush_and_restart(c, true, LexicalEffect::Indentation, 1);
        }
    }

    fn in_word(&mut self, c: char) {
        if is_i7_letter(c) {
            self.accumulate(c);
        } else {
            self.flush_and_restart(c, false, LexicalEffect::PlainText, 0);
        }
    }

    fn after_open_parenthesis(&mut self, c: char) {
        match c {
            '-' => self.accumulate_and_flush(c, false, LexicalEffect::LeftCyclops),
            '+' => self.accumulate_and_flush(c, false, LexicalEffect::LeftCrosseyedCyclops),
            _ => self.flush_and_restart(c, false, LexicalEffect::PlainText, 0),
        }
    }

    fn after_hyphen(&mut self, c: char) {
        if c == ')' {
            self.accumulate_and_flush(c, false, LexicalEffect::RightCyclops);
        } else {
            self.flush_and_restart(c, false, LexicalEffect::PlainText, 0);
        }
    }

    fn after_plus(&mut self, c: char) {
        if c == ')' {
            self.accumulate_and_flush(c, false, LexicalEffect::RightCrosseyedCyclops);
        } else {
            self.flush_and_restart(c, false, LexicalEffect::PlainText, 0);
        }
    }

    fn in_documentation_break(&mut self, c: char) {
        let matched = self.documentation_break_match_count;
        if matched == DOCUMENTATION_BREAK_BODY {
            match c {
                '\n' => {
                    return self.accumulate_to(c, Mode::AfterDocumentationBreakEndedByLineFeed);
                }
                '\r' => {
                    return self
                        .accumulate_to(c, Mode::AfterDocumentationBreakEndedByCarriageReturn);
                }
                _ => {}
            }
        } else if DOCUMENTATION_BREAK.get(matched) == Some(&c) {
            self.documentation_break_match_count += 1;
            return self.accumulate(c);
        }
        self.relex(c);
    }

    fn after_documentation_break(&mut self, c: char, pair: Option<char>) {
        match c {
            '\t' => self.accumulate_to(c, Mode::InIndentationAfterDocumentationBreak),
            _ if Some(c) == pair => {
                self.accumulate_to(c, Mode::AfterDocumentationBreakEndedByNewline);
            }
            _ => self.flush_and_restart(c, false, LexicalEffect::DocumentationBreak, 2),
        }
    }

    fn in_indentation_after_documentation_break(&mut self, c: char) {
        if c == '\t' {
            self.accumulate(c);
        } else {
            self.flush_and_restart(
                c,
                false,
                LexicalEffect::DocumentationBreakFollowedByIndentation,
                2,
            );
        }
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;

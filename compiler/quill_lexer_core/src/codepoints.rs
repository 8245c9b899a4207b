//! Codepoint classes.
//!
//! Text is handled one `char` at a time. Whitespace is the Unicode set plus
//! `|`, which Inform 7 reads as a paragraph break. I7 punctuation is exactly
//! the characters that can take part in a lexical delimiter other than a
//! documentation break. Everything else except [`TERMINATOR`] is a letter.
//!
//! Line breaks are not normalized: the client counts codepoints on the raw
//! text, and so must we.

use crate::TERMINATOR;

pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'..='\u{000D}'
            | ' '
            | '|'
            | '\u{0085}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{180E}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

pub fn is_i7_punctuation(c: char) -> bool {
    matches!(
        c,
        '!' | '"' | '\'' | '(' | ')' | '*' | '+' | '-' | '.' | ':' | ';' | '[' | '\\' | ']'
    )
}

pub fn is_i7_letter(c: char) -> bool {
    !is_whitespace(c) && !is_i7_punctuation(c) && c != TERMINATOR
}

pub fn is_i7_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Letters of `DOCUMENTATION`, the only letters a documentation break can
/// contain.
pub fn is_lexical_delimiter_letter(c: char) -> bool {
    matches!(c, 'D' | 'O' | 'C' | 'U' | 'M' | 'E' | 'N' | 'T' | 'A' | 'I')
}

/// Fold word-processor substitutes to the plain characters Inform expects.
///
/// Fancy spaces become spaces, dashes hyphens, curly quotes straight quotes,
/// and NEL or the Unicode line and paragraph separators line feeds. Every
/// mapping is one codepoint to one codepoint, so offsets are preserved.
pub fn i7_normalize(c: char) -> char {
    match c {
        '\u{0085}' | '\u{2028}' | '\u{2029}' => '\n',
        '\u{00A0}' | '\u{2000}'..='\u{200A}' => ' ',
        '\u{2010}'..='\u{2014}' => '-',
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{201C}' | '\u{201D}' => '"',
        _ => c,
    }
}

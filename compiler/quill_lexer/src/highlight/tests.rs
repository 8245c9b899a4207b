use super::*;
use crate::relexer::{relex, Edit};
use crate::token::Token;
use pretty_assertions::assert_eq;
use quill_ir::Vocabulary;
use quill_lexer_core::Lexer;

use LexicalSuperstate as S;

fn state(superstate: LexicalSuperstate, depth: u8) -> LexicalState {
    LexicalState::with_depth(superstate, depth)
}

fn sequence(source: &str, vocabulary: &mut Vocabulary) -> TokenSequence {
    let mut tokens = TokenSequence::new();
    for raw in Lexer::lex(source) {
        tokens.insert(tokens.end(), Token::from_raw(&raw, vocabulary));
    }
    tokens
}

fn run(lo: usize, hi: usize, code: HighlightCode) -> HighlightRun {
    HighlightRun { lo, hi, code }
}

// === Codes ===

#[test]
fn prose_strings_and_substitutions() {
    let i7 = S::I7.into();
    let string = S::I7String.into();
    let substitution = S::I7Substitution.into();
    assert_eq!(highlight_code(i7, i7), HighlightCode::ORDINARY_I7);
    assert_eq!(highlight_code(i7, string), HighlightCode::STRING_LITERAL_DELIMITER);
    assert_eq!(highlight_code(string, string), HighlightCode::STRING_LITERAL);
    assert_eq!(highlight_code(string, i7), HighlightCode::STRING_LITERAL_DELIMITER);
    assert_eq!(
        highlight_code(string, substitution),
        HighlightCode::SUBSTITUTION_DELIMITER
    );
    assert_eq!(highlight_code(substitution, substitution), HighlightCode::SUBSTITUTION);
    assert_eq!(
        highlight_code(substitution, string),
        HighlightCode::SUBSTITUTION_DELIMITER
    );
}

#[test]
fn inclusion_delimiters() {
    let i7 = S::I7.into();
    let i6 = S::I6.into();
    let nested = S::I7InI6.into();
    assert_eq!(highlight_code(i7, i6), HighlightCode::I6_DELIMITER);
    assert_eq!(highlight_code(i6, i6), HighlightCode::ORDINARY_I6);
    assert_eq!(highlight_code(i6, i7), HighlightCode::I6_DELIMITER);
    assert_eq!(highlight_code(i6, nested), HighlightCode::I7_DELIMITER);
    assert_eq!(highlight_code(nested, i6), HighlightCode::I7_DELIMITER);
    assert_eq!(highlight_code(nested, nested), HighlightCode::ORDINARY_I7);
}

#[test]
fn comments() {
    let i7 = S::I7.into();
    assert_eq!(highlight_code(i7, state(S::I7, 1)), HighlightCode::COMMENT_DELIMITER);
    assert_eq!(highlight_code(state(S::I7, 1), state(S::I7, 2)), HighlightCode::COMMENT);
    assert_eq!(highlight_code(state(S::I7, 1), i7), HighlightCode::COMMENT_DELIMITER);
    assert_eq!(
        highlight_code(S::I6.into(), S::I6Comment.into()),
        HighlightCode::COMMENT_DELIMITER
    );
    assert_eq!(
        highlight_code(S::I6Comment.into(), S::I6.into()),
        HighlightCode::ORDINARY_I6
    );
}

#[test]
fn documentation() {
    let i7 = S::I7.into();
    let documentation = S::I7ExtensionDocumentation.into();
    let extract = S::I7InExtract.into();
    assert_eq!(
        highlight_code(i7, documentation),
        HighlightCode::DOCUMENTATION_DELIMITER
    );
    assert_eq!(
        highlight_code(documentation, documentation),
        HighlightCode::DOCUMENTATION
    );
    assert_eq!(highlight_code(extract, documentation), HighlightCode::DOCUMENTATION);
    assert_eq!(highlight_code(documentation, extract), HighlightCode::ORDINARY_I7);
}

#[test]
fn character_literals() {
    let i6 = S::I6.into();
    let character = S::I6Character.into();
    assert_eq!(
        highlight_code(i6, character),
        HighlightCode::CHARACTER_LITERAL_DELIMITER
    );
    assert_eq!(highlight_code(character, character), HighlightCode::CHARACTER_LITERAL);
    assert_eq!(
        highlight_code(character, i6),
        HighlightCode::CHARACTER_LITERAL_DELIMITER
    );
}

// === Support ===

#[test]
fn parents_climb_to_ordinary_i7() {
    let chain: Vec<HighlightCode> =
        std::iter::successors(Some(HighlightCode::SUBSTITUTION_DELIMITER), |code| code.parent())
            .collect();
    assert_eq!(
        chain,
        vec![
            HighlightCode::SUBSTITUTION_DELIMITER,
            HighlightCode::SUBSTITUTION,
            HighlightCode::CHARACTER_LITERAL,
            HighlightCode::ORDINARY_I7,
        ]
    );
}

#[test]
fn every_parent_is_a_known_code() {
    for &code in HighlightCode::ALL {
        if let Some(parent) = code.parent() {
            assert!(HighlightCode::ALL.contains(&parent), "{code:?} -> {parent:?}");
        }
    }
}

#[test]
fn raw_values_round_trip() {
    assert_eq!(
        HighlightCode::from_raw(0x0004_0101),
        Some(HighlightCode::STRING_LITERAL_DELIMITER)
    );
    assert_eq!(HighlightCode::from_raw(0x0004_0102), None);
    assert_eq!(HighlightCode::STRING_LITERAL.raw(), 0x0004_0100);
    assert_eq!(HighlightCode::COMMENT.to_string(), "COMMENT");
}

#[test]
fn unsupported_codes_fall_back() {
    let basic = HighlightSupport::BASIC;
    assert_eq!(
        basic.resolve(HighlightCode::STRING_LITERAL_DELIMITER),
        HighlightCode::STRING_LITERAL
    );
    assert_eq!(
        basic.resolve(HighlightCode::DOCUMENTATION_DELIMITER),
        HighlightCode::DOCUMENTATION
    );
    assert_eq!(
        basic.resolve(HighlightCode::SUBSTITUTION_DELIMITER),
        HighlightCode::ORDINARY_I7
    );
    assert_eq!(
        HighlightSupport::empty().resolve(HighlightCode::COMMENT),
        HighlightCode::ORDINARY_I7
    );
    for &code in HighlightCode::ALL {
        assert_eq!(HighlightSupport::default().resolve(code), code);
    }
}

// === Runs ===

#[test]
fn whole_buffer_runs_merge_equal_codes() {
    let mut vocabulary = Vocabulary::new();
    let tokens = sequence("say \"hi [x]\".", &mut vocabulary);
    assert_eq!(
        highlight_all(&tokens, HighlightSupport::all()),
        vec![
            run(0, 4, HighlightCode::ORDINARY_I7),
            run(4, 5, HighlightCode::STRING_LITERAL_DELIMITER),
            run(5, 8, HighlightCode::STRING_LITERAL),
            run(8, 9, HighlightCode::SUBSTITUTION_DELIMITER),
            run(9, 10, HighlightCode::SUBSTITUTION),
            run(10, 11, HighlightCode::SUBSTITUTION_DELIMITER),
            run(11, 12, HighlightCode::STRING_LITERAL_DELIMITER),
            run(12, 13, HighlightCode::ORDINARY_I7),
        ]
    );
}

#[test]
fn basic_support_merges_more() {
    let mut vocabulary = Vocabulary::new();
    let tokens = sequence("a \"b\"", &mut vocabulary);
    assert_eq!(
        highlight_all(&tokens, HighlightSupport::BASIC),
        vec![
            run(0, 2, HighlightCode::ORDINARY_I7),
            run(2, 5, HighlightCode::STRING_LITERAL),
        ]
    );
}

// === Rehighlighting ===

#[test]
fn opening_a_string_rehighlights_to_the_end() {
    let mut vocabulary = Vocabulary::new();
    let mut tokens = sequence("a b c", &mut vocabulary);
    let outcome = relex(&mut tokens, &mut vocabulary, Edit::insert(2, "\""));
    let outcome = outcome.ok().flatten().unwrap_or_else(|| unreachable!());
    assert_eq!(
        rehighlight(&tokens, &outcome, HighlightSupport::all()),
        vec![
            HighlightEvent::Remove { lo: 2, hi: 6 },
            HighlightEvent::Add(run(2, 3, HighlightCode::STRING_LITERAL_DELIMITER)),
            HighlightEvent::Add(run(3, 6, HighlightCode::STRING_LITERAL)),
        ]
    );
}

#[test]
fn local_edits_rehighlight_locally() {
    let mut vocabulary = Vocabulary::new();
    let mut tokens = sequence("a b c d", &mut vocabulary);
    let outcome = relex(&mut tokens, &mut vocabulary, Edit::insert(2, "x"));
    let outcome = outcome.ok().flatten().unwrap_or_else(|| unreachable!());
    assert_eq!(
        rehighlight(&tokens, &outcome, HighlightSupport::all()),
        vec![
            HighlightEvent::Remove { lo: 1, hi: 4 },
            HighlightEvent::Add(run(1, 4, HighlightCode::ORDINARY_I7)),
        ]
    );
}

#[test]
fn deleting_at_the_end_emits_nothing() {
    let mut vocabulary = Vocabulary::new();
    let mut tokens = sequence("a b", &mut vocabulary);
    let outcome = relex(&mut tokens, &mut vocabulary, Edit::remove(1, 3));
    let outcome = outcome.ok().flatten().unwrap_or_else(|| unreachable!());
    assert!(rehighlight(&tokens, &outcome, HighlightSupport::all()).is_empty());
}

#[test]
fn events_display() {
    assert_eq!(HighlightEvent::Remove { lo: 1, hi: 4 }.to_string(), "remove 1..4");
    assert_eq!(
        HighlightEvent::Add(run(1, 4, HighlightCode::COMMENT)).to_string(),
        "add 1..4 COMMENT"
    );
}

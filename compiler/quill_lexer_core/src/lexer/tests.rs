use super::*;
use pretty_assertions::assert_eq;

fn texts(source: &str) -> Vec<String> {
    Lexer::lex(source).into_iter().map(|token| token.text).collect()
}

fn effects(source: &str) -> Vec<LexicalEffect> {
    Lexer::lex(source)
        .into_iter()
        .map(|token| token.effect)
        .collect()
}

// === Words and Whitespace ===

#[test]
fn words_spaces_and_punctuation() {
    assert_eq!(texts("take lamp."), vec!["take", " ", "lamp", "."]);
    let tokens = Lexer::lex("take lamp.");
    let whitespace: Vec<bool> = tokens.iter().map(|t| t.only_whitespace).collect();
    assert_eq!(whitespace, vec![false, true, false, false]);
}

#[test]
fn commas_stay_inside_words() {
    assert_eq!(texts("red,green"), vec!["red,green"]);
}

#[test]
fn whitespace_runs_merge() {
    assert_eq!(texts("a \t|b"), vec!["a", " \t|", "b"]);
}

#[test]
fn empty_input_has_no_tokens() {
    assert!(Lexer::lex("").is_empty());
}

// === Line Breaks ===

#[test]
fn two_codepoint_newlines_are_one_token() {
    let tokens = Lexer::lex("a\r\nb\n\rc");
    let summary: Vec<(&str, LexicalEffect, u32)> = tokens
        .iter()
        .map(|t| (t.text.as_str(), t.effect, t.line_count))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a", LexicalEffect::PlainText, 0),
            ("\r\n", LexicalEffect::BareNewline, 1),
            ("b", LexicalEffect::PlainText, 0),
            ("\n\r", LexicalEffect::BareNewline, 1),
            ("c", LexicalEffect::PlainText, 0),
        ]
    );
}

#[test]
fn blank_lines_are_separate_tokens() {
    assert_eq!(texts("\n\n"), vec!["\n", "\n"]);
}

#[test]
fn tabs_after_newline_are_indentation() {
    let tokens = Lexer::lex("x\n\t\ty");
    assert_eq!(tokens[1].text, "\n\t\t");
    assert_eq!(tokens[1].effect, LexicalEffect::Indentation);
    assert!(tokens[1].only_whitespace);
    assert_eq!(tokens[1].line_count, 1);
}

// === Delimiters ===

#[test]
fn inclusion_delimiters() {
    assert_eq!(texts("(-x-)"), vec!["(-", "x", "-)"]);
    assert_eq!(
        effects("(-x-)"),
        vec![
            LexicalEffect::LeftCyclops,
            LexicalEffect::PlainText,
            LexicalEffect::RightCyclops,
        ]
    );
    assert_eq!(
        effects("(+y+)"),
        vec![
            LexicalEffect::LeftCrosseyedCyclops,
            LexicalEffect::PlainText,
            LexicalEffect::RightCrosseyedCyclops,
        ]
    );
}

#[test]
fn lone_parentheses_and_signs_are_plain() {
    assert_eq!(texts("(a) - +"), vec!["(", "a", ")", " ", "-", " ", "+"]);
    assert!(effects("(a) - +")
        .iter()
        .all(|&e| e == LexicalEffect::PlainText));
}

#[test]
fn quote_bracket_bang() {
    assert_eq!(
        effects("\"[]!"),
        vec![
            LexicalEffect::DoubleQuote,
            LexicalEffect::LeftBracket,
            LexicalEffect::RightBracket,
            LexicalEffect::Bang,
        ]
    );
}

#[test]
fn single_quote_runs() {
    assert_eq!(
        effects("''"),
        vec![LexicalEffect::SingleQuote, LexicalEffect::SingleQuote]
    );
    assert_eq!(
        effects("'''"),
        vec![
            LexicalEffect::SingleQuote,
            LexicalEffect::PlainText,
            LexicalEffect::SingleQuote,
        ]
    );
}

// === Documentation Breaks ===

#[test]
fn documentation_break_is_one_token() {
    let tokens = Lexer::lex("a\n---- DOCUMENTATION ----\nb");
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[1].text, "\n---- DOCUMENTATION ----\n");
    assert_eq!(tokens[1].effect, LexicalEffect::DocumentationBreak);
    assert_eq!(tokens[1].line_count, 2);
    assert!(!tokens[1].only_whitespace);
}

#[test]
fn documentation_break_with_indentation() {
    let tokens = Lexer::lex("a\r\n---- DOCUMENTATION ----\r\n\tb");
    assert_eq!(tokens[1].text, "\r\n---- DOCUMENTATION ----\r\n\t");
    assert_eq!(
        tokens[1].effect,
        LexicalEffect::DocumentationBreakFollowedByIndentation
    );
}

#[test]
fn failed_documentation_break_relexes() {
    assert_eq!(texts("a\n--x"), vec!["a", "\n", "-", "-", "x"]);
    assert_eq!(
        texts("\n---- DOCUMENT"),
        vec!["\n", "-", "-", "-", "-", " ", "DOCUMENT"]
    );
}

#[test]
fn failed_break_still_allows_a_later_one() {
    let tokens = Lexer::lex("\n-x\n---- DOCUMENTATION ----\n");
    let last = tokens.last().map(|t| t.effect);
    assert_eq!(last, Some(LexicalEffect::DocumentationBreak));
}

// === Combination ===

#[test]
fn combination_tracking() {
    let mut lexer = Lexer::new();
    lexer.push('a');
    assert!(lexer.most_recent_codepoint_did_not_combine());
    lexer.push('b');
    assert!(!lexer.most_recent_codepoint_did_not_combine());
    lexer.push(' ');
    assert!(lexer.most_recent_codepoint_did_not_combine());
    assert_eq!(lexer.results().len(), 1);
}

#[test]
fn pending_quotes_are_never_fresh() {
    let mut lexer = Lexer::new();
    lexer.push('x');
    lexer.push('\'');
    assert!(!lexer.most_recent_codepoint_did_not_combine());
    lexer.push('y');
    assert!(lexer.most_recent_codepoint_did_not_combine());
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Tokens always spell out the input exactly.
        #[test]
        fn tokens_cover_input(source in "[a-zA-Z0-9 .,:;!?'\"()\\[\\]+\\-\r\n\t|]{0,80}") {
            let joined: String = texts(&source).concat();
            prop_assert_eq!(joined, source);
        }

        /// No token is empty.
        #[test]
        fn tokens_are_non_empty(source in "[a-z \\-\n(+)']{0,60}") {
            prop_assert!(Lexer::lex(&source).iter().all(|t| !t.text.is_empty()));
        }
    }
}

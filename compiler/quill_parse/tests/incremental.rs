//! Edits should cost the same however long the buffer is, and undoing an
//! edit should put the chart back as it was.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use pretty_assertions::assert_eq;
use quill_ir::Word;
use quill_parse::sample::{self, SampleGrammar};
use quill_parse::{BufferId, BufferKind, MatchSpan, Parseme, Production, Session, SessionConfig};

const BUFFER: BufferId = BufferId(1);

/// One assignment sentence: seven tokens, eight codepoints.
const SENTENCE: &str = "x is 1. ";

fn assignments(sentences: usize) -> Session {
    let mut session = Session::new(SessionConfig {
        stats: true,
        ..SessionConfig::default()
    });
    let result = session.nonterminal("assignment", 0);
    let is = session.intern("is");
    session
        .add_production(
            Production::sentence(result)
                .alternative(Parseme::Word)
                .slot()
                .token(is)
                .slot()
                .alternative(Parseme::Digits)
                .slot()
                .alternative(Parseme::SentenceEnd)
                .build(),
        )
        .unwrap();
    session.introduce_buffer(BUFFER, BufferKind::Story).unwrap();
    session.edit(BUFFER, 0, 0, &SENTENCE.repeat(sentences)).unwrap();
    session
}

#[test]
fn mid_buffer_insert_cost_is_independent_of_length() {
    let mut costs = Vec::new();
    for tokens in [1_000, 10_000] {
        let sentences = tokens / 7;
        let mut session = assignments(sentences);
        assert_eq!(session.complete_matches(BUFFER).unwrap().len(), sentences);
        session.take_stats();

        let at = sentences / 2 * SENTENCE.len();
        session.edit(BUFFER, at, at, "y").unwrap();
        costs.push(session.take_stats());
        // "yx" is still a word, so nothing is lost.
        assert_eq!(session.complete_matches(BUFFER).unwrap().len(), sentences);
    }
    assert_eq!(costs[0], costs[1]);
    assert!(costs[0].transitions > 0);
}

#[test]
fn breaking_a_sentence_is_local() {
    let mut costs = Vec::new();
    for sentences in [100, 1_000] {
        let mut session = assignments(sentences);
        session.take_stats();
        let at = sentences / 2 * SENTENCE.len() + 6;
        // Without the full stop neither this sentence nor the next matches.
        session.edit(BUFFER, at, at + 1, "").unwrap();
        costs.push(session.take_stats());
        assert_eq!(session.complete_matches(BUFFER).unwrap().len(), sentences - 2);
    }
    assert_eq!(costs[0], costs[1]);
}

fn declarations() -> (Session, SampleGrammar, Vec<MatchSpan>) {
    let mut session = Session::new(SessionConfig::default());
    let grammar = sample::install(&mut session).unwrap();
    session.introduce_buffer(BUFFER, BufferKind::Story).unwrap();
    let text = "# foo is a wording. x (3) ; # bar baz is a line;\n# qux is a passage:";
    session.edit(BUFFER, 0, 0, text).unwrap();
    let matches = session.complete_matches(BUFFER).unwrap();
    (session, grammar, matches)
}

#[test]
fn removing_and_restoring_text_round_trips() {
    let (mut session, _, original) = declarations();
    assert!(!original.is_empty());
    let text = session.text(BUFFER).unwrap();
    let len = text.chars().count();

    session.edit(BUFFER, 0, len, "").unwrap();
    assert_eq!(session.complete_matches(BUFFER).unwrap(), Vec::new());
    let buffer = session.buffer(BUFFER).unwrap();
    assert_eq!(buffer.potential_matches().count(), 0);

    session.edit(BUFFER, 0, 0, &text).unwrap();
    assert_eq!(session.complete_matches(BUFFER).unwrap(), original);
}

#[test]
fn removing_and_restoring_a_middle_slice_round_trips() {
    let (mut session, _, original) = declarations();
    let text = session.text(BUFFER).unwrap();
    let slice: String = text.chars().skip(12).take(20).collect();

    session.edit(BUFFER, 12, 32, "").unwrap();
    assert_ne!(session.complete_matches(BUFFER).unwrap(), original);
    session.edit(BUFFER, 12, 12, &slice).unwrap();
    assert_eq!(session.text(BUFFER).unwrap(), text);
    assert_eq!(session.complete_matches(BUFFER).unwrap(), original);
}

#[test]
fn grammar_round_trips_over_existing_text() {
    let (mut session, grammar, original) = declarations();
    let removed = session.remove_production(grammar.name_words_more).unwrap();
    assert!(session.complete_matches(BUFFER).unwrap().len() < original.len());

    let restored = session.add_production(removed).unwrap();
    // Ids are never reused, so compare by shape.
    let strip = |spans: &[MatchSpan]| -> Vec<(usize, usize, Word)> {
        spans
            .iter()
            .map(|span| (span.lo, span.hi, span.result.name))
            .collect()
    };
    let mut now = strip(&session.complete_matches(BUFFER).unwrap());
    let mut before = strip(&original);
    now.sort_unstable();
    before.sort_unstable();
    assert_eq!(now, before);
    assert_ne!(restored, grammar.name_words_more);
}

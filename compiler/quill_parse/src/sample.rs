//! The core grammar every Inform source text is parsed with: brackets,
//! numbers, words, sentence ends and nonterminal declarations.

use crate::grammar::{GrammarError, Nonterminal, Parseme, Production, ProductionId};
use crate::session::Session;

/// Nonterminals and productions defined by [`install`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleGrammar {
    pub left_parenthesis: Nonterminal,
    pub right_parenthesis: Nonterminal,
    pub digits: Nonterminal,
    pub word: Nonterminal,
    pub name_word: Nonterminal,
    pub name_words: Nonterminal,
    pub end_of_sentence: Nonterminal,
    pub declaration: Nonterminal,
    /// Sentence ends by full stop, semicolon and colon.
    pub sentence_ends: Vec<ProductionId>,
    pub end_of_sentence_alternation: ProductionId,
    pub name_words_single: ProductionId,
    pub name_words_more: ProductionId,
    pub declaration_production: ProductionId,
}

/// Define the core grammar in a session.
pub fn install(session: &mut Session) -> Result<SampleGrammar, GrammarError> {
    let left_parenthesis = session.nonterminal("left parenthesis", 0);
    let right_parenthesis = session.nonterminal("right parenthesis", 0);
    let digits = session.nonterminal("digits", 0);
    let word = session.nonterminal("word", 0);
    let name_word = session.nonterminal("name word", 0);
    let name_words = session.nonterminal("name words (internal)", 0);
    let end_of_sentence = session.nonterminal("end of a sentence", 0);
    let declaration = session.nonterminal("a nonterminal declaration", 0);

    let open = session.intern("(");
    let close = session.intern(")");
    session.add_production(Production::wording(left_parenthesis).token(open).build())?;
    session.add_production(Production::wording(right_parenthesis).token(close).build())?;
    session.add_production(Production::wording(digits).alternative(Parseme::Digits).build())?;
    session.add_production(Production::wording(word).alternative(Parseme::Word).build())?;
    session.add_production(Production::wording(name_word).alternative(Parseme::NameWord).build())?;

    let mut ends = Vec::with_capacity(3);
    let mut sentence_ends = Vec::with_capacity(3);
    for (label, text) in [("full stop", "."), ("semicolon", ";"), ("colon", ":")] {
        let result = session.nonterminal(&format!("end of a sentence with {label} (internal)"), 0);
        let mark = session.intern(text);
        sentence_ends.push(session.add_production(Production::sentence(result).token(mark).build())?);
        ends.push(result);
    }
    let end_of_sentence_alternation = session.add_production(
        ends.into_iter()
            .fold(Production::sentence(end_of_sentence), |builder, end| builder.nonterminal(end))
            .build(),
    )?;

    let name_words_single =
        session.add_production(Production::wording(name_words).nonterminal(name_word).build())?;
    let name_words_more = session.add_production(
        Production::wording(name_words)
            .slot()
            .nonterminal(name_words)
            .slot()
            .nonterminal(name_word)
            .build(),
    )?;

    let hash = session.intern("#");
    let is = session.intern("is");
    let a = session.intern("a");
    let mut kinds = Production::sentence(declaration)
        .slot()
        .token(hash)
        .slot()
        .nonterminal(name_words)
        .slot()
        .token(is)
        .slot()
        .token(a)
        .slot();
    for kind in ["wording", "line", "sentence", "passage"] {
        kinds = kinds.token(session.intern(kind));
    }
    let declaration_production =
        session.add_production(kinds.slot().nonterminal(end_of_sentence).build())?;

    Ok(SampleGrammar {
        left_parenthesis,
        right_parenthesis,
        digits,
        word,
        name_word,
        name_words,
        end_of_sentence,
        declaration,
        sentence_ends,
        end_of_sentence_alternation,
        name_words_single,
        name_words_more,
        declaration_production,
    })
}

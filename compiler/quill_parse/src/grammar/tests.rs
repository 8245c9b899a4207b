use super::*;
use pretty_assertions::assert_eq;

use crate::site::TokenTraits;

struct Names {
    vocabulary: Vocabulary,
}

impl Names {
    fn new() -> Self {
        Names {
            vocabulary: Vocabulary::new(),
        }
    }

    fn nt(&mut self, name: &str) -> Nonterminal {
        Nonterminal::new(self.vocabulary.intern(name), 0)
    }

    fn word(&mut self, text: &str) -> Word {
        self.vocabulary.intern(text)
    }
}

fn define(grammar: &mut Grammar, names: &Names, production: Production) -> ProductionId {
    grammar
        .validate(&production, &names.vocabulary)
        .unwrap_or_else(|error| panic!("{error}"));
    grammar.define(production)
}

fn token_info(text: Word, traits: TokenTraits) -> SiteInfo {
    SiteInfo {
        text: Some(text),
        traits,
    }
}

// === Parsemes ===

#[test]
fn tiers_accept_at_least_their_level() {
    let mut names = Names::new();
    let thing = names.nt("thing");
    let high = Nonterminal::new(thing.name, 2);
    assert!(Nonterminal::new(thing.name, 1).accepts(high));
    assert!(high.accepts(high));
    assert!(!Nonterminal::new(thing.name, 3).accepts(high));
    let other = names.nt("other");
    assert!(!other.accepts(thing));
}

#[test]
fn terminal_classes() {
    let mut names = Names::new();
    let digits = names.word("12");
    let info = token_info(
        digits,
        TokenTraits::DIGITS | TokenTraits::WORD | TokenTraits::PROSE,
    );
    assert!(Parseme::Digits.accepts_token(&info));
    assert!(Parseme::Word.accepts_token(&info));
    assert!(!Parseme::NameWord.accepts_token(&info));
    assert!(Parseme::Token(digits).accepts_token(&info));
    assert!(!Parseme::Epsilon.accepts_token(&info));
    assert_eq!(
        ParsemeKey::of_token(&info).to_vec(),
        vec![ParsemeKey::Token(digits), ParsemeKey::Digits, ParsemeKey::Word]
    );
}

// === Productions ===

#[test]
fn builder_collects_slots_and_epsilon_prefix() {
    let mut names = Names::new();
    let result = names.nt("greeting");
    let hello = names.word("hello");
    let world = names.word("world");
    let production = Production::wording(result)
        .slot()
        .token(hello)
        .optional()
        .slot()
        .token(world)
        .token(world)
        .build();
    assert_eq!(production.arity(), 2);
    assert_eq!(production.epsilon_prefix(), 1);
    assert_eq!(production.slots()[1].alternatives(), &[Parseme::Token(world)]);
    assert_eq!(
        production.beginnings().collect::<Vec<_>>(),
        vec![Parseme::Token(hello), Parseme::Token(world)]
    );
    let info = token_info(world, TokenTraits::WORD | TokenTraits::PROSE);
    assert_eq!(production.opening_slots_for_token(&info).to_vec(), vec![1]);
}

#[test]
fn variants_guard_their_edges() {
    let mut names = Names::new();
    let result = names.nt("r");
    let a = names.word("a");
    let prose = token_info(a, TokenTraits::PROSE);
    let quoted = token_info(a, TokenTraits::empty());
    let two_slots = |builder: ProductionBuilder| builder.slot().token(a).slot().token(a).build();

    let subsentence = two_slots(Production::subsentence(result));
    assert!(subsentence.can_reach_slot_count_at(2, &quoted, &quoted));

    let wording = two_slots(Production::wording(result));
    assert!(!wording.can_reach_slot_count_at(1, &quoted, &prose));
    assert!(wording.can_reach_slot_count_at(1, &prose, &quoted));
    assert!(!wording.can_reach_slot_count_at(2, &prose, &quoted));
    assert!(wording.can_reach_slot_count_at(2, &prose, &prose));

    assert!(two_slots(Production::sentence(result)).ends_sentences());
    assert!(two_slots(Production::passage(result)).is_passage());
    assert!(!wording.ends_sentences());
}

// === Validation ===

#[test]
fn malformed_productions_are_rejected() {
    let mut names = Names::new();
    let result = names.nt("r");
    let a = names.word("a");
    let grammar = Grammar::new();
    let check = |production: Production| grammar.validate(&production, &names.vocabulary);

    assert_eq!(
        check(Production::wording(result).build()),
        Err(GrammarError::EmptyProduction)
    );
    assert_eq!(
        check(Production::wording(result).slot().token(a).slot().build()),
        Err(GrammarError::EmptySlot { slot: 1 })
    );
    assert_eq!(
        check(Production::wording(result).slot().optional().build()),
        Err(GrammarError::EpsilonOnly)
    );
}

#[test]
fn duplicates_are_rejected() {
    let mut names = Names::new();
    let result = names.nt("r");
    let a = names.word("a");
    let mut grammar = Grammar::new();
    let id = define(&mut grammar, &names, Production::wording(result).token(a).build());
    assert_eq!(
        grammar.validate(&Production::wording(result).token(a).build(), &names.vocabulary),
        Err(GrammarError::DuplicateProduction { existing: id })
    );
    // A different variant is a different production.
    assert_eq!(
        grammar.validate(&Production::sentence(result).token(a).build(), &names.vocabulary),
        Ok(())
    );
}

#[test]
fn unit_cycles_are_rejected() {
    let mut names = Names::new();
    let a = names.nt("a");
    let b = names.nt("b");
    let x = names.word("x");
    let mut grammar = Grammar::new();
    define(&mut grammar, &names, Production::wording(a).nonterminal(b).build());
    define(&mut grammar, &names, Production::wording(b).token(x).build());

    let closing = Production::wording(b)
        .slot()
        .token(x)
        .optional()
        .slot()
        .nonterminal(a)
        .build();
    match grammar.validate(&closing, &names.vocabulary) {
        Err(GrammarError::UnitCycle { name }) => assert!(name == "a" || name == "b", "{name}"),
        other => panic!("expected a unit cycle, got {other:?}"),
    }

    // Consuming a token as well breaks the cycle.
    let growing = Production::wording(b).slot().token(x).slot().nonterminal(a).build();
    assert_eq!(grammar.validate(&growing, &names.vocabulary), Ok(()));

    let itself = Production::wording(a).nonterminal(a).build();
    assert!(matches!(
        grammar.validate(&itself, &names.vocabulary),
        Err(GrammarError::UnitCycle { .. })
    ));
}

// === Indices ===

#[test]
fn closures_follow_left_corners() {
    let mut names = Names::new();
    let list = names.nt("list");
    let item = names.nt("item");
    let sentence = names.nt("sentence");
    let x = names.word("x");
    let and = names.word("and");
    let done = names.word("done");
    let mut grammar = Grammar::new();
    let single = define(&mut grammar, &names, Production::wording(item).token(x).build());
    let one = define(&mut grammar, &names, Production::wording(list).nonterminal(item).build());
    let more = define(
        &mut grammar,
        &names,
        Production::wording(list)
            .slot()
            .nonterminal(list)
            .slot()
            .token(and)
            .slot()
            .nonterminal(item)
            .build(),
    );
    let top = define(
        &mut grammar,
        &names,
        Production::sentence(sentence)
            .slot()
            .token(done)
            .slot()
            .nonterminal(list)
            .build(),
    );

    let mut closure: Vec<ProductionId> = grammar.additional_beginnings(list).collect();
    closure.sort_unstable();
    assert_eq!(closure, vec![single, one, more]);
    assert_eq!(grammar.additional_beginnings(item).collect::<Vec<_>>(), vec![single]);

    let mut ancestors: Vec<Nonterminal> = grammar.ancestors(single).collect();
    ancestors.sort_unstable();
    let mut expected = vec![list, item];
    expected.sort_unstable();
    assert_eq!(ancestors, expected);

    let top_production = grammar.get(top).cloned().unwrap_or_else(|| unreachable!());
    assert!(grammar.continues(&top_production, 1, more));
    assert!(!grammar.continues(&top_production, 0, more));
    assert_eq!(grammar.continuing_beginnings(&top_production, 1), vec![single, one, more]);

    // The sentence starts with a token, so nothing else opens sentences.
    assert_eq!(grammar.sentence_beginnings().collect::<Vec<_>>(), vec![top]);
    assert_eq!(
        grammar.beginning_with(&ParsemeKey::Nonterminal(list.name)).collect::<Vec<_>>(),
        vec![more]
    );
    assert_eq!(grammar.resulting_in(item.name).collect::<Vec<_>>(), vec![single]);
}

#[test]
fn relying_productions_include_the_crux() {
    let mut names = Names::new();
    let outer = names.nt("outer");
    let inner = names.nt("inner");
    let x = names.word("x");
    let y = names.word("y");
    let mut grammar = Grammar::new();
    let leaf = define(&mut grammar, &names, Production::wording(inner).token(x).build());
    let wrapper = define(
        &mut grammar,
        &names,
        Production::sentence(outer).slot().nonterminal(inner).slot().token(y).build(),
    );
    assert_eq!(grammar.productions_relying_on(wrapper), Ok(vec![leaf, wrapper]));
    assert_eq!(grammar.productions_relying_on(leaf), Ok(vec![leaf]));
    assert!(grammar.can_begin_sentence_with(leaf));

    let removed = grammar.undefine(wrapper).unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(removed.result(), outer);
    assert!(!grammar.can_begin_sentence_with(leaf));
    assert_eq!(
        grammar.productions_relying_on(wrapper),
        Err(GrammarError::UnknownProduction(wrapper))
    );
    assert_eq!(grammar.len(), 1);
    assert_eq!(grammar.find(&removed), None);
}

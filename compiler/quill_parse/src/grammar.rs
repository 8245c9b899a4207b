//! Productions and the indices the parser keeps over them.
//!
//! A production is a result nonterminal and a row of slots; each slot lists
//! the parsemes it accepts. The [`Grammar`] owns every defined production and
//! answers the two questions propagation keeps asking: which productions can
//! begin with a given parseme, and which productions can start a match that
//! some slot is waiting for (the left-corner closure of that slot's
//! nonterminal).

use std::fmt;

use quill_ir::{MultiMap, Vocabulary, Word};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::site::{SiteInfo, TokenTraits};

/// A named nonterminal at a tier.
///
/// As a slot requirement, `(name, tier)` accepts any match whose result has
/// the same name and a tier at least as high.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nonterminal {
    pub name: Word,
    pub tier: u32,
}

impl Nonterminal {
    pub const fn new(name: Word, tier: u32) -> Self {
        Nonterminal { name, tier }
    }

    /// Whether a slot asking for `self` takes a match resulting in `result`.
    #[inline]
    pub fn accepts(self, result: Nonterminal) -> bool {
        self.name == result.name && result.tier >= self.tier
    }
}

/// One thing a slot can accept.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Parseme {
    /// The slot may be skipped.
    Epsilon,
    /// A token with exactly this text.
    Token(Word),
    /// A token of ASCII digits.
    Digits,
    /// A token that does not start with punctuation.
    Word,
    /// A token that starts with a letter.
    NameWord,
    /// A sentence-ending token.
    SentenceEnd,
    Nonterminal(Nonterminal),
}

impl Parseme {
    /// Whether this parseme accepts a single token.
    pub fn accepts_token(self, info: &SiteInfo) -> bool {
        match self {
            Parseme::Token(text) => info.text == Some(text),
            Parseme::Digits => info.traits.contains(TokenTraits::DIGITS),
            Parseme::Word => info.traits.contains(TokenTraits::WORD),
            Parseme::NameWord => info.traits.contains(TokenTraits::NAME_WORD),
            Parseme::SentenceEnd => info.traits.contains(TokenTraits::SENTENCE_END),
            Parseme::Epsilon | Parseme::Nonterminal(_) => false,
        }
    }

    /// Whether this parseme accepts a complete match resulting in `result`.
    pub fn accepts_match(self, result: Nonterminal) -> bool {
        matches!(self, Parseme::Nonterminal(wanted) if wanted.accepts(result))
    }

    /// The index key of a parseme, `None` for epsilon.
    pub fn key(self) -> Option<ParsemeKey> {
        Some(match self {
            Parseme::Epsilon => return None,
            Parseme::Token(text) => ParsemeKey::Token(text),
            Parseme::Digits => ParsemeKey::Digits,
            Parseme::Word => ParsemeKey::Word,
            Parseme::NameWord => ParsemeKey::NameWord,
            Parseme::SentenceEnd => ParsemeKey::SentenceEnd,
            Parseme::Nonterminal(nonterminal) => ParsemeKey::Nonterminal(nonterminal.name),
        })
    }
}

/// Parsemes with tiers erased, for indexing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParsemeKey {
    Token(Word),
    Digits,
    Word,
    NameWord,
    SentenceEnd,
    Nonterminal(Word),
}

impl ParsemeKey {
    /// Every terminal key a token with `info` can be found under.
    pub fn of_token(info: &SiteInfo) -> SmallVec<[ParsemeKey; 4]> {
        let mut keys = SmallVec::new();
        keys.extend(info.text.map(ParsemeKey::Token));
        let classes = [
            (TokenTraits::DIGITS, ParsemeKey::Digits),
            (TokenTraits::WORD, ParsemeKey::Word),
            (TokenTraits::NAME_WORD, ParsemeKey::NameWord),
            (TokenTraits::SENTENCE_END, ParsemeKey::SentenceEnd),
        ];
        for (class, key) in classes {
            if info.traits.contains(class) {
                keys.push(key);
            }
        }
        keys
    }
}

/// An alternation of parsemes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Slot {
    alternatives: SmallVec<[Parseme; 2]>,
    epsilon: bool,
}

impl Slot {
    /// The non-epsilon alternatives.
    pub fn alternatives(&self) -> &[Parseme] {
        &self.alternatives
    }

    pub fn accepts_epsilon(&self) -> bool {
        self.epsilon
    }

    pub fn accepts_token(&self, info: &SiteInfo) -> bool {
        self.alternatives.iter().any(|p| p.accepts_token(info))
    }

    pub fn accepts_match(&self, result: Nonterminal) -> bool {
        self.alternatives.iter().any(|p| p.accepts_match(result))
    }

    /// The nonterminals this slot is waiting for.
    pub fn needs(&self) -> impl Iterator<Item = Nonterminal> + '_ {
        self.alternatives.iter().filter_map(|p| match *p {
            Parseme::Nonterminal(nonterminal) => Some(nonterminal),
            _ => None,
        })
    }

    fn push(&mut self, parseme: Parseme) {
        if parseme == Parseme::Epsilon {
            self.epsilon = true;
        } else if !self.alternatives.contains(&parseme) {
            self.alternatives.push(parseme);
        }
    }
}

/// Where a production may match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProductionVariant {
    /// Anywhere inside one sentence.
    Subsentence,
    /// A subsentence that begins and ends in plain prose.
    Wording,
    /// A wording that begins and ends at sentence boundaries.
    Sentence,
    /// Sentences in a row.
    Passage,
}

impl fmt::Display for ProductionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProductionVariant::Subsentence => "subsentence",
            ProductionVariant::Wording => "wording",
            ProductionVariant::Sentence => "sentence",
            ProductionVariant::Passage => "passage",
        })
    }
}

/// A result nonterminal and the slots that produce it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Production {
    variant: ProductionVariant,
    result: Nonterminal,
    slots: Vec<Slot>,
    /// Number of leading slots that may be skipped.
    epsilon_prefix: usize,
}

impl Production {
    pub fn subsentence(result: Nonterminal) -> ProductionBuilder {
        ProductionBuilder::new(ProductionVariant::Subsentence, result)
    }

    pub fn wording(result: Nonterminal) -> ProductionBuilder {
        ProductionBuilder::new(ProductionVariant::Wording, result)
    }

    pub fn sentence(result: Nonterminal) -> ProductionBuilder {
        ProductionBuilder::new(ProductionVariant::Sentence, result)
    }

    pub fn passage(result: Nonterminal) -> ProductionBuilder {
        ProductionBuilder::new(ProductionVariant::Passage, result)
    }

    #[inline]
    pub fn variant(&self) -> ProductionVariant {
        self.variant
    }

    #[inline]
    pub fn result(&self) -> Nonterminal {
        self.result
    }

    #[inline]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn epsilon_prefix(&self) -> usize {
        self.epsilon_prefix
    }

    #[inline]
    pub fn is_passage(&self) -> bool {
        self.variant == ProductionVariant::Passage
    }

    /// Whether completing this production needs a sentence boundary after it.
    #[inline]
    pub fn ends_sentences(&self) -> bool {
        matches!(
            self.variant,
            ProductionVariant::Sentence | ProductionVariant::Passage
        )
    }

    /// The slots a match may begin in: the first non-skippable slot and
    /// every skippable one before it.
    fn opening_slots(&self) -> std::ops::Range<usize> {
        0..(self.epsilon_prefix + 1).min(self.slots.len())
    }

    /// Every parseme a match can begin with.
    pub fn beginnings(&self) -> impl Iterator<Item = Parseme> + '_ {
        self.slots[self.opening_slots()]
            .iter()
            .flat_map(|slot| slot.alternatives.iter().copied())
    }

    /// Opening slots that accept the token described by `info`.
    pub fn opening_slots_for_token(&self, info: &SiteInfo) -> SmallVec<[usize; 2]> {
        self.opening_slots()
            .filter(|&index| self.slots[index].accepts_token(info))
            .collect()
    }

    /// Opening slots that accept a match resulting in `result`.
    pub fn opening_slots_for_match(&self, result: Nonterminal) -> SmallVec<[usize; 2]> {
        self.opening_slots()
            .filter(|&index| self.slots[index].accepts_match(result))
            .collect()
    }

    /// Whether a match of this production may have `slot_count` slots filled
    /// while running from a token described by `beginning` to one described
    /// by `end`.
    pub fn can_reach_slot_count_at(
        &self,
        slot_count: usize,
        beginning: &SiteInfo,
        end: &SiteInfo,
    ) -> bool {
        match self.variant {
            ProductionVariant::Subsentence => true,
            ProductionVariant::Wording
            | ProductionVariant::Sentence
            | ProductionVariant::Passage => {
                beginning.is_prose() && (slot_count < self.arity() || end.is_prose())
            }
        }
    }

    fn has_terminal_content(&self) -> bool {
        self.slots.iter().any(|slot| !slot.alternatives.is_empty())
    }

    /// Edges of the unit graph: nonterminals this production can turn into
    /// its result without consuming anything else.
    fn unit_targets(&self) -> impl Iterator<Item = Word> + '_ {
        self.slots.iter().enumerate().flat_map(move |(index, slot)| {
            let unit = self
                .slots
                .iter()
                .enumerate()
                .all(|(other, slot)| other == index || slot.epsilon);
            slot.needs()
                .filter(move |_| unit)
                .map(|nonterminal| nonterminal.name)
        })
    }
}

/// Assembles a [`Production`] slot by slot.
#[derive(Clone, Debug)]
pub struct ProductionBuilder {
    variant: ProductionVariant,
    result: Nonterminal,
    slots: Vec<Slot>,
}

impl ProductionBuilder {
    fn new(variant: ProductionVariant, result: Nonterminal) -> Self {
        ProductionBuilder {
            variant,
            result,
            slots: Vec::new(),
        }
    }

    /// Open a new, empty slot.
    #[must_use]
    pub fn slot(mut self) -> Self {
        self.slots.push(Slot::default());
        self
    }

    /// Add an alternative to the last slot, opening one if there is none.
    #[must_use]
    pub fn alternative(mut self, parseme: Parseme) -> Self {
        if self.slots.is_empty() {
            self.slots.push(Slot::default());
        }
        if let Some(slot) = self.slots.last_mut() {
            slot.push(parseme);
        }
        self
    }

    #[must_use]
    pub fn token(self, text: Word) -> Self {
        self.alternative(Parseme::Token(text))
    }

    #[must_use]
    pub fn nonterminal(self, nonterminal: Nonterminal) -> Self {
        self.alternative(Parseme::Nonterminal(nonterminal))
    }

    #[must_use]
    pub fn optional(self) -> Self {
        self.alternative(Parseme::Epsilon)
    }

    pub fn build(self) -> Production {
        let epsilon_prefix = self.slots.iter().take_while(|slot| slot.epsilon).count();
        Production {
            variant: self.variant,
            result: self.result,
            slots: self.slots,
            epsilon_prefix,
        }
    }
}

/// Identifier of a defined production. Never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionId(u32);

impl ProductionId {
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProductionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A production that cannot be added or removed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("production has no slots")]
    EmptyProduction,
    #[error("slot {slot} accepts nothing")]
    EmptySlot { slot: usize },
    #[error("production accepts only epsilon")]
    EpsilonOnly,
    #[error("production would let `{name}` derive itself over the same span")]
    UnitCycle { name: String },
    #[error("production is already defined as {existing}")]
    DuplicateProduction { existing: ProductionId },
    #[error("no production {0} is defined")]
    UnknownProduction(ProductionId),
}

/// The defined productions and their indices.
#[derive(Debug, Default)]
pub struct Grammar {
    productions: Vec<Option<Production>>,
    ids: FxHashMap<Production, ProductionId>,
    by_beginning: MultiMap<ParsemeKey, ProductionId>,
    by_result: MultiMap<Word, ProductionId>,
    /// Productions that can begin a match for each slot nonterminal.
    closures: FxHashMap<Nonterminal, FxHashSet<ProductionId>>,
    /// The inverse of `closures`.
    ancestors: MultiMap<ProductionId, Nonterminal>,
    sentence_beginnings: FxHashSet<ProductionId>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ProductionId) -> Option<&Production> {
        self.productions.get(id.0 as usize)?.as_ref()
    }

    pub fn contains(&self, id: ProductionId) -> bool {
        self.get(id).is_some()
    }

    /// Number of defined productions.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Defined productions in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (ProductionId, &Production)> {
        self.productions.iter().enumerate().filter_map(|(index, production)| {
            let id = ProductionId(u32::try_from(index).ok()?);
            Some((id, production.as_ref()?))
        })
    }

    /// The id of a production equal to `production`, if defined.
    pub fn find(&self, production: &Production) -> Option<ProductionId> {
        self.ids.get(production).copied()
    }

    pub fn beginning_with(&self, key: &ParsemeKey) -> impl Iterator<Item = ProductionId> + '_ {
        self.by_beginning.get(key).copied()
    }

    pub fn resulting_in(&self, name: Word) -> impl Iterator<Item = ProductionId> + '_ {
        self.by_result.get(&name).copied()
    }

    /// Productions that can begin at a sentence boundary.
    pub fn sentence_beginnings(&self) -> impl Iterator<Item = ProductionId> + '_ {
        self.sentence_beginnings.iter().copied()
    }

    pub fn can_begin_sentence_with(&self, id: ProductionId) -> bool {
        self.sentence_beginnings.contains(&id)
    }

    /// Productions that can begin a match for a slot asking for `nonterminal`.
    pub fn additional_beginnings(
        &self,
        nonterminal: Nonterminal,
    ) -> impl Iterator<Item = ProductionId> + '_ {
        self.closures.get(&nonterminal).into_iter().flatten().copied()
    }

    /// Slot nonterminals whose closure contains `id`.
    pub fn ancestors(&self, id: ProductionId) -> impl Iterator<Item = Nonterminal> + '_ {
        self.ancestors.get(&id).copied()
    }

    /// Whether `candidate` can begin the match that slot `slot` of
    /// `production` is waiting for.
    pub fn continues(&self, production: &Production, slot: usize, candidate: ProductionId) -> bool {
        production.slot(slot).is_some_and(|slot| {
            slot.needs().any(|nonterminal| {
                self.closures
                    .get(&nonterminal)
                    .is_some_and(|closure| closure.contains(&candidate))
            })
        })
    }

    /// Productions that can begin what `production` waits for in `slot`.
    pub fn continuing_beginnings(&self, production: &Production, slot: usize) -> Vec<ProductionId> {
        let mut found: Vec<ProductionId> = production
            .slot(slot)
            .into_iter()
            .flat_map(Slot::needs)
            .flat_map(|nonterminal| self.additional_beginnings(nonterminal))
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Defined productions that can begin a match of `production`, directly
    /// or through other left corners. `production` itself is only included
    /// when it is defined and left-recursive.
    pub fn left_corner_descendants(&self, production: &Production) -> Vec<ProductionId> {
        let mut found = FxHashSet::default();
        let roots = production.beginnings().filter_map(|parseme| match parseme {
            Parseme::Nonterminal(nonterminal) => Some(nonterminal),
            _ => None,
        });
        self.close_over(roots, &mut found);
        let mut found: Vec<ProductionId> = found.into_iter().collect();
        found.sort_unstable();
        found
    }

    /// A production together with its left-corner descendants: everything
    /// whose derivations change when it is added or removed.
    pub fn productions_relying_on(&self, crux: ProductionId) -> Result<Vec<ProductionId>, GrammarError> {
        let production = self.get(crux).ok_or(GrammarError::UnknownProduction(crux))?;
        let mut relying = self.left_corner_descendants(production);
        if let Err(at) = relying.binary_search(&crux) {
            relying.insert(at, crux);
        }
        Ok(relying)
    }

    fn close_over(
        &self,
        roots: impl IntoIterator<Item = Nonterminal>,
        found: &mut FxHashSet<ProductionId>,
    ) {
        let mut stack: Vec<Nonterminal> = roots.into_iter().collect();
        let mut seen: FxHashSet<Nonterminal> = stack.iter().copied().collect();
        while let Some(wanted) = stack.pop() {
            for id in self.by_result.get(&wanted.name) {
                let Some(production) = self.get(*id) else {
                    continue;
                };
                if !wanted.accepts(production.result) || !found.insert(*id) {
                    continue;
                }
                for parseme in production.beginnings() {
                    if let Parseme::Nonterminal(next) = parseme {
                        if seen.insert(next) {
                            stack.push(next);
                        }
                    }
                }
            }
        }
    }

    /// Check that `production` could be defined.
    pub fn validate(
        &self,
        production: &Production,
        vocabulary: &Vocabulary,
    ) -> Result<(), GrammarError> {
        if production.slots.is_empty() {
            return Err(GrammarError::EmptyProduction);
        }
        if let Some(slot) = production
            .slots
            .iter()
            .position(|slot| slot.alternatives.is_empty() && !slot.epsilon)
        {
            return Err(GrammarError::EmptySlot { slot });
        }
        if !production.has_terminal_content() {
            return Err(GrammarError::EpsilonOnly);
        }
        if let Some(existing) = self.find(production) {
            return Err(GrammarError::DuplicateProduction { existing });
        }
        if let Some(name) = self.unit_cycle_with(production) {
            return Err(GrammarError::UnitCycle {
                name: vocabulary.lookup(name).to_owned(),
            });
        }
        Ok(())
    }

    /// A nonterminal name on a unit cycle once `extra` is added, if any.
    fn unit_cycle_with(&self, extra: &Production) -> Option<Word> {
        let mut edges: MultiMap<Word, Word> = MultiMap::new();
        let all = self.iter().map(|(_, production)| production).chain([extra]);
        for production in all {
            for target in production.unit_targets() {
                edges.insert(production.result.name, target);
            }
        }
        // Depth-first search with an explicit stack; `on_path` marks the
        // vertices of the current path.
        let mut done: FxHashSet<Word> = FxHashSet::default();
        let mut on_path: FxHashSet<Word> = FxHashSet::default();
        let mut roots: Vec<Word> = edges.keys().copied().collect();
        roots.sort_unstable();
        for root in roots {
            if done.contains(&root) {
                continue;
            }
            let mut stack: Vec<(Word, Vec<Word>)> = vec![(root, edges.get(&root).copied().collect())];
            on_path.insert(root);
            while let Some((vertex, pending)) = stack.last_mut() {
                let vertex = *vertex;
                match pending.pop() {
                    Some(next) if on_path.contains(&next) => return Some(next),
                    Some(next) if !done.contains(&next) => {
                        on_path.insert(next);
                        stack.push((next, edges.get(&next).copied().collect()));
                    }
                    Some(_) => {}
                    None => {
                        on_path.remove(&vertex);
                        done.insert(vertex);
                        stack.pop();
                    }
                }
            }
        }
        None
    }

    /// Define a validated production and rebuild the closures.
    pub(crate) fn define(&mut self, production: Production) -> ProductionId {
        let id = ProductionId(
            u32::try_from(self.productions.len())
                .unwrap_or_else(|_| panic!("grammar exceeded {} productions", u32::MAX)),
        );
        for key in production.beginnings().filter_map(Parseme::key) {
            self.by_beginning.insert(key, id);
        }
        self.by_result.insert(production.result.name, id);
        self.ids.insert(production.clone(), id);
        self.productions.push(Some(production));
        self.rebuild();
        id
    }

    /// Remove a production and rebuild the closures.
    pub(crate) fn undefine(&mut self, id: ProductionId) -> Result<Production, GrammarError> {
        let production = self
            .productions
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or(GrammarError::UnknownProduction(id))?;
        for key in production.beginnings().filter_map(Parseme::key) {
            self.by_beginning.remove(&key, &id);
        }
        self.by_result.remove(&production.result.name, &id);
        self.ids.remove(&production);
        self.rebuild();
        Ok(production)
    }

    fn rebuild(&mut self) {
        let mut wanted: FxHashSet<Nonterminal> = FxHashSet::default();
        for (_, production) in self.iter() {
            for slot in &production.slots {
                wanted.extend(slot.needs());
            }
        }
        let mut closures = FxHashMap::default();
        let mut ancestors = MultiMap::new();
        for nonterminal in wanted {
            let mut closure = FxHashSet::default();
            self.close_over([nonterminal], &mut closure);
            for &id in &closure {
                ancestors.insert(id, nonterminal);
            }
            closures.insert(nonterminal, closure);
        }

        let mut sentence_beginnings = FxHashSet::default();
        for (id, production) in self.iter() {
            if production.ends_sentences() {
                sentence_beginnings.insert(id);
                sentence_beginnings.extend(self.left_corner_descendants(production));
            }
        }

        debug!(
            productions = self.len(),
            closures = closures.len(),
            sentence_beginnings = sentence_beginnings.len(),
            "rebuilt grammar indices"
        );
        self.closures = closures;
        self.ancestors = ancestors;
        self.sentence_beginnings = sentence_beginnings;
    }
}

#[cfg(test)]
mod tests;

//! The chart: parser facts evaluated over the session's buffers.
//!
//! A potential match of production `p` with `k` slots filled exists over the
//! tokens `b..=e` when its first `k` slots can be filled by those tokens and
//! the matches inside them. Potentials are opened at sentence boundaries and
//! wherever an unfinished potential is waiting for a nonterminal, then
//! extended token by token and match by match. Every derivation below has a
//! fixed set of antecedents, and [`Chart::immediate_consequences`] lists each
//! derivation once from the point of view of each antecedent:
//!
//! | derivation | antecedents |
//! |---|---|
//! | open at a boundary on a token | `p`, `q -> s`, `s` available, `q` a comma or `+eos(q)` |
//! | open at a boundary on a match | `p`, `q -> Q.b`, `Q`, `q` a comma or `+eos(q)` |
//! | open under `m` on a token | `p`, `m`, `m.e -> s`, `s` available, boundary at `m.e` if `p` ends sentences and `m` does not |
//! | open under `m` on a match | `p`, `m`, `m.e -> Q.b`, `Q`, boundary at `m.e` if `p` ends sentences and `m` does not |
//! | extend `m` by a token | `m`, `m.e -> s`, `s` available, `-eos(m.e)` unless a passage |
//! | extend `m` by a match | `m`, `m.e -> Q.b`, `Q`, `-eos(m.e)` unless a passage |
//! | skip an optional slot | `m` |
//! | complete a wording | `m` |
//! | complete a sentence | `m`, and `+eos(m.e)` or `m.e -> n` with `n` the end or a comma |
//!
//! A boundary at `q` is `+eos(q)`, or nothing at all when `q` is a comma.
//! Sentences and passages may begin anywhere inside a larger sentence or
//! passage, but under a subsentence or wording they wait for a boundary.

use quill_deduce::{Context, FactKind};
use quill_ir::{Acquired, Vocabulary, Word};
use quill_sequence::Leaf;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::buffer::{Buffer, SiteRecord};
use crate::fact::{Fact, FactClass, MatchKey};
use crate::grammar::{Grammar, Nonterminal, ParsemeKey, Production, ProductionId};
use crate::site::{BufferId, Site, SiteInfo};

type Openers = SmallVec<[ProductionId; 8]>;
type Keys = SmallVec<[MatchKey; 8]>;

/// Which productions may open under an unfinished match, by whether they
/// need a sentence boundary in front of them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Openings {
    /// No boundary: sentences and passages stay shut.
    Unbounded,
    /// A boundary holds, or the match is a sentence itself.
    All,
    /// Only what the boundary itself allows: sentences and passages.
    Bounded,
}

impl Openings {
    fn under(parent: &Production, boundary: bool) -> Self {
        if boundary || parent.ends_sentences() {
            Openings::All
        } else {
            Openings::Unbounded
        }
    }

    fn admit(self, production: &Production) -> bool {
        match self {
            Openings::Unbounded => !production.ends_sentences(),
            Openings::All => true,
            Openings::Bounded => production.ends_sentences(),
        }
    }
}

/// Grammar, buffers and the truth of every parser fact.
#[derive(Debug, Default)]
pub(crate) struct Chart {
    pub(crate) grammar: Grammar,
    pub(crate) active: FxHashSet<ProductionId>,
    pub(crate) buffers: FxHashMap<BufferId, Buffer>,
    pub(crate) vocabulary: Vocabulary,
}

impl Chart {
    // === Reads ===

    fn record(&self, buffer: BufferId, site: Site) -> Option<&SiteRecord> {
        self.buffers.get(&buffer)?.records.get(&site)
    }

    fn info(&self, buffer: BufferId, site: Site) -> SiteInfo {
        self.record(buffer, site)
            .map_or(SiteInfo::SENTINEL, |record| record.info)
    }

    fn is_available(&self, buffer: BufferId, site: Leaf) -> bool {
        self.record(buffer, Site::Token(site)).is_some_and(|record| {
            record
                .facts
                .holds_negation(&Fact::TokenAvailable { buffer, site })
        })
    }

    fn ends_sentence(&self, buffer: BufferId, site: Site, positive: bool) -> bool {
        self.record(buffer, site).is_some_and(|record| {
            record.facts.has(&Fact::EndOfSentence {
                buffer,
                site,
                positive,
            })
        })
    }

    /// Whether a sentence may begin right after `site`.
    fn opens_sentence_after(&self, buffer: BufferId, site: Site) -> bool {
        self.info(buffer, site).is_comma() || self.ends_sentence(buffer, site, true)
    }

    /// Whether a match of `production` ending at `site` may take in more.
    fn may_extend_past(&self, production: &Production, buffer: BufferId, site: Site) -> bool {
        production.is_passage() || self.ends_sentence(buffer, site, false)
    }

    fn adjacent(&self, buffer: BufferId, site: Site, forward: bool) -> SmallVec<[Site; 2]> {
        self.record(buffer, site)
            .into_iter()
            .flat_map(|record| record.facts.of_kind(FactClass::Next))
            .filter_map(|fact| match *fact {
                Fact::NextToken { from, to, .. } if forward && from == site => Some(to),
                Fact::NextToken { from, to, .. } if !forward && to == site => Some(from),
                _ => None,
            })
            .collect()
    }

    fn successors(&self, buffer: BufferId, site: Site) -> SmallVec<[Site; 2]> {
        self.adjacent(buffer, site, true)
    }

    fn predecessors(&self, buffer: BufferId, site: Site) -> SmallVec<[Site; 2]> {
        self.adjacent(buffer, site, false)
    }

    pub(crate) fn potentials_ending_at(&self, buffer: BufferId, site: Site) -> Keys {
        self.record(buffer, site)
            .into_iter()
            .flat_map(|record| record.facts.of_kind(FactClass::Potential))
            .filter_map(|fact| match fact {
                Fact::PotentialMatch(key) if key.end_site() == site => Some(*key),
                _ => None,
            })
            .collect()
    }

    fn matches_beginning_at(&self, buffer: BufferId, site: Site) -> Keys {
        self.record(buffer, site)
            .into_iter()
            .flat_map(|record| record.facts.of_kind(FactClass::Match))
            .filter_map(|fact| match fact {
                Fact::Match(key) if key.beginning_site() == site => Some(*key),
                _ => None,
            })
            .collect()
    }

    fn result_of(&self, key: &MatchKey) -> Option<Nonterminal> {
        self.grammar.get(key.production).map(Production::result)
    }

    fn is_complete(&self, key: &MatchKey) -> bool {
        self.grammar
            .get(key.production)
            .is_some_and(|production| key.slots_filled >= production.arity())
    }

    /// Productions with a beginning that accepts the token.
    fn token_openers(&self, info: &SiteInfo) -> Openers {
        let mut openers: Openers = ParsemeKey::of_token(info)
            .iter()
            .flat_map(|key| self.grammar.beginning_with(key))
            .collect();
        openers.sort_unstable();
        openers.dedup();
        openers
    }

    fn match_openers(&self, result: Nonterminal) -> impl Iterator<Item = ProductionId> + '_ {
        self.grammar
            .beginning_with(&ParsemeKey::Nonterminal(result.name))
    }

    // === Derivations ===

    fn open_on_token(
        &self,
        out: &mut Vec<Fact>,
        buffer: BufferId,
        id: ProductionId,
        site: Leaf,
        info: &SiteInfo,
    ) {
        let Some(production) = self.grammar.get(id) else {
            return;
        };
        for index in production.opening_slots_for_token(info) {
            if production.can_reach_slot_count_at(index + 1, info, info) {
                out.push(Fact::PotentialMatch(MatchKey {
                    buffer,
                    production: id,
                    slots_filled: index + 1,
                    beginning: site,
                    inclusive_end: site,
                }));
            }
        }
    }

    fn open_on_match(&self, out: &mut Vec<Fact>, id: ProductionId, inner: &MatchKey) {
        let (Some(production), Some(result)) = (self.grammar.get(id), self.result_of(inner)) else {
            return;
        };
        let beginning = self.info(inner.buffer, inner.beginning_site());
        let end = self.info(inner.buffer, inner.end_site());
        for index in production.opening_slots_for_match(result) {
            if production.can_reach_slot_count_at(index + 1, &beginning, &end) {
                out.push(Fact::PotentialMatch(MatchKey {
                    production: id,
                    slots_filled: index + 1,
                    ..*inner
                }));
            }
        }
    }

    fn extend_with_token(
        &self,
        out: &mut Vec<Fact>,
        partial: &MatchKey,
        production: &Production,
        site: Leaf,
        info: &SiteInfo,
    ) {
        let accepts = production
            .slot(partial.slots_filled)
            .is_some_and(|slot| slot.accepts_token(info));
        let beginning = self.info(partial.buffer, partial.beginning_site());
        if accepts && production.can_reach_slot_count_at(partial.slots_filled + 1, &beginning, info)
        {
            out.push(Fact::PotentialMatch(MatchKey {
                slots_filled: partial.slots_filled + 1,
                inclusive_end: site,
                ..*partial
            }));
        }
    }

    fn extend_with_match(
        &self,
        out: &mut Vec<Fact>,
        partial: &MatchKey,
        production: &Production,
        inner: &MatchKey,
    ) {
        let Some(result) = self.result_of(inner) else {
            return;
        };
        let accepts = production
            .slot(partial.slots_filled)
            .is_some_and(|slot| slot.accepts_match(result));
        if !accepts {
            return;
        }
        let beginning = self.info(partial.buffer, partial.beginning_site());
        let end = self.info(inner.buffer, inner.end_site());
        if production.can_reach_slot_count_at(partial.slots_filled + 1, &beginning, &end) {
            out.push(Fact::PotentialMatch(MatchKey {
                slots_filled: partial.slots_filled + 1,
                inclusive_end: inner.inclusive_end,
                ..*partial
            }));
        }
    }

    fn skip_optional(&self, out: &mut Vec<Fact>, partial: &MatchKey, production: &Production) {
        let optional = production
            .slot(partial.slots_filled)
            .is_some_and(|slot| slot.accepts_epsilon());
        if !optional {
            return;
        }
        let beginning = self.info(partial.buffer, partial.beginning_site());
        let end = self.info(partial.buffer, partial.end_site());
        if production.can_reach_slot_count_at(partial.slots_filled + 1, &beginning, &end) {
            out.push(Fact::PotentialMatch(MatchKey {
                slots_filled: partial.slots_filled + 1,
                ..*partial
            }));
        }
    }

    fn open_sentences_on_token(&self, out: &mut Vec<Fact>, buffer: BufferId, site: Leaf) {
        let info = self.info(buffer, Site::Token(site));
        for id in self.token_openers(&info) {
            if self.active.contains(&id) && self.grammar.can_begin_sentence_with(id) {
                self.open_on_token(out, buffer, id, site, &info);
            }
        }
    }

    fn open_sentences_on_match(&self, out: &mut Vec<Fact>, inner: &MatchKey) {
        let Some(result) = self.result_of(inner) else {
            return;
        };
        for id in self.match_openers(result) {
            if self.active.contains(&id) && self.grammar.can_begin_sentence_with(id) {
                self.open_on_match(out, id, inner);
            }
        }
    }

    fn opens_under(
        &self,
        partial: &MatchKey,
        production: &Production,
        id: ProductionId,
        openings: Openings,
    ) -> bool {
        self.active.contains(&id)
            && self.grammar.continues(production, partial.slots_filled, id)
            && self
                .grammar
                .get(id)
                .is_some_and(|opened| openings.admit(opened))
    }

    fn continue_on_token(
        &self,
        out: &mut Vec<Fact>,
        partial: &MatchKey,
        production: &Production,
        site: Leaf,
        info: &SiteInfo,
        openings: Openings,
    ) {
        for id in self.token_openers(info) {
            if self.opens_under(partial, production, id, openings) {
                self.open_on_token(out, partial.buffer, id, site, info);
            }
        }
    }

    fn continue_on_match(
        &self,
        out: &mut Vec<Fact>,
        partial: &MatchKey,
        production: &Production,
        inner: &MatchKey,
        openings: Openings,
    ) {
        let Some(result) = self.result_of(inner) else {
            return;
        };
        for id in self.match_openers(result) {
            if self.opens_under(partial, production, id, openings) {
                self.open_on_match(out, id, inner);
            }
        }
    }

    /// Everything an unfinished `partial` derives with what follows it at `to`.
    fn advance_into(
        &self,
        out: &mut Vec<Fact>,
        partial: &MatchKey,
        production: &Production,
        to: Site,
        extends: bool,
        openings: Openings,
    ) {
        let Site::Token(site) = to else {
            return;
        };
        if self.is_available(partial.buffer, site) {
            let info = self.info(partial.buffer, to);
            if extends {
                self.extend_with_token(out, partial, production, site, &info);
            }
            self.continue_on_token(out, partial, production, site, &info, openings);
        }
        for inner in self.matches_beginning_at(partial.buffer, to) {
            if extends {
                self.extend_with_match(out, partial, production, &inner);
            }
            self.continue_on_match(out, partial, production, &inner, openings);
        }
    }

    fn completes_sentences_at(&self, out: &mut Vec<Fact>, buffer: BufferId, site: Site) {
        for key in self.potentials_ending_at(buffer, site) {
            let ends_sentences = self
                .grammar
                .get(key.production)
                .is_some_and(Production::ends_sentences);
            if ends_sentences && self.is_complete(&key) {
                out.push(Fact::Match(key));
            }
        }
    }

    // === Consequences By Trigger ===

    fn production_consequences(&self, id: ProductionId, out: &mut Vec<Fact>) {
        let Some(production) = self.grammar.get(id) else {
            return;
        };
        let opens_sentences = self.grammar.can_begin_sentence_with(id);
        let mut terminal_keys: SmallVec<[ParsemeKey; 4]> = SmallVec::new();
        let mut names: SmallVec<[Word; 4]> = SmallVec::new();
        for parseme in production.beginnings() {
            match parseme.key() {
                Some(ParsemeKey::Nonterminal(name)) => {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                Some(key) => {
                    if !terminal_keys.contains(&key) {
                        terminal_keys.push(key);
                    }
                }
                None => {}
            }
        }

        for buffer in self.buffers.values() {
            let buffer_id = buffer.id();
            if opens_sentences {
                let mut sites: Vec<Leaf> = terminal_keys
                    .iter()
                    .flat_map(|key| buffer.parseme_beginnings(key))
                    .filter_map(Site::leaf)
                    .collect();
                sites.sort_unstable();
                sites.dedup();
                for site in sites {
                    let info = self.info(buffer_id, Site::Token(site));
                    for before in self.predecessors(buffer_id, Site::Token(site)) {
                        if self.opens_sentence_after(buffer_id, before) {
                            self.open_on_token(out, buffer_id, id, site, &info);
                        }
                    }
                }
                for &name in &names {
                    for site in buffer.parseme_beginnings(&ParsemeKey::Nonterminal(name)) {
                        let predecessors = self.predecessors(buffer_id, site);
                        for inner in self.matches_beginning_at(buffer_id, site) {
                            if self.result_of(&inner).map(|result| result.name) != Some(name) {
                                continue;
                            }
                            for &before in &predecessors {
                                if self.opens_sentence_after(buffer_id, before) {
                                    self.open_on_match(out, id, &inner);
                                }
                            }
                        }
                    }
                }
            }

            let mut predictors: Vec<MatchKey> = self
                .grammar
                .ancestors(id)
                .flat_map(|nonterminal| buffer.partial_matches_needing(&nonterminal).copied())
                .collect();
            predictors.sort_unstable();
            predictors.dedup();
            for partial in predictors {
                let Some(parent) = self.grammar.get(partial.production) else {
                    continue;
                };
                let boundary = self.opens_sentence_after(buffer_id, partial.end_site());
                if !Openings::under(parent, boundary).admit(production) {
                    continue;
                }
                for to in self.successors(buffer_id, partial.end_site()) {
                    let Site::Token(site) = to else {
                        continue;
                    };
                    if self.is_available(buffer_id, site) {
                        let info = self.info(buffer_id, to);
                        self.open_on_token(out, buffer_id, id, site, &info);
                    }
                    for inner in self.matches_beginning_at(buffer_id, to) {
                        self.open_on_match(out, id, &inner);
                    }
                }
            }
        }
    }

    fn available_consequences(&self, buffer: BufferId, site: Leaf, out: &mut Vec<Fact>) {
        let here = Site::Token(site);
        let info = self.info(buffer, here);
        let openers = self.token_openers(&info);
        for before in self.predecessors(buffer, here) {
            let boundary = self.opens_sentence_after(buffer, before);
            if boundary {
                for &id in &openers {
                    if self.active.contains(&id) && self.grammar.can_begin_sentence_with(id) {
                        self.open_on_token(out, buffer, id, site, &info);
                    }
                }
            }
            for partial in self.potentials_ending_at(buffer, before) {
                let Some(production) = self.grammar.get(partial.production) else {
                    continue;
                };
                if partial.slots_filled >= production.arity() {
                    continue;
                }
                if self.may_extend_past(production, buffer, before) {
                    self.extend_with_token(out, &partial, production, site, &info);
                }
                let openings = Openings::under(production, boundary);
                self.continue_on_token(out, &partial, production, site, &info, openings);
            }
        }
    }

    fn adjacency_consequences(&self, buffer: BufferId, from: Site, to: Site, out: &mut Vec<Fact>) {
        if to == Site::End || self.info(buffer, to).is_comma() {
            self.completes_sentences_at(out, buffer, from);
        }
        let Site::Token(site) = to else {
            return;
        };
        let boundary = self.opens_sentence_after(buffer, from);
        if boundary {
            if self.is_available(buffer, site) {
                self.open_sentences_on_token(out, buffer, site);
            }
            for inner in self.matches_beginning_at(buffer, to) {
                self.open_sentences_on_match(out, &inner);
            }
        }
        for partial in self.potentials_ending_at(buffer, from) {
            let Some(production) = self.grammar.get(partial.production) else {
                continue;
            };
            if partial.slots_filled >= production.arity() {
                continue;
            }
            let extends = self.may_extend_past(production, buffer, from);
            let openings = Openings::under(production, boundary);
            self.advance_into(out, &partial, production, to, extends, openings);
        }
    }

    fn sentence_end_consequences(&self, buffer: BufferId, site: Site, out: &mut Vec<Fact>) {
        if !self.info(buffer, site).is_comma() {
            for to in self.successors(buffer, site) {
                let Site::Token(next) = to else {
                    continue;
                };
                if self.is_available(buffer, next) {
                    self.open_sentences_on_token(out, buffer, next);
                }
                for inner in self.matches_beginning_at(buffer, to) {
                    self.open_sentences_on_match(out, &inner);
                }
            }
            for partial in self.potentials_ending_at(buffer, site) {
                let Some(production) = self.grammar.get(partial.production) else {
                    continue;
                };
                if partial.slots_filled >= production.arity() || production.ends_sentences() {
                    continue;
                }
                for to in self.successors(buffer, site) {
                    self.advance_into(out, &partial, production, to, false, Openings::Bounded);
                }
            }
        }
        self.completes_sentences_at(out, buffer, site);
    }

    fn continuation_consequences(&self, buffer: BufferId, site: Site, out: &mut Vec<Fact>) {
        for partial in self.potentials_ending_at(buffer, site) {
            let Some(production) = self.grammar.get(partial.production) else {
                continue;
            };
            if partial.slots_filled >= production.arity() || production.is_passage() {
                continue;
            }
            for to in self.successors(buffer, site) {
                let Site::Token(next) = to else {
                    continue;
                };
                if self.is_available(buffer, next) {
                    let info = self.info(buffer, to);
                    self.extend_with_token(out, &partial, production, next, &info);
                }
                for inner in self.matches_beginning_at(buffer, to) {
                    self.extend_with_match(out, &partial, production, &inner);
                }
            }
        }
    }

    fn potential_consequences(&self, key: &MatchKey, out: &mut Vec<Fact>) {
        let Some(production) = self.grammar.get(key.production) else {
            return;
        };
        let end = key.end_site();
        if key.slots_filled >= production.arity() {
            if !production.ends_sentences() {
                out.push(Fact::Match(*key));
                return;
            }
            if self.ends_sentence(key.buffer, end, true) {
                out.push(Fact::Match(*key));
            }
            for to in self.successors(key.buffer, end) {
                if to == Site::End || self.info(key.buffer, to).is_comma() {
                    out.push(Fact::Match(*key));
                }
            }
            return;
        }
        self.skip_optional(out, key, production);
        let extends = self.may_extend_past(production, key.buffer, end);
        let openings = Openings::under(production, self.opens_sentence_after(key.buffer, end));
        for to in self.successors(key.buffer, end) {
            self.advance_into(out, key, production, to, extends, openings);
        }
    }

    fn match_consequences(&self, key: &MatchKey, out: &mut Vec<Fact>) {
        for before in self.predecessors(key.buffer, key.beginning_site()) {
            let boundary = self.opens_sentence_after(key.buffer, before);
            if boundary {
                self.open_sentences_on_match(out, key);
            }
            for partial in self.potentials_ending_at(key.buffer, before) {
                let Some(production) = self.grammar.get(partial.production) else {
                    continue;
                };
                if partial.slots_filled >= production.arity() {
                    continue;
                }
                if self.may_extend_past(production, key.buffer, before) {
                    self.extend_with_match(out, &partial, production, key);
                }
                let openings = Openings::under(production, boundary);
                self.continue_on_match(out, &partial, production, key, openings);
            }
        }
    }
}

impl Context for Chart {
    type Fact = Fact;

    fn kind(&self, fact: &Fact) -> FactKind {
        match fact {
            Fact::EndOfSentence { .. } => FactKind::Combined,
            Fact::PotentialMatch(_) | Fact::Match(_) => FactKind::Deduction,
            Fact::Production(_) | Fact::TokenAvailable { .. } | Fact::NextToken { .. } => {
                FactKind::Observation
            }
        }
    }

    fn holds(&self, fact: &Fact) -> bool {
        match *fact {
            Fact::Production(id) => self.active.contains(&id),
            Fact::TokenAvailable { buffer, site } => self.is_available(buffer, site),
            Fact::NextToken { buffer, from, .. } => self
                .record(buffer, from)
                .is_some_and(|record| record.facts.has(fact)),
            Fact::EndOfSentence { buffer, site, .. } => self
                .record(buffer, site)
                .is_some_and(|record| record.facts.has(fact)),
            Fact::PotentialMatch(key) => self
                .buffers
                .get(&key.buffer)
                .is_some_and(|buffer| buffer.potentials.contains(&key)),
            Fact::Match(key) => self
                .buffers
                .get(&key.buffer)
                .is_some_and(|buffer| buffer.matches.contains(&key)),
        }
    }

    fn counterpart(&self, fact: &Fact) -> Option<Fact> {
        match *fact {
            Fact::EndOfSentence {
                buffer,
                site,
                positive,
            } => Some(Fact::EndOfSentence {
                buffer,
                site,
                positive: !positive,
            }),
            _ => None,
        }
    }

    fn justification_hook(&mut self, fact: &Fact) -> bool {
        let Chart {
            grammar,
            active,
            buffers,
            ..
        } = self;
        match *fact {
            Fact::Production(id) => active.insert(id),
            Fact::TokenAvailable { buffer, site } => {
                let Some(buffer) = buffers.get_mut(&buffer) else {
                    return false;
                };
                let here = Site::Token(site);
                let Some(record) = buffer.records.get_mut(&here) else {
                    return false;
                };
                if !record.facts.justify_negation(*fact) {
                    return false;
                }
                let info = record.info;
                for key in ParsemeKey::of_token(&info) {
                    buffer.add_parseme_beginning(key, here);
                }
                true
            }
            Fact::NextToken { buffer, from, to } => {
                let Some(buffer) = buffers.get_mut(&buffer) else {
                    return false;
                };
                if buffer
                    .records
                    .get(&from)
                    .map_or(true, |record| record.facts.has(fact))
                {
                    return false;
                }
                for site in [from, to] {
                    if let Some(record) = buffer.records.get_mut(&site) {
                        record.facts.add(*fact);
                    }
                }
                true
            }
            Fact::EndOfSentence {
                buffer,
                site,
                positive,
            } => {
                let Some(buffer) = buffers.get_mut(&buffer) else {
                    return false;
                };
                let Some(record) = buffer.records.get_mut(&site) else {
                    return false;
                };
                if record.facts.has(fact) {
                    return false;
                }
                record.facts.add(*fact);
                if positive {
                    buffer.set_sentence_ending(site, true);
                }
                true
            }
            Fact::PotentialMatch(key) => {
                let Some(buffer) = buffers.get_mut(&key.buffer) else {
                    return false;
                };
                let acquired = buffer.potentials.acquire(key);
                if acquired == Acquired::Shared {
                    return false;
                }
                buffer.annotate(*fact, &key);
                if let Some(slot) = grammar
                    .get(key.production)
                    .and_then(|production| production.slot(key.slots_filled))
                {
                    for nonterminal in slot.needs() {
                        buffer.add_partial_match(nonterminal, key);
                    }
                }
                true
            }
            Fact::Match(key) => {
                let Some(result) = grammar.get(key.production).map(Production::result) else {
                    return false;
                };
                let Some(buffer) = buffers.get_mut(&key.buffer) else {
                    return false;
                };
                let acquired = buffer.matches.acquire(key);
                if acquired == Acquired::Shared {
                    return false;
                }
                buffer.annotate(*fact, &key);
                buffer.add_parseme_beginning(ParsemeKey::Nonterminal(result.name), key.beginning_site());
                true
            }
        }
    }

    fn unjustification_hook(&mut self, fact: &Fact) -> bool {
        let Chart {
            grammar,
            active,
            buffers,
            ..
        } = self;
        match *fact {
            Fact::Production(id) => active.remove(&id),
            Fact::TokenAvailable { buffer, site } => {
                let Some(buffer) = buffers.get_mut(&buffer) else {
                    return false;
                };
                let here = Site::Token(site);
                let Some(record) = buffer.records.get_mut(&here) else {
                    return false;
                };
                if !record.facts.unjustify_negation(*fact) {
                    return false;
                }
                let info = record.info;
                for key in ParsemeKey::of_token(&info) {
                    buffer.remove_parseme_beginning(&key, here);
                }
                true
            }
            Fact::NextToken { buffer, from, to } => {
                let Some(buffer) = buffers.get_mut(&buffer) else {
                    return false;
                };
                if !buffer
                    .records
                    .get(&from)
                    .is_some_and(|record| record.facts.has(fact))
                {
                    return false;
                }
                for site in [from, to] {
                    if let Some(record) = buffer.records.get_mut(&site) {
                        record.facts.remove(fact);
                    }
                }
                true
            }
            Fact::EndOfSentence {
                buffer,
                site,
                positive,
            } => {
                let Some(buffer) = buffers.get_mut(&buffer) else {
                    return false;
                };
                let Some(record) = buffer.records.get_mut(&site) else {
                    return false;
                };
                if !record.facts.remove(fact) {
                    return false;
                }
                if positive {
                    buffer.set_sentence_ending(site, false);
                }
                true
            }
            Fact::PotentialMatch(key) => {
                let Some(buffer) = buffers.get_mut(&key.buffer) else {
                    return false;
                };
                if buffer.potentials.release(&key) != Some(0) {
                    return false;
                }
                buffer.unannotate(fact, &key);
                if let Some(slot) = grammar
                    .get(key.production)
                    .and_then(|production| production.slot(key.slots_filled))
                {
                    for nonterminal in slot.needs() {
                        buffer.remove_partial_match(&nonterminal, &key);
                    }
                }
                true
            }
            Fact::Match(key) => {
                let Some(buffer) = buffers.get_mut(&key.buffer) else {
                    return false;
                };
                if buffer.matches.release(&key) != Some(0) {
                    return false;
                }
                buffer.unannotate(fact, &key);
                let Some(result) = grammar.get(key.production).map(Production::result) else {
                    return true;
                };
                let site = key.beginning_site();
                let still_begins = buffer.records.get(&site).is_some_and(|record| {
                    record.facts.of_kind(FactClass::Match).any(|other| match other {
                        Fact::Match(other) => {
                            other.beginning == key.beginning
                                && grammar
                                    .get(other.production)
                                    .is_some_and(|production| production.result().name == result.name)
                        }
                        _ => false,
                    })
                });
                if !still_begins {
                    buffer.remove_parseme_beginning(&ParsemeKey::Nonterminal(result.name), site);
                }
                true
            }
        }
    }

    fn immediate_consequences(&self, fact: &Fact, out: &mut Vec<Fact>) {
        match *fact {
            Fact::Production(id) => self.production_consequences(id, out),
            Fact::TokenAvailable { buffer, site } => self.available_consequences(buffer, site, out),
            Fact::NextToken { buffer, from, to } => {
                self.adjacency_consequences(buffer, from, to, out);
            }
            Fact::EndOfSentence {
                buffer,
                site,
                positive: true,
            } => self.sentence_end_consequences(buffer, site, out),
            Fact::EndOfSentence {
                buffer,
                site,
                positive: false,
            } => self.continuation_consequences(buffer, site, out),
            Fact::PotentialMatch(key) => self.potential_consequences(&key, out),
            Fact::Match(key) => self.match_consequences(&key, out),
        }
    }
}

//! Buffers: token text plus the chart storage and indices for its sites.

use std::fmt;

use quill_deduce::FactAnnotations;
use quill_ir::{Internalizer, MultiMap, Vocabulary};
use quill_lexer::{RelexOutcome, RelexPlan, TokenSequence};
use quill_sequence::{Cursor, Leaf};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::debug;

use crate::fact::{Fact, FactClass, MatchKey};
use crate::grammar::{Nonterminal, ParsemeKey};
use crate::site::{BufferId, Site, SiteInfo};

/// What the client says a buffer holds. Recorded, not interpreted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BufferKind {
    #[default]
    Undecided,
    Story,
    Extension { includable_file_name: String },
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferKind::Undecided => f.write_str("undecided"),
            BufferKind::Story => f.write_str("story"),
            BufferKind::Extension {
                includable_file_name,
            } => write!(f, "extension {includable_file_name}"),
        }
    }
}

/// Cached info and fact storage of one site.
#[derive(Debug)]
pub(crate) struct SiteRecord {
    pub(crate) info: SiteInfo,
    pub(crate) facts: FactAnnotations<Fact>,
}

impl SiteRecord {
    fn new(info: SiteInfo) -> Self {
        SiteRecord {
            info,
            facts: FactAnnotations::new(),
        }
    }
}

/// What relexing did to a buffer's sites, before any fact has been touched.
#[derive(Debug)]
pub(crate) struct Restatement {
    pub(crate) outcome: RelexOutcome,
    /// Sites whose records must go: replaced tokens, and kept tokens whose
    /// info changed.
    pub(crate) retired: Vec<Site>,
    /// Sites that need a new record.
    pub(crate) fresh: Vec<(Leaf, SiteInfo)>,
    /// Sites that keep their records but may have stale outgoing edges.
    pub(crate) kept: Vec<Site>,
    /// Adjacency across the relexed region after the edit.
    pub(crate) edges: Vec<(Site, Site)>,
}

/// A numbered buffer of the session.
#[derive(Debug)]
pub struct Buffer {
    id: BufferId,
    kind: BufferKind,
    tokens: TokenSequence,
    pub(crate) records: FxHashMap<Site, SiteRecord>,
    pub(crate) potentials: Internalizer<MatchKey>,
    pub(crate) matches: Internalizer<MatchKey>,
    parseme_beginnings: MultiMap<ParsemeKey, Site>,
    sentence_endings: FxHashSet<Site>,
    partial_matches_needing: MultiMap<Nonterminal, MatchKey>,
}

impl Buffer {
    pub(crate) fn new(id: BufferId, kind: BufferKind) -> Self {
        let mut records = FxHashMap::default();
        records.insert(Site::Start, SiteRecord::new(SiteInfo::SENTINEL));
        records.insert(Site::End, SiteRecord::new(SiteInfo::SENTINEL));
        Buffer {
            id,
            kind,
            tokens: TokenSequence::new(),
            records,
            potentials: Internalizer::new(),
            matches: Internalizer::new(),
            parseme_beginnings: MultiMap::new(),
            sentence_endings: FxHashSet::default(),
            partial_matches_needing: MultiMap::new(),
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn kind(&self) -> &BufferKind {
        &self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: BufferKind) {
        self.kind = kind;
    }

    pub fn tokens(&self) -> &TokenSequence {
        &self.tokens
    }

    /// Length in codepoints.
    pub fn len(&self) -> usize {
        self.tokens.total().codepoint_count()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn text(&self, vocabulary: &Vocabulary) -> String {
        self.tokens
            .iter()
            .filter_map(|(_, token)| token.text())
            .map(|word| vocabulary.lookup(word))
            .collect()
    }

    /// Cached info of a significant site or sentinel.
    pub fn info(&self, site: Site) -> Option<&SiteInfo> {
        self.records.get(&site).map(|record| &record.info)
    }

    /// Every fact currently true at a site.
    pub fn facts_at(&self, site: Site) -> SmallVec<[Fact; 8]> {
        self.records
            .get(&site)
            .map(|record| record.facts.justified())
            .unwrap_or_default()
    }

    // === Indices ===

    /// Sites where something matching `key` begins: available tokens for
    /// terminal keys, complete matches for nonterminal keys.
    pub fn parseme_beginnings(&self, key: &ParsemeKey) -> impl Iterator<Item = Site> + '_ {
        self.parseme_beginnings.get(key).copied()
    }

    pub(crate) fn add_parseme_beginning(&mut self, key: ParsemeKey, site: Site) -> bool {
        self.parseme_beginnings.insert(key, site)
    }

    pub(crate) fn remove_parseme_beginning(&mut self, key: &ParsemeKey, site: Site) -> bool {
        self.parseme_beginnings.remove(key, &site)
    }

    /// Sites that currently end a sentence.
    pub fn sentence_endings(&self) -> impl Iterator<Item = Site> + '_ {
        self.sentence_endings.iter().copied()
    }

    pub(crate) fn set_sentence_ending(&mut self, site: Site, ends: bool) {
        if ends {
            self.sentence_endings.insert(site);
        } else {
            self.sentence_endings.remove(&site);
        }
    }

    /// Unfinished potential matches whose next slot asks for `nonterminal`.
    pub fn partial_matches_needing(
        &self,
        nonterminal: &Nonterminal,
    ) -> impl Iterator<Item = &MatchKey> + '_ {
        self.partial_matches_needing.get(nonterminal)
    }

    pub(crate) fn add_partial_match(&mut self, nonterminal: Nonterminal, key: MatchKey) {
        self.partial_matches_needing.insert(nonterminal, key);
    }

    pub(crate) fn remove_partial_match(&mut self, nonterminal: &Nonterminal, key: &MatchKey) {
        self.partial_matches_needing.remove(nonterminal, key);
    }

    pub fn complete_matches(&self) -> impl Iterator<Item = &MatchKey> + '_ {
        self.matches.iter().map(|(key, _)| key)
    }

    pub fn potential_matches(&self) -> impl Iterator<Item = &MatchKey> + '_ {
        self.potentials.iter().map(|(key, _)| key)
    }

    /// Number of live derivations of a complete match.
    pub fn match_support(&self, key: &MatchKey) -> u32 {
        self.matches.count(key)
    }

    /// Codepoint range `lo..hi` covered by a match.
    pub fn span(&self, key: &MatchKey) -> Option<(usize, usize)> {
        let first = self.tokens.cursor(key.beginning)?;
        let last = self.tokens.cursor(key.inclusive_end)?;
        let lo = self.tokens.prefix_sum(first).codepoint_count();
        let hi = self.tokens.prefix_sum(last).codepoint_count()
            + self.tokens.get(last)?.codepoint_count();
        Some((lo, hi))
    }

    // === Match Storage ===

    /// Annotate a match fact on both of its ends.
    pub(crate) fn annotate(&mut self, fact: Fact, key: &MatchKey) {
        for site in Self::ends(key) {
            if let Some(record) = self.records.get_mut(&site) {
                record.facts.add(fact);
            }
        }
    }

    pub(crate) fn unannotate(&mut self, fact: &Fact, key: &MatchKey) {
        for site in Self::ends(key) {
            if let Some(record) = self.records.get_mut(&site) {
                record.facts.remove(fact);
            }
        }
    }

    fn ends(key: &MatchKey) -> SmallVec<[Site; 2]> {
        let mut ends = SmallVec::new();
        ends.push(key.beginning_site());
        if key.inclusive_end != key.beginning {
            ends.push(key.end_site());
        }
        ends
    }

    // === Edits ===

    fn previous_significant(&self, cursor: Cursor) -> Site {
        let mut cursor = cursor;
        while cursor != self.tokens.begin() {
            cursor = self.tokens.prev(cursor);
            if let Some(leaf) = cursor.leaf() {
                if self.records.contains_key(&Site::Token(leaf)) {
                    return Site::Token(leaf);
                }
            }
        }
        Site::Start
    }

    fn next_significant(&self, cursor: Cursor) -> Site {
        let mut cursor = cursor;
        while let Some(leaf) = cursor.leaf() {
            if self.records.contains_key(&Site::Token(leaf)) {
                return Site::Token(leaf);
            }
            cursor = self.tokens.next(cursor);
        }
        Site::End
    }

    /// Apply a relex plan to the tokens and work out which sites change.
    ///
    /// Records are left alone: the caller retracts the facts of retired sites
    /// first, then calls [`retire`](Self::retire) and [`open`](Self::open).
    pub(crate) fn restate(&mut self, plan: RelexPlan, vocabulary: &mut Vocabulary) -> Restatement {
        let replaced = plan.replaced_leaves(&self.tokens);
        let outcome = plan.apply(&mut self.tokens, vocabulary);
        let restated = outcome.restated(&self.tokens);

        let mut retired: Vec<Site> = replaced
            .iter()
            .map(|&leaf| Site::Token(leaf))
            .filter(|site| self.records.contains_key(site))
            .collect();
        let mut fresh = Vec::new();
        let previous = self.previous_significant(outcome.start);
        let mut kept = vec![previous];
        let mut chain = vec![previous];

        let region = outcome
            .inserted
            .iter()
            .map(|&leaf| (leaf, true))
            .chain(restated.iter().map(|&leaf| (leaf, false)));
        let mut before = outcome.pre_state;
        for (leaf, inserted) in region {
            let Some(token) = self.tokens.get_leaf(leaf) else {
                continue;
            };
            let info = SiteInfo::of_token(token, before, vocabulary);
            before = token.state_after(before);
            let site = Site::Token(leaf);
            let old = if inserted {
                None
            } else {
                self.records.get(&site).map(|record| record.info)
            };
            match (old, info) {
                (Some(old), Some(new)) if old == new => kept.push(site),
                (old, new) => {
                    if old.is_some() {
                        retired.push(site);
                    }
                    if let Some(new) = new {
                        fresh.push((leaf, new));
                    }
                }
            }
            if info.is_some() {
                chain.push(site);
            }
        }

        let after = restated
            .last()
            .and_then(|&leaf| self.tokens.cursor(leaf))
            .map_or(outcome.end, |cursor| self.tokens.next(cursor));
        chain.push(self.next_significant(after));
        let edges = chain.windows(2).map(|pair| (pair[0], pair[1])).collect();

        debug!(
            buffer = %self.id,
            replaced = replaced.len(),
            inserted = outcome.inserted.len(),
            restated = restated.len(),
            retired = retired.len(),
            fresh = fresh.len(),
            "restated sites"
        );
        Restatement {
            outcome,
            retired,
            fresh,
            kept,
            edges,
        }
    }

    /// Adjacency edges currently leaving `site`.
    pub(crate) fn edges_from(&self, site: Site) -> SmallVec<[(Site, Site); 2]> {
        self.records
            .get(&site)
            .into_iter()
            .flat_map(|record| record.facts.of_kind(FactClass::Next))
            .filter_map(|fact| match *fact {
                Fact::NextToken { from, to, .. } if from == site => Some((from, to)),
                _ => None,
            })
            .collect()
    }

    /// Drop the records of sites whose facts have all been retracted.
    pub(crate) fn retire(&mut self, sites: &[Site]) {
        for site in sites {
            let record = self.records.remove(site);
            debug_assert!(
                record.map_or(true, |record| record.facts.justified().is_empty()),
                "retired {site:?} with facts still true"
            );
        }
    }

    /// Create records for new sites, with their tokens withheld.
    pub(crate) fn open(&mut self, fresh: &[(Leaf, SiteInfo)]) {
        for &(leaf, info) in fresh {
            let mut record = SiteRecord::new(info);
            record
                .facts
                .surreptitiously_make_false(Fact::TokenAvailable {
                    buffer: self.id,
                    site: leaf,
                });
            self.records.insert(Site::Token(leaf), record);
        }
    }
}

//! The session: one grammar, many buffers, and the engine that keeps their
//! charts current.

use quill_deduce::{DerivationStats, Engine};
use quill_ir::{Vocabulary, Word};
use quill_lexer::highlight::highlight_all;
use quill_lexer::{
    rehighlight, relexer, Edit, EditOutOfRange, HighlightEvent, HighlightRun, HighlightSupport,
};
use quill_lexer_core::codepoints::i7_normalize;
use thiserror::Error;
use tracing::debug;

use crate::buffer::{Buffer, BufferKind, Restatement};
use crate::chart::Chart;
use crate::fact::{Fact, MatchKey};
use crate::grammar::{Grammar, GrammarError, Nonterminal, ParsemeKey, Production, ProductionId};
use crate::site::{BufferId, Site};

/// Session-wide settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Highlight codes the client can display.
    pub support: HighlightSupport,
    /// Whether the engine counts its work.
    pub stats: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            support: HighlightSupport::all(),
            stats: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown buffer {0}")]
    UnknownBuffer(BufferId),
    #[error("buffer {0} already exists")]
    DuplicateBuffer(BufferId),
    #[error(transparent)]
    EditOutOfRange(#[from] EditOutOfRange),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// A complete match located in its buffer's text.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchSpan {
    /// First codepoint.
    pub lo: usize,
    /// One past the last codepoint.
    pub hi: usize,
    pub production: ProductionId,
    pub result: Nonterminal,
}

/// Owns every piece of mutable parser state.
#[derive(Debug)]
pub struct Session {
    chart: Chart,
    engine: Engine<Fact>,
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let mut engine = Engine::new();
        engine.collect_stats(config.stats);
        Session {
            chart: Chart::default(),
            engine,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.chart.vocabulary
    }

    pub fn intern(&mut self, text: &str) -> Word {
        self.chart.vocabulary.intern(text)
    }

    pub fn nonterminal(&mut self, name: &str, tier: u32) -> Nonterminal {
        Nonterminal::new(self.intern(name), tier)
    }

    // === Grammar ===

    pub fn grammar(&self) -> &Grammar {
        &self.chart.grammar
    }

    /// Validate and define a production, re-deriving whatever its new
    /// beginnings can reach.
    #[tracing::instrument(level = "debug", skip_all, fields(variant = %production.variant()))]
    pub fn add_production(&mut self, production: Production) -> Result<ProductionId, GrammarError> {
        let Session { chart, engine, .. } = self;
        chart.grammar.validate(&production, &chart.vocabulary)?;
        let relying = chart.grammar.left_corner_descendants(&production);
        for &id in &relying {
            engine.unjustify(chart, Fact::Production(id));
        }
        let id = chart.grammar.define(production);
        engine.justify(chart, Fact::Production(id));
        for &other in &relying {
            engine.justify(chart, Fact::Production(other));
        }
        debug!(%id, relying = relying.len(), "added production");
        Ok(id)
    }

    /// Retract a production and everything derived from it.
    #[tracing::instrument(level = "debug", skip_all, fields(%id))]
    pub fn remove_production(&mut self, id: ProductionId) -> Result<Production, GrammarError> {
        let Session { chart, engine, .. } = self;
        let relying = chart.grammar.productions_relying_on(id)?;
        for &other in &relying {
            engine.unjustify(chart, Fact::Production(other));
        }
        let removed = chart.grammar.undefine(id)?;
        for &other in relying.iter().filter(|&&other| other != id) {
            engine.justify(chart, Fact::Production(other));
        }
        debug!(relying = relying.len(), "removed production");
        Ok(removed)
    }

    fn active(&self, ids: impl Iterator<Item = ProductionId>) -> Vec<ProductionId> {
        let mut ids: Vec<ProductionId> = ids.filter(|id| self.chart.active.contains(id)).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn productions_beginning_with(&self, key: &ParsemeKey) -> Vec<ProductionId> {
        self.active(self.chart.grammar.beginning_with(key))
    }

    pub fn productions_resulting_in(&self, name: Word) -> Vec<ProductionId> {
        self.active(self.chart.grammar.resulting_in(name))
    }

    pub fn sentence_beginnings(&self) -> Vec<ProductionId> {
        self.active(self.chart.grammar.sentence_beginnings())
    }

    pub fn can_begin_sentence_with(&self, id: ProductionId) -> bool {
        self.chart.active.contains(&id) && self.chart.grammar.can_begin_sentence_with(id)
    }

    /// Productions that could begin the match `key` is waiting for.
    pub fn continuing_beginnings(&self, key: &MatchKey) -> Vec<ProductionId> {
        let Some(production) = self.chart.grammar.get(key.production) else {
            return Vec::new();
        };
        let found = self
            .chart
            .grammar
            .continuing_beginnings(production, key.slots_filled);
        self.active(found.into_iter())
    }

    /// Productions that could begin right after `site`, continuing some
    /// unfinished potential match that ends there.
    pub fn continuing_beginnings_at(
        &self,
        buffer: BufferId,
        site: Site,
    ) -> Result<Vec<ProductionId>, SessionError> {
        self.buffer(buffer)?;
        let found: Vec<ProductionId> = self
            .chart
            .potentials_ending_at(buffer, site)
            .iter()
            .flat_map(|key| self.continuing_beginnings(key))
            .collect();
        Ok(self.active(found.into_iter()))
    }

    pub fn productions_relying_on(
        &self,
        crux: ProductionId,
    ) -> Result<Vec<ProductionId>, GrammarError> {
        self.chart.grammar.productions_relying_on(crux)
    }

    // === Buffers ===

    pub fn buffer(&self, id: BufferId) -> Result<&Buffer, SessionError> {
        self.chart
            .buffers
            .get(&id)
            .ok_or(SessionError::UnknownBuffer(id))
    }

    /// Buffer ids in increasing order.
    pub fn buffer_ids(&self) -> Vec<BufferId> {
        let mut ids: Vec<BufferId> = self.chart.buffers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Start an empty buffer.
    pub fn introduce_buffer(&mut self, id: BufferId, kind: BufferKind) -> Result<(), SessionError> {
        if self.chart.buffers.contains_key(&id) {
            return Err(SessionError::DuplicateBuffer(id));
        }
        let Session { chart, engine, .. } = self;
        chart.buffers.insert(id, Buffer::new(id, kind));
        for site in [Site::Start, Site::End] {
            engine.justify(
                chart,
                Fact::EndOfSentence {
                    buffer: id,
                    site,
                    positive: true,
                },
            );
        }
        engine.justify(
            chart,
            Fact::NextToken {
                buffer: id,
                from: Site::Start,
                to: Site::End,
            },
        );
        debug!(buffer = %id, "introduced buffer");
        Ok(())
    }

    /// Drop a buffer and its whole chart. Nothing outside the buffer can
    /// have been derived from it.
    pub fn discard_buffer(&mut self, id: BufferId) -> Result<Buffer, SessionError> {
        let buffer = self
            .chart
            .buffers
            .remove(&id)
            .ok_or(SessionError::UnknownBuffer(id))?;
        debug!(buffer = %id, "discarded buffer");
        Ok(buffer)
    }

    pub fn set_buffer_kind(&mut self, id: BufferId, kind: BufferKind) -> Result<(), SessionError> {
        self.chart
            .buffers
            .get_mut(&id)
            .ok_or(SessionError::UnknownBuffer(id))?
            .set_kind(kind);
        Ok(())
    }

    pub fn text(&self, id: BufferId) -> Result<String, SessionError> {
        Ok(self.buffer(id)?.text(&self.chart.vocabulary))
    }

    /// Replace codepoints `lo..hi` of a buffer with `text` and bring the
    /// chart up to date. Returns the highlight changes.
    #[tracing::instrument(level = "debug", skip_all, fields(buffer = %id, lo, hi))]
    pub fn edit(
        &mut self,
        id: BufferId,
        lo: usize,
        hi: usize,
        text: &str,
    ) -> Result<Vec<HighlightEvent>, SessionError> {
        let normalized: String = text.chars().map(i7_normalize).collect();
        let Session {
            chart,
            engine,
            config,
        } = self;
        let buffer = chart
            .buffers
            .get(&id)
            .ok_or(SessionError::UnknownBuffer(id))?;
        let edit = Edit {
            lo,
            hi,
            text: &normalized,
        };
        let Some(plan) = relexer::plan(buffer.tokens(), &chart.vocabulary, edit)? else {
            return Ok(Vec::new());
        };

        let Some(buffer) = chart.buffers.get_mut(&id) else {
            return Err(SessionError::UnknownBuffer(id));
        };
        let Restatement {
            outcome,
            retired,
            fresh,
            kept,
            edges,
        } = buffer.restate(plan, &mut chart.vocabulary);

        let doomed: Vec<Fact> = retired
            .iter()
            .flat_map(|&site| buffer.facts_at(site))
            .collect();
        let stale: Vec<Fact> = kept
            .iter()
            .flat_map(|&site| buffer.edges_from(site))
            .filter(|edge| !edges.contains(edge))
            .map(|(from, to)| Fact::NextToken {
                buffer: id,
                from,
                to,
            })
            .collect();
        engine.force_false(chart, doomed);
        engine.force_false(chart, stale);

        if let Some(buffer) = chart.buffers.get_mut(&id) {
            buffer.retire(&retired);
            buffer.open(&fresh);
        }
        for &(leaf, info) in &fresh {
            let site = Site::Token(leaf);
            engine.justify(
                chart,
                Fact::EndOfSentence {
                    buffer: id,
                    site,
                    positive: info.is_sentence_end(),
                },
            );
            engine.justify(chart, Fact::TokenAvailable { buffer: id, site: leaf });
        }
        for &(from, to) in &edges {
            engine.justify(chart, Fact::NextToken { buffer: id, from, to });
        }

        let buffer = chart
            .buffers
            .get(&id)
            .ok_or(SessionError::UnknownBuffer(id))?;
        let events = rehighlight(buffer.tokens(), &outcome, config.support);
        debug!(
            retired = retired.len(),
            fresh = fresh.len(),
            edges = edges.len(),
            events = events.len(),
            "edited buffer"
        );
        Ok(events)
    }

    /// Highlight runs for a whole buffer.
    pub fn highlights(&self, id: BufferId) -> Result<Vec<HighlightRun>, SessionError> {
        Ok(highlight_all(self.buffer(id)?.tokens(), self.config.support))
    }

    /// Complete matches of a buffer, ordered by position.
    pub fn complete_matches(&self, id: BufferId) -> Result<Vec<MatchSpan>, SessionError> {
        let buffer = self.buffer(id)?;
        let mut spans: Vec<MatchSpan> = buffer
            .complete_matches()
            .filter_map(|key| {
                let (lo, hi) = buffer.span(key)?;
                let result = self.chart.grammar.get(key.production)?.result();
                Some(MatchSpan {
                    lo,
                    hi,
                    production: key.production,
                    result,
                })
            })
            .collect();
        spans.sort_unstable();
        Ok(spans)
    }

    // === Statistics ===

    pub fn stats(&self) -> DerivationStats {
        self.engine.stats()
    }

    pub fn take_stats(&mut self) -> DerivationStats {
        self.engine.take_stats()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

//! The propagation engine.
//!
//! The engine owns no facts. A [`Context`] stores truth and knows how facts
//! relate; the engine only sequences hook calls and consequence enumeration so
//! that every derivation is counted once when it becomes valid and uncounted
//! once when it stops being valid.

use std::fmt;

use tracing::trace;

/// How a fact's truth is determined.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FactKind {
    /// Truth is set directly by callers.
    Observation,
    /// Truth is the existence of a derivation from true antecedents.
    Deduction,
    /// One sense of an observation with a positive and a negative sense, of
    /// which at most one is justified at a time.
    Combined,
}

/// Which way a propagation step moves a fact.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Justify,
    Unjustify,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Justify => f.write_str("justify"),
            Direction::Unjustify => f.write_str("unjustify"),
        }
    }
}

/// The setting in which facts are evaluated.
///
/// Implementations store fact truth and describe the derivation graph. The
/// contract the engine relies on:
///
/// - [`justification_hook`](Context::justification_hook) records one new
///   argument for a fact and reports whether the fact went from false to true.
///   For observations this is idempotent; for deductions it counts.
/// - [`unjustification_hook`](Context::unjustification_hook) is the mirror
///   image, reporting whether the fact went from true to false.
/// - [`immediate_consequences`](Context::immediate_consequences) lists, once
///   per derivation, every deduction with a derivation that contains `fact`
///   and whose other antecedents currently hold. It must treat `fact` itself
///   as true without looking it up, since it is called after the transition in
///   both directions.
pub trait Context {
    type Fact: Clone + fmt::Debug;

    fn kind(&self, fact: &Self::Fact) -> FactKind;

    /// Whether `fact` is currently true.
    fn holds(&self, fact: &Self::Fact) -> bool;

    /// The opposite sense of a combined fact.
    fn counterpart(&self, _fact: &Self::Fact) -> Option<Self::Fact> {
        None
    }

    fn justification_hook(&mut self, fact: &Self::Fact) -> bool;

    fn unjustification_hook(&mut self, fact: &Self::Fact) -> bool;

    fn immediate_consequences(&self, fact: &Self::Fact, consequences: &mut Vec<Self::Fact>);
}

/// Counters describing how much work propagation has done.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DerivationStats {
    /// Justification steps, including redundant ones.
    pub justified: u64,
    /// Unjustification steps, including redundant ones.
    pub unjustified: u64,
    /// Consequences produced by enumeration.
    pub enumerated: u64,
    /// Steps in which a fact actually changed truth.
    pub transitions: u64,
}

impl DerivationStats {
    /// Total propagation steps.
    pub fn steps(&self) -> u64 {
        self.justified + self.unjustified
    }
}

impl fmt::Display for DerivationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} justified, {} unjustified, {} enumerated, {} transitions",
            self.justified, self.unjustified, self.enumerated, self.transitions
        )
    }
}

/// Sequences justification and unjustification over a [`Context`].
pub struct Engine<F> {
    pending: Vec<(Direction, F)>,
    scratch: Vec<F>,
    stats: DerivationStats,
    collecting: bool,
}

impl<F: Clone + fmt::Debug> Engine<F> {
    pub fn new() -> Self {
        Engine {
            pending: Vec::new(),
            scratch: Vec::new(),
            stats: DerivationStats::default(),
            collecting: true,
        }
    }

    /// Turn statistics collection on or off. Counters keep their values.
    pub fn collect_stats(&mut self, collecting: bool) {
        self.collecting = collecting;
    }

    pub fn stats(&self) -> DerivationStats {
        self.stats
    }

    /// Return the counters and start again from zero.
    pub fn take_stats(&mut self) -> DerivationStats {
        std::mem::take(&mut self.stats)
    }

    /// Signal that an observation has become true.
    ///
    /// Justifying one sense of a combined fact first retracts the other sense
    /// if it holds.
    pub fn justify<C>(&mut self, context: &mut C, fact: F)
    where
        C: Context<Fact = F>,
    {
        let kind = context.kind(&fact);
        debug_assert!(
            kind != FactKind::Deduction,
            "deductions cannot be justified directly: {fact:?}"
        );
        if kind == FactKind::Combined {
            if let Some(counterpart) = context.counterpart(&fact) {
                if context.holds(&counterpart) {
                    self.propagate(context, Direction::Unjustify, counterpart);
                }
            }
        }
        self.propagate(context, Direction::Justify, fact);
    }

    /// Signal that an observation has become false.
    pub fn unjustify<C>(&mut self, context: &mut C, fact: F)
    where
        C: Context<Fact = F>,
    {
        debug_assert!(
            context.kind(&fact) != FactKind::Deduction,
            "deductions cannot be unjustified directly: {fact:?}"
        );
        self.propagate(context, Direction::Unjustify, fact);
    }

    /// Make every observation in `facts` false, letting deductions among them
    /// fall as consequences.
    pub fn force_false<C, I>(&mut self, context: &mut C, facts: I)
    where
        C: Context<Fact = F>,
        I: IntoIterator<Item = F>,
    {
        for fact in facts {
            if context.kind(&fact) != FactKind::Deduction && context.holds(&fact) {
                self.propagate(context, Direction::Unjustify, fact);
            }
        }
    }

    fn propagate<C>(&mut self, context: &mut C, direction: Direction, fact: F)
    where
        C: Context<Fact = F>,
    {
        debug_assert!(self.pending.is_empty());
        self.pending.push((direction, fact));
        while let Some((direction, fact)) = self.pending.pop() {
            self.step(context, direction, &fact);
        }
    }

    /// Apply one hook and, on a transition, queue the consequences.
    fn step<C>(&mut self, context: &mut C, direction: Direction, fact: &F)
    where
        C: Context<Fact = F>,
    {
        let changed = match direction {
            Direction::Justify => context.justification_hook(fact),
            Direction::Unjustify => context.unjustification_hook(fact),
        };
        if self.collecting {
            match direction {
                Direction::Justify => self.stats.justified += 1,
                Direction::Unjustify => self.stats.unjustified += 1,
            }
        }
        if !changed {
            return;
        }
        trace!(%direction, ?fact, "transition");
        context.immediate_consequences(fact, &mut self.scratch);
        if self.collecting {
            self.stats.transitions += 1;
            self.stats.enumerated += self.scratch.len() as u64;
        }
        // Reversed so that consequences are processed in enumeration order.
        self.pending
            .extend(self.scratch.drain(..).rev().map(|consequence| (direction, consequence)));
    }
}

impl<F: Clone + fmt::Debug> Default for Engine<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for Engine<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("pending", &self.pending.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

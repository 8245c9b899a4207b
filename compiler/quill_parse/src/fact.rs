//! The facts of the chart.

use quill_deduce::Annotation;
use quill_sequence::Leaf;

use crate::grammar::ProductionId;
use crate::site::{BufferId, Site};

/// A production matched over part of a buffer, possibly not to the end.
///
/// Matches are keyed structurally: two derivations of the same production
/// over the same tokens with the same number of slots filled are one match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchKey {
    pub buffer: BufferId,
    pub production: ProductionId,
    pub slots_filled: usize,
    pub beginning: Leaf,
    pub inclusive_end: Leaf,
}

impl MatchKey {
    #[inline]
    pub fn beginning_site(&self) -> Site {
        Site::Token(self.beginning)
    }

    #[inline]
    pub fn end_site(&self) -> Site {
        Site::Token(self.inclusive_end)
    }
}

/// A proposition about the grammar or a buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Fact {
    /// The production is part of the grammar. Observation.
    Production(ProductionId),
    /// The token may be parsed. Negative-sense observation: stored as the
    /// absence of a withheld marker.
    TokenAvailable { buffer: BufferId, site: Leaf },
    /// `to` is the next significant site after `from`. Observation.
    NextToken {
        buffer: BufferId,
        from: Site,
        to: Site,
    },
    /// Whether the site ends a sentence. Combined; each sense is stored as
    /// itself.
    EndOfSentence {
        buffer: BufferId,
        site: Site,
        positive: bool,
    },
    /// Deduction.
    PotentialMatch(MatchKey),
    /// Deduction: a potential match with every slot filled that may stand
    /// where it is.
    Match(MatchKey),
}

/// Buckets of per-site fact storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FactClass {
    Production,
    Available,
    Next,
    EndOfSentence,
    Potential,
    Match,
}

impl Annotation for Fact {
    type Kind = FactClass;

    fn kind(&self) -> FactClass {
        match self {
            Fact::Production(_) => FactClass::Production,
            Fact::TokenAvailable { .. } => FactClass::Available,
            Fact::NextToken { .. } => FactClass::Next,
            Fact::EndOfSentence { .. } => FactClass::EndOfSentence,
            Fact::PotentialMatch(_) => FactClass::Potential,
            Fact::Match(_) => FactClass::Match,
        }
    }
}

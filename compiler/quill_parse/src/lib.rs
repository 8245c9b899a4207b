//! Quill Parse - incremental chart parsing over live buffers
//!
//! Parsing is expressed as facts maintained by the deduction engine. A
//! buffer's observations say which significant tokens it has, which follows
//! which, and where sentences end; the grammar's productions are observations
//! too. Potential and complete matches are deductions from them, so an edit
//! retracts the observations of the tokens it touched, asserts new ones, and
//! only the matches depending on those change.
//!
//! # Layers
//!
//! - [`grammar`]: productions, their slots and the indices derived from them
//! - [`Site`] and [`SiteInfo`]: positions the parser sees, with their cached
//!   terminal classes
//! - [`Fact`]: every proposition the chart maintains
//! - [`Buffer`]: tokens plus the per-site fact storage and lookup indices
//! - [`Session`]: owns the grammar, the buffers and the engine, and is the
//!   entry point for edits
//! - [`sample`]: the core grammar used by tools and tests

mod buffer;
mod chart;
mod fact;
pub mod grammar;
pub mod sample;
mod session;
mod site;

pub use buffer::{Buffer, BufferKind};
pub use fact::{Fact, FactClass, MatchKey};
pub use grammar::{
    Grammar, GrammarError, Nonterminal, Parseme, ParsemeKey, Production, ProductionBuilder,
    ProductionId, ProductionVariant, Slot,
};
pub use session::{MatchSpan, Session, SessionConfig, SessionError};
pub use site::{BufferId, Site, SiteInfo, TokenTraits};

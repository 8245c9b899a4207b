//! Quill Deduce - truth maintenance for incremental parsing
//!
//! A fact is a proposition that is either true or false in some [`Context`].
//! Observations are set directly by callers; deductions hold exactly while at
//! least one of their derivations has all of its antecedents true. The
//! [`Engine`] keeps the two in step: each time a fact changes truth it asks the
//! context for the deductions that the change creates or destroys a derivation
//! of, and propagates to them with an explicit work stack.
//!
//! The [`annotation`] module provides the per-position storage that contexts
//! use to record which facts are currently true where.
//!
//! # Propagation Discipline
//!
//! - **Count derivations**: a deduction's truth is its number of live
//!   derivations, so justifying and unjustifying must enumerate exactly the
//!   same derivations.
//! - **Enumerate after the transition**: consequences are computed once the
//!   triggering fact's new truth is visible, treating the trigger as true in
//!   both directions.
//! - **Acyclic**: no fact may support itself, directly or otherwise.

pub mod annotation;
mod engine;

pub use annotation::{Annotation, Annotations, FactAnnotations};
pub use engine::{Context, DerivationStats, Direction, Engine, FactKind};

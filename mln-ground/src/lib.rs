//! Parallel grounding engine for Markov Logic Networks.
//!
//! The public surface is deliberately narrow: build an [`Mln`], wrap it in
//! a [`builder::GroundingBuilder`], and get back a [`mrf::Mrf`]. Everything
//! under `messages`, `coordinator`, `clique_register`, and `atom_register`
//! is the concurrency machinery that gets you there and is not re-exported.

mod atom_register;
mod clique_register;
mod coordinator;
mod messages;

pub mod clause;
pub mod clique;
pub mod constants;
pub mod evidence;
pub mod frontier;
pub mod grounder;
pub mod identity;
pub mod mln;
pub mod mrf;
pub mod predicate_space;
pub mod schema;

pub mod builder;

pub use builder::{GroundingBuilder, GroundingOutcome};
pub use clause::{AtomTemplate, Clause, Literal, Polarity, Term, VarSlot};
pub use constants::ConstantsSet;
pub use evidence::{EvidenceDb, EvidenceDbBuilder, PredicateEvidence, TruthState};
pub use identity::AtomIdentityFunction;
pub use mln::Mln;
pub use mrf::{Constraint, GroundAtom, Mrf};
pub use predicate_space::PredicateSpace;
pub use schema::{AtomSignature, DynamicFunctionFn, DynamicPredicateFn, PredicateKind, Schema};

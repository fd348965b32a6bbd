//! Predicate/function signatures and the schema that ties them to domains.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

/// `(symbol, arity)` — the identity of a predicate or function independent
/// of any particular grounding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtomSignature {
    pub symbol: Arc<str>,
    pub arity: usize,
}

impl AtomSignature {
    pub fn new(symbol: impl Into<Arc<str>>, arity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            arity,
        }
    }
}

impl std::fmt::Display for AtomSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.symbol, self.arity)
    }
}

/// Where a predicate sits in the query/hidden/evidence partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Query,
    Hidden,
    Evidence,
}

/// A dynamic predicate's native truth function: ground argument indices (one
/// per domain, already resolved against that argument's `ConstantsSet`) to a
/// boolean. Expressed as a native closure rather than through a
/// string-returning interpreter, since there is no reason to round-trip
/// through text inside a single Rust process.
pub type DynamicPredicateFn = Arc<dyn Fn(&[u32]) -> bool + Send + Sync>;

/// A dynamic function's native evaluator: ground argument indices to the
/// resulting constant's domain index, or `None` if the result falls outside
/// that domain — the case that forces `IDENTITY_NOT_EXIST`.
pub type DynamicFunctionFn = Arc<dyn Fn(&[u32]) -> Option<u32> + Send + Sync>;

/// The full schema: every predicate's argument-domain names, every
/// function's, and the native evaluators for dynamic predicates/functions.
#[derive(Clone, Default)]
pub struct Schema {
    pub predicate_schema: FxHashMap<AtomSignature, Vec<String>>,
    pub function_schema: FxHashMap<AtomSignature, Vec<String>>,
    /// Predicate names recognized as built-ins (equality, ordering, ...).
    /// A name can be in this set without a matching entry in
    /// `dynamic_predicates` — that combination is exactly what triggers
    /// `UnsupportedDynamic` at grounding time.
    pub dynamic_predicate_names: FxHashSet<AtomSignature>,
    pub dynamic_predicates: FxHashMap<AtomSignature, DynamicPredicateFn>,
    pub dynamic_functions: FxHashMap<AtomSignature, DynamicFunctionFn>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the literal's ordering and pruning should treat this
    /// predicate as built-in, independent of whether an evaluator is
    /// actually registered for it.
    pub fn is_dynamic_predicate(&self, sig: &AtomSignature) -> bool {
        self.dynamic_predicate_names.contains(sig) || self.dynamic_predicates.contains_key(sig)
    }

    pub fn domains_of(&self, sig: &AtomSignature) -> Option<&[String]> {
        self.predicate_schema.get(sig).map(|v| v.as_slice())
    }
}

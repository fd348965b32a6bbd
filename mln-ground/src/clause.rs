//! Weighted clauses, literals, and the term language that appears inside a
//! literal's argument list.

use crate::schema::AtomSignature;

/// Index into `Clause::variables` — not a raw domain index, just "the i-th
/// distinct variable of this clause, in first-occurrence order".
pub type VarSlot = usize;

/// One argument of an atom as written in the clause, before substitution.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// A literal constant symbol, already fixed at authoring time.
    Const(std::sync::Arc<str>),
    /// A clause variable, referenced by its slot in `Clause::variables`.
    Var(VarSlot),
    /// A nested function application, evaluated via `Schema::dynamic_functions`.
    Func(AtomSignature, Vec<Term>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Positive)
    }

    pub fn flip(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomTemplate {
    pub signature: AtomSignature,
    pub args: Vec<Term>,
}

impl AtomTemplate {
    pub fn new(signature: AtomSignature, args: Vec<Term>) -> Self {
        Self { signature, args }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub polarity: Polarity,
    pub atom: AtomTemplate,
}

impl Literal {
    pub fn positive(atom: AtomTemplate) -> Self {
        Self {
            polarity: Polarity::Positive,
            atom,
        }
    }

    pub fn negative(atom: AtomTemplate) -> Self {
        Self {
            polarity: Polarity::Negative,
            atom,
        }
    }

    /// A literal is dynamic when its predicate is a built-in whose truth is
    /// computed from its ground arguments instead of looked up in evidence.
    pub fn is_dynamic(&self, schema: &crate::schema::Schema) -> bool {
        schema.is_dynamic_predicate(&self.atom.signature)
    }

    fn variables_into(term: &Term, out: &mut Vec<VarSlot>) {
        match term {
            Term::Var(slot) => out.push(*slot),
            Term::Const(_) => {}
            Term::Func(_, args) => {
                for a in args {
                    Self::variables_into(a, out);
                }
            }
        }
    }

    pub fn variable_slots(&self) -> Vec<VarSlot> {
        let mut out = Vec::new();
        for term in &self.atom.args {
            Self::variables_into(term, &mut out);
        }
        out
    }
}

/// A weighted clause: a disjunction of literals plus the distinct variables
/// that appear across them, in deterministic first-occurrence order.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub clause_index: usize,
    pub weight: f64,
    pub literals: Vec<Literal>,
    pub variables: Vec<VarSlot>,
}

impl Clause {
    /// Builds a clause, deriving `variables` from the literals'
    /// first-occurrence order. `weight` is not validated here —
    /// `InvalidWeight` is raised by the grounder immediately before
    /// substitution begins.
    pub fn new(clause_index: usize, weight: f64, literals: Vec<Literal>) -> Self {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut variables = Vec::new();
        for lit in &literals {
            for slot in lit.variable_slots() {
                if seen.insert(slot) {
                    variables.push(slot);
                }
            }
        }
        Self {
            clause_index,
            weight,
            literals,
            variables,
        }
    }

    pub fn is_ground(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn is_hard(&self) -> bool {
        self.weight.is_infinite() && self.weight > 0.0
    }
}

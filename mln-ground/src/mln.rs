//! `Mln` — the frozen, read-only theory passed into a `GroundingBuilder`.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::clause::{Clause, Term, VarSlot};
use crate::constants::ConstantsSet;
use crate::evidence::EvidenceDb;
use crate::predicate_space::PredicateSpace;
use crate::schema::Schema;

/// Everything the grounding engine needs and nothing it may mutate.
/// Parsing text into this shape, building `constants`, and running
/// predicate-completion to produce `clauses` are out of scope here —
/// external collaborators hand over an already-built `Mln`.
pub struct Mln {
    pub schema: Schema,
    pub constants: FxHashMap<String, Arc<ConstantsSet>>,
    pub clauses: Vec<Clause>,
    pub space: PredicateSpace,
    pub evidence: EvidenceDb,
}

impl Mln {
    /// The domain backing one of a clause's variables, found by locating
    /// the variable's first occurrence among the clause's literals and
    /// reading off that argument position's declared domain name. Returns
    /// `None` only if the variable never appears directly as a predicate
    /// argument (e.g. it is only ever wrapped inside a function term,
    /// which `function_term_domains` accounts for separately).
    pub fn variable_domain(&self, clause: &Clause, slot: VarSlot) -> Option<&ConstantsSet> {
        for lit in &clause.literals {
            if let Some(name) = find_var_domain_name(&self.schema, &lit.atom.signature, &lit.atom.args, slot) {
                return self.constants.get(&name).map(|arc| arc.as_ref());
            }
        }
        None
    }

    /// Every function term's codomain, across all literals of the clause,
    /// in the order encountered. A clause with no function terms returns
    /// an empty vec, leaving the hard-weight bound's product untouched.
    pub fn function_term_domains(&self, clause: &Clause) -> Vec<&ConstantsSet> {
        let mut out = Vec::new();
        for lit in &clause.literals {
            for term in &lit.atom.args {
                collect_func_domains(&self.schema, term, &self.constants, &mut out);
            }
        }
        out
    }
}

fn find_var_domain_name(
    schema: &Schema,
    sig: &crate::schema::AtomSignature,
    args: &[Term],
    slot: VarSlot,
) -> Option<String> {
    let domains = schema.domains_of(sig)?;
    find_var_domain_in_terms(schema, args, domains, slot)
}

fn find_var_domain_in_terms(schema: &Schema, args: &[Term], domains: &[String], slot: VarSlot) -> Option<String> {
    for (pos, term) in args.iter().enumerate() {
        match term {
            Term::Var(s) if *s == slot => return domains.get(pos).cloned(),
            Term::Var(_) | Term::Const(_) => {}
            Term::Func(sig, inner) => {
                if let Some(inner_domains) = schema.function_schema.get(sig) {
                    if let Some(found) = find_var_domain_in_terms(schema, inner, inner_domains, slot) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// Function schemas declare `arity + 1` domain names: one per argument,
/// then the return/codomain name last. See DESIGN.md for why this
/// convention was chosen over a separate `return_domain` field.
fn collect_func_domains<'a>(
    schema: &Schema,
    term: &Term,
    constants: &'a FxHashMap<String, Arc<ConstantsSet>>,
    out: &mut Vec<&'a ConstantsSet>,
) {
    if let Term::Func(sig, args) = term {
        if let Some(domains) = schema.function_schema.get(sig) {
            if let Some(codomain_name) = domains.last() {
                if let Some(set) = constants.get(codomain_name) {
                    out.push(set.as_ref());
                }
            }
        }
        for a in args {
            collect_func_domains(schema, a, constants, out);
        }
    }
}

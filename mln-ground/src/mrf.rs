//! MRF Builder and the output record types.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use mln_core::errors::GroundingError;
use mln_core::ids::{AtomId, CliqueId};

use crate::clause::Clause;
use crate::clique::{CliqueEntry, SignedAtomId};
use crate::mln::Mln;

/// `groundConstraintID -> (originClauseIndex -> signedFrequency)`.
pub type DependencyMap = FxHashMap<CliqueId, FxHashMap<usize, i32>>;

#[derive(Debug, Clone)]
pub struct Constraint {
    pub id: CliqueId,
    pub weight: f64,
    pub signed_atom_ids: SmallVec<[SignedAtomId; 4]>,
    pub hard_flag: bool,
    pub unit_sat_prob: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct GroundAtom {
    pub id: AtomId,
    pub hard_weight_budget: f64,
}

#[derive(Debug, Clone)]
pub struct Mrf {
    pub constraints: FxHashMap<CliqueId, Constraint>,
    pub atoms: FxHashMap<AtomId, GroundAtom>,
    pub hard_weight: f64,
    pub dependency_map: Option<DependencyMap>,
}

/// MC-SAT's per-constraint satisfaction-probability parameter, fixed at 1.
const MC_SAT_PARAM: f64 = 1.0;

pub struct MrfBuilder;

impl MrfBuilder {
    /// Computes `H = 10 + Σ` over non-hard clauses with at least one
    /// variable of `|weight| · ∏(domain sizes of its variables) ·
    /// ∏(domain sizes of its function terms' codomains)`. This is a bound
    /// on the largest soft-weight sum any single world could accumulate, so
    /// a hard constraint's weight can always dominate it.
    pub fn hard_weight_bound(mln: &Mln) -> f64 {
        let mut total = 0.0f64;
        for clause in &mln.clauses {
            if clause.is_hard() || clause.variables.is_empty() {
                continue;
            }
            let mut space = 1.0f64;
            for &slot in &clause.variables {
                if let Some(domain) = mln.variable_domain(clause, slot) {
                    space *= domain.len() as f64;
                }
            }
            for domain in mln.function_term_domains(clause) {
                space *= domain.len() as f64;
            }
            total += clause.weight.abs() * space;
        }
        10.0 + total
    }

    /// Assembles the final MRF from everything the reachability closure
    /// collected. `cliques` and `atom_incidence` have already had their ids
    /// finalized (contiguous clique ids, fully-drained atom->clique index).
    pub fn build(
        mln: &Mln,
        cliques: FxHashMap<CliqueId, CliqueEntry>,
        atom_incidence: &FxHashMap<AtomId, Vec<CliqueId>>,
        query_atoms: &FxHashSet<AtomId>,
        dependency_map: Option<DependencyMap>,
        no_neg_weights: bool,
    ) -> Result<Mrf, GroundingError> {
        let hard_weight = Self::hard_weight_bound(mln);

        let mut constraints = FxHashMap::default();
        for (id, entry) in cliques {
            if entry.weight == 0.0 {
                continue;
            }
            let (weight, hard_flag, unit_sat_prob) = if entry.weight.is_infinite() && entry.weight > 0.0 {
                (hard_weight, true, 1.0)
            } else {
                (entry.weight, false, 1.0 - (-entry.weight.abs() * MC_SAT_PARAM).exp())
            };
            constraints.insert(
                id,
                Constraint {
                    id,
                    weight,
                    signed_atom_ids: entry.variables,
                    hard_flag,
                    unit_sat_prob,
                },
            );
        }

        let mut atoms = FxHashMap::default();
        for &atom_id in atom_incidence.keys().chain(query_atoms.iter()) {
            atoms.entry(atom_id).or_insert(GroundAtom {
                id: atom_id,
                hard_weight_budget: hard_weight,
            });
        }

        if atoms.is_empty() {
            return Err(GroundingError::EmptyMrf);
        }

        let dependency_map = dependency_map.map(|mut dm| {
            if no_neg_weights {
                rescale_negative_frequencies(&mut dm, mln);
            }
            dm
        });

        Ok(Mrf {
            constraints,
            atoms,
            hard_weight,
            dependency_map,
        })
    }
}

/// With `noNegWeights`, a negative frequency recorded against a
/// multi-literal clause must be divided by that clause's literal count so
/// downstream learning sees the correct mean gradient. Applied exactly
/// once, here at build time, never during emission — doing it during
/// emission would double-scale on a later re-merge.
fn rescale_negative_frequencies(dm: &mut DependencyMap, mln: &Mln) {
    let body_sizes: FxHashMap<usize, usize> =
        mln.clauses.iter().map(|c: &Clause| (c.clause_index, c.literals.len().max(1))).collect();
    for per_clique in dm.values_mut() {
        for (clause_index, freq) in per_clique.iter_mut() {
            if *freq < 0 {
                if let Some(&size) = body_sizes.get(clause_index) {
                    *freq /= size as i32;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{AtomTemplate, Clause, Literal, Term};
    use crate::constants::ConstantsSet;
    use crate::evidence::EvidenceDb;
    use crate::predicate_space::PredicateSpace;
    use crate::identity::AtomIdentityFunction;
    use crate::schema::{AtomSignature, Schema};
    use std::sync::Arc;

    fn trivial_mln() -> Mln {
        let domain = Arc::new(ConstantsSet::new(["a"]));
        let q_id = AtomIdentityFunction::new(AtomSignature::new("Q", 1), vec![domain.clone()], 1);
        let space = PredicateSpace::build(vec![q_id], vec![], vec![]);
        let mut schema = Schema::new();
        schema
            .predicate_schema
            .insert(AtomSignature::new("Q", 1), vec!["D".into()]);
        let mut constants = FxHashMap::default();
        constants.insert("D".to_string(), domain);
        let clause = Clause::new(
            0,
            2.0,
            vec![Literal::positive(AtomTemplate::new(
                AtomSignature::new("Q", 1),
                vec![Term::Var(0)],
            ))],
        );
        Mln {
            schema,
            constants,
            clauses: vec![clause],
            space,
            evidence: EvidenceDb::default(),
        }
    }

    #[test]
    fn empty_mrf_is_rejected() {
        let mln = trivial_mln();
        let result = MrfBuilder::build(
            &mln,
            FxHashMap::default(),
            &FxHashMap::default(),
            &FxHashSet::default(),
            None,
            false,
        );
        assert!(matches!(result, Err(GroundingError::EmptyMrf)));
    }

    #[test]
    fn hard_constraint_uses_bound_as_weight() {
        let mln = trivial_mln();
        let h = MrfBuilder::hard_weight_bound(&mln);
        let mut cliques = FxHashMap::default();
        cliques.insert(
            CliqueId(0),
            CliqueEntry::new(SmallVec::from_vec(vec![1]), f64::INFINITY, 0, 1),
        );
        let mut incidence = FxHashMap::default();
        incidence.insert(AtomId(1), vec![CliqueId(0)]);
        let mrf = MrfBuilder::build(&mln, cliques, &incidence, &FxHashSet::default(), None, false).unwrap();
        let constraint = &mrf.constraints[&CliqueId(0)];
        assert!(constraint.hard_flag);
        assert_eq!(constraint.weight, h);
        assert_eq!(constraint.unit_sat_prob, 1.0);
    }
}

//! Clause Grounder.
//!
//! Enumerates every substitution of a clause's variables, evaluates each
//! literal against evidence (or a dynamic predicate's native evaluator),
//! and emits one `CliqueEntry` per surviving substitution. A substitution
//! is dropped entirely the moment any literal is satisfied by evidence (the
//! disjunction is trivially true) or any atom-id resolution hits the
//! `IDENTITY_NOT_EXIST` sentinel (an out-of-domain function result).

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use mln_core::errors::GroundingError;
use mln_core::ids::{AtomId, IDENTITY_NOT_EXIST};

use crate::clause::{Clause, Literal, Term, VarSlot};
use crate::clique::{signed, CliqueEntry, SignedAtomId};
use crate::constants::ConstantsSet;
use crate::evidence::TruthState;
use crate::frontier::ReachabilityFrontier;
use crate::mln::Mln;
use crate::schema::AtomSignature;

/// Outcome of grounding one clause against one substitution.
enum SubstitutionOutcome {
    /// Some literal was satisfied by evidence or a dynamic predicate; the
    /// whole disjunction holds trivially and nothing is emitted.
    Satisfied,
    /// A literal resolved to `IDENTITY_NOT_EXIST` (a function term fell
    /// outside its codomain, or an argument wasn't in its domain); the
    /// substitution is meaningless and is dropped.
    Dropped,
    /// Every literal was either contradicted by evidence (omitted) or left
    /// `Unknown` (kept); these are the surviving signed atom ids.
    Survived(SmallVec<[SignedAtomId; 4]>),
}

/// One clause's grounding pass: the resulting constraints plus every
/// open-world (query or hidden) predicate signature whose atoms were
/// actually referenced, for the reachability closure to expand from.
pub struct ClauseGroundingResult {
    pub entries: Vec<CliqueEntry>,
    pub open_world_signatures: FxHashSet<AtomSignature>,
}

pub struct ClauseGrounder;

impl ClauseGrounder {
    /// Grounds one clause. `frontier` gates which hidden-predicate atoms
    /// are allowed to keep a substitution alive; query-predicate atoms
    /// always pass regardless of the frontier's contents.
    pub fn ground(
        mln: &Mln,
        clause: &Clause,
        frontier: &ReachabilityFrontier,
        no_neg_weights: bool,
        eliminate_negated_unit: bool,
    ) -> Result<ClauseGroundingResult, GroundingError> {
        if !clause.weight.is_finite() && !clause.is_hard() {
            return Err(GroundingError::InvalidWeight {
                clause_index: clause.clause_index,
                weight: clause.weight,
            });
        }

        let var_position: FxHashMap<VarSlot, usize> =
            clause.variables.iter().enumerate().map(|(i, &slot)| (slot, i)).collect();

        let domains: Vec<&ConstantsSet> = clause
            .variables
            .iter()
            .map(|&slot| {
                mln.variable_domain(clause, slot)
                    .expect("every clause variable must occur directly as a predicate argument")
            })
            .collect();

        let order = ordered_literal_indices(mln, clause);

        let mut entries = Vec::new();
        let mut open_world_signatures = FxHashSet::default();

        for substitution in CartesianIndices::new(&domains) {
            match evaluate_substitution(mln, clause, &order, &var_position, &substitution, &mut open_world_signatures)?
            {
                SubstitutionOutcome::Satisfied | SubstitutionOutcome::Dropped => continue,
                SubstitutionOutcome::Survived(vars) => {
                    if vars.is_empty() {
                        continue;
                    }
                    if !any_reachable(mln, frontier, &vars) {
                        continue;
                    }
                    emit_with_weight_rewrite(clause, vars, no_neg_weights, eliminate_negated_unit, &mut entries);
                }
            }
        }

        Ok(ClauseGroundingResult {
            entries,
            open_world_signatures,
        })
    }
}

/// Orders literals so the cheapest-to-prune ones are evaluated first:
/// non-dynamic literals sorted by ascending `(falseCount + unknownCount) /
/// length` (more evidence-backed True atoms means a quicker satisfied-exit),
/// dynamic literals last, sorted by ascending variable count (fewer free
/// variables resolve to a concrete truth value faster).
fn ordered_literal_indices(mln: &Mln, clause: &Clause) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..clause.literals.len()).collect();
    indices.sort_by(|&a, &b| compare_literals(mln, clause, a, b));
    indices
}

fn compare_literals(mln: &Mln, clause: &Clause, a: usize, b: usize) -> std::cmp::Ordering {
    let la = &clause.literals[a];
    let lb = &clause.literals[b];
    let da = la.is_dynamic(&mln.schema);
    let db = lb.is_dynamic(&mln.schema);
    match (da, db) {
        (false, false) => literal_score(mln, la).partial_cmp(&literal_score(mln, lb)).unwrap_or(std::cmp::Ordering::Equal),
        (true, true) => la.variable_slots().len().cmp(&lb.variable_slots().len()),
        (false, true) => std::cmp::Ordering::Less,
        (true, false) => std::cmp::Ordering::Greater,
    }
}

/// Lower is better: the fraction of this predicate's ground atoms that are
/// not already known True.
fn literal_score(mln: &Mln, literal: &Literal) -> f64 {
    let sig = &literal.atom.signature;
    let length = mln.space.identity_of(sig).map(|f| f.length).unwrap_or(0);
    if length == 0 {
        return 1.0;
    }
    match mln.evidence.table_for(sig) {
        None => 1.0,
        Some(table) => {
            let (_t, f, u) = table.stats(length);
            (f + u) as f64 / length as f64
        }
    }
}

fn evaluate_substitution(
    mln: &Mln,
    clause: &Clause,
    order: &[usize],
    var_position: &FxHashMap<VarSlot, usize>,
    substitution: &[u32],
    open_world_signatures: &mut FxHashSet<AtomSignature>,
) -> Result<SubstitutionOutcome, GroundingError> {
    let mut survivors: SmallVec<[SignedAtomId; 4]> = SmallVec::new();

    for &lit_idx in order {
        let literal = &clause.literals[lit_idx];

        if literal.is_dynamic(&mln.schema) {
            let Some(args) = resolve_atom_args(mln, literal, clause, var_position, substitution) else {
                return Ok(SubstitutionOutcome::Dropped);
            };
            let evaluator = mln
                .schema
                .dynamic_predicates
                .get(&literal.atom.signature)
                .ok_or_else(|| GroundingError::UnsupportedDynamic {
                    signature: literal.atom.signature.to_string(),
                })?;
            let raw = evaluator(&args);
            let truth = if literal.polarity.is_positive() { raw } else { !raw };
            if truth {
                return Ok(SubstitutionOutcome::Satisfied);
            }
            continue;
        }

        let Some(atom_id) = resolve_atom_id(mln, literal, clause, var_position, substitution)? else {
            return Ok(SubstitutionOutcome::Dropped);
        };

        let state = mln.evidence.state(&literal.atom.signature, atom_id);
        let satisfied = matches!(
            (literal.polarity.is_positive(), state),
            (true, TruthState::True) | (false, TruthState::False)
        );
        let contradicted = matches!(
            (literal.polarity.is_positive(), state),
            (true, TruthState::False) | (false, TruthState::True)
        );

        if satisfied {
            return Ok(SubstitutionOutcome::Satisfied);
        }
        if contradicted {
            continue;
        }

        if !mln.space.is_evidence(&literal.atom.signature) {
            open_world_signatures.insert(literal.atom.signature.clone());
        }
        survivors.push(signed(atom_id, literal.polarity.is_positive()));
    }

    Ok(SubstitutionOutcome::Survived(survivors))
}

/// Resolves a non-dynamic literal's arguments to its predicate's atom id,
/// or `None` if the result must be treated as `IDENTITY_NOT_EXIST`.
fn resolve_atom_id(
    mln: &Mln,
    literal: &Literal,
    clause: &Clause,
    var_position: &FxHashMap<VarSlot, usize>,
    substitution: &[u32],
) -> Result<Option<AtomId>, GroundingError> {
    let identity = match mln.space.identity_of(&literal.atom.signature) {
        Some(f) => f,
        None => return Ok(None),
    };
    let domains = mln.schema.domains_of(&literal.atom.signature).unwrap_or(&[]);
    let mut indices = Vec::with_capacity(literal.atom.args.len());
    for (pos, term) in literal.atom.args.iter().enumerate() {
        let Some(domain_name) = domains.get(pos) else {
            return Ok(None);
        };
        let Some(domain) = mln.constants.get(domain_name) else {
            return Ok(None);
        };
        indices.push(resolve_term(term, domain, mln, clause, var_position, substitution));
    }
    let atom_id = identity.encode_indices(&indices)?;
    if atom_id.0 == IDENTITY_NOT_EXIST {
        Ok(None)
    } else {
        Ok(Some(atom_id))
    }
}

/// Resolves a dynamic literal's arguments to raw domain indices, or `None`
/// if any argument fails to resolve.
fn resolve_atom_args(
    mln: &Mln,
    literal: &Literal,
    clause: &Clause,
    var_position: &FxHashMap<VarSlot, usize>,
    substitution: &[u32],
) -> Option<Vec<u32>> {
    let domains = mln.schema.domains_of(&literal.atom.signature)?;
    let mut out = Vec::with_capacity(literal.atom.args.len());
    for (pos, term) in literal.atom.args.iter().enumerate() {
        let domain_name = domains.get(pos)?;
        let domain = mln.constants.get(domain_name)?;
        out.push(resolve_term(term, domain, mln, clause, var_position, substitution)?);
    }
    Some(out)
}

/// Resolves a single term — constant, clause variable, or nested function
/// application — to an index within `expected_domain`.
fn resolve_term(
    term: &Term,
    expected_domain: &ConstantsSet,
    mln: &Mln,
    clause: &Clause,
    var_position: &FxHashMap<VarSlot, usize>,
    substitution: &[u32],
) -> Option<u32> {
    match term {
        Term::Const(symbol) => expected_domain.index(symbol),
        Term::Var(slot) => var_position.get(slot).and_then(|&p| substitution.get(p).copied()),
        Term::Func(sig, args) => {
            let arg_domains = mln.schema.function_schema.get(sig)?;
            let mut resolved = Vec::with_capacity(args.len());
            for (pos, arg) in args.iter().enumerate() {
                let domain_name = arg_domains.get(pos)?;
                let domain = mln.constants.get(domain_name)?;
                resolved.push(resolve_term(arg, domain, mln, clause, var_position, substitution)?);
            }
            let evaluator = mln.schema.dynamic_functions.get(sig)?;
            evaluator(&resolved)
        }
    }
}

fn any_reachable(mln: &Mln, frontier: &ReachabilityFrontier, vars: &[SignedAtomId]) -> bool {
    vars.iter().any(|&sa| {
        let atom_id = AtomId(sa.unsigned_abs() as u32);
        match mln.space.signature_of(atom_id) {
            Ok(sig) if mln.space.is_query(sig) => true,
            Ok(_) => frontier.contains(atom_id),
            Err(_) => false,
        }
    })
}

/// Applies the three weight-rewrite rules and appends the resulting
/// constraint(s) to `out`:
///
/// - `noNegWeights`: a negative-weight clause is rewritten into one unit
///   constraint per surviving literal, each over that literal flipped, with
///   weight `-weight / |vars|` and `freq = -1` — splitting the disjunction's
///   complement evenly across its literals rather than keeping them as one
///   joint constraint, so every emitted weight is uniformly positive.
/// - `eliminateNegatedUnit`: only reached when `noNegWeights` didn't already
///   apply. A negative-weight unit clause whose surviving literal is itself
///   negative collapses to that literal flipped positive, weight made
///   positive, `freq = -1`. A unit clause whose surviving literal is
///   positive does not qualify and falls through to the default rule.
/// - otherwise the clause is emitted unchanged, with `freq = 1`.
fn emit_with_weight_rewrite(
    clause: &Clause,
    vars: SmallVec<[SignedAtomId; 4]>,
    no_neg_weights: bool,
    eliminate_negated_unit: bool,
    out: &mut Vec<CliqueEntry>,
) {
    if clause.weight < 0.0 && no_neg_weights {
        let per_literal_weight = -clause.weight / vars.len() as f64;
        for &v in &vars {
            out.push(CliqueEntry::new(
                SmallVec::from_slice(&[-v]),
                per_literal_weight,
                clause.clause_index,
                -1,
            ));
        }
        return;
    }
    if clause.weight < 0.0 && eliminate_negated_unit && vars.len() == 1 && vars[0] < 0 {
        let flipped: SmallVec<[SignedAtomId; 4]> = vars.iter().map(|&v| -v).collect();
        out.push(CliqueEntry::new(flipped, -clause.weight, clause.clause_index, -1));
        return;
    }
    out.push(CliqueEntry::new(vars, clause.weight, clause.clause_index, 1));
}

/// Lazily walks the Cartesian product of a clause's variable domains, one
/// combination of domain indices per step. Yields nothing at all if any
/// domain is empty, and yields exactly one (empty) combination for a
/// ground clause with zero variables.
struct CartesianIndices<'a> {
    domains: &'a [&'a ConstantsSet],
    cursor: Vec<u32>,
    done: bool,
}

impl<'a> CartesianIndices<'a> {
    fn new(domains: &'a [&'a ConstantsSet]) -> Self {
        let done = domains.iter().any(|d| d.is_empty());
        Self {
            domains,
            cursor: vec![0u32; domains.len()],
            done,
        }
    }
}

impl<'a> Iterator for CartesianIndices<'a> {
    type Item = Vec<u32>;

    fn next(&mut self) -> Option<Vec<u32>> {
        if self.done {
            return None;
        }
        let current = self.cursor.clone();

        if self.domains.is_empty() {
            self.done = true;
        } else {
            let mut slot = self.domains.len() - 1;
            loop {
                self.cursor[slot] += 1;
                if (self.cursor[slot] as usize) < self.domains[slot].len() {
                    break;
                }
                self.cursor[slot] = 0;
                if slot == 0 {
                    self.done = true;
                    break;
                }
                slot -= 1;
            }
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{AtomTemplate, Literal};
    use crate::constants::ConstantsSet;
    use crate::evidence::{EvidenceDbBuilder, EvidenceDb};
    use crate::identity::AtomIdentityFunction;
    use crate::predicate_space::PredicateSpace;
    use crate::schema::Schema;
    use std::sync::Arc;

    fn domain(symbols: &[&str]) -> Arc<ConstantsSet> {
        Arc::new(ConstantsSet::new(symbols.iter().map(|s| s.to_string())))
    }

    /// `Smokes(x) => Cancer(x)`, written as the disjunction `!Smokes(x) v
    /// Cancer(x)`, weight 1.5, over a two-person domain, with `Smokes(a)`
    /// known True by evidence and everything else open.
    fn smokes_cancer_mln() -> (Mln, Clause) {
        let people = domain(&["anna", "bob"]);
        let smokes_id = AtomIdentityFunction::new(AtomSignature::new("Smokes", 1), vec![people.clone()], 1);
        let cancer_id = AtomIdentityFunction::new(AtomSignature::new("Cancer", 1), vec![people.clone()], 1);

        let space = PredicateSpace::build(vec![cancer_id], vec![], vec![smokes_id]);

        let mut schema = Schema::new();
        schema
            .predicate_schema
            .insert(AtomSignature::new("Smokes", 1), vec!["Person".into()]);
        schema
            .predicate_schema
            .insert(AtomSignature::new("Cancer", 1), vec!["Person".into()]);

        let mut constants = FxHashMap::default();
        constants.insert("Person".to_string(), people.clone());

        let smokes_atom_id = space.identity_of(&AtomSignature::new("Smokes", 1)).unwrap();
        let anna_smokes = smokes_atom_id.encode_symbols(&["anna"]).unwrap();

        let mut eb = EvidenceDbBuilder::new();
        eb.mark_closed_world(AtomSignature::new("Smokes", 1));
        eb.assert_true(AtomSignature::new("Smokes", 1), anna_smokes).unwrap();
        let evidence = eb.build();

        let clause = Clause::new(
            0,
            1.5,
            vec![
                Literal::negative(AtomTemplate::new(AtomSignature::new("Smokes", 1), vec![Term::Var(0)])),
                Literal::positive(AtomTemplate::new(AtomSignature::new("Cancer", 1), vec![Term::Var(0)])),
            ],
        );

        let mln = Mln {
            schema,
            constants,
            clauses: vec![clause.clone()],
            space,
            evidence,
        };
        (mln, clause)
    }

    #[test]
    fn smokes_anna_is_satisfied_by_evidence_bob_survives() {
        let (mln, clause) = smokes_cancer_mln();
        let frontier = ReachabilityFrontier::empty(1);
        let result = ClauseGrounder::ground(&mln, &clause, &frontier, false, false).unwrap();
        // anna: !Smokes(anna) is False (Smokes(anna) is True), so the
        // clause reduces to Cancer(anna) alone, a surviving Unknown unit.
        // bob: !Smokes(bob) is Unknown (default False under closed world ->
        // actually False, since closed-world defaults to False) so
        // !Smokes(bob) is True and the clause is trivially satisfied.
        assert_eq!(result.entries.len(), 1);
        assert!(result.entries[0].is_unit());
    }

    #[test]
    fn negative_weight_is_rewritten_with_no_neg_weights() {
        let (mln, clause) = smokes_cancer_mln();
        let mut negative = clause.clone();
        negative.weight = -1.5;
        let frontier = ReachabilityFrontier::empty(1);
        let result = ClauseGrounder::ground(&mln, &negative, &frontier, true, false).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert!(result.entries[0].weight > 0.0);
        assert_eq!(result.entries[0].freq, -1);
    }

    #[test]
    fn ground_clause_with_no_variables_yields_single_substitution() {
        let domains: Vec<&ConstantsSet> = vec![];
        let combos: Vec<Vec<u32>> = CartesianIndices::new(&domains).collect();
        assert_eq!(combos, vec![Vec::<u32>::new()]);
    }

    #[test]
    fn empty_domain_yields_no_substitutions() {
        let empty = ConstantsSet::new(Vec::<String>::new());
        let domains: Vec<&ConstantsSet> = vec![&empty];
        let combos: Vec<Vec<u32>> = CartesianIndices::new(&domains).collect();
        assert!(combos.is_empty());
    }

    #[test]
    fn unreachable_hidden_atom_is_dropped() {
        let people = domain(&["anna"]);
        let hidden_id = AtomIdentityFunction::new(AtomSignature::new("Hidden", 1), vec![people.clone()], 1);
        let space = PredicateSpace::build(vec![], vec![hidden_id], vec![]);
        let mut schema = Schema::new();
        schema
            .predicate_schema
            .insert(AtomSignature::new("Hidden", 1), vec!["Person".into()]);
        let mut constants = FxHashMap::default();
        constants.insert("Person".to_string(), people);
        let clause = Clause::new(
            0,
            1.0,
            vec![Literal::positive(AtomTemplate::new(
                AtomSignature::new("Hidden", 1),
                vec![Term::Var(0)],
            ))],
        );
        let mln = Mln {
            schema,
            constants,
            clauses: vec![clause.clone()],
            space,
            evidence: EvidenceDb::default(),
        };
        let frontier = ReachabilityFrontier::empty(1);
        let result = ClauseGrounder::ground(&mln, &clause, &frontier, false, false).unwrap();
        assert!(result.entries.is_empty());
        assert!(result.open_world_signatures.contains(&AtomSignature::new("Hidden", 1)));
    }
}

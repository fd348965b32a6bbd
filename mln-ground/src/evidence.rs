//! Evidence DB.
//!
//! Lookup-only once built. Each predicate owns one of six specializations;
//! predicates absent from the evidence set entirely are treated as
//! fully-open (every atom `Unknown`), which is the correct default for a
//! hidden or query predicate that carries no ground facts.

use rustc_hash::{FxHashMap, FxHashSet};

use mln_core::errors::GroundingError;
use mln_core::ids::AtomId;

use crate::schema::AtomSignature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruthState {
    True,
    False,
    Unknown,
}

/// One predicate's evidence table — exactly one of six specializations.
#[derive(Debug, Clone)]
pub enum PredicateEvidence {
    /// Closed-world: anything not listed is False.
    ClosedPositives { positives: FxHashSet<AtomId> },
    /// Closed-world, but some atoms are explicitly carved out as Unknown
    /// rather than falling through to False.
    ClosedPositivesUnknowns {
        positives: FxHashSet<AtomId>,
        unknowns: FxHashSet<AtomId>,
    },
    /// Closed-world with a probability attached to every stated positive.
    /// `prob == 1.0` behaves as certain True, `prob == 0.0` as certain
    /// False, anything in between as Unknown (a clause can't be pruned on
    /// a probability it hasn't yet conditioned on).
    ClosedProbabilistic { probabilities: FxHashMap<AtomId, f64> },
    /// Open-world: atoms not listed in either set are Unknown.
    OpenPositivesNegatives {
        positives: FxHashSet<AtomId>,
        negatives: FxHashSet<AtomId>,
    },
    /// Open-world with probabilities on both the positive and negative
    /// sets, same 0/1/between-is-Unknown rule as `ClosedProbabilistic`.
    OpenPositivesNegativesProbabilistic {
        positives: FxHashMap<AtomId, f64>,
        negatives: FxHashMap<AtomId, f64>,
    },
    /// Every atom of this predicate forced to the same state, for
    /// predicates whose evidence is uniform by construction (e.g. a
    /// declared-total closed-world predicate with no exceptions).
    UniformDummy(TruthState),
}

fn prob_to_state(p: f64) -> TruthState {
    if p >= 1.0 {
        TruthState::True
    } else if p <= 0.0 {
        TruthState::False
    } else {
        TruthState::Unknown
    }
}

impl PredicateEvidence {
    pub fn state(&self, atom_id: AtomId) -> TruthState {
        match self {
            Self::ClosedPositives { positives } => {
                if positives.contains(&atom_id) {
                    TruthState::True
                } else {
                    TruthState::False
                }
            }
            Self::ClosedPositivesUnknowns { positives, unknowns } => {
                if unknowns.contains(&atom_id) {
                    TruthState::Unknown
                } else if positives.contains(&atom_id) {
                    TruthState::True
                } else {
                    TruthState::False
                }
            }
            Self::ClosedProbabilistic { probabilities } => match probabilities.get(&atom_id) {
                Some(&p) => prob_to_state(p),
                None => TruthState::False,
            },
            Self::OpenPositivesNegatives { positives, negatives } => {
                if positives.contains(&atom_id) {
                    TruthState::True
                } else if negatives.contains(&atom_id) {
                    TruthState::False
                } else {
                    TruthState::Unknown
                }
            }
            Self::OpenPositivesNegativesProbabilistic { positives, negatives } => {
                if let Some(&p) = positives.get(&atom_id) {
                    prob_to_state(p)
                } else if let Some(&p) = negatives.get(&atom_id) {
                    prob_to_state(p)
                } else {
                    TruthState::Unknown
                }
            }
            Self::UniformDummy(state) => *state,
        }
    }

    pub fn probability(&self, atom_id: AtomId) -> f64 {
        match self {
            Self::ClosedProbabilistic { probabilities } => {
                probabilities.get(&atom_id).copied().unwrap_or(f64::NAN)
            }
            Self::OpenPositivesNegativesProbabilistic { positives, negatives } => positives
                .get(&atom_id)
                .or_else(|| negatives.get(&atom_id))
                .copied()
                .unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }

    pub fn is_tri_state(&self) -> bool {
        matches!(
            self,
            Self::ClosedPositivesUnknowns { .. }
                | Self::OpenPositivesNegatives { .. }
                | Self::OpenPositivesNegativesProbabilistic { .. }
                | Self::UniformDummy(TruthState::Unknown)
        )
    }

    pub fn is_probabilistic(&self) -> bool {
        matches!(
            self,
            Self::ClosedProbabilistic { .. } | Self::OpenPositivesNegativesProbabilistic { .. }
        )
    }

    /// `(numberOfTrue, numberOfFalse, numberOfUnknown)` across the
    /// predicate's full `length`-sized ground-atom space, used by the
    /// clause grounder's literal-ordering score.
    pub fn stats(&self, length: u32) -> (u32, u32, u32) {
        match self {
            Self::ClosedPositives { positives } => {
                let t = positives.len() as u32;
                (t, length.saturating_sub(t), 0)
            }
            Self::ClosedPositivesUnknowns { positives, unknowns } => {
                let t = positives.len() as u32;
                let u = unknowns.len() as u32;
                (t, length.saturating_sub(t).saturating_sub(u), u)
            }
            Self::ClosedProbabilistic { probabilities } => {
                let mut t = 0u32;
                let mut f_in_map = 0u32;
                for &p in probabilities.values() {
                    match prob_to_state(p) {
                        TruthState::True => t += 1,
                        TruthState::False => f_in_map += 1,
                        TruthState::Unknown => {}
                    }
                }
                let stated = probabilities.len() as u32;
                let u = stated.saturating_sub(t).saturating_sub(f_in_map);
                let f = length.saturating_sub(stated) + f_in_map;
                (t, f, u)
            }
            Self::OpenPositivesNegatives { positives, negatives } => {
                let t = positives.len() as u32;
                let f = negatives.len() as u32;
                (t, f, length.saturating_sub(t).saturating_sub(f))
            }
            Self::OpenPositivesNegativesProbabilistic { positives, negatives } => {
                let mut t = 0u32;
                let mut f = 0u32;
                let mut u = 0u32;
                for &p in positives.values().chain(negatives.values()) {
                    match prob_to_state(p) {
                        TruthState::True => t += 1,
                        TruthState::False => f += 1,
                        TruthState::Unknown => u += 1,
                    }
                }
                let stated = (positives.len() + negatives.len()) as u32;
                (t, f, u + length.saturating_sub(stated))
            }
            Self::UniformDummy(state) => match state {
                TruthState::True => (length, 0, 0),
                TruthState::False => (0, length, 0),
                TruthState::Unknown => (0, 0, length),
            },
        }
    }
}

/// The composite, per-schema evidence database.
#[derive(Debug, Clone, Default)]
pub struct EvidenceDb {
    tables: FxHashMap<AtomSignature, PredicateEvidence>,
}

impl EvidenceDb {
    pub fn state(&self, sig: &AtomSignature, atom_id: AtomId) -> TruthState {
        self.tables
            .get(sig)
            .map(|t| t.state(atom_id))
            .unwrap_or(TruthState::Unknown)
    }

    pub fn probability(&self, sig: &AtomSignature, atom_id: AtomId) -> f64 {
        self.tables.get(sig).map(|t| t.probability(atom_id)).unwrap_or(f64::NAN)
    }

    pub fn is_tri_state(&self, sig: &AtomSignature) -> bool {
        self.tables.get(sig).map(|t| t.is_tri_state()).unwrap_or(true)
    }

    pub fn is_probabilistic(&self, sig: &AtomSignature) -> bool {
        self.tables.get(sig).map(|t| t.is_probabilistic()).unwrap_or(false)
    }

    pub fn table_for(&self, sig: &AtomSignature) -> Option<&PredicateEvidence> {
        self.tables.get(sig)
    }
}

/// Accumulates raw facts and validates them into an `EvidenceDb`.
#[derive(Default)]
pub struct EvidenceDbBuilder {
    positives: FxHashMap<AtomSignature, FxHashSet<AtomId>>,
    negatives: FxHashMap<AtomSignature, FxHashSet<AtomId>>,
    unknowns: FxHashMap<AtomSignature, FxHashSet<AtomId>>,
    probabilities: FxHashMap<AtomSignature, FxHashMap<AtomId, f64>>,
    closed_world: FxHashSet<AtomSignature>,
}

impl EvidenceDbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_closed_world(&mut self, sig: AtomSignature) -> &mut Self {
        self.closed_world.insert(sig);
        self
    }

    pub fn assert_true(&mut self, sig: AtomSignature, atom_id: AtomId) -> Result<&mut Self, GroundingError> {
        if self.negatives.get(&sig).is_some_and(|s| s.contains(&atom_id)) {
            return Err(GroundingError::ConflictingEvidence {
                signature: sig.to_string(),
                detail: format!("atom {atom_id} asserted both True and False"),
            });
        }
        self.positives.entry(sig).or_default().insert(atom_id);
        Ok(self)
    }

    pub fn assert_false(&mut self, sig: AtomSignature, atom_id: AtomId) -> Result<&mut Self, GroundingError> {
        if self.positives.get(&sig).is_some_and(|s| s.contains(&atom_id)) {
            return Err(GroundingError::ConflictingEvidence {
                signature: sig.to_string(),
                detail: format!("atom {atom_id} asserted both True and False"),
            });
        }
        self.negatives.entry(sig).or_default().insert(atom_id);
        Ok(self)
    }

    pub fn assert_unknown(&mut self, sig: AtomSignature, atom_id: AtomId) -> Result<&mut Self, GroundingError> {
        if let Some(&p) = self.probabilities.get(&sig).and_then(|m| m.get(&atom_id)) {
            if p == 1.0 || p == 0.0 {
                return Err(GroundingError::ConflictingEvidence {
                    signature: sig.to_string(),
                    detail: format!("atom {atom_id} marked Unknown but has certain probability {p}"),
                });
            }
        }
        self.unknowns.entry(sig).or_default().insert(atom_id);
        Ok(self)
    }

    pub fn assert_probability(
        &mut self,
        sig: AtomSignature,
        atom_id: AtomId,
        probability: f64,
    ) -> Result<&mut Self, GroundingError> {
        if self.unknowns.get(&sig).is_some_and(|s| s.contains(&atom_id)) && (probability == 1.0 || probability == 0.0)
        {
            return Err(GroundingError::ConflictingEvidence {
                signature: sig.to_string(),
                detail: format!("atom {atom_id} marked Unknown but given certain probability {probability}"),
            });
        }
        if let Some(existing) = self.probabilities.entry(sig.clone()).or_default().insert(atom_id, probability) {
            if existing != probability {
                return Err(GroundingError::ConflictingEvidence {
                    signature: sig.to_string(),
                    detail: format!("atom {atom_id} reassigned probability {existing} -> {probability}"),
                });
            }
        }
        Ok(self)
    }

    pub fn build(self) -> EvidenceDb {
        let mut tables = FxHashMap::default();
        let mut signatures: FxHashSet<AtomSignature> = FxHashSet::default();
        signatures.extend(self.positives.keys().cloned());
        signatures.extend(self.negatives.keys().cloned());
        signatures.extend(self.unknowns.keys().cloned());
        signatures.extend(self.probabilities.keys().cloned());

        for sig in signatures {
            let positives = self.positives.get(&sig).cloned().unwrap_or_default();
            let negatives = self.negatives.get(&sig).cloned().unwrap_or_default();
            let unknowns = self.unknowns.get(&sig).cloned().unwrap_or_default();
            let probabilities = self.probabilities.get(&sig).cloned().unwrap_or_default();
            let closed = self.closed_world.contains(&sig);

            let table = if !probabilities.is_empty() {
                if closed {
                    PredicateEvidence::ClosedProbabilistic { probabilities }
                } else {
                    let pos_probs = probabilities
                        .iter()
                        .filter(|(a, _)| !negatives.contains(a))
                        .map(|(&a, &p)| (a, p))
                        .collect();
                    let neg_probs = probabilities
                        .into_iter()
                        .filter(|(a, _)| negatives.contains(a))
                        .collect();
                    PredicateEvidence::OpenPositivesNegativesProbabilistic {
                        positives: pos_probs,
                        negatives: neg_probs,
                    }
                }
            } else if closed {
                if unknowns.is_empty() {
                    PredicateEvidence::ClosedPositives { positives }
                } else {
                    PredicateEvidence::ClosedPositivesUnknowns { positives, unknowns }
                }
            } else {
                PredicateEvidence::OpenPositivesNegatives { positives, negatives }
            };

            tables.insert(sig, table);
        }

        EvidenceDb { tables }
    }
}

//! Predicate Space.
//!
//! Partitions every predicate into query / hidden / evidence and assigns
//! each a disjoint contiguous atom-id range, query predicates first so that
//! `queryStartID == 1` always holds.

use mln_core::errors::GroundingError;
use mln_core::ids::AtomId;

use crate::identity::AtomIdentityFunction;
use crate::schema::{AtomSignature, PredicateKind};

pub struct PredicateSpace {
    identities: Vec<AtomIdentityFunction>,
    kinds: Vec<PredicateKind>,
    /// Ascending by `start_id`, parallel to `identities`/`kinds` — enables
    /// `O(log P)` `signature_of` via binary search.
    ordered_start_ids: Vec<u32>,
    total_atoms: u32,
}

impl PredicateSpace {
    /// `query`, `hidden`, and `evidence` each pair a signature with its
    /// already-built identity function (still missing a `start_id`, which
    /// this constructor assigns).
    pub fn build(
        query: Vec<AtomIdentityFunction>,
        hidden: Vec<AtomIdentityFunction>,
        evidence: Vec<AtomIdentityFunction>,
    ) -> Self {
        let mut identities = Vec::new();
        let mut kinds = Vec::new();
        let mut next_start = 1u32;

        for (group, kind) in [
            (query, PredicateKind::Query),
            (hidden, PredicateKind::Hidden),
            (evidence, PredicateKind::Evidence),
        ] {
            for func in group {
                let length = func.length;
                let relocated = func.with_start_id(next_start);
                next_start += length;
                identities.push(relocated);
                kinds.push(kind);
            }
        }

        let ordered_start_ids: Vec<u32> = identities.iter().map(|f| f.start_id).collect();
        let total_atoms = next_start.saturating_sub(1);

        Self {
            identities,
            kinds,
            ordered_start_ids,
            total_atoms,
        }
    }

    pub fn total_atoms(&self) -> u32 {
        self.total_atoms
    }

    pub fn identity_of(&self, sig: &AtomSignature) -> Option<&AtomIdentityFunction> {
        self.identities.iter().find(|f| &f.signature == sig)
    }

    /// `O(log P)` binary search on `ordered_start_ids`.
    pub fn signature_of(&self, atom_id: AtomId) -> Result<&AtomSignature, GroundingError> {
        if atom_id.0 == 0 {
            return Err(GroundingError::IdentityOutOfRange {
                atom_id: atom_id.0,
                start_id: 1,
                end_id: self.total_atoms + 1,
            });
        }
        let idx = match self.ordered_start_ids.binary_search(&atom_id.0) {
            Ok(i) => i,
            Err(0) => {
                return Err(GroundingError::IdentityOutOfRange {
                    atom_id: atom_id.0,
                    start_id: 1,
                    end_id: self.total_atoms + 1,
                })
            }
            Err(i) => i - 1,
        };
        let func = &self.identities[idx];
        if atom_id.0 >= func.end_id() {
            return Err(GroundingError::IdentityOutOfRange {
                atom_id: atom_id.0,
                start_id: func.start_id,
                end_id: func.end_id(),
            });
        }
        Ok(&func.signature)
    }

    fn kind_of(&self, sig: &AtomSignature) -> Option<PredicateKind> {
        self.identities
            .iter()
            .position(|f| &f.signature == sig)
            .map(|i| self.kinds[i])
    }

    pub fn is_query(&self, sig: &AtomSignature) -> bool {
        matches!(self.kind_of(sig), Some(PredicateKind::Query))
    }

    pub fn is_hidden(&self, sig: &AtomSignature) -> bool {
        matches!(self.kind_of(sig), Some(PredicateKind::Hidden))
    }

    pub fn is_evidence(&self, sig: &AtomSignature) -> bool {
        matches!(self.kind_of(sig), Some(PredicateKind::Evidence))
    }

    pub fn identities(&self) -> &[AtomIdentityFunction] {
        &self.identities
    }
}

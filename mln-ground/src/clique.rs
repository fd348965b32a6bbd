//! Ground constraints ("cliques") and their hash-keying.

use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

use mln_core::ids::AtomId;

/// A signed ground-atom id: positive for a positive literal, negative for a
/// negated one. `0` never appears — atom ids start at 1.
pub type SignedAtomId = i64;

pub fn signed(atom_id: AtomId, positive: bool) -> SignedAtomId {
    let v = atom_id.0 as i64;
    if positive {
        v
    } else {
        -v
    }
}

/// Hash of the sorted signed-atom-id vector. Remaps a would-be-zero hash to
/// `1` so the value can double as a non-zero shard-routing key.
pub fn hash_key(sorted_vars: &[SignedAtomId]) -> i64 {
    let mut hasher = FxHasher::default();
    sorted_vars.hash(&mut hasher);
    let h = hasher.finish() as i64;
    if h == 0 {
        1
    } else {
        h
    }
}

/// One ground constraint emitted by a clause grounding. `variables` must
/// already be sorted — callers are responsible for sorting once, not on
/// every comparison.
#[derive(Debug, Clone)]
pub struct CliqueEntry {
    pub hash_key: i64,
    pub weight: f64,
    pub variables: SmallVec<[SignedAtomId; 4]>,
    pub clause_index: usize,
    /// `+1` for a normal emission, `-1` if the weight was inverted during
    /// the negative-weight rewrite.
    pub freq: i32,
}

impl CliqueEntry {
    pub fn new(mut variables: SmallVec<[SignedAtomId; 4]>, weight: f64, clause_index: usize, freq: i32) -> Self {
        variables.sort_unstable();
        let hash_key = hash_key(&variables);
        Self {
            hash_key,
            weight,
            variables,
            clause_index,
            freq,
        }
    }

    pub fn is_unit(&self) -> bool {
        self.variables.len() == 1
    }
}

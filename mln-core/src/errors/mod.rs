//! Error kinds for the grounding engine.
//!
//! `GroundingError` covers every fatal kind. `UnreachableClause` is kept
//! separate on purpose: it is a non-fatal diagnostic collected during a
//! successful build, not something that aborts it.

pub mod error_code;

use error_code::ErrorCode;

/// Fatal errors. Any of these abort the build before an `Mrf` is produced.
#[derive(Debug, thiserror::Error)]
pub enum GroundingError {
    #[error("clause {clause_index} has a non-finite weight: {weight}")]
    InvalidWeight { clause_index: usize, weight: f64 },

    #[error("atom id {atom_id} is out of range [{start_id}, {end_id})")]
    IdentityOutOfRange {
        atom_id: u32,
        start_id: u32,
        end_id: u32,
    },

    #[error("signature {signature} expects arity {expected}, got {got}")]
    InvalidArity {
        signature: String,
        expected: usize,
        got: usize,
    },

    #[error("conflicting evidence for {signature}: {detail}")]
    ConflictingEvidence { signature: String, detail: String },

    #[error("merging clique with hash {hash_key} produced both +inf and -inf weight")]
    ContradictoryHardConstraints { hash_key: i64 },

    #[error("dynamic predicate {signature} encountered but dynamics are disabled")]
    UnsupportedDynamic { signature: String },

    #[error("reachability closure left zero atoms in the MRF")]
    EmptyMrf,
}

impl ErrorCode for GroundingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidWeight { .. } => error_code::INVALID_WEIGHT,
            Self::IdentityOutOfRange { .. } => error_code::IDENTITY_OUT_OF_RANGE,
            Self::InvalidArity { .. } => error_code::INVALID_ARITY,
            Self::ConflictingEvidence { .. } => error_code::CONFLICTING_EVIDENCE,
            Self::ContradictoryHardConstraints { .. } => {
                error_code::CONTRADICTORY_HARD_CONSTRAINTS
            }
            Self::UnsupportedDynamic { .. } => error_code::UNSUPPORTED_DYNAMIC,
            Self::EmptyMrf => error_code::EMPTY_MRF,
        }
    }
}

/// A clause that survived to the end of the reachability loop without ever
/// being selected. Non-fatal: logged and omitted from the MRF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreachableClause {
    pub clause_index: usize,
}

impl std::fmt::Display for UnreachableClause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "clause {} is not reachable from any query predicate",
            self.clause_index
        )
    }
}

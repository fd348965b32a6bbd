//! The public entry point: `GroundingBuilder::new(mln, config).build()`.

use mln_core::errors::{GroundingError, UnreachableClause};
use mln_core::config::GroundingConfig;

use crate::coordinator::GroundingRun;
use crate::mln::Mln;
use crate::mrf::Mrf;

/// What `GroundingBuilder::build` returns on success: the assembled MRF
/// plus the clauses that never fired during the reachability closure —
/// logged as a diagnostic rather than rejected outright, since an
/// over-general theory with a few unreachable clauses is still usable.
pub struct GroundingOutcome {
    pub mrf: Mrf,
    pub unreachable_clauses: Vec<UnreachableClause>,
}

pub struct GroundingBuilder<'a> {
    mln: &'a Mln,
    config: GroundingConfig,
}

impl<'a> GroundingBuilder<'a> {
    pub fn new(mln: &'a Mln, config: GroundingConfig) -> Self {
        Self { mln, config }
    }

    pub fn build(self) -> Result<GroundingOutcome, GroundingError> {
        let (mrf, unreachable_clauses) = GroundingRun::execute(self.mln, &self.config)?;
        for clause in &unreachable_clauses {
            tracing::warn!(clause_index = clause.clause_index, "{clause}");
        }
        Ok(GroundingOutcome { mrf, unreachable_clauses })
    }
}

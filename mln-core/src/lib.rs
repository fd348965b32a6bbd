//! Foundation crate for the MLN grounding engine.
//!
//! Holds everything that has no opinion about clauses, atoms, or grounding:
//! error types, the builder's configuration flags, identifier newtypes, and
//! the logging setup every worker thread in `mln-ground` uses.

pub mod config;
pub mod errors;
pub mod ids;
pub mod logging;

pub use config::GroundingConfig;
pub use errors::{error_code::ErrorCode, GroundingError, UnreachableClause};
pub use ids::{AtomId, CliqueId, ClauseIndex, ShardIndex, IDENTITY_NOT_EXIST};

//! Identifier newtypes shared across every component in `mln-ground`.

use serde::{Deserialize, Serialize};

/// `0` is never a valid atom id — it is the encode-failure sentinel
/// returned when an argument or function result falls outside its domain.
/// Every real atom id satisfies `id >= 1`.
pub const IDENTITY_NOT_EXIST: u32 = 0;

/// A ground atom's global id, unique across the whole predicate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AtomId(pub u32);

impl AtomId {
    pub fn is_valid(self) -> bool {
        self.0 != IDENTITY_NOT_EXIST
    }
}

impl std::fmt::Display for AtomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ground constraint's (clique's) global id, assigned only after the
/// finalize phase has made clique-register shard offsets contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CliqueId(pub u32);

impl std::fmt::Display for CliqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a clause within the theory's clause vector; doubles as the
/// "origin" key in the dependency map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClauseIndex(pub usize);

/// Index of a worker shard, always in `0..N_shards`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShardIndex(pub usize);

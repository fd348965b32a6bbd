//! The in-process mailbox protocol binding the clause grounder, the clique
//! register shards, the atom register shards, and the coordinator
//! together. Entirely internal — nothing here is re-exported from
//! `lib.rs`.

use rustc_hash::{FxHashMap, FxHashSet};

use mln_core::ids::{AtomId, CliqueId};

use crate::clique::CliqueEntry;
use crate::mrf::DependencyMap;

/// Coordinator -> clique-register shard.
pub enum CliqueControl {
    IterationComplete,
    GroundingComplete,
    StartId(u32),
}

/// Sent to a clique-register shard's mailbox: either a freshly-emitted
/// ground constraint from a grounder worker, or a control message from
/// the coordinator. One combined enum because both sources share one
/// single-consumer mailbox.
pub enum CliqueInbound {
    Entry(CliqueEntry),
    Control(CliqueControl),
}

/// Clique-register shard -> atom-register shard, or coordinator -> atom
/// shard. Both are modeled as one enum for the same single-mailbox reason.
/// Reachability between iterations is tracked by the coordinator directly
/// from each round's grounding output, not by polling these shards — so
/// there is no per-iteration message here, only the final drain.
pub enum AtomInbound {
    QueryVariable(AtomId),
    RegisterAtom { atom_id: AtomId, clique_id: CliqueId },
    Shutdown,
}

/// Every event the coordinator's single inbox can receive, tagged with the
/// originating shard where relevant. Clause grounding itself runs as a
/// direct `rayon` fan-out inside the coordinator rather than as mailbox
/// actors, so there is no "grounder done/failed" event here — only the
/// clique- and atom-register shards report back this way.
pub enum CoordinatorEvent {
    CliqueCount {
        shard: usize,
        count: u32,
    },
    CliqueCollected {
        shard: usize,
        cliques: FxHashMap<CliqueId, CliqueEntry>,
        dependency: Option<DependencyMap>,
    },
    CliqueMergeFailed {
        shard: usize,
        error: mln_core::errors::GroundingError,
    },
    AtomFinal {
        shard: usize,
        incidence: FxHashMap<AtomId, Vec<CliqueId>>,
        query_atoms: FxHashSet<AtomId>,
    },
}

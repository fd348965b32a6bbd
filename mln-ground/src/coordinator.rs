//! Coordinator.
//!
//! Drives the reachability closure to a fixpoint, fanning each iteration's
//! clause grounding out across rayon's pool, forwarding newly-discovered
//! ground constraints to the clique-register shards by hash, then running
//! the collect -> finalize handshake across both shard kinds to produce
//! the final `Mrf`.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use mln_core::errors::{GroundingError, UnreachableClause};
use mln_core::ids::AtomId;

use crate::atom_register::AtomRegisterShard;
use crate::clique::CliqueEntry;
use crate::clique_register::CliqueRegisterShard;
use crate::frontier::ReachabilityFrontier;
use crate::grounder::ClauseGrounder;
use crate::messages::{AtomInbound, CliqueControl, CliqueInbound, CoordinatorEvent};
use crate::mln::Mln;
use crate::mrf::{DependencyMap, Mrf, MrfBuilder};
use mln_core::config::GroundingConfig;

pub struct GroundingRun;

impl GroundingRun {
    pub fn execute(mln: &Mln, config: &GroundingConfig) -> Result<(Mrf, Vec<UnreachableClause>), GroundingError> {
        let n_shards = config.effective_shard_count().max(1);

        let (coordinator_tx, coordinator_rx) = crossbeam_channel::unbounded::<CoordinatorEvent>();

        let atom_shards: Vec<AtomRegisterShard> =
            (0..n_shards).map(|i| AtomRegisterShard::spawn(i, coordinator_tx.clone())).collect();
        let atom_senders: Vec<crossbeam_channel::Sender<AtomInbound>> =
            atom_shards.iter().map(|s| s.sender()).collect();

        let clique_shards: Vec<CliqueRegisterShard> = (0..n_shards)
            .map(|i| {
                CliqueRegisterShard::spawn(i, coordinator_tx.clone(), atom_senders.clone(), config.create_dependency_map)
            })
            .collect();
        let clique_senders: Vec<crossbeam_channel::Sender<CliqueInbound>> =
            clique_shards.iter().map(|s| s.sender()).collect();

        seed_query_atoms(mln, &atom_senders, n_shards);

        let mut frontier = ReachabilityFrontier::empty(n_shards);
        let mut seen: FxHashSet<(usize, smallvec::SmallVec<[crate::clique::SignedAtomId; 4]>)> = FxHashSet::default();
        let mut reachable_clauses: FxHashSet<usize> = FxHashSet::default();
        let mut fatal: Option<GroundingError> = None;

        loop {
            let round: Vec<Result<crate::grounder::ClauseGroundingResult, GroundingError>> = mln
                .clauses
                .par_iter()
                .map(|clause| {
                    ClauseGrounder::ground(mln, clause, &frontier, config.no_neg_weights, config.eliminate_negated_unit)
                })
                .collect();

            let mut newly_reachable: FxHashSet<AtomId> = FxHashSet::default();
            let mut any_new = false;

            for (clause, outcome) in mln.clauses.iter().zip(round) {
                let result = match outcome {
                    Ok(r) => r,
                    Err(error) => {
                        fatal = Some(error);
                        break;
                    }
                };
                if !result.entries.is_empty() {
                    reachable_clauses.insert(clause.clause_index);
                }
                for entry in result.entries {
                    let key = (entry.clause_index, entry.variables.clone());
                    if !seen.insert(key) {
                        continue;
                    }
                    any_new = true;
                    for &signed in &entry.variables {
                        let atom_id = AtomId(signed.unsigned_abs() as u32);
                        if let Ok(sig) = mln.space.signature_of(atom_id) {
                            if mln.space.is_hidden(sig) {
                                newly_reachable.insert(atom_id);
                            }
                        }
                    }
                    dispatch_entry(entry, &clique_senders);
                }
            }

            if fatal.is_some() || !any_new {
                break;
            }
            for atom_id in newly_reachable {
                frontier.insert(atom_id);
            }
        }

        if let Some(error) = fatal {
            shutdown(clique_senders, clique_shards, atom_senders, atom_shards);
            return Err(error);
        }

        let (all_cliques, dependency_map, clique_error) =
            collect_cliques(&coordinator_rx, &clique_senders, clique_shards, n_shards, config.create_dependency_map);

        for sender in &atom_senders {
            let _ = sender.send(AtomInbound::Shutdown);
        }
        let (incidence, query_atoms) = collect_atoms(&coordinator_rx, atom_shards, n_shards);

        if let Some(error) = clique_error {
            return Err(error);
        }

        let mrf = MrfBuilder::build(
            mln,
            all_cliques,
            &incidence,
            &query_atoms,
            dependency_map,
            config.no_neg_weights,
        )?;

        let unreachable = (0..mln.clauses.len())
            .filter(|i| !reachable_clauses.contains(i))
            .map(|clause_index| UnreachableClause { clause_index })
            .collect();

        Ok((mrf, unreachable))
    }
}

fn seed_query_atoms(mln: &Mln, atom_senders: &[crossbeam_channel::Sender<AtomInbound>], n_shards: usize) {
    for identity in mln.space.identities() {
        if !mln.space.is_query(&identity.signature) {
            continue;
        }
        for raw_id in identity.start_id..identity.end_id() {
            let atom_id = AtomId(raw_id);
            let shard = atom_id.0 as usize % n_shards;
            let _ = atom_senders[shard].send(AtomInbound::QueryVariable(atom_id));
        }
    }
}

fn dispatch_entry(entry: CliqueEntry, clique_senders: &[crossbeam_channel::Sender<CliqueInbound>]) {
    let shard = entry.hash_key.rem_euclid(clique_senders.len() as i64) as usize;
    let _ = clique_senders[shard].send(CliqueInbound::Entry(entry));
}

fn collect_cliques(
    coordinator_rx: &crossbeam_channel::Receiver<CoordinatorEvent>,
    clique_senders: &[crossbeam_channel::Sender<CliqueInbound>],
    clique_shards: Vec<CliqueRegisterShard>,
    n_shards: usize,
    create_dependency_map: bool,
) -> (FxHashMap<mln_core::ids::CliqueId, CliqueEntry>, Option<DependencyMap>, Option<GroundingError>) {
    for sender in clique_senders {
        let _ = sender.send(CliqueInbound::Control(CliqueControl::IterationComplete));
    }
    let mut counts = vec![0u32; n_shards];
    let mut remaining = n_shards;
    while remaining > 0 {
        if let Ok(CoordinatorEvent::CliqueCount { shard, count }) = coordinator_rx.recv() {
            counts[shard] = count;
            remaining -= 1;
        }
    }
    let mut offsets = vec![0u32; n_shards];
    let mut running = 0u32;
    for (i, &count) in counts.iter().enumerate() {
        offsets[i] = running;
        running += count;
    }
    for (sender, &offset) in clique_senders.iter().zip(&offsets) {
        let _ = sender.send(CliqueInbound::Control(CliqueControl::StartId(offset)));
    }

    let mut all_cliques = FxHashMap::default();
    let mut dependency_map = create_dependency_map.then(FxHashMap::default);
    let mut error = None;
    let mut remaining = n_shards;
    while remaining > 0 {
        match coordinator_rx.recv() {
            Ok(CoordinatorEvent::CliqueCollected { cliques, dependency, .. }) => {
                all_cliques.extend(cliques);
                if let (Some(acc), Some(shard_dep)) = (dependency_map.as_mut(), dependency) {
                    acc.extend(shard_dep);
                }
                remaining -= 1;
            }
            Ok(CoordinatorEvent::CliqueMergeFailed { error: e, .. }) => {
                error = Some(e);
                remaining -= 1;
            }
            _ => {}
        }
    }

    for sender in clique_senders {
        let _ = sender.send(CliqueInbound::Control(CliqueControl::GroundingComplete));
    }
    for shard in clique_shards {
        shard.join();
    }

    (all_cliques, dependency_map, error)
}

fn collect_atoms(
    coordinator_rx: &crossbeam_channel::Receiver<CoordinatorEvent>,
    atom_shards: Vec<AtomRegisterShard>,
    n_shards: usize,
) -> (FxHashMap<AtomId, Vec<mln_core::ids::CliqueId>>, FxHashSet<AtomId>) {
    let mut incidence = FxHashMap::default();
    let mut query_atoms = FxHashSet::default();
    let mut remaining = n_shards;
    while remaining > 0 {
        if let Ok(CoordinatorEvent::AtomFinal {
            incidence: shard_incidence,
            query_atoms: shard_query_atoms,
            ..
        }) = coordinator_rx.recv()
        {
            incidence.extend(shard_incidence);
            query_atoms.extend(shard_query_atoms);
            remaining -= 1;
        }
    }
    for shard in atom_shards {
        shard.join();
    }
    (incidence, query_atoms)
}

fn shutdown(
    clique_senders: Vec<crossbeam_channel::Sender<CliqueInbound>>,
    clique_shards: Vec<CliqueRegisterShard>,
    atom_senders: Vec<crossbeam_channel::Sender<AtomInbound>>,
    atom_shards: Vec<AtomRegisterShard>,
) {
    for sender in &clique_senders {
        let _ = sender.send(CliqueInbound::Control(CliqueControl::GroundingComplete));
    }
    for shard in clique_shards {
        shard.join();
    }
    for sender in &atom_senders {
        let _ = sender.send(AtomInbound::Shutdown);
    }
    for shard in atom_shards {
        shard.join();
    }
}

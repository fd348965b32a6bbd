//! Clique Register shard.
//!
//! One dedicated OS thread per shard, a single mailbox fed by every C4
//! worker whose grounded constraints hash into this shard, and a
//! collect/finalize lifecycle mirroring a long-running batch writer: accept
//! entries until told the round is over, merge-by-hash-then-equality,
//! report a count, wait for a global id offset, then emit the finished
//! clique map.

use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use rustc_hash::FxHashMap;

use mln_core::errors::GroundingError;
use mln_core::ids::{AtomId, CliqueId};

use crate::clique::CliqueEntry;
use crate::messages::{AtomInbound, CliqueControl, CliqueInbound, CoordinatorEvent};
use crate::mrf::DependencyMap;

pub struct CliqueRegisterShard {
    handle: JoinHandle<()>,
    sender: Sender<CliqueInbound>,
}

impl CliqueRegisterShard {
    pub fn spawn(
        shard_index: usize,
        coordinator: Sender<CoordinatorEvent>,
        atom_senders: Vec<Sender<AtomInbound>>,
        create_dependency_map: bool,
    ) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let handle = thread::Builder::new()
            .name(format!("clique-register-{shard_index}"))
            .spawn(move || run(shard_index, receiver, coordinator, atom_senders, create_dependency_map))
            .expect("failed to spawn clique-register shard thread");
        Self { handle, sender }
    }

    pub fn sender(&self) -> Sender<CliqueInbound> {
        self.sender.clone()
    }

    pub fn join(self) {
        let _ = self.handle.join();
    }
}

struct ShardState {
    buckets: FxHashMap<i64, Vec<CliqueEntry>>,
    freq_by_hash: FxHashMap<i64, FxHashMap<usize, i32>>,
    create_dependency_map: bool,
    failed: Option<GroundingError>,
}

impl ShardState {
    fn new(create_dependency_map: bool) -> Self {
        Self {
            buckets: FxHashMap::default(),
            freq_by_hash: FxHashMap::default(),
            create_dependency_map,
            failed: None,
        }
    }

    fn merge(&mut self, entry: CliqueEntry) {
        if self.failed.is_some() {
            return;
        }
        if self.create_dependency_map {
            self.freq_by_hash
                .entry(entry.hash_key)
                .or_default()
                .entry(entry.clause_index)
                .and_modify(|f| *f += entry.freq)
                .or_insert(entry.freq);
        }
        let bucket = self.buckets.entry(entry.hash_key).or_default();
        match bucket.iter_mut().find(|e| e.variables == entry.variables) {
            Some(existing) => match merge_weight(existing.weight, entry.weight) {
                Ok(weight) => existing.weight = weight,
                Err(_) => {
                    self.failed = Some(GroundingError::ContradictoryHardConstraints {
                        hash_key: entry.hash_key,
                    })
                }
            },
            None => bucket.push(entry),
        }
    }

    fn count(&self) -> u32 {
        self.buckets.values().map(|b| b.len() as u32).sum()
    }

    /// Assigns contiguous clique ids starting at `start_id`, in ascending
    /// hash-key order (deterministic across runs given the same input),
    /// forwarding each assigned id to its member atoms' shards.
    fn finalize(
        &self,
        start_id: u32,
        atom_senders: &[Sender<AtomInbound>],
    ) -> (FxHashMap<CliqueId, CliqueEntry>, Option<DependencyMap>) {
        let mut cliques = FxHashMap::default();
        let mut dependency = self.create_dependency_map.then(FxHashMap::default);
        let mut next_id = start_id;

        let mut hash_keys: Vec<i64> = self.buckets.keys().copied().collect();
        hash_keys.sort_unstable();

        for hash_key in hash_keys {
            for entry in &self.buckets[&hash_key] {
                let id = CliqueId(next_id);
                next_id += 1;
                for &signed in &entry.variables {
                    let atom_id = AtomId(signed.unsigned_abs() as u32);
                    if !atom_senders.is_empty() {
                        let target = atom_id.0 as usize % atom_senders.len();
                        let _ = atom_senders[target].send(AtomInbound::RegisterAtom { atom_id, clique_id: id });
                    }
                }
                if let Some(dep) = dependency.as_mut() {
                    if let Some(freqs) = self.freq_by_hash.get(&hash_key) {
                        dep.insert(id, freqs.clone());
                    }
                }
                cliques.insert(id, entry.clone());
            }
        }

        (cliques, dependency)
    }
}

/// Combines two weights bound for the same ground constraint. A finite
/// weight plus a finite weight just sums (independent clauses grounding to
/// the same clique contribute additively); an infinite (hard) weight
/// dominates any finite one; two infinite weights of opposite sign are a
/// genuine contradiction in the theory and must abort the build.
fn merge_weight(existing: f64, incoming: f64) -> Result<f64, ()> {
    match (existing.is_infinite(), incoming.is_infinite()) {
        (true, true) if existing.signum() != incoming.signum() => Err(()),
        (true, _) => Ok(existing),
        (_, true) => Ok(incoming),
        _ => Ok(existing + incoming),
    }
}

fn run(
    shard_index: usize,
    receiver: crossbeam_channel::Receiver<CliqueInbound>,
    coordinator: Sender<CoordinatorEvent>,
    atom_senders: Vec<Sender<AtomInbound>>,
    create_dependency_map: bool,
) {
    let mut state = ShardState::new(create_dependency_map);

    while let Ok(message) = receiver.recv() {
        match message {
            CliqueInbound::Entry(entry) => state.merge(entry),
            CliqueInbound::Control(CliqueControl::IterationComplete) => {
                let count = state.count();
                let _ = coordinator.send(CoordinatorEvent::CliqueCount {
                    shard: shard_index,
                    count,
                });
            }
            CliqueInbound::Control(CliqueControl::StartId(start_id)) => {
                if let Some(error) = state.failed.take() {
                    let _ = coordinator.send(CoordinatorEvent::CliqueMergeFailed {
                        shard: shard_index,
                        error,
                    });
                } else {
                    let (cliques, dependency) = state.finalize(start_id, &atom_senders);
                    let _ = coordinator.send(CoordinatorEvent::CliqueCollected {
                        shard: shard_index,
                        cliques,
                        dependency,
                    });
                }
            }
            CliqueInbound::Control(CliqueControl::GroundingComplete) => break,
        }
    }
}

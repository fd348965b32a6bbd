//! Atom Register shard.
//!
//! One dedicated thread per shard, owning the `atom -> incident cliques`
//! inverse index for the atoms that hash into it, plus the set of query
//! atoms seeded up front so a query predicate with zero incident
//! constraints still surfaces in the final MRF.

use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use rustc_hash::{FxHashMap, FxHashSet};

use mln_core::ids::{AtomId, CliqueId};

use crate::messages::{AtomInbound, CoordinatorEvent};

pub struct AtomRegisterShard {
    handle: JoinHandle<()>,
    sender: Sender<AtomInbound>,
}

impl AtomRegisterShard {
    pub fn spawn(shard_index: usize, coordinator: Sender<CoordinatorEvent>) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let handle = thread::Builder::new()
            .name(format!("atom-register-{shard_index}"))
            .spawn(move || run(shard_index, receiver, coordinator))
            .expect("failed to spawn atom-register shard thread");
        Self { handle, sender }
    }

    pub fn sender(&self) -> Sender<AtomInbound> {
        self.sender.clone()
    }

    pub fn join(self) {
        let _ = self.handle.join();
    }
}

fn run(shard_index: usize, receiver: crossbeam_channel::Receiver<AtomInbound>, coordinator: Sender<CoordinatorEvent>) {
    let mut incidence: FxHashMap<AtomId, Vec<CliqueId>> = FxHashMap::default();
    let mut query_atoms: FxHashSet<AtomId> = FxHashSet::default();

    while let Ok(message) = receiver.recv() {
        match message {
            AtomInbound::QueryVariable(atom_id) => {
                query_atoms.insert(atom_id);
            }
            AtomInbound::RegisterAtom { atom_id, clique_id } => {
                incidence.entry(atom_id).or_default().push(clique_id);
            }
            AtomInbound::Shutdown => break,
        }
    }

    let _ = coordinator.send(CoordinatorEvent::AtomFinal {
        shard: shard_index,
        incidence,
        query_atoms,
    });
}

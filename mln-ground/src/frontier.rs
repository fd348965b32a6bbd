//! The reachability frontier: the cumulative set of hidden-predicate atom
//! ids discovered through the previous grounding iteration,
//! partitioned the same way atom-register shards are (`atom_id % N_shards`)
//! so C4 workers can query it without any cross-shard coordination.

use rustc_hash::FxHashSet;

use mln_core::ids::AtomId;

#[derive(Debug, Clone)]
pub struct ReachabilityFrontier {
    shards: Vec<FxHashSet<AtomId>>,
}

impl ReachabilityFrontier {
    pub fn empty(n_shards: usize) -> Self {
        Self {
            shards: vec![FxHashSet::default(); n_shards.max(1)],
        }
    }

    pub fn from_shards(shards: Vec<FxHashSet<AtomId>>) -> Self {
        Self { shards }
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        let shard = atom_id.0 as usize % self.shards.len();
        self.shards[shard].contains(&atom_id)
    }

    pub fn n_shards(&self) -> usize {
        self.shards.len()
    }

    pub fn insert(&mut self, atom_id: AtomId) {
        let shard = atom_id.0 as usize % self.shards.len();
        self.shards[shard].insert(atom_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frontier_contains_nothing() {
        let f = ReachabilityFrontier::empty(4);
        assert!(!f.contains(AtomId(7)));
    }

    #[test]
    fn lookup_respects_shard_partition() {
        let mut shards = vec![FxHashSet::default(); 2];
        shards[1].insert(AtomId(3));
        let f = ReachabilityFrontier::from_shards(shards);
        assert!(f.contains(AtomId(3)));
        assert!(!f.contains(AtomId(2)));
    }
}

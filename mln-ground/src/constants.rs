//! `ConstantsSet`: an immutable, ordered bijection between constant symbols
//! and a contiguous index range `[0, n)`.

use std::sync::Arc;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct ConstantsSet {
    symbols: Vec<Arc<str>>,
    index_of: FxHashMap<Arc<str>, u32>,
}

impl ConstantsSet {
    /// Builds a domain from symbols in the given order; that order becomes
    /// the permanent index assignment. Duplicate symbols keep their first
    /// index.
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let mut ordered = Vec::new();
        let mut index_of = FxHashMap::default();
        for sym in symbols {
            let sym: Arc<str> = sym.into();
            if !index_of.contains_key(&sym) {
                index_of.insert(sym.clone(), ordered.len() as u32);
                ordered.push(sym);
            }
        }
        Self {
            symbols: ordered,
            index_of,
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// `O(1)` symbol -> index; `None` if the symbol is not a member.
    pub fn index(&self, symbol: &str) -> Option<u32> {
        self.index_of.get(symbol).copied()
    }

    /// `O(1)` index -> symbol; `None` if out of range.
    pub fn symbol(&self, index: u32) -> Option<&Arc<str>> {
        self.symbols.get(index as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<str>> {
        self.symbols.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijection_round_trips() {
        let set = ConstantsSet::new(["a", "b", "c"]);
        for i in 0..set.len() as u32 {
            let sym = set.symbol(i).unwrap().clone();
            assert_eq!(set.index(&sym), Some(i));
        }
    }

    #[test]
    fn unknown_symbol_is_none() {
        let set = ConstantsSet::new(["a", "b"]);
        assert_eq!(set.index("z"), None);
    }

    #[test]
    fn duplicates_keep_first_index() {
        let set = ConstantsSet::new(["a", "b", "a"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.index("a"), Some(0));
    }
}

//! Sets of small integers with constant-time membership, insertion, removal
//! and clearing (Briggs and Torczon representation).

use crate::maps::{AbstractSet, Mutability};
use std::fmt;
use std::slice;

#[derive(Clone, Default)]
pub struct SparseSet {
    dense: Vec<usize>,
    sparse: Vec<usize>,
}

impl SparseSet {
    /// Empty set, preallocated for elements below `universe`.
    pub fn with_capacity(universe: usize) -> Self {
        Self {
            dense: Vec::new(),
            sparse: vec![0; universe],
        }
    }

    fn rebuild<I: IntoIterator<Item = usize>>(&mut self, elements: I) {
        self.dense.clear();
        for elem in elements {
            self.insert(elem);
        }
    }
}

impl fmt::Debug for SparseSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.dense.iter()).finish()
    }
}

impl AbstractSet for SparseSet {
    type Element = usize;
    type Iter<'a> = slice::Iter<'a, usize> where Self: 'a;

    const MUTABILITY: Mutability = Mutability::Mutable;

    fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.dense.iter()
    }

    fn contains(&self, elem: &usize) -> bool {
        self.sparse
            .get(*elem)
            .map_or(false, |&i| i < self.dense.len() && self.dense[i] == *elem)
    }

    fn insert(&mut self, elem: usize) {
        if self.contains(&elem) {
            return;
        }
        if elem >= self.sparse.len() {
            self.sparse.resize(elem + 1, 0);
        }
        self.sparse[elem] = self.dense.len();
        self.dense.push(elem);
    }

    fn remove(&mut self, elem: &usize) {
        if !self.contains(elem) {
            return;
        }
        let i = self.sparse[*elem];
        self.dense.swap_remove(i);
        if let Some(&moved) = self.dense.get(i) {
            self.sparse[moved] = i;
        }
    }

    fn clear(&mut self) {
        self.dense.clear();
    }

    fn filter<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&usize) -> bool,
    {
        let kept: Vec<usize> = self.dense.iter().copied().filter(|e| predicate(e)).collect();
        self.rebuild(kept);
    }

    fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.dense.iter().all(|e| other.contains(e))
    }

    fn union_with(&mut self, other: &Self) {
        for &elem in &other.dense {
            self.insert(elem);
        }
    }

    fn intersection_with(&mut self, other: &Self) {
        self.filter(|e| other.contains(e));
    }

    fn difference_with(&mut self, other: &Self) {
        self.filter(|e| !other.contains(e));
    }
}

impl FromIterator<usize> for SparseSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::default();
        set.rebuild(iter);
        set
    }
}

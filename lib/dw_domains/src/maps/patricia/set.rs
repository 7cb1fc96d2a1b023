use super::{PatriciaIter, PatriciaKey, Tree};
use crate::errors::DomainResult;
use crate::maps::{AbstractSet, Mutability};
use std::fmt;

/// Persistent set over a Patricia tree.
pub struct PatriciaTreeSet<K> {
    root: Tree<K, ()>,
}

fn always(_: &(), _: &()) -> bool {
    true
}

impl<K> PatriciaTreeSet<K> {
    pub fn new() -> Self {
        Self { root: None }
    }
}

impl<K: PatriciaKey> PatriciaTreeSet<K> {
    pub fn check_invariants(&self) -> DomainResult<()> {
        super::check_invariants(&self.root)
    }
}

impl<K> Clone for PatriciaTreeSet<K> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K> Default for PatriciaTreeSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for PatriciaTreeSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set()
            .entries(PatriciaIter::new(&self.root).map(|(key, _)| key))
            .finish()
    }
}

pub struct PatriciaSetIter<'a, K>(PatriciaIter<'a, K, ()>);

impl<'a, K> Iterator for PatriciaSetIter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.0.next().map(|(key, _)| key)
    }
}

impl<K: PatriciaKey> AbstractSet for PatriciaTreeSet<K> {
    type Element = K;
    type Iter<'a> = PatriciaSetIter<'a, K> where Self: 'a;

    const MUTABILITY: Mutability = Mutability::Immutable;

    fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn len(&self) -> usize {
        super::size(&self.root)
    }

    fn iter(&self) -> Self::Iter<'_> {
        PatriciaSetIter(PatriciaIter::new(&self.root))
    }

    fn contains(&self, elem: &K) -> bool {
        super::find(&self.root, elem.encode()).is_some()
    }

    fn insert(&mut self, elem: K) {
        self.root = super::update(&self.root, elem, |_| Some(()), &always);
    }

    fn remove(&mut self, elem: &K) {
        self.root = super::update(&self.root, elem.clone(), |_| None, &always);
    }

    fn filter<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&K) -> bool,
    {
        self.root = super::filter(&self.root, &mut |key: &K, _: &()| predicate(key));
    }

    fn is_subset(&self, other: &Self) -> bool {
        super::leq_bindings(&self.root, &other.root, &always)
    }

    fn equals(&self, other: &Self) -> bool {
        super::equals(&self.root, &other.root, &always)
    }

    fn union_with(&mut self, other: &Self) {
        self.root = super::union(&self.root, &other.root, &mut |_, _, _| Some(()), &always);
    }

    fn intersection_with(&mut self, other: &Self) {
        self.root = super::intersection(&self.root, &other.root, &mut |_, _, _| Some(()), &always);
    }

    fn difference_with(&mut self, other: &Self) {
        self.root = super::difference(&self.root, &other.root, &mut |_, _, _| None, &always);
    }

    fn reference_equals(&self, other: &Self) -> bool {
        super::same_tree(&self.root, &other.root)
    }

    fn erase_all_matching(&mut self, key_mask: u64) -> DomainResult<()> {
        self.filter(|key| key.encode() & key_mask == 0);
        Ok(())
    }
}

impl<K: PatriciaKey> FromIterator<K> for PatriciaTreeSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        for elem in iter {
            set.insert(elem);
        }
        set
    }
}

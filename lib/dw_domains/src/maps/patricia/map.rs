use super::{PatriciaIter, PatriciaKey, Tree};
use crate::errors::{DomainError, DomainResult};
use crate::kind::AbstractValueKind;
use crate::maps::{leq_by_kind, AbstractMap, Mutability, SimpleValue, ValueInterface};
use std::fmt;
use std::marker::PhantomData;

/// Persistent map over a Patricia tree. Copies are constant-time and share
/// all their nodes.
pub struct PatriciaTreeMap<K, V, VI = SimpleValue<V>> {
    root: Tree<K, V>,
    _interface: PhantomData<fn() -> VI>,
}

impl<K, V, VI> PatriciaTreeMap<K, V, VI> {
    pub fn new() -> Self {
        Self {
            root: None,
            _interface: PhantomData,
        }
    }

    pub(crate) fn raw_iter(&self) -> PatriciaIter<'_, K, V> {
        PatriciaIter::new(&self.root)
    }

    fn from_root(root: Tree<K, V>) -> Self {
        Self {
            root,
            _interface: PhantomData,
        }
    }
}

impl<K, V, VI> PatriciaTreeMap<K, V, VI>
where
    K: PatriciaKey,
    V: Clone + fmt::Debug,
    VI: ValueInterface<Value = V>,
{
    /// Verifies the tree shape and that no default value is stored.
    pub fn check_invariants(&self) -> DomainResult<()> {
        super::check_invariants(&self.root)?;
        match self.iter().find(|(_, value)| VI::is_default_value(value)) {
            Some((key, _)) => Err(DomainError::Internal(format!(
                "key {key:?} is explicitly bound to the default value"
            ))),
            None => Ok(()),
        }
    }

    fn non_default(value: V) -> Option<V> {
        (!VI::is_default_value(&value)).then_some(value)
    }
}

impl<K, V, VI> Clone for PatriciaTreeMap<K, V, VI> {
    fn clone(&self) -> Self {
        Self::from_root(self.root.clone())
    }
}

impl<K, V, VI> Default for PatriciaTreeMap<K, V, VI> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, VI> fmt::Debug for PatriciaTreeMap<K, V, VI> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(PatriciaIter::new(&self.root)).finish()
    }
}

impl<K, V, VI> AbstractMap for PatriciaTreeMap<K, V, VI>
where
    K: PatriciaKey,
    V: Clone + fmt::Debug,
    VI: ValueInterface<Value = V>,
{
    type Key = K;
    type Value = V;
    type ValueInterface = VI;
    type Iter<'a> = PatriciaIter<'a, K, V> where Self: 'a;

    const MUTABILITY: Mutability = Mutability::Immutable;

    fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn len(&self) -> usize {
        super::size(&self.root)
    }

    fn iter(&self) -> Self::Iter<'_> {
        PatriciaIter::new(&self.root)
    }

    fn get(&self, key: &K) -> Option<&V> {
        super::find(&self.root, key.encode()).map(|(_, value)| value)
    }

    fn insert_or_assign(&mut self, key: K, value: V) {
        let value = Self::non_default(value);
        self.root = super::update(&self.root, key, |_| value, &VI::equals);
    }

    fn remove(&mut self, key: &K) {
        self.root = super::update(&self.root, key.clone(), |_| None, &VI::equals);
    }

    fn update<F>(&mut self, key: K, op: F)
    where
        F: FnOnce(&V) -> V,
    {
        self.root = super::update(
            &self.root,
            key,
            |current| match current {
                Some(value) => Self::non_default(op(value)),
                None => Self::non_default(op(&VI::default_value())),
            },
            &VI::equals,
        );
    }

    fn filter<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&K, &V) -> bool,
    {
        self.root = super::filter(&self.root, &mut predicate);
    }

    fn transform<F>(&mut self, mut op: F) -> bool
    where
        F: FnMut(&V) -> V,
    {
        let root = super::transform(
            &self.root,
            &mut |value: &V| Self::non_default(op(value)),
            &VI::equals,
        );
        let changed = !super::same_tree(&self.root, &root);
        self.root = root;
        changed
    }

    fn union_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        self.root = super::union(
            &self.root,
            &other.root,
            &mut |_: &K, x: &V, y: &V| Self::non_default(combine(x, y)),
            &VI::equals,
        );
    }

    fn intersection_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        self.root = super::intersection(
            &self.root,
            &other.root,
            &mut |_: &K, x: &V, y: &V| Self::non_default(combine(x, y)),
            &VI::equals,
        );
    }

    fn difference_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        self.root = super::difference(
            &self.root,
            &other.root,
            &mut |_: &K, x: &V, y: &V| Self::non_default(combine(x, y)),
            &VI::equals,
        );
    }

    fn leq(&self, other: &Self) -> bool {
        match VI::DEFAULT_VALUE_KIND {
            AbstractValueKind::Top => super::leq_bindings(&other.root, &self.root, &|o, s| VI::leq(s, o)),
            AbstractValueKind::Bottom => super::leq_bindings(&self.root, &other.root, &VI::leq),
            AbstractValueKind::Value => leq_by_kind(self, other),
        }
    }

    fn equals(&self, other: &Self) -> bool {
        super::equals(&self.root, &other.root, &VI::equals)
    }

    fn reference_equals(&self, other: &Self) -> bool {
        super::same_tree(&self.root, &other.root)
    }

    fn erase_all_matching(&mut self, key_mask: u64) -> DomainResult<()> {
        self.filter(|key, _| key.encode() & key_mask == 0);
        Ok(())
    }
}

impl<K, V, VI> FromIterator<(K, V)> for PatriciaTreeMap<K, V, VI>
where
    K: PatriciaKey,
    V: Clone + fmt::Debug,
    VI: ValueInterface<Value = V>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert_or_assign(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstantDomain;
    use crate::maps::{BottomValueInterface, TopValueInterface};
    use std::collections::BTreeMap;

    type Map = PatriciaTreeMap<u32, u32>;

    #[test]
    fn test_default_values_are_not_stored() {
        let mut map: Map = [(1, 10), (2, 0), (3, 30)].into_iter().collect();
        assert_eq!(map.len(), 2);
        assert_eq!(map.at(&2), 0);
        map.insert_or_assign(1, 0);
        assert_eq!(map.len(), 1);
        map.update(3, |v| v - 30);
        assert!(map.is_empty());
        map.check_invariants().unwrap();
    }

    #[test]
    fn test_copies_are_independent() {
        let original: Map = (0..100).map(|i| (i, i + 1)).collect();
        let mut copy = original.clone();
        assert!(copy.reference_equals(&original));
        copy.insert_or_assign(5, 42);
        copy.remove(&6);
        assert_eq!(original.at(&5), 6);
        assert_eq!(original.at(&6), 7);
        assert_eq!(copy.at(&5), 42);
        assert_eq!(copy.get(&6), None);
        assert!(!copy.reference_equals(&original));
    }

    #[test]
    fn test_iteration_matches_a_btreemap() {
        let keys = [17u32, 3, 99, 1024, 5, 8, 65535, 4, 0];
        let map: Map = keys.iter().map(|&k| (k, k * 2 + 1)).collect();
        let reference: BTreeMap<u32, u32> = keys.iter().map(|&k| (k, k * 2 + 1)).collect();
        assert_eq!(
            map.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            reference.into_iter().collect::<Vec<_>>()
        );
        map.check_invariants().unwrap();
    }

    #[test]
    fn test_self_merges_preserve_identity() {
        let map: Map = (0..20).map(|i| (i * 3, i + 1)).collect();
        let mut joined = map.clone();
        joined.union_with(|x, _| *x, &map);
        assert!(joined.reference_equals(&map));
        let mut met = map.clone();
        met.intersection_with(|x, _| *x, &map);
        assert!(met.reference_equals(&map));
        let mut unchanged = map.clone();
        assert!(!unchanged.transform(|v| *v));
        assert!(unchanged.reference_equals(&map));
    }

    #[test]
    fn test_leq_depends_on_the_default_kind() {
        type TopMap = PatriciaTreeMap<u32, ConstantDomain<i32>, TopValueInterface<ConstantDomain<i32>>>;
        type BottomMap =
            PatriciaTreeMap<u32, ConstantDomain<i32>, BottomValueInterface<ConstantDomain<i32>>>;

        let small: TopMap = [(1, ConstantDomain::value(1)), (2, ConstantDomain::value(2))]
            .into_iter()
            .collect();
        let large: TopMap = [(1, ConstantDomain::value(1))].into_iter().collect();
        assert!(small.leq(&large));
        assert!(!large.leq(&small));

        let small: BottomMap = [(1, ConstantDomain::value(1))].into_iter().collect();
        let large: BottomMap = [(1, ConstantDomain::value(1)), (2, ConstantDomain::value(2))]
            .into_iter()
            .collect();
        assert!(small.leq(&large));
        assert!(!large.leq(&small));
    }

    #[test]
    fn test_erase_all_matching() {
        let mut map: Map = (1..=16).map(|i| (i, i)).collect();
        map.erase_all_matching(0b11).unwrap();
        assert_eq!(
            map.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            vec![4, 8, 12, 16]
        );
        map.check_invariants().unwrap();
    }
}

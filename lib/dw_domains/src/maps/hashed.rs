//! Mutable containers over the standard hash tables.

use crate::kind::AbstractValueKind;
use crate::maps::{leq_by_kind, AbstractMap, AbstractSet, Mutability, SimpleValue, ValueInterface};
use std::collections::{hash_map, hash_set, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

pub struct HashedMap<K, V, VI = SimpleValue<V>> {
    entries: HashMap<K, V>,
    _interface: PhantomData<fn() -> VI>,
}

impl<K, V, VI> HashedMap<K, V, VI> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            _interface: PhantomData,
        }
    }
}

impl<K: Clone, V: Clone, VI> Clone for HashedMap<K, V, VI> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            _interface: PhantomData,
        }
    }
}

impl<K, V, VI> Default for HashedMap<K, V, VI> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, VI> fmt::Debug for HashedMap<K, V, VI> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K, V, VI> AbstractMap for HashedMap<K, V, VI>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    VI: ValueInterface<Value = V>,
{
    type Key = K;
    type Value = V;
    type ValueInterface = VI;
    type Iter<'a> = hash_map::Iter<'a, K, V> where Self: 'a;

    const MUTABILITY: Mutability = Mutability::Mutable;

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.entries.iter()
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    fn insert_or_assign(&mut self, key: K, value: V) {
        if VI::is_default_value(&value) {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, value);
        }
    }

    fn remove(&mut self, key: &K) {
        self.entries.remove(key);
    }

    fn update<F>(&mut self, key: K, op: F)
    where
        F: FnOnce(&V) -> V,
    {
        let value = match self.entries.get(&key) {
            Some(current) => op(current),
            None => op(&VI::default_value()),
        };
        self.insert_or_assign(key, value);
    }

    fn filter<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&K, &V) -> bool,
    {
        self.entries.retain(|k, v| predicate(k, v));
    }

    fn transform<F>(&mut self, mut op: F) -> bool
    where
        F: FnMut(&V) -> V,
    {
        let mut changed = false;
        self.entries.retain(|_, value| {
            let new = op(value);
            if VI::is_default_value(&new) {
                changed = true;
                return false;
            }
            if !VI::equals(&new, value) {
                changed = true;
                *value = new;
            }
            true
        });
        changed
    }

    fn union_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        for (key, ov) in &other.entries {
            match self.entries.get(key) {
                Some(sv) => {
                    let combined = combine(sv, ov);
                    self.insert_or_assign(key.clone(), combined);
                }
                None => {
                    self.entries.insert(key.clone(), ov.clone());
                }
            }
        }
    }

    fn intersection_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        self.entries.retain(|key, sv| match other.entries.get(key) {
            Some(ov) => {
                let combined = combine(sv, ov);
                if VI::is_default_value(&combined) {
                    false
                } else {
                    *sv = combined;
                    true
                }
            }
            None => false,
        });
    }

    fn difference_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        self.entries.retain(|key, sv| match other.entries.get(key) {
            Some(ov) => {
                let combined = combine(sv, ov);
                if VI::is_default_value(&combined) {
                    false
                } else {
                    *sv = combined;
                    true
                }
            }
            None => true,
        });
    }

    fn leq(&self, other: &Self) -> bool {
        match VI::DEFAULT_VALUE_KIND {
            AbstractValueKind::Top if other.len() > self.len() => false,
            AbstractValueKind::Bottom if self.len() > other.len() => false,
            _ => leq_by_kind(self, other),
        }
    }

    fn equals(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(key, sv)| {
                other
                    .entries
                    .get(key)
                    .map_or(false, |ov| VI::equals(sv, ov))
            })
    }
}

impl<K, V, VI> FromIterator<(K, V)> for HashedMap<K, V, VI>
where
    K: Eq + Hash + Clone + fmt::Debug,
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

#[derive(Clone)]
pub struct HashedSet<T> {
    elements: HashSet<T>,
}

impl<T> HashedSet<T> {
    pub fn new() -> Self {
        Self {
            elements: HashSet::new(),
        }
    }
}

impl<T> Default for HashedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for HashedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.elements.iter()).finish()
    }
}

impl<T: Eq + Hash + Clone + fmt::Debug> AbstractSet for HashedSet<T> {
    type Element = T;
    type Iter<'a> = hash_set::Iter<'a, T> where Self: 'a;

    const MUTABILITY: Mutability = Mutability::Mutable;

    fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.elements.iter()
    }

    fn contains(&self, elem: &T) -> bool {
        self.elements.contains(elem)
    }

    fn insert(&mut self, elem: T) {
        self.elements.insert(elem);
    }

    fn remove(&mut self, elem: &T) {
        self.elements.remove(elem);
    }

    fn filter<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&T) -> bool,
    {
        self.elements.retain(|elem| predicate(elem));
    }

    fn is_subset(&self, other: &Self) -> bool {
        self.elements.is_subset(&other.elements)
    }

    fn equals(&self, other: &Self) -> bool {
        self.elements == other.elements
    }

    fn union_with(&mut self, other: &Self) {
        self.elements.extend(other.elements.iter().cloned());
    }

    fn intersection_with(&mut self, other: &Self) {
        self.elements.retain(|elem| other.elements.contains(elem));
    }

    fn difference_with(&mut self, other: &Self) {
        self.elements.retain(|elem| !other.elements.contains(elem));
    }
}

impl<T: Eq + Hash + Clone + fmt::Debug> FromIterator<T> for HashedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

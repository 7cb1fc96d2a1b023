//! Containers over sorted vectors. Lookups are logarithmic, updates linear;
//! they fit small maps and sets with cheap comparable keys.

use crate::kind::AbstractValueKind;
use crate::maps::{leq_by_kind, AbstractMap, AbstractSet, Mutability, SimpleValue, ValueInterface};
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::slice;

pub struct FlatMap<K, V, VI = SimpleValue<V>> {
    entries: Vec<(K, V)>,
    _interface: PhantomData<fn() -> VI>,
}

impl<K, V, VI> FlatMap<K, V, VI> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            _interface: PhantomData,
        }
    }

    pub(crate) fn entries_iter(&self) -> FlatMapIter<'_, K, V> {
        FlatMapIter(self.entries.iter())
    }
}

impl<K: Ord, V, VI> FlatMap<K, V, VI> {
    fn position(&self, key: &K) -> Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| k.cmp(key))
    }
}

impl<K: Clone, V: Clone, VI> Clone for FlatMap<K, V, VI> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            _interface: PhantomData,
        }
    }
}

impl<K, V, VI> Default for FlatMap<K, V, VI> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, VI> fmt::Debug for FlatMap<K, V, VI> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

pub struct FlatMapIter<'a, K, V>(slice::Iter<'a, (K, V)>);

impl<'a, K, V> Iterator for FlatMapIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k, v))
    }
}

/// Walks two sorted entry lists in lockstep.
fn merge_entries<K, V, F>(
    left: Vec<(K, V)>,
    right: &[(K, V)],
    mut on_both: F,
    keep_left: bool,
    keep_right: bool,
) -> Vec<(K, V)>
where
    K: Ord + Clone,
    V: Clone,
    F: FnMut(&V, &V) -> Option<V>,
{
    let mut merged = Vec::with_capacity(left.len().max(right.len()));
    let mut right = right.iter().peekable();
    for (key, value) in left {
        while let Some((rk, rv)) = right.next_if(|(rk, _)| *rk < key) {
            if keep_right {
                merged.push((rk.clone(), rv.clone()));
            }
        }
        match right.next_if(|(rk, _)| *rk == key) {
            Some((_, rv)) => {
                if let Some(combined) = on_both(&value, rv) {
                    merged.push((key, combined));
                }
            }
            None => {
                if keep_left {
                    merged.push((key, value));
                }
            }
        }
    }
    if keep_right {
        merged.extend(right.cloned());
    }
    merged
}

impl<K, V, VI> FlatMap<K, V, VI>
where
    K: Ord + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    VI: ValueInterface<Value = V>,
{
    fn non_default(value: V) -> Option<V> {
        (!VI::is_default_value(&value)).then_some(value)
    }
}

impl<K, V, VI> AbstractMap for FlatMap<K, V, VI>
where
    K: Ord + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    VI: ValueInterface<Value = V>,
{
    type Key = K;
    type Value = V;
    type ValueInterface = VI;
    type Iter<'a> = FlatMapIter<'a, K, V> where Self: 'a;

    const MUTABILITY: Mutability = Mutability::Mutable;

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn iter(&self) -> Self::Iter<'_> {
        FlatMapIter(self.entries.iter())
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.position(key).ok().map(|i| &self.entries[i].1)
    }

    fn insert_or_assign(&mut self, key: K, value: V) {
        if VI::is_default_value(&value) {
            self.remove(&key);
            return;
        }
        match self.position(&key) {
            Ok(i) => self.entries[i].1 = value,
            Err(i) => self.entries.insert(i, (key, value)),
        }
    }

    fn remove(&mut self, key: &K) {
        if let Ok(i) = self.position(key) {
            self.entries.remove(i);
        }
    }

    fn update<F>(&mut self, key: K, op: F)
    where
        F: FnOnce(&V) -> V,
    {
        let value = match self.get(&key) {
            Some(current) => op(current),
            None => op(&VI::default_value()),
        };
        self.insert_or_assign(key, value);
    }

    fn filter<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&K, &V) -> bool,
    {
        self.entries.retain(|(k, v)| predicate(k, v));
    }

    fn transform<F>(&mut self, mut op: F) -> bool
    where
        F: FnMut(&V) -> V,
    {
        let mut changed = false;
        self.entries.retain_mut(|(_, value)| {
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
        let entries = std::mem::take(&mut self.entries);
        self.entries = merge_entries(
            entries,
            &other.entries,
            |x, y| Self::non_default(combine(x, y)),
            true,
            true,
        );
    }

    fn intersection_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        let entries = std::mem::take(&mut self.entries);
        self.entries = merge_entries(
            entries,
            &other.entries,
            |x, y| Self::non_default(combine(x, y)),
            false,
            false,
        );
    }

    fn difference_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        let entries = std::mem::take(&mut self.entries);
        self.entries = merge_entries(
            entries,
            &other.entries,
            |x, y| Self::non_default(combine(x, y)),
            true,
            false,
        );
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
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((k0, v0), (k1, v1))| k0 == k1 && VI::equals(v0, v1))
    }
}

impl<K, V, VI> FromIterator<(K, V)> for FlatMap<K, V, VI>
where
    K: Ord + Clone + fmt::Debug,
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

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FlatSet<T> {
    elements: Vec<T>,
}

impl<T> FlatSet<T> {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

impl<T> Default for FlatSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for FlatSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.elements.iter()).finish()
    }
}

impl<T: Ord + Clone + fmt::Debug> AbstractSet for FlatSet<T> {
    type Element = T;
    type Iter<'a> = slice::Iter<'a, T> where Self: 'a;

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
        self.elements.binary_search(elem).is_ok()
    }

    fn insert(&mut self, elem: T) {
        if let Err(i) = self.elements.binary_search(&elem) {
            self.elements.insert(i, elem);
        }
    }

    fn remove(&mut self, elem: &T) {
        if let Ok(i) = self.elements.binary_search(elem) {
            self.elements.remove(i);
        }
    }

    fn filter<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&T) -> bool,
    {
        self.elements.retain(|elem| predicate(elem));
    }

    fn is_subset(&self, other: &Self) -> bool {
        if self.len() > other.len() {
            return false;
        }
        let mut others = other.elements.iter();
        'outer: for elem in &self.elements {
            for candidate in others.by_ref() {
                match candidate.cmp(elem) {
                    Ordering::Less => continue,
                    Ordering::Equal => continue 'outer,
                    Ordering::Greater => return false,
                }
            }
            return false;
        }
        true
    }

    fn equals(&self, other: &Self) -> bool {
        self.elements == other.elements
    }

    fn union_with(&mut self, other: &Self) {
        let elements = std::mem::take(&mut self.elements);
        self.elements = merge_set(elements, &other.elements, true, true, true);
    }

    fn intersection_with(&mut self, other: &Self) {
        let elements = std::mem::take(&mut self.elements);
        self.elements = merge_set(elements, &other.elements, false, true, false);
    }

    fn difference_with(&mut self, other: &Self) {
        let elements = std::mem::take(&mut self.elements);
        self.elements = merge_set(elements, &other.elements, true, false, false);
    }
}

fn merge_set<T: Ord + Clone>(
    left: Vec<T>,
    right: &[T],
    keep_left: bool,
    keep_both: bool,
    keep_right: bool,
) -> Vec<T> {
    let mut merged = Vec::with_capacity(left.len().max(right.len()));
    let mut right = right.iter().peekable();
    for elem in left {
        while let Some(r) = right.next_if(|r| **r < elem) {
            if keep_right {
                merged.push(r.clone());
            }
        }
        let in_both = right.next_if(|r| **r == elem).is_some();
        if (in_both && keep_both) || (!in_both && keep_left) {
            merged.push(elem);
        }
    }
    if keep_right {
        merged.extend(right.cloned());
    }
    merged
}

impl<T: Ord + Clone + fmt::Debug> FromIterator<T> for FlatSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut elements: Vec<T> = iter.into_iter().collect();
        elements.sort();
        elements.dedup();
        Self { elements }
    }
}

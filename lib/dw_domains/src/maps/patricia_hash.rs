//! Patricia tree maps for keys that have no integer encoding: keys are
//! bucketed by hash, each bucket being a small sorted map.

use crate::kind::AbstractValueKind;
use crate::maps::flat::{FlatMap, FlatMapIter};
use crate::maps::patricia::{PatriciaIter, PatriciaTreeMap};
use crate::maps::{AbstractMap, Mutability, SimpleValue, ValueInterface};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Buckets are never empty, and compare like the maps they hold.
pub struct BucketInterface<K, V, VI>(PhantomData<fn() -> (K, V, VI)>);

impl<K, V, VI> ValueInterface for BucketInterface<K, V, VI>
where
    K: Ord + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    VI: ValueInterface<Value = V>,
{
    type Value = FlatMap<K, V, VI>;

    const DEFAULT_VALUE_KIND: AbstractValueKind = VI::DEFAULT_VALUE_KIND;

    fn default_value() -> Self::Value {
        FlatMap::new()
    }

    fn is_default_value(bucket: &Self::Value) -> bool {
        bucket.is_empty()
    }

    fn equals(x: &Self::Value, y: &Self::Value) -> bool {
        x.equals(y)
    }

    fn leq(x: &Self::Value, y: &Self::Value) -> bool {
        x.leq(y)
    }
}

type Buckets<K, V, VI> = PatriciaTreeMap<u64, FlatMap<K, V, VI>, BucketInterface<K, V, VI>>;

pub struct PatriciaTreeHashMap<K, V, VI = SimpleValue<V>> {
    buckets: Buckets<K, V, VI>,
}

fn hash_key<K: Hash>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

impl<K, V, VI> PatriciaTreeHashMap<K, V, VI> {
    pub fn new() -> Self {
        Self {
            buckets: PatriciaTreeMap::new(),
        }
    }
}

impl<K, V, VI> Clone for PatriciaTreeHashMap<K, V, VI> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
        }
    }
}

impl<K, V, VI> Default for PatriciaTreeHashMap<K, V, VI> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, VI> fmt::Debug for PatriciaTreeHashMap<K, V, VI> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(PatriciaHashIter {
                buckets: self.buckets.raw_iter(),
                current: None,
            })
            .finish()
    }
}

pub struct PatriciaHashIter<'a, K, V, VI> {
    buckets: PatriciaIter<'a, u64, FlatMap<K, V, VI>>,
    current: Option<FlatMapIter<'a, K, V>>,
}

impl<'a, K, V, VI> Iterator for PatriciaHashIter<'a, K, V, VI> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(binding) = self.current.as_mut().and_then(Iterator::next) {
                return Some(binding);
            }
            let (_, bucket) = self.buckets.next()?;
            self.current = Some(bucket.entries_iter());
        }
    }
}

impl<K, V, VI> AbstractMap for PatriciaTreeHashMap<K, V, VI>
where
    K: Hash + Ord + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    VI: ValueInterface<Value = V>,
{
    type Key = K;
    type Value = V;
    type ValueInterface = VI;
    type Iter<'a> = PatriciaHashIter<'a, K, V, VI> where Self: 'a;

    const MUTABILITY: Mutability = Mutability::Immutable;

    fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn len(&self) -> usize {
        self.buckets.iter().map(|(_, bucket)| bucket.len()).sum()
    }

    fn iter(&self) -> Self::Iter<'_> {
        PatriciaHashIter {
            buckets: self.buckets.iter(),
            current: None,
        }
    }

    fn get(&self, key: &K) -> Option<&V> {
        self.buckets.get(&hash_key(key)).and_then(|bucket| bucket.get(key))
    }

    fn insert_or_assign(&mut self, key: K, value: V) {
        self.buckets.update(hash_key(&key), |bucket| {
            let mut bucket = bucket.clone();
            bucket.insert_or_assign(key, value);
            bucket
        });
    }

    fn remove(&mut self, key: &K) {
        self.buckets.update(hash_key(key), |bucket| {
            let mut bucket = bucket.clone();
            bucket.remove(key);
            bucket
        });
    }

    fn update<F>(&mut self, key: K, op: F)
    where
        F: FnOnce(&V) -> V,
    {
        self.buckets.update(hash_key(&key), |bucket| {
            let mut bucket = bucket.clone();
            bucket.update(key, op);
            bucket
        });
    }

    fn filter<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&K, &V) -> bool,
    {
        self.buckets.transform(|bucket| {
            let mut bucket = bucket.clone();
            bucket.filter(&mut predicate);
            bucket
        });
    }

    fn transform<F>(&mut self, mut op: F) -> bool
    where
        F: FnMut(&V) -> V,
    {
        self.buckets.transform(|bucket| {
            let mut bucket = bucket.clone();
            bucket.transform(&mut op);
            bucket
        })
    }

    fn union_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        self.buckets.union_with(
            |x, y| {
                let mut bucket = x.clone();
                bucket.union_with(&mut combine, y);
                bucket
            },
            &other.buckets,
        );
    }

    fn intersection_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        self.buckets.intersection_with(
            |x, y| {
                let mut bucket = x.clone();
                bucket.intersection_with(&mut combine, y);
                bucket
            },
            &other.buckets,
        );
    }

    fn difference_with<F>(&mut self, mut combine: F, other: &Self)
    where
        F: FnMut(&V, &V) -> V,
    {
        self.buckets.difference_with(
            |x, y| {
                let mut bucket = x.clone();
                bucket.difference_with(&mut combine, y);
                bucket
            },
            &other.buckets,
        );
    }

    fn leq(&self, other: &Self) -> bool {
        self.buckets.leq(&other.buckets)
    }

    fn equals(&self, other: &Self) -> bool {
        self.buckets.equals(&other.buckets)
    }

    fn reference_equals(&self, other: &Self) -> bool {
        self.buckets.reference_equals(&other.buckets)
    }
}

impl<K, V, VI> FromIterator<(K, V)> for PatriciaTreeHashMap<K, V, VI>
where
    K: Hash + Ord + Clone + fmt::Debug,
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

//! Abstract partitions: maps from labels to abstract values where unbound
//! labels are implicitly mapped to bottom.
//!
//! Unlike environments, a bottom value for one label does not make the whole
//! partition bottom. The empty partition is bottom, and top is a distinct
//! element that absorbs every binding.

use crate::domain::{AbstractDomain, AbstractValue};
use crate::errors::DomainResult;
use crate::kind::AbstractValueKind;
use crate::maps::flat::FlatMap;
use crate::maps::hashed::HashedMap;
use crate::maps::patricia::PatriciaTreeMap;
use crate::maps::{AbstractMap, BottomValueInterface};
use crate::scaffolding::AbstractDomainScaffolding;

#[derive(Debug, Clone, Default)]
pub struct PartitionValue<M>(M);

impl<M> AbstractValue for PartitionValue<M>
where
    M: AbstractMap,
    M::Value: AbstractDomain,
{
    fn clear(&mut self) {
        self.0.clear();
    }

    fn kind(&self) -> AbstractValueKind {
        if self.0.is_empty() {
            AbstractValueKind::Bottom
        } else {
            AbstractValueKind::Value
        }
    }

    fn leq(&self, other: &Self) -> bool {
        self.0.leq(&other.0)
    }

    fn equals(&self, other: &Self) -> bool {
        self.0.equals(&other.0)
    }

    fn join_with(&mut self, other: &Self) -> AbstractValueKind {
        self.0.union_with(|x, y| x.join(y), &other.0);
        self.kind()
    }

    fn widen_with(&mut self, other: &Self) -> AbstractValueKind {
        self.0.union_with(|x, y| x.widen(y), &other.0);
        self.kind()
    }

    fn meet_with(&mut self, other: &Self) -> AbstractValueKind {
        self.0.intersection_with(|x, y| x.meet(y), &other.0);
        self.kind()
    }

    fn narrow_with(&mut self, other: &Self) -> AbstractValueKind {
        self.0.intersection_with(|x, y| x.narrow(y), &other.0);
        self.kind()
    }
}

/// Partition over any map whose implicit default value is bottom.
pub type AbstractPartition<M> = AbstractDomainScaffolding<PartitionValue<M>>;

pub type PatriciaTreeMapAbstractPartition<K, D> =
    AbstractPartition<PatriciaTreeMap<K, D, BottomValueInterface<D>>>;
pub type HashedAbstractPartition<K, D> = AbstractPartition<HashedMap<K, D, BottomValueInterface<D>>>;
pub type FlatMapAbstractPartition<K, D> = AbstractPartition<FlatMap<K, D, BottomValueInterface<D>>>;

impl<M> AbstractPartition<M>
where
    M: AbstractMap,
    M::Value: AbstractDomain,
{
    pub fn from_bindings<I>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (M::Key, M::Value)>,
    {
        let mut partition = Self::Bottom;
        for (label, value) in bindings {
            partition.set(label, value);
        }
        partition
    }

    /// Explicit bindings of a proper partition.
    pub fn bindings(&self) -> DomainResult<&M> {
        self.get_value().map(|value| &value.0)
    }

    /// Number of explicit bindings, zero for bottom and top.
    pub fn size(&self) -> usize {
        match self {
            Self::Value(value) => value.0.len(),
            _ => 0,
        }
    }

    pub fn get(&self, label: &M::Key) -> M::Value {
        match self {
            Self::Bottom => M::Value::bottom(),
            Self::Value(value) => value.0.get(label).cloned().unwrap_or_else(M::Value::bottom),
            Self::Top => M::Value::top(),
        }
    }

    /// Binds `label` to `value`. Has no effect on top.
    pub fn set(&mut self, label: M::Key, value: M::Value) {
        match self {
            Self::Top => (),
            Self::Value(partition) => {
                partition.0.insert_or_assign(label, value);
                self.normalize();
            }
            Self::Bottom => {
                if !value.is_bottom() {
                    let mut map = M::default();
                    map.insert_or_assign(label, value);
                    *self = Self::Value(PartitionValue(map));
                }
            }
        }
    }

    pub fn update<F>(&mut self, label: M::Key, op: F)
    where
        F: FnOnce(&M::Value) -> M::Value,
    {
        if self.is_top() {
            return;
        }
        let value = op(&self.get(&label));
        self.set(label, value);
    }

    /// Applies `op` to every explicit binding. Returns whether the partition
    /// changed.
    pub fn transform<F>(&mut self, op: F) -> bool
    where
        F: FnMut(&M::Value) -> M::Value,
    {
        let changed = match self {
            Self::Value(partition) => partition.0.transform(op),
            _ => false,
        };
        self.normalize();
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstantDomain;

    type Partition = PatriciaTreeMapAbstractPartition<u32, ConstantDomain<i32>>;

    #[test]
    fn test_unbound_labels_are_bottom() {
        let mut partition = Partition::bottom();
        assert!(partition.get(&1).is_bottom());
        partition.set(1, ConstantDomain::value(1));
        partition.set(2, ConstantDomain::bottom());
        assert_eq!(partition.size(), 1);
        assert!(!partition.is_bottom());
        partition.set(1, ConstantDomain::bottom());
        assert!(partition.is_bottom());
    }

    #[test]
    fn test_top_absorbs_bindings() {
        let mut partition = Partition::top();
        partition.set(1, ConstantDomain::value(1));
        assert!(partition.is_top());
        assert!(partition.get(&1).is_top());
        assert!(partition.bindings().is_err());
    }

    #[test]
    fn test_join_and_meet() {
        let a = Partition::from_bindings([(1, ConstantDomain::value(1)), (2, ConstantDomain::value(2))]);
        let b = Partition::from_bindings([(2, ConstantDomain::value(3)), (4, ConstantDomain::value(4))]);

        let joined = a.join(&b);
        assert_eq!(joined.get(&1).get_constant(), Some(&1));
        assert!(joined.get(&2).is_top());
        assert_eq!(joined.get(&4).get_constant(), Some(&4));
        assert!(a.leq(&joined) && b.leq(&joined));
        assert!(!joined.leq(&a));

        let met = a.meet(&b);
        assert!(met.is_bottom());
        let met = a.meet(&Partition::from_bindings([(1, ConstantDomain::top())]));
        assert_eq!(met.size(), 1);
        assert_eq!(met.get(&1).get_constant(), Some(&1));
    }

    #[test]
    fn test_transform() {
        let mut partition = HashedAbstractPartition::<&str, ConstantDomain<i32>>::from_bindings([
            ("a", ConstantDomain::value(1)),
            ("b", ConstantDomain::value(2)),
        ]);
        assert!(partition.transform(|v| v.meet(&ConstantDomain::value(2))));
        assert_eq!(partition.size(), 1);
        assert!(!partition.transform(|v| v.clone()));
        assert!(partition.transform(|_| ConstantDomain::bottom()));
        assert!(partition.is_bottom());
    }
}

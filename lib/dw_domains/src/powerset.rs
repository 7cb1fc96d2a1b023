//! Powerset domains: sets of elements ordered by inclusion.
//!
//! The empty set is a proper element, distinct from bottom; top stands for
//! the set of all elements, which is never materialized.

use crate::domain::AbstractValue;
use crate::errors::DomainResult;
use crate::kind::AbstractValueKind;
use crate::maps::flat::FlatSet;
use crate::maps::hashed::HashedSet;
use crate::maps::patricia::PatriciaTreeSet;
use crate::maps::sparse::SparseSet;
use crate::maps::AbstractSet;
use crate::scaffolding::AbstractDomainScaffolding;

#[derive(Debug, Clone, Default)]
pub struct PowersetValue<S>(S);

impl<S: AbstractSet> AbstractValue for PowersetValue<S> {
    fn clear(&mut self) {
        self.0.clear();
    }

    fn kind(&self) -> AbstractValueKind {
        AbstractValueKind::Value
    }

    fn leq(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    fn equals(&self, other: &Self) -> bool {
        self.0.equals(&other.0)
    }

    fn join_with(&mut self, other: &Self) -> AbstractValueKind {
        self.0.union_with(&other.0);
        AbstractValueKind::Value
    }

    fn widen_with(&mut self, other: &Self) -> AbstractValueKind {
        self.join_with(other)
    }

    fn meet_with(&mut self, other: &Self) -> AbstractValueKind {
        self.0.intersection_with(&other.0);
        AbstractValueKind::Value
    }

    fn narrow_with(&mut self, other: &Self) -> AbstractValueKind {
        self.meet_with(other)
    }
}

pub type PowersetDomain<S> = AbstractDomainScaffolding<PowersetValue<S>>;

pub type HashedSetDomain<T> = PowersetDomain<HashedSet<T>>;
pub type FlatSetDomain<T> = PowersetDomain<FlatSet<T>>;
pub type PatriciaTreeSetDomain<K> = PowersetDomain<PatriciaTreeSet<K>>;
pub type SparseSetDomain = PowersetDomain<SparseSet>;

impl<S: AbstractSet> PowersetDomain<S> {
    /// The empty set, which is not bottom.
    pub fn empty() -> Self {
        Self::Value(PowersetValue(S::default()))
    }

    pub fn from_elements<I: IntoIterator<Item = S::Element>>(elements: I) -> Self {
        let mut set = S::default();
        for elem in elements {
            set.insert(elem);
        }
        Self::Value(PowersetValue(set))
    }

    /// Adds an element. Bottom and top are left unchanged.
    pub fn add(&mut self, elem: S::Element) {
        if let Self::Value(value) = self {
            value.0.insert(elem);
        }
    }

    pub fn add_elements<I: IntoIterator<Item = S::Element>>(&mut self, elements: I) {
        if let Self::Value(value) = self {
            for elem in elements {
                value.0.insert(elem);
            }
        }
    }

    /// Removes an element. Bottom and top are left unchanged.
    pub fn remove(&mut self, elem: &S::Element) {
        if let Self::Value(value) = self {
            value.0.remove(elem);
        }
    }

    pub fn remove_elements<'a, I>(&mut self, elements: I)
    where
        I: IntoIterator<Item = &'a S::Element>,
        S::Element: 'a,
    {
        if let Self::Value(value) = self {
            for elem in elements {
                value.0.remove(elem);
            }
        }
    }

    pub fn contains(&self, elem: &S::Element) -> bool {
        match self {
            Self::Bottom => false,
            Self::Value(value) => value.0.contains(elem),
            Self::Top => true,
        }
    }

    /// The underlying set of a proper element.
    pub fn elements(&self) -> DomainResult<&S> {
        self.get_value().map(|value| &value.0)
    }

    pub fn size(&self) -> DomainResult<usize> {
        self.elements().map(AbstractSet::len)
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        crate::domain::AbstractDomain::leq(self, other)
    }
}

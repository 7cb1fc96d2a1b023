//! Simultaneous over- and under-approximation of a set.
//!
//! A proper element is a pair `(over, under)` with `under ⊆ over`: the
//! concrete set certainly contains `under` and is certainly contained in
//! `over`.

use crate::domain::AbstractValue;
use crate::errors::{DomainError, DomainResult};
use crate::kind::AbstractValueKind;
use crate::maps::patricia::PatriciaTreeSet;
use crate::maps::hashed::HashedSet;
use crate::maps::AbstractSet;
use crate::scaffolding::AbstractDomainScaffolding;

#[derive(Debug, Clone, Default)]
pub struct OverUnderSetValue<S> {
    over: S,
    under: S,
}

impl<S: AbstractSet> AbstractValue for OverUnderSetValue<S> {
    fn clear(&mut self) {
        self.over.clear();
        self.under.clear();
    }

    fn kind(&self) -> AbstractValueKind {
        AbstractValueKind::Value
    }

    fn leq(&self, other: &Self) -> bool {
        self.over.is_subset(&other.over) && other.under.is_subset(&self.under)
    }

    fn equals(&self, other: &Self) -> bool {
        self.over.equals(&other.over) && self.under.equals(&other.under)
    }

    fn join_with(&mut self, other: &Self) -> AbstractValueKind {
        self.over.union_with(&other.over);
        self.under.intersection_with(&other.under);
        AbstractValueKind::Value
    }

    fn widen_with(&mut self, other: &Self) -> AbstractValueKind {
        self.join_with(other)
    }

    fn meet_with(&mut self, other: &Self) -> AbstractValueKind {
        self.over.intersection_with(&other.over);
        self.under.union_with(&other.under);
        if self.under.is_subset(&self.over) {
            AbstractValueKind::Value
        } else {
            AbstractValueKind::Bottom
        }
    }

    fn narrow_with(&mut self, other: &Self) -> AbstractValueKind {
        self.meet_with(other)
    }
}

pub type OverUnderSetDomain<S> = AbstractDomainScaffolding<OverUnderSetValue<S>>;

pub type PatriciaTreeOverUnderSetDomain<K> = OverUnderSetDomain<PatriciaTreeSet<K>>;
pub type HashedOverUnderSetDomain<T> = OverUnderSetDomain<HashedSet<T>>;

impl<S: AbstractSet> OverUnderSetDomain<S> {
    /// Both approximations empty: the concrete set is known to be empty.
    pub fn empty() -> Self {
        Self::Value(OverUnderSetValue::default())
    }

    pub fn from_approximations(over: S, under: S) -> DomainResult<Self> {
        if !under.is_subset(&over) {
            return Err(DomainError::invalid_argument(
                "under",
                "the under-approximation is not included in the over-approximation",
            ));
        }
        Ok(Self::Value(OverUnderSetValue { over, under }))
    }

    /// Records that the element may belong to the set.
    pub fn add_over(&mut self, elem: S::Element) {
        if let Self::Value(value) = self {
            value.over.insert(elem);
        }
    }

    /// Records that the element certainly belongs to the set.
    pub fn add_under(&mut self, elem: S::Element) {
        if let Self::Value(value) = self {
            value.over.insert(elem.clone());
            value.under.insert(elem);
        }
    }

    pub fn over(&self) -> DomainResult<&S> {
        self.get_value().map(|value| &value.over)
    }

    pub fn under(&self) -> DomainResult<&S> {
        self.get_value().map(|value| &value.under)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AbstractDomain;

    type Domain = PatriciaTreeOverUnderSetDomain<u32>;

    fn set(elements: &[u32]) -> PatriciaTreeSet<u32> {
        elements.iter().copied().collect()
    }

    #[test]
    fn test_join_keeps_certain_elements_of_both_sides() {
        let mut a = Domain::empty();
        a.add_under(1);
        a.add_over(2);
        let mut b = Domain::empty();
        b.add_under(1);
        b.add_under(3);

        let joined = a.join(&b);
        assert!(joined.over().unwrap().equals(&set(&[1, 2, 3])));
        assert!(joined.under().unwrap().equals(&set(&[1])));
        assert!(a.leq(&joined) && b.leq(&joined));
    }

    #[test]
    fn test_meet_detects_contradictions() {
        let a = Domain::from_approximations(set(&[1, 2]), set(&[1])).unwrap();
        let b = Domain::from_approximations(set(&[1, 3]), set(&[3])).unwrap();
        assert!(a.meet(&b).is_bottom());

        let c = Domain::from_approximations(set(&[1, 2, 3]), set(&[2])).unwrap();
        let met = a.meet(&c);
        assert!(met.over().unwrap().equals(&set(&[1, 2])));
        assert!(met.under().unwrap().equals(&set(&[1, 2])));

        assert!(Domain::from_approximations(set(&[1]), set(&[2])).is_err());
    }
}

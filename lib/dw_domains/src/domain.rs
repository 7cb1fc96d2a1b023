//! Abstract domain and abstract value interfaces.
//!
//! An [`AbstractDomain`] is a lattice equipped with widening and narrowing
//! operators. Most domains are built by wrapping an [`AbstractValue`], which
//! only describes the proper (non-extremal) elements of the lattice, into an
//! [`AbstractDomainScaffolding`](crate::scaffolding::AbstractDomainScaffolding)
//! that takes care of the bottom and top elements.

use crate::kind::AbstractValueKind;
use std::fmt;

pub trait AbstractDomain: Clone + fmt::Debug {
    /// The least element of the lattice.
    fn bottom() -> Self;

    /// The greatest element of the lattice.
    fn top() -> Self;

    fn is_bottom(&self) -> bool;

    fn is_top(&self) -> bool;

    fn is_value(&self) -> bool {
        !self.is_bottom() && !self.is_top()
    }

    fn kind(&self) -> AbstractValueKind {
        if self.is_bottom() {
            AbstractValueKind::Bottom
        } else if self.is_top() {
            AbstractValueKind::Top
        } else {
            AbstractValueKind::Value
        }
    }

    fn set_to_bottom(&mut self) {
        *self = Self::bottom();
    }

    fn set_to_top(&mut self) {
        *self = Self::top();
    }

    /// Partial order of the lattice.
    fn leq(&self, other: &Self) -> bool;

    /// Equality in the lattice sense, which can be coarser than structural
    /// equality.
    fn equals(&self, other: &Self) -> bool {
        self.leq(other) && other.leq(self)
    }

    fn join_with(&mut self, other: &Self);

    fn widen_with(&mut self, other: &Self);

    fn meet_with(&mut self, other: &Self);

    fn narrow_with(&mut self, other: &Self);

    #[must_use]
    fn join(&self, other: &Self) -> Self {
        let mut res = self.clone();
        res.join_with(other);
        res
    }

    #[must_use]
    fn widen(&self, other: &Self) -> Self {
        let mut res = self.clone();
        res.widen_with(other);
        res
    }

    #[must_use]
    fn meet(&self, other: &Self) -> Self {
        let mut res = self.clone();
        res.meet_with(other);
        res
    }

    #[must_use]
    fn narrow(&self, other: &Self) -> Self {
        let mut res = self.clone();
        res.narrow_with(other);
        res
    }
}

/// Content of a proper element of a scaffolded domain.
///
/// Binary operations update `self` in place and report the kind of the
/// result, so that the enclosing scaffolding can collapse it to one of the
/// extremal elements when needed.
pub trait AbstractValue: Clone + fmt::Debug {
    /// Resets the content to its initial state.
    fn clear(&mut self);

    fn kind(&self) -> AbstractValueKind;

    fn leq(&self, other: &Self) -> bool;

    fn equals(&self, other: &Self) -> bool;

    fn join_with(&mut self, other: &Self) -> AbstractValueKind;

    fn widen_with(&mut self, other: &Self) -> AbstractValueKind;

    fn meet_with(&mut self, other: &Self) -> AbstractValueKind;

    fn narrow_with(&mut self, other: &Self) -> AbstractValueKind;
}

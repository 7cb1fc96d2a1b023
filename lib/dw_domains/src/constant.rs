//! Flat lattice of constants.

use crate::domain::AbstractValue;
use crate::kind::AbstractValueKind;
use crate::scaffolding::AbstractDomainScaffolding;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstantValue<T>(T);

impl<T> ConstantValue<T> {
    pub fn get(&self) -> &T {
        &self.0
    }
}

impl<T: Clone + fmt::Debug + PartialEq> AbstractValue for ConstantValue<T> {
    fn clear(&mut self) {}

    fn kind(&self) -> AbstractValueKind {
        AbstractValueKind::Value
    }

    fn leq(&self, other: &Self) -> bool {
        self.0 == other.0
    }

    fn equals(&self, other: &Self) -> bool {
        self.0 == other.0
    }

    fn join_with(&mut self, other: &Self) -> AbstractValueKind {
        if self.0 == other.0 {
            AbstractValueKind::Value
        } else {
            AbstractValueKind::Top
        }
    }

    fn widen_with(&mut self, other: &Self) -> AbstractValueKind {
        self.join_with(other)
    }

    fn meet_with(&mut self, other: &Self) -> AbstractValueKind {
        if self.0 == other.0 {
            AbstractValueKind::Value
        } else {
            AbstractValueKind::Bottom
        }
    }

    fn narrow_with(&mut self, other: &Self) -> AbstractValueKind {
        self.meet_with(other)
    }
}

impl<T: fmt::Display> fmt::Display for ConstantValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Either no value, exactly one known value, or any value.
pub type ConstantDomain<T> = AbstractDomainScaffolding<ConstantValue<T>>;

impl<T: Clone + fmt::Debug + PartialEq> ConstantDomain<T> {
    pub fn value(constant: T) -> Self {
        Self::Value(ConstantValue(constant))
    }

    /// The constant held by a proper element.
    pub fn get_constant(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value.get()),
            _ => None,
        }
    }
}

//! Generic construction of a domain from an abstract value.

use crate::domain::{AbstractDomain, AbstractValue};
use crate::errors::{DomainError, DomainResult};
use crate::kind::AbstractValueKind;
use std::fmt;

/// Lifts an [`AbstractValue`] into a full [`AbstractDomain`] by adding
/// dedicated bottom and top elements.
///
/// The `Value` variant never holds a value whose own kind is extremal: every
/// operation reports the kind of its result and the scaffolding collapses it
/// to `Bottom` or `Top` accordingly.
#[derive(Debug, Clone)]
pub enum AbstractDomainScaffolding<V> {
    Bottom,
    Value(V),
    Top,
}

impl<V: AbstractValue> AbstractDomainScaffolding<V> {
    /// Wraps a value, normalizing it if the value reports an extremal kind.
    pub fn new(value: V) -> Self {
        match value.kind() {
            AbstractValueKind::Bottom => Self::Bottom,
            AbstractValueKind::Top => Self::Top,
            AbstractValueKind::Value => Self::Value(value),
        }
    }

    /// Builds one of the extremal elements. A `Value` kind carries no content
    /// and is therefore rejected.
    pub fn from_kind(kind: AbstractValueKind) -> DomainResult<Self> {
        match kind {
            AbstractValueKind::Bottom => Ok(Self::Bottom),
            AbstractValueKind::Top => Ok(Self::Top),
            AbstractValueKind::Value => Err(DomainError::invalid_argument(
                "kind",
                "cannot build a proper element without content",
            )),
        }
    }

    pub fn get_value(&self) -> DomainResult<&V> {
        match self {
            Self::Value(value) => Ok(value),
            _ => Err(DomainError::InvalidAbstractValue {
                expected: AbstractValueKind::Value,
                actual: self.kind(),
            }),
        }
    }

    pub fn get_value_mut(&mut self) -> DomainResult<&mut V> {
        let actual = self.kind();
        match self {
            Self::Value(value) => Ok(value),
            _ => Err(DomainError::InvalidAbstractValue {
                expected: AbstractValueKind::Value,
                actual,
            }),
        }
    }

    /// Collapses the element if its content reports an extremal kind. Must be
    /// called after mutating the content through [`Self::get_value_mut`].
    pub fn normalize(&mut self) {
        self.update_value(|value| value.kind());
    }

    /// Applies `op` to the content (if any) and normalizes according to the
    /// kind it returns.
    pub(crate) fn update_value<F>(&mut self, op: F)
    where
        F: FnOnce(&mut V) -> AbstractValueKind,
    {
        if let Self::Value(value) = self {
            match op(value) {
                AbstractValueKind::Bottom => *self = Self::Bottom,
                AbstractValueKind::Top => *self = Self::Top,
                AbstractValueKind::Value => (),
            }
        }
    }
}

impl<V: AbstractValue> AbstractDomain for AbstractDomainScaffolding<V> {
    fn bottom() -> Self {
        Self::Bottom
    }

    fn top() -> Self {
        Self::Top
    }

    fn is_bottom(&self) -> bool {
        matches!(self, Self::Bottom)
    }

    fn is_top(&self) -> bool {
        matches!(self, Self::Top)
    }

    fn kind(&self) -> AbstractValueKind {
        match self {
            Self::Bottom => AbstractValueKind::Bottom,
            Self::Value(_) => AbstractValueKind::Value,
            Self::Top => AbstractValueKind::Top,
        }
    }

    fn leq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bottom, _) => true,
            (_, Self::Bottom) => false,
            (_, Self::Top) => true,
            (Self::Top, _) => false,
            (Self::Value(v1), Self::Value(v2)) => v1.leq(v2),
        }
    }

    fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bottom, Self::Bottom) | (Self::Top, Self::Top) => true,
            (Self::Value(v1), Self::Value(v2)) => v1.equals(v2),
            _ => false,
        }
    }

    fn join_with(&mut self, other: &Self) {
        match (self.kind(), other) {
            (_, Self::Bottom) | (AbstractValueKind::Top, _) => (),
            (AbstractValueKind::Bottom, _) | (_, Self::Top) => *self = other.clone(),
            (AbstractValueKind::Value, Self::Value(v)) => self.update_value(|value| value.join_with(v)),
        }
    }

    fn widen_with(&mut self, other: &Self) {
        match (self.kind(), other) {
            (_, Self::Bottom) | (AbstractValueKind::Top, _) => (),
            (AbstractValueKind::Bottom, _) | (_, Self::Top) => *self = other.clone(),
            (AbstractValueKind::Value, Self::Value(v)) => self.update_value(|value| value.widen_with(v)),
        }
    }

    fn meet_with(&mut self, other: &Self) {
        match (self.kind(), other) {
            (_, Self::Top) | (AbstractValueKind::Bottom, _) => (),
            (AbstractValueKind::Top, _) | (_, Self::Bottom) => *self = other.clone(),
            (AbstractValueKind::Value, Self::Value(v)) => self.update_value(|value| value.meet_with(v)),
        }
    }

    fn narrow_with(&mut self, other: &Self) {
        match (self.kind(), other) {
            (_, Self::Top) | (AbstractValueKind::Bottom, _) => (),
            (AbstractValueKind::Top, _) | (_, Self::Bottom) => *self = other.clone(),
            (AbstractValueKind::Value, Self::Value(v)) => self.update_value(|value| value.narrow_with(v)),
        }
    }
}

impl<V: AbstractValue> PartialEq for AbstractDomainScaffolding<V> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<V: AbstractValue> Eq for AbstractDomainScaffolding<V> {}

impl<V: fmt::Display> fmt::Display for AbstractDomainScaffolding<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bottom => write!(f, "_|_"),
            Self::Value(value) => write!(f, "{value}"),
            Self::Top => write!(f, "T"),
        }
    }
}

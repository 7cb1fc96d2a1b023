//! Map and set containers backing environments, partitions and powersets.
//!
//! All containers share the same contracts, expressed by [`AbstractMap`] and
//! [`AbstractSet`]. Maps never store a binding to their default value: the
//! default is implicit for every absent key, and its kind (top for
//! environments, bottom for partitions) drives the order on maps.

use crate::domain::AbstractDomain;
use crate::errors::{DomainError, DomainResult};
use crate::kind::AbstractValueKind;
use std::fmt;
use std::marker::PhantomData;

pub mod flat;
pub mod hashed;
pub mod patricia;
pub mod patricia_hash;
pub mod sparse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Updates build new versions sharing structure with the old ones.
    Immutable,
    /// Updates happen in place.
    Mutable,
}

/// Describes the values stored in a map: which one is the implicit default,
/// and how values compare.
pub trait ValueInterface {
    type Value: Clone + fmt::Debug;

    /// Kind of the default value, which is either the top or the bottom of
    /// the value order.
    const DEFAULT_VALUE_KIND: AbstractValueKind;

    fn default_value() -> Self::Value;

    fn is_default_value(value: &Self::Value) -> bool;

    fn equals(x: &Self::Value, y: &Self::Value) -> bool;

    fn leq(x: &Self::Value, y: &Self::Value) -> bool;
}

/// Plain values compared with `==`, the default value (given by [`Default`])
/// being the greatest one.
pub struct SimpleValue<V>(PhantomData<fn() -> V>);

impl<V: Clone + fmt::Debug + Default + PartialEq> ValueInterface for SimpleValue<V> {
    type Value = V;

    const DEFAULT_VALUE_KIND: AbstractValueKind = AbstractValueKind::Top;

    fn default_value() -> V {
        V::default()
    }

    fn is_default_value(value: &V) -> bool {
        *value == V::default()
    }

    fn equals(x: &V, y: &V) -> bool {
        x == y
    }

    fn leq(x: &V, y: &V) -> bool {
        x == y || Self::is_default_value(y)
    }
}

/// Abstract domain values with an implicit top default, as used by
/// environments.
pub struct TopValueInterface<D>(PhantomData<fn() -> D>);

impl<D: AbstractDomain> ValueInterface for TopValueInterface<D> {
    type Value = D;

    const DEFAULT_VALUE_KIND: AbstractValueKind = AbstractValueKind::Top;

    fn default_value() -> D {
        D::top()
    }

    fn is_default_value(value: &D) -> bool {
        value.is_top()
    }

    fn equals(x: &D, y: &D) -> bool {
        x.equals(y)
    }

    fn leq(x: &D, y: &D) -> bool {
        x.leq(y)
    }
}

/// Abstract domain values with an implicit bottom default, as used by
/// partitions.
pub struct BottomValueInterface<D>(PhantomData<fn() -> D>);

impl<D: AbstractDomain> ValueInterface for BottomValueInterface<D> {
    type Value = D;

    const DEFAULT_VALUE_KIND: AbstractValueKind = AbstractValueKind::Bottom;

    fn default_value() -> D {
        D::bottom()
    }

    fn is_default_value(value: &D) -> bool {
        value.is_bottom()
    }

    fn equals(x: &D, y: &D) -> bool {
        x.equals(y)
    }

    fn leq(x: &D, y: &D) -> bool {
        x.leq(y)
    }
}

fn erase_all_matching_undefined<T>() -> DomainResult<T> {
    Err(DomainError::UndefinedOperation(
        "erase_all_matching requires integer-encoded keys".to_string(),
    ))
}

pub trait AbstractMap: Clone + Default + fmt::Debug {
    type Key: Clone + fmt::Debug;
    type Value: Clone + fmt::Debug;
    type ValueInterface: ValueInterface<Value = Self::Value>;
    type Iter<'a>: Iterator<Item = (&'a Self::Key, &'a Self::Value)>
    where
        Self: 'a;

    const MUTABILITY: Mutability;

    fn is_empty(&self) -> bool;

    /// Number of explicit (non-default) bindings.
    fn len(&self) -> usize;

    fn iter(&self) -> Self::Iter<'_>;

    /// Explicit binding of `key`, if any.
    fn get(&self, key: &Self::Key) -> Option<&Self::Value>;

    /// Value bound to `key`, the default value if there is no binding.
    fn at(&self, key: &Self::Key) -> Self::Value {
        self.get(key)
            .cloned()
            .unwrap_or_else(<Self::ValueInterface as ValueInterface>::default_value)
    }

    /// Binds `key` to `value`. Binding the default value removes the key.
    fn insert_or_assign(&mut self, key: Self::Key, value: Self::Value);

    fn remove(&mut self, key: &Self::Key);

    /// Rebinds `key` to `op` applied to its current value (the default value
    /// when unbound).
    fn update<F>(&mut self, key: Self::Key, op: F)
    where
        F: FnOnce(&Self::Value) -> Self::Value;

    /// Keeps only the bindings satisfying `predicate`.
    fn filter<P>(&mut self, predicate: P)
    where
        P: FnMut(&Self::Key, &Self::Value) -> bool;

    fn visit<F>(&self, mut visitor: F)
    where
        F: FnMut(&Self::Key, &Self::Value),
    {
        for (key, value) in self.iter() {
            visitor(key, value);
        }
    }

    /// Maps `op` over every binding, dropping the ones that become default.
    /// Returns whether the map changed.
    fn transform<F>(&mut self, op: F) -> bool
    where
        F: FnMut(&Self::Value) -> Self::Value;

    /// Keys bound on both sides are combined, keys bound on one side only
    /// are kept as is. `combine` must be idempotent.
    fn union_with<F>(&mut self, combine: F, other: &Self)
    where
        F: FnMut(&Self::Value, &Self::Value) -> Self::Value;

    /// Only keys bound on both sides are kept, combined. `combine` must be
    /// idempotent.
    fn intersection_with<F>(&mut self, combine: F, other: &Self)
    where
        F: FnMut(&Self::Value, &Self::Value) -> Self::Value;

    /// Keys bound on both sides are combined, keys bound only in `other` are
    /// ignored.
    fn difference_with<F>(&mut self, combine: F, other: &Self)
    where
        F: FnMut(&Self::Value, &Self::Value) -> Self::Value;

    /// Pointwise order, taking the implicit default values into account.
    fn leq(&self, other: &Self) -> bool;

    fn equals(&self, other: &Self) -> bool;

    /// Cheap physical equality check. Only meaningful for maps sharing
    /// structure; `false` does not imply that the maps differ.
    fn reference_equals(&self, _other: &Self) -> bool {
        false
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Removes every key whose integer encoding has a bit in common with
    /// `key_mask`.
    fn erase_all_matching(&mut self, _key_mask: u64) -> DomainResult<()> {
        erase_all_matching_undefined()
    }
}

pub trait AbstractSet: Clone + Default + fmt::Debug {
    type Element: Clone + fmt::Debug;
    type Iter<'a>: Iterator<Item = &'a Self::Element>
    where
        Self: 'a;

    const MUTABILITY: Mutability;

    fn is_empty(&self) -> bool;

    fn len(&self) -> usize;

    fn iter(&self) -> Self::Iter<'_>;

    fn contains(&self, elem: &Self::Element) -> bool;

    fn insert(&mut self, elem: Self::Element);

    fn remove(&mut self, elem: &Self::Element);

    fn filter<P>(&mut self, predicate: P)
    where
        P: FnMut(&Self::Element) -> bool;

    fn visit<F>(&self, mut visitor: F)
    where
        F: FnMut(&Self::Element),
    {
        for elem in self.iter() {
            visitor(elem);
        }
    }

    fn is_subset(&self, other: &Self) -> bool;

    fn equals(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }

    fn union_with(&mut self, other: &Self);

    fn intersection_with(&mut self, other: &Self);

    fn difference_with(&mut self, other: &Self);

    fn reference_equals(&self, _other: &Self) -> bool {
        false
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn erase_all_matching(&mut self, _key_mask: u64) -> DomainResult<()> {
        erase_all_matching_undefined()
    }
}

/// Order on maps with an implicit default of the given kind. Top default:
/// `other` must not bind anything `this` leaves to top. Bottom default:
/// `this` must not bind anything `other` leaves to bottom.
pub(crate) fn leq_by_kind<M: AbstractMap>(this: &M, other: &M) -> bool {
    let top_default = || {
        other.iter().all(|(key, ov)| {
            this.get(key)
                .map_or(false, |tv| <M::ValueInterface as ValueInterface>::leq(tv, ov))
        })
    };
    let bottom_default = || {
        this.iter().all(|(key, tv)| {
            other
                .get(key)
                .map_or(false, |ov| <M::ValueInterface as ValueInterface>::leq(tv, ov))
        })
    };
    match <M::ValueInterface as ValueInterface>::DEFAULT_VALUE_KIND {
        AbstractValueKind::Top => top_default(),
        AbstractValueKind::Bottom => bottom_default(),
        AbstractValueKind::Value => top_default() && bottom_default(),
    }
}

//! Abstract environments: maps from variables to abstract values.
//!
//! Unbound variables are implicitly mapped to top, so the empty map is the
//! top environment. Binding any variable to bottom makes the whole
//! environment bottom.

use crate::domain::{AbstractDomain, AbstractValue};
use crate::errors::DomainResult;
use crate::kind::AbstractValueKind;
use crate::maps::flat::FlatMap;
use crate::maps::hashed::HashedMap;
use crate::maps::patricia::PatriciaTreeMap;
use crate::maps::patricia_hash::PatriciaTreeHashMap;
use crate::maps::{AbstractMap, TopValueInterface};
use crate::scaffolding::AbstractDomainScaffolding;

#[derive(Debug, Clone, Default)]
pub struct EnvironmentValue<M>(M);

impl<M> AbstractValue for EnvironmentValue<M>
where
    M: AbstractMap,
    M::Value: AbstractDomain,
{
    fn clear(&mut self) {
        self.0.clear();
    }

    fn kind(&self) -> AbstractValueKind {
        if self.0.is_empty() {
            AbstractValueKind::Top
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
        self.0.intersection_with(|x, y| x.join(y), &other.0);
        self.kind()
    }

    fn widen_with(&mut self, other: &Self) -> AbstractValueKind {
        self.0.intersection_with(|x, y| x.widen(y), &other.0);
        self.kind()
    }

    fn meet_with(&mut self, other: &Self) -> AbstractValueKind {
        let mut smashed = false;
        self.0.union_with(
            |x, y| {
                let met = x.meet(y);
                smashed |= met.is_bottom();
                met
            },
            &other.0,
        );
        if smashed {
            AbstractValueKind::Bottom
        } else {
            self.kind()
        }
    }

    fn narrow_with(&mut self, other: &Self) -> AbstractValueKind {
        let mut smashed = false;
        self.0.union_with(
            |x, y| {
                let narrowed = x.narrow(y);
                smashed |= narrowed.is_bottom();
                narrowed
            },
            &other.0,
        );
        if smashed {
            AbstractValueKind::Bottom
        } else {
            self.kind()
        }
    }
}

/// Environment over any map whose implicit default value is top.
pub type AbstractEnvironment<M> = AbstractDomainScaffolding<EnvironmentValue<M>>;

pub type PatriciaTreeMapAbstractEnvironment<K, D> =
    AbstractEnvironment<PatriciaTreeMap<K, D, TopValueInterface<D>>>;
pub type PatriciaTreeHashMapAbstractEnvironment<K, D> =
    AbstractEnvironment<PatriciaTreeHashMap<K, D, TopValueInterface<D>>>;
pub type HashedAbstractEnvironment<K, D> = AbstractEnvironment<HashedMap<K, D, TopValueInterface<D>>>;
pub type FlatMapAbstractEnvironment<K, D> = AbstractEnvironment<FlatMap<K, D, TopValueInterface<D>>>;

impl<M> AbstractEnvironment<M>
where
    M: AbstractMap,
    M::Value: AbstractDomain,
{
    pub fn from_bindings<I>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (M::Key, M::Value)>,
    {
        let mut env = Self::Top;
        for (key, value) in bindings {
            env.set(key, value);
        }
        env
    }

    /// Explicit bindings of a proper environment.
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

    pub fn get(&self, key: &M::Key) -> M::Value {
        match self {
            Self::Bottom => M::Value::bottom(),
            Self::Value(value) => value.0.get(key).cloned().unwrap_or_else(M::Value::top),
            Self::Top => M::Value::top(),
        }
    }

    /// Binds `key` to `value`. Has no effect on bottom; binding bottom turns
    /// the environment into bottom.
    pub fn set(&mut self, key: M::Key, value: M::Value) {
        if self.is_bottom() {
            return;
        }
        if value.is_bottom() {
            self.set_to_bottom();
            return;
        }
        match self {
            Self::Value(env) => {
                env.0.insert_or_assign(key, value);
                self.normalize();
            }
            _ => {
                if !value.is_top() {
                    let mut map = M::default();
                    map.insert_or_assign(key, value);
                    *self = Self::Value(EnvironmentValue(map));
                }
            }
        }
    }

    pub fn update<F>(&mut self, key: M::Key, op: F)
    where
        F: FnOnce(&M::Value) -> M::Value,
    {
        if self.is_bottom() {
            return;
        }
        let value = op(&self.get(&key));
        self.set(key, value);
    }

    /// Applies `op` to every explicit binding. Returns whether the
    /// environment changed.
    pub fn transform<F>(&mut self, mut op: F) -> bool
    where
        F: FnMut(&M::Value) -> M::Value,
    {
        let mut smashed = false;
        let changed = match self {
            Self::Value(env) => env.0.transform(|value| {
                let new = op(value);
                smashed |= new.is_bottom();
                new
            }),
            _ => false,
        };
        if smashed {
            self.set_to_bottom();
        } else {
            self.normalize();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstantDomain;
    use crate::interval::IntervalDomain;

    type Env = PatriciaTreeMapAbstractEnvironment<u32, IntervalDomain<i32>>;

    fn itv(lb: i32, ub: i32) -> IntervalDomain<i32> {
        IntervalDomain::finite(lb, ub).unwrap()
    }

    #[test]
    fn test_unbound_variables_are_top() {
        let mut env = Env::top();
        assert!(env.get(&1).is_top());
        env.set(1, itv(0, 1));
        assert_eq!(env.get(&1), itv(0, 1));
        assert_eq!(env.size(), 1);
        env.set(1, IntervalDomain::top());
        assert!(env.is_top());
        assert!(env.bindings().is_err());
    }

    #[test]
    fn test_binding_bottom_smashes_the_environment() {
        let mut env = Env::from_bindings([(1, itv(0, 1)), (2, itv(3, 3))]);
        env.set(3, IntervalDomain::bottom());
        assert!(env.is_bottom());
        assert!(env.get(&1).is_bottom());
        env.set(1, itv(0, 0));
        assert!(env.is_bottom());
    }

    #[test]
    fn test_join_and_meet() {
        let a = Env::from_bindings([(1, itv(0, 1)), (2, itv(0, 0))]);
        let b = Env::from_bindings([(1, itv(5, 6)), (3, itv(1, 1))]);

        let joined = a.join(&b);
        assert_eq!(joined.get(&1), itv(0, 6));
        assert!(joined.get(&2).is_top());
        assert!(joined.get(&3).is_top());
        assert!(a.leq(&joined) && b.leq(&joined));

        let met = a.meet(&Env::from_bindings([(2, itv(0, 4)), (3, itv(1, 1))]));
        assert_eq!(met.get(&1), itv(0, 1));
        assert_eq!(met.get(&2), itv(0, 0));
        assert_eq!(met.get(&3), itv(1, 1));

        assert!(a.meet(&b).is_bottom());
    }

    #[test]
    fn test_update_and_transform() {
        let mut env = HashedAbstractEnvironment::<&str, ConstantDomain<i32>>::top();
        env.update("x", |_| ConstantDomain::value(1));
        env.update("x", |x| match x.get_constant() {
            Some(c) => ConstantDomain::value(c + 1),
            None => ConstantDomain::top(),
        });
        assert_eq!(env.get(&"x").get_constant(), Some(&2));

        let mut env = Env::from_bindings([(1, itv(0, 1)), (2, itv(2, 3))]);
        assert!(env.transform(|v| v.add(&itv(1, 1))));
        assert_eq!(env.get(&2), itv(3, 4));
        assert!(env.transform(|v| v.meet(&itv(0, 2))));
        assert!(env.is_bottom());
    }
}

//! Abstract domains for static analysis by abstract interpretation.
//!
//! This crate provides the lattice interface used by the fixpoint engines
//! ([`AbstractDomain`]), a scaffolding to build domains out of plain values,
//! a set of base domains (constants, intervals, powersets) and combinators
//! (products, disjoint unions, environments, partitions) together with the
//! persistent containers they rely on.
//!
//! ```
//! use dw_domains::prelude::*;
//!
//! let mut env = PatriciaTreeMapAbstractEnvironment::<u32, IntervalDomain<i32>>::top();
//! env.set(0, IntervalDomain::singleton(1).unwrap());
//! let other = PatriciaTreeMapAbstractEnvironment::from_bindings([
//!     (0, IntervalDomain::singleton(3).unwrap()),
//! ]);
//! assert_eq!(env.join(&other).get(&0), IntervalDomain::finite(1, 3).unwrap());
//! ```

pub mod constant;
pub mod disjoint_union;
pub mod domain;
pub mod environment;
pub mod errors;
pub mod interval;
pub mod kind;
pub mod maps;
pub mod over_under;
pub mod partition;
pub mod powerset;
pub mod product;
pub mod scaffolding;

pub use domain::{AbstractDomain, AbstractValue};
pub use kind::AbstractValueKind;
pub use scaffolding::AbstractDomainScaffolding;

pub mod prelude {
    pub use crate::constant::ConstantDomain;
    pub use crate::disjoint_union::{DisjointUnion2, DisjointUnion3};
    pub use crate::domain::{AbstractDomain, AbstractValue};
    pub use crate::environment::{
        AbstractEnvironment, FlatMapAbstractEnvironment, HashedAbstractEnvironment,
        PatriciaTreeHashMapAbstractEnvironment, PatriciaTreeMapAbstractEnvironment,
    };
    pub use crate::errors::{DomainError, DomainResult};
    pub use crate::interval::IntervalDomain;
    pub use crate::kind::AbstractValueKind;
    pub use crate::maps::flat::{FlatMap, FlatSet};
    pub use crate::maps::hashed::{HashedMap, HashedSet};
    pub use crate::maps::patricia::{PatriciaKey, PatriciaTreeMap, PatriciaTreeSet};
    pub use crate::maps::patricia_hash::PatriciaTreeHashMap;
    pub use crate::maps::sparse::SparseSet;
    pub use crate::maps::{
        AbstractMap, AbstractSet, BottomValueInterface, SimpleValue, TopValueInterface,
        ValueInterface,
    };
    pub use crate::over_under::{OverUnderSetDomain, PatriciaTreeOverUnderSetDomain};
    pub use crate::partition::{
        AbstractPartition, FlatMapAbstractPartition, HashedAbstractPartition,
        PatriciaTreeMapAbstractPartition,
    };
    pub use crate::powerset::{
        FlatSetDomain, HashedSetDomain, PatriciaTreeSetDomain, PowersetDomain, SparseSetDomain,
    };
    pub use crate::product::{DirectProduct, NoReduction, ReducedProduct, Reduction};
    pub use crate::scaffolding::AbstractDomainScaffolding;
}

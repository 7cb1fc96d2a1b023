//! Cartesian products of domains.
//!
//! A product is bottom as soon as one of its components is bottom. The
//! direct product keeps components independent, whereas the reduced product
//! collapses every component to bottom when one of them is, and lets a
//! [`Reduction`] propagate information between components after each
//! operation.

use crate::domain::AbstractDomain;
use std::fmt;
use std::marker::PhantomData;

/// Tuples of domains, operated on componentwise.
pub trait ProductComponents: Clone + fmt::Debug {
    fn bottom_components() -> Self;
    fn top_components() -> Self;
    fn any_bottom(&self) -> bool;
    fn all_top(&self) -> bool;
    fn set_all_to_bottom(&mut self);
    fn leq_all(&self, other: &Self) -> bool;
    fn equals_all(&self, other: &Self) -> bool;
    fn join_all(&mut self, other: &Self);
    fn widen_all(&mut self, other: &Self);
    fn meet_all(&mut self, other: &Self);
    fn narrow_all(&mut self, other: &Self);
}

macro_rules! impl_product_components {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: AbstractDomain),+> ProductComponents for ($($name,)+) {
            fn bottom_components() -> Self {
                ($($name::bottom(),)+)
            }

            fn top_components() -> Self {
                ($($name::top(),)+)
            }

            fn any_bottom(&self) -> bool {
                false $(|| self.$idx.is_bottom())+
            }

            fn all_top(&self) -> bool {
                true $(&& self.$idx.is_top())+
            }

            fn set_all_to_bottom(&mut self) {
                $(self.$idx.set_to_bottom();)+
            }

            fn leq_all(&self, other: &Self) -> bool {
                true $(&& self.$idx.leq(&other.$idx))+
            }

            fn equals_all(&self, other: &Self) -> bool {
                true $(&& self.$idx.equals(&other.$idx))+
            }

            fn join_all(&mut self, other: &Self) {
                $(self.$idx.join_with(&other.$idx);)+
            }

            fn widen_all(&mut self, other: &Self) {
                $(self.$idx.widen_with(&other.$idx);)+
            }

            fn meet_all(&mut self, other: &Self) {
                $(self.$idx.meet_with(&other.$idx);)+
            }

            fn narrow_all(&mut self, other: &Self) {
                $(self.$idx.narrow_with(&other.$idx);)+
            }
        }
    };
}

impl_product_components!(A: 0, B: 1);
impl_product_components!(A: 0, B: 1, C: 2);
impl_product_components!(A: 0, B: 1, C: 2, D: 3);

#[derive(Debug, Clone)]
pub struct DirectProduct<T>(T);

impl<T: ProductComponents> DirectProduct<T> {
    pub fn new(components: T) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &T {
        &self.0
    }

    pub fn components_mut(&mut self) -> &mut T {
        &mut self.0
    }

    pub fn into_components(self) -> T {
        self.0
    }
}

impl<T: ProductComponents> AbstractDomain for DirectProduct<T> {
    fn bottom() -> Self {
        Self(T::bottom_components())
    }

    fn top() -> Self {
        Self(T::top_components())
    }

    fn is_bottom(&self) -> bool {
        self.0.any_bottom()
    }

    fn is_top(&self) -> bool {
        self.0.all_top()
    }

    fn leq(&self, other: &Self) -> bool {
        if self.is_bottom() {
            return true;
        }
        if other.is_bottom() {
            return false;
        }
        self.0.leq_all(&other.0)
    }

    fn equals(&self, other: &Self) -> bool {
        match (self.is_bottom(), other.is_bottom()) {
            (true, true) => true,
            (false, false) => self.0.equals_all(&other.0),
            _ => false,
        }
    }

    fn join_with(&mut self, other: &Self) {
        if other.is_bottom() {
            return;
        }
        if self.is_bottom() {
            *self = other.clone();
            return;
        }
        self.0.join_all(&other.0);
    }

    fn widen_with(&mut self, other: &Self) {
        if other.is_bottom() {
            return;
        }
        if self.is_bottom() {
            *self = other.clone();
            return;
        }
        self.0.widen_all(&other.0);
    }

    fn meet_with(&mut self, other: &Self) {
        self.0.meet_all(&other.0);
    }

    fn narrow_with(&mut self, other: &Self) {
        self.0.narrow_all(&other.0);
    }
}

/// Propagates information between the components of a reduced product.
/// Reductions must only refine components.
pub trait Reduction<T> {
    fn reduce(components: &mut T);
}

/// The trivial reduction, which only smashes bottom components.
pub struct NoReduction;

impl<T> Reduction<T> for NoReduction {
    fn reduce(_components: &mut T) {}
}

pub struct ReducedProduct<T, R = NoReduction> {
    components: T,
    _reduction: PhantomData<fn() -> R>,
}

impl<T: ProductComponents, R: Reduction<T>> ReducedProduct<T, R> {
    /// Builds a product, reducing the given components.
    pub fn new(components: T) -> Self {
        let mut product = Self::from_components(components);
        product.reduce();
        product
    }

    fn from_components(components: T) -> Self {
        Self {
            components,
            _reduction: PhantomData,
        }
    }

    pub fn components(&self) -> &T {
        &self.components
    }

    pub fn into_components(self) -> T {
        self.components
    }

    /// Modifies the components in place, then reduces them.
    pub fn apply<F: FnOnce(&mut T)>(&mut self, op: F) {
        op(&mut self.components);
        self.reduce();
    }

    fn smash_bottom(&mut self) {
        if self.components.any_bottom() {
            self.components.set_all_to_bottom();
        }
    }

    fn reduce(&mut self) {
        self.smash_bottom();
        if !self.components.any_bottom() {
            R::reduce(&mut self.components);
            self.smash_bottom();
        }
    }
}

impl<T: Clone, R> Clone for ReducedProduct<T, R> {
    fn clone(&self) -> Self {
        Self {
            components: self.components.clone(),
            _reduction: PhantomData,
        }
    }
}

impl<T: fmt::Debug, R> fmt::Debug for ReducedProduct<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ReducedProduct")
            .field(&self.components)
            .finish()
    }
}

impl<T: ProductComponents, R: Reduction<T>> AbstractDomain for ReducedProduct<T, R> {
    fn bottom() -> Self {
        Self::from_components(T::bottom_components())
    }

    fn top() -> Self {
        Self::from_components(T::top_components())
    }

    fn is_bottom(&self) -> bool {
        self.components.any_bottom()
    }

    fn is_top(&self) -> bool {
        self.components.all_top()
    }

    fn leq(&self, other: &Self) -> bool {
        if self.is_bottom() {
            return true;
        }
        if other.is_bottom() {
            return false;
        }
        self.components.leq_all(&other.components)
    }

    fn equals(&self, other: &Self) -> bool {
        match (self.is_bottom(), other.is_bottom()) {
            (true, true) => true,
            (false, false) => self.components.equals_all(&other.components),
            _ => false,
        }
    }

    fn join_with(&mut self, other: &Self) {
        if other.is_bottom() {
            return;
        }
        if self.is_bottom() {
            *self = other.clone();
            return;
        }
        self.components.join_all(&other.components);
        self.reduce();
    }

    /// Widening does not reduce, as reductions could undo the extrapolation
    /// and break termination.
    fn widen_with(&mut self, other: &Self) {
        if other.is_bottom() {
            return;
        }
        if self.is_bottom() {
            *self = other.clone();
            return;
        }
        self.components.widen_all(&other.components);
        self.smash_bottom();
    }

    fn meet_with(&mut self, other: &Self) {
        self.components.meet_all(&other.components);
        self.reduce();
    }

    fn narrow_with(&mut self, other: &Self) {
        self.components.narrow_all(&other.components);
        self.reduce();
    }
}

impl<T: ProductComponents, R: Reduction<T>> PartialEq for ReducedProduct<T, R> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstantDomain;
    use crate::interval::IntervalDomain;

    type Constant = ConstantDomain<i32>;
    type Interval = IntervalDomain<i32>;

    /// Keeps the interval exact when the constant is known, and the constant
    /// known when the interval is a singleton.
    struct ConstantInterval;

    impl Reduction<(Constant, Interval)> for ConstantInterval {
        fn reduce((constant, interval): &mut (Constant, Interval)) {
            if let Some(&c) = constant.get_constant() {
                if let Ok(exact) = Interval::singleton(c) {
                    interval.meet_with(&exact);
                }
            } else if let (Some(lb), Some(ub)) = (interval.lower_bound(), interval.upper_bound()) {
                if lb == ub && interval.is_finite() {
                    constant.meet_with(&Constant::value(lb));
                }
            }
        }
    }

    type Reduced = ReducedProduct<(Constant, Interval), ConstantInterval>;

    #[test]
    fn test_direct_product() {
        type Direct = DirectProduct<(Constant, Interval)>;
        let a = Direct::new((Constant::value(1), Interval::finite(0, 3).unwrap()));
        let b = Direct::new((Constant::value(2), Interval::finite(2, 5).unwrap()));
        let joined = a.join(&b);
        assert!(joined.components().0.is_top());
        assert_eq!(joined.components().1, Interval::finite(0, 5).unwrap());

        let met = a.meet(&b);
        assert!(met.is_bottom());
        assert!(met.components().1.is_value());
        assert!(met.leq(&a));
        assert!(Direct::bottom().equals(&met));
    }

    #[test]
    fn test_reduced_product_smashes_bottom() {
        let a = Reduced::new((Constant::value(1), Interval::finite(0, 3).unwrap()));
        let b = Reduced::new((Constant::top(), Interval::finite(5, 7).unwrap()));
        let met = a.meet(&b);
        assert!(met.components().0.is_bottom());
        assert!(met.components().1.is_bottom());
    }

    #[test]
    fn test_reduction_refines_components() {
        let exact = Reduced::new((Constant::value(4), Interval::top()));
        assert_eq!(exact.components().1, Interval::singleton(4).unwrap());

        let singleton = Reduced::new((Constant::top(), Interval::singleton(9).unwrap()));
        assert_eq!(singleton.components().0.get_constant(), Some(&9));

        let contradiction = Reduced::new((Constant::value(4), Interval::finite(5, 6).unwrap()));
        assert!(contradiction.is_bottom());

        let joined = exact.join(&singleton);
        assert!(joined.components().0.is_top());
        assert_eq!(joined.components().1, Interval::finite(4, 9).unwrap());
    }
}

//! Intervals over bounded machine integers.
//!
//! The smallest and largest representable integers stand for minus and plus
//! infinity, so a bound never overflows: arithmetic saturates to the
//! infinities and finite results that would collide with a sentinel are
//! clamped to the closest sound finite bound.

use crate::domain::AbstractDomain;
use crate::errors::{DomainError, DomainResult};
use std::fmt;

/// Integer types usable as interval bounds.
pub trait IntervalBound: Copy + Ord + fmt::Debug + fmt::Display {
    /// Minus infinity.
    const MIN: Self;
    /// Plus infinity.
    const MAX: Self;
    /// Smallest finite bound.
    const MIN_FINITE: Self;
    /// Largest finite bound.
    const MAX_FINITE: Self;
    const ZERO: Self;

    fn checked_add(self, other: Self) -> Option<Self>;
    fn checked_neg(self) -> Option<Self>;
}

macro_rules! impl_interval_bound {
    ($($t:ty),*) => {
        $(
            impl IntervalBound for $t {
                const MIN: Self = <$t>::MIN;
                const MAX: Self = <$t>::MAX;
                const MIN_FINITE: Self = <$t>::MIN + 1;
                const MAX_FINITE: Self = <$t>::MAX - 1;
                const ZERO: Self = 0;

                #[inline]
                fn checked_add(self, other: Self) -> Option<Self> {
                    <$t>::checked_add(self, other)
                }

                #[inline]
                fn checked_neg(self) -> Option<Self> {
                    <$t>::checked_neg(self)
                }
            }
        )*
    };
}

impl_interval_bound!(i8, i16, i32, i64, i128, isize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalDomain<N> {
    lb: N,
    ub: N,
}

impl<N: IntervalBound> IntervalDomain<N> {
    /// Interval `[lb, ub]` with finite bounds.
    pub fn finite(lb: N, ub: N) -> DomainResult<Self> {
        if lb <= N::MIN || ub >= N::MAX {
            return Err(DomainError::invalid_argument(
                "bounds",
                format!("[{lb}, {ub}] is not finite"),
            ));
        }
        if lb > ub {
            return Err(DomainError::invalid_argument(
                "bounds",
                format!("lower bound {lb} is greater than upper bound {ub}"),
            ));
        }
        Ok(Self { lb, ub })
    }

    pub fn singleton(n: N) -> DomainResult<Self> {
        Self::finite(n, n)
    }

    /// Interval `[lb, +oo]`.
    pub fn bounded_below(lb: N) -> DomainResult<Self> {
        if lb >= N::MAX {
            return Err(DomainError::invalid_argument(
                "lb",
                "lower bound cannot be plus infinity",
            ));
        }
        Ok(Self { lb, ub: N::MAX })
    }

    /// Interval `[-oo, ub]`.
    pub fn bounded_above(ub: N) -> DomainResult<Self> {
        if ub <= N::MIN {
            return Err(DomainError::invalid_argument(
                "ub",
                "upper bound cannot be minus infinity",
            ));
        }
        Ok(Self { lb: N::MIN, ub })
    }

    /// Lower bound, `N::MIN` standing for minus infinity.
    pub fn lower_bound(&self) -> Option<N> {
        (!self.is_bottom()).then_some(self.lb)
    }

    /// Upper bound, `N::MAX` standing for plus infinity.
    pub fn upper_bound(&self) -> Option<N> {
        (!self.is_bottom()).then_some(self.ub)
    }

    pub fn is_finite(&self) -> bool {
        !self.is_bottom() && self.lb != N::MIN && self.ub != N::MAX
    }

    pub fn contains(&self, n: N) -> bool {
        !self.is_bottom() && self.lb <= n && n <= self.ub
    }

    fn from_bounds(lb: N, ub: N) -> Self {
        if lb > ub {
            Self::bottom()
        } else {
            Self { lb, ub }
        }
    }

    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        Self::from_bounds(
            add_lower(self.lb, other.lb),
            add_upper(self.ub, other.ub),
        )
    }

    #[must_use]
    pub fn neg(&self) -> Self {
        if self.is_bottom() {
            return Self::bottom();
        }
        Self::from_bounds(neg_lower(self.ub), neg_upper(self.lb))
    }

    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }
}

fn add_lower<N: IntervalBound>(a: N, b: N) -> N {
    if a == N::MIN || b == N::MIN {
        return N::MIN;
    }
    match a.checked_add(b) {
        Some(sum) if sum == N::MAX => N::MAX_FINITE,
        Some(sum) => sum,
        None if a > N::ZERO => N::MAX_FINITE,
        None => N::MIN,
    }
}

fn add_upper<N: IntervalBound>(a: N, b: N) -> N {
    if a == N::MAX || b == N::MAX {
        return N::MAX;
    }
    match a.checked_add(b) {
        Some(sum) if sum == N::MIN => N::MIN_FINITE,
        Some(sum) => sum,
        None if a > N::ZERO => N::MAX,
        None => N::MIN_FINITE,
    }
}

fn neg_lower<N: IntervalBound>(ub: N) -> N {
    if ub == N::MAX {
        return N::MIN;
    }
    match ub.checked_neg() {
        Some(n) if n == N::MAX => N::MAX_FINITE,
        Some(n) => n,
        None => N::MAX_FINITE,
    }
}

fn neg_upper<N: IntervalBound>(lb: N) -> N {
    if lb == N::MIN {
        return N::MAX;
    }
    match lb.checked_neg() {
        Some(n) => n,
        None => N::MAX,
    }
}

impl<N: IntervalBound> AbstractDomain for IntervalDomain<N> {
    fn bottom() -> Self {
        Self { lb: N::MAX, ub: N::MIN }
    }

    fn top() -> Self {
        Self { lb: N::MIN, ub: N::MAX }
    }

    fn is_bottom(&self) -> bool {
        self.lb > self.ub
    }

    fn is_top(&self) -> bool {
        self.lb == N::MIN && self.ub == N::MAX
    }

    fn leq(&self, other: &Self) -> bool {
        if self.is_bottom() {
            return true;
        }
        if other.is_bottom() {
            return false;
        }
        other.lb <= self.lb && self.ub <= other.ub
    }

    fn equals(&self, other: &Self) -> bool {
        (self.is_bottom() && other.is_bottom()) || self == other
    }

    fn join_with(&mut self, other: &Self) {
        if other.is_bottom() {
            return;
        }
        if self.is_bottom() {
            *self = *other;
            return;
        }
        self.lb = self.lb.min(other.lb);
        self.ub = self.ub.max(other.ub);
    }

    fn widen_with(&mut self, other: &Self) {
        if other.is_bottom() {
            return;
        }
        if self.is_bottom() {
            *self = *other;
            return;
        }
        if other.lb < self.lb {
            self.lb = N::MIN;
        }
        if other.ub > self.ub {
            self.ub = N::MAX;
        }
    }

    fn meet_with(&mut self, other: &Self) {
        if self.is_bottom() || other.is_bottom() {
            *self = Self::bottom();
            return;
        }
        *self = Self::from_bounds(self.lb.max(other.lb), self.ub.min(other.ub));
    }

    fn narrow_with(&mut self, other: &Self) {
        if self.is_bottom() || other.is_bottom() {
            *self = Self::bottom();
            return;
        }
        let lb = if self.lb == N::MIN { other.lb } else { self.lb };
        let ub = if self.ub == N::MAX { other.ub } else { self.ub };
        *self = Self::from_bounds(lb, ub);
    }
}

impl<N: IntervalBound> fmt::Display for IntervalDomain<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_bottom() {
            return write!(f, "_|_");
        }
        if self.lb == N::MIN {
            write!(f, "[-oo, ")?;
        } else {
            write!(f, "[{}, ", self.lb)?;
        }
        if self.ub == N::MAX {
            write!(f, "+oo]")
        } else {
            write!(f, "{}]", self.ub)
        }
    }
}

//! Disjoint unions of domains.
//!
//! Every variant shares the same bottom and top, represented canonically by
//! the first variant. Joining elements of different variants gives top and
//! meeting them gives bottom.

use crate::domain::AbstractDomain;

macro_rules! disjoint_union {
    ($(#[$attr:meta])* $name:ident { $first:ident($fty:ident) $(, $variant:ident($ty:ident))+ }) => {
        $(#[$attr])*
        #[derive(Debug, Clone)]
        pub enum $name<$fty, $($ty),+> {
            $first($fty),
            $($variant($ty)),+
        }

        impl<$fty: AbstractDomain, $($ty: AbstractDomain),+> $name<$fty, $($ty),+> {
            fn normalize(&mut self) {
                if self.is_bottom() {
                    *self = Self::bottom();
                } else if self.is_top() {
                    *self = Self::top();
                }
            }

            fn same_variant(&self, other: &Self) -> bool {
                std::mem::discriminant(self) == std::mem::discriminant(other)
            }
        }

        impl<$fty: AbstractDomain, $($ty: AbstractDomain),+> AbstractDomain for $name<$fty, $($ty),+> {
            fn bottom() -> Self {
                Self::$first($fty::bottom())
            }

            fn top() -> Self {
                Self::$first($fty::top())
            }

            fn is_bottom(&self) -> bool {
                match self {
                    Self::$first(d) => d.is_bottom(),
                    $(Self::$variant(d) => d.is_bottom(),)+
                }
            }

            fn is_top(&self) -> bool {
                match self {
                    Self::$first(d) => d.is_top(),
                    $(Self::$variant(d) => d.is_top(),)+
                }
            }

            fn leq(&self, other: &Self) -> bool {
                if self.is_bottom() || other.is_top() {
                    return true;
                }
                if other.is_bottom() || self.is_top() {
                    return false;
                }
                match (self, other) {
                    (Self::$first(d1), Self::$first(d2)) => d1.leq(d2),
                    $((Self::$variant(d1), Self::$variant(d2)) => d1.leq(d2),)+
                    _ => false,
                }
            }

            fn equals(&self, other: &Self) -> bool {
                if self.is_bottom() || other.is_bottom() {
                    return self.is_bottom() && other.is_bottom();
                }
                if self.is_top() || other.is_top() {
                    return self.is_top() && other.is_top();
                }
                match (self, other) {
                    (Self::$first(d1), Self::$first(d2)) => d1.equals(d2),
                    $((Self::$variant(d1), Self::$variant(d2)) => d1.equals(d2),)+
                    _ => false,
                }
            }

            fn join_with(&mut self, other: &Self) {
                if other.is_bottom() || self.is_top() {
                    return;
                }
                if self.is_bottom() || other.is_top() || !self.same_variant(other) {
                    *self = if self.is_bottom() { other.clone() } else { Self::top() };
                } else {
                    match (&mut *self, other) {
                        (Self::$first(d1), Self::$first(d2)) => d1.join_with(d2),
                        $((Self::$variant(d1), Self::$variant(d2)) => d1.join_with(d2),)+
                        _ => (),
                    }
                }
                self.normalize();
            }

            fn widen_with(&mut self, other: &Self) {
                if other.is_bottom() || self.is_top() {
                    return;
                }
                if self.is_bottom() || other.is_top() || !self.same_variant(other) {
                    *self = if self.is_bottom() { other.clone() } else { Self::top() };
                } else {
                    match (&mut *self, other) {
                        (Self::$first(d1), Self::$first(d2)) => d1.widen_with(d2),
                        $((Self::$variant(d1), Self::$variant(d2)) => d1.widen_with(d2),)+
                        _ => (),
                    }
                }
                self.normalize();
            }

            fn meet_with(&mut self, other: &Self) {
                if other.is_top() || self.is_bottom() {
                    return;
                }
                if self.is_top() || other.is_bottom() || !self.same_variant(other) {
                    *self = if self.is_top() { other.clone() } else { Self::bottom() };
                } else {
                    match (&mut *self, other) {
                        (Self::$first(d1), Self::$first(d2)) => d1.meet_with(d2),
                        $((Self::$variant(d1), Self::$variant(d2)) => d1.meet_with(d2),)+
                        _ => (),
                    }
                }
                self.normalize();
            }

            fn narrow_with(&mut self, other: &Self) {
                if other.is_top() || self.is_bottom() {
                    return;
                }
                if self.is_top() || other.is_bottom() || !self.same_variant(other) {
                    *self = if self.is_top() { other.clone() } else { Self::bottom() };
                } else {
                    match (&mut *self, other) {
                        (Self::$first(d1), Self::$first(d2)) => d1.narrow_with(d2),
                        $((Self::$variant(d1), Self::$variant(d2)) => d1.narrow_with(d2),)+
                        _ => (),
                    }
                }
                self.normalize();
            }
        }
    };
}

disjoint_union!(
    /// Either an element of `A` or an element of `B`.
    DisjointUnion2 { First(A), Second(B) }
);

disjoint_union!(
    /// Either an element of `A`, of `B` or of `C`.
    DisjointUnion3 { First(A), Second(B), Third(C) }
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ConstantDomain;
    use crate::interval::IntervalDomain;

    type Union = DisjointUnion2<ConstantDomain<&'static str>, IntervalDomain<i64>>;

    fn text(s: &'static str) -> Union {
        Union::First(ConstantDomain::value(s))
    }

    fn range(lb: i64, ub: i64) -> Union {
        Union::Second(IntervalDomain::finite(lb, ub).unwrap())
    }

    #[test]
    fn test_same_variant_operations() {
        assert!(range(0, 1).join(&range(3, 4)).equals(&range(0, 4)));
        assert!(range(0, 5).meet(&range(3, 8)).equals(&range(3, 5)));
        assert!(range(0, 1).leq(&range(0, 4)));
        assert!(text("a").join(&text("b")).is_top());
    }

    #[test]
    fn test_cross_variant_operations() {
        assert!(text("a").join(&range(0, 1)).is_top());
        assert!(text("a").meet(&range(0, 1)).is_bottom());
        assert!(!text("a").leq(&range(0, 1)));
        assert!(text("a").leq(&Union::top()));
        assert!(Union::bottom().leq(&range(0, 1)));
    }

    #[test]
    fn test_extremal_elements_are_shared() {
        let empty_range = range(0, 1).meet(&range(2, 3));
        assert!(empty_range.is_bottom());
        assert!(matches!(empty_range, Union::First(_)));
        assert!(empty_range.equals(&Union::bottom()));
        assert!(Union::Second(IntervalDomain::bottom()).equals(&Union::First(ConstantDomain::bottom())));
        assert!(range(0, 1).join(&Union::bottom()).equals(&range(0, 1)));
        assert!(range(0, 1).meet(&Union::top()).equals(&range(0, 1)));
    }
}

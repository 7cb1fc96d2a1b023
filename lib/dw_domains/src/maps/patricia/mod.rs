//! Big-endian Patricia trees with structural sharing.
//!
//! Keys are encoded as 64-bit integers. A branch stores the common prefix of
//! all its keys and the highest bit on which they disagree: keys with that
//! bit cleared go left, the others go right. Subtrees are reference-counted
//! so that every operation returns a tree sharing every unchanged subtree
//! with its inputs, which makes physical equality a fast path for most
//! comparisons and merges.

use crate::errors::{DomainError, DomainResult};
use std::fmt;
use std::sync::Arc;

mod map;
mod set;

pub use map::PatriciaTreeMap;
pub use set::PatriciaTreeSet;

/// Keys storable in a Patricia tree. The encoding must be injective.
pub trait PatriciaKey: Clone + fmt::Debug {
    fn encode(&self) -> u64;
}

macro_rules! impl_patricia_key {
    ($($t:ty),*) => {
        $(
            impl PatriciaKey for $t {
                #[inline]
                fn encode(&self) -> u64 {
                    *self as u64
                }
            }
        )*
    };
}

impl_patricia_key!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl PatriciaKey for char {
    #[inline]
    fn encode(&self) -> u64 {
        u64::from(*self)
    }
}

impl PatriciaKey for bool {
    #[inline]
    fn encode(&self) -> u64 {
        u64::from(*self)
    }
}

/// References are identified by address.
impl<T: ?Sized + fmt::Debug> PatriciaKey for &T {
    #[inline]
    fn encode(&self) -> u64 {
        (*self as *const T).cast::<()>() as usize as u64
    }
}

/// Shared pointers are identified by address.
impl<T: ?Sized + fmt::Debug> PatriciaKey for Arc<T> {
    #[inline]
    fn encode(&self) -> u64 {
        Arc::as_ptr(self).cast::<()>() as usize as u64
    }
}

pub(crate) enum Node<K, V> {
    Leaf {
        key: K,
        value: V,
    },
    Branch {
        prefix: u64,
        branching_bit: u64,
        left: Arc<Node<K, V>>,
        right: Arc<Node<K, V>>,
    },
}

pub(crate) type Tree<K, V> = Option<Arc<Node<K, V>>>;

#[inline]
fn mask(key: u64, bit: u64) -> u64 {
    (key | (bit - 1)) & !bit
}

#[inline]
fn zero_bit(key: u64, bit: u64) -> bool {
    key & bit == 0
}

#[inline]
fn match_prefix(key: u64, prefix: u64, bit: u64) -> bool {
    mask(key, bit) == prefix
}

#[inline]
fn branching_bit(p0: u64, p1: u64) -> u64 {
    1 << (63 - (p0 ^ p1).leading_zeros())
}

impl<K: PatriciaKey, V> Node<K, V> {
    fn prefix(&self) -> u64 {
        match self {
            Self::Leaf { key, .. } => key.encode(),
            Self::Branch { prefix, .. } => *prefix,
        }
    }
}

fn leaf<K, V>(key: K, value: V) -> Arc<Node<K, V>> {
    Arc::new(Node::Leaf { key, value })
}

/// Joins two trees whose prefixes disagree.
fn join<K, V>(p0: u64, t0: Arc<Node<K, V>>, p1: u64, t1: Arc<Node<K, V>>) -> Arc<Node<K, V>> {
    let bit = branching_bit(p0, p1);
    let prefix = mask(p0, bit);
    let (left, right) = if zero_bit(p0, bit) { (t0, t1) } else { (t1, t0) };
    Arc::new(Node::Branch {
        prefix,
        branching_bit: bit,
        left,
        right,
    })
}

/// Builds a branch out of two possibly empty subtrees, reusing one of the
/// `originals` when it has exactly these children.
fn branch<K, V>(
    prefix: u64,
    bit: u64,
    left: Tree<K, V>,
    right: Tree<K, V>,
    originals: &[&Arc<Node<K, V>>],
) -> Tree<K, V> {
    match (left, right) {
        (None, None) => None,
        (Some(tree), None) | (None, Some(tree)) => Some(tree),
        (Some(left), Some(right)) => {
            for original in originals {
                if let Node::Branch {
                    left: ol,
                    right: or,
                    ..
                } = &***original
                {
                    if Arc::ptr_eq(ol, &left) && Arc::ptr_eq(or, &right) {
                        return Some(Arc::clone(original));
                    }
                }
            }
            Some(Arc::new(Node::Branch {
                prefix,
                branching_bit: bit,
                left,
                right,
            }))
        }
    }
}

pub(crate) fn same_tree<K, V>(t0: &Tree<K, V>, t1: &Tree<K, V>) -> bool {
    match (t0, t1) {
        (None, None) => true,
        (Some(n0), Some(n1)) => Arc::ptr_eq(n0, n1),
        _ => false,
    }
}

/// Leaf node holding `key`, if any.
fn lookup<K: PatriciaKey, V>(mut node: &Arc<Node<K, V>>, key: u64) -> Option<&Arc<Node<K, V>>> {
    loop {
        match &**node {
            Node::Leaf { key: k, .. } => return (k.encode() == key).then_some(node),
            Node::Branch {
                prefix,
                branching_bit,
                left,
                right,
            } => {
                if !match_prefix(key, *prefix, *branching_bit) {
                    return None;
                }
                node = if zero_bit(key, *branching_bit) { left } else { right };
            }
        }
    }
}

fn lookup_value<K: PatriciaKey, V>(node: &Arc<Node<K, V>>, key: u64) -> Option<(&K, &V)> {
    match lookup(node, key).map(|leaf| &**leaf) {
        Some(Node::Leaf { key, value }) => Some((key, value)),
        _ => None,
    }
}

pub(crate) fn find<K: PatriciaKey, V>(tree: &Tree<K, V>, key: u64) -> Option<(&K, &V)> {
    tree.as_ref().and_then(|node| lookup_value(node, key))
}

/// Rebinds `key` to `op(current binding)`, `None` meaning unbound.
pub(crate) fn update<K, V, F, E>(tree: &Tree<K, V>, key: K, op: F, eq: &E) -> Tree<K, V>
where
    K: PatriciaKey,
    F: FnOnce(Option<&V>) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    match tree {
        None => op(None).map(|value| leaf(key, value)),
        Some(node) => update_node(node, key, op, eq),
    }
}

fn update_node<K, V, F, E>(node: &Arc<Node<K, V>>, key: K, op: F, eq: &E) -> Tree<K, V>
where
    K: PatriciaKey,
    F: FnOnce(Option<&V>) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    let bits = key.encode();
    match &**node {
        Node::Leaf { key: k, value } if k.encode() == bits => match op(Some(value)) {
            None => None,
            Some(new) if eq(&new, value) => Some(Arc::clone(node)),
            Some(new) => Some(leaf(key, new)),
        },
        Node::Branch {
            prefix,
            branching_bit,
            left,
            right,
        } if match_prefix(bits, *prefix, *branching_bit) => {
            if zero_bit(bits, *branching_bit) {
                let new_left = update_node(left, key, op, eq);
                branch(*prefix, *branching_bit, new_left, Some(Arc::clone(right)), &[node])
            } else {
                let new_right = update_node(right, key, op, eq);
                branch(*prefix, *branching_bit, Some(Arc::clone(left)), new_right, &[node])
            }
        }
        _ => match op(None) {
            None => Some(Arc::clone(node)),
            Some(value) => Some(join(bits, leaf(key, value), node.prefix(), Arc::clone(node))),
        },
    }
}

/// Union of two trees. `combine` returns `None` when the combined binding
/// must be dropped.
pub(crate) fn union<K, V, F, E>(s: &Tree<K, V>, t: &Tree<K, V>, combine: &mut F, eq: &E) -> Tree<K, V>
where
    K: PatriciaKey,
    V: Clone,
    F: FnMut(&K, &V, &V) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    match (s, t) {
        (None, _) => t.clone(),
        (_, None) => s.clone(),
        (Some(s), Some(t)) => union_nodes(s, t, combine, eq),
    }
}

fn union_nodes<K, V, F, E>(
    s: &Arc<Node<K, V>>,
    t: &Arc<Node<K, V>>,
    combine: &mut F,
    eq: &E,
) -> Tree<K, V>
where
    K: PatriciaKey,
    V: Clone,
    F: FnMut(&K, &V, &V) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    if Arc::ptr_eq(s, t) {
        return Some(Arc::clone(s));
    }
    match (&**s, &**t) {
        (Node::Leaf { key, value }, _) => update_node(
            t,
            key.clone(),
            |tv| match tv {
                Some(tv) => combine(key, value, tv),
                None => Some(value.clone()),
            },
            eq,
        ),
        (_, Node::Leaf { key, value }) => update_node(
            s,
            key.clone(),
            |sv| match sv {
                Some(sv) => combine(key, sv, value),
                None => Some(value.clone()),
            },
            eq,
        ),
        (
            Node::Branch {
                prefix: p,
                branching_bit: m,
                left: s0,
                right: s1,
            },
            Node::Branch {
                prefix: q,
                branching_bit: n,
                left: t0,
                right: t1,
            },
        ) => {
            if m == n && p == q {
                let left = union_nodes(s0, t0, combine, eq);
                let right = union_nodes(s1, t1, combine, eq);
                branch(*p, *m, left, right, &[s, t])
            } else if m > n && match_prefix(*q, *p, *m) {
                if zero_bit(*q, *m) {
                    let left = union_nodes(s0, t, combine, eq);
                    branch(*p, *m, left, Some(Arc::clone(s1)), &[s])
                } else {
                    let right = union_nodes(s1, t, combine, eq);
                    branch(*p, *m, Some(Arc::clone(s0)), right, &[s])
                }
            } else if m < n && match_prefix(*p, *q, *n) {
                if zero_bit(*p, *n) {
                    let left = union_nodes(s, t0, combine, eq);
                    branch(*q, *n, left, Some(Arc::clone(t1)), &[t])
                } else {
                    let right = union_nodes(s, t1, combine, eq);
                    branch(*q, *n, Some(Arc::clone(t0)), right, &[t])
                }
            } else {
                Some(join(*p, Arc::clone(s), *q, Arc::clone(t)))
            }
        }
    }
}

/// Combines two leaves holding the same key, sharing one of them when the
/// combined value is unchanged.
fn combine_leaves<K, V, F, E>(
    s_leaf: &Arc<Node<K, V>>,
    t_leaf: &Arc<Node<K, V>>,
    combine: &mut F,
    eq: &E,
) -> Tree<K, V>
where
    K: PatriciaKey,
    F: FnMut(&K, &V, &V) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    match (&**s_leaf, &**t_leaf) {
        (Node::Leaf { key, value: sv }, Node::Leaf { value: tv, .. }) => match combine(key, sv, tv) {
            None => None,
            Some(value) if eq(&value, sv) => Some(Arc::clone(s_leaf)),
            Some(value) if eq(&value, tv) => Some(Arc::clone(t_leaf)),
            Some(value) => Some(leaf(key.clone(), value)),
        },
        _ => Some(Arc::clone(s_leaf)),
    }
}

/// Intersection of two trees. `combine` returns `None` when the combined
/// binding must be dropped.
pub(crate) fn intersection<K, V, F, E>(
    s: &Tree<K, V>,
    t: &Tree<K, V>,
    combine: &mut F,
    eq: &E,
) -> Tree<K, V>
where
    K: PatriciaKey,
    F: FnMut(&K, &V, &V) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    match (s, t) {
        (Some(s), Some(t)) => intersection_nodes(s, t, combine, eq),
        _ => None,
    }
}

fn intersection_nodes<K, V, F, E>(
    s: &Arc<Node<K, V>>,
    t: &Arc<Node<K, V>>,
    combine: &mut F,
    eq: &E,
) -> Tree<K, V>
where
    K: PatriciaKey,
    F: FnMut(&K, &V, &V) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    if Arc::ptr_eq(s, t) {
        return Some(Arc::clone(s));
    }
    match (&**s, &**t) {
        (Node::Leaf { key, .. }, _) => {
            lookup(t, key.encode()).and_then(|t_leaf| combine_leaves(s, t_leaf, combine, eq))
        }
        (_, Node::Leaf { key, .. }) => {
            lookup(s, key.encode()).and_then(|s_leaf| combine_leaves(s_leaf, t, combine, eq))
        }
        (
            Node::Branch {
                prefix: p,
                branching_bit: m,
                left: s0,
                right: s1,
            },
            Node::Branch {
                prefix: q,
                branching_bit: n,
                left: t0,
                right: t1,
            },
        ) => {
            if m == n && p == q {
                let left = intersection_nodes(s0, t0, combine, eq);
                let right = intersection_nodes(s1, t1, combine, eq);
                branch(*p, *m, left, right, &[s, t])
            } else if m > n && match_prefix(*q, *p, *m) {
                intersection_nodes(if zero_bit(*q, *m) { s0 } else { s1 }, t, combine, eq)
            } else if m < n && match_prefix(*p, *q, *n) {
                intersection_nodes(s, if zero_bit(*p, *n) { t0 } else { t1 }, combine, eq)
            } else {
                None
            }
        }
    }
}

/// Updates the bindings of `s` that also appear in `t`. Bindings of `t`
/// absent from `s` are ignored. `combine` returns `None` when the binding
/// must be dropped.
pub(crate) fn difference<K, V, F, E>(
    s: &Tree<K, V>,
    t: &Tree<K, V>,
    combine: &mut F,
    eq: &E,
) -> Tree<K, V>
where
    K: PatriciaKey,
    F: FnMut(&K, &V, &V) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    match (s, t) {
        (Some(s), Some(t)) => difference_nodes(s, t, combine, eq),
        _ => s.clone(),
    }
}

fn difference_nodes<K, V, F, E>(
    s: &Arc<Node<K, V>>,
    t: &Arc<Node<K, V>>,
    combine: &mut F,
    eq: &E,
) -> Tree<K, V>
where
    K: PatriciaKey,
    F: FnMut(&K, &V, &V) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    match (&**s, &**t) {
        (Node::Leaf { key, .. }, _) => match lookup(t, key.encode()) {
            Some(t_leaf) => combine_leaves(s, t_leaf, combine, eq),
            None => Some(Arc::clone(s)),
        },
        (_, Node::Leaf { key, value }) => update_node(
            s,
            key.clone(),
            |sv| sv.and_then(|sv| combine(key, sv, value)),
            eq,
        ),
        (
            Node::Branch {
                prefix: p,
                branching_bit: m,
                left: s0,
                right: s1,
            },
            Node::Branch {
                prefix: q,
                branching_bit: n,
                left: t0,
                right: t1,
            },
        ) => {
            if m == n && p == q {
                let left = difference_nodes(s0, t0, combine, eq);
                let right = difference_nodes(s1, t1, combine, eq);
                branch(*p, *m, left, right, &[s])
            } else if m > n && match_prefix(*q, *p, *m) {
                if zero_bit(*q, *m) {
                    let left = difference_nodes(s0, t, combine, eq);
                    branch(*p, *m, left, Some(Arc::clone(s1)), &[s])
                } else {
                    let right = difference_nodes(s1, t, combine, eq);
                    branch(*p, *m, Some(Arc::clone(s0)), right, &[s])
                }
            } else if m < n && match_prefix(*p, *q, *n) {
                difference_nodes(s, if zero_bit(*p, *n) { t0 } else { t1 }, combine, eq)
            } else {
                Some(Arc::clone(s))
            }
        }
    }
}

pub(crate) fn filter<K, V, P>(tree: &Tree<K, V>, predicate: &mut P) -> Tree<K, V>
where
    P: FnMut(&K, &V) -> bool,
{
    tree.as_ref().and_then(|node| filter_node(node, predicate))
}

fn filter_node<K, V, P>(node: &Arc<Node<K, V>>, predicate: &mut P) -> Tree<K, V>
where
    P: FnMut(&K, &V) -> bool,
{
    match &**node {
        Node::Leaf { key, value } => predicate(key, value).then(|| Arc::clone(node)),
        Node::Branch {
            prefix,
            branching_bit,
            left,
            right,
        } => {
            let new_left = filter_node(left, predicate);
            let new_right = filter_node(right, predicate);
            branch(*prefix, *branching_bit, new_left, new_right, &[node])
        }
    }
}

/// Maps `op` over every value, `None` dropping the binding.
pub(crate) fn transform<K, V, F, E>(tree: &Tree<K, V>, op: &mut F, eq: &E) -> Tree<K, V>
where
    K: Clone,
    F: FnMut(&V) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    tree.as_ref().and_then(|node| transform_node(node, op, eq))
}

fn transform_node<K, V, F, E>(node: &Arc<Node<K, V>>, op: &mut F, eq: &E) -> Tree<K, V>
where
    K: Clone,
    F: FnMut(&V) -> Option<V>,
    E: Fn(&V, &V) -> bool,
{
    match &**node {
        Node::Leaf { key, value } => match op(value) {
            None => None,
            Some(new) if eq(&new, value) => Some(Arc::clone(node)),
            Some(new) => Some(leaf(key.clone(), new)),
        },
        Node::Branch {
            prefix,
            branching_bit,
            left,
            right,
        } => {
            let new_left = transform_node(left, op, eq);
            let new_right = transform_node(right, op, eq);
            branch(*prefix, *branching_bit, new_left, new_right, &[node])
        }
    }
}

/// Structural equality. Two trees holding the same bindings always have the
/// same shape.
pub(crate) fn equals<K, V, E>(s: &Tree<K, V>, t: &Tree<K, V>, eq: &E) -> bool
where
    K: PatriciaKey,
    E: Fn(&V, &V) -> bool,
{
    match (s, t) {
        (None, None) => true,
        (Some(s), Some(t)) => equals_nodes(s, t, eq),
        _ => false,
    }
}

fn equals_nodes<K, V, E>(s: &Arc<Node<K, V>>, t: &Arc<Node<K, V>>, eq: &E) -> bool
where
    K: PatriciaKey,
    E: Fn(&V, &V) -> bool,
{
    if Arc::ptr_eq(s, t) {
        return true;
    }
    match (&**s, &**t) {
        (Node::Leaf { key: k0, value: v0 }, Node::Leaf { key: k1, value: v1 }) => {
            k0.encode() == k1.encode() && eq(v0, v1)
        }
        (
            Node::Branch {
                prefix: p,
                branching_bit: m,
                left: s0,
                right: s1,
            },
            Node::Branch {
                prefix: q,
                branching_bit: n,
                left: t0,
                right: t1,
            },
        ) => p == q && m == n && equals_nodes(s0, t0, eq) && equals_nodes(s1, t1, eq),
        _ => false,
    }
}

/// Whether every binding of `s` is also bound in `t` with a greater value.
pub(crate) fn leq_bindings<K, V, L>(s: &Tree<K, V>, t: &Tree<K, V>, leq: &L) -> bool
where
    K: PatriciaKey,
    L: Fn(&V, &V) -> bool,
{
    match (s, t) {
        (None, _) => true,
        (_, None) => false,
        (Some(s), Some(t)) => leq_nodes(s, t, leq),
    }
}

fn leq_nodes<K, V, L>(s: &Arc<Node<K, V>>, t: &Arc<Node<K, V>>, leq: &L) -> bool
where
    K: PatriciaKey,
    L: Fn(&V, &V) -> bool,
{
    if Arc::ptr_eq(s, t) {
        return true;
    }
    match (&**s, &**t) {
        (Node::Leaf { key, value }, _) => {
            lookup_value(t, key.encode()).map_or(false, |(_, tv)| leq(value, tv))
        }
        (Node::Branch { .. }, Node::Leaf { .. }) => false,
        (
            Node::Branch {
                prefix: p,
                branching_bit: m,
                left: s0,
                right: s1,
            },
            Node::Branch {
                prefix: q,
                branching_bit: n,
                left: t0,
                right: t1,
            },
        ) => {
            if m == n && p == q {
                leq_nodes(s0, t0, leq) && leq_nodes(s1, t1, leq)
            } else if m < n && match_prefix(*p, *q, *n) {
                leq_nodes(s, if zero_bit(*p, *n) { t0 } else { t1 }, leq)
            } else {
                false
            }
        }
    }
}

pub(crate) fn size<K, V>(tree: &Tree<K, V>) -> usize {
    fn node_size<K, V>(node: &Node<K, V>) -> usize {
        match node {
            Node::Leaf { .. } => 1,
            Node::Branch { left, right, .. } => node_size(left) + node_size(right),
        }
    }
    tree.as_deref().map_or(0, node_size)
}

/// Checks the shape invariants of a tree: every key of a branch agrees with
/// its prefix and lies on the side selected by its branching bit, and
/// branching bits strictly decrease along paths.
pub(crate) fn check_invariants<K: PatriciaKey, V>(tree: &Tree<K, V>) -> DomainResult<()> {
    fn check<K: PatriciaKey, V>(node: &Node<K, V>, bound: Option<(u64, u64, bool)>) -> DomainResult<()> {
        if let Some((prefix, bit, is_left)) = bound {
            let key = node.prefix();
            if !match_prefix(key, prefix, bit) || zero_bit(key, bit) != is_left {
                return Err(DomainError::Internal(format!(
                    "misplaced subtree with prefix {key:#x} under prefix {prefix:#x}"
                )));
            }
        }
        match node {
            Node::Leaf { .. } => Ok(()),
            Node::Branch {
                prefix,
                branching_bit,
                left,
                right,
            } => {
                if branching_bit.count_ones() != 1 {
                    return Err(DomainError::Internal(format!(
                        "invalid branching bit {branching_bit:#x}"
                    )));
                }
                if let Some((_, parent_bit, _)) = bound {
                    if *branching_bit >= parent_bit {
                        return Err(DomainError::Internal(format!(
                            "branching bit {branching_bit:#x} is not below {parent_bit:#x}"
                        )));
                    }
                }
                check(left, Some((*prefix, *branching_bit, true)))?;
                check(right, Some((*prefix, *branching_bit, false)))
            }
        }
    }
    match tree {
        Some(node) => check(node, None),
        None => Ok(()),
    }
}

/// In-order traversal of the bindings, by increasing key encoding.
pub struct PatriciaIter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> PatriciaIter<'a, K, V> {
    pub(crate) fn new(tree: &'a Tree<K, V>) -> Self {
        Self {
            stack: tree.as_deref().into_iter().collect(),
        }
    }
}

impl<'a, K, V> Iterator for PatriciaIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf { key, value } => return Some((key, value)),
                Node::Branch { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
        None
    }
}

//! Weak topological ordering (F. Bourdoncle, "Efficient chaotic iteration
//! strategies with widenings", 1993).
//!
//! The ordering is stored as a single vector of entries in which every
//! component is followed by its nested components. Each entry records the
//! number of entries its component spans, so that the next component at the
//! same nesting level is found by skipping over it.

use crate::errors::{AnalysisError, AnalysisResult};
use crate::graph::Graph;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WtoComponentKind {
    Vertex,
    Scc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry<N> {
    node: N,
    kind: WtoComponentKind,
    span: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeakTopologicalOrdering<N> {
    entries: Vec<Entry<N>>,
}

impl<N: Copy + Eq + Hash> WeakTopologicalOrdering<N> {
    /// Builds the ordering of the nodes reachable from `root`.
    pub fn new<F, I>(root: N, successors: F) -> Self
    where
        F: Fn(N) -> I,
        I: IntoIterator<Item = N>,
    {
        let mut succs = successors(root).into_iter().peekable();
        if succs.peek().is_none() {
            return Self {
                entries: vec![Entry {
                    node: root,
                    kind: WtoComponentKind::Vertex,
                    span: 1,
                }],
            };
        }
        drop(succs);

        let mut builder = Builder {
            successors,
            dfn: HashMap::new(),
            stack: Vec::new(),
            num: 0,
            entries: Vec::new(),
        };
        builder.build(root);
        let mut entries = builder.entries;
        entries.reverse();
        Self { entries }
    }

    pub fn from_graph<G: Graph<NodeId = N>>(graph: &G) -> Self {
        Self::new(graph.entry(), |node| graph.successor_nodes(node))
    }
}

impl<N> WeakTopologicalOrdering<N> {
    /// Top-level components, in order.
    pub fn components(&self) -> WtoComponents<'_, N> {
        WtoComponents {
            rest: &self.entries,
        }
    }

    /// Number of nodes in the ordering.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every node in order, heads before the members of their component.
    pub fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.entries.iter().map(|entry| &entry.node)
    }

    /// Calls `f` on every component, each SCC before its subcomponents.
    pub fn visit_depth_first<F: FnMut(&WtoComponent<'_, N>)>(&self, mut f: F) {
        let mut levels = vec![self.components()];
        while let Some(level) = levels.last_mut() {
            match level.next() {
                Some(component) => {
                    f(&component);
                    levels.push(component.nested());
                }
                None => {
                    levels.pop();
                }
            }
        }
    }
}

impl<N: fmt::Display> fmt::Display for WeakTopologicalOrdering<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_components(self.components(), f)
    }
}

fn fmt_components<N: fmt::Display>(
    components: WtoComponents<'_, N>,
    f: &mut fmt::Formatter,
) -> fmt::Result {
    for (i, component) in components.enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{component}")?;
    }
    Ok(())
}

/// A vertex, or a strongly connected component with its head and the
/// ordering of its other members.
#[derive(Debug)]
pub struct WtoComponent<'w, N> {
    entries: &'w [Entry<N>],
}

impl<'w, N> Clone for WtoComponent<'w, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'w, N> Copy for WtoComponent<'w, N> {}

impl<'w, N> WtoComponent<'w, N> {
    #[inline]
    pub fn head_node(&self) -> &'w N {
        &self.entries[0].node
    }

    #[inline]
    pub fn kind(&self) -> WtoComponentKind {
        self.entries[0].kind
    }

    #[inline]
    pub fn is_vertex(&self) -> bool {
        self.kind() == WtoComponentKind::Vertex
    }

    #[inline]
    pub fn is_scc(&self) -> bool {
        self.kind() == WtoComponentKind::Scc
    }

    /// Nested components of an SCC, head excluded.
    ///
    /// # Errors
    ///
    /// A vertex component has no subcomponents.
    pub fn subcomponents(&self) -> AnalysisResult<WtoComponents<'w, N>> {
        match self.kind() {
            WtoComponentKind::Scc => Ok(self.nested()),
            WtoComponentKind::Vertex => Err(AnalysisError::UndefinedOperation(
                "subcomponents of a vertex component".to_string(),
            )),
        }
    }

    pub(crate) fn nested(&self) -> WtoComponents<'w, N> {
        WtoComponents {
            rest: &self.entries[1..],
        }
    }

    /// Every node of the component, head first.
    pub fn nodes(&self) -> impl Iterator<Item = &'w N> + 'w {
        self.entries.iter().map(|entry| &entry.node)
    }
}

impl<'w, N: fmt::Display> fmt::Display for WtoComponent<'w, N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind() {
            WtoComponentKind::Vertex => write!(f, "{}", self.head_node()),
            WtoComponentKind::Scc => {
                write!(f, "({}", self.head_node())?;
                if self.entries.len() > 1 {
                    write!(f, " ")?;
                    fmt_components(self.nested(), f)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Iterator over a sequence of sibling components.
#[derive(Debug)]
pub struct WtoComponents<'w, N> {
    rest: &'w [Entry<N>],
}

impl<'w, N> Clone for WtoComponents<'w, N> {
    fn clone(&self) -> Self {
        Self { rest: self.rest }
    }
}

impl<'w, N> Iterator for WtoComponents<'w, N> {
    type Item = WtoComponent<'w, N>;

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.rest.first()?.span;
        let (entries, rest) = self.rest.split_at(span.min(self.rest.len()));
        self.rest = rest;
        Some(WtoComponent { entries })
    }
}

const INFINITE: u32 = u32::MAX;

/// Pending call of Bourdoncle's mutually recursive `visit` and `component`,
/// holding the successors still to be explored.
enum Frame<N, S> {
    Visit {
        vertex: N,
        succs: S,
        head: u32,
        is_loop: bool,
    },
    Component {
        vertex: N,
        succs: S,
        start: usize,
    },
}

struct Builder<N, F> {
    successors: F,
    /// Depth-first numbers, absent meaning 0.
    dfn: HashMap<N, u32>,
    stack: Vec<N>,
    num: u32,
    /// Entries in reverse order.
    entries: Vec<Entry<N>>,
}

impl<N, F, I> Builder<N, F>
where
    N: Copy + Eq + Hash,
    F: Fn(N) -> I,
    I: IntoIterator<Item = N>,
{
    fn dfn(&self, node: N) -> u32 {
        self.dfn.get(&node).copied().unwrap_or(0)
    }

    fn build(&mut self, root: N) {
        let mut frames = vec![self.enter(root)];
        while let Some(frame) = frames.last_mut() {
            match frame {
                Frame::Visit {
                    vertex,
                    succs,
                    head,
                    is_loop,
                } => match succs.next() {
                    Some(succ) => match self.dfn(succ) {
                        0 => {
                            let callee = self.enter(succ);
                            frames.push(callee);
                        }
                        succ_dfn => {
                            if succ_dfn <= *head {
                                *head = succ_dfn;
                                *is_loop = true;
                            }
                        }
                    },
                    None => {
                        let (vertex, head, is_loop) = (*vertex, *head, *is_loop);
                        frames.pop();
                        if let Some(Frame::Visit {
                            head: caller_head,
                            is_loop: caller_loop,
                            ..
                        }) = frames.last_mut()
                        {
                            if head <= *caller_head {
                                *caller_head = head;
                                *caller_loop = true;
                            }
                        }
                        if let Some(component) = self.leave(vertex, head, is_loop) {
                            frames.push(component);
                        }
                    }
                },
                Frame::Component {
                    vertex,
                    succs,
                    start,
                } => match succs.next() {
                    Some(succ) => {
                        if self.dfn(succ) == 0 {
                            let callee = self.enter(succ);
                            frames.push(callee);
                        }
                    }
                    None => {
                        let (vertex, start) = (*vertex, *start);
                        frames.pop();
                        let span = self.entries.len() - start + 1;
                        self.entries.push(Entry {
                            node: vertex,
                            kind: WtoComponentKind::Scc,
                            span,
                        });
                    }
                },
            }
        }
    }

    fn enter(&mut self, vertex: N) -> Frame<N, I::IntoIter> {
        self.stack.push(vertex);
        self.num += 1;
        self.dfn.insert(vertex, self.num);
        Frame::Visit {
            vertex,
            succs: (self.successors)(vertex).into_iter(),
            head: self.num,
            is_loop: false,
        }
    }

    /// Closes the visit of `vertex` once all its successors were explored,
    /// returning the frame building its component if it heads one.
    fn leave(&mut self, vertex: N, head: u32, is_loop: bool) -> Option<Frame<N, I::IntoIter>> {
        if head != self.dfn(vertex) {
            return None;
        }
        self.dfn.insert(vertex, INFINITE);
        let mut element = self.stack.pop();
        if !is_loop {
            self.entries.push(Entry {
                node: vertex,
                kind: WtoComponentKind::Vertex,
                span: 1,
            });
            return None;
        }
        while let Some(node) = element.filter(|node| *node != vertex) {
            self.dfn.insert(node, 0);
            element = self.stack.pop();
        }
        Some(Frame::Component {
            vertex,
            succs: (self.successors)(vertex).into_iter(),
            start: self.entries.len(),
        })
    }
}

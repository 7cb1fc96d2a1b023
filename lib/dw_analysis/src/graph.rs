//! Graph interface consumed by the weak topological ordering and the fixpoint
//! iterators, with adaptors for `petgraph` graphs and backwards analyses.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// A rooted directed graph.
///
/// Graphs may have cycles, self-loops and nodes that are unreachable from
/// the entry; unreachable nodes are ignored by the analyses.
pub trait Graph {
    type NodeId: Copy + Eq + Hash + fmt::Debug;
    type EdgeId: Copy + Eq + Hash + fmt::Debug;

    fn entry(&self) -> Self::NodeId;

    fn exit(&self) -> Self::NodeId;

    fn predecessors(&self, node: Self::NodeId) -> Vec<Self::EdgeId>;

    fn successors(&self, node: Self::NodeId) -> Vec<Self::EdgeId>;

    fn source(&self, edge: Self::EdgeId) -> Self::NodeId;

    fn target(&self, edge: Self::EdgeId) -> Self::NodeId;

    fn successor_nodes(&self, node: Self::NodeId) -> Vec<Self::NodeId> {
        self.successors(node)
            .into_iter()
            .map(|edge| self.target(edge))
            .collect()
    }
}

impl<G: Graph + ?Sized> Graph for &G {
    type NodeId = G::NodeId;
    type EdgeId = G::EdgeId;

    fn entry(&self) -> Self::NodeId {
        (**self).entry()
    }

    fn exit(&self) -> Self::NodeId {
        (**self).exit()
    }

    fn predecessors(&self, node: Self::NodeId) -> Vec<Self::EdgeId> {
        (**self).predecessors(node)
    }

    fn successors(&self, node: Self::NodeId) -> Vec<Self::EdgeId> {
        (**self).successors(node)
    }

    fn source(&self, edge: Self::EdgeId) -> Self::NodeId {
        (**self).source(edge)
    }

    fn target(&self, edge: Self::EdgeId) -> Self::NodeId {
        (**self).target(edge)
    }
}

/// A `petgraph` directed graph with distinguished entry and exit nodes.
#[derive(Debug, Clone)]
pub struct RootedGraph<N, E> {
    inner: DiGraph<N, E>,
    entry: NodeIndex,
    exit: NodeIndex,
}

impl<N, E> RootedGraph<N, E> {
    pub fn new(inner: DiGraph<N, E>, entry: NodeIndex, exit: NodeIndex) -> Self {
        Self { inner, entry, exit }
    }

    #[inline]
    pub fn inner(&self) -> &DiGraph<N, E> {
        &self.inner
    }

    #[inline]
    pub fn weight(&self, node: NodeIndex) -> Option<&N> {
        self.inner.node_weight(node)
    }

    #[inline]
    pub fn edge_weight(&self, edge: EdgeIndex) -> Option<&E> {
        self.inner.edge_weight(edge)
    }

    fn edges(&self, node: NodeIndex, dir: Direction) -> Vec<EdgeIndex> {
        // petgraph lists the most recently added edges first
        let mut edges: Vec<_> = self
            .inner
            .edges_directed(node, dir)
            .map(|edge| edge.id())
            .collect();
        edges.reverse();
        edges
    }
}

impl<N, E> Graph for RootedGraph<N, E> {
    type NodeId = NodeIndex;
    type EdgeId = EdgeIndex;

    fn entry(&self) -> NodeIndex {
        self.entry
    }

    fn exit(&self) -> NodeIndex {
        self.exit
    }

    fn predecessors(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        self.edges(node, Direction::Incoming)
    }

    fn successors(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        self.edges(node, Direction::Outgoing)
    }

    fn source(&self, edge: EdgeIndex) -> NodeIndex {
        self.inner.raw_edges()[edge.index()].source()
    }

    fn target(&self, edge: EdgeIndex) -> NodeIndex {
        self.inner.raw_edges()[edge.index()].target()
    }
}

/// Reverses a graph: entry and exit are swapped, as are predecessors and
/// successors. Running a forward fixpoint iterator on it performs a
/// backwards analysis of the underlying graph, in which the entry state of
/// a node is the state after the node.
#[derive(Debug, Clone, Copy)]
pub struct BackwardsGraph<G>(pub G);

impl<G: Graph> Graph for BackwardsGraph<G> {
    type NodeId = G::NodeId;
    type EdgeId = G::EdgeId;

    fn entry(&self) -> Self::NodeId {
        self.0.exit()
    }

    fn exit(&self) -> Self::NodeId {
        self.0.entry()
    }

    fn predecessors(&self, node: Self::NodeId) -> Vec<Self::EdgeId> {
        self.0.successors(node)
    }

    fn successors(&self, node: Self::NodeId) -> Vec<Self::EdgeId> {
        self.0.predecessors(node)
    }

    fn source(&self, edge: Self::EdgeId) -> Self::NodeId {
        self.0.target(edge)
    }

    fn target(&self, edge: Self::EdgeId) -> Self::NodeId {
        self.0.source(edge)
    }
}

/// Nodes reachable from the entry, in reverse postorder.
pub fn reverse_postorder<G: Graph>(graph: &G) -> Vec<G::NodeId> {
    let entry = graph.entry();
    let mut visited = HashSet::from([entry]);
    let mut postorder = Vec::new();
    // (node, successors not explored yet)
    let mut stack = vec![(entry, graph.successor_nodes(entry).into_iter())];
    while let Some((node, successors)) = stack.last_mut() {
        match successors.next() {
            Some(succ) => {
                if visited.insert(succ) {
                    let succs = graph.successor_nodes(succ).into_iter();
                    stack.push((succ, succs));
                }
            }
            None => {
                postorder.push(*node);
                stack.pop();
            }
        }
    }
    postorder.reverse();
    postorder
}

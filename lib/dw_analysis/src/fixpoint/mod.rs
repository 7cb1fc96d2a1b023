//! Monotonic fixpoint iterators.
//!
//! Three iterators share the same node and edge semantics, given by a
//! [`FixpointTransformer`]:
//! - [`WtoMonotonicFixpointIterator`] follows a weak topological ordering of
//!   the graph and widens at the heads of its strongly connected components;
//! - [`MonotonicFixpointIterator`] uses a worklist in reverse postorder and
//!   widens at the targets of retreating edges;
//! - [`ParallelMonotonicFixpointIterator`] analyzes independent top-level
//!   components of the weak topological ordering concurrently.
//!
//! After a run, for every reachable node `v`, every predecessor edge `e` from
//! `u` and the transformer `t`:
//! `t.analyze_edge(e, exit[u]) <= entry[v]` and
//! `t.analyze_node(v, entry[v]) <= exit[v]`.

use crate::graph::Graph;
use crate::wto::{WtoComponent, WtoComponentKind};
use dw_domains::AbstractDomain;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

mod monotonic;
mod parallel;
mod wto;

pub use monotonic::MonotonicFixpointIterator;
pub use parallel::ParallelMonotonicFixpointIterator;
pub use wto::WtoMonotonicFixpointIterator;

/// Abstract semantics of the nodes and edges of a graph.
pub trait FixpointTransformer<G: Graph, D: AbstractDomain> {
    type Error;

    /// Turns the entry state of a node into its exit state. Must be monotone.
    ///
    /// # Errors
    ///
    /// Errors are not caught by the iterators and abort the analysis.
    fn analyze_node(&self, node: G::NodeId, state: &mut D) -> Result<(), Self::Error>;

    /// State flowing along an edge, given the exit state of its source.
    /// Must be monotone.
    ///
    /// # Errors
    ///
    /// Errors are not caught by the iterators and abort the analysis.
    fn analyze_edge(&self, _edge: G::EdgeId, source_exit: &D) -> Result<D, Self::Error> {
        Ok(source_exit.clone())
    }
}

/// Interface shared by the fixpoint iterators.
pub trait FixpointIterator<G: Graph, D: AbstractDomain> {
    type Error;

    /// Computes the fixpoint, the entry state of the graph entry being
    /// `init`. Previous results are discarded.
    ///
    /// # Errors
    ///
    /// Transformer errors are returned as is.
    fn run(&mut self, init: D) -> Result<(), Self::Error>;

    /// Entry state of a node, bottom for unreachable nodes.
    fn get_entry_state_at(&self, node: G::NodeId) -> D;

    /// Exit state of a node, bottom for unreachable nodes.
    fn get_exit_state_at(&self, node: G::NodeId) -> D;
}

/// Fixpoint iterators configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixpointConfig {
    /// Number of plain joins at a widening point before widening.
    pub widening_delay: usize,
    /// Number of decreasing passes once the ascending iteration is stable.
    pub narrowing_iterations: usize,
}

/// Fixpoint result: entry and exit abstract states of every reached node.
#[derive(Debug, Clone)]
pub struct Dataflow<N, D> {
    pub entries: HashMap<N, D>,
    pub exits: HashMap<N, D>,
}

impl<N, D> Default for Dataflow<N, D> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            exits: HashMap::new(),
        }
    }
}

impl<N: Eq + Hash, D: AbstractDomain> Dataflow<N, D> {
    pub fn entry_state(&self, node: &N) -> D {
        self.entries.get(node).cloned().unwrap_or_else(D::bottom)
    }

    pub fn exit_state(&self, node: &N) -> D {
        self.exits.get(node).cloned().unwrap_or_else(D::bottom)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.exits.clear();
    }
}

/// Sequential iteration over a dataflow owned by the caller.
pub(crate) struct Engine<'a, G: Graph, T, D> {
    pub(crate) graph: &'a G,
    pub(crate) transformer: &'a T,
    pub(crate) config: &'a FixpointConfig,
    pub(crate) init: &'a D,
    pub(crate) dataflow: &'a mut Dataflow<G::NodeId, D>,
}

impl<'a, G, T, D> Engine<'a, G, T, D>
where
    G: Graph,
    T: FixpointTransformer<G, D>,
    D: AbstractDomain,
{
    /// Joins the states flowing from the already analyzed predecessors.
    pub(crate) fn compute_entry_state(&self, node: G::NodeId) -> Result<D, T::Error> {
        let mut state = if node == self.graph.entry() {
            self.init.clone()
        } else {
            D::bottom()
        };
        for edge in self.graph.predecessors(node) {
            if let Some(exit) = self.dataflow.exits.get(&self.graph.source(edge)) {
                state.join_with(&self.transformer.analyze_edge(edge, exit)?);
            }
        }
        Ok(state)
    }

    pub(crate) fn entry_state(&self, node: &G::NodeId) -> Option<&D> {
        self.dataflow.entries.get(node)
    }

    /// Records the entry state of a node and computes its exit state.
    pub(crate) fn analyze_node_at(&mut self, node: G::NodeId, entry: D) -> Result<(), T::Error> {
        let mut exit = entry.clone();
        self.transformer.analyze_node(node, &mut exit)?;
        log::trace!("{node:?}: entry {entry:?}");
        log::trace!("{node:?}: exit  {exit:?}");
        self.dataflow.entries.insert(node, entry);
        self.dataflow.exits.insert(node, exit);
        Ok(())
    }

    pub(crate) fn analyze_component(
        &mut self,
        component: &WtoComponent<'_, G::NodeId>,
    ) -> Result<(), T::Error> {
        match component.kind() {
            WtoComponentKind::Vertex => {
                let node = *component.head_node();
                let entry = self.compute_entry_state(node)?;
                self.analyze_node_at(node, entry)
            }
            WtoComponentKind::Scc => self.analyze_scc(component),
        }
    }

    /// Analyzes the head with the given entry state, then the rest of the
    /// component, and returns the new entry state of the head.
    fn analyze_scc_body(
        &mut self,
        scc: &WtoComponent<'_, G::NodeId>,
        head_entry: D,
    ) -> Result<D, T::Error> {
        let head = *scc.head_node();
        self.analyze_node_at(head, head_entry)?;
        for component in scc.nested() {
            self.analyze_component(&component)?;
        }
        self.compute_entry_state(head)
    }

    fn analyze_scc(&mut self, scc: &WtoComponent<'_, G::NodeId>) -> Result<(), T::Error> {
        let head = *scc.head_node();
        let mut current = self.compute_entry_state(head)?;
        let mut iteration = 0;
        let mut new = loop {
            let new = self.analyze_scc_body(scc, current.clone())?;
            if new.leq(&current) {
                break new;
            }
            if iteration < self.config.widening_delay {
                current.join_with(&new);
            } else {
                log::debug!("widening at {head:?} (iteration {iteration})");
                current.widen_with(&new);
            }
            iteration += 1;
        };

        for _ in 0..self.config.narrowing_iterations {
            let narrowed = current.narrow(&new);
            if narrowed.equals(&current) {
                break;
            }
            log::debug!("narrowing at {head:?}");
            current = narrowed;
            new = self.analyze_scc_body(scc, current.clone())?;
        }

        log::debug!("component headed by {head:?} stable after {iteration} iterations");
        Ok(())
    }
}

use super::{Dataflow, Engine, FixpointConfig, FixpointIterator, FixpointTransformer};
use crate::graph::{reverse_postorder, Graph};
use dw_domains::AbstractDomain;
use fixedbitset::FixedBitSet;
use std::collections::{BTreeSet, HashMap};

/// Sequential worklist fixpoint iterator.
///
/// Nodes are picked in reverse postorder. Targets of retreating edges are
/// widening points, which makes every cycle go through one of them.
#[derive(Debug)]
pub struct MonotonicFixpointIterator<G: Graph, T, D> {
    graph: G,
    transformer: T,
    config: FixpointConfig,
    dataflow: Dataflow<G::NodeId, D>,
}

impl<G, T, D> MonotonicFixpointIterator<G, T, D>
where
    G: Graph,
    T: FixpointTransformer<G, D>,
    D: AbstractDomain,
{
    pub fn new(graph: G, transformer: T) -> Self {
        Self::with_config(graph, transformer, FixpointConfig::default())
    }

    pub fn with_config(graph: G, transformer: T, config: FixpointConfig) -> Self {
        Self {
            graph,
            transformer,
            config,
            dataflow: Dataflow::default(),
        }
    }

    #[inline]
    pub fn dataflow(&self) -> &Dataflow<G::NodeId, D> {
        &self.dataflow
    }

    #[inline]
    pub fn into_dataflow(self) -> Dataflow<G::NodeId, D> {
        self.dataflow
    }
}

impl<G, T, D> FixpointIterator<G, D> for MonotonicFixpointIterator<G, T, D>
where
    G: Graph,
    T: FixpointTransformer<G, D>,
    D: AbstractDomain,
{
    type Error = T::Error;

    fn run(&mut self, init: D) -> Result<(), T::Error> {
        self.dataflow.clear();
        let order = reverse_postorder(&self.graph);
        let index: HashMap<G::NodeId, usize> =
            order.iter().enumerate().map(|(i, node)| (*node, i)).collect();

        let mut widening_points = FixedBitSet::with_capacity(order.len());
        for (i, node) in order.iter().enumerate() {
            let retreating = self
                .graph
                .predecessors(*node)
                .into_iter()
                .filter_map(|edge| index.get(&self.graph.source(edge)))
                .any(|j| *j >= i);
            widening_points.set(i, retreating);
        }
        log::debug!(
            "{} nodes, {} widening points",
            order.len(),
            widening_points.count_ones(..)
        );

        let mut engine = Engine {
            graph: &self.graph,
            transformer: &self.transformer,
            config: &self.config,
            init: &init,
            dataflow: &mut self.dataflow,
        };

        let mut iterations = vec![0; order.len()];
        let mut worklist = BTreeSet::from([0]);
        while let Some(i) = worklist.pop_first() {
            let node = order[i];
            let mut entry = engine.compute_entry_state(node)?;
            if let Some(old) = engine.entry_state(&node) {
                if entry.leq(old) && (widening_points.contains(i) || old.leq(&entry)) {
                    continue;
                }
                if widening_points.contains(i) {
                    let mut extrapolated = old.clone();
                    if iterations[i] < engine.config.widening_delay {
                        extrapolated.join_with(&entry);
                    } else {
                        log::debug!("widening at {node:?} (iteration {})", iterations[i]);
                        extrapolated.widen_with(&entry);
                    }
                    iterations[i] += 1;
                    entry = extrapolated;
                }
            }
            engine.analyze_node_at(node, entry)?;
            for succ in engine.graph.successor_nodes(node) {
                if let Some(j) = index.get(&succ) {
                    worklist.insert(*j);
                }
            }
        }

        for pass in 0..engine.config.narrowing_iterations {
            let mut changed = false;
            for (i, node) in order.iter().enumerate() {
                let new = engine.compute_entry_state(*node)?;
                let old = engine.entry_state(node).cloned().unwrap_or_else(D::bottom);
                let entry = if widening_points.contains(i) {
                    old.narrow(&new)
                } else {
                    new
                };
                changed |= !entry.equals(&old);
                engine.analyze_node_at(*node, entry)?;
            }
            if !changed {
                log::debug!("narrowing stable after {pass} passes");
                break;
            }
        }
        Ok(())
    }

    fn get_entry_state_at(&self, node: G::NodeId) -> D {
        self.dataflow.entry_state(&node)
    }

    fn get_exit_state_at(&self, node: G::NodeId) -> D {
        self.dataflow.exit_state(&node)
    }
}

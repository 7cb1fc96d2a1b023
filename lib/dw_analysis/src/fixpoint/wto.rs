use super::{Dataflow, Engine, FixpointConfig, FixpointIterator, FixpointTransformer};
use crate::graph::Graph;
use crate::wto::WeakTopologicalOrdering;
use dw_domains::AbstractDomain;

/// Sequential fixpoint iterator driven by a weak topological ordering.
///
/// Components are analyzed in order. The head of a strongly connected
/// component is the only widening point of that component: its body is
/// analyzed again until the entry state of the head is stable.
#[derive(Debug)]
pub struct WtoMonotonicFixpointIterator<G: Graph, T, D> {
    graph: G,
    transformer: T,
    config: FixpointConfig,
    wto: WeakTopologicalOrdering<G::NodeId>,
    dataflow: Dataflow<G::NodeId, D>,
}

impl<G, T, D> WtoMonotonicFixpointIterator<G, T, D>
where
    G: Graph,
    T: FixpointTransformer<G, D>,
    D: AbstractDomain,
{
    pub fn new(graph: G, transformer: T) -> Self {
        Self::with_config(graph, transformer, FixpointConfig::default())
    }

    pub fn with_config(graph: G, transformer: T, config: FixpointConfig) -> Self {
        let wto = WeakTopologicalOrdering::from_graph(&graph);
        Self {
            graph,
            transformer,
            config,
            wto,
            dataflow: Dataflow::default(),
        }
    }

    #[inline]
    pub fn wto(&self) -> &WeakTopologicalOrdering<G::NodeId> {
        &self.wto
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

impl<G, T, D> FixpointIterator<G, D> for WtoMonotonicFixpointIterator<G, T, D>
where
    G: Graph,
    T: FixpointTransformer<G, D>,
    D: AbstractDomain,
{
    type Error = T::Error;

    fn run(&mut self, init: D) -> Result<(), T::Error> {
        self.dataflow.clear();
        let mut engine = Engine {
            graph: &self.graph,
            transformer: &self.transformer,
            config: &self.config,
            init: &init,
            dataflow: &mut self.dataflow,
        };
        for component in self.wto.components() {
            engine.analyze_component(&component)?;
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

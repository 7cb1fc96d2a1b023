use super::{Dataflow, Engine, FixpointConfig, FixpointIterator, FixpointTransformer};
use crate::errors::ParallelFixpointError;
use crate::graph::Graph;
use crate::wto::{WeakTopologicalOrdering, WtoComponent};
use dw_domains::AbstractDomain;
use dw_utils::workqueue::{self, WorkQueueOptions, WorkerContext};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// Fixpoint iterator analyzing the top-level components of a weak
/// topological ordering on a work queue.
///
/// A component becomes a task once all the components it has predecessors in
/// are done. Each task iterates sequentially over its component, reading the
/// published exit states of its external predecessors, then publishes the
/// states of its own nodes. The result is the one of
/// [`WtoMonotonicFixpointIterator`](super::WtoMonotonicFixpointIterator).
#[derive(Debug)]
pub struct ParallelMonotonicFixpointIterator<G: Graph, T, D> {
    graph: G,
    transformer: T,
    config: FixpointConfig,
    options: WorkQueueOptions,
    wto: WeakTopologicalOrdering<G::NodeId>,
    dataflow: Dataflow<G::NodeId, D>,
}

impl<G, T, D> ParallelMonotonicFixpointIterator<G, T, D>
where
    G: Graph,
    T: FixpointTransformer<G, D>,
    D: AbstractDomain,
{
    pub fn new(graph: G, transformer: T) -> Self {
        Self::with_config(
            graph,
            transformer,
            FixpointConfig::default(),
            WorkQueueOptions::default(),
        )
    }

    /// The `push_tasks_while_running` flag of `options` is ignored: tasks are
    /// always pushed as their dependencies complete.
    pub fn with_config(
        graph: G,
        transformer: T,
        config: FixpointConfig,
        options: WorkQueueOptions,
    ) -> Self {
        let wto = WeakTopologicalOrdering::from_graph(&graph);
        Self {
            graph,
            transformer,
            config,
            options: WorkQueueOptions {
                push_tasks_while_running: true,
                ..options
            },
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

struct Schedule<'w, N> {
    components: Vec<WtoComponent<'w, N>>,
    owner: HashMap<N, usize>,
    dependents: Vec<Vec<usize>>,
    remaining: Vec<AtomicUsize>,
}

impl<'w, N: Copy + Eq + std::hash::Hash> Schedule<'w, N> {
    fn new<G: Graph<NodeId = N>>(graph: &G, wto: &'w WeakTopologicalOrdering<N>) -> Self {
        let components: Vec<_> = wto.components().collect();
        let owner: HashMap<N, usize> = components
            .iter()
            .enumerate()
            .flat_map(|(i, component)| component.nodes().map(move |node| (*node, i)))
            .collect();

        let mut dependents = vec![Vec::new(); components.len()];
        let mut remaining = Vec::with_capacity(components.len());
        for (i, component) in components.iter().enumerate() {
            let dependencies: HashSet<usize> = component
                .nodes()
                .flat_map(|node| graph.predecessors(*node))
                .filter_map(|edge| owner.get(&graph.source(edge)).copied())
                .filter(|j| *j != i)
                .collect();
            for j in &dependencies {
                dependents[*j].push(i);
            }
            remaining.push(AtomicUsize::new(dependencies.len()));
        }

        Self {
            components,
            owner,
            dependents,
            remaining,
        }
    }

    fn ready(&self) -> Vec<usize> {
        (0..self.components.len())
            .filter(|i| self.remaining[*i].load(Ordering::Acquire) == 0)
            .collect()
    }
}

impl<G, T, D> FixpointIterator<G, D> for ParallelMonotonicFixpointIterator<G, T, D>
where
    G: Graph + Sync,
    G::NodeId: Send + Sync,
    T: FixpointTransformer<G, D> + Sync,
    T::Error: Send,
    D: AbstractDomain + Send + Sync,
{
    type Error = ParallelFixpointError<T::Error>;

    fn run(&mut self, init: D) -> Result<(), Self::Error> {
        let graph = &self.graph;
        let transformer = &self.transformer;
        let config = &self.config;
        let schedule = Schedule::new(graph, &self.wto);
        let published: RwLock<Dataflow<G::NodeId, D>> = RwLock::new(Dataflow::default());
        log::debug!(
            "{} top-level components, {} ready",
            schedule.components.len(),
            schedule.ready().len()
        );

        let analyze = |ctx: &WorkerContext<'_, usize>, i: usize| -> Result<(), Self::Error> {
            let component = &schedule.components[i];
            let mut local = Dataflow::default();
            {
                let published = published.read().unwrap_or_else(PoisonError::into_inner);
                for node in component.nodes() {
                    for edge in graph.predecessors(*node) {
                        let source = graph.source(edge);
                        if schedule.owner.get(&source) == Some(&i) {
                            continue;
                        }
                        if let Some(exit) = published.exits.get(&source) {
                            local.exits.insert(source, exit.clone());
                        }
                    }
                }
            }

            Engine {
                graph,
                transformer,
                config,
                init: &init,
                dataflow: &mut local,
            }
            .analyze_component(component)
            .map_err(ParallelFixpointError::Transformer)?;
            log::trace!("component {i} analyzed by worker {}", ctx.worker_id());

            {
                let mut published = published.write().unwrap_or_else(PoisonError::into_inner);
                for node in component.nodes() {
                    if let Some(entry) = local.entries.remove(node) {
                        published.entries.insert(*node, entry);
                    }
                    if let Some(exit) = local.exits.remove(node) {
                        published.exits.insert(*node, exit);
                    }
                }
            }

            for j in &schedule.dependents[i] {
                if schedule.remaining[*j].fetch_sub(1, Ordering::AcqRel) == 1 {
                    ctx.push_task(*j)?;
                }
            }
            Ok(())
        };

        workqueue::run(analyze, schedule.ready(), &self.options)?;
        self.dataflow = published
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(())
    }

    fn get_entry_state_at(&self, node: G::NodeId) -> D {
        self.dataflow.entry_state(&node)
    }

    fn get_exit_state_at(&self, node: G::NodeId) -> D {
        self.dataflow.exit_state(&node)
    }
}

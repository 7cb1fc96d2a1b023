//! Weak topological orderings and monotonic fixpoint iterators computing
//! abstract interpretations over arbitrary rooted graphs.
//!
//! ```
//! use dw_analysis::prelude::*;
//! use dw_domains::prelude::*;
//! use petgraph::graph::DiGraph;
//! use std::convert::Infallible;
//!
//! // counts loop iterations along a back edge
//! struct Counter {
//!     back: EdgeIndex,
//! }
//!
//! impl<'g> FixpointTransformer<&'g RootedGraph<(), ()>, IntervalDomain<i32>> for Counter {
//!     type Error = Infallible;
//!
//!     fn analyze_node(&self, _: NodeIndex, _: &mut IntervalDomain<i32>) -> Result<(), Infallible> {
//!         Ok(())
//!     }
//!
//!     fn analyze_edge(
//!         &self,
//!         edge: EdgeIndex,
//!         exit: &IntervalDomain<i32>,
//!     ) -> Result<IntervalDomain<i32>, Infallible> {
//!         if edge == self.back {
//!             Ok(exit.add(&IntervalDomain::singleton(1).unwrap()))
//!         } else {
//!             Ok(exit.clone())
//!         }
//!     }
//! }
//!
//! let mut graph = DiGraph::new();
//! let head = graph.add_node(());
//! let exit = graph.add_node(());
//! graph.add_edge(head, exit, ());
//! let back = graph.add_edge(head, head, ());
//! let graph = RootedGraph::new(graph, head, exit);
//!
//! let mut fixpoint = WtoMonotonicFixpointIterator::new(&graph, Counter { back });
//! fixpoint.run(IntervalDomain::singleton(0).unwrap()).unwrap();
//! assert_eq!(
//!     fixpoint.get_entry_state_at(head),
//!     IntervalDomain::bounded_below(0).unwrap()
//! );
//! ```

pub mod errors;
pub mod fixpoint;
pub mod graph;
pub mod wto;

pub mod prelude {
    pub use crate::errors::{AnalysisError, AnalysisResult, ParallelFixpointError};
    pub use crate::fixpoint::{
        Dataflow, FixpointConfig, FixpointIterator, FixpointTransformer,
        MonotonicFixpointIterator, ParallelMonotonicFixpointIterator,
        WtoMonotonicFixpointIterator,
    };
    pub use crate::graph::{reverse_postorder, BackwardsGraph, Graph, RootedGraph};
    pub use crate::wto::{WeakTopologicalOrdering, WtoComponent, WtoComponentKind};
    pub use petgraph::graph::{EdgeIndex, NodeIndex};
}

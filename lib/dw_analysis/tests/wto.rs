use dw_analysis::prelude::*;
use petgraph::graph::DiGraph;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

fn successors(edges: &[(u32, u32)]) -> BTreeMap<u32, Vec<u32>> {
    let mut succs: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (src, dst) in edges {
        succs.entry(*src).or_default().push(*dst);
    }
    succs
}

fn build(root: u32, edges: &[(u32, u32)]) -> WeakTopologicalOrdering<u32> {
    let succs = successors(edges);
    WeakTopologicalOrdering::new(root, |n| succs.get(&n).cloned().unwrap_or_default())
}

const BOURDONCLE: [(u32, u32); 11] = [
    (1, 2),
    (2, 3),
    (3, 4),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (2, 8),
    (4, 7),
    (6, 5),
    (7, 3),
];

#[test]
fn bourdoncle_example() {
    let wto = build(1, &BOURDONCLE);
    assert_eq!(wto.to_string(), "1 2 (3 4 (5 6) 7) 8");
    assert_eq!(wto.len(), 8);

    let top: Vec<_> = wto.components().map(|c| (*c.head_node(), c.kind())).collect();
    assert_eq!(
        top,
        vec![
            (1, WtoComponentKind::Vertex),
            (2, WtoComponentKind::Vertex),
            (3, WtoComponentKind::Scc),
            (8, WtoComponentKind::Vertex),
        ]
    );
    let scc = wto.components().nth(2).unwrap();
    let nested: Vec<_> = scc
        .subcomponents()
        .unwrap()
        .map(|c| c.to_string())
        .collect();
    assert_eq!(nested, vec!["4", "(5 6)", "7"]);
    assert!(matches!(
        wto.components().next().unwrap().subcomponents(),
        Err(AnalysisError::UndefinedOperation(_))
    ));
}

#[test]
fn bourdoncle_example_on_a_petgraph() {
    let mut graph = DiGraph::new();
    let nodes: HashMap<u32, NodeIndex> = (1..=8).map(|n| (n, graph.add_node(n))).collect();
    for (src, dst) in BOURDONCLE {
        graph.add_edge(nodes[&src], nodes[&dst], ());
    }
    let graph = RootedGraph::new(graph, nodes[&1], nodes[&8]);
    let wto = WeakTopologicalOrdering::from_graph(&graph);
    let order: Vec<u32> = wto.nodes().map(|n| *graph.weight(*n).unwrap()).collect();
    assert_eq!(order, vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn long_chain() {
    let wto = WeakTopologicalOrdering::new(0u32, |n| if n < 200_000 { vec![n + 1] } else { vec![] });
    assert_eq!(wto.len(), 200_001);
    assert_eq!(wto.components().count(), 200_001);
    assert!(wto.components().all(|c| c.is_vertex()));
    assert!(wto.nodes().copied().eq(0..=200_000));
}

#[test]
fn long_cycle() {
    const N: u32 = 100_000;
    let wto = WeakTopologicalOrdering::new(0u32, |n| vec![(n + 1) % N]);
    assert_eq!(wto.len(), N as usize);
    let components: Vec<_> = wto.components().collect();
    assert_eq!(components.len(), 1);
    assert!(components[0].is_scc());
    assert_eq!(*components[0].head_node(), 0);
    let nested = components[0].subcomponents().unwrap();
    assert!(nested.clone().all(|c| c.is_vertex()));
    assert!(nested.map(|c| *c.head_node()).eq(1..N));
}

fn arb_graph() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((0u32..12, 0u32..12), 0..40)
}

fn reachable(root: u32, edges: &[(u32, u32)]) -> BTreeSet<u32> {
    let succs = successors(edges);
    let mut seen = BTreeSet::from([root]);
    let mut stack = vec![root];
    while let Some(n) = stack.pop() {
        for s in succs.get(&n).into_iter().flatten() {
            if seen.insert(*s) {
                stack.push(*s);
            }
        }
    }
    seen
}

proptest! {
    #[test]
    fn every_reachable_node_appears_once(edges in arb_graph()) {
        let wto = build(0, &edges);
        let nodes: Vec<u32> = wto.nodes().copied().collect();
        let unique: BTreeSet<u32> = nodes.iter().copied().collect();
        prop_assert_eq!(nodes.len(), unique.len());
        prop_assert_eq!(unique, reachable(0, &edges));
    }

    #[test]
    fn top_level_components_respect_edges(edges in arb_graph()) {
        let wto = build(0, &edges);
        let mut position = HashMap::new();
        for (i, component) in wto.components().enumerate() {
            for node in component.nodes() {
                position.insert(*node, i);
            }
        }
        for (src, dst) in &edges {
            if let (Some(i), Some(j)) = (position.get(src), position.get(dst)) {
                prop_assert!(i <= j, "edge {} -> {} goes backwards", src, dst);
            }
        }
    }

    #[test]
    fn back_edges_target_enclosing_heads(edges in arb_graph()) {
        let wto = build(0, &edges);
        let position: HashMap<u32, usize> =
            wto.nodes().enumerate().map(|(i, n)| (*n, i)).collect();
        let mut loops: Vec<(u32, BTreeSet<u32>)> = Vec::new();
        wto.visit_depth_first(|component| {
            if component.is_scc() {
                loops.push((*component.head_node(), component.nodes().copied().collect()));
            }
        });
        for (src, dst) in &edges {
            let (Some(i), Some(j)) = (position.get(src), position.get(dst)) else {
                continue;
            };
            if j <= i {
                prop_assert!(
                    loops.iter().any(|(head, nodes)| head == dst && nodes.contains(src)),
                    "back edge {} -> {} does not close a component headed by {}",
                    src,
                    dst,
                    dst
                );
            }
        }
    }
}

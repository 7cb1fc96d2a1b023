use dw_analysis::prelude::*;
use dw_domains::prelude::*;
use dw_utils::workqueue::{Runner, WorkQueueOptions};
use petgraph::graph::DiGraph;
use std::convert::Infallible;

// ---------------------------------------------------------------------------
// Liveness over a powerset of variable names, computed backwards.
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct UsedVars {
    defs: Vec<&'static str>,
    uses: Vec<&'static str>,
}

fn stmt(defs: &[&'static str], uses: &[&'static str]) -> UsedVars {
    UsedVars {
        defs: defs.to_vec(),
        uses: uses.to_vec(),
    }
}

type Live = HashedSetDomain<&'static str>;

struct Liveness<'g> {
    graph: &'g RootedGraph<UsedVars, ()>,
}

impl<'g> FixpointTransformer<BackwardsGraph<&'g RootedGraph<UsedVars, ()>>, Live> for Liveness<'g> {
    type Error = Infallible;

    fn analyze_node(&self, node: NodeIndex, live: &mut Live) -> Result<(), Infallible> {
        if let Some(stmt) = self.graph.weight(node) {
            for def in &stmt.defs {
                live.remove(def);
            }
            live.add_elements(stmt.uses.iter().copied());
        }
        Ok(())
    }
}

/// `a = 0; loop: b = a + 1; c = c + b; a = b * 2; if (a < 9) goto loop; return c;`
fn loop_program() -> (RootedGraph<UsedVars, ()>, Vec<NodeIndex>) {
    let mut graph = DiGraph::new();
    let n1 = graph.add_node(stmt(&["a"], &[]));
    let n2 = graph.add_node(stmt(&["b"], &["a"]));
    let n3 = graph.add_node(stmt(&["c"], &["c", "b"]));
    let n4 = graph.add_node(stmt(&["a"], &["b"]));
    let n5 = graph.add_node(stmt(&[], &["a"]));
    let n6 = graph.add_node(stmt(&[], &["c"]));
    graph.add_edge(n1, n2, ());
    graph.add_edge(n2, n3, ());
    graph.add_edge(n3, n4, ());
    graph.add_edge(n4, n5, ());
    graph.add_edge(n5, n2, ());
    graph.add_edge(n5, n6, ());
    (RootedGraph::new(graph, n1, n6), vec![n1, n2, n3, n4, n5, n6])
}

fn live_set(vars: &[&'static str]) -> Live {
    Live::from_elements(vars.iter().copied())
}

#[test]
fn powerset_liveness() {
    let (graph, nodes) = loop_program();
    let backwards = BackwardsGraph(&graph);
    let mut fixpoint = WtoMonotonicFixpointIterator::new(backwards, Liveness { graph: &graph });
    fixpoint.run(Live::empty()).unwrap();

    // exit states of the backwards analysis are live-in sets
    let live_in = |i: usize| fixpoint.get_exit_state_at(nodes[i - 1]);
    assert_eq!(live_in(1), live_set(&["c"]));
    assert_eq!(live_in(2), live_set(&["a", "c"]));
    assert_eq!(live_in(3), live_set(&["b", "c"]));
    assert_eq!(live_in(4), live_set(&["b", "c"]));
    assert_eq!(live_in(5), live_set(&["a", "c"]));
    assert_eq!(live_in(6), live_set(&["c"]));
    assert_eq!(fixpoint.get_entry_state_at(nodes[5]), Live::empty());
    assert_eq!(fixpoint.wto().components().filter(|c| c.is_scc()).count(), 1);
}

#[test]
fn worklist_liveness_agrees() {
    let (graph, nodes) = loop_program();
    let mut wto = WtoMonotonicFixpointIterator::new(BackwardsGraph(&graph), Liveness { graph: &graph });
    let mut worklist =
        MonotonicFixpointIterator::new(BackwardsGraph(&graph), Liveness { graph: &graph });
    wto.run(Live::empty()).unwrap();
    worklist.run(Live::empty()).unwrap();
    for node in nodes {
        assert_eq!(wto.get_entry_state_at(node), worklist.get_entry_state_at(node));
        assert_eq!(wto.get_exit_state_at(node), worklist.get_exit_state_at(node));
    }
}

// ---------------------------------------------------------------------------
// Constants and intervals over a small imperative language.
// ---------------------------------------------------------------------------

type Pair = (ConstantDomain<i32>, IntervalDomain<i32>);

struct ConstantInterval;

impl Reduction<Pair> for ConstantInterval {
    fn reduce((constant, interval): &mut Pair) {
        if let Some(c) = constant.get_constant().copied() {
            if !interval.contains(c) {
                interval.set_to_bottom();
            } else if let Ok(singleton) = IntervalDomain::singleton(c) {
                *interval = singleton;
            }
        } else if interval.is_finite() && interval.lower_bound() == interval.upper_bound() {
            if let Some(n) = interval.lower_bound() {
                *constant = ConstantDomain::value(n);
            }
        }
    }
}

type Value = ReducedProduct<Pair, ConstantInterval>;
type Env = HashedAbstractEnvironment<&'static str, Value>;

fn int(n: i32) -> Value {
    Value::new((ConstantDomain::value(n), IntervalDomain::singleton(n).unwrap()))
}

#[derive(Debug, Clone, Copy)]
enum Expr {
    Lit(i32),
    AddConst(&'static str, i32),
}

#[derive(Debug, Clone, Copy)]
enum Stmt {
    Assign(&'static str, Expr),
    Skip,
    Fail,
}

#[derive(Debug, Clone, Copy)]
enum Guard {
    Always,
    Less(&'static str, i32),
    AtLeast(&'static str, i32),
}

fn eval(env: &Env, expr: Expr) -> Value {
    match expr {
        Expr::Lit(n) => int(n),
        Expr::AddConst(var, k) => {
            let (constant, interval) = env.get(&var).into_components();
            let constant = match constant.get_constant().map(|c| c.checked_add(k)) {
                Some(Some(sum)) => ConstantDomain::value(sum),
                _ if constant.is_bottom() => ConstantDomain::bottom(),
                _ => ConstantDomain::top(),
            };
            let interval = interval.add(&IntervalDomain::singleton(k).unwrap());
            Value::new((constant, interval))
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Failed(NodeIndex);

struct Interpreter<'g> {
    graph: &'g RootedGraph<Stmt, Guard>,
}

impl<'g> FixpointTransformer<&'g RootedGraph<Stmt, Guard>, Env> for Interpreter<'g> {
    type Error = Failed;

    fn analyze_node(&self, node: NodeIndex, env: &mut Env) -> Result<(), Failed> {
        match self.graph.weight(node) {
            Some(Stmt::Assign(var, expr)) => {
                let value = eval(env, *expr);
                env.set(*var, value);
            }
            Some(Stmt::Fail) => return Err(Failed(node)),
            Some(Stmt::Skip) | None => (),
        }
        Ok(())
    }

    fn analyze_edge(&self, edge: EdgeIndex, exit: &Env) -> Result<Env, Failed> {
        let bound = match self.graph.edge_weight(edge) {
            Some(Guard::Less(var, n)) => Some((*var, IntervalDomain::bounded_above(n - 1))),
            Some(Guard::AtLeast(var, n)) => Some((*var, IntervalDomain::bounded_below(*n))),
            Some(Guard::Always) | None => None,
        };
        let mut env = exit.clone();
        if let Some((var, Ok(bound))) = bound {
            let mut value = env.get(&var);
            value.apply(|(_, interval)| interval.meet_with(&bound));
            env.set(var, value);
        }
        Ok(env)
    }
}

fn interval_of(env: &Env, var: &'static str) -> IntervalDomain<i32> {
    env.get(&var).components().1
}

/// `x := 1; y := x + 1`
#[test]
fn constant_interval_straight_line() {
    let mut graph = DiGraph::new();
    let n1 = graph.add_node(Stmt::Assign("x", Expr::Lit(1)));
    let n2 = graph.add_node(Stmt::Assign("y", Expr::AddConst("x", 1)));
    graph.add_edge(n1, n2, Guard::Always);
    let graph = RootedGraph::new(graph, n1, n2);

    let mut fixpoint = WtoMonotonicFixpointIterator::new(&graph, Interpreter { graph: &graph });
    fixpoint.run(Env::top()).unwrap();

    let exit = fixpoint.get_exit_state_at(n2);
    assert_eq!(exit.get(&"x"), int(1));
    assert_eq!(exit.get(&"y"), int(2));
    assert_eq!(exit.get(&"x").components().0.get_constant(), Some(&1));
    assert_eq!(
        exit.get(&"y").components().1,
        IntervalDomain::finite(2, 2).unwrap()
    );
    assert!(fixpoint.get_entry_state_at(n1).is_top());
}

/// `x := 1; while (?) x := x + 1;`
fn unbounded_loop() -> (RootedGraph<Stmt, Guard>, [NodeIndex; 4]) {
    let mut graph = DiGraph::new();
    let init = graph.add_node(Stmt::Assign("x", Expr::Lit(1)));
    let head = graph.add_node(Stmt::Skip);
    let body = graph.add_node(Stmt::Assign("x", Expr::AddConst("x", 1)));
    let exit = graph.add_node(Stmt::Skip);
    graph.add_edge(init, head, Guard::Always);
    graph.add_edge(head, body, Guard::Always);
    graph.add_edge(body, head, Guard::Always);
    graph.add_edge(head, exit, Guard::Always);
    (RootedGraph::new(graph, init, exit), [init, head, body, exit])
}

/// `x := 1; while (x < 10) x := x + 1;`
fn bounded_loop() -> (RootedGraph<Stmt, Guard>, [NodeIndex; 4]) {
    let mut graph = DiGraph::new();
    let init = graph.add_node(Stmt::Assign("x", Expr::Lit(1)));
    let head = graph.add_node(Stmt::Skip);
    let body = graph.add_node(Stmt::Assign("x", Expr::AddConst("x", 1)));
    let exit = graph.add_node(Stmt::Skip);
    graph.add_edge(init, head, Guard::Always);
    graph.add_edge(head, body, Guard::Less("x", 10));
    graph.add_edge(body, head, Guard::Always);
    graph.add_edge(head, exit, Guard::AtLeast("x", 10));
    (RootedGraph::new(graph, init, exit), [init, head, body, exit])
}

#[test]
fn interval_widening_across_a_loop() {
    let (graph, [_, head, body, _]) = unbounded_loop();
    let mut fixpoint = WtoMonotonicFixpointIterator::new(&graph, Interpreter { graph: &graph });
    fixpoint.run(Env::top()).unwrap();

    assert_eq!(fixpoint.wto().components().count(), 3);
    let at_head = fixpoint.get_exit_state_at(head);
    assert_eq!(interval_of(&at_head, "x"), IntervalDomain::bounded_below(1).unwrap());
    assert!(at_head.get(&"x").components().0.is_top());
    assert_eq!(
        interval_of(&fixpoint.get_exit_state_at(body), "x"),
        IntervalDomain::bounded_below(2).unwrap()
    );
}

#[test]
fn widening_delay_still_converges() {
    let (graph, [_, head, _, _]) = unbounded_loop();
    let config = FixpointConfig {
        widening_delay: 3,
        narrowing_iterations: 0,
    };
    let mut fixpoint =
        WtoMonotonicFixpointIterator::with_config(&graph, Interpreter { graph: &graph }, config);
    fixpoint.run(Env::top()).unwrap();
    assert_eq!(
        interval_of(&fixpoint.get_entry_state_at(head), "x"),
        IntervalDomain::bounded_below(1).unwrap()
    );
}

#[test]
fn narrowing_recovers_loop_bounds() {
    let (graph, [_, head, _, exit]) = bounded_loop();
    let config = FixpointConfig {
        widening_delay: 0,
        narrowing_iterations: 2,
    };

    let mut wto =
        WtoMonotonicFixpointIterator::with_config(&graph, Interpreter { graph: &graph }, config);
    wto.run(Env::top()).unwrap();
    assert_eq!(
        interval_of(&wto.get_entry_state_at(head), "x"),
        IntervalDomain::finite(1, 10).unwrap()
    );
    assert_eq!(wto.get_exit_state_at(exit).get(&"x"), int(10));

    let mut worklist =
        MonotonicFixpointIterator::with_config(&graph, Interpreter { graph: &graph }, config);
    worklist.run(Env::top()).unwrap();
    assert_eq!(
        interval_of(&worklist.get_entry_state_at(head), "x"),
        IntervalDomain::finite(1, 10).unwrap()
    );

    // without narrowing, the loop exit only knows that x >= 10
    let mut widened = WtoMonotonicFixpointIterator::new(&graph, Interpreter { graph: &graph });
    widened.run(Env::top()).unwrap();
    assert_eq!(
        interval_of(&widened.get_exit_state_at(exit), "x"),
        IntervalDomain::bounded_below(10).unwrap()
    );
}

fn assert_sound<'g, I>(graph: &'g RootedGraph<Stmt, Guard>, fixpoint: &I)
where
    I: FixpointIterator<&'g RootedGraph<Stmt, Guard>, Env>,
{
    let interpreter = Interpreter { graph };
    for node in reverse_postorder(&graph) {
        let entry = fixpoint.get_entry_state_at(node);
        for edge in graph.predecessors(node) {
            let flowing = interpreter
                .analyze_edge(edge, &fixpoint.get_exit_state_at(graph.source(edge)))
                .unwrap();
            assert!(flowing.leq(&entry), "edge {edge:?} into {node:?}");
        }
        let mut exit = entry.clone();
        interpreter.analyze_node(node, &mut exit).unwrap();
        assert!(exit.leq(&fixpoint.get_exit_state_at(node)), "node {node:?}");
    }
}

#[test]
fn fixpoints_are_sound() {
    for (graph, _) in [unbounded_loop(), bounded_loop()] {
        let mut wto = WtoMonotonicFixpointIterator::new(&graph, Interpreter { graph: &graph });
        wto.run(Env::top()).unwrap();
        assert_sound(&graph, &wto);

        let mut worklist = MonotonicFixpointIterator::new(&graph, Interpreter { graph: &graph });
        worklist.run(Env::top()).unwrap();
        assert_sound(&graph, &worklist);
    }
}

#[test]
fn runs_are_deterministic() {
    let (graph, nodes) = bounded_loop();
    let mut fixpoint = WtoMonotonicFixpointIterator::new(&graph, Interpreter { graph: &graph });
    fixpoint.run(Env::top()).unwrap();
    let first: Vec<_> = nodes.iter().map(|n| fixpoint.get_exit_state_at(*n)).collect();
    fixpoint.run(Env::top()).unwrap();
    let second: Vec<_> = nodes.iter().map(|n| fixpoint.get_exit_state_at(*n)).collect();
    assert_eq!(first, second);
}

#[test]
fn unreachable_nodes_stay_bottom() {
    let (graph, [_, head, _, _]) = unbounded_loop();
    let mut inner = graph.inner().clone();
    let orphan = inner.add_node(Stmt::Assign("z", Expr::Lit(0)));
    inner.add_edge(orphan, head, Guard::Always);
    let graph = RootedGraph::new(inner, graph.entry(), graph.exit());

    let mut fixpoint = MonotonicFixpointIterator::new(&graph, Interpreter { graph: &graph });
    fixpoint.run(Env::top()).unwrap();
    assert!(fixpoint.get_exit_state_at(orphan).is_bottom());
    assert_eq!(interval_of(&fixpoint.get_exit_state_at(head), "z"), IntervalDomain::top());
}

fn parallel_options(runner: Runner) -> WorkQueueOptions {
    WorkQueueOptions {
        num_threads: 3,
        push_tasks_while_running: false,
        runner,
    }
}

/// Two independent loops after a fork, joined before the exit.
fn diamond_of_loops() -> (RootedGraph<Stmt, Guard>, Vec<NodeIndex>) {
    let mut graph = DiGraph::new();
    let init = graph.add_node(Stmt::Assign("x", Expr::Lit(0)));
    let left_head = graph.add_node(Stmt::Skip);
    let left_body = graph.add_node(Stmt::Assign("x", Expr::AddConst("x", 2)));
    let right_head = graph.add_node(Stmt::Assign("y", Expr::Lit(5)));
    let right_body = graph.add_node(Stmt::Assign("y", Expr::AddConst("y", -1)));
    let exit = graph.add_node(Stmt::Skip);
    graph.add_edge(init, left_head, Guard::Always);
    graph.add_edge(init, right_head, Guard::Always);
    graph.add_edge(left_head, left_body, Guard::Less("x", 8));
    graph.add_edge(left_body, left_head, Guard::Always);
    graph.add_edge(right_head, right_body, Guard::Always);
    graph.add_edge(right_body, right_body, Guard::AtLeast("y", 0));
    graph.add_edge(left_head, exit, Guard::AtLeast("x", 8));
    graph.add_edge(right_body, exit, Guard::Less("y", 0));
    let nodes = vec![init, left_head, left_body, right_head, right_body, exit];
    (RootedGraph::new(graph, init, exit), nodes)
}

#[test]
fn parallel_matches_sequential() {
    let config = FixpointConfig {
        widening_delay: 1,
        narrowing_iterations: 1,
    };
    for (graph, nodes) in [
        (unbounded_loop().0, unbounded_loop().1.to_vec()),
        (bounded_loop().0, bounded_loop().1.to_vec()),
        diamond_of_loops(),
    ] {
        let mut sequential =
            WtoMonotonicFixpointIterator::with_config(&graph, Interpreter { graph: &graph }, config);
        sequential.run(Env::top()).unwrap();

        for runner in [Runner::Threads, Runner::Rayon] {
            let mut parallel = ParallelMonotonicFixpointIterator::with_config(
                &graph,
                Interpreter { graph: &graph },
                config,
                parallel_options(runner),
            );
            parallel.run(Env::top()).unwrap();
            for node in &nodes {
                assert_eq!(
                    parallel.get_entry_state_at(*node),
                    sequential.get_entry_state_at(*node)
                );
                assert_eq!(
                    parallel.get_exit_state_at(*node),
                    sequential.get_exit_state_at(*node)
                );
            }
            assert_sound(&graph, &parallel);
        }
    }
}

#[test]
fn transformer_errors_are_returned() {
    let (graph, [init, head, _, _]) = unbounded_loop();
    let mut inner = graph.inner().clone();
    let failing = inner.add_node(Stmt::Fail);
    inner.add_edge(head, failing, Guard::Always);
    let graph = RootedGraph::new(inner, init, graph.exit());

    let mut wto = WtoMonotonicFixpointIterator::new(&graph, Interpreter { graph: &graph });
    assert_eq!(wto.run(Env::top()), Err(Failed(failing)));

    let mut worklist = MonotonicFixpointIterator::new(&graph, Interpreter { graph: &graph });
    assert_eq!(worklist.run(Env::top()), Err(Failed(failing)));

    let mut parallel = ParallelMonotonicFixpointIterator::with_config(
        &graph,
        Interpreter { graph: &graph },
        FixpointConfig::default(),
        parallel_options(Runner::Threads),
    );
    assert_eq!(
        parallel.run(Env::top()),
        Err(ParallelFixpointError::Transformer(Failed(failing)))
    );
}

#[test]
fn parallel_without_threads_fails() {
    let (graph, _) = unbounded_loop();
    let mut parallel = ParallelMonotonicFixpointIterator::with_config(
        &graph,
        Interpreter { graph: &graph },
        FixpointConfig::default(),
        WorkQueueOptions {
            num_threads: 0,
            ..WorkQueueOptions::default()
        },
    );
    assert!(matches!(
        parallel.run(Env::top()),
        Err(ParallelFixpointError::WorkQueue(_))
    ));
}

//! Ordering and the backward pass.
//!
//! [`run_backward`] differentiates a terminal node with respect to
//! every node it depends on:
//!
//! 1. A depth-first walk over parent links collects the reachable
//!    nodes, each after all of its parents.
//! 2. The terminal's gradient is seeded with 1.
//! 3. The collected sequence is walked backwards, terminal first. Each
//!    node's backward rule adds its contributions into its parents'
//!    gradients. By the time a node is reached, every consumer of it has
//!    already been processed, so its gradient is complete.
//!
//! Each node and edge is visited once during ordering and once during
//! propagation.

use crate::error::{AutodiffError, Result};
use crate::graph::{Arena, NodeId};
use crate::node::Node;
use log::{debug, trace};
use num_traits::Float;
use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Parents are still being explored.
    Open,
    Done,
}

/// Nodes reachable from `terminal`, each placed after all of its
/// parents. `terminal` comes last.
///
/// Traversal uses an explicit work stack, so arbitrarily deep chains
/// do not grow the call stack. Operands are explored left to right.
///
/// ```
/// use autodiff::{topological_order, Graph};
///
/// let graph = Graph::<f64>::new();
/// let x = graph.leaf(2.0);
/// let y = graph.leaf(5.0);
/// let z = &(&x * &y) + &x;
///
/// let order = topological_order(&z)?;
/// assert_eq!(order.len(), 4);
/// assert_eq!(order.first(), Some(&x.id()));
/// assert_eq!(order.last(), Some(&z.id()));
/// # Ok::<(), autodiff::AutodiffError>(())
/// ```
pub fn topological_order<T: Float>(terminal: &Node<T>) -> Result<Vec<NodeId>> {
    let arena = terminal.graph().arena();
    order_from(&arena, terminal.id())
}

pub(crate) fn order_from<T: Float>(arena: &Arena<T>, terminal: NodeId) -> Result<Vec<NodeId>> {
    let mut marks: HashMap<NodeId, Mark> = HashMap::new();
    let mut order = Vec::new();
    // (node, parents already pushed)
    let mut stack = vec![(terminal, false)];

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            marks.insert(id, Mark::Done);
            order.push(id);
            continue;
        }
        match marks.get(&id) {
            Some(Mark::Done) => continue,
            // Reached again from inside its own subtree.
            Some(Mark::Open) => return Err(AutodiffError::CyclicGraphDetected { node: id }),
            None => {}
        }
        marks.insert(id, Mark::Open);
        stack.push((id, true));

        let parents: Vec<NodeId> = arena.slot(id).op.parents().collect();
        for &parent in parents.iter().rev() {
            if marks.get(&parent) != Some(&Mark::Done) {
                stack.push((parent, false));
            }
        }
    }

    Ok(order)
}

/// Runs the backward pass from `terminal`.
///
/// Afterwards every node reachable from `terminal` holds
/// `∂terminal/∂node` in its gradient, and nodes that do not feed
/// `terminal` are untouched.
///
/// A pass may only run over nodes whose gradients are fresh. Running
/// a second pass that reaches a node of an earlier one fails with
/// [`AutodiffError::StaleGradientReuse`] until
/// [`Graph::zero_grad`](crate::Graph::zero_grad) is called; no
/// gradient is modified in that case.
///
/// ```
/// use autodiff::{run_backward, AutodiffError, Graph};
///
/// let graph = Graph::<f64>::new();
/// let x = graph.leaf(2.0);
/// let y = x.pow(4.0)? + 3.0 * x.pow(2.0)? + 2.0 * &x;
///
/// run_backward(&y)?;
/// assert_eq!(y.value(), 32.0);
/// assert_eq!(x.grad(), 46.0);  // 4x³ + 6x + 2
///
/// assert!(matches!(
///     run_backward(&y),
///     Err(AutodiffError::StaleGradientReuse { .. })
/// ));
/// graph.zero_grad();
/// run_backward(&y)?;
/// assert_eq!(x.grad(), 46.0);
/// # Ok::<(), AutodiffError>(())
/// ```
pub fn run_backward<T: Float>(terminal: &Node<T>) -> Result<()> {
    let mut arena = terminal.graph().arena_mut();
    let order = order_from(&arena, terminal.id())?;

    if let Some(&stale) = order.iter().find(|&&id| arena.slot(id).spent) {
        return Err(AutodiffError::StaleGradientReuse { node: stale });
    }

    debug!(
        "backward from {}: {} reachable of {} recorded nodes",
        terminal.id(),
        order.len(),
        arena.slots.len()
    );

    arena.slot_mut(terminal.id()).grad = T::one();

    for &id in order.iter().rev() {
        let (op, g) = {
            let slot = arena.slot(id);
            (slot.op, slot.grad)
        };
        trace!("propagating {} through {}", id, op.name());

        let deltas = op.local_grads(g, |p| arena.value(p));
        for (parent, delta) in deltas.into_iter().flatten() {
            let slot = arena.slot_mut(parent);
            slot.grad = slot.grad + delta;
        }
        arena.slot_mut(id).spent = true;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::op::Op;

    fn setup_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn position(order: &[NodeId], id: NodeId) -> usize {
        order.iter().position(|&n| n == id).unwrap()
    }

    fn assert_parents_first(graph: &Graph<f64>, order: &[NodeId]) {
        let arena = graph.arena();
        for &id in order {
            for parent in arena.slot(id).op.parents() {
                assert!(
                    position(order, parent) < position(order, id),
                    "{parent} must precede {id}"
                );
            }
        }
    }

    #[test]
    fn sum_rule() {
        setup_logger();
        for (av, bv) in [(1.0, 2.0), (-3.5, 0.0), (1e6, -1e-6)] {
            let graph = Graph::<f64>::new();
            let a = graph.leaf(av);
            let b = graph.leaf(bv);
            let y = &a + &b;
            run_backward(&y).unwrap();
            assert_eq!((a.grad(), b.grad()), (1.0, 1.0));
        }
    }

    #[test]
    fn product_rule() {
        setup_logger();
        let graph = Graph::<f64>::new();
        let a = graph.leaf(3.0);
        let b = graph.leaf(-4.0);
        let y = &a * &b;
        run_backward(&y).unwrap();
        assert_eq!(a.grad(), -4.0);
        assert_eq!(b.grad(), 3.0);
    }

    #[test]
    fn fan_out_accumulates() {
        setup_logger();
        let graph = Graph::<f64>::new();
        let a = graph.leaf(7.0);
        let y = &a + &a;
        run_backward(&y).unwrap();
        assert_eq!(a.grad(), 2.0);
    }

    #[test]
    fn diamond_sums_both_paths() {
        setup_logger();
        // y = (x*x) * (x+1); dy/dx = 2x(x+1) + x² = 3x² + 2x
        let graph = Graph::<f64>::new();
        let x = graph.leaf(2.0);
        let sq = &x * &x;
        let inc = &x + 1.0;
        let y = &sq * &inc;
        run_backward(&y).unwrap();
        assert_eq!(y.value(), 12.0);
        assert_eq!(x.grad(), 16.0);
        assert_eq!(sq.grad(), 3.0);
        assert_eq!(inc.grad(), 4.0);
    }

    #[test]
    fn polynomial_end_to_end() {
        setup_logger();
        let graph = Graph::<f64>::new();
        let x = graph.leaf(2.0);
        let y = x.pow(4.0).unwrap() + 3.0 * x.pow(2.0).unwrap() + 2.0 * &x;
        run_backward(&y).unwrap();
        assert_eq!(y.value(), 32.0);
        assert_eq!(x.grad(), 46.0);
    }

    #[test]
    fn bare_leaf_is_its_own_derivative() {
        let graph = Graph::<f64>::new();
        let x = graph.leaf(5.0);
        assert_eq!(topological_order(&x).unwrap(), vec![x.id()]);
        run_backward(&x).unwrap();
        assert_eq!(x.grad(), 1.0);
    }

    #[test]
    fn unrelated_nodes_are_untouched() {
        let graph = Graph::<f64>::new();
        let x = graph.leaf(1.0);
        let w = graph.leaf(9.0);
        let other = &w * 2.0;
        let y = &x * 3.0;
        run_backward(&y).unwrap();
        assert_eq!(x.grad(), 3.0);
        assert_eq!(w.grad(), 0.0);
        assert_eq!(other.grad(), 0.0);
        assert!(!topological_order(&y).unwrap().contains(&w.id()));
    }

    #[test]
    fn order_places_parents_first_from_any_terminal() {
        let graph = Graph::<f64>::new();
        let x = graph.leaf(1.5);
        let y = graph.leaf(-2.0);
        let s = &x + &y;
        let p = &s * &x;
        let q = (&p / &y).unwrap();
        let r = &q - &s;
        let n = -&r;

        for terminal in [&s, &p, &q, &r, &n] {
            let first = topological_order(terminal).unwrap();
            let again = topological_order(terminal).unwrap();
            assert_eq!(first, again);
            assert_eq!(first.last(), Some(&terminal.id()));
            assert_parents_first(&graph, &first);
        }
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let graph = Graph::<f64>::with_capacity(200_001);
        let x = graph.leaf(0.5);
        let mut y = x.clone();
        for _ in 0..100_000 {
            y = &y + 0.0;
        }
        run_backward(&y).unwrap();
        assert_eq!(x.grad(), 1.0);
    }

    #[test]
    fn second_pass_without_reset_is_rejected() {
        setup_logger();
        let graph = Graph::<f64>::new();
        let x = graph.leaf(3.0);
        let y = &x * &x;
        let z = &x + 1.0;
        run_backward(&y).unwrap();

        // Overlaps on x.
        let err = run_backward(&z).unwrap_err();
        assert_eq!(err, AutodiffError::StaleGradientReuse { node: x.id() });
        assert_eq!(x.grad(), 6.0);
        assert_eq!(z.grad(), 0.0);

        graph.zero_grad();
        run_backward(&z).unwrap();
        assert_eq!(x.grad(), 1.0);
    }

    #[test]
    fn shared_subexpression_is_visited_once() {
        // y = (x² + x²) * x = 2x³; dy/dx = 6x² = 24 at x = 2
        let graph = Graph::<f64>::new();
        let x = graph.leaf(2.0);
        let sq = &x * &x;
        let twice = &sq + &sq;
        let y = &twice * &x;

        let order = topological_order(&y).unwrap();
        assert_eq!(order.len(), 4);
        run_backward(&y).unwrap();
        assert_eq!(y.value(), 16.0);
        assert_eq!(sq.grad(), 4.0);
        assert_eq!(x.grad(), 24.0);
    }

    #[test]
    fn new_terminal_over_spent_nodes_is_rejected() {
        let graph = Graph::<f64>::new();
        let x = graph.leaf(3.0);
        let y = &x * &x;
        run_backward(&y).unwrap();

        let w = &y * 2.0;
        assert!(matches!(
            run_backward(&w),
            Err(AutodiffError::StaleGradientReuse { .. })
        ));
        assert_eq!((x.grad(), y.grad(), w.grad()), (6.0, 1.0, 0.0));
    }

    #[test]
    fn disjoint_passes_need_no_reset() {
        let graph = Graph::<f64>::new();
        let a = graph.leaf(2.0);
        let b = graph.leaf(3.0);
        let ya = &a * 4.0;
        let yb = &b * 5.0;
        run_backward(&ya).unwrap();
        run_backward(&yb).unwrap();
        assert_eq!((a.grad(), b.grad()), (4.0, 5.0));
    }

    #[test]
    fn forged_cycle_is_detected() {
        let graph = Graph::<f64>::new();
        let a = graph.leaf(1.0);
        let b = &a + 1.0;
        // Rewire a to depend on b, which no public operation can do.
        graph.arena_mut().slot_mut(a.id()).op = Op::Neg(b.id());

        let err = topological_order(&b).unwrap_err();
        assert!(matches!(err, AutodiffError::CyclicGraphDetected { .. }));
        assert!(matches!(
            run_backward(&b),
            Err(AutodiffError::CyclicGraphDetected { .. })
        ));
    }

    #[test]
    fn self_loop_is_detected() {
        let graph = Graph::<f64>::new();
        let a = graph.leaf(1.0);
        graph.arena_mut().slot_mut(a.id()).op = Op::Pow(a.id(), 2.0);
        assert_eq!(
            topological_order(&a),
            Err(AutodiffError::CyclicGraphDetected { node: a.id() })
        );
    }
}

//! Reverse-mode differentiation of a polynomial.
//!
//! Builds y = x⁴ + 3x² + 2x on a graph, runs one backward pass and
//! prints f(2) and f'(2).
//!
//! Run with: `cargo run --example polynomial`

use autodiff::{run_backward, topological_order, AutodiffError, Graph};

fn main() -> Result<(), AutodiffError> {
    env_logger::init();

    println!("=== Reverse Mode: Polynomial ===\n");

    let graph = Graph::<f64>::new();
    let x = graph.leaf(2.0);
    let y = x.pow(4.0)? + 3.0 * x.pow(2.0)? + 2.0 * &x;

    let order = topological_order(&y)?;
    println!("Graph: {} nodes, {} reachable from y", graph.len(), order.len());
    for id in &order {
        println!("  {id}");
    }
    println!();

    run_backward(&y)?;
    println!("f(2) = {}", y.value());
    println!("f'(2) = {} (expected: 4x³ + 6x + 2 = 46)", x.grad());
    println!("{x}");
    println!();

    // A second pass has to start from fresh gradients.
    match run_backward(&y) {
        Err(err) => println!("Second pass rejected: {err}"),
        Ok(()) => println!("Second pass unexpectedly succeeded"),
    }
    graph.zero_grad();
    run_backward(&y)?;
    println!("After zero_grad: f'(2) = {}", x.grad());

    Ok(())
}

//! Forward mode (dual numbers) and reverse mode (graph) side by side.
//!
//! Both engines differentiate the same functions; their results agree
//! to floating-point precision.
//!
//! Run with: `cargo run --example forward_vs_reverse`

use autodiff::{forward_diff, reverse_diff, reverse_gradient, DomainError, Dual, Node};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Forward vs Reverse Mode ===\n");

    // Example 1: rational function
    // f(x) = (x + 1) / (x² + 1)
    println!("Example 1: f(x) = (x + 1) / (x² + 1)");
    for x0 in [-1.0, 0.0, 0.5, 3.0] {
        let (fv, fd) = forward_diff(
            |x: Dual<f64>| -> Result<Dual<f64>, DomainError> { (x + 1.0) / (x * x + 1.0) },
            x0,
        )?;
        let (rv, rd) = reverse_diff(|x: Node<f64>| (&x + 1.0) / (&x * &x + 1.0), x0)?;
        println!("  x = {x0:5}: forward ({fv:.6}, {fd:.6})  reverse ({rv:.6}, {rd:.6})");
    }
    println!();

    // Example 2: a pole
    // f(x) = 1 / (x - 1) at x = 1
    println!("Example 2: f(x) = 1 / (x - 1) at x = 1");
    let forward = forward_diff(|x: Dual<f64>| 1.0 / (x - 1.0), 1.0);
    let reverse = reverse_diff(|x: Node<f64>| 1.0 / (&x - 1.0), 1.0);
    println!("  forward: {forward:?}");
    println!("  reverse: {reverse:?}");
    println!();

    // Example 3: gradient in one backward pass
    // f(x, y) = (1-x)² + 100(y-x²)², Rosenbrock
    println!("Example 3: Rosenbrock f(x, y) = (1-x)² + 100(y-x²)² at (0, 0)");
    let (value, grad) = reverse_gradient(
        |[x, y]: [Node<f64>; 2]| -> autodiff::Result<Node<f64>> {
            let a = 1.0 - &x;
            let b = &y - &x.pow(2.0)?;
            Ok(a.pow(2.0)? + 100.0 * b.pow(2.0)?)
        },
        [0.0, 0.0],
    )?;
    println!("  f(0, 0) = {value}");
    println!("  ∇f = [{}, {}] (expected: [-2, 0])", grad[0], grad[1]);

    Ok(())
}

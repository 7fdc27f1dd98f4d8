//! One-call differentiation on a fresh graph.

use crate::error::Result;
use crate::graph::Graph;
use crate::node::Node;
use num_traits::Float;

/// Computes the value and derivative of `f` at `x` using reverse-mode
/// AD.
///
/// `f` is evaluated on a new graph; the graph is dropped afterwards.
///
/// # Examples
///
/// ```
/// use autodiff::{reverse_diff, Node};
///
/// // f(x) = (x+1)(x-1) = x² - 1
/// let f = |x: Node<f64>| Ok((&x + 1.0) * (&x - 1.0));
///
/// let (val, deriv) = reverse_diff(f, 3.0)?;
/// assert_eq!(val, 8.0);    // f(3) = 8
/// assert_eq!(deriv, 6.0);  // f'(3) = 2x = 6
///
/// // Reuse at another point.
/// assert_eq!(reverse_diff(f, 5.0)?, (24.0, 10.0));
/// # Ok::<(), autodiff::AutodiffError>(())
/// ```
pub fn reverse_diff<T, F>(f: F, x: T) -> Result<(T, T)>
where
    T: Float,
    F: FnOnce(Node<T>) -> Result<Node<T>>,
{
    let graph = Graph::new();
    let var = graph.leaf(x);
    let result = f(var.clone())?;
    result.backward()?;
    Ok((result.value(), var.grad()))
}

/// Computes the value and gradient of a multivariable function using
/// reverse-mode AD, in a single backward pass.
///
/// An input that `f` does not use gets a zero partial derivative.
///
/// # Examples
///
/// ```
/// use autodiff::{reverse_gradient, Node};
///
/// // f(x, y) = x² + x*y at (3, 4)
/// let f = |[x, y]: [Node<f64>; 2]| Ok(&x * &x + &x * &y);
///
/// let (val, grad) = reverse_gradient(f, [3.0, 4.0])?;
/// assert_eq!(val, 21.0);       // f(3, 4) = 9 + 12 = 21
/// assert_eq!(grad[0], 10.0);   // ∂f/∂x = 2x + y = 10
/// assert_eq!(grad[1], 3.0);    // ∂f/∂y = x = 3
/// # Ok::<(), autodiff::AutodiffError>(())
/// ```
pub fn reverse_gradient<T, F, const N: usize>(f: F, point: [T; N]) -> Result<(T, [T; N])>
where
    T: Float,
    F: FnOnce([Node<T>; N]) -> Result<Node<T>>,
{
    let graph = Graph::with_capacity(N);
    let vars: [Node<T>; N] = point.map(|x| graph.leaf(x));
    let result = f(vars.clone())?;
    result.backward()?;
    Ok((result.value(), vars.map(|v| v.grad())))
}

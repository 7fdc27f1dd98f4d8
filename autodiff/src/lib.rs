#![deny(missing_docs)]
//! Automatic differentiation for Rust.
//!
//! **Part of the autodiff workspace**
//!
//! This crate computes derivatives of scalar expressions:
//!
//! - **Reverse-mode AD**: arithmetic on [`Node`]s records a computation
//!   graph; [`run_backward`] then fills in the partial derivative of one
//!   terminal node with respect to every node it depends on.
//! - **Forward-mode AD** *(feature = "forward")*: [`Dual`] numbers,
//!   re-exported from `dual-core`, carry a derivative alongside each
//!   value and need no graph.
//!
//! # Reverse mode
//!
//! ```
//! use autodiff::{run_backward, Graph};
//!
//! let graph = Graph::<f64>::new();
//! let x = graph.leaf(2.0);
//!
//! // y = x⁴ + 3x² + 2x
//! let y = x.pow(4.0)? + 3.0 * x.pow(2.0)? + 2.0 * &x;
//! run_backward(&y)?;
//!
//! assert_eq!(y.value(), 32.0);
//! assert_eq!(x.grad(), 46.0);  // 4x³ + 6x + 2
//! # Ok::<(), autodiff::AutodiffError>(())
//! ```
//!
//! A node used more than once receives the sum of every contribution:
//!
//! ```
//! use autodiff::Graph;
//!
//! let graph = Graph::<f64>::new();
//! let a = graph.leaf(5.0);
//! let y = &a + &a;
//! y.backward()?;
//! assert_eq!(a.grad(), 2.0);
//! # Ok::<(), autodiff::AutodiffError>(())
//! ```
//!
//! Use [`reverse_diff`] and [`reverse_gradient`] to differentiate a
//! function on a throwaway graph:
//!
//! ```
//! use autodiff::{reverse_gradient, Node};
//!
//! // f(x, y) = x² + x*y
//! let f = |[x, y]: [Node<f64>; 2]| Ok(&x * &x + &x * &y);
//!
//! let (val, grad) = reverse_gradient(f, [3.0, 4.0])?;
//! assert_eq!(val, 21.0);
//! assert_eq!(grad, [10.0, 3.0]);
//! # Ok::<(), autodiff::AutodiffError>(())
//! ```
//!
//! # Errors
//!
//! Values are computed as the graph is built, so division by zero and
//! powers outside the real domain fail at the offending operation with
//! an [`AutodiffError`]. A backward pass fails only on a cyclic parent
//! structure or on nodes still holding gradients from an earlier pass
//! (see [`Graph::zero_grad`]).
//!
//! Operands must come from the same [`Graph`]. The `+`, `-` and `*`
//! operators return a plain [`Node`] and panic on a foreign operand;
//! when operands may come from different graphs, use
//! [`Node::try_add`], [`Node::try_sub`], [`Node::try_mul`] or
//! [`Node::try_div`], which report
//! [`AutodiffError::UnsupportedOperand`] instead. `/` is always
//! checked.
//!
//! ```
//! use autodiff::{AutodiffError, Graph};
//!
//! let a = Graph::<f64>::new().leaf(1.0);
//! let b = Graph::<f64>::new().leaf(2.0);
//! assert!(matches!(a.try_add(&b), Err(AutodiffError::UnsupportedOperand(_))));
//! assert!(matches!(&a / &b, Err(AutodiffError::UnsupportedOperand(_))));
//! ```
//!
//! # Logging
//!
//! Backward passes report through the [`log`](https://docs.rs/log)
//! facade: one `debug` record per pass and a `trace` record per node.
//!
//! # Forward mode
//!
//! ```
//! # #[cfg(feature = "forward")]
//! # {
//! use autodiff::Dual;
//!
//! let x = Dual::variable(2.0_f64);
//! let y = x.pow(4.0)? + 3.0 * x.pow(2.0)? + 2.0 * x;
//! assert_eq!((y.value, y.derivative), (32.0, 46.0));
//! # }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod diff;
pub mod engine;
pub mod error;
pub mod graph;
pub mod node;
pub mod op;

pub use diff::{reverse_diff, reverse_gradient};
pub use engine::{run_backward, topological_order};
pub use error::{AutodiffError, Result};
pub use graph::{Graph, NodeId};
pub use node::Node;
pub use op::Op;

#[cfg(feature = "forward")]
pub use dual_core::{diff as forward_diff, DomainError, Dual};

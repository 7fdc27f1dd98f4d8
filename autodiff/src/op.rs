//! Backward rules, one variant per operation kind.
//!
//! Each recorded node stores the [`Op`] that produced it. The variant
//! names the operand nodes and any constant the rule needs; operand
//! values are read back from the graph when the rule fires, which is
//! safe because a node's value never changes after it is recorded.

use crate::graph::NodeId;
use num_traits::Float;

/// The operation that produced a node, and thereby its backward rule.
///
/// Given the node's accumulated gradient `g`:
///
/// | op          | to `a`               | to `b`          |
/// |-------------|----------------------|-----------------|
/// | `Add(a, b)` | `g`                  | `g`             |
/// | `Sub(a, b)` | `g`                  | `-g`            |
/// | `Mul(a, b)` | `b·g`                | `a·g`           |
/// | `Div(a, b)` | `g/b`                | `-a·g/b²`       |
/// | `Pow(a, n)` | `n·aⁿ⁻¹·g`           |                 |
/// | `Neg(a)`    | `-g`                 |                 |
/// | `Leaf`      |                      |                 |
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op<T> {
    /// An input or a coerced constant. No parents, no-op rule.
    Leaf,
    /// `a + b`
    Add(NodeId, NodeId),
    /// `a - b`
    Sub(NodeId, NodeId),
    /// `a * b`
    Mul(NodeId, NodeId),
    /// `a / b`
    Div(NodeId, NodeId),
    /// `a` raised to a constant real exponent.
    Pow(NodeId, T),
    /// `-a`
    Neg(NodeId),
}

impl<T: Float> Op<T> {
    /// Short lowercase name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Leaf => "leaf",
            Op::Add(..) => "add",
            Op::Sub(..) => "sub",
            Op::Mul(..) => "mul",
            Op::Div(..) => "div",
            Op::Pow(..) => "pow",
            Op::Neg(..) => "neg",
        }
    }

    /// The operand nodes, in operand order.
    ///
    /// A node used for both operands (`a + a`) appears twice.
    pub fn parents(&self) -> impl Iterator<Item = NodeId> {
        let (a, b) = match *self {
            Op::Leaf => (None, None),
            Op::Add(a, b) | Op::Sub(a, b) | Op::Mul(a, b) | Op::Div(a, b) => (Some(a), Some(b)),
            Op::Pow(a, _) | Op::Neg(a) => (Some(a), None),
        };
        a.into_iter().chain(b)
    }

    /// Contributions of an incoming gradient `g` to each parent.
    ///
    /// `value_of` looks up the recorded value of an operand. The
    /// caller adds each `(parent, delta)` into that parent's gradient.
    pub fn local_grads<F>(&self, g: T, value_of: F) -> [Option<(NodeId, T)>; 2]
    where
        F: Fn(NodeId) -> T,
    {
        match *self {
            Op::Leaf => [None, None],
            Op::Add(a, b) => [Some((a, g)), Some((b, g))],
            Op::Sub(a, b) => [Some((a, g)), Some((b, -g))],
            Op::Mul(a, b) => [Some((a, value_of(b) * g)), Some((b, value_of(a) * g))],
            Op::Div(a, b) => {
                let bv = value_of(b);
                [
                    Some((a, g / bv)),
                    Some((b, -value_of(a) * g / (bv * bv))),
                ]
            }
            Op::Pow(a, n) => {
                // d/da a⁰ = 0, also at a = 0 where aⁿ⁻¹ is infinite.
                let delta = if n == T::zero() {
                    T::zero()
                } else {
                    n * value_of(a).powf(n - T::one()) * g
                };
                [Some((a, delta)), None]
            }
            Op::Neg(a) => [Some((a, -g)), None],
        }
    }
}

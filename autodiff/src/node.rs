//! Graph nodes and the arithmetic that records them.
//!
//! Every operation evaluates its value immediately and records a new
//! node whose [`Op`] remembers how to hand a gradient back to the
//! operands. Scalars mixed into an expression become leaf constants on
//! the graph of the node they are combined with.
//!
//! `+`, `-`, `*` and unary `-` cannot fail and return a [`Node`]. `/`
//! can divide by zero and returns [`Result`], as does [`Node::pow`].
//! The `try_*` methods are the fallible spellings of all of them;
//! they also reject operands recorded on different graphs, where the
//! operators panic.

use crate::engine;
use crate::error::{AutodiffError, Result};
use crate::graph::{Graph, NodeId};
use crate::op::Op;
use dual_core::domain::{check_divisor, check_pow};
use num_traits::Float;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A value recorded on a [`Graph`].
///
/// `Node` is a handle; cloning it does not record anything. The value
/// is fixed when the node is created. The gradient starts at zero and
/// is filled in by [`Node::backward`].
///
/// # Examples
///
/// ```
/// use autodiff::Graph;
///
/// let graph = Graph::<f64>::new();
/// let a = graph.leaf(3.0);
/// let b = graph.leaf(4.0);
/// let y = &a * &b + 1.0;
/// y.backward()?;
///
/// assert_eq!(y.value(), 13.0);
/// assert_eq!(a.grad(), 4.0);  // ∂y/∂a = b
/// assert_eq!(b.grad(), 3.0);  // ∂y/∂b = a
/// # Ok::<(), autodiff::AutodiffError>(())
/// ```
///
/// Division fails at the moment it executes:
///
/// ```
/// use autodiff::{AutodiffError, Graph};
///
/// let graph = Graph::<f64>::new();
/// let a = graph.leaf(1.0);
/// let zero = &a - 1.0;
/// assert_eq!(
///     (&a / &zero).unwrap_err(),
///     AutodiffError::DivisionByZero { numerator: 1.0 }
/// );
/// ```
#[derive(Clone)]
pub struct Node<T> {
    graph: Graph<T>,
    id: NodeId,
}

impl<T: Float> Node<T> {
    pub(crate) fn from_parts(graph: Graph<T>, id: NodeId) -> Self {
        Node { graph, id }
    }

    /// Handle of this node within its graph.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The graph this node is recorded on.
    pub fn graph(&self) -> &Graph<T> {
        &self.graph
    }

    /// The value computed when the node was recorded.
    pub fn value(&self) -> T {
        self.graph.arena().value(self.id)
    }

    /// The accumulated gradient; zero until a backward pass reaches it.
    pub fn grad(&self) -> T {
        self.graph.arena().slot(self.id).grad
    }

    /// The operation that produced this node.
    pub fn op(&self) -> Op<T> {
        self.graph.arena().slot(self.id).op
    }

    /// Whether this node is an input or constant.
    pub fn is_leaf(&self) -> bool {
        matches!(self.op(), Op::Leaf)
    }

    /// The operands this node was computed from, in operand order.
    pub fn parents(&self) -> Vec<Node<T>> {
        self.op()
            .parents()
            .map(|id| Node::from_parts(self.graph.clone(), id))
            .collect()
    }

    /// Runs the backward pass with this node as the terminal.
    ///
    /// See [`run_backward`](crate::run_backward).
    pub fn backward(&self) -> Result<()> {
        engine::run_backward(self)
    }

    /// Records `c` as a constant on this node's graph.
    pub fn constant(&self, c: T) -> Node<T> {
        self.graph.leaf(c)
    }

    /// `self + rhs`, failing if `rhs` lives on another graph.
    pub fn try_add(&self, rhs: &Node<T>) -> Result<Node<T>> {
        self.check_same_graph(rhs)?;
        Ok(self.combine(rhs, Op::Add, |a, b| a + b))
    }

    /// `self - rhs`, failing if `rhs` lives on another graph.
    pub fn try_sub(&self, rhs: &Node<T>) -> Result<Node<T>> {
        self.check_same_graph(rhs)?;
        Ok(self.combine(rhs, Op::Sub, |a, b| a - b))
    }

    /// `self * rhs`, failing if `rhs` lives on another graph.
    pub fn try_mul(&self, rhs: &Node<T>) -> Result<Node<T>> {
        self.check_same_graph(rhs)?;
        Ok(self.combine(rhs, Op::Mul, |a, b| a * b))
    }

    /// `self / rhs`.
    ///
    /// Fails with [`AutodiffError::DivisionByZero`] when `rhs` is zero,
    /// and with [`AutodiffError::UnsupportedOperand`] when `rhs` lives
    /// on another graph. Same as the `/` operator.
    pub fn try_div(&self, rhs: &Node<T>) -> Result<Node<T>> {
        self.check_same_graph(rhs)?;
        let (a, b) = (self.value(), rhs.value());
        check_divisor(a, b)?;
        Ok(self.graph.record(a / b, Op::Div(self.id, rhs.id)))
    }

    /// `selfⁿ` for a constant real exponent.
    ///
    /// Fails with [`AutodiffError::InvalidDomain`] for a negative value
    /// with a non-integer exponent, and for zero with a negative
    /// exponent.
    ///
    /// ```
    /// use autodiff::Graph;
    ///
    /// let graph = Graph::<f64>::new();
    /// let x = graph.leaf(4.0);
    /// let y = x.pow(0.5)?;
    /// y.backward()?;
    /// assert_eq!(y.value(), 2.0);
    /// assert_eq!(x.grad(), 0.25);
    ///
    /// assert!(graph.leaf(-4.0).pow(0.5).is_err());
    /// # Ok::<(), autodiff::AutodiffError>(())
    /// ```
    pub fn pow(&self, n: T) -> Result<Node<T>> {
        let a = self.value();
        check_pow(a, n)?;
        Ok(self.graph.record(a.powf(n), Op::Pow(self.id, n)))
    }

    fn check_same_graph(&self, rhs: &Node<T>) -> Result<()> {
        if self.graph.same_as(&rhs.graph) {
            Ok(())
        } else {
            Err(AutodiffError::UnsupportedOperand(format!(
                "node {} belongs to a different graph than node {}",
                rhs.id, self.id
            )))
        }
    }

    fn combine<F>(&self, rhs: &Node<T>, op: fn(NodeId, NodeId) -> Op<T>, f: F) -> Node<T>
    where
        F: FnOnce(T, T) -> T,
    {
        let value = f(self.value(), rhs.value());
        self.graph.record(value, op(self.id, rhs.id))
    }

    fn combine_checked<F>(&self, rhs: &Node<T>, op: fn(NodeId, NodeId) -> Op<T>, f: F) -> Node<T>
    where
        F: FnOnce(T, T) -> T,
    {
        assert!(
            self.graph.same_as(&rhs.graph),
            "nodes {} and {} are recorded on different graphs",
            self.id,
            rhs.id
        );
        self.combine(rhs, op, f)
    }
}

impl<T: Float + fmt::Display> fmt::Display for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node(value={}, grad={})", self.value(), self.grad())
    }
}

impl<T: Float + fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("value", &self.value())
            .field("grad", &self.grad())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// std::ops — &a + &b, &a - &b, &a * &b, &a / &b, -&a
// -----------------------------------------------------------------------------

/// # Panics
///
/// If the operands are recorded on different graphs.
impl<T: Float> Add for &Node<T> {
    type Output = Node<T>;

    fn add(self, rhs: Self) -> Node<T> {
        self.combine_checked(rhs, Op::Add, |a, b| a + b)
    }
}

/// # Panics
///
/// If the operands are recorded on different graphs.
impl<T: Float> Sub for &Node<T> {
    type Output = Node<T>;

    fn sub(self, rhs: Self) -> Node<T> {
        self.combine_checked(rhs, Op::Sub, |a, b| a - b)
    }
}

/// # Panics
///
/// If the operands are recorded on different graphs.
impl<T: Float> Mul for &Node<T> {
    type Output = Node<T>;

    fn mul(self, rhs: Self) -> Node<T> {
        self.combine_checked(rhs, Op::Mul, |a, b| a * b)
    }
}

impl<T: Float> Div for &Node<T> {
    type Output = Result<Node<T>>;

    fn div(self, rhs: Self) -> Result<Node<T>> {
        self.try_div(rhs)
    }
}

impl<T: Float> Neg for &Node<T> {
    type Output = Node<T>;

    fn neg(self) -> Node<T> {
        let value = -self.value();
        self.graph.record(value, Op::Neg(self.id))
    }
}

impl<T: Float> Neg for Node<T> {
    type Output = Node<T>;

    fn neg(self) -> Node<T> {
        -&self
    }
}

// -----------------------------------------------------------------------------
// Scalars on the right: &a + c, where c becomes a constant leaf
// -----------------------------------------------------------------------------

impl<T: Float> Add<T> for &Node<T> {
    type Output = Node<T>;

    fn add(self, c: T) -> Node<T> {
        self + &self.constant(c)
    }
}

impl<T: Float> Sub<T> for &Node<T> {
    type Output = Node<T>;

    fn sub(self, c: T) -> Node<T> {
        self - &self.constant(c)
    }
}

impl<T: Float> Mul<T> for &Node<T> {
    type Output = Node<T>;

    fn mul(self, c: T) -> Node<T> {
        self * &self.constant(c)
    }
}

impl<T: Float> Div<T> for &Node<T> {
    type Output = Result<Node<T>>;

    fn div(self, c: T) -> Result<Node<T>> {
        self.try_div(&self.constant(c))
    }
}

// Owned operands forward to the borrowed impls.
macro_rules! forward_owned_binop {
    ($imp:ident, $method:ident, $out:ty) => {
        impl<T: Float> $imp for Node<T> {
            type Output = $out;

            fn $method(self, rhs: Node<T>) -> $out {
                (&self).$method(&rhs)
            }
        }

        impl<T: Float> $imp<&Node<T>> for Node<T> {
            type Output = $out;

            fn $method(self, rhs: &Node<T>) -> $out {
                (&self).$method(rhs)
            }
        }

        impl<T: Float> $imp<Node<T>> for &Node<T> {
            type Output = $out;

            fn $method(self, rhs: Node<T>) -> $out {
                self.$method(&rhs)
            }
        }

        impl<T: Float> $imp<T> for Node<T> {
            type Output = $out;

            fn $method(self, c: T) -> $out {
                (&self).$method(c)
            }
        }
    };
}

forward_owned_binop!(Add, add, Node<T>);
forward_owned_binop!(Sub, sub, Node<T>);
forward_owned_binop!(Mul, mul, Node<T>);
forward_owned_binop!(Div, div, Result<Node<T>>);

// Scalars on the left (`3.0 * x`) need concrete impls.
macro_rules! impl_scalar_lhs {
    ($($t:ty),*) => {$(
        impl Add<&Node<$t>> for $t {
            type Output = Node<$t>;

            fn add(self, rhs: &Node<$t>) -> Node<$t> {
                &rhs.constant(self) + rhs
            }
        }

        impl Add<Node<$t>> for $t {
            type Output = Node<$t>;

            fn add(self, rhs: Node<$t>) -> Node<$t> {
                self + &rhs
            }
        }

        impl Sub<&Node<$t>> for $t {
            type Output = Node<$t>;

            fn sub(self, rhs: &Node<$t>) -> Node<$t> {
                &rhs.constant(self) - rhs
            }
        }

        impl Sub<Node<$t>> for $t {
            type Output = Node<$t>;

            fn sub(self, rhs: Node<$t>) -> Node<$t> {
                self - &rhs
            }
        }

        impl Mul<&Node<$t>> for $t {
            type Output = Node<$t>;

            fn mul(self, rhs: &Node<$t>) -> Node<$t> {
                &rhs.constant(self) * rhs
            }
        }

        impl Mul<Node<$t>> for $t {
            type Output = Node<$t>;

            fn mul(self, rhs: Node<$t>) -> Node<$t> {
                self * &rhs
            }
        }

        impl Div<&Node<$t>> for $t {
            type Output = Result<Node<$t>>;

            fn div(self, rhs: &Node<$t>) -> Result<Node<$t>> {
                rhs.constant(self).try_div(rhs)
            }
        }

        impl Div<Node<$t>> for $t {
            type Output = Result<Node<$t>>;

            fn div(self, rhs: Node<$t>) -> Result<Node<$t>> {
                self / &rhs
            }
        }
    )*};
}

impl_scalar_lhs!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_computed_eagerly() {
        let graph = Graph::<f64>::new();
        let a = graph.leaf(6.0);
        let b = graph.leaf(4.0);

        assert_eq!((&a + &b).value(), 10.0);
        assert_eq!((&a - &b).value(), 2.0);
        assert_eq!((&a * &b).value(), 24.0);
        assert_eq!((&a / &b).unwrap().value(), 1.5);
        assert_eq!(a.pow(2.0).unwrap().value(), 36.0);
        assert_eq!((-&a).value(), -6.0);
    }

    #[test]
    fn operators_record_their_op() {
        let graph = Graph::<f64>::new();
        let a = graph.leaf(1.0);
        let b = graph.leaf(2.0);

        assert_eq!((&a + &b).op(), Op::Add(a.id(), b.id()));
        assert_eq!((&b - &a).op(), Op::Sub(b.id(), a.id()));
        assert_eq!((&a * &b).op(), Op::Mul(a.id(), b.id()));
        assert_eq!((&a / &b).unwrap().op(), Op::Div(a.id(), b.id()));
        assert_eq!(a.pow(3.0).unwrap().op(), Op::Pow(a.id(), 3.0));
        assert_eq!((-&a).op(), Op::Neg(a.id()));
        assert_eq!(a.op(), Op::Leaf);
    }

    #[test]
    fn operands_are_not_mutated() {
        let graph = Graph::<f64>::new();
        let a = graph.leaf(2.0);
        let b = graph.leaf(5.0);
        let _ = &a * &b;
        let _ = -&a;
        assert_eq!((a.value(), b.value()), (2.0, 5.0));
        assert!(a.is_leaf() && b.is_leaf());
    }

    #[test]
    fn scalars_become_constant_leaves() {
        let graph = Graph::<f64>::new();
        let x = graph.leaf(3.0);
        let y = 10.0 - &x;
        assert_eq!(y.value(), 7.0);

        let parents = y.parents();
        assert_eq!(parents.len(), 2);
        assert!(parents[0].is_leaf());
        assert_eq!(parents[0].value(), 10.0);
        assert_eq!(parents[1].id(), x.id());

        y.backward().unwrap();
        assert_eq!(x.grad(), -1.0);
        assert_eq!(parents[0].grad(), 1.0);
    }

    #[test]
    fn sub_and_neg_rules() {
        let graph = Graph::<f64>::new();
        let a = graph.leaf(2.0);
        let b = graph.leaf(8.0);
        let y = -(&a - &b);
        y.backward().unwrap();
        assert_eq!(y.value(), 6.0);
        assert_eq!((a.grad(), b.grad()), (-1.0, 1.0));
    }

    #[test]
    fn quotient_rule() {
        let graph = Graph::<f64>::new();
        let a = graph.leaf(3.0);
        let b = graph.leaf(2.0);
        let y = (&a / &b).unwrap();
        y.backward().unwrap();
        assert_eq!(a.grad(), 0.5);
        assert_eq!(b.grad(), -0.75);
    }

    #[test]
    fn scalar_division_both_sides() {
        let graph = Graph::<f64>::new();
        let x = graph.leaf(4.0);
        let y = (1.0 / &x).unwrap() + (&x / 2.0).unwrap();
        y.backward().unwrap();
        assert_eq!(y.value(), 2.25);
        assert_eq!(x.grad(), -1.0 / 16.0 + 0.5);
    }

    #[test]
    fn division_by_zero_fails_before_recording() {
        let graph = Graph::<f64>::new();
        let a = graph.leaf(5.0);
        let b = graph.leaf(0.0);
        let before = graph.len();

        assert_eq!(
            (&a / &b).unwrap_err(),
            AutodiffError::DivisionByZero { numerator: 5.0 }
        );
        assert_eq!(graph.len(), before);
        assert!(matches!(
            &a / 0.0,
            Err(AutodiffError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn pow_domain() {
        let graph = Graph::<f64>::new();
        let neg = graph.leaf(-8.0);
        assert_eq!(
            neg.pow(1.0 / 3.0).unwrap_err(),
            AutodiffError::InvalidDomain {
                base: -8.0,
                exponent: 1.0 / 3.0
            }
        );
        assert_eq!(neg.pow(3.0).unwrap().value(), -512.0);

        let zero = graph.leaf(0.0);
        assert!(matches!(
            zero.pow(-1.0),
            Err(AutodiffError::InvalidDomain { .. })
        ));
    }

    #[test]
    fn zeroth_power_at_zero_has_zero_gradient() {
        let graph = Graph::<f64>::new();
        let x = graph.leaf(0.0);
        let y = x.pow(0.0).unwrap();
        y.backward().unwrap();
        assert_eq!((y.value(), x.grad()), (1.0, 0.0));

        let before = graph.len();
        assert_eq!(
            x.pow(-2.0).unwrap_err(),
            AutodiffError::InvalidDomain {
                base: 0.0,
                exponent: -2.0
            }
        );
        assert_eq!(graph.len(), before);
    }

    #[test]
    fn pow_of_negative_base_with_integer_exponent() {
        let graph = Graph::<f64>::new();
        let x = graph.leaf(-2.0);
        let y = x.pow(3.0).unwrap();
        y.backward().unwrap();
        assert_eq!(y.value(), -8.0);
        assert_eq!(x.grad(), 12.0);
    }

    #[test]
    fn foreign_operands_are_unsupported() {
        let g1 = Graph::<f64>::new();
        let g2 = Graph::<f64>::new();
        let a = g1.leaf(1.0);
        let b = g2.leaf(2.0);

        for result in [a.try_add(&b), a.try_sub(&b), a.try_mul(&b), a.try_div(&b)] {
            assert!(matches!(result, Err(AutodiffError::UnsupportedOperand(_))));
        }
        assert!(matches!(&a / &b, Err(AutodiffError::UnsupportedOperand(_))));
        assert_eq!((g1.len(), g2.len()), (1, 1));
    }

    #[test]
    #[should_panic(expected = "different graphs")]
    fn foreign_operands_panic_in_operators() {
        let a = Graph::<f64>::new().leaf(1.0);
        let b = Graph::<f64>::new().leaf(2.0);
        let _ = &a + &b;
    }

    #[test]
    fn owned_and_borrowed_forms_agree() {
        let graph = Graph::<f64>::new();
        let x = graph.leaf(1.5);

        let borrowed = &(&x * &x) + &x;
        let owned = x.clone() * x.clone() + x.clone();
        assert_eq!(borrowed.value(), owned.value());

        let mixed = 2.0 * x.clone() - &x + 1.0;
        assert_eq!(mixed.value(), 2.5);
    }

    #[test]
    fn f32_graphs() {
        let graph = Graph::<f32>::new();
        let x = graph.leaf(2.0_f32);
        let y = 3.0_f32 * &x * &x;
        y.backward().unwrap();
        assert_eq!(x.grad(), 12.0);
    }

    #[test]
    fn display_shows_value_and_grad() {
        let graph = Graph::<f64>::new();
        let x = graph.leaf(2.0);
        let y = &x * 3.0;
        y.backward().unwrap();
        assert_eq!(x.to_string(), "Node(value=2, grad=3)");
        assert_eq!(
            format!("{x:?}"),
            "Node { id: NodeId(0), value: 2.0, grad: 3.0 }"
        );
    }
}

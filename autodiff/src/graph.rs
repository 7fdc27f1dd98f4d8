//! The arena that records nodes as they are computed.
//!
//! A [`Graph`] owns every node recorded on it. Nodes are addressed by
//! [`NodeId`], a stable index into the arena; a node's parents are
//! always older entries, so the parent relation is acyclic by
//! construction and fan-out costs nothing more than copying an index.

use crate::error::{AutodiffError, Result};
use crate::node::Node;
use crate::op::Op;
use num_traits::{Float, NumCast, ToPrimitive};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Stable handle of a node within its [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Position of the node in recording order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct Slot<T> {
    pub(crate) value: T,
    pub(crate) grad: T,
    pub(crate) op: Op<T>,
    /// Set once a backward pass has propagated through this slot.
    pub(crate) spent: bool,
}

pub(crate) struct Arena<T> {
    pub(crate) slots: Vec<Slot<T>>,
}

impl<T: Float> Arena<T> {
    pub(crate) fn push(&mut self, value: T, op: Op<T>) -> NodeId {
        let id = NodeId::new(self.slots.len());
        debug_assert!(op.parents().all(|p| p < id));
        self.slots.push(Slot {
            value,
            grad: T::zero(),
            op,
            spent: false,
        });
        id
    }

    pub(crate) fn slot(&self, id: NodeId) -> &Slot<T> {
        &self.slots[id.0]
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> &mut Slot<T> {
        &mut self.slots[id.0]
    }

    pub(crate) fn value(&self, id: NodeId) -> T {
        self.slots[id.0].value
    }
}

/// A computation graph for reverse-mode differentiation.
///
/// `Graph` is a shared handle: clones refer to the same arena, and
/// every [`Node`] keeps one. Arithmetic on nodes records new nodes on
/// the graph of its operands.
///
/// # Example
///
/// ```
/// use autodiff::Graph;
///
/// let graph = Graph::<f64>::new();
/// let x = graph.leaf(3.0);
/// let y = &x * &x;  // y = x²
/// y.backward()?;
///
/// assert_eq!(y.value(), 9.0);
/// assert_eq!(x.grad(), 6.0);  // dy/dx = 2x = 6
/// assert_eq!(graph.len(), 2);
/// # Ok::<(), autodiff::AutodiffError>(())
/// ```
pub struct Graph<T> {
    arena: Rc<RefCell<Arena<T>>>,
}

impl<T> Clone for Graph<T> {
    fn clone(&self) -> Self {
        Graph {
            arena: Rc::clone(&self.arena),
        }
    }
}

impl<T: Float> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> Graph<T> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty graph with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Graph {
            arena: Rc::new(RefCell::new(Arena {
                slots: Vec::with_capacity(capacity),
            })),
        }
    }

    /// Records an input node holding `value`.
    pub fn leaf(&self, value: T) -> Node<T> {
        self.record(value, Op::Leaf)
    }

    /// Records a constant converted from any primitive number.
    ///
    /// Fails with [`AutodiffError::UnsupportedOperand`] when `n` has
    /// no representation in `T`.
    ///
    /// ```
    /// use autodiff::Graph;
    ///
    /// let graph = Graph::<f64>::new();
    /// let c = graph.constant_from(3_u8)?;
    /// assert_eq!(c.value(), 3.0);
    /// # Ok::<(), autodiff::AutodiffError>(())
    /// ```
    pub fn constant_from<N>(&self, n: N) -> Result<Node<T>>
    where
        N: ToPrimitive + Clone + fmt::Debug,
    {
        match <T as NumCast>::from(n.clone()) {
            Some(value) => Ok(self.leaf(value)),
            None => Err(AutodiffError::UnsupportedOperand(format!(
                "{n:?} is not representable as a graph value"
            ))),
        }
    }

    /// Number of nodes recorded so far.
    pub fn len(&self) -> usize {
        self.arena.borrow().slots.len()
    }

    /// Whether no node has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resets every gradient to zero so another backward pass can run.
    pub fn zero_grad(&self) {
        for slot in self.arena.borrow_mut().slots.iter_mut() {
            slot.grad = T::zero();
            slot.spent = false;
        }
    }

    /// Whether `self` and `other` are handles to the same arena.
    pub fn same_as(&self, other: &Graph<T>) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena)
    }

    pub(crate) fn record(&self, value: T, op: Op<T>) -> Node<T> {
        let id = self.arena.borrow_mut().push(value, op);
        Node::from_parts(self.clone(), id)
    }

    pub(crate) fn arena(&self) -> Ref<'_, Arena<T>> {
        self.arena.borrow()
    }

    pub(crate) fn arena_mut(&self) -> RefMut<'_, Arena<T>> {
        self.arena.borrow_mut()
    }
}

impl<T> fmt::Debug for Graph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.arena.try_borrow() {
            Ok(arena) => f.debug_struct("Graph").field("nodes", &arena.slots.len()).finish(),
            Err(_) => f.write_str("Graph { <borrowed> }"),
        }
    }
}

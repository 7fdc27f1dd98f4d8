//! Errors raised while building or differentiating a graph.

use crate::graph::NodeId;
use dual_core::DomainError;
use thiserror::Error;

/// Failure of a graph operation or a backward pass.
///
/// Arithmetic variants are raised eagerly by the operation that
/// produced the bad value; nothing is deferred to the backward pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AutodiffError {
    /// The divisor of a division evaluated to zero.
    #[error("division by zero: {numerator} / 0")]
    DivisionByZero {
        /// Value of the dividend.
        numerator: f64,
    },

    /// `base^exponent` has no real value.
    #[error("{base}^{exponent} is outside the real domain")]
    InvalidDomain {
        /// Value of the base.
        base: f64,
        /// The exponent.
        exponent: f64,
    },

    /// An operand could not be brought into the graph, e.g. a node
    /// recorded on a different graph or a scalar that `T` cannot
    /// represent.
    #[error("unsupported operand: {0}")]
    UnsupportedOperand(String),

    /// The parent relation reachable from a terminal is not acyclic.
    ///
    /// Nodes only ever point at older nodes, so this signals a broken
    /// internal invariant rather than a recoverable condition.
    #[error("cycle detected through node {node}")]
    CyclicGraphDetected {
        /// A node found on the cycle.
        node: NodeId,
    },

    /// A backward pass reached a node whose gradient already holds the
    /// result of an earlier pass. Call `Graph::zero_grad` first.
    #[error("node {node} still holds a gradient from a previous backward pass")]
    StaleGradientReuse {
        /// The first stale node encountered.
        node: NodeId,
    },
}

impl From<DomainError> for AutodiffError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::DivisionByZero { numerator } => {
                AutodiffError::DivisionByZero { numerator }
            }
            DomainError::InvalidDomain { base, exponent } => {
                AutodiffError::InvalidDomain { base, exponent }
            }
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AutodiffError>;

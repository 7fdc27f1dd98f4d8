#![deny(missing_docs)]
//! # dual-core — forward-mode automatic differentiation
//!
//! **Part of the autodiff workspace**
//!
//! - [`Dual`]: a value paired with its derivative, `a + a′·ε` with
//!   `ε² = 0`. Composing operations on duals applies the chain rule
//!   as a side effect, so `f(Dual::variable(x)).derivative == f′(x)`.
//! - [`diff`]: evaluate a function and its derivative at a point.
//! - [`domain`]: the real-domain checks ([`DomainError`]) shared with
//!   the reverse-mode engine in the `autodiff` crate.
//!
//! ## Quick start
//!
//! ```rust
//! use dual_core::{diff, Dual, DomainError};
//!
//! // f(x) = x⁴ + 3x² + 2x, f'(x) = 4x³ + 6x + 2
//! let f = |x: Dual<f64>| -> Result<Dual<f64>, DomainError> {
//!     Ok(x.pow(4.0)? + 3.0 * x.pow(2.0)? + 2.0 * x)
//! };
//!
//! let (value, derivative) = diff(f, 2.0)?;
//! assert_eq!(value, 32.0);
//! assert_eq!(derivative, 46.0);
//! # Ok::<(), DomainError>(())
//! ```

pub mod domain;
pub mod dual;

pub use domain::DomainError;
pub use dual::{diff, Dual};

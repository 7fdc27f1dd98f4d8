//! Dual numbers for forward-mode automatic differentiation.
//!
//! A dual number represents a value and its derivative simultaneously,
//! enabling automatic computation of derivatives through operator
//! overloading.
//!
//! # Mathematical Background
//!
//! A dual number has the form `a + a′·ε` where `ε² = 0` (and `a′` denotes
//! the derivative). Arithmetic operations on dual numbers follow these
//! algebraic rules:
//!
//! - `(a + a′·ε) + (b + b′·ε) = (a+b) + (a′+b′)·ε`
//! - `-(a + a′·ε) = -a + (-a′)·ε`
//! - `(a + a′·ε) - (b + b′·ε) = (a-b) + (a′-b′)·ε`
//! - `(a + a′·ε) * (b + b′·ε) = ab + (a′b + ab′)·ε`
//! - `(a + a′·ε) / (b + b′·ε) = a/b + ((a′b - ab′)/b²)·ε`
//! - `(a + a′·ε)ⁿ = aⁿ + (n·aⁿ⁻¹·a′)·ε` for a real constant `n`
//!
//! The chain rule emerges implicitly from composing these operations.
//! Division and powers can leave the real domain, so they return
//! [`Result`] and fail at the moment they are evaluated.
//!
//! # Example
//!
//! ```
//! use dual_core::Dual;
//!
//! // f(x) = x² + 2x at x=3
//! let x = Dual::variable(3.0_f64);
//! let f = x * x + 2.0 * x;
//!
//! assert_eq!(f.value, 15.0);       // f(3) = 9 + 6 = 15
//! assert_eq!(f.derivative, 8.0);   // f'(3) = 2*3 + 2 = 8
//! ```

use crate::domain::{check_divisor, check_pow, DomainError};
use num_traits::{Float, One, Zero};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A dual number representing a value and its derivative.
///
/// `Dual { value, derivative }` represents `value + derivative·ε`
/// where `ε² = 0`.
///
/// # Examples
///
/// ```
/// use dual_core::Dual;
///
/// // f(x) = (x + 1) * (x + 2)
/// let x = Dual::variable(3.0_f64);
/// let f = (x + 1.0) * (x + 2.0);
///
/// assert_eq!(f.value, 20.0);       // (3+1)*(3+2) = 20
/// assert_eq!(f.derivative, 9.0);   // f'(x) = 2x+3, f'(3) = 9
/// ```
///
/// Division is fallible:
///
/// ```
/// use dual_core::{Dual, DomainError};
///
/// let x = Dual::variable(0.0_f64);
/// assert_eq!(
///     1.0 / x,
///     Err(DomainError::DivisionByZero { numerator: 1.0 })
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual<T> {
    /// The primal value.
    pub value: T,
    /// The derivative (tangent).
    pub derivative: T,
}

impl<T> Dual<T> {
    /// Create a new dual number with explicit value and derivative.
    ///
    /// ```
    /// use dual_core::Dual;
    ///
    /// let d = Dual::new(3.0_f64, 1.0);
    /// assert_eq!(d.value, 3.0);
    /// assert_eq!(d.derivative, 1.0);
    /// ```
    pub fn new(value: T, derivative: T) -> Self {
        Dual { value, derivative }
    }

    /// Create a constant (derivative = 0).
    ///
    /// Bare scalars mixed into an expression are lifted this way.
    pub fn constant(value: T) -> Self
    where
        T: Zero,
    {
        Dual {
            value,
            derivative: T::zero(),
        }
    }

    /// Create a variable (derivative = 1).
    ///
    /// Use this for the input you're differentiating with respect to.
    pub fn variable(value: T) -> Self
    where
        T: One,
    {
        Dual {
            value,
            derivative: T::one(),
        }
    }
}

impl<T: Float> Dual<T> {
    /// Reciprocal: `1/(b + b′·ε) = (1/b) + (-b′/b²)·ε`.
    ///
    /// ```
    /// use dual_core::Dual;
    ///
    /// let f = Dual::variable(2.0_f64).recip().unwrap();
    /// assert_eq!(f.value, 0.5);
    /// assert_eq!(f.derivative, -0.25);
    /// ```
    pub fn recip(self) -> Result<Self, DomainError> {
        check_divisor(T::one(), self.value)?;
        let b = self.value;
        Ok(Dual {
            value: b.recip(),
            derivative: -(self.derivative / (b * b)),
        })
    }

    /// Quotient `self / rhs`, failing when `rhs.value` is zero.
    ///
    /// Same as the `/` operator.
    pub fn checked_div(self, rhs: Self) -> Result<Self, DomainError> {
        check_divisor(self.value, rhs.value)?;
        let b = rhs.value;
        Ok(Dual {
            value: self.value / b,
            // Quotient rule: (f′·g - f·g′) / g²
            derivative: (self.derivative * b - self.value * rhs.derivative) / (b * b),
        })
    }

    /// Power with a constant real exponent: `f = aⁿ`, `f′ = n·aⁿ⁻¹·a′`.
    ///
    /// Fails with [`DomainError::InvalidDomain`] for a negative base
    /// with a non-integer exponent, or a zero base with a negative
    /// exponent.
    ///
    /// ```
    /// use dual_core::Dual;
    ///
    /// let f = Dual::variable(2.0_f64).pow(3.0).unwrap();
    /// assert_eq!(f.value, 8.0);
    /// assert_eq!(f.derivative, 12.0);
    ///
    /// assert!(Dual::variable(-2.0_f64).pow(0.5).is_err());
    /// ```
    pub fn pow(self, n: T) -> Result<Self, DomainError> {
        check_pow(self.value, n)?;
        let derivative = if n.is_zero() {
            T::zero()
        } else {
            n * self.value.powf(n - T::one()) * self.derivative
        };
        Ok(Dual {
            value: self.value.powf(n),
            derivative,
        })
    }
}

impl<T: fmt::Display> fmt::Display for Dual<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dual(value={}, derivative={})", self.value, self.derivative)
    }
}

/// Addition: (a + a′·ε) + (b + b′·ε) = (a+b) + (a′+b′)·ε
impl<T: Add<Output = T>> Add for Dual<T> {
    type Output = Dual<T>;

    fn add(self, rhs: Self) -> Self::Output {
        Dual {
            value: self.value + rhs.value,
            derivative: self.derivative + rhs.derivative,
        }
    }
}

/// Subtraction: (a + a′·ε) - (b + b′·ε) = (a-b) + (a′-b′)·ε
impl<T: Sub<Output = T>> Sub for Dual<T> {
    type Output = Dual<T>;

    fn sub(self, rhs: Self) -> Self::Output {
        Dual {
            value: self.value - rhs.value,
            derivative: self.derivative - rhs.derivative,
        }
    }
}

/// Multiplication: (a + a′·ε) * (b + b′·ε) = ab + (a′b + ab′)·ε
impl<T: Mul<Output = T> + Add<Output = T> + Copy> Mul for Dual<T> {
    type Output = Dual<T>;

    fn mul(self, rhs: Self) -> Self::Output {
        Dual {
            value: self.value * rhs.value,
            // Product rule: f′·g + f·g′
            derivative: self.derivative * rhs.value + self.value * rhs.derivative,
        }
    }
}

/// Division: fails eagerly when the divisor is zero.
impl<T: Float> Div for Dual<T> {
    type Output = Result<Dual<T>, DomainError>;

    fn div(self, rhs: Self) -> Self::Output {
        self.checked_div(rhs)
    }
}

/// Negation: -(a + a′·ε) = -a + (-a′)·ε
impl<T: Neg<Output = T>> Neg for Dual<T> {
    type Output = Dual<T>;

    fn neg(self) -> Self::Output {
        Dual {
            value: -self.value,
            derivative: -self.derivative,
        }
    }
}

impl<T: Float> Add<T> for Dual<T> {
    type Output = Dual<T>;

    fn add(self, c: T) -> Self::Output {
        self + Dual::constant(c)
    }
}

impl<T: Float> Sub<T> for Dual<T> {
    type Output = Dual<T>;

    fn sub(self, c: T) -> Self::Output {
        self - Dual::constant(c)
    }
}

impl<T: Float> Mul<T> for Dual<T> {
    type Output = Dual<T>;

    fn mul(self, c: T) -> Self::Output {
        self * Dual::constant(c)
    }
}

impl<T: Float> Div<T> for Dual<T> {
    type Output = Result<Dual<T>, DomainError>;

    fn div(self, c: T) -> Self::Output {
        self.checked_div(Dual::constant(c))
    }
}

// Scalars on the left (`2.0 * x`) need concrete impls.
macro_rules! impl_scalar_lhs {
    ($($t:ty),*) => {$(
        impl Add<Dual<$t>> for $t {
            type Output = Dual<$t>;

            fn add(self, rhs: Dual<$t>) -> Dual<$t> {
                Dual::constant(self) + rhs
            }
        }

        impl Sub<Dual<$t>> for $t {
            type Output = Dual<$t>;

            fn sub(self, rhs: Dual<$t>) -> Dual<$t> {
                Dual::constant(self) - rhs
            }
        }

        impl Mul<Dual<$t>> for $t {
            type Output = Dual<$t>;

            fn mul(self, rhs: Dual<$t>) -> Dual<$t> {
                Dual::constant(self) * rhs
            }
        }

        impl Div<Dual<$t>> for $t {
            type Output = Result<Dual<$t>, DomainError>;

            fn div(self, rhs: Dual<$t>) -> Self::Output {
                Dual::constant(self).checked_div(rhs)
            }
        }
    )*};
}

impl_scalar_lhs!(f32, f64);

/// Evaluates `f` and its derivative at `x` in a single forward pass.
///
/// `f` receives `Dual::variable(x)`; any error it returns is passed
/// through unchanged.
///
/// ```
/// use dual_core::{diff, Dual, DomainError};
///
/// // f(x) = x / (x + 1) at x = 1: f = 0.5, f' = 1/(x+1)² = 0.25
/// let (v, d) = diff(|x: Dual<f64>| x / (x + 1.0), 1.0)?;
/// assert_eq!((v, d), (0.5, 0.25));
/// # Ok::<(), DomainError>(())
/// ```
pub fn diff<T, E, F>(f: F, x: T) -> Result<(T, T), E>
where
    T: Float,
    F: FnOnce(Dual<T>) -> Result<Dual<T>, E>,
{
    let y = f(Dual::variable(x))?;
    Ok((y.value, y.derivative))
}

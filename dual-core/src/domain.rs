//! Domain checks for real arithmetic.
//!
//! Both differentiation engines evaluate eagerly, so an operation
//! outside the real domain has to be rejected at the moment it runs.
//! The checks here are shared by [`Dual`](crate::Dual) and by the
//! reverse-mode graph in the `autodiff` crate.

use num_traits::Float;
use thiserror::Error;

/// A real-arithmetic operation was applied outside its domain.
///
/// Operand values are carried as `f64` so the error is independent of
/// the numeric type the computation runs in.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DomainError {
    /// The divisor evaluated to zero.
    #[error("division by zero: {numerator} / 0")]
    DivisionByZero {
        /// Value of the dividend.
        numerator: f64,
    },

    /// `base^exponent` has no real value.
    ///
    /// Raised for a negative base with a non-integer exponent, and
    /// for a zero base with a negative exponent.
    #[error("{base}^{exponent} is outside the real domain")]
    InvalidDomain {
        /// Value of the base.
        base: f64,
        /// The exponent.
        exponent: f64,
    },
}

fn to_f64<T: Float>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

/// Checks that `numerator / denominator` is defined.
///
/// # Example
///
/// ```
/// use dual_core::domain::{check_divisor, DomainError};
///
/// assert!(check_divisor(1.0, 2.0).is_ok());
/// assert_eq!(
///     check_divisor(3.0, 0.0),
///     Err(DomainError::DivisionByZero { numerator: 3.0 })
/// );
/// ```
pub fn check_divisor<T: Float>(numerator: T, denominator: T) -> Result<(), DomainError> {
    if denominator.is_zero() {
        return Err(DomainError::DivisionByZero {
            numerator: to_f64(numerator),
        });
    }
    Ok(())
}

/// Checks that `base^exponent` has a real value.
///
/// ```
/// use dual_core::domain::check_pow;
///
/// assert!(check_pow(-2.0, 3.0).is_ok());   // integer exponent
/// assert!(check_pow(-2.0, 0.5).is_err());  // √(-2)
/// assert!(check_pow(0.0, -1.0).is_err());  // 1/0
/// assert!(check_pow(0.0, 0.5).is_ok());
/// ```
pub fn check_pow<T: Float>(base: T, exponent: T) -> Result<(), DomainError> {
    let negative_base = base < T::zero() && exponent.fract() != T::zero();
    let pole = base.is_zero() && exponent < T::zero();
    if negative_base || pole {
        return Err(DomainError::InvalidDomain {
            base: to_f64(base),
            exponent: to_f64(exponent),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_divisor_is_rejected() {
        assert_eq!(
            check_divisor(5.0_f64, 0.0),
            Err(DomainError::DivisionByZero { numerator: 5.0 })
        );
        assert_eq!(
            check_divisor(5.0_f64, -0.0),
            Err(DomainError::DivisionByZero { numerator: 5.0 })
        );
    }

    #[test]
    fn nonzero_divisor_is_accepted() {
        assert!(check_divisor(0.0_f32, 1e-30).is_ok());
    }

    #[test]
    fn negative_base_needs_integer_exponent() {
        assert!(check_pow(-3.0_f64, 2.0).is_ok());
        assert!(check_pow(-3.0_f64, -1.0).is_ok());
        assert_eq!(
            check_pow(-3.0_f64, 1.5),
            Err(DomainError::InvalidDomain {
                base: -3.0,
                exponent: 1.5
            })
        );
    }

    #[test]
    fn zero_base_with_negative_exponent_is_a_pole() {
        assert!(check_pow(0.0_f64, -2.0).is_err());
        assert!(check_pow(0.0_f64, 0.0).is_ok());
        assert!(check_pow(0.0_f64, 3.0).is_ok());
    }

    #[test]
    fn messages_name_the_operands() {
        let err = check_pow(-1.0_f64, 0.5).unwrap_err();
        assert_eq!(err.to_string(), "-1^0.5 is outside the real domain");
        let err = check_divisor(2.0_f64, 0.0).unwrap_err();
        assert_eq!(err.to_string(), "division by zero: 2 / 0");
    }
}

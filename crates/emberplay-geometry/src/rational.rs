//! Reduced integer fractions.
//!
//! A [`Rational`] is always stored in reduced form: constructing one divides
//! numerator and denominator by their greatest common divisor. Multiplication
//! and division reduce each factor pairwise *before* multiplying, so
//! intermediate products stay as small as possible. Since the backing type is
//! a fixed-width integer, composition can still overflow with extreme
//! operands; that is a precondition violation of the caller and panics rather
//! than silently wrapping.

use std::fmt;
use std::ops::{Div, Mul};

use num_traits::{CheckedMul, PrimInt};

/// Computes `gcd(a, b)` with the Euclidean algorithm.
///
/// If one operand is zero the other is returned unchanged. For signed inputs
/// the result carries the sign of the remainder chain; dividing both parts of
/// a fraction by it still yields a reduced fraction with the same value.
pub fn gcd<T: PrimInt>(mut a: T, mut b: T) -> T {
    while b != T::zero() {
        let temp = a % b;
        a = b;
        b = temp;
    }
    a
}

/// Divides `num` and `den` by their greatest common divisor.
pub fn reduce<T: PrimInt>(num: T, den: T) -> (T, T) {
    let g = gcd(num, den);
    if g == T::zero() {
        (num, den)
    } else {
        (num / g, den / g)
    }
}

/// A fraction in reduced form.
///
/// A rational with a zero numerator or denominator is normalized to `0/0` and
/// treated as invalid; see [`Rational::is_valid`]. Equality is structural on
/// the reduced fields, which is exact because every constructor reduces.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Rational<T> {
    pub numerator: T,
    pub denominator: T,
}

impl<T: PrimInt + CheckedMul> Rational<T> {
    /// Creates a reduced fraction `num / den`.
    ///
    /// If either operand is zero the result is the invalid rational `0/0`.
    pub fn new(num: T, den: T) -> Self {
        Self::from_product(num, T::one(), den, T::one())
    }

    /// Builds `(num1 * num2) / (den1 * den2)`, reducing each numerator
    /// against each denominator before multiplying.
    ///
    /// # Panics
    ///
    /// Panics if the reduced product does not fit in `T`. Callers must bound
    /// their inputs; this is not a recoverable condition.
    fn from_product(num1: T, num2: T, den1: T, den2: T) -> Self {
        let zero = T::zero();
        if num1 == zero || num2 == zero || den1 == zero || den2 == zero {
            return Self {
                numerator: zero,
                denominator: zero,
            };
        }

        let (num1, den1) = reduce(num1, den1);
        let (num1, den2) = reduce(num1, den2);
        let (num2, den1) = reduce(num2, den1);
        let (num2, den2) = reduce(num2, den2);

        // Any common prime factor was removed above, so the products are
        // relatively prime.
        let numerator = num1
            .checked_mul(&num2)
            .expect("rational numerator overflowed");
        let denominator = den1
            .checked_mul(&den2)
            .expect("rational denominator overflowed");
        Self {
            numerator,
            denominator,
        }
    }

    /// Swaps numerator and denominator.
    pub fn inverse(self) -> Self {
        Self {
            numerator: self.denominator,
            denominator: self.numerator,
        }
    }

    /// Integer division of numerator by denominator, truncating toward zero.
    ///
    /// # Panics
    ///
    /// Panics if the rational is invalid (zero denominator).
    pub fn truncate(self) -> T {
        self.numerator / self.denominator
    }

    /// Whether both parts are nonzero.
    pub fn is_valid(self) -> bool {
        self.numerator != T::zero() && self.denominator != T::zero()
    }

    /// Approximates the fraction as a float. Invalid rationals yield NaN.
    pub fn to_f64(self) -> f64 {
        let num = self.numerator.to_f64().unwrap_or(f64::NAN);
        let den = self.denominator.to_f64().unwrap_or(f64::NAN);
        num / den
    }
}

impl<T: PrimInt + CheckedMul> Mul for Rational<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_product(
            self.numerator,
            rhs.numerator,
            self.denominator,
            rhs.denominator,
        )
    }
}

impl<T: PrimInt + CheckedMul> Mul<T> for Rational<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        Self::from_product(self.numerator, rhs, self.denominator, T::one())
    }
}

impl<T: PrimInt + CheckedMul> Div for Rational<T> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::from_product(
            self.numerator,
            rhs.denominator,
            self.denominator,
            rhs.numerator,
        )
    }
}

impl<T: PrimInt + CheckedMul> Div<T> for Rational<T> {
    type Output = Self;

    fn div(self, rhs: T) -> Self {
        Self::from_product(self.numerator, T::one(), self.denominator, rhs)
    }
}

impl<T: fmt::Display> fmt::Display for Rational<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

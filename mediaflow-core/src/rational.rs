//! Rational number type for exact time base and rate representation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Rounding behavior for [`Rational::rescale_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Truncate toward zero.
    Zero,
    /// Round to nearest, halfway cases away from zero.
    #[default]
    Nearest,
}

/// A rational number represented as a numerator and denominator.
///
/// Used for exact representation of frame rates, sample rates, and time
/// bases. The denominator is always kept positive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    /// Numerator.
    pub num: i64,
    /// Denominator (always positive).
    pub den: i64,
}

impl Rational {
    /// Create a new rational number.
    ///
    /// # Panics
    ///
    /// Panics if the denominator is zero.
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "denominator cannot be zero");
        let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
        Self { num, den }
    }

    /// Create a rational from an integer.
    pub const fn from_int(n: i64) -> Self {
        Self { num: n, den: 1 }
    }

    /// The zero rational.
    pub const fn zero() -> Self {
        Self { num: 0, den: 1 }
    }

    /// The rational one.
    pub const fn one() -> Self {
        Self { num: 1, den: 1 }
    }

    /// Check if this rational is zero.
    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    /// Check if this rational is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.num > 0
    }

    /// Reduce to lowest terms.
    pub fn reduce(&self) -> Self {
        if self.num == 0 {
            return Self { num: 0, den: 1 };
        }
        let g = gcd(self.num.unsigned_abs(), self.den.unsigned_abs()) as i64;
        Self {
            num: self.num / g,
            den: self.den / g,
        }
    }

    /// Convert to f64.
    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Get the reciprocal.
    ///
    /// # Panics
    ///
    /// Panics if the numerator is zero.
    pub fn recip(&self) -> Self {
        assert!(self.num != 0, "cannot take reciprocal of zero");
        Self::new(self.den, self.num)
    }

    /// Multiply by an integer.
    pub fn mul_int(&self, n: i64) -> Self {
        Self::new(self.num * n, self.den)
    }

    /// Rescale a value expressed in this unit into `target` units,
    /// rounding to nearest.
    ///
    /// Intermediate math is done in 128 bits so typical time base
    /// conversions cannot overflow.
    pub fn rescale(&self, value: i64, target: Rational) -> i64 {
        self.rescale_with(value, target, Rounding::Nearest)
    }

    /// Rescale a value with an explicit rounding mode.
    pub fn rescale_with(&self, value: i64, target: Rational, rounding: Rounding) -> i64 {
        let num = value as i128 * self.num as i128 * target.den as i128;
        let den = self.den as i128 * target.num as i128;
        div_rounded(num, den, rounding) as i64
    }
}

/// Divide with the requested rounding, handling sign explicitly.
fn div_rounded(num: i128, den: i128, rounding: Rounding) -> i128 {
    let negative = (num < 0) != (den < 0);
    let (a, b) = (num.unsigned_abs(), den.unsigned_abs());
    let q = match rounding {
        Rounding::Zero => a / b,
        Rounding::Nearest => (a + b / 2) / b,
    };
    let q = q as i128;
    if negative {
        -q
    } else {
        q
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rational({}/{})", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.num as i128 * other.den as i128;
        let rhs = other.num as i128 * self.den as i128;
        lhs.cmp(&rhs)
    }
}

impl Add for Rational {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.num * rhs.den + rhs.num * self.den, self.den * rhs.den).reduce()
    }
}

impl Sub for Rational {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.num * rhs.den - rhs.num * self.den, self.den * rhs.den).reduce()
    }
}

impl Mul for Rational {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(self.num * rhs.num, self.den * rhs.den).reduce()
    }
}

impl Div for Rational {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Self::new(self.num * rhs.den, self.den * rhs.num).reduce()
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Self::from_int(n)
    }
}

impl From<(i64, i64)> for Rational {
    fn from((num, den): (i64, i64)) -> Self {
        Self::new(num, den)
    }
}

/// Greatest common divisor via the Euclidean algorithm.
fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

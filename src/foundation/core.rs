use std::cmp::Ordering;
use std::fmt;

use crate::foundation::error::{LoopcompError, LoopcompResult};

/// Non-negative rational number `num/den` kept in lowest terms.
///
/// Used for exact frame durations in seconds. The denominator is always non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Rational {
    num: u64,
    den: u64,
}

impl Rational {
    /// `0/1`.
    pub const ZERO: Self = Self { num: 0, den: 1 };
    /// `1/1`.
    pub const ONE: Self = Self { num: 1, den: 1 };

    /// Create a validated rational, reduced to lowest terms.
    pub fn new(num: u64, den: u64) -> LoopcompResult<Self> {
        if den == 0 {
            return Err(LoopcompError::validation("rational denominator must be > 0"));
        }
        Ok(Self::reduced(num, den))
    }

    /// Whole milliseconds as seconds.
    pub fn from_millis(ms: u64) -> Self {
        Self::reduced(ms, 1000)
    }

    /// Decoder-style delay `numer/denom` milliseconds as seconds.
    ///
    /// A zero `denom` is read as `1`.
    pub fn from_delay_ms(numer: u32, denom: u32) -> Self {
        let denom = u64::from(denom.max(1));
        Self::reduced(u64::from(numer), denom * 1000)
    }

    fn reduced(num: u64, den: u64) -> Self {
        debug_assert!(den > 0);
        if num == 0 {
            return Self::ZERO;
        }
        let g = gcd(num, den);
        Self {
            num: num / g,
            den: den / g,
        }
    }

    fn reduced_u128(num: u128, den: u128) -> Option<Self> {
        if num == 0 {
            return Some(Self::ZERO);
        }
        let g = gcd_u128(num, den);
        Some(Self {
            num: u64::try_from(num / g).ok()?,
            den: u64::try_from(den / g).ok()?,
        })
    }

    /// Numerator in lowest terms.
    pub fn num(self) -> u64 {
        self.num
    }

    /// Denominator in lowest terms (always `> 0`).
    pub fn den(self) -> u64 {
        self.den
    }

    /// Return `true` for `0`.
    pub fn is_zero(self) -> bool {
        self.num == 0
    }

    /// Convert to floating-point seconds.
    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Convert to floating-point milliseconds.
    pub fn as_millis_f64(self) -> f64 {
        self.as_f64() * 1000.0
    }

    /// Exact sum, or `None` when the reduced result does not fit in `u64`.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let num = u128::from(self.num) * u128::from(other.den)
            + u128::from(other.num) * u128::from(self.den);
        let den = u128::from(self.den) * u128::from(other.den);
        Self::reduced_u128(num, den)
    }

    /// Exact quotient `self / k`, or `None` for `k == 0` or denominator overflow.
    pub fn checked_div_u64(self, k: u64) -> Option<Self> {
        if k == 0 {
            return None;
        }
        let g = gcd(self.num, k);
        let den = self.den.checked_mul(k / g)?;
        Some(Self::reduced(self.num / g, den))
    }

    /// Absolute difference `|self - other|` in floating-point seconds.
    pub fn abs_diff_f64(self, other: Self) -> f64 {
        let a = u128::from(self.num) * u128::from(other.den);
        let b = u128::from(other.num) * u128::from(self.den);
        let den = u128::from(self.den) * u128::from(other.den);
        a.abs_diff(b) as f64 / den as f64
    }

    /// Closest rational with denominator at most `max_den`.
    ///
    /// Walks the continued-fraction expansion and picks the better of the last convergent and
    /// the best semiconvergent, so the result is the nearest fraction under the bound. A
    /// `max_den` of zero is read as `1`.
    pub fn limit_denominator(self, max_den: u64) -> Self {
        let max_den = u128::from(max_den.max(1));
        if u128::from(self.den) <= max_den {
            return self;
        }

        let (mut p0, mut q0, mut p1, mut q1) = (0u128, 1u128, 1u128, 0u128);
        let mut n = u128::from(self.num);
        let mut d = u128::from(self.den);
        loop {
            let a = n / d;
            let q2 = q0 + a * q1;
            if q2 > max_den {
                break;
            }
            (p0, q0, p1, q1) = (p1, q1, p0 + a * p1, q2);
            (n, d) = (d, n - a * d);
        }

        let k = (max_den - q0) / q1;
        let (p, q) = if 2 * d * (q0 + k * q1) <= u128::from(self.den) {
            (p1, q1)
        } else {
            (p0 + k * p1, q0 + k * q1)
        };
        // Both candidates have q <= max_den and p <= self.num, so they fit in u64.
        Self::reduced_u128(p, q).unwrap_or(self)
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = u128::from(self.num) * u128::from(other.den);
        let b = u128::from(other.num) * u128::from(self.den);
        a.cmp(&b)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Integer placement rectangle on the background, in pixels.
///
/// The origin may be negative or extend past the canvas; compositing clips to the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlacementRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Box width.
    pub width: u32,
    /// Box height.
    pub height: u32,
}

impl PlacementRect {
    /// Create a placement rectangle.
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Return `true` when the box covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Greatest common divisor; `gcd(0, b) == b`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple, or `None` on `u64` overflow. Zero inputs are read as `1`.
pub fn checked_lcm(a: u64, b: u64) -> Option<u64> {
    let (a, b) = (a.max(1), b.max(1));
    (a / gcd(a, b)).checked_mul(b)
}

/// Least common multiple saturating at `u64::MAX`. Zero inputs are read as `1`.
pub fn saturating_lcm(a: u64, b: u64) -> u64 {
    checked_lcm(a, b).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

//! Membership function shapes.
//!
//! Two piecewise-linear shapes are supported:
//! - **Triangular** `[a, b, c]`: rises on `[a, b]`, falls on `[b, c]`
//! - **Trapezoidal** `[a, b, c, d]`: rises on `[a, b]`, flat on `[b, c]`,
//!   falls on `[c, d]`
//!
//! Coincident breakpoints are allowed (`a == b` gives a left shoulder,
//! `c == d` a right shoulder); the degree at a coincident breakpoint is 1.

use crac_core::ensure_finite;
use serde::{Deserialize, Serialize};

use crate::error::{FuzzyError, FuzzyResult};

/// A membership function mapping a crisp value to a degree in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MembershipFunction {
    /// Triangle with feet at `a`, `c` and peak at `b`.
    Triangular { a: f64, b: f64, c: f64 },
    /// Trapezoid with feet at `a`, `d` and plateau on `[b, c]`.
    Trapezoidal { a: f64, b: f64, c: f64, d: f64 },
}

impl MembershipFunction {
    /// Create a triangular membership function.
    ///
    /// # Errors
    ///
    /// Returns error if a breakpoint is non-finite or `a <= b <= c` does not hold.
    pub fn triangular(a: f64, b: f64, c: f64) -> FuzzyResult<Self> {
        ensure_finite(a, "triangular a")?;
        ensure_finite(b, "triangular b")?;
        ensure_finite(c, "triangular c")?;
        if !(a <= b && b <= c) {
            return Err(FuzzyError::InvalidShape {
                what: "triangular breakpoints must satisfy a <= b <= c",
            });
        }
        if a == c {
            return Err(FuzzyError::InvalidShape {
                what: "triangular support must have non-zero width",
            });
        }
        Ok(Self::Triangular { a, b, c })
    }

    /// Create a trapezoidal membership function.
    ///
    /// # Errors
    ///
    /// Returns error if a breakpoint is non-finite or `a <= b <= c <= d` does not hold.
    pub fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> FuzzyResult<Self> {
        ensure_finite(a, "trapezoidal a")?;
        ensure_finite(b, "trapezoidal b")?;
        ensure_finite(c, "trapezoidal c")?;
        ensure_finite(d, "trapezoidal d")?;
        if !(a <= b && b <= c && c <= d) {
            return Err(FuzzyError::InvalidShape {
                what: "trapezoidal breakpoints must satisfy a <= b <= c <= d",
            });
        }
        if a == d {
            return Err(FuzzyError::InvalidShape {
                what: "trapezoidal support must have non-zero width",
            });
        }
        Ok(Self::Trapezoidal { a, b, c, d })
    }

    /// Degree of membership of `x`, always in `[0, 1]`.
    pub fn evaluate(&self, x: f64) -> f64 {
        match *self {
            Self::Triangular { a, b, c } => {
                if x < a || x > c {
                    0.0
                } else if x < b {
                    (x - a) / (b - a)
                } else if x == b {
                    1.0
                } else {
                    (c - x) / (c - b)
                }
            }
            Self::Trapezoidal { a, b, c, d } => {
                if x < a || x > d {
                    0.0
                } else if x < b {
                    (x - a) / (b - a)
                } else if x <= c {
                    1.0
                } else {
                    (d - x) / (d - c)
                }
            }
        }
    }

    /// Support interval `[first breakpoint, last breakpoint]`.
    pub fn support(&self) -> (f64, f64) {
        match *self {
            Self::Triangular { a, c, .. } => (a, c),
            Self::Trapezoidal { a, d, .. } => (a, d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangular_peak_and_feet() {
        let mf = MembershipFunction::triangular(25.0, 50.0, 75.0).unwrap();
        assert_eq!(mf.evaluate(50.0), 1.0);
        assert_eq!(mf.evaluate(25.0), 0.0);
        assert_eq!(mf.evaluate(75.0), 0.0);
        assert!((mf.evaluate(37.5) - 0.5).abs() < 1e-12);
        assert!((mf.evaluate(62.5) - 0.5).abs() < 1e-12);
        assert_eq!(mf.evaluate(-10.0), 0.0);
    }

    #[test]
    fn triangular_shoulders() {
        let left = MembershipFunction::triangular(0.0, 0.0, 25.0).unwrap();
        assert_eq!(left.evaluate(0.0), 1.0);
        assert!((left.evaluate(12.5) - 0.5).abs() < 1e-12);

        let right = MembershipFunction::triangular(75.0, 100.0, 100.0).unwrap();
        assert_eq!(right.evaluate(100.0), 1.0);
        assert_eq!(right.evaluate(75.0), 0.0);
    }

    #[test]
    fn trapezoidal_plateau() {
        let mf = MembershipFunction::trapezoidal(-16.0, -16.0, -5.0, -2.0).unwrap();
        assert_eq!(mf.evaluate(-16.0), 1.0);
        assert_eq!(mf.evaluate(-8.0), 1.0);
        assert_eq!(mf.evaluate(-5.0), 1.0);
        assert!((mf.evaluate(-3.5) - 0.5).abs() < 1e-12);
        assert_eq!(mf.evaluate(-2.0), 0.0);
        assert_eq!(mf.evaluate(0.0), 0.0);
    }

    #[test]
    fn invalid_shapes_rejected() {
        assert!(MembershipFunction::triangular(1.0, 0.0, 2.0).is_err());
        assert!(MembershipFunction::triangular(1.0, 1.0, 1.0).is_err());
        assert!(MembershipFunction::trapezoidal(0.0, 2.0, 1.0, 3.0).is_err());
        assert!(MembershipFunction::trapezoidal(0.0, f64::NAN, 1.0, 3.0).is_err());
    }

    #[test]
    fn support_bounds() {
        let mf = MembershipFunction::trapezoidal(60.0, 80.0, 100.0, 100.0).unwrap();
        assert_eq!(mf.support(), (60.0, 100.0));
    }
}

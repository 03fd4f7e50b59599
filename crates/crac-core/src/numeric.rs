use crate::CoreError;

/// Floating point type used throughout the controller
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Saturate `v` to the symmetric band `[-bound, bound]`.
pub fn saturate(v: Real, bound: Real) -> Real {
    v.clamp(-bound, bound)
}

/// Round to a fixed number of decimal places (telemetry formatting).
pub fn round_to(v: Real, decimals: i32) -> Real {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn saturate_is_symmetric() {
        assert_eq!(saturate(20.0, 16.5), 16.5);
        assert_eq!(saturate(-20.0, 16.5), -16.5);
        assert_eq!(saturate(1.25, 2.05), 1.25);
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to(22.456, 2), 22.46);
        assert_eq!(round_to(-0.004, 2), -0.0);
        assert_eq!(round_to(39.96, 1), 40.0);
    }
}

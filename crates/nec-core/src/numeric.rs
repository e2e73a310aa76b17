use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// Complex phasor type used by the field solver.
pub type Cplx = num_complex::Complex64;

/// Gain reported for directions where the radiated power vanishes.
pub const GAIN_FLOOR_DB: Real = -999.99;

/// Power ratios below this threshold are reported as [`GAIN_FLOOR_DB`].
pub const POWER_RATIO_FLOOR: Real = 1e-20;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, CoreError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CoreError::InvalidArg { what })
    }
}

/// Power ratio to decibels, clamped at [`GAIN_FLOOR_DB`].
pub fn db10(power_ratio: Real) -> Real {
    if power_ratio < POWER_RATIO_FLOOR {
        GAIN_FLOOR_DB
    } else {
        10.0 * power_ratio.log10()
    }
}

/// Field magnitude ratio to decibels, clamped at [`GAIN_FLOOR_DB`].
pub fn db20(magnitude_ratio: Real) -> Real {
    db10(magnitude_ratio * magnitude_ratio)
}

/// Inverse of [`db10`] for values above the floor.
pub fn from_db10(db: Real) -> Real {
    if db <= GAIN_FLOOR_DB {
        0.0
    } else {
        10f64.powf(db / 10.0)
    }
}

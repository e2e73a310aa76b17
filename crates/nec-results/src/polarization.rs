//! Polarization ellipse of a far-field sample.
//!
//! The field `E_theta * theta_hat + E_phi * phi_hat` is split into
//! right-hand and left-hand circular parts
//! `E_R = (E_theta + j E_phi) / sqrt(2)` and `E_L = (E_theta - j E_phi) / sqrt(2)`.
//! The ellipse axes, tilt and sense follow from their magnitudes and phases.

use nec_core::{Cplx, Real};
use serde::{Deserialize, Serialize};

/// Axial ratios below this are reported as linear polarization.
const LINEAR_RATIO: Real = 1e-5;

/// Rotation sense of the field vector, seen along the direction of propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolarizationSense {
    Linear,
    Right,
    Left,
}

/// Ellipse parameters of one far-field sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarizationEllipse {
    /// `|major axis|^2` in units of `|r E|^2`.
    pub major2: Real,
    pub minor2: Real,
    /// Right-hand circular component power.
    pub rhcp2: Real,
    pub lhcp2: Real,
    /// Minor over major axis, 0 for linear and 1 for circular.
    pub axial_ratio: Real,
    /// Angle of the major axis from theta-hat towards phi-hat, in (-90, 90].
    pub tilt_deg: Real,
    pub sense: PolarizationSense,
}

impl PolarizationEllipse {
    pub fn from_field(e_theta: Cplx, e_phi: Cplx) -> Self {
        let j = Cplx::new(0.0, 1.0);
        let s = core::f64::consts::FRAC_1_SQRT_2;
        let right = (e_theta + j * e_phi) * s;
        let left = (e_theta - j * e_phi) * s;
        let (a, b) = (right.norm(), left.norm());

        let major2 = 0.5 * (a + b) * (a + b);
        let minor2 = 0.5 * (a - b) * (a - b);
        let axial_ratio = if a + b > 0.0 {
            (a - b).abs() / (a + b)
        } else {
            0.0
        };

        let sense = if axial_ratio < LINEAR_RATIO {
            PolarizationSense::Linear
        } else if a > b {
            PolarizationSense::Right
        } else {
            PolarizationSense::Left
        };

        let tilt_deg = if a > 0.0 && b > 0.0 {
            wrap_tilt(0.5 * (right.arg() - left.arg()).to_degrees())
        } else {
            0.0
        };

        Self {
            major2,
            minor2,
            rhcp2: a * a,
            lhcp2: b * b,
            axial_ratio,
            tilt_deg,
            sense,
        }
    }
}

fn wrap_tilt(mut deg: Real) -> Real {
    while deg > 90.0 {
        deg -= 180.0;
    }
    while deg <= -90.0 {
        deg += 180.0;
    }
    deg
}

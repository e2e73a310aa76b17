//! Gain statistics over a radiation pattern.

use nec_core::{GAIN_FLOOR_DB, Real};
use serde::{Deserialize, Serialize};

/// Max/min over every sample; mean and sample standard deviation over the
/// samples above [`GAIN_FLOOR_DB`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainStats {
    pub max: Real,
    pub min: Real,
    pub mean: Real,
    pub sd: Real,
}

impl GainStats {
    /// `None` for an empty sample set.
    pub fn from_db(values: &[Real]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let max = values.iter().copied().fold(Real::NEG_INFINITY, Real::max);
        let min = values.iter().copied().fold(Real::INFINITY, Real::min);

        let above: Vec<Real> = values
            .iter()
            .copied()
            .filter(|&v| v > GAIN_FLOOR_DB)
            .collect();
        let (mean, sd) = match above.len() {
            0 => (GAIN_FLOOR_DB, 0.0),
            1 => (above[0], 0.0),
            n => {
                let mean = above.iter().sum::<Real>() / n as Real;
                let var = above.iter().map(|v| (v - mean) * (v - mean)).sum::<Real>()
                    / (n - 1) as Real;
                (mean, var.sqrt())
            }
        };
        Some(Self { max, min, mean, sd })
    }
}

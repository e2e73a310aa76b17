//! Frequency sweep definition.
//!
//! A sweep is a fixed number of steps starting at a base frequency and
//! advancing either by a constant increment or by a constant ratio.

use nec_core::{Frequency, Real, ensure_positive, in_mhz, mhz};

use crate::error::{EnvironmentError, EnvironmentResult};

/// Type of sweep progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepKind {
    /// f_i = start + i * step (step in MHz)
    #[default]
    Linear,
    /// f_i = start * step^i
    Multiplicative,
}

/// Definition of a frequency sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencySweep {
    pub kind: SweepKind,
    pub steps: u32,
    pub start: Frequency,
    /// Increment in MHz for linear sweeps, ratio for multiplicative ones.
    pub step: Real,
}

impl Default for FrequencySweep {
    /// Single step at 299.8 MHz (one meter wavelength).
    fn default() -> Self {
        Self {
            kind: SweepKind::Linear,
            steps: 1,
            start: mhz(299.8),
            step: 0.0,
        }
    }
}

impl FrequencySweep {
    /// Create a sweep from card-style values (frequencies in MHz).
    pub fn new(kind: SweepKind, steps: u32, start_mhz: Real, step: Real) -> EnvironmentResult<Self> {
        if steps < 1 {
            return Err(EnvironmentError::Invalid {
                what: "frequency sweep needs at least one step",
            });
        }
        ensure_positive(start_mhz, "start frequency")?;
        match kind {
            SweepKind::Linear => {
                if !step.is_finite() {
                    return Err(EnvironmentError::Invalid {
                        what: "frequency increment is not finite",
                    });
                }
            }
            SweepKind::Multiplicative => {
                ensure_positive(step, "frequency ratio")?;
            }
        }
        let sweep = Self {
            kind,
            steps,
            start: mhz(start_mhz),
            step,
        };
        // Every step must stay a positive frequency
        for i in 0..steps {
            if !(sweep.mhz_at(i) > 0.0) {
                return Err(EnvironmentError::Invalid {
                    what: "sweep reaches a non-positive frequency",
                });
            }
        }
        Ok(sweep)
    }

    /// One fixed frequency.
    pub fn single(f_mhz: Real) -> EnvironmentResult<Self> {
        Self::new(SweepKind::Linear, 1, f_mhz, 0.0)
    }

    pub fn len(&self) -> usize {
        self.steps as usize
    }

    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }

    fn mhz_at(&self, index: u32) -> Real {
        let f0 = in_mhz(self.start);
        match self.kind {
            SweepKind::Linear => f0 + index as Real * self.step,
            SweepKind::Multiplicative => f0 * self.step.powi(index as i32),
        }
    }

    /// Frequency of step `index`, if it exists.
    pub fn frequency_at(&self, index: usize) -> Option<Frequency> {
        (index < self.len()).then(|| mhz(self.mhz_at(index as u32)))
    }

    /// Generate all frequencies of the sweep.
    pub fn frequencies(&self) -> Vec<Frequency> {
        (0..self.steps).map(|i| mhz(self.mhz_at(i))).collect()
    }
}

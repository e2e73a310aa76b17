//! Homogeneous propagation medium.

use nec_core::constants::{EPS0, MU0};
use nec_core::{Frequency, Real, ensure_positive};

use crate::error::EnvironmentResult;

/// Permittivity (F/m) and permeability (H/m) of the space around the antenna.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Medium {
    pub permittivity: Real,
    pub permeability: Real,
}

impl Default for Medium {
    fn default() -> Self {
        Self::free_space()
    }
}

impl Medium {
    pub fn free_space() -> Self {
        Self {
            permittivity: EPS0,
            permeability: MU0,
        }
    }

    pub fn new(permittivity: Real, permeability: Real) -> EnvironmentResult<Self> {
        Ok(Self {
            permittivity: ensure_positive(permittivity, "medium permittivity")?,
            permeability: ensure_positive(permeability, "medium permeability")?,
        })
    }

    pub fn wave_speed(&self) -> Real {
        1.0 / (self.permittivity * self.permeability).sqrt()
    }

    pub fn wave_impedance(&self) -> Real {
        (self.permeability / self.permittivity).sqrt()
    }

    pub fn angular_frequency(f: Frequency) -> Real {
        use uom::si::frequency::hertz;
        2.0 * core::f64::consts::PI * f.get::<hertz>()
    }

    pub fn wavenumber(&self, f: Frequency) -> Real {
        Self::angular_frequency(f) / self.wave_speed()
    }

    pub fn wavelength(&self, f: Frequency) -> Real {
        2.0 * core::f64::consts::PI / self.wavenumber(f)
    }
}

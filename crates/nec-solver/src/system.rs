//! Factored interaction systems and the solutions derived from them.

use std::fmt;
use std::sync::Arc;

use nalgebra::{DVector, Dyn, LU};
use nec_core::{CVec3, Cplx, Frequency, Real, Vec3};
use nec_environment::{Ground, Medium, WireKernel};

use crate::green::Green;
use crate::model::FieldModel;
use crate::reflection::PatternMode;
use crate::sources::Impressed;

/// Everything the field routines need about one assembled problem.
#[derive(Debug)]
pub(crate) struct Scene {
    pub model: FieldModel,
    pub medium: Medium,
    pub ground: Ground,
    pub frequency: Frequency,
    pub omega: Real,
    pub k: Real,
    /// Image scale factor, `None` without ground.
    pub image: Option<Cplx>,
    pub impressed: Impressed,
    pub green: Green,
    pub kernel: WireKernel,
    /// Series load impedance per unknown.
    pub loads: Vec<Cplx>,
    /// Segment index of each network port variable.
    pub ports: Vec<usize>,
    /// Stamped network admittance, `ports x ports`.
    pub port_admittance: nalgebra::DMatrix<Cplx>,
}

impl Scene {
    pub fn unknown_count(&self) -> usize {
        self.model.unknown_count()
    }

    pub fn system_size(&self) -> usize {
        self.model.unknown_count() + self.ports.len()
    }
}

/// LU-factored interaction matrix together with its excitation vector.
pub struct FactoredSystem {
    pub(crate) scene: Arc<Scene>,
    pub(crate) lu: LU<Cplx, Dyn, Dyn>,
    pub(crate) rhs: DVector<Cplx>,
}

impl FactoredSystem {
    /// Number of current unknowns (segments plus two per patch).
    pub fn unknown_count(&self) -> usize {
        self.scene.unknown_count()
    }

    pub fn frequency(&self) -> Frequency {
        self.scene.frequency
    }
}

impl fmt::Debug for FactoredSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoredSystem")
            .field("unknowns", &self.scene.unknown_count())
            .field("ports", &self.scene.ports.len())
            .field("omega", &self.scene.omega)
            .finish()
    }
}

/// Element currents of a solved system.
#[derive(Debug, Clone)]
pub struct CurrentDistribution {
    pub(crate) scene: Arc<Scene>,
    pub(crate) currents: Vec<Cplx>,
    pub(crate) port_voltages: Vec<Cplx>,
}

impl CurrentDistribution {
    pub fn frequency(&self) -> Frequency {
        self.scene.frequency
    }

    /// Currents for every unknown: segments first, then two per patch.
    pub fn currents(&self) -> &[Cplx] {
        &self.currents
    }

    pub fn segment_count(&self) -> usize {
        self.scene.model.segment_count()
    }

    /// Current at the center of segment `index`.
    pub fn segment_current(&self, index: usize) -> Option<Cplx> {
        (index < self.segment_count()).then(|| self.currents[index])
    }

    /// Line charge density (C/m) at the center of segment `index`, taken as
    /// the mean of its two half cells.
    pub fn charge_density(&self, index: usize) -> Option<Cplx> {
        if index >= self.segment_count() {
            return None;
        }
        let cells = &self.scene.model.half_cells[2 * index..2 * index + 2];
        let sum: Cplx = cells.iter().map(|cell| self.cell_charge(&cell.charge)).sum();
        Some(sum * 0.5)
    }

    pub(crate) fn cell_charge(&self, terms: &[(usize, Real)]) -> Cplx {
        let di: Cplx = terms.iter().map(|&(n, c)| self.currents[n] * c).sum();
        di * Cplx::new(0.0, 1.0 / self.scene.omega)
    }

    /// Voltage applied to each network port, in port order.
    pub fn port_voltages(&self) -> &[Cplx] {
        &self.port_voltages
    }

    /// Power delivered by the voltage source, zero for other excitations.
    pub fn input_power(&self) -> Real {
        match self.scene.impressed {
            Impressed::Voltage { segment, voltage } => {
                0.5 * (voltage * self.currents[segment].conj()).re
            }
            _ => 0.0,
        }
    }

    /// Power dissipated in loads and absorbed by networks.
    pub fn loss_power(&self) -> Real {
        let loads: Real = self
            .scene
            .loads
            .iter()
            .zip(&self.currents)
            .map(|(z, i)| 0.5 * z.re * i.norm_sqr())
            .sum();
        let networks: Real = self
            .scene
            .ports
            .iter()
            .zip(&self.port_voltages)
            .map(|(&seg, v)| -0.5 * (v * self.currents[seg].conj()).re)
            .sum();
        loads + networks
    }

    /// Reference power used for gain: input power for voltage sources and
    /// the free-space radiated power of an elementary current source.
    fn reference_power(&self, directive: bool) -> Real {
        match self.scene.impressed {
            Impressed::Voltage { .. } => {
                let p = self.input_power();
                if directive { p - self.loss_power() } else { p }
            }
            Impressed::Dipole { moment, .. } => {
                let eta = self.scene.medium.wave_impedance();
                eta * self.scene.k * self.scene.k * moment.norm_sqr()
                    / (12.0 * core::f64::consts::PI)
            }
            Impressed::None | Impressed::PlaneWave { .. } => 0.0,
        }
    }

    /// Whether [`CurrentDistribution::gain`] reports scattering cross
    /// section instead of gain.
    pub fn is_scattering(&self) -> bool {
        matches!(self.scene.impressed, Impressed::PlaneWave { .. })
    }

    /// Power gain (or directive gain) as a ratio for a far-field sample.
    ///
    /// With plane-wave excitation the result is the bistatic cross section
    /// normalized to the squared wavelength.
    pub fn gain(&self, field: &FarField, directive: bool) -> Real {
        let f2 = field.e_theta.norm_sqr() + field.e_phi.norm_sqr();
        self.component_gain(f2, directive)
    }

    /// Gain ratio for a single field magnitude squared (`|r E|^2`).
    pub fn component_gain(&self, f2: Real, directive: bool) -> Real {
        if let Impressed::PlaneWave { amplitude2, .. } = self.scene.impressed {
            let lambda = 2.0 * core::f64::consts::PI / self.scene.k;
            return 4.0 * core::f64::consts::PI * f2 / (amplitude2 * lambda * lambda);
        }
        let p = self.reference_power(directive);
        if p <= 0.0 {
            return 0.0;
        }
        let eta = self.scene.medium.wave_impedance();
        2.0 * core::f64::consts::PI * f2 / (eta * p)
    }
}

/// Far-field sample point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarFieldPoint {
    /// Polar angle; in the surface-wave mode the height z (m) of the point.
    pub theta_deg: Real,
    pub phi_deg: Real,
    pub mode: PatternMode,
    /// Radial distance for the surface-wave mode (m).
    pub distance: Real,
}

impl FarFieldPoint {
    pub fn space_wave(theta_deg: Real, phi_deg: Real) -> Self {
        Self {
            theta_deg,
            phi_deg,
            mode: PatternMode::SpaceWave,
            distance: 0.0,
        }
    }
}

/// Far electric field as `r * E`, split in spherical components (V).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarField {
    pub e_theta: Cplx,
    pub e_phi: Cplx,
}

impl FarField {
    pub const ZERO: FarField = FarField {
        e_theta: Cplx::new(0.0, 0.0),
        e_phi: Cplx::new(0.0, 0.0),
    };
}

/// Total electric (V/m) and magnetic (A/m) field at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearField {
    pub position: Vec3,
    pub e: CVec3,
    pub h: CVec3,
}

//! Output requests: radiation patterns, near fields, print controls, coupling.

use nec_core::{Real, RequestId, Vec3, vec3};
use nec_environment::{SegmentRange, SegmentRef};
use nec_results::{NearFieldKind, Normalization, PatternSettings};
use nec_solver::{FarFieldPoint, PatternMode};

use crate::error::{NecError, NecResult};

/// Angular sampling of a radiation pattern.
///
/// In the surface-wave mode the theta axis carries the height z (m) of the
/// field points instead of an angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleGrid {
    pub theta_count: u32,
    pub phi_count: u32,
    pub theta_start: Real,
    pub phi_start: Real,
    pub theta_step: Real,
    pub phi_step: Real,
}

impl AngleGrid {
    /// `theta_count` polar angles at a single azimuth.
    pub fn theta_cut(theta_count: u32, theta_start: Real, theta_step: Real, phi: Real) -> Self {
        Self {
            theta_count,
            phi_count: 1,
            theta_start,
            phi_start: phi,
            theta_step,
            phi_step: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.theta_count as usize * self.phi_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn validate(&self) -> NecResult<()> {
        if self.theta_count == 0 || self.phi_count == 0 {
            return Err(NecError::invalid("pattern grid needs at least one point per axis"));
        }
        let values = [
            self.theta_start,
            self.phi_start,
            self.theta_step,
            self.phi_step,
        ];
        if !values.iter().all(|v| v.is_finite()) {
            return Err(NecError::invalid("pattern grid angles must be finite"));
        }
        Ok(())
    }

    /// (theta, phi) pairs with theta stepping fastest.
    pub fn angles(&self) -> impl Iterator<Item = (Real, Real)> + '_ {
        (0..self.phi_count).flat_map(move |j| {
            (0..self.theta_count).map(move |i| {
                (
                    self.theta_start + i as Real * self.theta_step,
                    self.phi_start + j as Real * self.phi_step,
                )
            })
        })
    }
}

/// Radiation pattern request (RP).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiationPattern {
    pub mode: PatternMode,
    pub grid: AngleGrid,
    pub settings: PatternSettings,
    /// Radial distance (m); the cylindrical range in the surface-wave mode.
    pub distance: Real,
}

impl RadiationPattern {
    pub fn new(mode: PatternMode, grid: AngleGrid, settings: PatternSettings) -> Self {
        Self {
            mode,
            grid,
            settings,
            distance: 0.0,
        }
    }

    pub(crate) fn validate(&self) -> NecResult<()> {
        self.grid.validate()?;
        if !(self.distance.is_finite() && self.distance >= 0.0) {
            return Err(NecError::invalid("pattern distance must be a non-negative number"));
        }
        if self.mode == PatternMode::SurfaceWave && self.distance == 0.0 {
            return Err(NecError::invalid("surface-wave pattern needs a radial distance"));
        }
        if !self.settings.gain_norm_db.is_finite() {
            return Err(NecError::invalid("gain normalization must be finite"));
        }
        Ok(())
    }

    pub(crate) fn points(&self) -> Vec<FarFieldPoint> {
        self.grid
            .angles()
            .map(|(theta_deg, phi_deg)| FarFieldPoint {
                theta_deg,
                phi_deg,
                mode: self.mode,
                distance: self.distance,
            })
            .collect()
    }

    /// True when a space-wave point lies below the horizon.
    pub(crate) fn reaches_below_horizon(&self) -> bool {
        self.mode != PatternMode::SurfaceWave && self.grid.angles().any(|(theta, _)| theta > 90.0)
    }
}

/// Sampling of a near-field request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NearFieldGrid {
    /// x fastest, then y, then z.
    Rectangular {
        start: Vec3,
        counts: [u32; 3],
        step: Vec3,
    },
    /// Radius fastest, then azimuth, then polar angle (degrees).
    Spherical {
        radius: Real,
        phi_deg: Real,
        theta_deg: Real,
        counts: [u32; 3],
        step: Vec3,
    },
}

impl NearFieldGrid {
    fn counts(&self) -> [u32; 3] {
        match *self {
            NearFieldGrid::Rectangular { counts, .. } | NearFieldGrid::Spherical { counts, .. } => {
                counts
            }
        }
    }

    pub fn len(&self) -> usize {
        self.counts().iter().map(|&c| c as usize).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn validate(&self) -> NecResult<()> {
        if self.counts().contains(&0) {
            return Err(NecError::invalid("near-field grid needs at least one point per axis"));
        }
        let finite = |v: &Vec3| v.iter().all(|c| c.is_finite());
        let ok = match self {
            NearFieldGrid::Rectangular { start, step, .. } => finite(start) && finite(step),
            NearFieldGrid::Spherical {
                radius,
                phi_deg,
                theta_deg,
                step,
                ..
            } => finite(&vec3(*radius, *phi_deg, *theta_deg)) && finite(step),
        };
        if ok {
            Ok(())
        } else {
            Err(NecError::invalid("near-field grid must be finite"))
        }
    }

    pub fn positions(&self) -> Vec<Vec3> {
        let [nx, ny, nz] = self.counts();
        let mut out = Vec::with_capacity(self.len());
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let idx = vec3(i as Real, j as Real, k as Real);
                    out.push(match *self {
                        NearFieldGrid::Rectangular { start, step, .. } => {
                            start + step.component_mul(&idx)
                        }
                        NearFieldGrid::Spherical {
                            radius,
                            phi_deg,
                            theta_deg,
                            step,
                            ..
                        } => {
                            let r = radius + idx.x * step.x;
                            let (sp, cp) = (phi_deg + idx.y * step.y).to_radians().sin_cos();
                            let (st, ct) = (theta_deg + idx.z * step.z).to_radians().sin_cos();
                            vec3(r * st * cp, r * st * sp, r * ct)
                        }
                    });
                }
            }
        }
        out
    }
}

/// Near-field request (NE for E, NH for H).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearFieldRequest {
    pub kind: NearFieldKind,
    pub grid: NearFieldGrid,
}

/// Segments whose currents or charges a print control captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentSelection {
    #[default]
    All,
    Range(SegmentRange),
}

/// Current (PT) or charge (PQ) print control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintControl {
    pub selection: SegmentSelection,
    pub charges: bool,
}

/// Output request recorded by the context, applied at every frequency step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputRequest {
    Pattern(RadiationPattern),
    NearField(NearFieldRequest),
    Print(PrintControl),
    Coupling(SegmentRef, SegmentRef),
}

impl OutputRequest {
    pub fn is_total_pattern(&self) -> bool {
        matches!(
            self,
            OutputRequest::Pattern(p) if p.settings.normalization == Normalization::Total
        )
    }
}

/// Recorded request together with its sequence number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedRequest {
    pub id: RequestId,
    pub request: OutputRequest,
}

/// Pattern generation attached to an execute directive (XQ).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecuteMode {
    /// Solve every step without generating patterns.
    #[default]
    SolveOnly,
    /// theta 0..90 in 1 degree steps at phi = 0.
    XzCut,
    /// theta 0..90 in 1 degree steps at phi = 90.
    YzCut,
    BothCuts,
}

impl ExecuteMode {
    pub(crate) fn cuts(self) -> &'static [Real] {
        match self {
            ExecuteMode::SolveOnly => &[],
            ExecuteMode::XzCut => &[0.0],
            ExecuteMode::YzCut => &[90.0],
            ExecuteMode::BothCuts => &[0.0, 90.0],
        }
    }
}

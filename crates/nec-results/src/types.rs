//! Result data types.

use nec_core::{Cplx, GAIN_FLOOR_DB, Real, RequestId, db10};
use serde::{Deserialize, Serialize};

use crate::polarization::{PolarizationEllipse, PolarizationSense};
use crate::stats::GainStats;

/// Which pair of polarization gains a pattern reports alongside the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    MajorMinor,
    VerticalHorizontal,
}

/// Gain column a pattern is normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalization {
    #[default]
    None,
    Major,
    Minor,
    Vertical,
    Horizontal,
    Total,
}

impl Normalization {
    pub fn component(self) -> Option<GainComponent> {
        match self {
            Normalization::None => None,
            Normalization::Major => Some(GainComponent::Major),
            Normalization::Minor => Some(GainComponent::Minor),
            Normalization::Vertical => Some(GainComponent::Vertical),
            Normalization::Horizontal => Some(GainComponent::Horizontal),
            Normalization::Total => Some(GainComponent::Total),
        }
    }
}

/// Reference power for gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GainType {
    /// Relative to the input power.
    #[default]
    Power,
    /// Relative to the radiated power (input minus losses).
    Directive,
}

/// Average-gain reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Averaging {
    #[default]
    None,
    /// Report every point and the average.
    Print,
    /// Report the average only.
    AverageOnly,
}

/// One gain column of a pattern point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GainComponent {
    Total,
    Vertical,
    Horizontal,
    Major,
    Minor,
    Rhcp,
    Lhcp,
}

/// Output options shared by every point of a radiation pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternSettings {
    pub format: OutputFormat,
    pub normalization: Normalization,
    pub gain_type: GainType,
    pub averaging: Averaging,
    /// Normalization reference in dB; 0 normalizes to the pattern maximum.
    pub gain_norm_db: Real,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::MajorMinor,
            normalization: Normalization::Total,
            gain_type: GainType::Power,
            averaging: Averaging::None,
            gain_norm_db: 0.0,
        }
    }
}

/// Gains (dB) and polarization of one far-field direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternPoint {
    pub theta_deg: Real,
    pub phi_deg: Real,
    pub vertical_db: Real,
    pub horizontal_db: Real,
    pub major_db: Real,
    pub minor_db: Real,
    pub total_db: Real,
    pub rhcp_db: Real,
    pub lhcp_db: Real,
    pub axial_ratio: Real,
    pub tilt_deg: Real,
    pub sense: PolarizationSense,
    pub e_theta: Cplx,
    pub e_phi: Cplx,
}

impl PatternPoint {
    /// Build a point from the far field; `gain` maps a squared field
    /// magnitude `|r E|^2` to a power ratio.
    pub fn from_field(
        theta_deg: Real,
        phi_deg: Real,
        e_theta: Cplx,
        e_phi: Cplx,
        gain: impl Fn(Real) -> Real,
    ) -> Self {
        let ellipse = PolarizationEllipse::from_field(e_theta, e_phi);
        let db = |f2: Real| db10(gain(f2));
        Self {
            theta_deg,
            phi_deg,
            vertical_db: db(e_theta.norm_sqr()),
            horizontal_db: db(e_phi.norm_sqr()),
            major_db: db(ellipse.major2),
            minor_db: db(ellipse.minor2),
            total_db: db(e_theta.norm_sqr() + e_phi.norm_sqr()),
            rhcp_db: db(ellipse.rhcp2),
            lhcp_db: db(ellipse.lhcp2),
            axial_ratio: ellipse.axial_ratio,
            tilt_deg: ellipse.tilt_deg,
            sense: ellipse.sense,
            e_theta,
            e_phi,
        }
    }

    pub fn gain_db(&self, component: GainComponent) -> Real {
        match component {
            GainComponent::Total => self.total_db,
            GainComponent::Vertical => self.vertical_db,
            GainComponent::Horizontal => self.horizontal_db,
            GainComponent::Major => self.major_db,
            GainComponent::Minor => self.minor_db,
            GainComponent::Rhcp => self.rhcp_db,
            GainComponent::Lhcp => self.lhcp_db,
        }
    }
}

/// Computed radiation pattern for one (frequency step, request).
///
/// Points are stored theta-fastest: index `phi_index * theta_count + theta_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    pub step: usize,
    pub request: RequestId,
    pub frequency_mhz: Real,
    pub theta_count: usize,
    pub phi_count: usize,
    pub settings: PatternSettings,
    /// Gains are bistatic scattering cross sections (sigma / lambda^2).
    pub scattering: bool,
    pub points: Vec<PatternPoint>,
    /// Normalized gain column, one value per point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<Vec<Real>>,
    /// dB value subtracted to produce `normalized`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization_reference_db: Option<Real>,
    /// Solid-angle weighted average of the total power ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_gain: Option<Real>,
}

impl PatternResult {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        step: usize,
        request: RequestId,
        frequency_mhz: Real,
        theta_count: usize,
        phi_count: usize,
        settings: PatternSettings,
        scattering: bool,
        points: Vec<PatternPoint>,
    ) -> Self {
        let mut result = Self {
            step,
            request,
            frequency_mhz,
            theta_count,
            phi_count,
            settings,
            scattering,
            points,
            normalized: None,
            normalization_reference_db: None,
            average_gain: None,
        };
        result.apply_normalization();
        if settings.averaging != Averaging::None {
            result.average_gain = result.solid_angle_average();
        }
        result
    }

    fn apply_normalization(&mut self) {
        let Some(component) = self.settings.normalization.component() else {
            return;
        };
        let column: Vec<Real> = self.points.iter().map(|p| p.gain_db(component)).collect();
        let reference = if self.settings.gain_norm_db == 0.0 {
            column.iter().copied().fold(GAIN_FLOOR_DB, Real::max)
        } else {
            self.settings.gain_norm_db
        };
        self.normalized = Some(
            column
                .iter()
                .map(|&g| if g <= GAIN_FLOOR_DB { g } else { g - reference })
                .collect(),
        );
        self.normalization_reference_db = Some(reference);
    }

    /// Average of the total power ratio weighted by `sin(theta)`; a plain
    /// mean when every point lies on the axis.
    fn solid_angle_average(&self) -> Option<Real> {
        if self.points.is_empty() {
            return None;
        }
        let ratio = |p: &PatternPoint| nec_core::from_db10(p.total_db);
        let (mut weighted, mut weights) = (0.0, 0.0);
        for p in &self.points {
            let w = p.theta_deg.to_radians().sin().abs();
            weighted += w * ratio(p);
            weights += w;
        }
        if weights > 0.0 {
            Some(weighted / weights)
        } else {
            Some(self.points.iter().map(ratio).sum::<Real>() / self.points.len() as Real)
        }
    }

    /// Whether gain accessors keyed by frequency step may use this pattern.
    pub fn is_total_normalized(&self) -> bool {
        self.settings.normalization == Normalization::Total
    }

    pub fn point(&self, theta_index: usize, phi_index: usize) -> Option<&PatternPoint> {
        if theta_index >= self.theta_count || phi_index >= self.phi_count {
            return None;
        }
        self.points.get(phi_index * self.theta_count + theta_index)
    }

    /// Total gain (dB) at a grid position.
    pub fn gain(&self, theta_index: usize, phi_index: usize) -> Option<Real> {
        self.point(theta_index, phi_index).map(|p| p.total_db)
    }

    pub fn column(&self, component: GainComponent) -> Vec<Real> {
        self.points.iter().map(|p| p.gain_db(component)).collect()
    }

    pub fn stats(&self, component: GainComponent) -> Option<GainStats> {
        GainStats::from_db(&self.column(component))
    }
}

/// Field quantity sampled by a near-field request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NearFieldKind {
    /// E in V/m.
    Electric,
    /// H in A/m.
    Magnetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearFieldSample {
    pub position: [Real; 3],
    /// Cartesian field components.
    pub field: [Cplx; 3],
}

impl NearFieldSample {
    /// Peak magnitude of the field vector `sqrt(|Fx|^2 + |Fy|^2 + |Fz|^2)`.
    pub fn magnitude(&self) -> Real {
        self.field.iter().map(|c| c.norm_sqr()).sum::<Real>().sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearFieldResult {
    pub step: usize,
    pub request: RequestId,
    pub frequency_mhz: Real,
    pub kind: NearFieldKind,
    pub samples: Vec<NearFieldSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentCurrent {
    /// 1-based absolute segment number.
    pub number: usize,
    pub tag: u32,
    pub center: [Real; 3],
    pub length: Real,
    pub current: Cplx,
    /// Line charge density (C/m), when charges were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge_density: Option<Cplx>,
}

/// Segment currents (and optionally charges) captured after a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentReport {
    pub step: usize,
    pub request: RequestId,
    pub frequency_mhz: Real,
    pub segments: Vec<SegmentCurrent>,
}

/// Coupling between two segments from their short-circuit admittances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CouplingResult {
    pub step: usize,
    pub request: RequestId,
    pub frequency_mhz: Real,
    /// 1-based absolute segment numbers.
    pub segments: [usize; 2],
    pub admittance: [[Cplx; 2]; 2],
    /// Maximum power transfer between the ports, in dB.
    pub max_coupling_db: Real,
}

impl CouplingResult {
    /// Maximum available coupling of a passive two-port from its Y matrix:
    /// `|Y12|^2 / (c + sqrt(c^2 - |Y12|^4))` with `c = 2 g11 g22 - Re(Y12^2)`.
    ///
    /// `None` when the two-port is not passive.
    pub fn max_coupling(y: &[[Cplx; 2]; 2]) -> Option<Real> {
        let y12 = y[0][1];
        let c = 2.0 * y[0][0].re * y[1][1].re - (y12 * y12).re;
        let y4 = y12.norm_sqr() * y12.norm_sqr();
        let disc = c * c - y4;
        if c <= 0.0 || disc < 0.0 {
            return None;
        }
        Some(y12.norm_sqr() / (c + disc.sqrt()))
    }
}

/// Feed-point and power figures of one frequency step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step: usize,
    pub frequency_mhz: Real,
    /// Input impedance, present only for voltage-source excitation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impedance: Option<Cplx>,
    pub input_power: Real,
    pub loss_power: Real,
}

impl StepSummary {
    pub fn admittance(&self) -> Option<Cplx> {
        self.impedance.filter(|z| z.norm() > 0.0).map(|z| z.inv())
    }

    pub fn radiated_power(&self) -> Real {
        self.input_power - self.loss_power
    }

    /// Radiated over input power, `None` without input power.
    pub fn efficiency(&self) -> Option<Real> {
        (self.input_power > 0.0).then(|| self.radiated_power() / self.input_power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(n: u32) -> RequestId {
        RequestId::from_index(n)
    }

    fn vertical_point(theta: Real, phi: Real, amplitude: Real) -> PatternPoint {
        PatternPoint::from_field(
            theta,
            phi,
            Cplx::new(amplitude, 0.0),
            Cplx::new(0.0, 0.0),
            |f2| f2,
        )
    }

    fn grid() -> Vec<PatternPoint> {
        // 3 theta x 2 phi, theta fastest
        let mut pts = Vec::new();
        for (pi, phi) in [0.0, 90.0].into_iter().enumerate() {
            for (ti, theta) in [0.0, 45.0, 90.0].into_iter().enumerate() {
                pts.push(vertical_point(theta, phi, (ti + 3 * pi) as Real));
            }
        }
        pts
    }

    #[test]
    fn point_columns() {
        let p = vertical_point(90.0, 0.0, 10.0);
        assert!((p.total_db - 20.0).abs() < 1e-12);
        assert!((p.vertical_db - 20.0).abs() < 1e-12);
        assert_eq!(p.horizontal_db, GAIN_FLOOR_DB);
        assert_eq!(p.minor_db, GAIN_FLOOR_DB);
        assert!((p.rhcp_db - (20.0 - 10.0 * 2f64.log10())).abs() < 1e-9);
    }

    #[test]
    fn theta_varies_fastest() {
        let r = PatternResult::new(0, rid(0), 30.0, 3, 2, PatternSettings::default(), false, grid());
        assert_eq!(r.point(1, 0).unwrap().theta_deg, 45.0);
        assert_eq!(r.point(0, 1).unwrap().phi_deg, 90.0);
        assert!((r.gain(2, 1).unwrap() - 10.0 * 25f64.log10()).abs() < 1e-9);
        assert!(r.gain(3, 0).is_none());
        assert!(r.gain(0, 2).is_none());
    }

    #[test]
    fn normalization_to_maximum_and_literal() {
        let r = PatternResult::new(0, rid(0), 30.0, 3, 2, PatternSettings::default(), false, grid());
        let norm = r.normalized.as_ref().unwrap();
        let max = norm.iter().copied().fold(Real::NEG_INFINITY, Real::max);
        assert!(max.abs() < 1e-12);
        // first point has zero field and stays on the floor
        assert_eq!(norm[0], GAIN_FLOOR_DB);

        let settings = PatternSettings {
            gain_norm_db: 3.0,
            ..PatternSettings::default()
        };
        let r = PatternResult::new(0, rid(0), 30.0, 3, 2, settings, false, grid());
        assert_eq!(r.normalization_reference_db, Some(3.0));
        assert!((r.normalized.unwrap()[1] - (0.0 - 3.0)).abs() < 1e-12);

        let none = PatternSettings {
            normalization: Normalization::None,
            ..PatternSettings::default()
        };
        let r = PatternResult::new(0, rid(0), 30.0, 3, 2, none, false, grid());
        assert!(r.normalized.is_none());
        assert!(!r.is_total_normalized());
    }

    #[test]
    fn average_is_weighted_by_solid_angle() {
        let settings = PatternSettings {
            averaging: Averaging::Print,
            ..PatternSettings::default()
        };
        let pts = vec![vertical_point(0.0, 0.0, 100.0), vertical_point(90.0, 0.0, 1.0)];
        let r = PatternResult::new(0, rid(0), 30.0, 2, 1, settings, false, pts);
        assert!((r.average_gain.unwrap() - 1.0).abs() < 1e-12);

        let axis_only = vec![vertical_point(0.0, 0.0, 2.0)];
        let r = PatternResult::new(0, rid(0), 30.0, 1, 1, settings, false, axis_only);
        assert!((r.average_gain.unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn max_coupling_cases() {
        let zero = Cplx::new(0.0, 0.0);
        let g = Cplx::new(0.02, 0.0);
        assert_eq!(CouplingResult::max_coupling(&[[g, zero], [zero, g]]), Some(0.0));
        let active = [
            [Cplx::new(-0.01, 0.0), Cplx::new(0.001, 0.0)],
            [Cplx::new(0.001, 0.0), Cplx::new(0.01, 0.0)],
        ];
        assert!(CouplingResult::max_coupling(&active).is_none());
        let y12 = Cplx::new(-0.01, 0.0);
        let m = CouplingResult::max_coupling(&[[g, y12], [y12, g]]).unwrap();
        assert!((m - 1e-4 / (7e-4 + 4.8e-7f64.sqrt())).abs() < 1e-9);
    }

    #[test]
    fn step_summary_derived_values() {
        let s = StepSummary {
            step: 0,
            frequency_mhz: 30.0,
            impedance: Some(Cplx::new(50.0, 0.0)),
            input_power: 2.0,
            loss_power: 0.5,
        };
        assert!((s.admittance().unwrap() - Cplx::new(0.02, 0.0)).norm() < 1e-15);
        assert_eq!(s.radiated_power(), 1.5);
        assert_eq!(s.efficiency(), Some(0.75));
        let idle = StepSummary {
            impedance: None,
            input_power: 0.0,
            ..s
        };
        assert!(idle.admittance().is_none());
        assert!(idle.efficiency().is_none());
    }
}

//! Excitation sources.

use nec_core::{Cplx, Real, Vec3, vec3};
use nec_geometry::Tag;

use crate::error::{EnvironmentError, EnvironmentResult};

/// A segment addressed as (tag, 1-based ordinal within tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRef {
    pub tag: Tag,
    pub ordinal: u32,
}

impl SegmentRef {
    pub fn new(tag: Tag, ordinal: u32) -> Self {
        Self { tag, ordinal }
    }
}

/// Sense of an incident elliptically polarized plane wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarization {
    #[default]
    Linear,
    RightElliptic,
    LeftElliptic,
}

/// Fieldless discriminant of [`Excitation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcitationKind {
    AppliedVoltage,
    CurrentSlopeVoltage,
    PlaneWave,
    ElementaryCurrent,
}

/// The single active source driving a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Excitation {
    /// Delta-gap voltage across a segment.
    AppliedVoltage { segment: SegmentRef, voltage: Cplx },
    /// Voltage source modelled as a discontinuity in current slope.
    CurrentSlopeVoltage { segment: SegmentRef, voltage: Cplx },
    /// Unit-amplitude incident plane wave arriving from (theta, phi).
    ///
    /// `eta_deg` is the polarization angle from the theta unit vector;
    /// `axial_ratio` is minor/major for elliptic polarization.
    PlaneWave {
        theta_deg: Real,
        phi_deg: Real,
        eta_deg: Real,
        polarization: Polarization,
        axial_ratio: Real,
    },
    /// Infinitesimal current element of moment `moment` (A m).
    ///
    /// `alpha_deg` is the elevation above the XY plane, `beta_deg` the
    /// azimuth of its projection from the X axis.
    ElementaryCurrent {
        position: Vec3,
        alpha_deg: Real,
        beta_deg: Real,
        moment: Cplx,
    },
}

impl Excitation {
    pub fn kind(&self) -> ExcitationKind {
        match self {
            Excitation::AppliedVoltage { .. } => ExcitationKind::AppliedVoltage,
            Excitation::CurrentSlopeVoltage { .. } => ExcitationKind::CurrentSlopeVoltage,
            Excitation::PlaneWave { .. } => ExcitationKind::PlaneWave,
            Excitation::ElementaryCurrent { .. } => ExcitationKind::ElementaryCurrent,
        }
    }

    /// Voltage sources define an input impedance.
    pub fn voltage_source(&self) -> Option<(SegmentRef, Cplx)> {
        match *self {
            Excitation::AppliedVoltage { segment, voltage }
            | Excitation::CurrentSlopeVoltage { segment, voltage } => Some((segment, voltage)),
            _ => None,
        }
    }

    pub fn validate(&self) -> EnvironmentResult<()> {
        let finite = |vals: &[Real]| vals.iter().all(|v| v.is_finite());
        let ok = match *self {
            Excitation::AppliedVoltage { segment, voltage }
            | Excitation::CurrentSlopeVoltage { segment, voltage } => {
                if segment.ordinal == 0 {
                    return Err(EnvironmentError::Invalid {
                        what: "source segment ordinal is 1-based",
                    });
                }
                finite(&[voltage.re, voltage.im])
            }
            Excitation::PlaneWave {
                theta_deg,
                phi_deg,
                eta_deg,
                axial_ratio,
                ..
            } => {
                if !(-1.0..=1.0).contains(&axial_ratio) {
                    return Err(EnvironmentError::Invalid {
                        what: "axial ratio must lie in [-1, 1]",
                    });
                }
                finite(&[theta_deg, phi_deg, eta_deg])
            }
            Excitation::ElementaryCurrent {
                position,
                alpha_deg,
                beta_deg,
                moment,
            } => finite(&[
                position.x, position.y, position.z, alpha_deg, beta_deg, moment.re, moment.im,
            ]),
        };
        if ok {
            Ok(())
        } else {
            Err(EnvironmentError::Invalid {
                what: "excitation parameter is not finite",
            })
        }
    }
}

/// Unit direction of an elementary current source.
pub fn current_element_direction(alpha_deg: Real, beta_deg: Real) -> Vec3 {
    let (sa, ca) = alpha_deg.to_radians().sin_cos();
    let (sb, cb) = beta_deg.to_radians().sin_cos();
    vec3(ca * cb, ca * sb, sa)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voltage_sources_expose_feed() {
        let ex = Excitation::AppliedVoltage {
            segment: SegmentRef::new(0, 5),
            voltage: Cplx::new(1.0, 0.0),
        };
        assert_eq!(ex.kind(), ExcitationKind::AppliedVoltage);
        assert_eq!(
            ex.voltage_source(),
            Some((SegmentRef::new(0, 5), Cplx::new(1.0, 0.0)))
        );

        let pw = Excitation::PlaneWave {
            theta_deg: 90.0,
            phi_deg: 0.0,
            eta_deg: 0.0,
            polarization: Polarization::Linear,
            axial_ratio: 0.0,
        };
        assert!(pw.voltage_source().is_none());
        assert!(pw.validate().is_ok());
    }

    #[test]
    fn invalid_excitations() {
        let bad_seg = Excitation::AppliedVoltage {
            segment: SegmentRef::new(1, 0),
            voltage: Cplx::new(1.0, 0.0),
        };
        assert!(bad_seg.validate().is_err());
        let bad_ratio = Excitation::PlaneWave {
            theta_deg: 0.0,
            phi_deg: 0.0,
            eta_deg: 0.0,
            polarization: Polarization::RightElliptic,
            axial_ratio: 2.0,
        };
        assert!(bad_ratio.validate().is_err());
    }

    #[test]
    fn element_direction_from_angles() {
        let up = current_element_direction(90.0, 0.0);
        assert!((up - vec3(0.0, 0.0, 1.0)).norm() < 1e-12);
        let y = current_element_direction(0.0, 90.0);
        assert!((y - vec3(0.0, 1.0, 0.0)).norm() < 1e-12);
    }
}

//! Impressed fields and the excitation vector.

use nalgebra::DVector;
use nec_core::{CVec3, Cplx, Real, Vec3, spherical_basis, to_complex, vec3};
use nec_environment::{Excitation, Ground, Medium, Polarization, current_element_direction};
use nec_geometry::Geometry;

use crate::error::{SolverError, SolverResult};
use crate::reflection::{fresnel, mirror, relative_permittivity};
use crate::system::Scene;

/// Resolved excitation for one frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Impressed {
    None,
    Voltage {
        segment: usize,
        voltage: Cplx,
    },
    PlaneWave {
        k_hat: Vec3,
        e: CVec3,
        /// Ground-reflected wave: propagation direction and amplitude.
        reflected: Option<(Vec3, CVec3)>,
        amplitude2: Real,
    },
    Dipole {
        position: Vec3,
        direction: Vec3,
        moment: Cplx,
    },
}

impl Impressed {
    pub fn resolve(
        excitation: Option<&Excitation>,
        geometry: &Geometry,
        ground: &Ground,
        medium: &Medium,
        omega: Real,
    ) -> SolverResult<Self> {
        let Some(excitation) = excitation else {
            return Ok(Impressed::None);
        };
        excitation.validate()?;
        match *excitation {
            Excitation::AppliedVoltage { segment, voltage }
            | Excitation::CurrentSlopeVoltage { segment, voltage } => {
                let index = geometry
                    .find_segment(segment.tag, segment.ordinal)
                    .ok_or_else(|| SolverError::ProblemSetup {
                        what: format!(
                            "source segment {} of tag {} does not exist",
                            segment.ordinal, segment.tag
                        ),
                    })?;
                Ok(Impressed::Voltage {
                    segment: index,
                    voltage,
                })
            }
            Excitation::PlaneWave {
                theta_deg,
                phi_deg,
                eta_deg,
                polarization,
                axial_ratio,
            } => {
                let (r, t, p) = spherical_basis(theta_deg, phi_deg);
                let k_hat = -r;
                let (se, ce) = eta_deg.to_radians().sin_cos();
                let major = t * ce + p * se;
                let minor = t * (-se) + p * ce;
                let sense = match polarization {
                    Polarization::Linear => 0.0,
                    Polarization::RightElliptic => 1.0,
                    Polarization::LeftElliptic => -1.0,
                };
                let e = to_complex(&major) + to_complex(&minor) * Cplx::new(0.0, sense * axial_ratio);
                let amplitude2 = 1.0 + (sense * axial_ratio).powi(2);
                let reflected = reflect_plane_wave(ground, medium, omega, &k_hat, &e);
                Ok(Impressed::PlaneWave {
                    k_hat,
                    e,
                    reflected,
                    amplitude2,
                })
            }
            Excitation::ElementaryCurrent {
                position,
                alpha_deg,
                beta_deg,
                moment,
            } => Ok(Impressed::Dipole {
                position,
                direction: current_element_direction(alpha_deg, beta_deg),
                moment,
            }),
        }
    }

    /// Impressed (E, H) at `r`, including the ground image or reflection.
    pub fn field_at(&self, scene: &Scene, r: &Vec3) -> (CVec3, CVec3) {
        let zero = CVec3::zeros();
        let k = scene.k;
        let eta = scene.medium.wave_impedance();
        match *self {
            Impressed::None | Impressed::Voltage { .. } => (zero, zero),
            Impressed::PlaneWave {
                k_hat,
                e,
                reflected,
                ..
            } => {
                let wave = |dir: &Vec3, amp: &CVec3| -> (CVec3, CVec3) {
                    let phase = Cplx::new(0.0, -k * dir.dot(r)).exp();
                    let e_field = amp * phase;
                    let h_field = to_complex(dir).cross(&e_field) * Cplx::new(1.0 / eta, 0.0);
                    (e_field, h_field)
                };
                let (mut e_total, mut h_total) = wave(&k_hat, &e);
                if let Some((k_r, e_r)) = reflected {
                    let (e2, h2) = wave(&k_r, &e_r);
                    e_total += e2;
                    h_total += h2;
                }
                (e_total, h_total)
            }
            Impressed::Dipole {
                position,
                direction,
                moment,
            } => {
                let (mut e_total, mut h_total) =
                    dipole_field(&position, &direction, moment, r, k, scene.omega, scene.medium.permittivity);
                if let Some(gamma) = scene.image {
                    let (e2, h2) = dipole_field(
                        &mirror(&position),
                        &mirror(&direction),
                        -gamma * moment,
                        r,
                        k,
                        scene.omega,
                        scene.medium.permittivity,
                    );
                    e_total += e2;
                    h_total += h2;
                }
                (e_total, h_total)
            }
        }
    }
}

fn reflect_plane_wave(
    ground: &Ground,
    medium: &Medium,
    omega: Real,
    k_hat: &Vec3,
    e: &CVec3,
) -> Option<(Vec3, CVec3)> {
    if k_hat.z >= 0.0 {
        return None;
    }
    let cos_i = -k_hat.z;
    let (rv, rh) = match ground {
        Ground::None => return None,
        Ground::Perfect => (Cplx::new(1.0, 0.0), Cplx::new(-1.0, 0.0)),
        Ground::Finite { material, .. } => {
            fresnel(relative_permittivity(material, omega, medium), cos_i)
        }
    };
    let across = vec3(0.0, 0.0, 1.0).cross(k_hat);
    let p_hat = if across.norm() > 1e-12 {
        across.normalize()
    } else {
        vec3(0.0, 1.0, 0.0)
    };
    let e_perp = to_complex(&p_hat) * e.dot(&to_complex(&p_hat));
    let e_par = e - e_perp;
    let scaled = e_par * rv - e_perp * rh;
    let e_r = CVec3::new(-scaled.x, -scaled.y, scaled.z);
    Some((mirror(k_hat), e_r))
}

/// Field of an infinitesimal current element of moment `moment` (A m).
pub(crate) fn dipole_field(
    position: &Vec3,
    direction: &Vec3,
    moment: Cplx,
    r: &Vec3,
    k: Real,
    omega: Real,
    permittivity: Real,
) -> (CVec3, CVec3) {
    let sep = r - position;
    let dist = sep.norm();
    if dist < 1e-12 {
        return (CVec3::zeros(), CVec3::zeros());
    }
    let n = sep / dist;
    let four_pi = 4.0 * core::f64::consts::PI;
    let phase = Cplx::new(0.0, -k * dist).exp();
    let jk = Cplx::new(0.0, k);

    // Charge moment p = I l / (j omega).
    let p = moment * Cplx::new(0.0, -1.0 / omega);
    let transverse = n.cross(direction).cross(&n);
    let quasi_static = n * (3.0 * n.dot(direction)) - direction;
    let radiation = to_complex(&transverse) * Cplx::new(k * k / dist, 0.0);
    let induction = to_complex(&quasi_static) * (1.0 / (dist * dist * dist) + jk / (dist * dist));
    let e = (radiation + induction) * (p * phase / (four_pi * permittivity));

    let h = to_complex(&direction.cross(&n)) * (moment * phase * (jk / dist + 1.0 / (dist * dist)) / four_pi);
    (e, h)
}

/// Excitation vector of the augmented system; network rows stay zero.
pub(crate) fn excitation_vector(scene: &Scene) -> DVector<Cplx> {
    let mut rhs = DVector::from_element(scene.system_size(), Cplx::new(0.0, 0.0));
    match scene.impressed {
        Impressed::None => {}
        Impressed::Voltage { segment, voltage } => rhs[segment] = voltage,
        Impressed::PlaneWave { .. } | Impressed::Dipole { .. } => {
            for (m, element) in scene.model.elements.iter().enumerate() {
                let (e, _) = scene.impressed.field_at(scene, &element.center());
                rhs[m] = e.dot(&to_complex(&element.vector()));
            }
        }
    }
    rhs
}

#[cfg(test)]
mod tests {
    use super::*;
    use nec_core::constants::{C0, EPS0, ETA0};

    #[test]
    fn dipole_far_field_is_transverse_with_free_space_impedance() {
        let k = 2.0 * core::f64::consts::PI;
        let omega = k * C0;
        let r = vec3(300.0, 0.0, 0.0);
        let (e, h) = dipole_field(
            &Vec3::zeros(),
            &vec3(0.0, 0.0, 1.0),
            Cplx::new(1.0, 0.0),
            &r,
            k,
            omega,
            EPS0,
        );
        assert!(e.x.norm() < 1e-3 * e.z.norm());
        let ratio = e.z.norm() / h.y.norm();
        assert!((ratio - ETA0).abs() < 1e-2 * ETA0);
        // |E| = eta k I l / (4 pi r)
        let expected = ETA0 * k / (4.0 * core::f64::consts::PI * 300.0);
        assert!((e.z.norm() - expected).abs() < 1e-3 * expected);
    }

    #[test]
    fn perfect_ground_cancels_tangential_plane_wave() {
        let omega = 2.0 * core::f64::consts::PI * 1e7;
        let (r, t, _) = spherical_basis(30.0, 40.0);
        let k_hat = -r;
        let e = to_complex(&t);
        let (k_r, e_r) =
            reflect_plane_wave(&Ground::Perfect, &Medium::free_space(), omega, &k_hat, &e).unwrap();
        assert_eq!(k_r, mirror(&k_hat));
        let sum = e + e_r;
        assert!(sum.x.norm() < 1e-12 && sum.y.norm() < 1e-12);
        assert!((sum.z - e.z * 2.0).norm() < 1e-12);
    }

    #[test]
    fn no_reflection_without_ground() {
        let k_hat = vec3(0.0, 0.0, -1.0);
        let e = to_complex(&vec3(1.0, 0.0, 0.0));
        assert!(reflect_plane_wave(&Ground::None, &Medium::free_space(), 1e8, &k_hat, &e).is_none());
    }
}

//! Radiated and near fields of a current distribution.

use nec_core::{CVec3, Cplx, Real, Vec3, spherical_basis, to_complex, vec3};

use crate::reflection::{PatternMode, far_reflection, mirror};
use crate::sources::Impressed;
use crate::system::{CurrentDistribution, FarField, FarFieldPoint, NearField, Scene};

/// Radiation vector of a uniform current filament of `moment = I L`,
/// including the phase of its center.
fn radiation_term(
    moment: Cplx,
    length: Real,
    dir: &Vec3,
    center: &Vec3,
    k: Real,
    r_hat: &Vec3,
) -> CVec3 {
    let x = 0.5 * k * r_hat.dot(dir) * length;
    let sinc = if x.abs() < 1e-9 { 1.0 } else { x.sin() / x };
    let phase = Cplx::new(0.0, k * r_hat.dot(center)).exp();
    to_complex(dir) * (moment * phase * sinc)
}

/// `r E` towards `point` for the space-wave based modes.
fn space_wave(scene: &Scene, dist: &CurrentDistribution, point: &FarFieldPoint) -> FarField {
    let (r_hat, t_hat, p_hat) = spherical_basis(point.theta_deg, point.phi_deg);
    if scene.image.is_some() && r_hat.z < 0.0 {
        return FarField::ZERO;
    }
    let k = scene.k;
    let t_c = to_complex(&t_hat);
    let p_c = to_complex(&p_hat);
    let mut e_theta = Cplx::new(0.0, 0.0);
    let mut e_phi = Cplx::new(0.0, 0.0);

    let mut add = |moment: Cplx, length: Real, dir: Vec3, center: Vec3| {
        let direct = radiation_term(moment, length, &dir, &center, k, &r_hat);
        e_theta += direct.dot(&t_c);
        e_phi += direct.dot(&p_c);
        if scene.image.is_none() {
            return;
        }
        let Some(refl) = far_reflection(
            &scene.ground,
            point.mode,
            scene.omega,
            k,
            &scene.medium,
            &center,
            &r_hat,
        ) else {
            return;
        };
        // Perfect-ground image, then scaled per polarization.
        let image_center = vec3(center.x, center.y, 2.0 * refl.plane_z - center.z);
        let image_dir = -mirror(&dir);
        let image = radiation_term(moment, length, &image_dir, &image_center, k, &r_hat);
        e_theta += image.dot(&t_c) * refl.rv;
        e_phi -= image.dot(&p_c) * refl.rh;
    };

    for (element, current) in scene.model.elements.iter().zip(&dist.currents) {
        let length = element.length();
        add(*current * length, length, element.direction(), element.center());
    }
    if let Impressed::Dipole {
        position,
        direction,
        moment,
    } = scene.impressed
    {
        add(moment, 0.0, direction, position);
    }

    let scale = Cplx::new(
        0.0,
        -scene.omega * scene.medium.permeability / (4.0 * core::f64::consts::PI),
    );
    FarField {
        e_theta: e_theta * scale,
        e_phi: e_phi * scale,
    }
}

/// Field at the cylindrical point (distance, phi, height) scaled by its
/// distance from the origin, with the propagation phase removed.
fn surface_wave(scene: &Scene, dist: &CurrentDistribution, point: &FarFieldPoint) -> FarField {
    let (sp, cp) = point.phi_deg.to_radians().sin_cos();
    let height = point.theta_deg;
    let position = vec3(point.distance * cp, point.distance * sp, height);
    let range = position.norm();
    if range == 0.0 {
        return FarField::ZERO;
    }
    let theta_deg = (height / range).clamp(-1.0, 1.0).acos().to_degrees();
    let (_, t_hat, p_hat) = spherical_basis(theta_deg, point.phi_deg);
    let field = near_field(scene, dist, &position);
    let scale = Cplx::new(0.0, scene.k * range).exp() * range;
    FarField {
        e_theta: field.e.dot(&to_complex(&t_hat)) * scale,
        e_phi: field.e.dot(&to_complex(&p_hat)) * scale,
    }
}

pub(crate) fn far_field(scene: &Scene, dist: &CurrentDistribution, point: &FarFieldPoint) -> FarField {
    match point.mode {
        PatternMode::SurfaceWave => surface_wave(scene, dist, point),
        _ => space_wave(scene, dist, point),
    }
}

/// Total E and H at `r`: scattered field of all currents and charges, their
/// ground images, and the impressed field.
pub(crate) fn near_field(scene: &Scene, dist: &CurrentDistribution, r: &Vec3) -> NearField {
    let green = &scene.green;
    let jwmu = Cplx::new(0.0, scene.omega * scene.medium.permeability);
    let inv_eps = 1.0 / scene.medium.permittivity;
    let mut e = CVec3::zeros();
    let mut h = CVec3::zeros();

    let mut add_current = |current: Cplx, start: &Vec3, end: &Vec3, radius: Real| {
        let dir = (end - start).normalize();
        let u = to_complex(&dir);
        let psi = green.psi(start, end, radius, r);
        let grad = green.gradient(start, end, radius, r);
        e -= u * (jwmu * current * psi);
        h += grad.cross(&u) * current;
    };
    for (element, current) in scene.model.elements.iter().zip(&dist.currents) {
        add_current(*current, &element.start, &element.end, element.radius);
        if let Some(gamma) = scene.image {
            add_current(
                -gamma * current,
                &mirror(&element.start),
                &mirror(&element.end),
                element.radius,
            );
        }
    }

    for cell in &scene.model.half_cells {
        let q = dist.cell_charge(&cell.charge);
        let grad = green.gradient(&cell.start, &cell.end, cell.radius, r);
        e -= grad * (q * inv_eps);
        if let Some(gamma) = scene.image {
            let grad = green.gradient(&mirror(&cell.start), &mirror(&cell.end), cell.radius, r);
            e += grad * (gamma * q * inv_eps);
        }
    }

    let (e_imp, h_imp) = scene.impressed.field_at(scene, r);
    NearField {
        position: *r,
        e: e + e_imp,
        h: h + h_imp,
    }
}

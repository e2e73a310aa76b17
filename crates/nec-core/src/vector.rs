//! 3D vector helpers for wire geometry and field evaluation.

use crate::numeric::{Cplx, Real};
use nalgebra::{Matrix3, Vector3};

/// Real 3D vector (meters, unit directions).
pub type Vec3 = Vector3<Real>;

/// Complex 3D vector (field phasors).
pub type CVec3 = Vector3<Cplx>;

/// Rotation matrix type used by geometry transforms.
pub type Rot3 = Matrix3<Real>;

#[inline]
pub fn vec3(x: Real, y: Real, z: Real) -> Vec3 {
    Vec3::new(x, y, z)
}

#[inline]
pub fn to_complex(v: &Vec3) -> CVec3 {
    v.map(|c| Cplx::new(c, 0.0))
}

/// Rotation about X, then Y, then Z (angles in degrees).
pub fn rotation_xyz(rx_deg: Real, ry_deg: Real, rz_deg: Real) -> Rot3 {
    let (sx, cx) = rx_deg.to_radians().sin_cos();
    let (sy, cy) = ry_deg.to_radians().sin_cos();
    let (sz, cz) = rz_deg.to_radians().sin_cos();
    let rx = Rot3::new(1.0, 0.0, 0.0, 0.0, cx, -sx, 0.0, sx, cx);
    let ry = Rot3::new(cy, 0.0, sy, 0.0, 1.0, 0.0, -sy, 0.0, cy);
    let rz = Rot3::new(cz, -sz, 0.0, sz, cz, 0.0, 0.0, 0.0, 1.0);
    rz * ry * rx
}

/// Spherical unit vectors `(r, theta, phi)` for a direction given in degrees.
///
/// Theta is measured from the +Z axis, phi from +X towards +Y.
pub fn spherical_basis(theta_deg: Real, phi_deg: Real) -> (Vec3, Vec3, Vec3) {
    let (st, ct) = theta_deg.to_radians().sin_cos();
    let (sp, cp) = phi_deg.to_radians().sin_cos();
    let r = vec3(st * cp, st * sp, ct);
    let t = vec3(ct * cp, ct * sp, -st);
    let p = vec3(-sp, cp, 0.0);
    (r, t, p)
}

/// Mirror image of a point in the plane z = `plane_z`.
#[inline]
pub fn mirror_z(p: &Vec3, plane_z: Real) -> Vec3 {
    vec3(p.x, p.y, 2.0 * plane_z - p.z)
}

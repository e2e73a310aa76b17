//! Ground reflection: image coefficients for the interaction matrix and
//! Fresnel coefficients for far fields and incident plane waves.

use nec_core::constants::EPS0;
use nec_core::{Cplx, Real, Vec3, vec3};
use nec_environment::{Ground, GroundMaterial, Medium};

/// Radiation pattern evaluation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternMode {
    /// Direct plus ground-reflected space wave.
    #[default]
    SpaceWave,
    /// Field at a cylindrical point near the ground; the grid angle in the
    /// theta slot is the height in meters.
    SurfaceWave,
    /// Space wave with a second medium beyond a straight cliff.
    LinearCliff,
    /// Space wave with a second medium beyond a circular cliff.
    CircularCliff,
    /// Space wave with a radial wire ground screen.
    RadialScreen,
    RadialScreenLinearCliff,
    RadialScreenCircularCliff,
}

impl PatternMode {
    /// Every mode except the plain space wave needs a lossy ground.
    pub fn needs_finite_ground(self) -> bool {
        self != PatternMode::SpaceWave
    }

    pub fn uses_screen(self) -> bool {
        matches!(
            self,
            PatternMode::RadialScreen
                | PatternMode::RadialScreenLinearCliff
                | PatternMode::RadialScreenCircularCliff
        )
    }

    pub fn uses_cliff(self) -> bool {
        matches!(
            self,
            PatternMode::LinearCliff
                | PatternMode::CircularCliff
                | PatternMode::RadialScreenLinearCliff
                | PatternMode::RadialScreenCircularCliff
        )
    }
}

/// Mirror a direction or current vector in a horizontal plane.
#[inline]
pub fn mirror(v: &Vec3) -> Vec3 {
    vec3(v.x, v.y, -v.z)
}

/// Complex permittivity of `material` relative to the surrounding medium.
pub fn relative_permittivity(material: &GroundMaterial, omega: Real, medium: &Medium) -> Cplx {
    material.complex_permittivity(omega) * (EPS0 / medium.permittivity)
}

/// Scale factor `Gamma` applied to the mirrored source; image currents and
/// charges carry `-Gamma` times the source values.
pub fn image_coefficient(ground: &Ground, omega: Real, medium: &Medium) -> Option<Cplx> {
    match ground {
        Ground::None => None,
        Ground::Perfect => Some(Cplx::new(1.0, 0.0)),
        Ground::Finite { material, .. } => {
            let eps = relative_permittivity(material, omega, medium);
            Some((eps - 1.0) / (eps + 1.0))
        }
    }
}

/// Fresnel coefficients `(R_v, R_h)` for a ground of normalized surface
/// impedance `zeta` (`1/sqrt(eps)` for a plain ground).
pub fn fresnel_from_impedance(zeta: Cplx, cos_theta: Real) -> (Cplx, Cplx) {
    let sin2 = (1.0 - cos_theta * cos_theta).max(0.0);
    let root = (Cplx::new(1.0, 0.0) - zeta * zeta * sin2).sqrt();
    let rv = (cos_theta - zeta * root) / (cos_theta + zeta * root);
    let rh = (zeta * cos_theta - root) / (zeta * cos_theta + root);
    (rv, rh)
}

/// Fresnel coefficients `(R_v, R_h)` for relative permittivity `eps`.
pub fn fresnel(eps: Cplx, cos_theta: Real) -> (Cplx, Cplx) {
    fresnel_from_impedance(eps.sqrt().inv(), cos_theta)
}

/// Reflection seen by one radiating element in one far-field direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflection {
    pub rv: Cplx,
    pub rh: Cplx,
    /// Height of the reflecting plane.
    pub plane_z: Real,
}

impl Reflection {
    pub const PERFECT: Reflection = Reflection {
        rv: Cplx::new(1.0, 0.0),
        rh: Cplx::new(-1.0, 0.0),
        plane_z: 0.0,
    };
}

/// Far-field reflection for an element at `center` radiating towards the
/// upper-hemisphere unit direction `r_hat`.
pub fn far_reflection(
    ground: &Ground,
    mode: PatternMode,
    omega: Real,
    k: Real,
    medium: &Medium,
    center: &Vec3,
    r_hat: &Vec3,
) -> Option<Reflection> {
    let (material, screen, second) = match ground {
        Ground::None => return None,
        Ground::Perfect => return Some(Reflection::PERFECT),
        Ground::Finite {
            material,
            screen,
            second,
            ..
        } => (material, screen, second),
    };
    let cos_theta = r_hat.z.max(0.0);
    let specular = |plane_z: Real| -> (Real, Real) {
        let height = (center.z - plane_z).max(0.0);
        if cos_theta <= 0.0 {
            return (Real::INFINITY, Real::INFINITY);
        }
        let scale = height / cos_theta;
        (center.x + r_hat.x * scale, center.y + r_hat.y * scale)
    };

    let (mut x, mut y) = specular(0.0);
    let mut plane_z = 0.0;
    let mut eps = relative_permittivity(material, omega, medium);
    if mode.uses_cliff() {
        if let Some(second) = second {
            if second.cliff.is_beyond(x, y) {
                plane_z = -second.cliff.height();
                eps = relative_permittivity(&second.material, omega, medium);
                (x, y) = specular(plane_z);
            }
        }
    }

    let mut zeta = eps.sqrt().inv();
    if mode.uses_screen() {
        if let Some(screen) = screen {
            let rho = x.hypot(y);
            if rho < screen.screen_radius && plane_z == 0.0 {
                let zs = screen.relative_surface_impedance(k, rho);
                zeta = if zs == Cplx::new(0.0, 0.0) {
                    zs
                } else {
                    zeta * zs / (zeta + zs)
                };
            }
        }
    }
    let (rv, rh) = fresnel_from_impedance(zeta, cos_theta);
    Some(Reflection { rv, rh, plane_z })
}

//! Line integrals of the free-space Green's function over straight cells.
//!
//! `psi` integrates `exp(-jkR) / (4 pi R)` along a cell using the reduced
//! kernel `R = sqrt(d^2 + a^2)`; the `1/R` part is integrated in closed form
//! for nearby observers and the smooth remainder by Gauss-Legendre
//! quadrature.

use nec_core::{CVec3, Cplx, Real, Vec3};

use crate::config::MomConfig;
use crate::quadrature::GaussLegendre;

const FOUR_PI: Real = 4.0 * core::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Near,
    Far,
    Point,
}

/// Green's function integrator at one wavenumber.
#[derive(Debug, Clone)]
pub struct Green {
    k: Real,
    near: GaussLegendre,
    far: GaussLegendre,
    near_distance: Real,
    range: Option<Real>,
}

impl Green {
    /// `range` is the interaction range in meters; beyond it a single
    /// midpoint sample is used.
    pub fn new(k: Real, config: &MomConfig, range: Option<Real>) -> Self {
        Self {
            k,
            near: GaussLegendre::new(config.near_quadrature),
            far: GaussLegendre::new(config.far_quadrature),
            near_distance: config.near_distance,
            range,
        }
    }

    pub fn wavenumber(&self) -> Real {
        self.k
    }

    fn zone(&self, distance: Real, length: Real) -> Zone {
        match self.range {
            Some(range) if distance > range => Zone::Point,
            _ if distance < self.near_distance * length => Zone::Near,
            _ => Zone::Far,
        }
    }

    /// Integral of the scalar Green's function over `start..end` seen
    /// from `r`.
    pub fn psi(&self, start: &Vec3, end: &Vec3, radius: Real, r: &Vec3) -> Cplx {
        let d = end - start;
        let length = d.norm();
        if length == 0.0 {
            return Cplx::new(0.0, 0.0);
        }
        let u = d / length;
        let w = r - start;
        let t0 = w.dot(&u);
        let rho2 = (w.norm_squared() - t0 * t0).max(0.0) + radius * radius;
        let mid_distance = (r - (start + d * 0.5)).norm();
        let jk = Cplx::new(0.0, -self.k);

        match self.zone(mid_distance, length) {
            Zone::Point => {
                let big_r = (mid_distance * mid_distance + radius * radius).sqrt();
                (jk * big_r).exp() * (length / (FOUR_PI * big_r))
            }
            Zone::Far => {
                let sum: Cplx = self
                    .far
                    .iter()
                    .map(|(x, wt)| {
                        let dt = x * length - t0;
                        let big_r = (dt * dt + rho2).sqrt();
                        (jk * big_r).exp() * (wt / big_r)
                    })
                    .sum();
                sum * (length / FOUR_PI)
            }
            Zone::Near => {
                let rho = rho2.sqrt();
                let singular = ((length - t0) / rho).asinh() - (-t0 / rho).asinh();
                let smooth: Cplx = self
                    .near
                    .iter()
                    .map(|(x, wt)| {
                        let dt = x * length - t0;
                        let big_r = (dt * dt + rho2).sqrt();
                        ((jk * big_r).exp() - 1.0) * (wt / big_r)
                    })
                    .sum();
                (smooth * length + singular) / FOUR_PI
            }
        }
    }

    /// Like [`Green::psi`], but for observers on the surface of a wire of
    /// `observer_radius` lying along the source axis the static part uses
    /// the exact cylindrical kernel averaged around the circumference.
    pub fn psi_extended(
        &self,
        start: &Vec3,
        end: &Vec3,
        radius: Real,
        r: &Vec3,
        observer_radius: Real,
    ) -> Cplx {
        let d = end - start;
        let length = d.norm();
        if length == 0.0 {
            return Cplx::new(0.0, 0.0);
        }
        let u = d / length;
        let w = r - start;
        let t0 = w.dot(&u);
        let perp2 = (w.norm_squared() - t0 * t0).max(0.0);
        let mid_distance = (r - (start + d * 0.5)).norm();
        if perp2.sqrt() >= radius || self.zone(mid_distance, length) != Zone::Near {
            return self.psi(start, end, radius, r);
        }

        let rho0 = (perp2 + observer_radius * observer_radius).sqrt();
        let exact_static: Real = self
            .near
            .iter()
            .map(|(x, wt)| {
                let phi = core::f64::consts::PI * x;
                let b = (rho0 * rho0 + radius * radius - 2.0 * rho0 * radius * phi.cos())
                    .max(Real::MIN_POSITIVE)
                    .sqrt();
                wt * (((length - t0) / b).asinh() + (t0 / b).asinh())
            })
            .sum();
        let rho = (perp2 + radius * radius).sqrt();
        let reduced_static = ((length - t0) / rho).asinh() + (t0 / rho).asinh();
        self.psi(start, end, radius, r) + (exact_static - reduced_static) / FOUR_PI
    }

    /// Integral of the gradient (with respect to `r`) of the Green's
    /// function over `start..end`.
    pub fn gradient(&self, start: &Vec3, end: &Vec3, radius: Real, r: &Vec3) -> CVec3 {
        let d = end - start;
        let length = d.norm();
        let zero = Cplx::new(0.0, 0.0);
        if length == 0.0 {
            return CVec3::new(zero, zero, zero);
        }
        let mid_distance = (r - (start + d * 0.5)).norm();
        let rule = match self.zone(mid_distance, length) {
            Zone::Near => &self.near,
            Zone::Far | Zone::Point => &self.far,
        };
        let jk = Cplx::new(0.0, self.k);
        let a2 = radius * radius;
        let mut acc = CVec3::new(zero, zero, zero);
        for (x, wt) in rule.iter() {
            let sep = r - (start + d * x);
            let big_r = (sep.norm_squared() + a2).sqrt();
            let w = (Cplx::new(1.0, 0.0) + jk * big_r) * (-jk * big_r).exp()
                / (FOUR_PI * big_r * big_r * big_r);
            let scale = -w * (wt * length);
            acc += CVec3::new(scale * sep.x, scale * sep.y, scale * sep.z);
        }
        acc
    }
}

//! Interaction matrix fill.
//!
//! Row `m` tests the boundary condition on element `m`: the vector
//! potential at its center projected on the element, plus the scalar
//! potential difference between its ends. Network ports extend the system
//! with one voltage unknown per port segment:
//!
//! ```text
//! [ Z   -P ] [ I ]   [ V ]
//! [ P^T  Y ] [ U ] = [ 0 ]
//! ```

use nalgebra::DMatrix;
use nec_core::{Cplx, Real, Vec3};
use nec_environment::WireKernel;
use rayon::prelude::*;

use crate::model::Element;
use crate::reflection::mirror;
use crate::system::Scene;

/// Potential integral over a source cell, honoring the kernel choice.
fn potential(scene: &Scene, start: &Vec3, end: &Vec3, radius: Real, r: &Vec3, observer_radius: Real) -> Cplx {
    match scene.kernel {
        WireKernel::Thin => scene.green.psi(start, end, radius, r),
        WireKernel::Extended => scene.green.psi_extended(start, end, radius, r, observer_radius),
    }
}

fn fill_row(scene: &Scene, observer: &Element) -> Vec<Cplx> {
    let n = scene.unknown_count();
    let mut row = vec![Cplx::new(0.0, 0.0); n];
    let center = observer.center();
    let dl = observer.vector();
    let a_obs = observer.radius;
    let jwmu = Cplx::new(0.0, scene.omega * scene.medium.permeability);
    // (j / omega) / eps
    let charge_scale = Cplx::new(0.0, 1.0 / (scene.omega * scene.medium.permittivity));

    for (col, source) in scene.model.elements.iter().enumerate() {
        let u = source.direction();
        let mut z = jwmu
            * u.dot(&dl)
            * potential(scene, &source.start, &source.end, source.radius, &center, a_obs);
        if let Some(gamma) = scene.image {
            let psi = potential(
                scene,
                &mirror(&source.start),
                &mirror(&source.end),
                source.radius,
                &center,
                a_obs,
            );
            z -= jwmu * gamma * mirror(&u).dot(&dl) * psi;
        }
        row[col] += z;
    }

    for cell in &scene.model.half_cells {
        if cell.charge.is_empty() {
            continue;
        }
        let at = |p: &Vec3| potential(scene, &cell.start, &cell.end, cell.radius, p, a_obs);
        let mut delta = at(&observer.end) - at(&observer.start);
        if let Some(gamma) = scene.image {
            let (s, e) = (mirror(&cell.start), mirror(&cell.end));
            let image_at = |p: &Vec3| potential(scene, &s, &e, cell.radius, p, a_obs);
            delta -= gamma * (image_at(&observer.end) - image_at(&observer.start));
        }
        let delta = delta * charge_scale;
        for &(col, c) in &cell.charge {
            row[col] += delta * c;
        }
    }
    row
}

/// Dense augmented system matrix with loads and networks stamped in.
pub(crate) fn interaction_matrix(scene: &Scene) -> DMatrix<Cplx> {
    let n = scene.unknown_count();
    let size = scene.system_size();
    let rows: Vec<Vec<Cplx>> = scene
        .model
        .elements
        .par_iter()
        .map(|observer| fill_row(scene, observer))
        .collect();

    let mut matrix = DMatrix::from_element(size, size, Cplx::new(0.0, 0.0));
    for (m, row) in rows.into_iter().enumerate() {
        for (col, value) in row.into_iter().enumerate() {
            matrix[(m, col)] = value;
        }
    }
    for (m, z) in scene.loads.iter().enumerate() {
        matrix[(m, m)] += z;
    }
    for (p, &segment) in scene.ports.iter().enumerate() {
        matrix[(segment, n + p)] = Cplx::new(-1.0, 0.0);
        matrix[(n + p, segment)] = Cplx::new(1.0, 0.0);
        for (q, _) in scene.ports.iter().enumerate() {
            matrix[(n + p, n + q)] = scene.port_admittance[(p, q)];
        }
    }
    matrix
}

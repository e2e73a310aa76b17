//! Numerical solver for wire and surface antenna structures.
//!
//! The [`NumericalSolver`] trait is the narrow boundary between the
//! simulation context and the linear algebra: assemble and factor the
//! interaction matrix for one frequency, back-substitute for currents, and
//! evaluate far fields, near fields and input impedance from the result.
//! [`MomSolver`] is the default implementation: a thin-wire
//! method-of-moments formulation with pulse current expansion, point
//! matching at element centers, image treatment of ground planes, lumped
//! loads and network ports.

mod assemble;
pub mod config;
pub mod error;
mod field;
pub mod green;
pub mod model;
pub mod mom;
pub mod quadrature;
pub mod reflection;
mod sources;
pub mod system;

use nec_core::{Cplx, Frequency, Vec3};
use nec_environment::{Environment, Excitation};
use nec_geometry::Geometry;
use rayon::prelude::*;

pub use config::MomConfig;
pub use error::{SolverError, SolverResult};
pub use mom::{MomSolver, resolve_range};
pub use reflection::PatternMode;
pub use system::{CurrentDistribution, FactoredSystem, FarField, FarFieldPoint, NearField};

/// Everything one assembly needs.
#[derive(Debug, Clone, Copy)]
pub struct SolveInput<'a> {
    pub geometry: &'a Geometry,
    pub environment: &'a Environment,
    /// `None` solves with a zero excitation vector.
    pub excitation: Option<&'a Excitation>,
    pub frequency: Frequency,
}

/// External numerical solver contract.
///
/// Implementations must be shareable across the pattern worker threads.
pub trait NumericalSolver: Send + Sync {
    /// Fill and LU-factor the interaction matrix; a singular or
    /// ill-conditioned matrix is an error.
    fn assemble_and_factor(&self, input: &SolveInput<'_>) -> SolverResult<FactoredSystem>;

    /// Back-substitute the excitation vector.
    fn compute_currents(&self, system: &FactoredSystem) -> SolverResult<CurrentDistribution>;

    fn evaluate_far_field(
        &self,
        currents: &CurrentDistribution,
        point: &FarFieldPoint,
    ) -> SolverResult<FarField>;

    /// Input impedance at the voltage source.
    fn evaluate_impedance(&self, currents: &CurrentDistribution) -> SolverResult<Cplx>;

    fn evaluate_near_field(&self, currents: &CurrentDistribution, point: &Vec3)
    -> SolverResult<NearField>;

    /// Short-circuit admittance matrix between two segments (absolute
    /// indices), from unit-voltage solves of the factored system.
    fn two_port_admittance(
        &self,
        system: &FactoredSystem,
        first: usize,
        second: usize,
    ) -> SolverResult<[[Cplx; 2]; 2]>;

    /// Far field at many points, evaluated in parallel; results keep the
    /// order of `points`.
    fn evaluate_pattern(
        &self,
        currents: &CurrentDistribution,
        points: &[FarFieldPoint],
    ) -> SolverResult<Vec<FarField>> {
        points
            .par_iter()
            .map(|p| self.evaluate_far_field(currents, p))
            .collect()
    }
}

//! Shared fixtures for context integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use nec_context::{AngleGrid, Context, PatternMode, PatternSettings, RadiationPattern};
use nec_core::{Cplx, Vec3, vec3};
use nec_environment::{Excitation, FrequencySweep, Ground, SegmentRef, SweepKind};
use nec_geometry::{GroundPlaneMode, WireSpec};
use nec_solver::{
    CurrentDistribution, FactoredSystem, FarField, FarFieldPoint, MomSolver, NearField,
    NumericalSolver, SolveInput, SolverResult,
};

/// Default solver that counts how often each phase runs.
#[derive(Debug, Default)]
pub struct CountingSolver {
    inner: MomSolver,
    pub factorizations: AtomicUsize,
    pub back_substitutions: AtomicUsize,
}

impl CountingSolver {
    pub fn factorizations(&self) -> usize {
        self.factorizations.load(Ordering::SeqCst)
    }

    pub fn back_substitutions(&self) -> usize {
        self.back_substitutions.load(Ordering::SeqCst)
    }
}

impl NumericalSolver for CountingSolver {
    fn assemble_and_factor(&self, input: &SolveInput<'_>) -> SolverResult<FactoredSystem> {
        self.factorizations.fetch_add(1, Ordering::SeqCst);
        self.inner.assemble_and_factor(input)
    }

    fn compute_currents(&self, system: &FactoredSystem) -> SolverResult<CurrentDistribution> {
        self.back_substitutions.fetch_add(1, Ordering::SeqCst);
        self.inner.compute_currents(system)
    }

    fn evaluate_far_field(
        &self,
        currents: &CurrentDistribution,
        point: &FarFieldPoint,
    ) -> SolverResult<FarField> {
        self.inner.evaluate_far_field(currents, point)
    }

    fn evaluate_impedance(&self, currents: &CurrentDistribution) -> SolverResult<Cplx> {
        self.inner.evaluate_impedance(currents)
    }

    fn evaluate_near_field(
        &self,
        currents: &CurrentDistribution,
        point: &Vec3,
    ) -> SolverResult<NearField> {
        self.inner.evaluate_near_field(currents, point)
    }

    fn two_port_admittance(
        &self,
        system: &FactoredSystem,
        first: usize,
        second: usize,
    ) -> SolverResult<[[Cplx; 2]; 2]> {
        self.inner.two_port_admittance(system, first, second)
    }
}

pub fn center_feed() -> Excitation {
    Excitation::AppliedVoltage {
        segment: SegmentRef::new(1, 5),
        voltage: Cplx::new(1.0, 0.0),
    }
}

pub fn elevation_cut() -> RadiationPattern {
    RadiationPattern::new(
        PatternMode::SpaceWave,
        AngleGrid::theta_cut(90, 0.0, 1.0, 0.0),
        PatternSettings::default(),
    )
}

/// Sealed 9-segment vertical dipole from z = 2 m to z = 7 m, radius 0.1 m,
/// over a perfect ground at 30 MHz, center-fed with 1 V. No output request.
pub fn dipole_over_ground<S: NumericalSolver>(solver: S) -> Context<S> {
    let mut ctx = Context::with_solver(solver);
    ctx.wire(WireSpec::new(1, 9, vec3(0.0, 0.0, 2.0), vec3(0.0, 0.0, 7.0), 0.1))
        .unwrap();
    ctx.geometry_complete(GroundPlaneMode::CurrentExpansionModified)
        .unwrap();
    ctx.ground(Ground::Perfect).unwrap();
    ctx.frequency(FrequencySweep::single(30.0).unwrap()).unwrap();
    ctx.excitation(center_feed()).unwrap();
    ctx
}

/// The same dipole as [`dipole_over_ground`], built untagged (tag 0) and fed
/// at absolute segment 5.
pub fn reference_dipole<S: NumericalSolver>(solver: S) -> Context<S> {
    let mut ctx = Context::with_solver(solver);
    ctx.wire(WireSpec::new(0, 9, vec3(0.0, 0.0, 2.0), vec3(0.0, 0.0, 7.0), 0.1))
        .unwrap();
    ctx.geometry_complete(GroundPlaneMode::CurrentExpansionModified)
        .unwrap();
    ctx.ground(Ground::Perfect).unwrap();
    ctx.frequency(FrequencySweep::single(30.0).unwrap()).unwrap();
    ctx.excitation(Excitation::AppliedVoltage {
        segment: SegmentRef::new(0, 5),
        voltage: Cplx::new(1.0, 0.0),
    })
    .unwrap();
    ctx
}

/// Sealed dipole over perfect ground with a three-step sweep (28, 30 and
/// 32 MHz) and no output request.
pub fn dipole_sweep<S: NumericalSolver>(solver: S) -> Context<S> {
    let mut ctx = dipole_over_ground(solver);
    ctx.frequency(FrequencySweep::new(SweepKind::Linear, 3, 28.0, 2.0).unwrap())
        .unwrap();
    ctx
}

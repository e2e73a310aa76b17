//! Context lifecycle, geometry and environment directives, and the solve engine.

use std::ops::Range;

use nec_core::timing::Timer;
use nec_core::{PatchId, Real, RequestId, Vec3, in_mhz};
use nec_environment::{
    Environment, Excitation, FrequencySweep, Ground, InteractionRange, Load, Medium, Network,
    RadialScreen, SecondMedium, SegmentRef, TransmissionLine, TwoPort, WireKernel,
};
use nec_geometry::{
    Geometry, GeometryBuilder, GroundPlaneMode, PatchKind, PatchShape, ReflectAxes, Tag,
    Transform, WireSpec,
};
use nec_results::{ResultKey, ResultStore, StepSummary};
use nec_solver::{MomSolver, NumericalSolver, SolveInput, SolverError, resolve_range};

use crate::cache::{CachedSolve, SolveCache, SolveState};
use crate::error::{NecError, NecResult};
use crate::request::RecordedRequest;

#[derive(Debug)]
enum Phase {
    Building(GeometryBuilder),
    Sealed(Geometry),
    Deleted,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Building(_) => "building geometry",
            Phase::Sealed(_) => "sealed",
            Phase::Deleted => "deleted",
        }
    }
}

/// Stateful antenna simulation.
///
/// Geometry directives are accepted until [`Context::geometry_complete`];
/// environment, excitation and output directives only afterwards. Solutions
/// are computed lazily per frequency step and reused until the next
/// configuration change. A context is meant to be driven from one thread at
/// a time; mutation and solving take `&mut self`.
#[derive(Debug)]
pub struct Context<S: NumericalSolver = MomSolver> {
    pub(crate) solver: S,
    phase: Phase,
    pub(crate) environment: Environment,
    pub(crate) excitation: Option<Excitation>,
    pub(crate) requests: Vec<RecordedRequest>,
    pub(crate) current_step: usize,
    pub(crate) cache: SolveCache,
    pub(crate) results: ResultStore,
}

impl Context<MomSolver> {
    pub fn new() -> Self {
        Self::with_solver(MomSolver::default())
    }
}

impl Default for Context<MomSolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: NumericalSolver> Context<S> {
    pub fn with_solver(solver: S) -> Self {
        Self {
            solver,
            phase: Phase::Building(GeometryBuilder::new()),
            environment: Environment::default(),
            excitation: None,
            requests: Vec::new(),
            current_step: 0,
            cache: SolveCache::default(),
            results: ResultStore::new(),
        }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn is_sealed(&self) -> bool {
        matches!(self.phase, Phase::Sealed(_))
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.phase, Phase::Deleted)
    }

    /// Release everything the context owns. Every later call fails with a
    /// sequence error.
    pub fn delete(&mut self) -> NecResult<()> {
        self.ensure_alive("delete")?;
        self.phase = Phase::Deleted;
        self.environment = Environment::default();
        self.excitation = None;
        self.requests.clear();
        self.cache.clear();
        self.results.clear();
        tracing::debug!("context deleted");
        Ok(())
    }

    pub(crate) fn ensure_alive(&self, operation: &'static str) -> NecResult<()> {
        match self.phase {
            Phase::Deleted => Err(self.sequence(operation)),
            _ => Ok(()),
        }
    }

    fn sequence(&self, operation: &'static str) -> NecError {
        NecError::Sequence {
            operation,
            phase: self.phase.name(),
        }
    }

    fn builder_mut(&mut self, operation: &'static str) -> NecResult<&mut GeometryBuilder> {
        let phase = self.phase.name();
        match &mut self.phase {
            Phase::Building(builder) => Ok(builder),
            _ => Err(NecError::Sequence { operation, phase }),
        }
    }

    pub(crate) fn sealed(&self, operation: &'static str) -> NecResult<&Geometry> {
        match &self.phase {
            Phase::Sealed(geometry) => Ok(geometry),
            _ => Err(self.sequence(operation)),
        }
    }

    // Geometry directives

    /// Wire (GW). Returns the absolute indices of the new segments.
    pub fn wire(&mut self, spec: WireSpec) -> NecResult<Range<usize>> {
        Ok(self.builder_mut("wire")?.add_wire(spec)?)
    }

    /// Surface patch (SP). Non-arbitrary kinds wait for
    /// [`Context::patch_continuation`] and return `None`.
    pub fn surface_patch(
        &mut self,
        kind: PatchKind,
        c1: Vec3,
        c2: Vec3,
    ) -> NecResult<Option<PatchId>> {
        Ok(self.builder_mut("surface patch")?.surface_patch(kind, c1, c2)?)
    }

    /// Patch continuation (SC).
    pub fn patch_continuation(&mut self, c3: Vec3, c4: Option<Vec3>) -> NecResult<PatchId> {
        Ok(self
            .builder_mut("patch continuation")?
            .patch_continuation(c3, c4)?)
    }

    pub fn patch(&mut self, shape: PatchShape) -> NecResult<PatchId> {
        Ok(self.builder_mut("patch")?.add_patch(shape)?)
    }

    /// Coordinate transform (GM).
    pub fn transform(&mut self, transform: &Transform) -> NecResult<()> {
        Ok(self.builder_mut("transform")?.transform(transform)?)
    }

    /// Reflection (GX): Z, then Y, then X, doubling the tag increment per pass.
    pub fn reflect(&mut self, tag_increment: Tag, axes: ReflectAxes) -> NecResult<()> {
        Ok(self.builder_mut("reflect")?.reflect(tag_increment, axes)?)
    }

    /// Geometry end (GE): validate and freeze the structure.
    ///
    /// On failure the structure stays editable.
    pub fn geometry_complete(&mut self, ground_plane: GroundPlaneMode) -> NecResult<()> {
        let builder = self.builder_mut("geometry complete")?;
        let geometry = builder.clone().seal(ground_plane)?;
        tracing::info!(
            segments = geometry.segments().len(),
            patches = geometry.patches().len(),
            "geometry complete"
        );
        self.phase = Phase::Sealed(geometry);
        self.cache.invalidate();
        Ok(())
    }

    pub fn geometry(&self) -> NecResult<&Geometry> {
        self.sealed("geometry access")
    }

    /// Segments placed so far, sealed or not.
    pub fn segment_count(&self) -> NecResult<usize> {
        match &self.phase {
            Phase::Building(builder) => Ok(builder.segment_count()),
            Phase::Sealed(geometry) => Ok(geometry.segments().len()),
            Phase::Deleted => Err(self.sequence("segment count")),
        }
    }

    // Environment directives

    /// Apply a validated mutation and mark every step stale.
    fn configure(&mut self, change: impl FnOnce(&mut Environment)) {
        change(&mut self.environment);
        self.cache.invalidate();
    }

    fn find_segment(&self, operation: &'static str, segment: SegmentRef) -> NecResult<usize> {
        self.sealed(operation)?
            .find_segment(segment.tag, segment.ordinal)
            .ok_or_else(|| {
                NecError::invalid(format!(
                    "segment {} of tag {} does not exist",
                    segment.ordinal, segment.tag
                ))
            })
    }

    pub fn medium(&mut self, permittivity: Real, permeability: Real) -> NecResult<()> {
        self.sealed("medium")?;
        let medium = Medium::new(permittivity, permeability)?;
        self.configure(|env| env.medium = medium);
        Ok(())
    }

    /// Ground (GN). Replaces any previous ground, screen and second medium.
    pub fn ground(&mut self, ground: Ground) -> NecResult<()> {
        let geometry = self.sealed("ground")?;
        if ground.is_present() {
            let tol = 1e-9 * geometry.extent().max(1.0);
            if geometry
                .segments()
                .iter()
                .any(|s| s.start.z < -tol || s.end.z < -tol)
            {
                return Err(NecError::invalid("structure extends below the ground plane"));
            }
        }
        self.configure(|env| env.ground = ground);
        Ok(())
    }

    /// Remove any ground (GN -1).
    pub fn null_ground(&mut self) -> NecResult<()> {
        self.ground(Ground::None)
    }

    /// Radial wire screen of the ground-screen directive (GD).
    pub fn radial_screen(&mut self, screen: RadialScreen) -> NecResult<()> {
        self.sealed("radial screen")?;
        let mut ground = self.environment.ground.clone();
        ground.set_radial_screen(screen)?;
        self.configure(|env| env.ground = ground);
        Ok(())
    }

    /// Second ground medium beyond a cliff (GD).
    pub fn second_medium(&mut self, medium: SecondMedium) -> NecResult<()> {
        self.sealed("second ground medium")?;
        let mut ground = self.environment.ground.clone();
        ground.set_second_medium(medium)?;
        self.configure(|env| env.ground = ground);
        Ok(())
    }

    /// Frequency sweep (FR). Resets the current step to the first one.
    pub fn frequency(&mut self, sweep: FrequencySweep) -> NecResult<()> {
        self.sealed("frequency")?;
        self.configure(|env| env.sweep = sweep);
        self.current_step = 0;
        tracing::debug!(steps = sweep.len(), "frequency sweep set");
        Ok(())
    }

    /// Loading (LD).
    pub fn load(&mut self, load: Load) -> NecResult<()> {
        let geometry = self.sealed("load")?;
        load.kind.validate()?;
        resolve_range(geometry, &load.range).map_err(|e| NecError::invalid(e.to_string()))?;
        self.configure(|env| env.loads.push(load));
        Ok(())
    }

    pub fn clear_loads(&mut self) -> NecResult<()> {
        self.sealed("clear loads")?;
        self.configure(|env| env.loads.clear());
        Ok(())
    }

    /// Excitation (EX). Replaces the previous excitation, whatever its kind.
    pub fn excitation(&mut self, excitation: Excitation) -> NecResult<()> {
        self.sealed("excitation")?;
        excitation.validate()?;
        if let Some((segment, _)) = excitation.voltage_source() {
            self.find_segment("excitation", segment)?;
        }
        if let Some(previous) = self.excitation.replace(excitation)
            && previous.kind() != excitation.kind()
        {
            tracing::debug!(
                previous = ?previous.kind(),
                active = ?excitation.kind(),
                "excitation replaced"
            );
        }
        self.cache.invalidate();
        Ok(())
    }

    fn add_network(&mut self, operation: &'static str, network: Network) -> NecResult<()> {
        self.sealed(operation)?;
        network.validate()?;
        let (a, b) = network.ports();
        self.find_segment(operation, a)?;
        self.find_segment(operation, b)?;
        self.configure(|env| env.networks.push(network));
        Ok(())
    }

    /// Transmission line (TL).
    pub fn transmission_line(&mut self, line: TransmissionLine) -> NecResult<()> {
        self.add_network("transmission line", Network::Line(line))
    }

    /// Two-port network (NT).
    pub fn network(&mut self, network: TwoPort) -> NecResult<()> {
        self.add_network("network", Network::TwoPort(network))
    }

    pub fn clear_networks(&mut self) -> NecResult<()> {
        self.sealed("clear networks")?;
        self.configure(|env| env.networks.clear());
        Ok(())
    }

    /// Wire kernel (EK).
    pub fn kernel(&mut self, kernel: WireKernel) -> NecResult<()> {
        self.sealed("kernel")?;
        self.configure(|env| env.kernel = kernel);
        Ok(())
    }

    /// Interaction approximation range (KH).
    pub fn interaction_range(&mut self, range: InteractionRange) -> NecResult<()> {
        self.sealed("interaction range")?;
        self.configure(|env| env.interaction_range = range);
        Ok(())
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn active_excitation(&self) -> Option<&Excitation> {
        self.excitation.as_ref()
    }

    // Sweep position

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step_count(&self) -> usize {
        self.environment.sweep.len()
    }

    /// Move the sweep cursor; output requests are evaluated at this step.
    pub fn select_step(&mut self, step: usize) -> NecResult<()> {
        self.ensure_alive("select step")?;
        self.check_step(step)?;
        self.current_step = step;
        Ok(())
    }

    pub(crate) fn check_step(&self, step: usize) -> NecResult<()> {
        if step < self.step_count() {
            Ok(())
        } else {
            Err(NecError::invalid(format!(
                "frequency step {} outside a sweep of {} steps",
                step,
                self.step_count()
            )))
        }
    }

    // Solve engine

    pub fn solve_state(&self, step: usize) -> SolveState {
        self.cache.state(step)
    }

    /// Assemble, factor and back-substitute for `step` unless its solution
    /// is still fresh.
    pub fn ensure_solved(&mut self, step: usize) -> NecResult<()> {
        let geometry = self.sealed("solve")?;
        self.check_step(step)?;
        if self.cache.state(step) == SolveState::Fresh {
            tracing::debug!(step, "solution cache hit");
            return Ok(());
        }
        let frequency = self
            .environment
            .sweep
            .frequency_at(step)
            .ok_or_else(|| NecError::invalid("frequency step outside the sweep"))?;
        let frequency_mhz = in_mhz(frequency);
        let _span = tracing::debug_span!("solve", step, frequency_mhz).entered();

        if self.excitation.is_none() {
            tracing::warn!(step, "solving without an excitation; all currents are zero");
        }
        let input = SolveInput {
            geometry,
            environment: &self.environment,
            excitation: self.excitation.as_ref(),
            frequency,
        };
        let timer = Timer::start("solve");
        let system = self.solver.assemble_and_factor(&input)?;
        let currents = self.solver.compute_currents(&system)?;
        let impedance = match self.solver.evaluate_impedance(&currents) {
            Ok(z) => Some(z),
            Err(err) => {
                tracing::debug!(%err, "no input impedance");
                None
            }
        };
        let summary = StepSummary {
            step,
            frequency_mhz,
            impedance,
            input_power: currents.input_power(),
            loss_power: currents.loss_power(),
        };
        if let Some(elapsed) = timer.stop() {
            tracing::debug!(elapsed_s = elapsed, "solve timing");
        }

        self.results.set_summary(summary);
        self.cache.store(step, CachedSolve { system, currents });
        tracing::info!(step, frequency_mhz, "frequency step solved");
        Ok(())
    }

    pub(crate) fn cached(&self, step: usize) -> NecResult<&CachedSolve> {
        self.cache.get(step).ok_or_else(|| NecError::SolveFailure {
            message: format!("no solution for frequency step {step}"),
        })
    }

    /// Feed-point and power figures of a step, solving it if needed.
    pub fn summary(&mut self, step: usize) -> NecResult<StepSummary> {
        self.ensure_solved(step)?;
        self.results
            .summary(step)
            .copied()
            .ok_or_else(|| NecError::SolveFailure {
                message: format!("no summary for frequency step {step}"),
            })
    }

    /// Input impedance from a fresh solution of `step`.
    pub(crate) fn solve_impedance(&mut self, step: usize) -> NecResult<nec_core::Cplx> {
        self.ensure_solved(step)?;
        let solve = self.cached(step)?;
        self.solver
            .evaluate_impedance(&solve.currents)
            .map_err(|err| match err {
                SolverError::NoVoltageSource => NecError::NoInputImpedance { step },
                other => other.into(),
            })
    }

    /// Every result set and step summary computed so far.
    ///
    /// Entries are not recomputed after a configuration change; check
    /// [`Context::result_state`] and [`Context::solve_state`] or go through
    /// the accessors, which always evaluate against the latest configuration.
    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Whether the stored result of `request` at `step` reflects the latest
    /// configuration.
    pub fn result_state(&self, step: usize, request: RequestId) -> SolveState {
        if self.cache.result_is_fresh(&ResultKey::new(step, request)) {
            SolveState::Fresh
        } else {
            SolveState::Stale
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use nec_core::{Cplx, vec3};
    use nec_environment::{LoadKind, SegmentRange};

    fn sealed_dipole() -> Context {
        let mut ctx = Context::new();
        ctx.wire(WireSpec::new(
            1,
            9,
            vec3(0.0, 0.0, 2.0),
            vec3(0.0, 0.0, 7.0),
            0.1,
        ))
        .unwrap();
        ctx.geometry_complete(GroundPlaneMode::CurrentExpansionModified)
            .unwrap();
        ctx
    }

    #[test]
    fn environment_needs_sealed_geometry() {
        let mut ctx = Context::new();
        let err = ctx.medium(1e-11, 1e-6).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequence);
        assert!(matches!(
            ctx.ensure_solved(0),
            Err(NecError::Sequence { operation: "solve", .. })
        ));
    }

    #[test]
    fn geometry_is_frozen_after_seal() {
        let mut ctx = sealed_dipole();
        let err = ctx
            .wire(WireSpec::new(2, 1, vec3(1.0, 0.0, 0.0), vec3(2.0, 0.0, 0.0), 0.01))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequence);
        assert_eq!(
            ctx.geometry_complete(GroundPlaneMode::NoGround).unwrap_err().kind(),
            ErrorKind::Sequence
        );
    }

    #[test]
    fn failed_seal_keeps_builder() {
        let mut ctx = Context::new();
        assert_eq!(
            ctx.geometry_complete(GroundPlaneMode::NoGround).unwrap_err(),
            NecError::EmptyGeometry
        );
        ctx.wire(WireSpec::new(1, 3, vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0), 0.01))
            .unwrap();
        assert!(ctx.geometry_complete(GroundPlaneMode::NoGround).is_ok());
    }

    #[test]
    fn invalid_references_are_rejected_eagerly() {
        let mut ctx = sealed_dipole();
        let bad_source = Excitation::AppliedVoltage {
            segment: SegmentRef::new(1, 12),
            voltage: Cplx::new(1.0, 0.0),
        };
        assert_eq!(ctx.excitation(bad_source).unwrap_err().kind(), ErrorKind::InvalidParameter);
        assert!(ctx.active_excitation().is_none());

        let load = Load::new(SegmentRange::whole_tag(4), LoadKind::FixedImpedance { r: 1.0, x: 0.0 })
            .unwrap();
        assert_eq!(ctx.load(load).unwrap_err().kind(), ErrorKind::InvalidParameter);
        assert!(ctx.environment().loads.is_empty());
    }

    #[test]
    fn screen_requires_finite_ground() {
        let mut ctx = sealed_dipole();
        ctx.ground(Ground::Perfect).unwrap();
        let screen = RadialScreen::new(60, 10.0, 0.001).unwrap();
        assert_eq!(ctx.radial_screen(screen).unwrap_err().kind(), ErrorKind::Sequence);
        assert_eq!(ctx.environment().ground, Ground::Perfect);
    }

    #[test]
    fn frequency_resets_cursor() {
        let mut ctx = sealed_dipole();
        ctx.frequency(FrequencySweep::new(nec_environment::SweepKind::Linear, 3, 10.0, 1.0).unwrap())
            .unwrap();
        ctx.select_step(2).unwrap();
        assert_eq!(ctx.current_step(), 2);
        assert_eq!(ctx.select_step(3).unwrap_err().kind(), ErrorKind::InvalidParameter);
        ctx.frequency(FrequencySweep::single(30.0).unwrap()).unwrap();
        assert_eq!(ctx.current_step(), 0);
    }

    #[test]
    fn delete_twice_is_a_sequence_error() {
        let mut ctx = sealed_dipole();
        ctx.delete().unwrap();
        assert!(ctx.is_deleted());
        assert_eq!(ctx.delete().unwrap_err().kind(), ErrorKind::Sequence);
        assert_eq!(ctx.segment_count().unwrap_err().kind(), ErrorKind::Sequence);
    }
}

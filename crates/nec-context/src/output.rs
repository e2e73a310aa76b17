//! Output directives and their evaluation against a solved step.

use nec_core::timing::{Timer, solver_timing};
use nec_core::{GAIN_FLOOR_DB, RequestId, db10, in_mhz};
use nec_environment::{Ground, SegmentRef};
use nec_results::{
    CouplingResult, CurrentReport, GainType, NearFieldKind, NearFieldResult, NearFieldSample,
    Normalization, OutputFormat, PatternPoint, PatternResult, PatternSettings, ResultKey,
    ResultSet, SegmentCurrent,
};
use nec_solver::{NumericalSolver, PatternMode, SolverResult, resolve_range};
use rayon::prelude::*;

use crate::context::Context;
use crate::error::{NecError, NecResult};
use crate::request::{
    AngleGrid, ExecuteMode, NearFieldRequest, OutputRequest, PrintControl, RadiationPattern,
    RecordedRequest, SegmentSelection,
};

impl<S: NumericalSolver> Context<S> {
    /// Radiation pattern (RP). The pattern is evaluated at the current step
    /// right away; other steps are evaluated on demand or by
    /// [`Context::execute`].
    pub fn radiation_pattern(&mut self, pattern: RadiationPattern) -> NecResult<RequestId> {
        self.sealed("radiation pattern")?;
        pattern.validate()?;
        self.check_pattern_ground(pattern.mode)?;
        if self.environment.ground.is_present() && pattern.reaches_below_horizon() {
            tracing::warn!("pattern points below the horizon are evaluated over a ground plane");
        }
        self.record("radiation pattern", OutputRequest::Pattern(pattern))
    }

    fn check_pattern_ground(&self, mode: PatternMode) -> NecResult<()> {
        let missing = |what: &'static str| NecError::Sequence {
            operation: what,
            phase: "without a matching ground",
        };
        if !mode.needs_finite_ground() {
            return Ok(());
        }
        match &self.environment.ground {
            Ground::Finite { screen, second, .. } => {
                if mode.uses_screen() && screen.is_none() {
                    return Err(missing("radial screen pattern"));
                }
                if mode.uses_cliff() && second.is_none() {
                    return Err(missing("cliff pattern"));
                }
                Ok(())
            }
            _ => Err(missing("finite ground pattern")),
        }
    }

    /// Near electric (NE) or magnetic (NH) field.
    pub fn near_field(&mut self, request: NearFieldRequest) -> NecResult<RequestId> {
        self.sealed("near field")?;
        request.grid.validate()?;
        self.record("near field", OutputRequest::NearField(request))
    }

    /// Current (PT) or charge (PQ) print control.
    pub fn print_control(&mut self, control: PrintControl) -> NecResult<RequestId> {
        let geometry = self.sealed("print control")?;
        if let SegmentSelection::Range(range) = control.selection {
            resolve_range(geometry, &range).map_err(|e| NecError::invalid(e.to_string()))?;
        }
        self.record("print control", OutputRequest::Print(control))
    }

    /// Maximum coupling between two segments (CP).
    pub fn coupling(&mut self, first: SegmentRef, second: SegmentRef) -> NecResult<RequestId> {
        let geometry = self.sealed("coupling")?;
        let locate = |s: SegmentRef| {
            geometry.find_segment(s.tag, s.ordinal).ok_or_else(|| {
                NecError::invalid(format!("segment {} of tag {} does not exist", s.ordinal, s.tag))
            })
        };
        if locate(first)? == locate(second)? {
            return Err(NecError::invalid("coupling needs two distinct segments"));
        }
        self.record("coupling", OutputRequest::Coupling(first, second))
    }

    /// Execute (XQ): solve every frequency step and evaluate every recorded
    /// request there, after adding the cut patterns `mode` asks for. A cut
    /// already recorded by an earlier execute is reused.
    pub fn execute(&mut self, mode: ExecuteMode) -> NecResult<()> {
        self.sealed("execute")?;
        let settings = PatternSettings {
            format: OutputFormat::VerticalHorizontal,
            normalization: Normalization::Total,
            ..PatternSettings::default()
        };
        for &phi in mode.cuts() {
            let cut = RadiationPattern::new(
                PatternMode::SpaceWave,
                AngleGrid::theta_cut(91, 0.0, 1.0, phi),
                settings,
            );
            let recorded = self
                .requests
                .iter()
                .any(|r| r.request == OutputRequest::Pattern(cut));
            if !recorded {
                self.push_request(OutputRequest::Pattern(cut));
            }
        }
        for step in 0..self.step_count() {
            self.ensure_solved(step)?;
            let ids: Vec<RequestId> = self.requests.iter().map(|r| r.id).collect();
            for id in ids {
                self.ensure_result(step, id)?;
            }
        }
        tracing::info!(
            steps = self.step_count(),
            requests = self.requests.len(),
            "execute finished"
        );
        Ok(())
    }

    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    fn push_request(&mut self, request: OutputRequest) -> RequestId {
        let id = RequestId::from_index(self.requests.len() as u32);
        self.requests.push(RecordedRequest { id, request });
        id
    }

    /// Record a request and evaluate it at the current step. The request
    /// stays recorded when that first evaluation fails.
    fn record(&mut self, what: &'static str, request: OutputRequest) -> NecResult<RequestId> {
        let id = self.push_request(request);
        tracing::debug!(request = id.number(), what, "output request recorded");
        self.ensure_result(self.current_step, id)?;
        Ok(id)
    }

    /// Evaluate a request at a step unless a fresh result already exists.
    pub(crate) fn ensure_result(&mut self, step: usize, id: RequestId) -> NecResult<()> {
        let key = ResultKey::new(step, id);
        if self.cache.result_is_fresh(&key) && self.results.get(&key).is_some() {
            return Ok(());
        }
        self.ensure_solved(step)?;
        let request = self
            .requests
            .get(id.index() as usize)
            .map(|r| r.request)
            .ok_or_else(|| NecError::invalid(format!("no output request {}", id.number())))?;
        let set = self.evaluate(step, id, &request)?;
        self.results.insert(key, set);
        self.cache.mark_result(key);
        Ok(())
    }

    fn evaluate(&self, step: usize, id: RequestId, request: &OutputRequest) -> NecResult<ResultSet> {
        let geometry = self.sealed("evaluate output")?;
        let solve = self.cached(step)?;
        let currents = &solve.currents;
        let frequency_mhz = in_mhz(currents.frequency());

        let set = match *request {
            OutputRequest::Pattern(pattern) => {
                let points = pattern.points();
                let timer = Timer::start("pattern");
                let fields = self.solver.evaluate_pattern(currents, &points)?;
                timer.stop_into(&solver_timing::PATTERN);
                let directive = pattern.settings.gain_type == GainType::Directive;
                let samples = points
                    .iter()
                    .zip(&fields)
                    .map(|(p, f)| {
                        PatternPoint::from_field(p.theta_deg, p.phi_deg, f.e_theta, f.e_phi, |f2| {
                            currents.component_gain(f2, directive)
                        })
                    })
                    .collect();
                ResultSet::Pattern(PatternResult::new(
                    step,
                    id,
                    frequency_mhz,
                    pattern.grid.theta_count as usize,
                    pattern.grid.phi_count as usize,
                    pattern.settings,
                    currents.is_scattering(),
                    samples,
                ))
            }
            OutputRequest::NearField(near) => {
                let samples = near
                    .grid
                    .positions()
                    .par_iter()
                    .map(|p| -> SolverResult<NearFieldSample> {
                        let field = self.solver.evaluate_near_field(currents, p)?;
                        let v = match near.kind {
                            NearFieldKind::Electric => field.e,
                            NearFieldKind::Magnetic => field.h,
                        };
                        Ok(NearFieldSample {
                            position: [p.x, p.y, p.z],
                            field: [v.x, v.y, v.z],
                        })
                    })
                    .collect::<SolverResult<Vec<_>>>()?;
                ResultSet::NearField(NearFieldResult {
                    step,
                    request: id,
                    frequency_mhz,
                    kind: near.kind,
                    samples,
                })
            }
            OutputRequest::Print(control) => {
                let indices = match control.selection {
                    SegmentSelection::All => (0..geometry.segments().len()).collect(),
                    SegmentSelection::Range(range) => resolve_range(geometry, &range)?,
                };
                let segments = indices
                    .into_iter()
                    .filter_map(|i| {
                        let seg = geometry.segment(i)?;
                        let center = seg.center();
                        Some(SegmentCurrent {
                            number: i + 1,
                            tag: seg.tag,
                            center: [center.x, center.y, center.z],
                            length: seg.length(),
                            current: currents.segment_current(i)?,
                            charge_density: control
                                .charges
                                .then(|| currents.charge_density(i))
                                .flatten(),
                        })
                    })
                    .collect();
                ResultSet::Currents(CurrentReport {
                    step,
                    request: id,
                    frequency_mhz,
                    segments,
                })
            }
            OutputRequest::Coupling(first, second) => {
                let locate = |s: SegmentRef| {
                    geometry.find_segment(s.tag, s.ordinal).ok_or_else(|| {
                        NecError::invalid(format!(
                            "segment {} of tag {} does not exist",
                            s.ordinal, s.tag
                        ))
                    })
                };
                let segments = [locate(first)?, locate(second)?];
                let admittance =
                    self.solver
                        .two_port_admittance(&solve.system, segments[0], segments[1])?;
                let max_coupling_db = CouplingResult::max_coupling(&admittance)
                    .map(db10)
                    .unwrap_or(GAIN_FLOOR_DB);
                ResultSet::Coupling(CouplingResult {
                    step,
                    request: id,
                    frequency_mhz,
                    segments,
                    admittance,
                    max_coupling_db,
                })
            }
        };
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use nec_core::vec3;
    use nec_environment::{FiniteGroundModel, GroundMaterial};
    use nec_geometry::{GroundPlaneMode, WireSpec};

    fn sealed_monopole() -> Context {
        let mut ctx = Context::new();
        ctx.wire(WireSpec::new(1, 5, vec3(0.0, 0.0, 0.5), vec3(0.0, 0.0, 1.5), 0.005))
            .unwrap();
        ctx.geometry_complete(GroundPlaneMode::NoGround).unwrap();
        ctx
    }

    fn cut(mode: PatternMode) -> RadiationPattern {
        RadiationPattern::new(
            mode,
            AngleGrid::theta_cut(10, 0.0, 10.0, 0.0),
            PatternSettings::default(),
        )
    }

    #[test]
    fn ground_dependent_modes_need_finite_ground() {
        let mut ctx = sealed_monopole();
        let err = ctx.radiation_pattern(cut(PatternMode::LinearCliff)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequence);
        assert!(ctx.requests().is_empty());

        let material = GroundMaterial::new(13.0, 0.005).unwrap();
        ctx.ground(Ground::finite(material, FiniteGroundModel::default()))
            .unwrap();
        let err = ctx.radiation_pattern(cut(PatternMode::RadialScreen)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Sequence);
    }

    #[test]
    fn coupling_rejects_same_segment() {
        let mut ctx = sealed_monopole();
        let seg = SegmentRef::new(1, 3);
        assert_eq!(
            ctx.coupling(seg, seg).unwrap_err().kind(),
            ErrorKind::InvalidParameter
        );
        assert_eq!(
            ctx.coupling(seg, SegmentRef::new(2, 1)).unwrap_err().kind(),
            ErrorKind::InvalidParameter
        );
    }

    #[test]
    fn request_ids_follow_recording_order() {
        let mut ctx = sealed_monopole();
        let a = ctx
            .print_control(PrintControl {
                selection: SegmentSelection::All,
                charges: true,
            })
            .unwrap();
        let b = ctx.radiation_pattern(cut(PatternMode::SpaceWave)).unwrap();
        assert_eq!(a.number(), 1);
        assert_eq!(b.number(), 2);
        let report = match ctx.results().get(&ResultKey::new(0, a)) {
            Some(ResultSet::Currents(report)) => report.clone(),
            other => panic!("unexpected result {other:?}"),
        };
        assert_eq!(report.segments.len(), 5);
        assert!(report.segments.iter().all(|s| s.charge_density.is_some()));
    }

    #[test]
    fn execute_adds_cut_patterns() {
        let mut ctx = sealed_monopole();
        ctx.execute(ExecuteMode::BothCuts).unwrap();
        assert_eq!(ctx.requests().len(), 2);
        let patterns: Vec<_> = ctx.results().patterns_at(0).collect();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].theta_count, 91);
        assert_eq!(patterns[1].points[0].phi_deg, 90.0);
    }

    #[test]
    fn repeated_execute_reuses_cut_patterns() {
        let mut ctx = sealed_monopole();
        ctx.execute(ExecuteMode::XzCut).unwrap();
        ctx.execute(ExecuteMode::XzCut).unwrap();
        assert_eq!(ctx.requests().len(), 1);
        ctx.execute(ExecuteMode::BothCuts).unwrap();
        assert_eq!(ctx.requests().len(), 2);
    }
}

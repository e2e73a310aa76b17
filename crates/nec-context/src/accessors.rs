//! Gain, impedance and result queries keyed by frequency step.
//!
//! Every query evaluates lazily: a stale or missing result is recomputed
//! before it is read, so queries take `&mut self`.

use nec_core::{Cplx, Real, RequestId};
use nec_results::{GainComponent, GainStats, PatternResult, ResultKey, ResultSet};
use nec_solver::NumericalSolver;

use crate::context::Context;
use crate::error::{NecError, NecResult};

impl<S: NumericalSolver> Context<S> {
    /// Most recent radiation pattern request with total gain normalization.
    fn total_pattern_request(&self, step: usize) -> NecResult<RequestId> {
        let id = self
            .requests
            .iter()
            .rev()
            .find(|r| r.request.is_total_pattern())
            .map(|r| r.id)
            .ok_or(NecError::NoPatternRequested { step })?;
        if step >= self.step_count() {
            return Err(NecError::NoPatternRequested { step });
        }
        Ok(id)
    }

    /// The pattern gain accessors read at `step`.
    pub fn pattern_for(&mut self, step: usize) -> NecResult<&PatternResult> {
        self.ensure_alive("gain query")?;
        let id = self.total_pattern_request(step)?;
        self.ensure_result(step, id)?;
        self.results
            .get(&ResultKey::new(step, id))
            .and_then(ResultSet::as_pattern)
            .ok_or_else(|| NecError::SolveFailure {
                message: format!("pattern {} missing at step {step}", id.number()),
            })
    }

    /// Total gain (dB) at a grid position of the pattern.
    pub fn gain(&mut self, step: usize, theta_index: usize, phi_index: usize) -> NecResult<Real> {
        self.pattern_for(step)?
            .gain(theta_index, phi_index)
            .ok_or_else(|| {
                NecError::invalid(format!(
                    "pattern index ({theta_index}, {phi_index}) outside the grid"
                ))
            })
    }

    pub fn gain_stats(&mut self, step: usize, component: GainComponent) -> NecResult<GainStats> {
        self.pattern_for(step)?
            .stats(component)
            .ok_or_else(|| NecError::SolveFailure {
                message: format!("empty pattern at step {step}"),
            })
    }

    pub fn gain_max(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Total)?.max)
    }

    pub fn gain_min(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Total)?.min)
    }

    pub fn gain_mean(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Total)?.mean)
    }

    pub fn gain_sd(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Total)?.sd)
    }

    pub fn gain_rhcp_max(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Rhcp)?.max)
    }

    pub fn gain_rhcp_min(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Rhcp)?.min)
    }

    pub fn gain_rhcp_mean(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Rhcp)?.mean)
    }

    pub fn gain_rhcp_sd(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Rhcp)?.sd)
    }

    pub fn gain_lhcp_max(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Lhcp)?.max)
    }

    pub fn gain_lhcp_min(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Lhcp)?.min)
    }

    pub fn gain_lhcp_mean(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Lhcp)?.mean)
    }

    pub fn gain_lhcp_sd(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.gain_stats(step, GainComponent::Lhcp)?.sd)
    }

    fn impedance_at(&mut self, step: usize) -> NecResult<Cplx> {
        self.ensure_alive("impedance query")?;
        self.total_pattern_request(step)?;
        self.solve_impedance(step)
    }

    /// Input resistance (ohm) at the voltage source.
    pub fn impedance_real(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.impedance_at(step)?.re)
    }

    /// Input reactance (ohm) at the voltage source.
    pub fn impedance_imag(&mut self, step: usize) -> NecResult<Real> {
        Ok(self.impedance_at(step)?.im)
    }

    /// Complex input impedance, composed from the real and imaginary part
    /// queries. When either fails, every failure is reported together.
    ///
    /// A deleted context or a missing total gain pattern is reported as is.
    pub fn impedance(&mut self, step: usize) -> NecResult<Cplx> {
        self.ensure_alive("impedance query")?;
        self.total_pattern_request(step)?;
        match (self.impedance_real(step), self.impedance_imag(step)) {
            (Ok(re), Ok(im)) => Ok(Cplx::new(re, im)),
            (re, im) => Err(NecError::Composite(
                [re.err(), im.err()].into_iter().flatten().collect(),
            )),
        }
    }

    /// Result of one recorded request at a step, evaluating it if needed.
    pub fn result(&mut self, step: usize, request: RequestId) -> NecResult<&ResultSet> {
        self.ensure_alive("result query")?;
        self.check_step(step)?;
        self.ensure_result(step, request)?;
        self.results
            .get(&ResultKey::new(step, request))
            .ok_or_else(|| NecError::SolveFailure {
                message: format!("result {} missing at step {step}", request.number()),
            })
    }
}

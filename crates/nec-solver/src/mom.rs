//! Default thin-wire method-of-moments solver.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use nec_core::timing::{Timer, solver_timing};
use nec_core::{Cplx, Real, Vec3, in_mhz};
use nec_environment::{Environment, Medium, SegmentRange};
use nec_geometry::Geometry;
use tracing::debug;

use crate::assemble::interaction_matrix;
use crate::config::MomConfig;
use crate::error::{SolverError, SolverResult};
use crate::field;
use crate::green::Green;
use crate::model::FieldModel;
use crate::reflection::image_coefficient;
use crate::sources::{Impressed, excitation_vector};
use crate::system::{CurrentDistribution, FactoredSystem, FarField, FarFieldPoint, NearField, Scene};
use crate::{NumericalSolver, SolveInput};

/// Absolute segment indices addressed by `range`.
pub fn resolve_range(geometry: &Geometry, range: &SegmentRange) -> SolverResult<Vec<usize>> {
    let count = geometry.segments().len();
    if range.is_whole_tag() {
        if range.tag == 0 {
            return Ok((0..count).collect());
        }
        let list = geometry.tag_index().segments_with_tag(range.tag);
        if list.is_empty() {
            return Err(SolverError::ProblemSetup {
                what: format!("no segments with tag {}", range.tag),
            });
        }
        return Ok(list.to_vec());
    }
    (range.first..=range.last)
        .map(|ordinal| {
            geometry
                .find_segment(range.tag, ordinal)
                .ok_or_else(|| SolverError::ProblemSetup {
                    what: format!("segment {} of tag {} does not exist", ordinal, range.tag),
                })
        })
        .collect()
}

/// Method-of-moments solver with pulse current expansion and point
/// matching at element centers.
#[derive(Debug, Clone, Default)]
pub struct MomSolver {
    config: MomConfig,
}

impl MomSolver {
    pub fn new(config: MomConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MomConfig {
        &self.config
    }

    fn load_impedances(
        &self,
        geometry: &Geometry,
        model: &FieldModel,
        env: &Environment,
        omega: Real,
    ) -> SolverResult<Vec<Cplx>> {
        let mut loads = vec![Cplx::new(0.0, 0.0); model.unknown_count()];
        for load in &env.loads {
            for index in resolve_range(geometry, &load.range)? {
                let element = &model.elements[index];
                loads[index] += load.kind.impedance(
                    omega,
                    element.length(),
                    element.radius,
                    env.medium.permeability,
                );
            }
        }
        Ok(loads)
    }

    fn networks(
        &self,
        geometry: &Geometry,
        env: &Environment,
        k: Real,
    ) -> SolverResult<(Vec<usize>, DMatrix<Cplx>)> {
        let mut ports: Vec<usize> = Vec::new();
        let mut stamps = Vec::with_capacity(env.networks.len());
        for network in &env.networks {
            network.validate()?;
            let (a, b) = network.ports();
            let find = |r: nec_environment::SegmentRef| {
                geometry
                    .find_segment(r.tag, r.ordinal)
                    .ok_or_else(|| SolverError::ProblemSetup {
                        what: format!(
                            "network port segment {} of tag {} does not exist",
                            r.ordinal, r.tag
                        ),
                    })
            };
            let (ia, ib) = (find(a)?, find(b)?);
            let centers: [Vec3; 2] = [ia, ib].map(|i| geometry.segments()[i].center());
            let y = network.admittance(k, (centers[0] - centers[1]).norm(), (ia, ib))?;
            let mut slot = |segment: usize| match ports.iter().position(|&s| s == segment) {
                Some(p) => p,
                None => {
                    ports.push(segment);
                    ports.len() - 1
                }
            };
            stamps.push(([slot(ia), slot(ib)], y));
        }
        let mut admittance = DMatrix::from_element(ports.len(), ports.len(), Cplx::new(0.0, 0.0));
        for (slots, y) in stamps {
            for (i, &pi) in slots.iter().enumerate() {
                for (j, &pj) in slots.iter().enumerate() {
                    admittance[(pi, pj)] += y[i][j];
                }
            }
        }
        Ok((ports, admittance))
    }

    fn solve_rhs(&self, system: &FactoredSystem, rhs: &DVector<Cplx>) -> SolverResult<DVector<Cplx>> {
        system.lu.solve(rhs).ok_or_else(|| SolverError::Singular {
            what: "back substitution failed".to_string(),
        })
    }
}

impl NumericalSolver for MomSolver {
    fn assemble_and_factor(&self, input: &SolveInput<'_>) -> SolverResult<FactoredSystem> {
        let f_mhz = in_mhz(input.frequency);
        if !(f_mhz.is_finite() && f_mhz > 0.0) {
            return Err(SolverError::ProblemSetup {
                what: format!("frequency must be positive, got {f_mhz} MHz"),
            });
        }
        let env = input.environment;
        let model = FieldModel::from_geometry(input.geometry);
        let span = tracing::debug_span!(
            "assemble",
            unknowns = model.unknown_count(),
            frequency_mhz = f_mhz
        );
        let _guard = span.enter();

        let omega = Medium::angular_frequency(input.frequency);
        let k = env.medium.wavenumber(input.frequency);
        let wavelength = env.medium.wavelength(input.frequency);
        let range = env.interaction_range.get().map(|r| r * wavelength);
        let loads = self.load_impedances(input.geometry, &model, env, omega)?;
        let (ports, port_admittance) = self.networks(input.geometry, env, k)?;
        let impressed = Impressed::resolve(
            input.excitation,
            input.geometry,
            &env.ground,
            &env.medium,
            omega,
        )?;

        let scene = Arc::new(Scene {
            model,
            medium: env.medium,
            ground: env.ground.clone(),
            frequency: input.frequency,
            omega,
            k,
            image: image_coefficient(&env.ground, omega, &env.medium),
            impressed,
            green: Green::new(k, &self.config, range),
            kernel: env.kernel,
            loads,
            ports,
            port_admittance,
        });

        let timer = Timer::start("matrix fill");
        let matrix = interaction_matrix(&scene);
        timer.stop_into(&solver_timing::MATRIX_FILL);
        let rhs = excitation_vector(&scene);
        debug!(size = matrix.nrows(), "interaction matrix filled");

        let timer = Timer::start("factor");
        let lu = matrix.lu();
        timer.stop_into(&solver_timing::FACTOR);

        let pivots = lu.u().diagonal().map(|d| d.norm());
        let largest = pivots.iter().copied().fold(0.0, Real::max);
        let smallest = pivots.iter().copied().fold(Real::INFINITY, Real::min);
        if !(largest.is_finite() && smallest.is_finite())
            || smallest <= self.config.pivot_ratio * largest
        {
            return Err(SolverError::Singular {
                what: format!(
                    "pivot ratio {:.3e} at {} unknowns",
                    if largest > 0.0 { smallest / largest } else { 0.0 },
                    scene.unknown_count()
                ),
            });
        }
        debug!(smallest, largest, "matrix factored");

        Ok(FactoredSystem { scene, lu, rhs })
    }

    fn compute_currents(&self, system: &FactoredSystem) -> SolverResult<CurrentDistribution> {
        let solution = self.solve_rhs(system, &system.rhs)?;
        let n = system.scene.unknown_count();
        if solution.iter().any(|c| !(c.re.is_finite() && c.im.is_finite())) {
            return Err(SolverError::Numeric {
                what: "non-finite current".to_string(),
            });
        }
        Ok(CurrentDistribution {
            scene: Arc::clone(&system.scene),
            currents: solution.rows(0, n).iter().copied().collect(),
            port_voltages: solution.rows(n, solution.len() - n).iter().copied().collect(),
        })
    }

    fn evaluate_far_field(
        &self,
        currents: &CurrentDistribution,
        point: &FarFieldPoint,
    ) -> SolverResult<FarField> {
        let field = field::far_field(&currents.scene, currents, point);
        if field.e_theta.is_finite() && field.e_phi.is_finite() {
            Ok(field)
        } else {
            Err(SolverError::Numeric {
                what: format!(
                    "far field at theta {} phi {} is not finite",
                    point.theta_deg, point.phi_deg
                ),
            })
        }
    }

    fn evaluate_impedance(&self, currents: &CurrentDistribution) -> SolverResult<Cplx> {
        let Impressed::Voltage { segment, voltage } = currents.scene.impressed else {
            return Err(SolverError::NoVoltageSource);
        };
        let current = currents.currents[segment];
        if current.norm() == 0.0 {
            return Err(SolverError::Numeric {
                what: format!("zero current at source segment {}", segment + 1),
            });
        }
        Ok(voltage / current)
    }

    fn evaluate_near_field(
        &self,
        currents: &CurrentDistribution,
        point: &Vec3,
    ) -> SolverResult<NearField> {
        Ok(field::near_field(&currents.scene, currents, point))
    }

    fn two_port_admittance(
        &self,
        system: &FactoredSystem,
        first: usize,
        second: usize,
    ) -> SolverResult<[[Cplx; 2]; 2]> {
        let n = system.scene.model.segment_count();
        if first >= n || second >= n || first == second {
            return Err(SolverError::ProblemSetup {
                what: format!("invalid coupling segments {} and {}", first + 1, second + 1),
            });
        }
        let size = system.scene.system_size();
        let mut columns = [[Cplx::new(0.0, 0.0); 2]; 2];
        for (col, &driven) in [first, second].iter().enumerate() {
            let mut rhs = DVector::from_element(size, Cplx::new(0.0, 0.0));
            rhs[driven] = Cplx::new(1.0, 0.0);
            let solution = self.solve_rhs(system, &rhs)?;
            columns[col] = [solution[first], solution[second]];
        }
        Ok([
            [columns[0][0], columns[1][0]],
            [columns[0][1], columns[1][1]],
        ])
    }
}

use nec_core::{Cplx, db10, mhz, vec3};
use nec_environment::{
    Environment, Excitation, Ground, Load, LoadKind, Network, Polarization, SegmentRange,
    SegmentRef, TransmissionLine, WireKernel,
};
use nec_geometry::{Geometry, GeometryBuilder, GroundPlaneMode, WireSpec};
use nec_solver::{FarFieldPoint, MomSolver, NumericalSolver, SolveInput, SolverError};

fn vertical_dipole(z0: f64, z1: f64, radius: f64) -> Geometry {
    let mode = if z0 >= 0.0 {
        GroundPlaneMode::CurrentExpansionModified
    } else {
        GroundPlaneMode::NoGround
    };
    let mut b = GeometryBuilder::new();
    b.add_wire(WireSpec::new(0, 9, vec3(0.0, 0.0, z0), vec3(0.0, 0.0, z1), radius))
        .unwrap();
    b.seal(mode).unwrap()
}

fn feed() -> Excitation {
    Excitation::AppliedVoltage {
        segment: SegmentRef::new(0, 5),
        voltage: Cplx::new(1.0, 0.0),
    }
}

fn gains(
    solver: &MomSolver,
    geometry: &Geometry,
    env: &Environment,
    excitation: &Excitation,
    phi: f64,
) -> Vec<f64> {
    let input = SolveInput {
        geometry,
        environment: env,
        excitation: Some(excitation),
        frequency: mhz(30.0),
    };
    let system = solver.assemble_and_factor(&input).unwrap();
    let currents = solver.compute_currents(&system).unwrap();
    let points: Vec<_> = (0..90)
        .map(|t| FarFieldPoint::space_wave(t as f64, phi))
        .collect();
    solver
        .evaluate_pattern(&currents, &points)
        .unwrap()
        .iter()
        .map(|f| db10(currents.gain(f, false)))
        .collect()
}

#[test]
fn reference_dipole_over_perfect_ground() {
    let solver = MomSolver::default();
    let geometry = vertical_dipole(2.0, 7.0, 0.1);
    let env = Environment {
        ground: Ground::Perfect,
        ..Environment::default()
    };
    let g = gains(&solver, &geometry, &env, &feed(), 0.0);
    let max = g.iter().copied().fold(f64::MIN, f64::max);
    assert!((max - 8.508150).abs() < 1e-4, "max gain {max}");
    // The vertical dipole does not radiate towards the zenith.
    assert_eq!(g[0], -999.99);
    // Same answer on every run.
    assert_eq!(g, gains(&solver, &geometry, &env, &feed(), 0.0));
}

#[test]
fn free_space_half_wave_dipole() {
    let solver = MomSolver::default();
    let geometry = vertical_dipole(-2.5, 2.5, 0.01);
    let env = Environment::default();
    let input = SolveInput {
        geometry: &geometry,
        environment: &env,
        excitation: Some(&feed()),
        frequency: mhz(30.0),
    };
    let system = solver.assemble_and_factor(&input).unwrap();
    let currents = solver.compute_currents(&system).unwrap();
    let z = solver.evaluate_impedance(&currents).unwrap();
    assert!((60.0..160.0).contains(&z.re), "impedance {z}");
    assert!(z.im > 0.0, "a half wavelength is above resonance");

    let broadside = solver
        .evaluate_far_field(&currents, &FarFieldPoint::space_wave(90.0, 0.0))
        .unwrap();
    let gain = db10(currents.gain(&broadside, false));
    assert!((1.5..3.0).contains(&gain), "broadside gain {gain}");
    // Lossless structure: power and directive gain agree.
    assert!((currents.gain(&broadside, true) - currents.gain(&broadside, false)).abs() < 1e-9);

    // The current is largest at the feed and symmetric about it.
    let i = currents.currents();
    assert!(i[4].norm() > i[0].norm());
    assert!((i[2] - i[6]).norm() < 1e-6 * i[4].norm());
}

#[test]
fn resistive_load_costs_power_gain() {
    let solver = MomSolver::default();
    let geometry = vertical_dipole(-2.5, 2.5, 0.01);
    let mut env = Environment::default();
    env.loads.push(
        Load::new(
            SegmentRange::single(0, 3),
            LoadKind::SeriesRlc {
                r: 50.0,
                l: 0.0,
                c: 0.0,
            },
        )
        .unwrap(),
    );
    let input = SolveInput {
        geometry: &geometry,
        environment: &env,
        excitation: Some(&feed()),
        frequency: mhz(30.0),
    };
    let system = solver.assemble_and_factor(&input).unwrap();
    let currents = solver.compute_currents(&system).unwrap();
    assert!(currents.loss_power() > 0.0);
    assert!(currents.loss_power() < currents.input_power());
    let f = solver
        .evaluate_far_field(&currents, &FarFieldPoint::space_wave(90.0, 0.0))
        .unwrap();
    assert!(currents.gain(&f, true) > currents.gain(&f, false));
}

#[test]
fn impedance_needs_a_voltage_source() {
    let solver = MomSolver::default();
    let geometry = vertical_dipole(-2.5, 2.5, 0.01);
    let env = Environment::default();
    let wave = Excitation::PlaneWave {
        theta_deg: 90.0,
        phi_deg: 0.0,
        eta_deg: 0.0,
        polarization: Polarization::Linear,
        axial_ratio: 0.0,
    };
    let input = SolveInput {
        geometry: &geometry,
        environment: &env,
        excitation: Some(&wave),
        frequency: mhz(30.0),
    };
    let system = solver.assemble_and_factor(&input).unwrap();
    let currents = solver.compute_currents(&system).unwrap();
    assert!(currents.is_scattering());
    assert_eq!(
        solver.evaluate_impedance(&currents),
        Err(SolverError::NoVoltageSource)
    );
    // Broadside incidence on a resonant dipole scatters strongly back.
    let back = solver
        .evaluate_far_field(&currents, &FarFieldPoint::space_wave(90.0, 0.0))
        .unwrap();
    let sigma = currents.gain(&back, false);
    assert!(sigma > 0.1 && sigma < 2.0, "sigma / lambda^2 = {sigma}");
}

#[test]
fn missing_source_segment_is_a_setup_error() {
    let solver = MomSolver::default();
    let geometry = vertical_dipole(-2.5, 2.5, 0.01);
    let env = Environment::default();
    let bad = Excitation::AppliedVoltage {
        segment: SegmentRef::new(0, 10),
        voltage: Cplx::new(1.0, 0.0),
    };
    let input = SolveInput {
        geometry: &geometry,
        environment: &env,
        excitation: Some(&bad),
        frequency: mhz(30.0),
    };
    assert!(matches!(
        solver.assemble_and_factor(&input),
        Err(SolverError::ProblemSetup { .. })
    ));
}

fn parallel_pair() -> Geometry {
    let mut b = GeometryBuilder::new();
    for (tag, x) in [(1, 0.0), (2, 2.5)] {
        b.add_wire(WireSpec::new(tag, 9, vec3(x, 0.0, -2.5), vec3(x, 0.0, 2.5), 0.01))
            .unwrap();
    }
    b.seal(GroundPlaneMode::NoGround).unwrap()
}

#[test]
fn coupling_admittance_is_reciprocal_for_symmetric_pair() {
    let solver = MomSolver::default();
    let geometry = parallel_pair();
    let env = Environment::default();
    let input = SolveInput {
        geometry: &geometry,
        environment: &env,
        excitation: None,
        frequency: mhz(30.0),
    };
    let system = solver.assemble_and_factor(&input).unwrap();
    let y = solver.two_port_admittance(&system, 4, 13).unwrap();
    assert!((y[0][1] - y[1][0]).norm() < 1e-9 * y[0][0].norm());
    assert!((y[0][0] - y[1][1]).norm() < 1e-9 * y[0][0].norm());
    assert!(y[0][0].re > 0.0);
    assert!(y[0][1].norm() < y[0][0].norm());
}

#[test]
fn transmission_line_changes_feed_impedance() {
    let solver = MomSolver::default();
    let geometry = parallel_pair();
    let mut env = Environment::default();
    let excitation = Excitation::AppliedVoltage {
        segment: SegmentRef::new(1, 5),
        voltage: Cplx::new(1.0, 0.0),
    };
    let solve = |env: &Environment| {
        let input = SolveInput {
            geometry: &geometry,
            environment: env,
            excitation: Some(&excitation),
            frequency: mhz(30.0),
        };
        let system = solver.assemble_and_factor(&input).unwrap();
        let currents = solver.compute_currents(&system).unwrap();
        (solver.evaluate_impedance(&currents).unwrap(), currents)
    };
    let (bare, _) = solve(&env);
    env.networks.push(Network::Line(TransmissionLine {
        port1: SegmentRef::new(1, 3),
        port2: SegmentRef::new(2, 3),
        characteristic_impedance: 300.0,
        length: Some(1.3),
        shunt1: Cplx::new(0.0, 0.0),
        shunt2: Cplx::new(0.0, 0.0),
    }));
    let (lined, currents) = solve(&env);
    assert_ne!(bare, lined);
    assert_eq!(currents.port_voltages().len(), 2);
    // A lossless line absorbs no net power.
    assert!(currents.loss_power().abs() < 1e-6 * currents.input_power());
}

#[test]
fn extended_kernel_is_a_small_correction() {
    let solver = MomSolver::default();
    let geometry = vertical_dipole(-2.5, 2.5, 0.01);
    let impedance = |kernel| {
        let env = Environment {
            kernel,
            ..Environment::default()
        };
        let input = SolveInput {
            geometry: &geometry,
            environment: &env,
            excitation: Some(&feed()),
            frequency: mhz(30.0),
        };
        let system = solver.assemble_and_factor(&input).unwrap();
        let currents = solver.compute_currents(&system).unwrap();
        solver.evaluate_impedance(&currents).unwrap()
    };
    let thin = impedance(WireKernel::Thin);
    let extended = impedance(WireKernel::Extended);
    assert_ne!(thin, extended);
    assert!((thin - extended).norm() < 0.1 * thin.norm());
}

#[test]
fn near_field_approaches_far_field() {
    let solver = MomSolver::default();
    let geometry = vertical_dipole(-2.5, 2.5, 0.01);
    let env = Environment::default();
    let input = SolveInput {
        geometry: &geometry,
        environment: &env,
        excitation: Some(&feed()),
        frequency: mhz(30.0),
    };
    let system = solver.assemble_and_factor(&input).unwrap();
    let currents = solver.compute_currents(&system).unwrap();
    let r = 2000.0;
    let near = solver
        .evaluate_near_field(&currents, &vec3(r, 0.0, 0.0))
        .unwrap();
    let far = solver
        .evaluate_far_field(&currents, &FarFieldPoint::space_wave(90.0, 0.0))
        .unwrap();
    // At theta = 90 the theta unit vector is -z.
    let ratio = (near.e.z.norm() * r) / far.e_theta.norm();
    assert!((ratio - 1.0).abs() < 0.02, "ratio {ratio}");
    // Far from the source |E| / |H| tends to the wave impedance.
    let eta = near.e.z.norm() / near.h.y.norm();
    assert!((eta - nec_core::constants::ETA0).abs() < 0.02 * nec_core::constants::ETA0);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn vertical_dipole_pattern_is_omnidirectional(phi in 0.0f64..360.0) {
            let solver = MomSolver::default();
            let geometry = vertical_dipole(-2.5, 2.5, 0.01);
            let env = Environment::default();
            let input = SolveInput {
                geometry: &geometry,
                environment: &env,
                excitation: Some(&feed()),
                frequency: mhz(30.0),
            };
            let system = solver.assemble_and_factor(&input).unwrap();
            let currents = solver.compute_currents(&system).unwrap();
            let a = solver.evaluate_far_field(&currents, &FarFieldPoint::space_wave(60.0, 0.0)).unwrap();
            let b = solver.evaluate_far_field(&currents, &FarFieldPoint::space_wave(60.0, phi)).unwrap();
            prop_assert!((currents.gain(&a, false) - currents.gain(&b, false)).abs() < 1e-9);
            prop_assert!(b.e_phi.norm() < 1e-9 * b.e_theta.norm());
        }
    }
}

//! Replay a deck through the typed context API.

use nec_context::{
    AngleGrid, Context, ExecuteMode, NearFieldGrid, NearFieldKind, NearFieldRequest, NecResult,
    NumericalSolver, PatternMode, PatternSettings, PrintControl, RadiationPattern,
    SegmentSelection,
};
use nec_core::{Cplx, Vec3, vec3};
use nec_environment::{
    Cliff, Excitation, FiniteGroundModel, FrequencySweep, Ground, GroundMaterial,
    InteractionRange, Load, LoadKind, Polarization, RadialScreen, SecondMedium,
    SegmentRange, SegmentRef, SweepKind, TransmissionLine, TwoPort, WireKernel,
};
use nec_geometry::{GroundPlaneMode, PatchShape, ReflectAxes, Transform, TransformTarget, WireSpec};

use crate::schema::*;
use crate::validate::validate_deck;
use crate::{DeckError, DeckResult};

fn point(p: Point) -> Vec3 {
    vec3(p[0], p[1], p[2])
}

fn complex(c: Complex) -> Cplx {
    Cplx::new(c[0], c[1])
}

fn segment(s: SegmentDef) -> SegmentRef {
    SegmentRef::new(s.tag, s.segment)
}

/// Validate `deck` and apply its cards to `ctx` in order.
///
/// Stops at the first card the context rejects; earlier cards stay applied.
pub fn apply_deck<S: NumericalSolver>(deck: &Deck, ctx: &mut Context<S>) -> DeckResult<()> {
    validate_deck(deck)?;
    for (index, card) in deck.cards.iter().enumerate() {
        apply_card(card, ctx).map_err(|source| DeckError::Card {
            index,
            card: card.name(),
            source,
        })?;
    }
    tracing::info!(deck = %deck.name, cards = deck.cards.len(), "deck applied");
    Ok(())
}

fn apply_card<S: NumericalSolver>(card: &CardDef, ctx: &mut Context<S>) -> NecResult<()> {
    match *card {
        CardDef::Wire {
            tag,
            segments,
            start,
            end,
            radius,
            taper,
        } => {
            let mut spec = WireSpec::new(tag, segments, point(start), point(end), radius);
            if let Some(t) = taper {
                spec = spec.with_taper(t.length_ratio, t.radius_ratio);
            }
            ctx.wire(spec)?;
        }
        CardDef::Patch { shape } => {
            ctx.patch(patch_shape(shape))?;
        }
        CardDef::Transform {
            tag_increment,
            repeat,
            rotation_deg,
            translation,
            from_tag,
        } => ctx.transform(&Transform {
            tag_increment,
            repeat_count: repeat,
            rotation_deg: point(rotation_deg),
            translation: point(translation),
            target: from_tag.map_or(TransformTarget::Whole, TransformTarget::FromTag),
        })?,
        CardDef::Reflect {
            tag_increment,
            x,
            y,
            z,
        } => ctx.reflect(tag_increment, ReflectAxes::new(x, y, z))?,
        CardDef::GeometryEnd { ground_plane } => ctx.geometry_complete(match ground_plane {
            GroundPlaneDef::NoGround => GroundPlaneMode::NoGround,
            GroundPlaneDef::CurrentExpansionModified => GroundPlaneMode::CurrentExpansionModified,
            GroundPlaneDef::CurrentExpansionUnmodified => {
                GroundPlaneMode::CurrentExpansionUnmodified
            }
        })?,
        CardDef::Medium {
            permittivity,
            permeability,
        } => ctx.medium(permittivity, permeability)?,
        CardDef::Ground { ground } => ctx.ground(ground_kind(ground)?)?,
        CardDef::GroundScreen {
            screen,
            second_medium,
        } => {
            if let Some(s) = screen {
                ctx.radial_screen(RadialScreen::new(
                    s.radial_count,
                    s.screen_radius,
                    s.wire_radius,
                )?)?;
            }
            if let Some(m) = second_medium {
                let cliff = match m.cliff {
                    CliffDef::Linear { distance, height } => Cliff::Linear { distance, height },
                    CliffDef::Circular { radius, height } => Cliff::Circular { radius, height },
                };
                ctx.second_medium(SecondMedium {
                    material: GroundMaterial::new(m.relative_permittivity, m.conductivity)?,
                    cliff,
                })?;
            }
        }
        CardDef::Frequency {
            sweep,
            steps,
            start_mhz,
            step,
        } => {
            let kind = match sweep {
                SweepDef::Linear => SweepKind::Linear,
                SweepDef::Multiplicative => SweepKind::Multiplicative,
            };
            ctx.frequency(FrequencySweep::new(kind, steps, start_mhz, step)?)?;
        }
        CardDef::Load {
            tag,
            first,
            last,
            load,
        } => ctx.load(Load::new(SegmentRange::new(tag, first, last)?, load_kind(load))?)?,
        CardDef::Excitation { excitation } => ctx.excitation(excitation_kind(excitation))?,
        CardDef::TransmissionLine {
            from,
            to,
            impedance,
            length,
            shunt_from,
            shunt_to,
        } => ctx.transmission_line(TransmissionLine {
            port1: segment(from),
            port2: segment(to),
            characteristic_impedance: impedance,
            length,
            shunt1: complex(shunt_from),
            shunt2: complex(shunt_to),
        })?,
        CardDef::Network {
            from,
            to,
            y11,
            y12,
            y22,
        } => ctx.network(TwoPort {
            port1: segment(from),
            port2: segment(to),
            y11: complex(y11),
            y12: complex(y12),
            y22: complex(y22),
        })?,
        CardDef::Kernel { extended } => ctx.kernel(if extended {
            WireKernel::Extended
        } else {
            WireKernel::Thin
        })?,
        CardDef::InteractionRange { wavelengths } => ctx.interaction_range(match wavelengths {
            Some(w) => InteractionRange::wavelengths(w)?,
            None => InteractionRange::unlimited(),
        })?,
        CardDef::RadiationPattern(p) => {
            ctx.radiation_pattern(pattern(p))?;
        }
        CardDef::NearField { field, grid } => {
            let kind = match field {
                FieldDef::Electric => NearFieldKind::Electric,
                FieldDef::Magnetic => NearFieldKind::Magnetic,
            };
            let grid = match grid {
                NearGridDef::Rectangular {
                    start,
                    counts,
                    step,
                } => NearFieldGrid::Rectangular {
                    start: point(start),
                    counts,
                    step: point(step),
                },
                NearGridDef::Spherical {
                    radius,
                    phi_deg,
                    theta_deg,
                    counts,
                    step,
                } => NearFieldGrid::Spherical {
                    radius,
                    phi_deg,
                    theta_deg,
                    counts,
                    step: point(step),
                },
            };
            ctx.near_field(NearFieldRequest { kind, grid })?;
        }
        CardDef::Print {
            tag,
            first,
            last,
            charges,
        } => {
            let selection = match tag {
                Some(tag) => SegmentSelection::Range(SegmentRange::new(tag, first, last)?),
                None => SegmentSelection::All,
            };
            ctx.print_control(PrintControl { selection, charges })?;
        }
        CardDef::Coupling { first, second } => {
            ctx.coupling(segment(first), segment(second))?;
        }
        CardDef::Execute { cuts } => ctx.execute(match cuts {
            CutsDef::None => ExecuteMode::SolveOnly,
            CutsDef::Xz => ExecuteMode::XzCut,
            CutsDef::Yz => ExecuteMode::YzCut,
            CutsDef::Both => ExecuteMode::BothCuts,
        })?,
    }
    Ok(())
}

fn patch_shape(shape: PatchDef) -> PatchShape {
    match shape {
        PatchDef::Arbitrary {
            center,
            elevation_deg,
            azimuth_deg,
            area,
        } => PatchShape::Arbitrary {
            center: point(center),
            elevation_deg,
            azimuth_deg,
            area,
        },
        PatchDef::Rectangular { corners: [a, b, c] } => PatchShape::Rectangular {
            c1: point(a),
            c2: point(b),
            c3: point(c),
        },
        PatchDef::Triangular { corners: [a, b, c] } => PatchShape::Triangular {
            c1: point(a),
            c2: point(b),
            c3: point(c),
        },
        PatchDef::Quadrilateral {
            corners: [a, b, c, d],
        } => PatchShape::Quadrilateral {
            c1: point(a),
            c2: point(b),
            c3: point(c),
            c4: point(d),
        },
    }
}

fn ground_kind(ground: GroundDef) -> NecResult<Ground> {
    Ok(match ground {
        GroundDef::None => Ground::None,
        GroundDef::Perfect => Ground::Perfect,
        GroundDef::Finite {
            relative_permittivity,
            conductivity,
            model,
        } => Ground::finite(
            GroundMaterial::new(relative_permittivity, conductivity)?,
            match model {
                FiniteModelDef::ReflectionCoefficient => FiniteGroundModel::ReflectionCoefficient,
                FiniteModelDef::SommerfeldNorton => FiniteGroundModel::SommerfeldNorton,
            },
        ),
    })
}

fn load_kind(load: LoadDef) -> LoadKind {
    match load {
        LoadDef::SeriesRlc { r, l, c } => LoadKind::SeriesRlc { r, l, c },
        LoadDef::ParallelRlc { r, l, c } => LoadKind::ParallelRlc { r, l, c },
        LoadDef::SeriesRlcPerLength { r, l, c } => LoadKind::SeriesRlcPerLength { r, l, c },
        LoadDef::ParallelRlcPerLength { r, l, c } => LoadKind::ParallelRlcPerLength { r, l, c },
        LoadDef::FixedImpedance { r, x } => LoadKind::FixedImpedance { r, x },
        LoadDef::WireConductivity { sigma } => LoadKind::WireConductivity { sigma },
    }
}

fn excitation_kind(excitation: ExcitationDef) -> Excitation {
    match excitation {
        ExcitationDef::AppliedVoltage { source, voltage } => Excitation::AppliedVoltage {
            segment: segment(source),
            voltage: complex(voltage),
        },
        ExcitationDef::CurrentSlopeVoltage { source, voltage } => {
            Excitation::CurrentSlopeVoltage {
                segment: segment(source),
                voltage: complex(voltage),
            }
        }
        ExcitationDef::PlaneWave {
            theta_deg,
            phi_deg,
            eta_deg,
            polarization,
            axial_ratio,
        } => Excitation::PlaneWave {
            theta_deg,
            phi_deg,
            eta_deg,
            polarization: match polarization {
                PolarizationDef::Linear => Polarization::Linear,
                PolarizationDef::RightElliptic => Polarization::RightElliptic,
                PolarizationDef::LeftElliptic => Polarization::LeftElliptic,
            },
            axial_ratio,
        },
        ExcitationDef::ElementaryCurrent {
            position,
            alpha_deg,
            beta_deg,
            moment,
        } => Excitation::ElementaryCurrent {
            position: point(position),
            alpha_deg,
            beta_deg,
            moment: complex(moment),
        },
    }
}

fn pattern(p: PatternDef) -> RadiationPattern {
    let mode = match p.mode {
        PatternModeDef::SpaceWave => PatternMode::SpaceWave,
        PatternModeDef::SurfaceWave => PatternMode::SurfaceWave,
        PatternModeDef::LinearCliff => PatternMode::LinearCliff,
        PatternModeDef::CircularCliff => PatternMode::CircularCliff,
        PatternModeDef::RadialScreen => PatternMode::RadialScreen,
        PatternModeDef::RadialScreenLinearCliff => PatternMode::RadialScreenLinearCliff,
        PatternModeDef::RadialScreenCircularCliff => PatternMode::RadialScreenCircularCliff,
    };
    let grid = AngleGrid {
        theta_count: p.theta.count,
        phi_count: p.phi.count,
        theta_start: p.theta.start,
        phi_start: p.phi.start,
        theta_step: p.theta.step,
        phi_step: p.phi.step,
    };
    let settings = PatternSettings {
        format: p.format,
        normalization: p.normalization,
        gain_type: p.gain_type,
        averaging: p.averaging,
        gain_norm_db: p.gain_norm_db,
    };
    RadiationPattern {
        distance: p.distance,
        ..RadiationPattern::new(mode, grid, settings)
    }
}

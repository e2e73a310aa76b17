//! Deck schema definitions.
//!
//! A deck is an ordered list of cards. Each card mirrors one directive of
//! the context API; vectors are `[x, y, z]` and complex values `[re, im]`.

use nec_results::{Averaging, GainType, Normalization, OutputFormat};
use serde::{Deserialize, Serialize};

pub type Point = [f64; 3];
pub type Complex = [f64; 2];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deck {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<CardDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "card", rename_all = "snake_case")]
pub enum CardDef {
    Wire {
        tag: u32,
        segments: u32,
        start: Point,
        end: Point,
        radius: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        taper: Option<TaperDef>,
    },
    Patch {
        shape: PatchDef,
    },
    Transform {
        #[serde(default)]
        tag_increment: u32,
        #[serde(default)]
        repeat: u32,
        #[serde(default)]
        rotation_deg: Point,
        #[serde(default)]
        translation: Point,
        /// Start of the addressed segments; absent means the whole structure.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from_tag: Option<u32>,
    },
    Reflect {
        #[serde(default)]
        tag_increment: u32,
        #[serde(default)]
        x: bool,
        #[serde(default)]
        y: bool,
        #[serde(default)]
        z: bool,
    },
    GeometryEnd {
        #[serde(default)]
        ground_plane: GroundPlaneDef,
    },
    Medium {
        permittivity: f64,
        permeability: f64,
    },
    Ground {
        ground: GroundDef,
    },
    GroundScreen {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        screen: Option<ScreenDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        second_medium: Option<SecondMediumDef>,
    },
    Frequency {
        #[serde(default)]
        sweep: SweepDef,
        #[serde(default = "default_steps")]
        steps: u32,
        start_mhz: f64,
        #[serde(default)]
        step: f64,
    },
    Load {
        tag: u32,
        #[serde(default)]
        first: u32,
        #[serde(default)]
        last: u32,
        load: LoadDef,
    },
    Excitation {
        excitation: ExcitationDef,
    },
    TransmissionLine {
        from: SegmentDef,
        to: SegmentDef,
        impedance: f64,
        /// Absent uses the distance between the two segments.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<f64>,
        #[serde(default)]
        shunt_from: Complex,
        #[serde(default)]
        shunt_to: Complex,
    },
    Network {
        from: SegmentDef,
        to: SegmentDef,
        y11: Complex,
        y12: Complex,
        y22: Complex,
    },
    Kernel {
        extended: bool,
    },
    InteractionRange {
        /// Absent removes the approximation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wavelengths: Option<f64>,
    },
    RadiationPattern(PatternDef),
    NearField {
        #[serde(default)]
        field: FieldDef,
        grid: NearGridDef,
    },
    Print {
        /// Absent prints every segment.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<u32>,
        #[serde(default)]
        first: u32,
        #[serde(default)]
        last: u32,
        #[serde(default)]
        charges: bool,
    },
    Coupling {
        first: SegmentDef,
        second: SegmentDef,
    },
    Execute {
        #[serde(default)]
        cuts: CutsDef,
    },
}

fn default_steps() -> u32 {
    1
}

impl CardDef {
    pub fn name(&self) -> &'static str {
        match self {
            CardDef::Wire { .. } => "wire",
            CardDef::Patch { .. } => "patch",
            CardDef::Transform { .. } => "transform",
            CardDef::Reflect { .. } => "reflect",
            CardDef::GeometryEnd { .. } => "geometry_end",
            CardDef::Medium { .. } => "medium",
            CardDef::Ground { .. } => "ground",
            CardDef::GroundScreen { .. } => "ground_screen",
            CardDef::Frequency { .. } => "frequency",
            CardDef::Load { .. } => "load",
            CardDef::Excitation { .. } => "excitation",
            CardDef::TransmissionLine { .. } => "transmission_line",
            CardDef::Network { .. } => "network",
            CardDef::Kernel { .. } => "kernel",
            CardDef::InteractionRange { .. } => "interaction_range",
            CardDef::RadiationPattern(_) => "radiation_pattern",
            CardDef::NearField { .. } => "near_field",
            CardDef::Print { .. } => "print",
            CardDef::Coupling { .. } => "coupling",
            CardDef::Execute { .. } => "execute",
        }
    }

    /// Cards that build the structure, accepted only before `geometry_end`.
    pub fn is_geometry(&self) -> bool {
        matches!(
            self,
            CardDef::Wire { .. }
                | CardDef::Patch { .. }
                | CardDef::Transform { .. }
                | CardDef::Reflect { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TaperDef {
    pub length_ratio: f64,
    pub radius_ratio: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PatchDef {
    Arbitrary {
        center: Point,
        elevation_deg: f64,
        azimuth_deg: f64,
        area: f64,
    },
    Rectangular {
        corners: [Point; 3],
    },
    Triangular {
        corners: [Point; 3],
    },
    Quadrilateral {
        corners: [Point; 4],
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum GroundPlaneDef {
    #[default]
    NoGround,
    CurrentExpansionModified,
    CurrentExpansionUnmodified,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GroundDef {
    None,
    Perfect,
    Finite {
        relative_permittivity: f64,
        conductivity: f64,
        #[serde(default)]
        model: FiniteModelDef,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum FiniteModelDef {
    #[default]
    ReflectionCoefficient,
    SommerfeldNorton,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScreenDef {
    pub radial_count: u32,
    pub screen_radius: f64,
    pub wire_radius: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SecondMediumDef {
    pub relative_permittivity: f64,
    pub conductivity: f64,
    pub cliff: CliffDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum CliffDef {
    Linear { distance: f64, height: f64 },
    Circular { radius: f64, height: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum SweepDef {
    #[default]
    Linear,
    Multiplicative,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum LoadDef {
    SeriesRlc {
        #[serde(default)]
        r: f64,
        #[serde(default)]
        l: f64,
        #[serde(default)]
        c: f64,
    },
    ParallelRlc {
        #[serde(default)]
        r: f64,
        #[serde(default)]
        l: f64,
        #[serde(default)]
        c: f64,
    },
    SeriesRlcPerLength {
        #[serde(default)]
        r: f64,
        #[serde(default)]
        l: f64,
        #[serde(default)]
        c: f64,
    },
    ParallelRlcPerLength {
        #[serde(default)]
        r: f64,
        #[serde(default)]
        l: f64,
        #[serde(default)]
        c: f64,
    },
    FixedImpedance {
        r: f64,
        #[serde(default)]
        x: f64,
    },
    WireConductivity {
        sigma: f64,
    },
}

/// Segment `segment` (1-based) of wire `tag`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SegmentDef {
    pub tag: u32,
    pub segment: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ExcitationDef {
    AppliedVoltage {
        source: SegmentDef,
        voltage: Complex,
    },
    CurrentSlopeVoltage {
        source: SegmentDef,
        voltage: Complex,
    },
    PlaneWave {
        theta_deg: f64,
        phi_deg: f64,
        #[serde(default)]
        eta_deg: f64,
        #[serde(default)]
        polarization: PolarizationDef,
        #[serde(default)]
        axial_ratio: f64,
    },
    ElementaryCurrent {
        position: Point,
        alpha_deg: f64,
        beta_deg: f64,
        moment: Complex,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum PolarizationDef {
    #[default]
    Linear,
    RightElliptic,
    LeftElliptic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum PatternModeDef {
    #[default]
    SpaceWave,
    SurfaceWave,
    LinearCliff,
    CircularCliff,
    RadialScreen,
    RadialScreenLinearCliff,
    RadialScreenCircularCliff,
}

/// `count` samples from `start` in increments of `step`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AxisDef {
    pub count: u32,
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub step: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PatternDef {
    #[serde(default)]
    pub mode: PatternModeDef,
    pub theta: AxisDef,
    pub phi: AxisDef,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_normalization")]
    pub normalization: Normalization,
    #[serde(default)]
    pub gain_type: GainType,
    #[serde(default)]
    pub averaging: Averaging,
    #[serde(default)]
    pub gain_norm_db: f64,
    /// Radial distance; required by the surface-wave mode.
    #[serde(default)]
    pub distance: f64,
}

fn default_normalization() -> Normalization {
    Normalization::Total
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum FieldDef {
    #[default]
    Electric,
    Magnetic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum NearGridDef {
    Rectangular {
        start: Point,
        counts: [u32; 3],
        step: Point,
    },
    Spherical {
        radius: f64,
        phi_deg: f64,
        theta_deg: f64,
        counts: [u32; 3],
        step: Point,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub enum CutsDef {
    #[default]
    None,
    Xz,
    Yz,
    Both,
}

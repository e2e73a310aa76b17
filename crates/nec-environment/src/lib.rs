//! Typed environment model for antenna simulations.
//!
//! Everything a structure is embedded in or driven by, apart from the
//! geometry itself: propagation medium, ground, frequency sweep, lumped and
//! distributed loads, excitation sources, transmission lines and two-port
//! networks, and the wire kernel options. Each directive parameter is a
//! closed enum or a validated struct rather than a raw integer code.

pub mod error;
pub mod excitation;
pub mod ground;
pub mod kernel;
pub mod load;
pub mod medium;
pub mod network;
pub mod sweep;

pub use error::{EnvironmentError, EnvironmentResult};
pub use excitation::{
    Excitation, ExcitationKind, Polarization, SegmentRef, current_element_direction,
};
pub use ground::{Cliff, FiniteGroundModel, Ground, GroundMaterial, RadialScreen, SecondMedium};
pub use kernel::{InteractionRange, WireKernel};
pub use load::{Load, LoadKind, SegmentRange};
pub use medium::Medium;
pub use network::{Network, TransmissionLine, TwoPort};
pub use sweep::{FrequencySweep, SweepKind};

/// Medium, ground, sweep, loads, networks and kernel options of one context.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub medium: Medium,
    pub ground: Ground,
    pub sweep: FrequencySweep,
    pub loads: Vec<Load>,
    pub networks: Vec<Network>,
    pub kernel: WireKernel,
    pub interaction_range: InteractionRange,
}

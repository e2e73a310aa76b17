//! Simulation context for wire and surface-patch antenna models.
//!
//! A [`Context`] walks through three phases: geometry is built card by card,
//! sealed by [`Context::geometry_complete`], and then driven with
//! environment, excitation and output directives until it is deleted.
//! Solutions per frequency step are computed on demand, cached, and
//! recomputed only after a configuration change.
//!
//! # Example
//!
//! ```no_run
//! use nec_context::{AngleGrid, Context, PatternMode, PatternSettings, RadiationPattern};
//! use nec_core::{Cplx, vec3};
//! use nec_environment::{Excitation, FrequencySweep, Ground, SegmentRef};
//! use nec_geometry::{GroundPlaneMode, WireSpec};
//!
//! let mut ctx = Context::new();
//! ctx.wire(WireSpec::new(1, 9, vec3(0.0, 0.0, 2.0), vec3(0.0, 0.0, 7.0), 0.1))?;
//! ctx.geometry_complete(GroundPlaneMode::CurrentExpansionModified)?;
//! ctx.ground(Ground::Perfect)?;
//! ctx.frequency(FrequencySweep::single(30.0)?)?;
//! ctx.excitation(Excitation::AppliedVoltage {
//!     segment: SegmentRef::new(1, 5),
//!     voltage: Cplx::new(1.0, 0.0),
//! })?;
//! ctx.radiation_pattern(RadiationPattern::new(
//!     PatternMode::SpaceWave,
//!     AngleGrid::theta_cut(90, 0.0, 1.0, 0.0),
//!     PatternSettings::default(),
//! ))?;
//! println!("max gain {:.2} dBi", ctx.gain_max(0)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod accessors;
mod cache;
pub mod context;
pub mod error;
mod output;
pub mod request;

pub use cache::SolveState;
pub use context::Context;
pub use error::{ErrorKind, NecError, NecResult};
pub use request::{
    AngleGrid, ExecuteMode, NearFieldGrid, NearFieldRequest, OutputRequest, PrintControl,
    RadiationPattern, RecordedRequest, SegmentSelection,
};

// Re-exported so callers can describe requests without extra imports
pub use nec_results::{
    Averaging, GainComponent, GainStats, GainType, NearFieldKind, Normalization, OutputFormat,
    PatternSettings, ResultKey, ResultSet, ResultStore, StepSummary,
};
pub use nec_solver::{MomSolver, NumericalSolver, PatternMode};

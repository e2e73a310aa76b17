//! nec-core: stable foundation for the antenna modelling workspace.
//!
//! Contains:
//! - units (uom SI types + constructors, electromagnetic constants)
//! - numeric (Real + tolerances + dB helpers + complex alias)
//! - vector (small 3D vector type for wire geometry)
//! - ids (stable compact IDs for segments, patches and output requests)
//! - error (shared error types)
//! - timing (opt-in wall clock timers)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;
pub mod vector;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
pub use vector::*;

//! nec-geometry: wire and surface-patch structure for antenna models.
//!
//! Provides:
//! - Segment and patch data types
//! - Incremental geometry builder with transforms and reflections
//! - Sealing validation (degenerate, duplicate, crossing, below-ground)
//! - Segment connectivity and (tag, ordinal) lookup for the solver
//!
//! # Example
//!
//! ```
//! use nec_core::vec3;
//! use nec_geometry::{GeometryBuilder, GroundPlaneMode, WireSpec};
//!
//! let mut builder = GeometryBuilder::new();
//! builder
//!     .add_wire(WireSpec::new(1, 9, vec3(0.0, 0.0, 2.0), vec3(0.0, 0.0, 7.0), 0.1))
//!     .unwrap();
//! let geometry = builder.seal(GroundPlaneMode::CurrentExpansionModified).unwrap();
//!
//! assert_eq!(geometry.segments().len(), 9);
//! assert_eq!(geometry.find_segment(1, 5), Some(4));
//! ```

pub mod builder;
pub mod error;
pub mod geometry;
pub mod indexing;
pub mod patch;
pub mod transform;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::{GeometryBuilder, WireSpec};
pub use error::{GeometryError, GeometryResult};
pub use geometry::{EndConnection, Geometry, GroundPlaneMode, Segment, SegmentEnd, Tag};
pub use indexing::TagIndex;
pub use patch::{Patch, PatchKind, PatchShape};
pub use transform::{ReflectAxes, Transform, TransformTarget};

//! Geometry-specific error types.

use nec_core::{CoreError, SegmentId};

use crate::geometry::Tag;

pub type GeometryResult<T> = Result<T, GeometryError>;

/// Geometry construction and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Malformed wire parameters (segment count, radius, endpoints, taper).
    InvalidWire { tag: Tag, what: &'static str },

    /// Malformed surface patch parameters.
    InvalidPatch { what: &'static str },

    /// A patch continuation is required before any other geometry directive.
    PendingPatch,

    /// A patch continuation was given without a preceding surface patch.
    NoPendingPatch,

    /// A transform addressed a tag that no segment carries.
    TagNotFound { tag: Tag },

    /// Sealing found no segments and no patches.
    Empty,

    /// A segment dips below the ground plane.
    BelowGround { segment: SegmentId },

    /// Two segments have identical endpoints.
    DuplicateSegment { first: SegmentId, second: SegmentId },

    /// Two segments intersect away from their shared endpoints.
    CrossingSegments { first: SegmentId, second: SegmentId },

    /// Arithmetic problem while building the structure.
    Numeric(CoreError),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::InvalidWire { tag, what } => {
                write!(f, "Wire with tag {} is invalid: {}", tag, what)
            }
            GeometryError::InvalidPatch { what } => write!(f, "Patch is invalid: {}", what),
            GeometryError::PendingPatch => {
                write!(f, "Surface patch is waiting for its continuation corners")
            }
            GeometryError::NoPendingPatch => {
                write!(f, "Patch continuation without a preceding surface patch")
            }
            GeometryError::TagNotFound { tag } => write!(f, "No segment carries tag {}", tag),
            GeometryError::Empty => write!(f, "Geometry has no segments or patches"),
            GeometryError::BelowGround { segment } => {
                write!(f, "Segment {} extends below the ground plane", segment)
            }
            GeometryError::DuplicateSegment { first, second } => {
                write!(f, "Segments {} and {} are coincident", first, second)
            }
            GeometryError::CrossingSegments { first, second } => {
                write!(
                    f,
                    "Segments {} and {} intersect away from a shared endpoint",
                    first, second
                )
            }
            GeometryError::Numeric(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for GeometryError {}

impl From<CoreError> for GeometryError {
    fn from(err: CoreError) -> Self {
        GeometryError::Numeric(err)
    }
}

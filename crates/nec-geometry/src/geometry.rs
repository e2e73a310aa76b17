//! Sealed geometry data structures.

use nec_core::{Real, SegmentId, Vec3};

use crate::indexing::TagIndex;
use crate::patch::Patch;

/// Wire tag number. Tag 0 marks untagged wires and is never incremented.
pub type Tag = u32;

/// Straight wire segment carrying one unknown current.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    pub tag: Tag,
    /// 1-based position within the wire that created it.
    pub ordinal: u32,
    pub start: Vec3,
    pub end: Vec3,
    pub radius: Real,
}

impl Segment {
    pub fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    pub fn vector(&self) -> Vec3 {
        self.end - self.start
    }

    pub fn length(&self) -> Real {
        self.vector().norm()
    }

    /// Unit vector from start to end.
    pub fn direction(&self) -> Vec3 {
        self.vector() / self.length()
    }

    pub fn endpoint(&self, side: SegmentEnd) -> Vec3 {
        match side {
            SegmentEnd::Start => self.start,
            SegmentEnd::End => self.end,
        }
    }
}

/// Which end of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentEnd {
    Start,
    End,
}

impl SegmentEnd {
    /// +1 when current flowing along the segment enters the junction at this end.
    pub fn inflow_sign(self) -> Real {
        match self {
            SegmentEnd::Start => -1.0,
            SegmentEnd::End => 1.0,
        }
    }
}

/// How the current behaves at one end of a segment.
#[derive(Debug, Clone, PartialEq)]
pub enum EndConnection {
    /// Open wire end: current goes to zero.
    Free,
    /// End lies on the ground plane and continues into its image.
    Grounded,
    /// Junction with the listed segment ends (excluding this one).
    Junction(Vec<(usize, SegmentEnd)>),
}

/// Ground handling selected when the geometry is sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundPlaneMode {
    /// No ground plane is present.
    #[default]
    NoGround,
    /// Ground present; wires touching it connect to their image.
    CurrentExpansionModified,
    /// Ground present; current is forced to zero where wires touch it.
    CurrentExpansionUnmodified,
}

impl GroundPlaneMode {
    pub fn has_ground(self) -> bool {
        !matches!(self, GroundPlaneMode::NoGround)
    }
}

/// Immutable structure produced by [`crate::GeometryBuilder::seal`].
#[derive(Debug, Clone)]
pub struct Geometry {
    pub(crate) segments: Vec<Segment>,
    pub(crate) patches: Vec<Patch>,
    pub(crate) ground_plane: GroundPlaneMode,
    /// Connection at (start, end) of each segment.
    pub(crate) connections: Vec<[EndConnection; 2]>,
    pub(crate) tag_index: TagIndex,
}

impl Geometry {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn ground_plane(&self) -> GroundPlaneMode {
        self.ground_plane
    }

    /// Number of unknown currents: one per segment, two per patch.
    pub fn unknown_count(&self) -> usize {
        self.segments.len() + 2 * self.patches.len()
    }

    pub fn connection(&self, index: usize, side: SegmentEnd) -> &EndConnection {
        let pair = &self.connections[index];
        match side {
            SegmentEnd::Start => &pair[0],
            SegmentEnd::End => &pair[1],
        }
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.tag_index
    }

    /// Absolute segment index for a (tag, ordinal) pair.
    ///
    /// With tag 0 the ordinal is the 1-based absolute segment number.
    pub fn find_segment(&self, tag: Tag, ordinal: u32) -> Option<usize> {
        self.tag_index.lookup(tag, ordinal, self.segments.len())
    }

    /// Largest coordinate magnitude, used to scale tolerances.
    pub fn extent(&self) -> Real {
        self.segments
            .iter()
            .flat_map(|s| [s.start.amax(), s.end.amax()])
            .chain(self.patches.iter().map(|p| p.center.amax()))
            .fold(0.0, Real::max)
    }
}

//! Incremental geometry builder.

use std::ops::Range;

use nec_core::{CoreError, PatchId, Real, SegmentId, Vec3, ensure_positive};

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{Geometry, GroundPlaneMode, Segment, Tag};
use crate::indexing::TagIndex;
use crate::patch::{Patch, PatchKind, PatchShape};
use crate::transform::{
    ReflectAxes, Transform, TransformTarget, increment_tag, mirror_patch, mirror_segment,
    move_patch, move_segment,
};
use crate::validate;

/// Parameters of one straight wire, divided into segments.
#[derive(Debug, Clone, PartialEq)]
pub struct WireSpec {
    pub tag: Tag,
    pub segment_count: u32,
    pub start: Vec3,
    pub end: Vec3,
    /// Radius of the first segment.
    pub radius: Real,
    /// Length of each segment relative to the previous one.
    pub length_ratio: Real,
    /// Radius of each segment relative to the previous one.
    pub radius_ratio: Real,
}

impl WireSpec {
    /// Uniform wire (no taper).
    pub fn new(tag: Tag, segment_count: u32, start: Vec3, end: Vec3, radius: Real) -> Self {
        Self {
            tag,
            segment_count,
            start,
            end,
            radius,
            length_ratio: 1.0,
            radius_ratio: 1.0,
        }
    }

    pub fn with_taper(mut self, length_ratio: Real, radius_ratio: Real) -> Self {
        self.length_ratio = length_ratio;
        self.radius_ratio = radius_ratio;
        self
    }

    fn validate(&self) -> GeometryResult<Real> {
        let invalid = |what| GeometryError::InvalidWire { tag: self.tag, what };
        if self.segment_count < 1 {
            return Err(invalid("segment count must be at least 1"));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(invalid("radius must be positive"));
        }
        if !self.start.iter().chain(self.end.iter()).all(|c| c.is_finite()) {
            return Err(invalid("endpoint is not finite"));
        }
        ensure_positive(self.length_ratio, "segment length ratio")?;
        ensure_positive(self.radius_ratio, "segment radius ratio")?;
        let length = (self.end - self.start).norm();
        let scale = self.start.amax().max(self.end.amax()).max(1.0);
        if length <= Real::EPSILON * scale {
            return Err(invalid("endpoints coincide"));
        }
        Ok(length)
    }

    /// Fractions of the wire length at which segment boundaries fall.
    fn boundaries(&self) -> Vec<Real> {
        let n = self.segment_count as usize;
        let mut out = Vec::with_capacity(n + 1);
        out.push(0.0);
        if (self.length_ratio - 1.0).abs() < 1e-12 {
            out.extend((1..=n).map(|i| i as Real / n as Real));
        } else {
            let r = self.length_ratio;
            let first = (1.0 - r) / (1.0 - r.powi(n as i32));
            let mut acc = 0.0;
            let mut step = first;
            for _ in 0..n {
                acc += step;
                out.push(acc);
                step *= r;
            }
        }
        // Exact endpoint
        out[n] = 1.0;
        out
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingPatch {
    kind: PatchKind,
    c1: Vec3,
    c2: Vec3,
}

/// Builder for constructing a structure incrementally.
///
/// Add wires and patches, apply transforms and reflections, then call
/// `seal()` to validate and freeze it into an immutable `Geometry`.
#[derive(Debug, Clone, Default)]
pub struct GeometryBuilder {
    segments: Vec<Segment>,
    patches: Vec<Patch>,
    pending: Option<PendingPatch>,
}

impl GeometryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    fn ensure_no_pending(&self) -> GeometryResult<()> {
        match self.pending {
            Some(_) => Err(GeometryError::PendingPatch),
            None => Ok(()),
        }
    }

    /// Add a wire and return the absolute index range of its segments.
    pub fn add_wire(&mut self, wire: WireSpec) -> GeometryResult<Range<usize>> {
        self.ensure_no_pending()?;
        wire.validate()?;

        let first = self.segments.len();
        let axis = wire.end - wire.start;
        let bounds = wire.boundaries();
        let mut radius = wire.radius;
        for (k, pair) in bounds.windows(2).enumerate() {
            let id = SegmentId::from_index(self.segments.len() as u32);
            self.segments.push(Segment {
                id,
                tag: wire.tag,
                ordinal: k as u32 + 1,
                start: wire.start + axis * pair[0],
                end: wire.start + axis * pair[1],
                radius,
            });
            radius *= wire.radius_ratio;
        }
        tracing::debug!(
            tag = wire.tag,
            segments = wire.segment_count,
            "wire added"
        );
        Ok(first..self.segments.len())
    }

    /// Add a fully specified patch.
    pub fn add_patch(&mut self, shape: PatchShape) -> GeometryResult<PatchId> {
        self.ensure_no_pending()?;
        self.push_patch(&shape)
    }

    fn push_patch(&mut self, shape: &PatchShape) -> GeometryResult<PatchId> {
        let id = PatchId::from_index(self.patches.len() as u32);
        self.patches.push(Patch::from_shape(id, shape)?);
        Ok(id)
    }

    /// Surface-patch directive.
    ///
    /// For [`PatchKind::Arbitrary`] `c1` is the center and `c2` holds
    /// (elevation deg, azimuth deg, area); the patch is added immediately.
    /// Other kinds wait for [`GeometryBuilder::patch_continuation`].
    pub fn surface_patch(
        &mut self,
        kind: PatchKind,
        c1: Vec3,
        c2: Vec3,
    ) -> GeometryResult<Option<PatchId>> {
        self.ensure_no_pending()?;
        if kind == PatchKind::Arbitrary {
            let shape = PatchShape::Arbitrary {
                center: c1,
                elevation_deg: c2.x,
                azimuth_deg: c2.y,
                area: c2.z,
            };
            return self.push_patch(&shape).map(Some);
        }
        self.pending = Some(PendingPatch { kind, c1, c2 });
        Ok(None)
    }

    /// Patch-continuation directive supplying the remaining corners.
    pub fn patch_continuation(&mut self, c3: Vec3, c4: Option<Vec3>) -> GeometryResult<PatchId> {
        let pending = self.pending.ok_or(GeometryError::NoPendingPatch)?;
        let (c1, c2) = (pending.c1, pending.c2);
        let shape = match pending.kind {
            PatchKind::Rectangular => PatchShape::Rectangular { c1, c2, c3 },
            PatchKind::Triangular => PatchShape::Triangular { c1, c2, c3 },
            PatchKind::Quadrilateral => PatchShape::Quadrilateral {
                c1,
                c2,
                c3,
                c4: c4.ok_or(GeometryError::InvalidPatch {
                    what: "quadrilateral needs a fourth corner",
                })?,
            },
            PatchKind::Arbitrary => return Err(GeometryError::NoPendingPatch),
        };
        let id = self.push_patch(&shape)?;
        self.pending = None;
        Ok(id)
    }

    /// Rotate/translate part of the structure, in place or as repeated copies.
    pub fn transform(&mut self, t: &Transform) -> GeometryResult<()> {
        self.ensure_no_pending()?;
        if !t
            .rotation_deg
            .iter()
            .chain(t.translation.iter())
            .all(|c| c.is_finite())
        {
            return Err(GeometryError::Numeric(CoreError::InvalidArg {
                what: "transform parameters must be finite",
            }));
        }

        let first = match t.target {
            TransformTarget::Whole => 0,
            TransformTarget::FromTag(tag) => self
                .segments
                .iter()
                .position(|s| s.tag == tag)
                .ok_or(GeometryError::TagNotFound { tag })?,
        };
        let with_patches = t.target == TransformTarget::Whole;
        let rot = t.rotation();
        let shift = t.translation;

        if t.repeat_count == 0 {
            for seg in &mut self.segments[first..] {
                move_segment(seg, &rot, &shift);
                seg.tag = increment_tag(seg.tag, t.tag_increment);
            }
            if with_patches {
                for patch in &mut self.patches {
                    move_patch(patch, &rot, &shift);
                }
            }
            return Ok(());
        }

        let mut batch: Vec<Segment> = self.segments[first..].to_vec();
        let mut patch_batch: Vec<Patch> = if with_patches {
            self.patches.clone()
        } else {
            Vec::new()
        };
        for _ in 0..t.repeat_count {
            for seg in &mut batch {
                move_segment(seg, &rot, &shift);
                seg.tag = increment_tag(seg.tag, t.tag_increment);
            }
            for patch in &mut patch_batch {
                move_patch(patch, &rot, &shift);
            }
            self.extend_segments(&batch);
            self.extend_patches(&patch_batch);
        }
        Ok(())
    }

    /// Reflect the whole structure, appending mirrored copies.
    ///
    /// Passes run Z, then Y, then X; each pass mirrors everything present so
    /// far and the tag increment doubles after every pass.
    pub fn reflect(&mut self, tag_increment: Tag, axes: ReflectAxes) -> GeometryResult<()> {
        self.ensure_no_pending()?;
        let mut increment = tag_increment;
        for mirror in axes.passes() {
            let mut copy = self.segments.clone();
            for seg in &mut copy {
                mirror_segment(seg, &mirror);
                seg.tag = increment_tag(seg.tag, increment);
            }
            let mut patch_copy = self.patches.clone();
            for patch in &mut patch_copy {
                mirror_patch(patch, &mirror);
            }
            self.extend_segments(&copy);
            self.extend_patches(&patch_copy);
            increment = increment.saturating_mul(2);
        }
        Ok(())
    }

    fn extend_segments(&mut self, batch: &[Segment]) {
        for seg in batch {
            let mut seg = seg.clone();
            seg.id = SegmentId::from_index(self.segments.len() as u32);
            self.segments.push(seg);
        }
    }

    fn extend_patches(&mut self, batch: &[Patch]) {
        for patch in batch {
            let mut patch = patch.clone();
            patch.id = PatchId::from_index(self.patches.len() as u32);
            self.patches.push(patch);
        }
    }

    /// Validate and freeze the structure, returning an immutable `Geometry`.
    pub fn seal(self, ground_plane: GroundPlaneMode) -> GeometryResult<Geometry> {
        self.ensure_no_pending()?;
        validate::validate_structure(&self.segments, &self.patches, ground_plane)?;

        let connections = validate::build_connections(&self.segments, ground_plane);
        let tag_index = TagIndex::from_segments(&self.segments);
        tracing::debug!(
            segments = self.segments.len(),
            patches = self.patches.len(),
            "geometry sealed"
        );

        Ok(Geometry {
            segments: self.segments,
            patches: self.patches,
            ground_plane,
            connections,
            tag_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SegmentEnd;
    use nec_core::vec3;

    #[test]
    fn uniform_wire_segments() {
        let mut b = GeometryBuilder::new();
        let range = b
            .add_wire(WireSpec::new(
                1,
                4,
                vec3(0.0, 0.0, 0.0),
                vec3(4.0, 0.0, 0.0),
                0.01,
            ))
            .unwrap();
        assert_eq!(range, 0..4);
        for (i, s) in b.segments().iter().enumerate() {
            assert!((s.length() - 1.0).abs() < 1e-12);
            assert_eq!(s.ordinal, i as u32 + 1);
            assert_eq!(s.id.index(), i as u32);
        }
    }

    #[test]
    fn tapered_wire_lengths_and_radii() {
        let mut b = GeometryBuilder::new();
        b.add_wire(
            WireSpec::new(1, 3, vec3(0.0, 0.0, 0.0), vec3(7.0, 0.0, 0.0), 0.01)
                .with_taper(2.0, 0.5),
        )
        .unwrap();
        let lengths: Vec<Real> = b.segments().iter().map(Segment::length).collect();
        assert!((lengths[0] - 1.0).abs() < 1e-12);
        assert!((lengths[1] - 2.0).abs() < 1e-12);
        assert!((lengths[2] - 4.0).abs() < 1e-12);
        assert!((b.segments()[2].radius - 0.0025).abs() < 1e-15);
    }

    #[test]
    fn invalid_wires_are_rejected() {
        let mut b = GeometryBuilder::new();
        let p = vec3(0.0, 0.0, 1.0);
        let q = vec3(0.0, 0.0, 2.0);
        assert!(matches!(
            b.add_wire(WireSpec::new(1, 0, p, q, 0.01)),
            Err(GeometryError::InvalidWire { .. })
        ));
        assert!(matches!(
            b.add_wire(WireSpec::new(1, 3, p, q, 0.0)),
            Err(GeometryError::InvalidWire { .. })
        ));
        assert!(matches!(
            b.add_wire(WireSpec::new(1, 3, p, p, 0.01)),
            Err(GeometryError::InvalidWire { .. })
        ));
        assert!(b.add_wire(WireSpec::new(1, 3, p, q, 0.01).with_taper(0.0, 1.0)).is_err());
        assert_eq!(b.segment_count(), 0);
    }

    #[test]
    fn transform_in_place_moves_from_tag() {
        let mut b = GeometryBuilder::new();
        b.add_wire(WireSpec::new(1, 1, vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), 0.01))
            .unwrap();
        b.add_wire(WireSpec::new(2, 1, vec3(0.0, 1.0, 0.0), vec3(1.0, 1.0, 0.0), 0.01))
            .unwrap();
        b.transform(&Transform {
            tag_increment: 0,
            repeat_count: 0,
            rotation_deg: Vec3::zeros(),
            translation: vec3(0.0, 0.0, 5.0),
            target: TransformTarget::FromTag(2),
        })
        .unwrap();
        assert_eq!(b.segments()[0].start.z, 0.0);
        assert_eq!(b.segments()[1].start.z, 5.0);
    }

    #[test]
    fn transform_copies_are_cumulative() {
        let mut b = GeometryBuilder::new();
        b.add_wire(WireSpec::new(1, 1, vec3(1.0, 0.0, 0.0), vec3(1.0, 0.0, 1.0), 0.01))
            .unwrap();
        b.transform(&Transform {
            tag_increment: 1,
            repeat_count: 3,
            rotation_deg: vec3(0.0, 0.0, 90.0),
            translation: Vec3::zeros(),
            target: TransformTarget::Whole,
        })
        .unwrap();
        let tags: Vec<Tag> = b.segments().iter().map(|s| s.tag).collect();
        assert_eq!(tags, vec![1, 2, 3, 4]);
        let last = &b.segments()[3];
        assert!((last.start - vec3(0.0, -1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn unknown_transform_tag_fails() {
        let mut b = GeometryBuilder::new();
        b.add_wire(WireSpec::new(1, 1, vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), 0.01))
            .unwrap();
        let t = Transform {
            target: TransformTarget::FromTag(9),
            ..Transform::moving(Vec3::zeros(), Vec3::zeros())
        };
        assert_eq!(b.transform(&t), Err(GeometryError::TagNotFound { tag: 9 }));
    }

    #[test]
    fn reflection_doubles_increment_per_pass() {
        let mut b = GeometryBuilder::new();
        b.add_wire(WireSpec::new(1, 1, vec3(1.0, 2.0, 3.0), vec3(2.0, 3.0, 4.0), 0.01))
            .unwrap();
        b.reflect(10, ReflectAxes::new(true, true, true)).unwrap();
        let tags: Vec<Tag> = b.segments().iter().map(|s| s.tag).collect();
        // Z pass (+10), Y pass (+20), X pass (+40)
        assert_eq!(tags, vec![1, 11, 21, 31, 41, 51, 61, 71]);
        assert_eq!(b.segments()[1].start, vec3(1.0, 2.0, -3.0));
        assert_eq!(b.segments()[2].start, vec3(1.0, -2.0, 3.0));
        assert_eq!(b.segments()[4].start, vec3(-1.0, 2.0, 3.0));
    }

    #[test]
    fn patch_card_pair() {
        let mut b = GeometryBuilder::new();
        let none = b
            .surface_patch(
                PatchKind::Rectangular,
                vec3(0.0, 0.0, 1.0),
                vec3(1.0, 0.0, 1.0),
            )
            .unwrap();
        assert!(none.is_none());
        assert_eq!(
            b.add_wire(WireSpec::new(1, 1, vec3(0.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), 0.01)),
            Err(GeometryError::PendingPatch)
        );
        let id = b.patch_continuation(vec3(1.0, 1.0, 1.0), None).unwrap();
        assert_eq!(id.index(), 0);
        assert_eq!(
            b.patch_continuation(vec3(1.0, 1.0, 1.0), None),
            Err(GeometryError::NoPendingPatch)
        );
    }

    #[test]
    fn pending_patch_blocks_seal() {
        let mut b = GeometryBuilder::new();
        b.surface_patch(
            PatchKind::Triangular,
            vec3(0.0, 0.0, 1.0),
            vec3(1.0, 0.0, 1.0),
        )
        .unwrap();
        assert_eq!(
            b.seal(GroundPlaneMode::NoGround).unwrap_err(),
            GeometryError::PendingPatch
        );
    }

    #[test]
    fn collinear_wires_join_at_shared_endpoint() {
        let mut b = GeometryBuilder::new();
        b.add_wire(WireSpec::new(1, 2, vec3(0.0, 0.0, 1.0), vec3(0.0, 0.0, 2.0), 0.01))
            .unwrap();
        b.add_wire(WireSpec::new(2, 2, vec3(0.0, 0.0, 2.0), vec3(0.0, 0.0, 3.0), 0.01))
            .unwrap();
        let g = b.seal(GroundPlaneMode::NoGround).unwrap();
        assert_eq!(
            g.connection(1, SegmentEnd::End),
            &crate::EndConnection::Junction(vec![(2, SegmentEnd::Start)])
        );
        assert_eq!(g.connection(0, SegmentEnd::Start), &crate::EndConnection::Free);
    }
}

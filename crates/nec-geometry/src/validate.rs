//! Sealing validation and connectivity.

use nec_core::{Real, Vec3};
use rayon::prelude::*;

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{EndConnection, GroundPlaneMode, Segment, SegmentEnd};
use crate::patch::Patch;

/// Endpoints closer than this fraction of the shorter segment are joined.
const JUNCTION_TOL: Real = 1e-3;

/// Parametric slack when deciding whether a closest point is an endpoint.
const PARAM_TOL: Real = 1e-6;

/// Validate the complete structure before sealing.
pub(crate) fn validate_structure(
    segments: &[Segment],
    patches: &[Patch],
    ground_plane: GroundPlaneMode,
) -> GeometryResult<()> {
    if segments.is_empty() && patches.is_empty() {
        return Err(GeometryError::Empty);
    }

    if ground_plane.has_ground() {
        let scale = segments
            .iter()
            .map(|s| s.start.amax().max(s.end.amax()))
            .fold(1.0, Real::max);
        let below = -1e-9 * scale;
        if let Some(seg) = segments
            .iter()
            .find(|s| s.start.z < below || s.end.z < below)
        {
            return Err(GeometryError::BelowGround { segment: seg.id });
        }
    }

    validate_pairs(segments)
}

/// Reject duplicate, overlapping and crossing segment pairs.
fn validate_pairs(segments: &[Segment]) -> GeometryResult<()> {
    let found = (0..segments.len()).into_par_iter().find_map_first(|i| {
        segments[i + 1..]
            .iter()
            .find_map(|b| check_pair(&segments[i], b).err())
    });
    match found {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn check_pair(a: &Segment, b: &Segment) -> GeometryResult<()> {
    let tol = JUNCTION_TOL * a.length().min(b.length());
    let same = |p: &Vec3, q: &Vec3| (p - q).norm() <= tol;

    if (same(&a.start, &b.start) && same(&a.end, &b.end))
        || (same(&a.start, &b.end) && same(&a.end, &b.start))
    {
        return Err(GeometryError::DuplicateSegment {
            first: a.id,
            second: b.id,
        });
    }

    let d1 = a.vector();
    let d2 = b.vector();
    let cross = d1.cross(&d2);
    let parallel = cross.norm() <= 1e-9 * d1.norm() * d2.norm();

    if parallel {
        // Distance from b's start to a's line
        let off = b.start - a.start;
        let line_dist = off.cross(&d1).norm() / d1.norm();
        if line_dist > tol {
            return Ok(());
        }
        // Collinear: overlap of b's projection onto a, in a's length units
        let len = d1.norm();
        let u = d1 / len;
        let p0 = (b.start - a.start).dot(&u);
        let p1 = (b.end - a.start).dot(&u);
        let (lo, hi) = if p0 < p1 { (p0, p1) } else { (p1, p0) };
        let overlap = hi.min(len) - lo.max(0.0);
        if overlap > tol {
            return Err(GeometryError::CrossingSegments {
                first: a.id,
                second: b.id,
            });
        }
        return Ok(());
    }

    let (s, t) = closest_params(a, b);
    let pa = a.start + d1 * s;
    let pb = b.start + d2 * t;
    if (pa - pb).norm() > tol {
        return Ok(());
    }

    let at_end = |x: Real| x <= PARAM_TOL || x >= 1.0 - PARAM_TOL;
    let shared_endpoint = [a.start, a.end]
        .iter()
        .any(|p| same(p, &b.start) || same(p, &b.end));
    if at_end(s) && at_end(t) && shared_endpoint {
        return Ok(());
    }
    Err(GeometryError::CrossingSegments {
        first: a.id,
        second: b.id,
    })
}

/// Parameters (s, t) in [0, 1] of the closest points of two non-parallel segments.
fn closest_params(a: &Segment, b: &Segment) -> (Real, Real) {
    let d1 = a.vector();
    let d2 = b.vector();
    let r = a.start - b.start;
    let aa = d1.dot(&d1);
    let ee = d2.dot(&d2);
    let f = d2.dot(&r);
    let c = d1.dot(&r);
    let bb = d1.dot(&d2);
    let denom = aa * ee - bb * bb;

    let mut s = ((bb * f - c * ee) / denom).clamp(0.0, 1.0);
    let mut t = (bb * s + f) / ee;
    if t < 0.0 {
        t = 0.0;
        s = (-c / aa).clamp(0.0, 1.0);
    } else if t > 1.0 {
        t = 1.0;
        s = ((bb - c) / aa).clamp(0.0, 1.0);
    }
    (s, t)
}

/// Determine, for both ends of every segment, what the current connects to.
pub(crate) fn build_connections(
    segments: &[Segment],
    ground_plane: GroundPlaneMode,
) -> Vec<[EndConnection; 2]> {
    let classify = |i: usize, side: SegmentEnd| -> EndConnection {
        let seg = &segments[i];
        let p = seg.endpoint(side);
        let mut joined = Vec::new();
        for (j, other) in segments.iter().enumerate() {
            if j == i {
                continue;
            }
            let tol = JUNCTION_TOL * seg.length().min(other.length());
            for other_side in [SegmentEnd::Start, SegmentEnd::End] {
                if (other.endpoint(other_side) - p).norm() <= tol {
                    joined.push((j, other_side));
                }
            }
        }
        if !joined.is_empty() {
            return EndConnection::Junction(joined);
        }
        let on_ground = p.z.abs() <= JUNCTION_TOL * seg.length();
        match ground_plane {
            GroundPlaneMode::CurrentExpansionModified if on_ground => EndConnection::Grounded,
            _ => EndConnection::Free,
        }
    };

    (0..segments.len())
        .into_par_iter()
        .map(|i| [classify(i, SegmentEnd::Start), classify(i, SegmentEnd::End)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{GeometryBuilder, WireSpec};
    use nec_core::vec3;

    fn seal(wires: &[WireSpec], mode: GroundPlaneMode) -> GeometryResult<crate::Geometry> {
        let mut b = GeometryBuilder::new();
        for w in wires {
            b.add_wire(w.clone())?;
        }
        b.seal(mode)
    }

    #[test]
    fn empty_geometry_is_rejected() {
        assert_eq!(
            seal(&[], GroundPlaneMode::NoGround).unwrap_err(),
            GeometryError::Empty
        );
    }

    #[test]
    fn crossing_wires_are_rejected() {
        let err = seal(
            &[
                WireSpec::new(1, 3, vec3(-1.0, 0.0, 1.0), vec3(1.0, 0.0, 1.0), 0.001),
                WireSpec::new(2, 3, vec3(0.0, -1.0, 1.0), vec3(0.0, 1.0, 1.0), 0.001),
            ],
            GroundPlaneMode::NoGround,
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::CrossingSegments { .. }));
    }

    #[test]
    fn wires_meeting_at_segment_ends_form_junction() {
        let g = seal(
            &[
                WireSpec::new(1, 2, vec3(-1.0, 0.0, 1.0), vec3(1.0, 0.0, 1.0), 0.001),
                WireSpec::new(2, 2, vec3(0.0, -1.0, 1.0), vec3(0.0, 1.0, 1.0), 0.001),
            ],
            GroundPlaneMode::NoGround,
        )
        .unwrap();
        match g.connection(0, SegmentEnd::End) {
            EndConnection::Junction(list) => assert_eq!(list.len(), 3),
            other => panic!("expected junction, got {other:?}"),
        }
    }

    #[test]
    fn endpoint_on_segment_interior_is_rejected() {
        let err = seal(
            &[
                WireSpec::new(1, 1, vec3(-1.0, 0.0, 1.0), vec3(1.0, 0.0, 1.0), 0.001),
                WireSpec::new(2, 1, vec3(0.0, 0.0, 1.0), vec3(0.0, 1.0, 1.0), 0.001),
            ],
            GroundPlaneMode::NoGround,
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::CrossingSegments { .. }));
    }

    #[test]
    fn duplicate_segments_are_rejected() {
        let err = seal(
            &[
                WireSpec::new(1, 1, vec3(0.0, 0.0, 1.0), vec3(0.0, 0.0, 2.0), 0.001),
                WireSpec::new(2, 1, vec3(0.0, 0.0, 2.0), vec3(0.0, 0.0, 1.0), 0.001),
            ],
            GroundPlaneMode::NoGround,
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::DuplicateSegment { .. }));
    }

    #[test]
    fn overlapping_collinear_wires_are_rejected() {
        let err = seal(
            &[
                WireSpec::new(1, 1, vec3(0.0, 0.0, 1.0), vec3(0.0, 0.0, 3.0), 0.001),
                WireSpec::new(2, 1, vec3(0.0, 0.0, 2.0), vec3(0.0, 0.0, 4.0), 0.001),
            ],
            GroundPlaneMode::NoGround,
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::CrossingSegments { .. }));
    }

    #[test]
    fn parallel_wires_are_fine() {
        assert!(
            seal(
                &[
                    WireSpec::new(1, 3, vec3(0.0, 0.0, 1.0), vec3(0.0, 0.0, 3.0), 0.001),
                    WireSpec::new(2, 3, vec3(0.5, 0.0, 1.0), vec3(0.5, 0.0, 3.0), 0.001),
                ],
                GroundPlaneMode::NoGround,
            )
            .is_ok()
        );
    }

    #[test]
    fn below_ground_only_matters_with_ground() {
        let w = [WireSpec::new(
            1,
            3,
            vec3(0.0, 0.0, -1.0),
            vec3(0.0, 0.0, 1.0),
            0.001,
        )];
        assert!(seal(&w, GroundPlaneMode::NoGround).is_ok());
        assert!(matches!(
            seal(&w, GroundPlaneMode::CurrentExpansionModified),
            Err(GeometryError::BelowGround { .. })
        ));
    }

    #[test]
    fn grounded_end_depends_on_expansion_mode() {
        let w = [WireSpec::new(
            1,
            3,
            vec3(0.0, 0.0, 0.0),
            vec3(0.0, 0.0, 1.0),
            0.001,
        )];
        let g = seal(&w, GroundPlaneMode::CurrentExpansionModified).unwrap();
        assert_eq!(g.connection(0, SegmentEnd::Start), &EndConnection::Grounded);
        let g = seal(&w, GroundPlaneMode::CurrentExpansionUnmodified).unwrap();
        assert_eq!(g.connection(0, SegmentEnd::Start), &EndConnection::Free);
    }
}

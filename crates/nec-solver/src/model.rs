//! Current elements and charge cells derived from a sealed geometry.
//!
//! Every unknown is carried by a straight element: one per wire segment and
//! two crossed elements per surface patch. Each element is split at its
//! center into two half cells; the line charge on a half cell follows from
//! the current difference across it, with junction currents shared between
//! all elements meeting at a point.

use nec_core::{Real, Vec3};
use nec_geometry::{EndConnection, Geometry, SegmentEnd};

/// What an element discretizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSource {
    Segment(usize),
    /// Patch index and tangent component (0 for t1, 1 for t2).
    Patch(usize, u8),
}

/// Straight current element carrying one unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub source: ElementSource,
    pub start: Vec3,
    pub end: Vec3,
    pub radius: Real,
}

impl Element {
    pub fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    pub fn vector(&self) -> Vec3 {
        self.end - self.start
    }

    pub fn length(&self) -> Real {
        self.vector().norm()
    }

    pub fn direction(&self) -> Vec3 {
        self.vector() / self.length()
    }
}

/// Half of an element carrying a uniform line charge.
///
/// `charge` lists `(unknown, c)` so that the line charge density is
/// `(j / omega) * sum(c * I_unknown)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HalfCell {
    pub element: usize,
    pub start: Vec3,
    pub end: Vec3,
    pub radius: Real,
    pub charge: Vec<(usize, Real)>,
}

/// Frequency independent discretization of a structure.
#[derive(Debug, Clone)]
pub struct FieldModel {
    pub elements: Vec<Element>,
    pub half_cells: Vec<HalfCell>,
    segment_count: usize,
}

impl FieldModel {
    pub fn from_geometry(geometry: &Geometry) -> Self {
        let mut elements = Vec::with_capacity(geometry.unknown_count());
        for (i, seg) in geometry.segments().iter().enumerate() {
            elements.push(Element {
                source: ElementSource::Segment(i),
                start: seg.start,
                end: seg.end,
                radius: seg.radius,
            });
        }
        for (p, patch) in geometry.patches().iter().enumerate() {
            let side = patch.characteristic_length();
            for (component, t) in [(0u8, patch.t1), (1u8, patch.t2)] {
                let half = t * (0.5 * side);
                elements.push(Element {
                    source: ElementSource::Patch(p, component),
                    start: patch.center - half,
                    end: patch.center + half,
                    // equivalent radius of a flat strip
                    radius: 0.25 * side,
                });
            }
        }

        let segment_count = geometry.segments().len();
        let mut half_cells = Vec::with_capacity(2 * elements.len());
        for (k, element) in elements.iter().enumerate() {
            let ends = if k < segment_count {
                [
                    junction_current(k, SegmentEnd::Start, geometry.connection(k, SegmentEnd::Start)),
                    junction_current(k, SegmentEnd::End, geometry.connection(k, SegmentEnd::End)),
                ]
            } else {
                [Vec::new(), Vec::new()]
            };
            let half_length = 0.5 * element.length();
            let center = element.center();

            // Start half: I_k minus the current at the start point.
            let mut minus = vec![(k, 1.0)];
            for &(n, c) in &ends[0] {
                accumulate(&mut minus, n, -c);
            }
            // End half: current at the end point minus I_k.
            let mut plus = ends[1].clone();
            accumulate(&mut plus, k, -1.0);

            for (cell_start, cell_end, coeffs) in
                [(element.start, center, minus), (center, element.end, plus)]
            {
                half_cells.push(HalfCell {
                    element: k,
                    start: cell_start,
                    end: cell_end,
                    radius: element.radius,
                    charge: coeffs
                        .into_iter()
                        .filter(|&(_, c)| c != 0.0)
                        .map(|(n, c)| (n, c / half_length))
                        .collect(),
                });
            }
        }

        Self {
            elements,
            half_cells,
            segment_count,
        }
    }

    pub fn unknown_count(&self) -> usize {
        self.elements.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Largest distance of any element end from the origin.
    pub fn extent(&self) -> Real {
        self.elements
            .iter()
            .flat_map(|e| [e.start.norm(), e.end.norm()])
            .fold(0.0, Real::max)
    }
}

fn accumulate(terms: &mut Vec<(usize, Real)>, index: usize, c: Real) {
    match terms.iter_mut().find(|(n, _)| *n == index) {
        Some((_, existing)) => *existing += c,
        None => terms.push((index, c)),
    }
}

/// Current at one end of segment `k`, flowing along the segment direction,
/// as a combination of element currents.
///
/// At a junction the excess inflow is shared equally so that Kirchhoff's
/// current law holds at the junction point.
fn junction_current(k: usize, side: SegmentEnd, connection: &EndConnection) -> Vec<(usize, Real)> {
    match connection {
        EndConnection::Free => Vec::new(),
        EndConnection::Grounded => vec![(k, 1.0)],
        EndConnection::Junction(others) => {
            let own = side.inflow_sign();
            let members = others.len() as Real + 1.0;
            let mut terms = vec![(k, 1.0 - own * own / members)];
            for &(m, other_side) in others {
                accumulate(&mut terms, m, -own * other_side.inflow_sign() / members);
            }
            terms
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nec_core::vec3;
    use nec_geometry::{GeometryBuilder, GroundPlaneMode, WireSpec};

    fn wire(count: u32, z0: Real, z1: Real) -> Geometry {
        let mut b = GeometryBuilder::new();
        b.add_wire(WireSpec::new(1, count, vec3(0.0, 0.0, z0), vec3(0.0, 0.0, z1), 0.01))
            .unwrap();
        b.seal(GroundPlaneMode::NoGround).unwrap()
    }

    #[test]
    fn chain_junction_averages_neighbours() {
        let model = FieldModel::from_geometry(&wire(3, 0.0, 3.0));
        assert_eq!(model.unknown_count(), 3);
        assert_eq!(model.half_cells.len(), 6);
        // End half of the middle element: (I1 + I2)/2 - I1 over 0.5 m.
        let cell = &model.half_cells[3];
        assert_eq!(cell.element, 1);
        let c1 = cell.charge.iter().find(|(n, _)| *n == 1).unwrap().1;
        let c2 = cell.charge.iter().find(|(n, _)| *n == 2).unwrap().1;
        assert!((c1 + 1.0).abs() < 1e-12);
        assert!((c2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn free_ends_carry_full_charge() {
        let model = FieldModel::from_geometry(&wire(2, 0.0, 2.0));
        // Start half of the first element has only I0 / 0.5.
        assert_eq!(model.half_cells[0].charge, vec![(0, 2.0)]);
        // End half of the last element has -I1 / 0.5.
        assert_eq!(model.half_cells[3].charge, vec![(1, -2.0)]);
    }

    #[test]
    fn grounded_end_has_no_charge() {
        let mut b = GeometryBuilder::new();
        b.add_wire(WireSpec::new(1, 2, vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, 1.0), 0.01))
            .unwrap();
        let g = b.seal(GroundPlaneMode::CurrentExpansionModified).unwrap();
        let model = FieldModel::from_geometry(&g);
        assert!(model.half_cells[0].charge.is_empty());
    }

    #[test]
    fn junction_currents_satisfy_kirchhoff() {
        // Three segments meeting at the origin.
        let conn = EndConnection::Junction(vec![(1, SegmentEnd::Start), (2, SegmentEnd::Start)]);
        let currents = [1.5, -0.25, 0.75];
        let end_current = |k: usize, side: SegmentEnd, c: &EndConnection| -> Real {
            junction_current(k, side, c)
                .iter()
                .map(|&(n, w)| w * currents[n])
                .sum()
        };
        let i0 = end_current(0, SegmentEnd::End, &conn);
        let c1 = EndConnection::Junction(vec![(0, SegmentEnd::End), (2, SegmentEnd::Start)]);
        let c2 = EndConnection::Junction(vec![(0, SegmentEnd::End), (1, SegmentEnd::Start)]);
        let i1 = end_current(1, SegmentEnd::Start, &c1);
        let i2 = end_current(2, SegmentEnd::Start, &c2);
        // Inflow from segment 0 equals outflow into 1 and 2.
        assert!((i0 - i1 - i2).abs() < 1e-12);
    }

    #[test]
    fn patches_add_two_crossed_elements() {
        use nec_geometry::PatchShape;
        let mut b = GeometryBuilder::new();
        b.add_patch(PatchShape::Arbitrary {
            center: vec3(0.0, 0.0, 1.0),
            elevation_deg: 90.0,
            azimuth_deg: 0.0,
            area: 0.04,
        })
        .unwrap();
        let g = b.seal(GroundPlaneMode::NoGround).unwrap();
        let model = FieldModel::from_geometry(&g);
        assert_eq!(model.unknown_count(), 2);
        let (a, b) = (&model.elements[0], &model.elements[1]);
        assert!(a.direction().dot(&b.direction()).abs() < 1e-12);
        assert!((a.length() - 0.2).abs() < 1e-12);
        assert_eq!(a.center(), vec3(0.0, 0.0, 1.0));
    }
}

//! Surface patches.

use nec_core::{PatchId, Real, Vec3, vec3};

use crate::error::{GeometryError, GeometryResult};

/// Patch shape selector used by the surface-patch directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    Arbitrary,
    Rectangular,
    Triangular,
    Quadrilateral,
}

impl PatchKind {
    /// Number of extra corners the continuation directive must supply.
    pub fn continuation_corners(self) -> usize {
        match self {
            PatchKind::Arbitrary => 0,
            PatchKind::Rectangular | PatchKind::Triangular => 1,
            PatchKind::Quadrilateral => 2,
        }
    }
}

/// Fully specified patch input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatchShape {
    /// Center, outward normal angles (degrees) and area (m^2).
    Arbitrary {
        center: Vec3,
        elevation_deg: Real,
        azimuth_deg: Real,
        area: Real,
    },
    /// Three consecutive corners; the fourth is implied.
    Rectangular { c1: Vec3, c2: Vec3, c3: Vec3 },
    Triangular { c1: Vec3, c2: Vec3, c3: Vec3 },
    Quadrilateral { c1: Vec3, c2: Vec3, c3: Vec3, c4: Vec3 },
}

impl PatchShape {
    pub fn kind(&self) -> PatchKind {
        match self {
            PatchShape::Arbitrary { .. } => PatchKind::Arbitrary,
            PatchShape::Rectangular { .. } => PatchKind::Rectangular,
            PatchShape::Triangular { .. } => PatchKind::Triangular,
            PatchShape::Quadrilateral { .. } => PatchKind::Quadrilateral,
        }
    }
}

/// A surface element carrying two orthogonal unknown current components.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub id: PatchId,
    pub kind: PatchKind,
    pub center: Vec3,
    /// Unit outward normal.
    pub normal: Vec3,
    /// Unit tangents with `t1 x t2 = normal`.
    pub t1: Vec3,
    pub t2: Vec3,
    pub area: Real,
}

impl Patch {
    pub fn from_shape(id: PatchId, shape: &PatchShape) -> GeometryResult<Self> {
        let finite = |v: &Vec3| v.iter().all(|c| c.is_finite());
        let (center, normal, t1, area) = match *shape {
            PatchShape::Arbitrary {
                center,
                elevation_deg,
                azimuth_deg,
                area,
            } => {
                if !finite(&center) || !elevation_deg.is_finite() || !azimuth_deg.is_finite() {
                    return Err(GeometryError::InvalidPatch {
                        what: "non-finite coordinate",
                    });
                }
                let (se, ce) = elevation_deg.to_radians().sin_cos();
                let (sa, ca) = azimuth_deg.to_radians().sin_cos();
                let normal = vec3(ce * ca, ce * sa, se);
                let t1 = vec3(-sa, ca, 0.0);
                (center, normal, t1, area)
            }
            PatchShape::Rectangular { c1, c2, c3 } => {
                let e1 = c2 - c1;
                let e2 = c3 - c2;
                let n = e1.cross(&e2);
                (
                    (c1 + c3) * 0.5,
                    unit(&n)?,
                    unit(&e1)?,
                    e1.norm() * e2.norm(),
                )
            }
            PatchShape::Triangular { c1, c2, c3 } => {
                let e1 = c2 - c1;
                let n = e1.cross(&(c3 - c2));
                (
                    (c1 + c2 + c3) / 3.0,
                    unit(&n)?,
                    unit(&e1)?,
                    0.5 * n.norm(),
                )
            }
            PatchShape::Quadrilateral { c1, c2, c3, c4 } => {
                let n = (c3 - c1).cross(&(c4 - c2));
                let normal = unit(&n)?;
                let e1 = c2 - c1;
                let t1 = unit(&(e1 - normal * normal.dot(&e1)))?;
                ((c1 + c2 + c3 + c4) * 0.25, normal, t1, 0.5 * n.norm())
            }
        };

        if !(area.is_finite() && area > 0.0) {
            return Err(GeometryError::InvalidPatch {
                what: "area must be positive",
            });
        }
        let t2 = normal.cross(&t1);
        Ok(Self {
            id,
            kind: shape.kind(),
            center,
            normal,
            t1,
            t2,
            area,
        })
    }

    /// Side length of the square with the patch area.
    pub fn characteristic_length(&self) -> Real {
        self.area.sqrt()
    }
}

fn unit(v: &Vec3) -> GeometryResult<Vec3> {
    let n = v.norm();
    if n.is_finite() && n > 0.0 {
        Ok(v / n)
    } else {
        Err(GeometryError::InvalidPatch {
            what: "corners are degenerate",
        })
    }
}

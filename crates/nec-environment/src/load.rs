//! Lumped and distributed segment loading.

use nec_core::{Cplx, Real, ensure_finite, ensure_positive};
use nec_geometry::Tag;

use crate::error::{EnvironmentError, EnvironmentResult};

/// Segments addressed by a load: ordinals `first..=last` within `tag`.
///
/// `first = last = 0` selects every segment with the tag; with tag 0 the
/// ordinals are absolute segment numbers and 0/0 selects the whole structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRange {
    pub tag: Tag,
    pub first: u32,
    pub last: u32,
}

impl SegmentRange {
    pub fn new(tag: Tag, first: u32, last: u32) -> EnvironmentResult<Self> {
        if (first == 0) != (last == 0) || last < first {
            return Err(EnvironmentError::Invalid {
                what: "segment range must be 0..0 or first <= last",
            });
        }
        Ok(Self { tag, first, last })
    }

    pub fn whole_tag(tag: Tag) -> Self {
        Self {
            tag,
            first: 0,
            last: 0,
        }
    }

    pub fn single(tag: Tag, ordinal: u32) -> Self {
        Self {
            tag,
            first: ordinal,
            last: ordinal,
        }
    }

    pub fn is_whole_tag(&self) -> bool {
        self.first == 0
    }
}

/// Electrical description of a load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadKind {
    /// R + jwL + 1/(jwC) per segment; C = 0 means no capacitor.
    SeriesRlc { r: Real, l: Real, c: Real },
    /// R || L || C per segment; zero values are omitted.
    ParallelRlc { r: Real, l: Real, c: Real },
    /// Series RLC with values per meter of wire.
    SeriesRlcPerLength { r: Real, l: Real, c: Real },
    /// Parallel RLC with values per meter of wire.
    ParallelRlcPerLength { r: Real, l: Real, c: Real },
    /// Fixed impedance R + jX per segment.
    FixedImpedance { r: Real, x: Real },
    /// Finite wire conductivity (S/m), skin-effect impedance.
    WireConductivity { sigma: Real },
}

impl LoadKind {
    pub fn validate(&self) -> EnvironmentResult<()> {
        match *self {
            LoadKind::SeriesRlc { r, l, c }
            | LoadKind::ParallelRlc { r, l, c }
            | LoadKind::SeriesRlcPerLength { r, l, c }
            | LoadKind::ParallelRlcPerLength { r, l, c } => {
                for v in [r, l, c] {
                    if ensure_finite(v, "load value")? < 0.0 {
                        return Err(EnvironmentError::Invalid {
                            what: "load values must not be negative",
                        });
                    }
                }
                Ok(())
            }
            LoadKind::FixedImpedance { r, x } => {
                ensure_finite(r, "load resistance")?;
                ensure_finite(x, "load reactance")?;
                Ok(())
            }
            LoadKind::WireConductivity { sigma } => {
                ensure_positive(sigma, "wire conductivity")?;
                Ok(())
            }
        }
    }

    /// Impedance added in series with a segment of `length` and `radius`.
    pub fn impedance(&self, omega: Real, length: Real, radius: Real, permeability: Real) -> Cplx {
        let jw = Cplx::new(0.0, omega);
        let series = |r: Real, l: Real, c: Real| {
            let mut z = Cplx::new(r, 0.0) + jw * l;
            if c != 0.0 {
                z += (jw * c).inv();
            }
            z
        };
        let parallel = |r: Real, l: Real, c: Real| {
            let mut y = jw * c;
            if r != 0.0 {
                y += 1.0 / r;
            }
            if l != 0.0 {
                y += (jw * l).inv();
            }
            if y == Cplx::new(0.0, 0.0) {
                Cplx::new(0.0, 0.0)
            } else {
                y.inv()
            }
        };
        match *self {
            LoadKind::SeriesRlc { r, l, c } => series(r, l, c),
            LoadKind::ParallelRlc { r, l, c } => parallel(r, l, c),
            LoadKind::SeriesRlcPerLength { r, l, c } => series(r, l, c) * length,
            LoadKind::ParallelRlcPerLength { r, l, c } => parallel(r, l, c) * length,
            LoadKind::FixedImpedance { r, x } => Cplx::new(r, x),
            LoadKind::WireConductivity { sigma } => {
                let surface = (jw * permeability / sigma).sqrt();
                surface * (length / (2.0 * core::f64::consts::PI * radius))
            }
        }
    }
}

/// A load applied to a range of segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Load {
    pub range: SegmentRange,
    pub kind: LoadKind,
}

impl Load {
    pub fn new(range: SegmentRange, kind: LoadKind) -> EnvironmentResult<Self> {
        kind.validate()?;
        Ok(Self { range, kind })
    }
}

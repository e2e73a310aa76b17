//! Wire kernel options.

use nec_core::{Real, ensure_positive};

use crate::error::EnvironmentResult;

/// Thin-wire kernel used for the interaction matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireKernel {
    /// Reduced kernel with the source radius only.
    #[default]
    Thin,
    /// Extended kernel that also accounts for the observer radius; better
    /// for thick wires and closely spaced parallel segments.
    Extended,
}

/// Distance (in wavelengths) beyond which interactions use a single-point
/// approximation instead of full quadrature.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionRange(Option<Real>);

impl InteractionRange {
    pub fn unlimited() -> Self {
        Self(None)
    }

    pub fn wavelengths(range: Real) -> EnvironmentResult<Self> {
        Ok(Self(Some(ensure_positive(range, "interaction range")?)))
    }

    pub fn get(&self) -> Option<Real> {
        self.0
    }
}

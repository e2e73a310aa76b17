//! Method-of-moments tunables.

use nec_core::Real;

/// Quadrature and conditioning settings for [`crate::MomSolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomConfig {
    /// Gauss-Legendre points for source cells near the observer.
    pub near_quadrature: usize,
    /// Gauss-Legendre points for distant source cells.
    pub far_quadrature: usize,
    /// Observer distances below this many cell lengths count as near.
    pub near_distance: Real,
    /// Smallest |pivot| relative to the largest one before the LU is
    /// declared singular.
    pub pivot_ratio: Real,
}

impl Default for MomConfig {
    fn default() -> Self {
        Self {
            near_quadrature: 16,
            far_quadrature: 4,
            near_distance: 3.0,
            pivot_ratio: 1e-13,
        }
    }
}

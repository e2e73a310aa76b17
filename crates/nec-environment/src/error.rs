//! Environment parameter errors.

use nec_core::CoreError;
use thiserror::Error;

pub type EnvironmentResult<T> = Result<T, EnvironmentError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvironmentError {
    /// Parameter outside its legal range.
    #[error("Invalid parameter: {what}")]
    Invalid { what: &'static str },

    /// Ground screen or cliff given without a finite ground.
    #[error("{what} requires a finite ground")]
    RequiresFiniteGround { what: &'static str },

    /// Transmission line length makes the admittance matrix singular.
    #[error("Transmission line between segments {port1} and {port2} is a multiple of a half wavelength")]
    ResonantLine { port1: usize, port2: usize },

    #[error(transparent)]
    Core(#[from] CoreError),
}

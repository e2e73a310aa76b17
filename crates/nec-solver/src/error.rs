//! Error types for solver operations.

use nec_environment::EnvironmentError;
use nec_geometry::GeometryError;
use thiserror::Error;

/// Errors raised by the numerical solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Interaction matrix is singular: {what}")]
    Singular { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Active excitation is not a voltage source")]
    NoVoltageSource,

    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

pub type SolverResult<T> = Result<T, SolverError>;

//! Error types for the simulation context.

use nec_environment::EnvironmentError;
use nec_geometry::GeometryError;
use nec_solver::SolverError;

/// Category of a [`NecError`], for callers that branch on the kind of
/// failure without inspecting its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidGeometry,
    EmptyGeometry,
    Sequence,
    SolveFailure,
    NoPatternRequested,
    InvalidParameter,
    NoInputImpedance,
    Composite,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NecError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(GeometryError),

    #[error("Geometry has no segments or patches")]
    EmptyGeometry,

    #[error("{operation} is not allowed while the context is {phase}")]
    Sequence {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("Solve failed: {message}")]
    SolveFailure { message: String },

    #[error("No radiation pattern with total gain normalization was requested for step {step}")]
    NoPatternRequested { step: usize },

    #[error("Invalid parameter: {what}")]
    InvalidParameter { what: String },

    #[error("No input impedance at step {step}: the excitation is not a voltage source")]
    NoInputImpedance { step: usize },

    #[error("{}", join(.0))]
    Composite(Vec<NecError>),
}

fn join(errors: &[NecError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" :: ")
}

impl NecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NecError::InvalidGeometry(_) => ErrorKind::InvalidGeometry,
            NecError::EmptyGeometry => ErrorKind::EmptyGeometry,
            NecError::Sequence { .. } => ErrorKind::Sequence,
            NecError::SolveFailure { .. } => ErrorKind::SolveFailure,
            NecError::NoPatternRequested { .. } => ErrorKind::NoPatternRequested,
            NecError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            NecError::NoInputImpedance { .. } => ErrorKind::NoInputImpedance,
            NecError::Composite(_) => ErrorKind::Composite,
        }
    }

    /// Kinds of the underlying failures, flattening composites.
    pub fn leaf_kinds(&self) -> Vec<ErrorKind> {
        match self {
            NecError::Composite(errors) => errors.iter().flat_map(NecError::leaf_kinds).collect(),
            other => vec![other.kind()],
        }
    }

    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        NecError::InvalidParameter { what: what.into() }
    }
}

impl From<GeometryError> for NecError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::Empty => NecError::EmptyGeometry,
            other => NecError::InvalidGeometry(other),
        }
    }
}

impl From<EnvironmentError> for NecError {
    fn from(err: EnvironmentError) -> Self {
        match err {
            EnvironmentError::RequiresFiniteGround { what } => NecError::Sequence {
                operation: what,
                phase: "without a finite ground",
            },
            other => NecError::invalid(other.to_string()),
        }
    }
}

impl From<SolverError> for NecError {
    fn from(err: SolverError) -> Self {
        NecError::SolveFailure {
            message: err.to_string(),
        }
    }
}

impl From<nec_core::CoreError> for NecError {
    fn from(err: nec_core::CoreError) -> Self {
        NecError::invalid(err.to_string())
    }
}

pub type NecResult<T> = Result<T, NecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_message_lists_every_failure() {
        let err = NecError::Composite(vec![
            NecError::NoPatternRequested { step: 0 },
            NecError::NoInputImpedance { step: 0 },
        ]);
        let msg = err.to_string();
        assert!(msg.contains(" :: "));
        assert!(msg.contains("No radiation pattern"));
        assert!(msg.contains("No input impedance"));
        assert_eq!(err.kind(), ErrorKind::Composite);
        assert_eq!(
            err.leaf_kinds(),
            vec![ErrorKind::NoPatternRequested, ErrorKind::NoInputImpedance]
        );
    }

    #[test]
    fn geometry_errors_split_by_kind() {
        assert_eq!(NecError::from(GeometryError::Empty).kind(), ErrorKind::EmptyGeometry);
        let pending: NecError = GeometryError::PendingPatch.into();
        assert_eq!(pending.kind(), ErrorKind::InvalidGeometry);
    }

    #[test]
    fn finite_ground_requirement_is_a_sequence_error() {
        let err: NecError = EnvironmentError::RequiresFiniteGround {
            what: "radial ground screen",
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Sequence);
    }
}

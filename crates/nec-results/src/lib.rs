//! nec-results: result sets produced by output requests, and their storage.

pub mod polarization;
pub mod stats;
pub mod store;
pub mod types;

pub use polarization::{PolarizationEllipse, PolarizationSense};
pub use stats::GainStats;
pub use store::{ResultKey, ResultSet, ResultStore};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No result for step {step}, request {request}")]
    NotFound { step: usize, request: u32 },
}

use thiserror::Error;

use crate::variography::model_variograms::iso_fitter::FitError;

/// Errors raised by the kriging engine.
///
/// `InsufficientData`, `NonFiniteSample`, `VariogramFit` and `InvalidGrid` abort a run
/// before any grid work starts. `SingularSystem` is local to one target point and is
/// recovered by the grid interpolator.
#[derive(Error, Debug)]
pub enum KrigingError {
    #[error("insufficient data: at least 3 samples are required, found {found}")]
    InsufficientData { found: usize },

    #[error("sample {index} has a non-finite coordinate or value")]
    NonFiniteSample { index: usize },

    #[error("variogram fit failed: {0}")]
    VariogramFit(#[from] FitError),

    #[error("singular kriging system: {reason}")]
    SingularSystem { reason: String },

    #[error("invalid grid: {reason}")]
    InvalidGrid { reason: String },

    #[error("field `{0}` does not exist in the input table")]
    UnknownField(String),

    #[error("could not parse field `{field}` on record {record}: `{value}`")]
    ParseField {
        field: String,
        record: usize,
        value: String,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KrigingError {
    pub(crate) fn singular(reason: impl Into<String>) -> Self {
        KrigingError::SingularSystem {
            reason: reason.into(),
        }
    }

    /// True for errors that only affect a single target point.
    pub fn is_local(&self) -> bool {
        matches!(self, KrigingError::SingularSystem { .. })
    }
}

pub type Result<T> = std::result::Result<T, KrigingError>;

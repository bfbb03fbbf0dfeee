use crate::utilities::validation::ValidationError;
use pyo3::exceptions::{PyArithmeticError, PyValueError, PyZeroDivisionError};
use pyo3::PyErr;
use thiserror::Error;

/// Coarse classification of a [`SurvivalError`].
///
/// `InvalidInput` means the caller supplied data the algorithms do not accept.
/// `DegenerateComputation` means the data was well-formed but cannot support the
/// requested statistic. `ArithmeticDomain` means a distribution was queried
/// outside its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    DegenerateComputation,
    ArithmeticDomain,
}

#[derive(Debug, Error)]
pub enum SurvivalError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
    /// Only reachable from hand-built intervals; estimator output always ends
    /// non-final intervals at a death.
    #[error("at-risk population exhausted after interval {interval}")]
    AtRiskExhausted { interval: usize },
    /// Only reachable from hand-built intervals, like `AtRiskExhausted`.
    #[error("empty risk set at sample {sample} of the log-rank walk")]
    EmptyRiskSet { sample: usize },
    #[error("degenerate cohort {cohort}: zero expected deaths")]
    ZeroExpectedDeaths { cohort: usize },
    #[error("chi-squared distribution needs at least 1 degree of freedom, got {degrees_of_freedom}")]
    ArithmeticDomain { degrees_of_freedom: usize },
}

impl SurvivalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SurvivalError::InvalidInput(_) => ErrorKind::InvalidInput,
            SurvivalError::AtRiskExhausted { .. }
            | SurvivalError::EmptyRiskSet { .. }
            | SurvivalError::ZeroExpectedDeaths { .. } => ErrorKind::DegenerateComputation,
            SurvivalError::ArithmeticDomain { .. } => ErrorKind::ArithmeticDomain,
        }
    }
}

impl From<SurvivalError> for PyErr {
    fn from(err: SurvivalError) -> PyErr {
        match err.kind() {
            ErrorKind::InvalidInput => PyValueError::new_err(err.to_string()),
            ErrorKind::DegenerateComputation => PyZeroDivisionError::new_err(err.to_string()),
            ErrorKind::ArithmeticDomain => PyArithmeticError::new_err(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SurvivalError>;

use thiserror::Error;

/// Typed errors surfaced at the pipeline boundary.
///
/// Malformed raw records never show up here: the builder drops them.
/// Empty results are not errors either.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid filter criteria: {reason}")]
    InvalidCriteria { reason: String },

    #[error("Invalid {what} limit: {value} (must be at least 1)")]
    InvalidLimit { what: &'static str, value: usize },

    #[error("Invalid feature weights: {reason}")]
    InvalidWeights { reason: String },

    #[error("Selected coin {symbol} is not among the current top gainers")]
    UnknownSelection { symbol: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl PipelineError {
    pub(crate) fn criteria(reason: impl Into<String>) -> Self {
        PipelineError::InvalidCriteria {
            reason: reason.into(),
        }
    }
}

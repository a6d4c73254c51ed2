//! Typed errors for selection changes and fetch failures.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// A chain needs a parent and a dependent stage at minimum.
    #[error("resolver needs at least 2 stages, got {0}")]
    TooFewStages(usize),

    #[error("stage {stage} out of range (resolver has {len} stages)")]
    StageOutOfRange { stage: usize, len: usize },

    /// The value is not among the stage's current options, or an earlier
    /// stage is still unselected.
    #[error("invalid selection {value:?} for stage {stage}")]
    InvalidSelection { stage: usize, value: String },

    #[error("failed to fetch options for stage {stage} (prefix {prefix:?}): {message}")]
    OptionsFetchFailed {
        stage: usize,
        prefix: Vec<String>,
        message: String,
    },

    #[error("failed to fetch result for {selections:?}: {message}")]
    ResultFetchFailed {
        selections: Vec<String>,
        message: String,
    },
}

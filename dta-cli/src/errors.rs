//! Top-level error type for the `dta-learn` binary.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },

    #[error(transparent)]
    Format(#[from] dta_format::FormatError),

    #[error(transparent)]
    Learner(#[from] dta_learner::LearnerError),
}

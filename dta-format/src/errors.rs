//! Error types for importing/exporting the JSON persistence format.

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unknown clock {0:?}")]
    UnknownClock(String),

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("unknown location {0:?}")]
    UnknownLocation(String),

    #[error("invalid interval {0:?}")]
    InvalidInterval(String),

    #[error(transparent)]
    Atom(#[from] dta_constraints::AtomError),

    #[error(transparent)]
    Constraint(#[from] dta_constraints::ConstraintError),

    #[error(transparent)]
    Model(#[from] dta_automaton::ModelError),
}

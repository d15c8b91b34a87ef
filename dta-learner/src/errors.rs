//! Error types for the observation table and the learner loop.

// TABLE ERROR
// ================================================================================================

/// Error raised while filling or extending an [`crate::table::ObservationTable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error(transparent)]
    Word(#[from] dta_automaton::WordError),
    #[error(transparent)]
    Model(#[from] dta_automaton::ModelError),
    #[error(transparent)]
    Constraint(#[from] dta_constraints::ConstraintError),
}

// LEARNER ERROR
// ================================================================================================

/// Error raised by [`crate::engine::learn`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LearnerError {
    #[error(transparent)]
    Table(#[from] TableError),
    /// The priority queue ran dry (or hit its guess budget) without the
    /// hypothesis ever passing an equivalence query.
    #[error("learner exhausted its guess budget without converging; most frequent failure: {0}")]
    Exhausted(String),
}

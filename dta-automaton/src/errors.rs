//! Error types for the DTA model, runtime, and witness search.

// MODEL ERROR
// ================================================================================================

/// Error raised while building or mutating a [`crate::model::Dta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("unknown location id {0}")]
    UnknownLocation(u32),
    #[error("unknown action id {0}")]
    UnknownAction(u32),
    #[error(transparent)]
    Constraint(#[from] dta_constraints::ConstraintError),
    #[error(transparent)]
    Zone(#[from] dta_zones::ZoneError),
}

// WORD ERROR
// ================================================================================================

/// Error raised while converting between word variants or executing one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WordError {
    #[error("negative delay: {0}")]
    NegativeDelay(String),
    #[error("inconsistent timing across reset-clock word steps")]
    InconsistentTiming,
    #[error("no feasible delay satisfies the required guard or region")]
    Infeasible,
    #[error(transparent)]
    Model(#[from] ModelError),
}

//! Error types for exact arithmetic, identity-typed entities, and clock valuations.

// RATIONAL ERROR
// ================================================================================================

/// Error returned by [`crate::rational::Rational`] arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RationalError {
    #[error("invalid rational: 0/0")]
    ZeroOverZero,
    #[error("invalid rational: infinity minus infinity")]
    InfinityMinusInfinity,
    #[error("operation is only defined on a finite rational")]
    NotFinite,
}

// ENTITY ERROR
// ================================================================================================

/// Error referencing a clock/action/location id that was never registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    #[error("unknown clock id {0}")]
    UnknownClock(u32),
    #[error("unknown action id {0}")]
    UnknownAction(u32),
    #[error("unknown location id {0}")]
    UnknownLocation(u32),
}

// VALUATION ERROR
// ================================================================================================

/// Error raised by [`crate::valuation::ClockValuation`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValuationError {
    #[error("negative delay: {0}")]
    NegativeDelay(String),
    #[error("unknown clock id {0}")]
    UnknownClock(u32),
}

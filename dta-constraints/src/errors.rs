//! Error types for the guard algebra.

// ATOM ERROR
// ================================================================================================

/// Error raised by [`crate::atom::AtomConstraint`] construction and negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AtomError {
    /// Constructing `c - c ⟨op⟩ V` where the relation can never hold for any
    /// valuation (the only atom-level contradictions).
    #[error("atom `c - c {0} {1}` is unsatisfiable for any valuation")]
    Contradiction(&'static str, String),
    /// Negating a self-difference atom (`c1 == c2`): the dual is not a
    /// single atom, only a tagged TRUE/FALSE status.
    #[error("atom is trivially true or false and has no single-atom negation")]
    Trivial,
}

// CONSTRAINT ERROR
// ================================================================================================

/// Error raised by conjunction/DNF operations across mismatched clock sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    #[error("operation applied to constraints over different clock sets")]
    ClockSetMismatch,
}

// ORACLE ERROR
// ================================================================================================

/// The decision procedure's verdict, including the conservative UNKNOWN case
/// (the oracle is an interface, not a specific solver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleVerdict {
    True,
    False,
    Unknown,
}

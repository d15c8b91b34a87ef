//! Error types for difference-bound matrix operations.

// ZONE ERROR
// ================================================================================================

/// Error raised by [`crate::dbm::Dbm`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ZoneError {
    #[error("clock set mismatch between zones")]
    ClockSetMismatch,
    #[error("unknown clock id {0}")]
    UnknownClock(u32),
}

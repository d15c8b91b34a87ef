//! Deterministic timed automaton model, runtime, structural analyses, and
//! zone-based witness search.

pub mod algorithms;
pub mod errors;
pub mod model;
pub mod runtime;
pub mod witness;
pub mod words;

pub use algorithms::{complement, intersect, is_complete, is_deterministic, to_cta};
pub use errors::{ModelError, WordError};
pub use model::{Dta, Transition, TransitionId};
pub use runtime::{ExecutionResult, RejectReason, Runtime, StepOutcome};
pub use witness::{find_witness, solve_delay, solve_delay_to_region};
pub use words::{
    ClockTimedWord, DelayTimedWord, RegionTimedWord, ResetClockTimedWord, ResetDelayTimedWord,
    ResetRegionTimedWord,
};

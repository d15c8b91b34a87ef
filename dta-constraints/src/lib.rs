//! Guard algebra over clock valuations: atomic difference constraints,
//! conjunctions, disjunctive normal form, regions, and a pluggable
//! satisfiability oracle.

pub mod atom;
pub mod constraint;
pub mod disjunctive;
pub mod errors;
pub mod oracle;
pub mod region;

pub use atom::AtomConstraint;
pub use constraint::{Constraint, Simplified, ValidityStatus};
pub use disjunctive::DisjunctiveConstraint;
pub use errors::{AtomError, ConstraintError, OracleVerdict};
pub use oracle::{ConstraintOracle, DifferenceLogicOracle};
pub use region::Region;

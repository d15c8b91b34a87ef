//! JSON persistence format for deterministic timed automata: the on-disk
//! document shape, the single-clock interval-string guard syntax, and
//! import/export against a live [`dta_automaton::Dta`].

pub mod document;
pub mod errors;
pub mod interval;
pub mod json;

pub use document::{DtaDocument, LocationDoc, TransitionDoc};
pub use errors::FormatError;
pub use interval::{format_interval, parse_interval};
pub use json::{export, import};

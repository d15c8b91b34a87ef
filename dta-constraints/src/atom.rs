//! Atomic difference constraints `c1 - c2 ⟨≤,<⟩ V`.

use dta_core::clock::ClockId;
use dta_core::rational::Rational;
use dta_core::valuation::ClockValuation;

use crate::errors::AtomError;

/// `c1 - c2 ⟨≤ if closed else <⟩ bound`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AtomConstraint {
    c1: ClockId,
    c2: ClockId,
    bound: Rational,
    closed: bool,
}

impl AtomConstraint {
    /// Builds `c1 - c2 ⟨op⟩ bound`, rejecting the only atom-level
    /// contradictions: `c1 == c2` with `(< , bound ≤ 0)` or `(≤, bound < 0)`.
    pub fn try_new(
        c1: ClockId,
        c2: ClockId,
        bound: Rational,
        closed: bool,
    ) -> Result<Self, AtomError> {
        if c1 == c2 {
            let contradiction = if closed {
                bound.is_negative()
            } else {
                bound.is_negative() || bound.is_zero()
            };
            if contradiction {
                let op = if closed { "<=" } else { "<" };
                return Err(AtomError::Contradiction(op, format!("{bound}")));
            }
        }
        Ok(AtomConstraint { c1, c2, bound, closed })
    }

    /// `c ⟨≤ if closed else <⟩ bound`, i.e. `c - x0 ⟨op⟩ bound`.
    pub fn upper(c: ClockId, bound: Rational, closed: bool) -> Result<Self, AtomError> {
        Self::try_new(c, ClockId::ZERO, bound, closed)
    }

    /// `c ⟨≥ if closed else >⟩ bound`, i.e. `x0 - c ⟨op⟩ -bound`.
    pub fn lower(c: ClockId, bound: Rational, closed: bool) -> Result<Self, AtomError> {
        Self::try_new(ClockId::ZERO, c, bound.neg(), closed)
    }

    /// `c >= 0`, the non-negativity atom added automatically for every
    /// non-zero clock.
    pub fn non_negative(c: ClockId) -> AtomConstraint {
        AtomConstraint { c1: ClockId::ZERO, c2: c, bound: Rational::zero(), closed: true }
    }

    pub fn c1(&self) -> ClockId {
        self.c1
    }

    pub fn c2(&self) -> ClockId {
        self.c2
    }

    pub fn bound(&self) -> &Rational {
        &self.bound
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_self_difference(&self) -> bool {
        self.c1 == self.c2
    }

    /// De Morgan dual: `¬(c1-c2 ≤ V) = c2-c1 < -V`, `¬(c1-c2 < V) = c2-c1 ≤ -V`.
    /// Fails with [`AtomError::Trivial`] on a self-difference atom, whose
    /// negation is a constant TRUE/FALSE rather than a single atom.
    pub fn negate(&self) -> Result<AtomConstraint, AtomError> {
        if self.is_self_difference() {
            return Err(AtomError::Trivial);
        }
        Ok(AtomConstraint {
            c1: self.c2,
            c2: self.c1,
            bound: self.bound.neg(),
            closed: !self.closed,
        })
    }

    /// Evaluates this atom against a concrete valuation.
    pub fn is_satisfied(&self, v: &ClockValuation) -> bool {
        let lhs = v.value(self.c1).expect("clock in domain");
        let rhs = v.value(self.c2).expect("clock in domain");
        let diff = lhs.checked_sub(rhs).expect("valuations are finite");
        if self.closed {
            diff <= self.bound
        } else {
            diff < self.bound
        }
    }
}

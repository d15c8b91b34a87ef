//! Disjunctive normal form over [`Constraint`]s sharing a clock set.

use dta_core::clock::ClockId;
use dta_core::valuation::ClockValuation;

use crate::constraint::{Constraint, Simplified};
use crate::errors::ConstraintError;
use crate::oracle::ConstraintOracle;

/// A set of conjunctions ("disjuncts") sharing a clock set. The empty set is
/// `FALSE`; a set containing a universally-true conjunction is `TRUE`.
#[derive(Clone, Debug, PartialEq)]
pub struct DisjunctiveConstraint {
    clocks: Vec<ClockId>,
    disjuncts: Vec<Constraint>,
}

impl DisjunctiveConstraint {
    pub fn new(clocks: Vec<ClockId>, disjuncts: Vec<Constraint>) -> Self {
        DisjunctiveConstraint { clocks, disjuncts }
    }

    pub fn false_(clocks: Vec<ClockId>) -> Self {
        DisjunctiveConstraint { clocks, disjuncts: Vec::new() }
    }

    pub fn true_(clocks: Vec<ClockId>) -> Self {
        let universal = Constraint::universal(clocks.clone());
        DisjunctiveConstraint { clocks, disjuncts: vec![universal] }
    }

    pub fn clocks(&self) -> &[ClockId] {
        &self.clocks
    }

    pub fn disjuncts(&self) -> &[Constraint] {
        &self.disjuncts
    }

    pub fn into_disjuncts(self) -> Vec<Constraint> {
        self.disjuncts
    }

    fn same_clocks(&self, other: &DisjunctiveConstraint) -> bool {
        self.clocks == other.clocks
    }

    pub fn or(&self, other: &DisjunctiveConstraint) -> Result<DisjunctiveConstraint, ConstraintError> {
        if !self.same_clocks(other) {
            return Err(ConstraintError::ClockSetMismatch);
        }
        let mut disjuncts = self.disjuncts.clone();
        disjuncts.extend(other.disjuncts.iter().cloned());
        Ok(DisjunctiveConstraint { clocks: self.clocks.clone(), disjuncts })
    }

    /// Distributes AND over every pair of disjuncts from `self` and `other`.
    pub fn and(&self, other: &DisjunctiveConstraint) -> Result<DisjunctiveConstraint, ConstraintError> {
        if !self.same_clocks(other) {
            return Err(ConstraintError::ClockSetMismatch);
        }
        let mut disjuncts = Vec::with_capacity(self.disjuncts.len() * other.disjuncts.len());
        for a in &self.disjuncts {
            for b in &other.disjuncts {
                disjuncts.push(a.and(b)?);
            }
        }
        Ok(DisjunctiveConstraint { clocks: self.clocks.clone(), disjuncts })
    }

    /// ANDs a single conjunction into every disjunct.
    pub fn and_conjunction(&self, conj: &Constraint) -> Result<DisjunctiveConstraint, ConstraintError> {
        let mut disjuncts = Vec::with_capacity(self.disjuncts.len());
        for a in &self.disjuncts {
            disjuncts.push(a.and(conj)?);
        }
        Ok(DisjunctiveConstraint { clocks: self.clocks.clone(), disjuncts })
    }

    /// `¬(D1 ∨ ... ∨ Dn) = ¬D1 ∧ ... ∧ ¬Dn`.
    pub fn negate(&self) -> DisjunctiveConstraint {
        let mut acc = DisjunctiveConstraint::true_(self.clocks.clone());
        for d in &self.disjuncts {
            let negated = d.negate();
            acc = acc.and(&negated).expect("same clock set by construction");
        }
        acc
    }

    pub fn minus(&self, other: &DisjunctiveConstraint) -> Result<DisjunctiveConstraint, ConstraintError> {
        if !self.same_clocks(other) {
            return Err(ConstraintError::ClockSetMismatch);
        }
        Ok(self.and(&other.negate()).expect("same clock set checked above"))
    }

    pub fn implies(
        &self,
        other: &DisjunctiveConstraint,
        oracle: &dyn ConstraintOracle,
    ) -> Result<bool, ConstraintError> {
        let diff = self.minus(other)?;
        Ok(!diff.is_satisfiable(oracle))
    }

    pub fn is_satisfied(&self, v: &ClockValuation) -> bool {
        self.disjuncts.iter().any(|d| d.is_satisfied(v))
    }

    pub fn is_satisfiable(&self, oracle: &dyn ConstraintOracle) -> bool {
        self.disjuncts.iter().any(|d| d.is_satisfiable(oracle))
    }

    /// Structural (not oracle-backed) check: no disjuncts at all.
    pub fn is_structurally_false(&self) -> bool {
        self.disjuncts.is_empty()
    }

    /// Structural check: some disjunct is the universal conjunction.
    pub fn is_structurally_true(&self) -> bool {
        self.disjuncts.iter().any(Constraint::is_universal)
    }

    pub fn simplify(&self) -> DisjunctiveConstraint {
        let disjuncts = self
            .disjuncts
            .iter()
            .filter_map(|d| match d.simplify() {
                Simplified::Sat(c) => Some(c),
                Simplified::Unsat => None,
            })
            .collect();
        DisjunctiveConstraint { clocks: self.clocks.clone(), disjuncts }
    }

    /// Returns a DNF whose disjuncts are pairwise disjoint, by iteratively
    /// subtracting each already-emitted *original* disjunct from the next
    /// candidate.
    pub fn negate_disjoint(&self) -> DisjunctiveConstraint {
        let mut emitted_originals: Vec<Constraint> = Vec::new();
        let mut out: Vec<Constraint> = Vec::new();
        for d in &self.disjuncts {
            let mut pieces = vec![d.clone()];
            for prev in &emitted_originals {
                let mut next = Vec::new();
                for piece in pieces {
                    if let Ok(diff) = piece.minus(prev) {
                        next.extend(diff.into_disjuncts());
                    }
                }
                pieces = next;
            }
            out.extend(pieces);
            emitted_originals.push(d.clone());
        }
        DisjunctiveConstraint { clocks: self.clocks.clone(), disjuncts: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AtomConstraint;
    use crate::oracle::DifferenceLogicOracle;
    use dta_core::clock::Clocks;
    use dta_core::rational::Rational;

    fn clocks() -> (Clocks, ClockId) {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 3);
        (clocks, x)
    }

    #[test]
    fn negate_disjoint_produces_disjoint_pieces() {
        let (_, x) = clocks();
        let oracle = DifferenceLogicOracle;
        let lo = Constraint::new(
            vec![x],
            vec![AtomConstraint::upper(x, Rational::from_integer(2), true).unwrap()],
        )
        .unwrap();
        let hi = Constraint::new(
            vec![x],
            vec![AtomConstraint::lower(x, Rational::from_integer(1), true).unwrap()],
        )
        .unwrap();
        let dnf = DisjunctiveConstraint::new(vec![x], vec![lo, hi]);
        let disjoint = dnf.negate_disjoint();
        // pairwise conjunctions of the disjoint pieces must be unsatisfiable
        for i in 0..disjoint.disjuncts().len() {
            for j in (i + 1)..disjoint.disjuncts().len() {
                let both = disjoint.disjuncts()[i].and(&disjoint.disjuncts()[j]).unwrap();
                assert!(!both.is_satisfiable(&oracle));
            }
        }
    }

    #[test]
    fn false_is_empty_and_true_is_universal() {
        let (_, x) = clocks();
        assert!(DisjunctiveConstraint::false_(vec![x]).is_structurally_false());
        assert!(DisjunctiveConstraint::true_(vec![x]).is_structurally_true());
    }
}

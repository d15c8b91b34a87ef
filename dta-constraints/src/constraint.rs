//! Conjunctions of atomic difference constraints, with a lazily-filled
//! validity cache.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use dta_core::clock::ClockId;
use dta_core::valuation::ClockValuation;

use crate::atom::AtomConstraint;
use crate::disjunctive::DisjunctiveConstraint;
use crate::errors::ConstraintError;
use crate::oracle::ConstraintOracle;

/// Validity status of a [`Constraint`], lazily upgraded by a
/// [`ConstraintOracle`] and otherwise `NotChecked`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidityStatus {
    True,
    False,
    SatisfiableUnknown,
    NotChecked,
}

/// Double-checked, lazily-initialised cache: reads are lock-free once filled,
/// writes race-safe via `OnceLock::set`'s "first writer wins" semantics.
#[derive(Debug, Default)]
struct ValidityCache(OnceLock<ValidityStatus>);

impl Clone for ValidityCache {
    fn clone(&self) -> Self {
        let cell = OnceLock::new();
        if let Some(&status) = self.0.get() {
            let _ = cell.set(status);
        }
        ValidityCache(cell)
    }
}

impl ValidityCache {
    fn get(&self) -> ValidityStatus {
        self.0.get().copied().unwrap_or(ValidityStatus::NotChecked)
    }

    fn set(&self, status: ValidityStatus) {
        let _ = self.0.set(status);
    }
}

/// Outcome of [`Constraint::simplify`]: folding bounds can discover the
/// conjunction is unsatisfiable, which a bare `Constraint` cannot represent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Simplified {
    Sat(Constraint),
    Unsat,
}

/// A conjunction of atoms over a fixed clock set. Construction always adds
/// `c >= 0` for every non-zero clock in the set.
#[derive(Debug)]
pub struct Constraint {
    clocks: Vec<ClockId>,
    atoms: BTreeSet<AtomConstraint>,
    status: ValidityCache,
}

impl Clone for Constraint {
    fn clone(&self) -> Self {
        Constraint {
            clocks: self.clocks.clone(),
            atoms: self.atoms.clone(),
            status: self.status.clone(),
        }
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.clocks == other.clocks && self.atoms == other.atoms
    }
}
impl Eq for Constraint {}

impl Constraint {
    /// Builds a conjunction over `clocks` from `atoms`, plus the implicit
    /// non-negativity atom for every clock in `clocks`.
    pub fn new(clocks: Vec<ClockId>, atoms: Vec<AtomConstraint>) -> Result<Self, ConstraintError> {
        let mut clocks = clocks;
        clocks.sort();
        clocks.dedup();
        let mut set: BTreeSet<AtomConstraint> = atoms.into_iter().collect();
        for &c in &clocks {
            if c != ClockId::ZERO {
                set.insert(AtomConstraint::non_negative(c));
            }
        }
        for atom in &set {
            for id in [atom.c1(), atom.c2()] {
                if id != ClockId::ZERO && !clocks.contains(&id) {
                    return Err(ConstraintError::ClockSetMismatch);
                }
            }
        }
        Ok(Constraint { clocks, atoms: set, status: ValidityCache::default() })
    }

    /// The universal (`TRUE`) constraint over `clocks`: only the implicit
    /// non-negativity atoms.
    pub fn universal(clocks: Vec<ClockId>) -> Self {
        Constraint::new(clocks, Vec::new()).expect("no atoms to mismatch")
    }

    pub fn clocks(&self) -> &[ClockId] {
        &self.clocks
    }

    pub fn atoms(&self) -> impl Iterator<Item = &AtomConstraint> {
        self.atoms.iter()
    }

    /// `true` iff this constraint carries no atom beyond the implicit
    /// non-negativity ones, i.e. it is structurally the universal formula.
    pub fn is_universal(&self) -> bool {
        self.atoms
            .iter()
            .all(|a| a.is_self_difference() || self.clocks.iter().any(|&c| a == &AtomConstraint::non_negative(c)))
    }

    fn same_clocks(&self, other: &Constraint) -> bool {
        self.clocks == other.clocks
    }

    pub fn and(&self, other: &Constraint) -> Result<Constraint, ConstraintError> {
        if !self.same_clocks(other) {
            return Err(ConstraintError::ClockSetMismatch);
        }
        let atoms: Vec<AtomConstraint> =
            self.atoms.iter().chain(other.atoms.iter()).cloned().collect();
        Constraint::new(self.clocks.clone(), atoms)
    }

    pub fn or(&self, other: &Constraint) -> Result<DisjunctiveConstraint, ConstraintError> {
        if !self.same_clocks(other) {
            return Err(ConstraintError::ClockSetMismatch);
        }
        Ok(DisjunctiveConstraint::new(self.clocks.clone(), vec![self.clone(), other.clone()]))
    }

    /// De Morgan negation: `¬(a1 ∧ ... ∧ an) = ¬a1 ∨ ... ∨ ¬an`. Atoms whose
    /// negation is [`AtomError::Trivial`](crate::errors::AtomError::Trivial)
    /// are tautological self-differences and contribute no disjunct.
    pub fn negate(&self) -> DisjunctiveConstraint {
        let mut disjuncts = Vec::new();
        for atom in &self.atoms {
            if let Ok(negated) = atom.negate() {
                let c = Constraint::new(self.clocks.clone(), vec![negated])
                    .expect("negated atom stays within the same clock set");
                disjuncts.push(c);
            }
        }
        DisjunctiveConstraint::new(self.clocks.clone(), disjuncts)
    }

    pub fn minus(&self, other: &Constraint) -> Result<DisjunctiveConstraint, ConstraintError> {
        if !self.same_clocks(other) {
            return Err(ConstraintError::ClockSetMismatch);
        }
        let not_other = other.negate();
        not_other.and_conjunction(self)
    }

    /// `implies` is exactly `¬(self ∧ ¬other)` being unsatisfiable.
    pub fn implies(
        &self,
        other: &Constraint,
        oracle: &dyn ConstraintOracle,
    ) -> Result<bool, ConstraintError> {
        let diff = self.minus(other)?;
        Ok(!diff.is_satisfiable(oracle))
    }

    pub fn is_satisfied(&self, v: &ClockValuation) -> bool {
        self.atoms.iter().all(|a| a.is_satisfied(v))
    }

    /// Queries (and caches) satisfiability via the oracle.
    pub fn is_satisfiable(&self, oracle: &dyn ConstraintOracle) -> bool {
        match self.status.get() {
            ValidityStatus::True | ValidityStatus::SatisfiableUnknown => true,
            ValidityStatus::False => false,
            ValidityStatus::NotChecked => {
                let verdict = oracle.is_satisfiable(self);
                use crate::errors::OracleVerdict::*;
                let (status, sat) = match verdict {
                    True => (ValidityStatus::True, true),
                    False => (ValidityStatus::False, false),
                    Unknown => (ValidityStatus::SatisfiableUnknown, true),
                };
                self.status.set(status);
                sat
            }
        }
    }

    pub fn cached_status(&self) -> ValidityStatus {
        self.status.get()
    }

    /// Folds every `c op V` / `x0 - c op V` atom per-clock into at most one
    /// lower and one upper bound; detects `lower > upper` as unsatisfiable.
    /// Difference atoms between two non-zero clocks pass through untouched.
    pub fn simplify(&self) -> Simplified {
        use std::collections::BTreeMap;

        let mut lower: BTreeMap<ClockId, Bound> = BTreeMap::new();
        let mut upper: BTreeMap<ClockId, Bound> = BTreeMap::new();
        let mut passthrough = Vec::new();

        for atom in &self.atoms {
            let (c1, c2) = (atom.c1(), atom.c2());
            if c2 == ClockId::ZERO && c1 != ClockId::ZERO {
                // c1 - x0 op V -> upper bound on c1
                tighten_upper(&mut upper, c1, atom.bound().clone(), atom.is_closed());
            } else if c1 == ClockId::ZERO && c2 != ClockId::ZERO {
                // x0 - c2 op V -> lower bound on c2: c2 op' -V
                tighten_lower(&mut lower, c2, atom.bound().neg(), atom.is_closed());
            } else if c1 == c2 {
                // tautological self-difference; drop silently
            } else {
                passthrough.push(atom.clone());
            }
        }

        for (&c, up) in &upper {
            if let Some(lo) = lower.get(&c) {
                let violates = if up.closed && lo.closed {
                    lo.value > up.value
                } else {
                    lo.value >= up.value
                };
                if violates {
                    return Simplified::Unsat;
                }
            }
        }

        let mut atoms = passthrough;
        for (&c, lo) in &lower {
            atoms.push(AtomConstraint::lower(c, lo.value.clone(), lo.closed).expect("valid bound"));
        }
        for (&c, up) in &upper {
            atoms.push(AtomConstraint::upper(c, up.value.clone(), up.closed).expect("valid bound"));
        }

        match Constraint::new(self.clocks.clone(), atoms) {
            Ok(c) => Simplified::Sat(c),
            Err(_) => Simplified::Unsat,
        }
    }
}

fn tighten_upper(
    map: &mut std::collections::BTreeMap<ClockId, Bound>,
    c: ClockId,
    value: dta_core::rational::Rational,
    closed: bool,
) {
    map.entry(c)
        .and_modify(|b| {
            if value < b.value || (value == b.value && !closed && b.closed) {
                b.value = value.clone();
                b.closed = closed;
            }
        })
        .or_insert(Bound { value, closed });
}

fn tighten_lower(
    map: &mut std::collections::BTreeMap<ClockId, Bound>,
    c: ClockId,
    value: dta_core::rational::Rational,
    closed: bool,
) {
    map.entry(c)
        .and_modify(|b| {
            if value > b.value || (value == b.value && !closed && b.closed) {
                b.value = value.clone();
                b.closed = closed;
            }
        })
        .or_insert(Bound { value, closed });
}

#[derive(Clone)]
struct Bound {
    value: dta_core::rational::Rational,
    closed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dta_core::clock::Clocks;
    use dta_core::rational::Rational;

    fn clocks() -> (Clocks, ClockId, ClockId) {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 2);
        let y = clocks.create("y", 2);
        (clocks, x, y)
    }

    #[test]
    fn and_is_satisfied_iff_both_are() {
        let (clocks, x, _) = clocks();
        let a = Constraint::new(
            vec![x],
            vec![AtomConstraint::upper(x, Rational::from_integer(5), true).unwrap()],
        )
        .unwrap();
        let b = Constraint::new(
            vec![x],
            vec![AtomConstraint::lower(x, Rational::from_integer(1), true).unwrap()],
        )
        .unwrap();
        let ab = a.and(&b).unwrap();
        let v_in = ClockValuation::zero(&clocks).delay(&Rational::from_integer(3)).unwrap();
        let v_out = ClockValuation::zero(&clocks).delay(&Rational::from_integer(6)).unwrap();
        assert!(ab.is_satisfied(&v_in));
        assert!(!ab.is_satisfied(&v_out));
    }

    #[test]
    fn simplify_detects_empty_range() {
        let (_, x, _) = clocks();
        let c = Constraint::new(
            vec![x],
            vec![
                AtomConstraint::upper(x, Rational::from_integer(1), true).unwrap(),
                AtomConstraint::lower(x, Rational::from_integer(5), true).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(c.simplify(), Simplified::Unsat);
    }

    #[test]
    fn clock_set_mismatch_is_rejected() {
        let (_, x, y) = clocks();
        let a = Constraint::universal(vec![x]);
        let b = Constraint::universal(vec![y]);
        assert!(a.and(&b).is_err());
    }
}

//! The constraint oracle: a pluggable decision procedure for satisfiability
//! of conjunctions of linear rational difference constraints.
//!
//! The default implementation, [`DifferenceLogicOracle`], decides
//! satisfiability directly via the same Floyd–Warshall shortest-paths
//! technique [`dta_zones`] uses to canonicalise a DBM (sum `(a,α)+(b,β) =
//! (a+b, α∧β)`, tightening by the `(value, closed)` order), applied here to
//! the sparse atom graph of a single [`Constraint`] rather than to a dense
//! zone matrix, and over the same exact [`Rational`] arithmetic — the two
//! are grounded in the same algorithm at different grains (see
//! `DESIGN.md`).

use std::collections::BTreeMap;

use dta_core::clock::ClockId;
use dta_core::rational::Rational;

use crate::constraint::Constraint;
use crate::errors::OracleVerdict;

/// Abstract decision procedure for linear rational difference formulas.
/// Implementations may answer `Unknown`, which callers treat conservatively:
/// not complete, not deterministic, or simply skipping a refinement branch.
pub trait ConstraintOracle {
    fn is_satisfiable(&self, constraint: &Constraint) -> OracleVerdict;

    /// `true` iff `constraint` holds for every valuation over its clock set.
    fn is_valid(&self, constraint: &Constraint) -> OracleVerdict {
        let negated = constraint.negate();
        match negated.disjuncts().iter().map(|d| self.is_satisfiable(d)).fold(
            OracleVerdict::False,
            |acc, v| match (acc, v) {
                (OracleVerdict::True, _) | (_, OracleVerdict::True) => OracleVerdict::True,
                (OracleVerdict::Unknown, _) | (_, OracleVerdict::Unknown) => OracleVerdict::Unknown,
                _ => OracleVerdict::False,
            },
        ) {
            OracleVerdict::True => OracleVerdict::False,
            OracleVerdict::False => OracleVerdict::True,
            OracleVerdict::Unknown => OracleVerdict::Unknown,
        }
    }
}

/// Always-complete decision procedure for difference logic: builds the
/// bound graph over the constraint's clocks (plus the zero clock), closes it
/// with Floyd–Warshall, and checks the diagonal for a negative or `(0, <)`
/// cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct DifferenceLogicOracle;

/// A single bound graph entry: `c_i - c_j <= value` if `closed`, else `<
/// value`. Exact [`Rational`] arithmetic throughout, same as a DBM's own
/// matrix entries.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Bound {
    value: Rational,
    closed: bool,
}

impl Bound {
    fn infinite() -> Bound {
        Bound { value: Rational::pos_infinity(), closed: false }
    }

    fn zero_closed() -> Bound {
        Bound { value: Rational::zero(), closed: true }
    }

    fn sum(&self, other: &Bound) -> Bound {
        let value =
            self.value.checked_add(&other.value).expect("bound graph never combines +inf with -inf");
        Bound { value, closed: self.closed && other.closed }
    }

    /// The tighter of two bounds: smaller value wins; at an equal value, the
    /// strict (`<`) bound is tighter than the non-strict (`<=`) one.
    fn tighter(&self, other: &Bound) -> Bound {
        if self.value < other.value {
            self.clone()
        } else if other.value < self.value {
            other.clone()
        } else {
            Bound { value: self.value.clone(), closed: self.closed && other.closed }
        }
    }

    fn is_negative_diagonal(&self) -> bool {
        self.value.is_negative() || (self.value.is_zero() && !self.closed)
    }
}

impl ConstraintOracle for DifferenceLogicOracle {
    fn is_satisfiable(&self, constraint: &Constraint) -> OracleVerdict {
        let mut ids: Vec<ClockId> = constraint.clocks().to_vec();
        if !ids.contains(&ClockId::ZERO) {
            ids.push(ClockId::ZERO);
        }
        ids.sort();
        let index: BTreeMap<ClockId, usize> =
            ids.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let n = ids.len();

        let mut m = vec![vec![Bound::infinite(); n]; n];
        for i in 0..n {
            m[i][i] = Bound::zero_closed();
        }
        for atom in constraint.atoms() {
            let i = index[&atom.c1()];
            let j = index[&atom.c2()];
            let candidate = Bound { value: atom.bound().clone(), closed: atom.is_closed() };
            m[i][j] = m[i][j].tighter(&candidate);
        }

        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    let via_k = m[i][k].sum(&m[k][j]);
                    m[i][j] = m[i][j].tighter(&via_k);
                }
            }
        }

        let unsat = (0..n).any(|i| m[i][i].is_negative_diagonal());
        if unsat {
            OracleVerdict::False
        } else {
            OracleVerdict::True
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AtomConstraint;
    use dta_core::clock::Clocks;

    #[test]
    fn empty_range_is_unsatisfiable() {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 3);
        let c = Constraint::new(
            vec![x],
            vec![
                AtomConstraint::upper(x, Rational::from_integer(1), true).unwrap(),
                AtomConstraint::lower(x, Rational::from_integer(2), true).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(DifferenceLogicOracle.is_satisfiable(&c), OracleVerdict::False);
    }

    #[test]
    fn nonempty_range_is_satisfiable() {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 3);
        let c = Constraint::new(
            vec![x],
            vec![
                AtomConstraint::upper(x, Rational::from_integer(5), true).unwrap(),
                AtomConstraint::lower(x, Rational::from_integer(2), true).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(DifferenceLogicOracle.is_satisfiable(&c), OracleVerdict::True);
    }

    #[test]
    fn universal_constraint_is_valid() {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 3);
        let c = Constraint::universal(vec![x]);
        assert_eq!(DifferenceLogicOracle.is_valid(&c), OracleVerdict::True);
    }

    #[test]
    fn exact_third_boundary_is_satisfiable_but_not_strictly_inside() {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 1);
        let third = Rational::from_ratio(1, 3);
        let at_boundary = Constraint::new(
            vec![x],
            vec![
                AtomConstraint::lower(x, third.clone(), true).unwrap(),
                AtomConstraint::upper(x, third.clone(), true).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(DifferenceLogicOracle.is_satisfiable(&at_boundary), OracleVerdict::True);

        let strictly_past = Constraint::new(
            vec![x],
            vec![
                AtomConstraint::lower(x, third.clone(), true).unwrap(),
                AtomConstraint::upper(x, third, false).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(DifferenceLogicOracle.is_satisfiable(&strictly_past), OracleVerdict::False);
    }

    #[test]
    fn epsilon_scale_bound_is_distinguished_from_zero() {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 1);
        let epsilon = Rational::epsilon();
        let c = Constraint::new(
            vec![x],
            vec![
                AtomConstraint::lower(x, epsilon.clone(), false).unwrap(),
                AtomConstraint::upper(x, epsilon, true).unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(DifferenceLogicOracle.is_satisfiable(&c), OracleVerdict::False);
    }
}

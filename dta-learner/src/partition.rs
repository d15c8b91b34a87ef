//! Guard recovery: turn a list of post-transition clock valuations into a
//! partition of the non-negative orthant, one disjunctive guard per
//! valuation, such that the guards are pairwise disjoint and each valuation
//! satisfies its own guard.

use num_traits::ToPrimitive;

use dta_constraints::atom::AtomConstraint;
use dta_constraints::constraint::Constraint;
use dta_constraints::disjunctive::DisjunctiveConstraint;
use dta_constraints::region::Region;
use dta_core::clock::{ClockId, Clocks};
use dta_core::rational::Rational;
use dta_core::valuation::ClockValuation;

/// Computes one disjunctive guard per entry of `psi`, covering the orthant
/// and pairwise disjoint, such that `psi[i]` satisfies the guard returned at
/// index `i`. `psi` must not be empty.
pub fn partition(psi: &[ClockValuation], clocks: &Clocks) -> Vec<DisjunctiveConstraint> {
    let scope: Vec<ClockId> = clocks.non_zero().map(|c| c.id()).collect();
    let n = psi.len();
    if n == 0 {
        return Vec::new();
    }

    // Step 1: A_i is the region guard of v_i when v_i overflows some clock's
    // kappa, else None (A_i = FALSE).
    let a: Vec<Option<Constraint>> = psi
        .iter()
        .map(|v| {
            if exceeds_kappa(v, clocks) {
                Some(Region::from_valuation(v, clocks).to_constraint(scope.clone(), false))
            } else {
                None
            }
        })
        .collect();

    let u0 = DisjunctiveConstraint::new(scope.clone(), a.iter().flatten().cloned().collect());

    // Step 2: U_i, the unit-cube half-space each v_i sits in per clock.
    let u: Vec<Constraint> = psi.iter().map(|v| unit_cube(v, clocks, &scope)).collect();

    // Step 3: W_i = ¬(U0 ∨ W_{i+1} ∨ ... ∨ W_n) ∧ U_i, computed i = n downto 1.
    let mut w: Vec<DisjunctiveConstraint> = vec![DisjunctiveConstraint::false_(scope.clone()); n];
    let mut excluded = u0.clone();
    for idx in (0..n).rev() {
        let not_excluded = excluded.negate();
        let wi = not_excluded
            .and_conjunction(&u[idx])
            .expect("shared clock scope by construction");
        w[idx] = wi.clone();
        excluded = excluded.or(&wi).expect("shared clock scope by construction");
    }

    // Step 4: I_i = (W_i ∨ A_i); non-negativity is already implicit in every
    // disjunct built from Constraint::new.
    let mut part: Vec<DisjunctiveConstraint> = (0..n)
        .map(|i| match &a[i] {
            Some(ai) => w[i]
                .or(&DisjunctiveConstraint::new(scope.clone(), vec![ai.clone()]))
                .expect("shared clock scope by construction"),
            None => w[i].clone(),
        })
        .collect();

    // Step 5: tighten pairs that still coincide despite distinct regions,
    // until no more coincide.
    let regions: Vec<Region> = psi.iter().map(|v| Region::from_valuation(v, clocks)).collect();
    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..n {
            for j in (i + 1)..n {
                if a[i].is_none() || a[j].is_none() {
                    continue;
                }
                if u[i] != u[j] {
                    continue;
                }
                if regions[i] == regions[j] {
                    continue;
                }
                if part[i] != part[j] {
                    continue;
                }
                let tighten_i = regions[i].to_constraint(scope.clone(), true);
                let tighten_j = regions[j].to_constraint(scope.clone(), true);
                part[i] = part[i]
                    .and_conjunction(&tighten_i)
                    .expect("shared clock scope by construction");
                part[j] = part[j]
                    .and_conjunction(&tighten_j)
                    .expect("shared clock scope by construction");
                changed = true;
            }
        }
    }

    // Step 6: drop unsatisfiable disjuncts from every I_i.
    part.into_iter().map(|p| p.simplify()).collect()
}

fn exceeds_kappa(v: &ClockValuation, clocks: &Clocks) -> bool {
    clocks.non_zero().any(|c| {
        let value = v.value(c.id()).expect("valuation covers every clock");
        let floor = value.floor().expect("clock values are finite");
        floor > num_bigint::BigInt::from(c.kappa())
    })
}

/// The lower-bound half of the unit square `v` sits in, one atom per clock:
/// `c >= v(c)` if `v(c)` is an integer, else `c > floor(v(c))`.
fn unit_cube(v: &ClockValuation, clocks: &Clocks, scope: &[ClockId]) -> Constraint {
    let mut atoms = Vec::new();
    for c in clocks.non_zero() {
        let id = c.id();
        let value = v.value(id).expect("valuation covers every clock");
        if value.is_integer() {
            atoms.push(AtomConstraint::lower(id, value.clone(), true).expect("integer bound is never a contradiction"));
        } else {
            let floor = value.floor().expect("clock values are finite");
            let floor_val = Rational::from_integer(floor.to_i64().unwrap_or(i64::MAX));
            atoms.push(
                AtomConstraint::lower(id, floor_val, false).expect("floor bound is never a contradiction"),
            );
        }
    }
    Constraint::new(scope.to_vec(), atoms).expect("unit-cube atoms stay within scope")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dta_constraints::oracle::DifferenceLogicOracle;
    use std::collections::BTreeMap;

    fn one_clock(kappa: u32) -> (Clocks, ClockId) {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", kappa);
        (clocks, x)
    }

    fn valuation(clocks: &Clocks, x: ClockId, value: Rational) -> ClockValuation {
        let mut map = BTreeMap::new();
        map.insert(ClockId::ZERO, Rational::zero());
        map.insert(x, value);
        ClockValuation::from_map(map)
    }

    #[test]
    fn disjoint_singleton_regions_partition_the_line() {
        let (clocks, x) = one_clock(3);
        let oracle = DifferenceLogicOracle;
        let v0 = valuation(&clocks, x, Rational::from_integer(0));
        let v1 = valuation(&clocks, x, Rational::from_ratio(3, 2));
        let parts = partition(&[v0.clone(), v1.clone()], &clocks);
        assert_eq!(parts.len(), 2);
        assert!(parts[0].is_satisfied(&v0));
        assert!(parts[1].is_satisfied(&v1));

        for d in parts[0].disjuncts() {
            for e in parts[1].disjuncts() {
                let overlap = d.and(e).unwrap();
                assert!(!overlap.is_satisfiable(&oracle));
            }
        }
    }

    #[test]
    fn single_valuation_partition_covers_it() {
        let (clocks, x) = one_clock(2);
        let v = valuation(&clocks, x, Rational::from_ratio(1, 2));
        let parts = partition(&[v.clone()], &clocks);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].is_satisfied(&v));
    }

    #[test]
    fn overflowing_valuations_share_the_saturated_guard() {
        let (clocks, x) = one_clock(1);
        let oracle = DifferenceLogicOracle;
        let v0 = valuation(&clocks, x, Rational::from_integer(5));
        let v1 = valuation(&clocks, x, Rational::from_integer(9));
        let parts = partition(&[v0.clone(), v1.clone()], &clocks);
        assert!(parts[0].is_satisfied(&v0));
        assert!(parts[1].is_satisfied(&v1));
        let _ = oracle;
    }
}

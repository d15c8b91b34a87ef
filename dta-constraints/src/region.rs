//! Clock regions: finite equivalence classes over valuations, induced by
//! integer parts (up to κ) and fractional ordering.

use std::collections::{BTreeMap, BTreeSet};

use dta_core::clock::{ClockId, Clocks};
use dta_core::rational::Rational;
use dta_core::valuation::ClockValuation;

use crate::atom::AtomConstraint;
use crate::constraint::Constraint;

/// A clock's integer part in a region: either a concrete value `<= κ`, or
/// "saturated" (meaning its true integer part exceeds κ, a distinction
/// without further detail needed downstream).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum IntPart {
    Value(u64),
    Saturated,
}

/// A region over the non-zero clocks of a [`Clocks`] registry. The zero
/// clock is implicit and always at `0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    int_parts: BTreeMap<ClockId, IntPart>,
    zero_frac: BTreeSet<ClockId>,
    fraction_order: Vec<ClockId>,
    kappa: BTreeMap<ClockId, u32>,
}

impl Region {
    /// Computes the canonical region for `v` under the ceilings in `clocks`.
    pub fn from_valuation(v: &ClockValuation, clocks: &Clocks) -> Region {
        let mut int_parts = BTreeMap::new();
        let mut zero_frac = BTreeSet::new();
        let mut kappa = BTreeMap::new();
        let mut fractional: Vec<(ClockId, Rational)> = Vec::new();

        for c in clocks.non_zero() {
            let id = c.id();
            let k = c.kappa();
            kappa.insert(id, k);
            let value = v.value(id).expect("valuation covers every clock");
            let floor = value.floor().expect("clock values are finite");
            if floor > num_bigint::BigInt::from(k) {
                int_parts.insert(id, IntPart::Saturated);
                continue;
            }
            let floor_u64 = floor_to_u64(&floor);
            int_parts.insert(id, IntPart::Value(floor_u64));
            let frac = value.frac().expect("clock values are finite");
            if frac.is_zero() {
                zero_frac.insert(id);
            } else {
                fractional.push((id, frac));
            }
        }

        fractional.sort_by(|a, b| a.1.cmp(&b.1));
        let fraction_order = fractional.into_iter().map(|(id, _)| id).collect();

        Region { int_parts, zero_frac, fraction_order, kappa }
    }

    /// `true` iff `v` belongs to this region.
    pub fn contains(&self, v: &ClockValuation) -> bool {
        for (&c, &ip) in &self.int_parts {
            let value = match v.value(c) {
                Ok(v) => v,
                Err(_) => return false,
            };
            let k = self.kappa[&c];
            let floor = match value.floor() {
                Ok(f) => f,
                Err(_) => return false,
            };
            match ip {
                IntPart::Saturated => {
                    if floor <= num_bigint::BigInt::from(k) {
                        return false;
                    }
                }
                IntPart::Value(n) => {
                    if floor != num_bigint::BigInt::from(n) {
                        return false;
                    }
                    let frac = value.frac().expect("finite");
                    let should_be_zero = self.zero_frac.contains(&c);
                    if should_be_zero != frac.is_zero() {
                        return false;
                    }
                }
            }
        }
        let mut prev: Option<&Rational> = None;
        let fracs: Vec<Rational> = self
            .fraction_order
            .iter()
            .map(|&c| v.value(c).unwrap().frac().unwrap())
            .collect();
        for f in &fracs {
            if let Some(p) = prev {
                if !(p < f) {
                    return false;
                }
            }
            prev = Some(f);
        }
        true
    }

    /// Canonical representative valuation of this region.
    pub fn build_valuation(&self, clocks: &Clocks) -> ClockValuation {
        let n = self.fraction_order.len() as i64;
        let mut values = BTreeMap::new();
        values.insert(ClockId::ZERO, Rational::zero());

        let rank: BTreeMap<ClockId, i64> = self
            .fraction_order
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i as i64 + 1))
            .collect();

        for c in clocks.non_zero() {
            let id = c.id();
            let k = c.kappa();
            let value = match self.int_parts.get(&id) {
                Some(IntPart::Saturated) => Rational::from_integer(k as i64 + 1),
                Some(IntPart::Value(ip)) => {
                    let base = Rational::from_integer(*ip as i64);
                    if self.zero_frac.contains(&id) {
                        base
                    } else if let Some(&r) = rank.get(&id) {
                        let frac = Rational::from_ratio(r, n + 1);
                        base.checked_add(&frac).expect("finite + finite")
                    } else {
                        base
                    }
                }
                None => Rational::zero(),
            };
            values.insert(id, value);
        }
        ClockValuation::from_map(values)
    }

    /// Emits the conjunctive guard for this region.
    pub fn to_constraint(&self, clocks_in_scope: Vec<ClockId>, need_fraction: bool) -> Constraint {
        let mut atoms = Vec::new();

        for (&c, &ip) in &self.int_parts {
            match ip {
                IntPart::Saturated => {
                    let k = self.kappa[&c];
                    atoms.push(
                        AtomConstraint::lower(c, Rational::from_integer(k as i64), false)
                            .expect("kappa+strict is never a contradiction for c != x0"),
                    );
                }
                IntPart::Value(n) if self.zero_frac.contains(&c) => {
                    atoms.push(
                        AtomConstraint::lower(c, Rational::from_integer(n as i64), true).unwrap(),
                    );
                    atoms.push(
                        AtomConstraint::upper(c, Rational::from_integer(n as i64), true).unwrap(),
                    );
                }
                IntPart::Value(n) => {
                    atoms.push(
                        AtomConstraint::lower(c, Rational::from_integer(n as i64), false).unwrap(),
                    );
                }
            }
        }

        // Pairwise ordering atoms among non-saturated, non-zero-fraction
        // clocks, and against every zero-fraction clock.
        for (pos, &ci) in self.fraction_order.iter().enumerate() {
            let int_i = int_value(&self.int_parts, ci);
            for &cj in self.fraction_order[..pos].iter() {
                let int_j = int_value(&self.int_parts, cj);
                let bound = Rational::from_integer(int_i - int_j);
                if let Ok(a) = AtomConstraint::try_new(ci, cj, bound, false) {
                    atoms.push(a);
                }
            }
            for &cj in &self.zero_frac {
                let int_j = int_value(&self.int_parts, cj);
                let bound = Rational::from_integer(int_i - int_j);
                if let Ok(a) = AtomConstraint::try_new(ci, cj, bound, false) {
                    atoms.push(a);
                }
            }
        }

        if need_fraction {
            let zf: Vec<ClockId> = self.zero_frac.iter().copied().collect();
            for i in 0..zf.len() {
                for j in (i + 1)..zf.len() {
                    if let Ok(a) = AtomConstraint::try_new(zf[i], zf[j], Rational::zero(), true) {
                        atoms.push(a);
                    }
                    if let Ok(a) = AtomConstraint::try_new(zf[j], zf[i], Rational::zero(), true) {
                        atoms.push(a);
                    }
                }
            }
        }

        Constraint::new(clocks_in_scope, atoms).expect("region atoms stay within scope")
    }
}

fn int_value(map: &BTreeMap<ClockId, IntPart>, c: ClockId) -> i64 {
    match map.get(&c) {
        Some(IntPart::Value(n)) => *n as i64,
        _ => 0,
    }
}

fn floor_to_u64(b: &num_bigint::BigInt) -> u64 {
    use num_traits::ToPrimitive;
    b.to_u64().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clocks_2() -> Clocks {
        let mut clocks = Clocks::new();
        clocks.create("x", 2);
        clocks.create("y", 2);
        clocks
    }

    #[test]
    fn region_round_trip() {
        let clocks = clocks_2();
        let ids: Vec<_> = clocks.non_zero().map(|c| c.id()).collect();
        let mut values = BTreeMap::new();
        values.insert(ClockId::ZERO, Rational::zero());
        values.insert(ids[0], Rational::from_ratio(3, 2));
        values.insert(ids[1], Rational::from_ratio(1, 2));
        let v = ClockValuation::from_map(values);

        let region = Region::from_valuation(&v, &clocks);
        assert!(region.contains(&v));

        let rebuilt = region.build_valuation(&clocks);
        let region2 = Region::from_valuation(&rebuilt, &clocks);
        assert_eq!(region, region2);
    }

    #[test]
    fn saturation_boundary() {
        let clocks = clocks_2();
        let ids: Vec<_> = clocks.non_zero().map(|c| c.id()).collect();
        let mut values = BTreeMap::new();
        values.insert(ClockId::ZERO, Rational::zero());
        values.insert(ids[0], Rational::from_integer(5));
        values.insert(ids[1], Rational::zero());
        let v = ClockValuation::from_map(values);
        let region = Region::from_valuation(&v, &clocks);
        assert!(region.contains(&v));
    }
}

//! Difference-bound matrices: a symbolic representation of a convex zone of
//! clock valuations by pairwise bounds `x_i - x_j <= V` / `< V`.

use std::collections::BTreeMap;

use dta_constraints::atom::AtomConstraint;
use dta_constraints::constraint::Constraint;
use dta_core::clock::ClockId;
use dta_core::rational::Rational;
use dta_core::valuation::ClockValuation;

use crate::errors::ZoneError;

/// A single matrix entry: `x_i - x_j <= value` if `closed`, else `< value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bound {
    pub value: Rational,
    pub closed: bool,
}

impl Bound {
    pub fn infinite() -> Bound {
        Bound { value: Rational::pos_infinity(), closed: false }
    }

    pub fn zero_closed() -> Bound {
        Bound { value: Rational::zero(), closed: true }
    }

    fn sum(&self, other: &Bound) -> Bound {
        let value = self
            .value
            .checked_add(&other.value)
            .expect("DBM bounds never combine +inf with -inf");
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

    fn ge(&self, other: &Bound) -> bool {
        if self.value > other.value {
            true
        } else if self.value < other.value {
            false
        } else {
            // equal value: non-strict (closed) is the looser (>=) bound.
            self.closed || !other.closed
        }
    }

    fn is_negative_diagonal(&self) -> bool {
        self.value.is_negative() || (self.value.is_zero() && !self.closed)
    }
}

/// A difference-bound matrix over a fixed set of non-zero clocks, plus the
/// implicit zero clock at index 0.
#[derive(Clone, Debug)]
pub struct Dbm {
    clocks: Vec<ClockId>,
    index: BTreeMap<ClockId, usize>,
    matrix: Vec<Vec<Bound>>,
}

impl Dbm {
    /// The non-negative orthant: every clock unbounded above, pinned at `>= 0`.
    pub fn initial(clocks: Vec<ClockId>) -> Dbm {
        let mut clocks = clocks;
        clocks.sort();
        clocks.dedup();
        let n = clocks.len() + 1;
        let index: BTreeMap<ClockId, usize> =
            clocks.iter().enumerate().map(|(i, &c)| (c, i + 1)).collect();

        let mut matrix = vec![vec![Bound::infinite(); n]; n];
        for row in matrix.iter_mut() {
            row[0] = Bound::zero_closed();
        }
        for i in 0..n {
            matrix[i][i] = Bound::zero_closed();
        }
        Dbm { clocks, index, matrix }
    }

    pub fn clocks(&self) -> &[ClockId] {
        &self.clocks
    }

    fn dim(&self) -> usize {
        self.matrix.len()
    }

    fn idx(&self, c: ClockId) -> Result<usize, ZoneError> {
        if c == ClockId::ZERO {
            Ok(0)
        } else {
            self.index.get(&c).copied().ok_or(ZoneError::UnknownClock(c.index() as u32))
        }
    }

    fn same_clocks(&self, other: &Dbm) -> bool {
        self.clocks == other.clocks
    }

    pub fn get(&self, i: ClockId, j: ClockId) -> Result<&Bound, ZoneError> {
        let (i, j) = (self.idx(i)?, self.idx(j)?);
        Ok(&self.matrix[i][j])
    }

    /// Time elapse: every non-zero clock loses its upper bound against the
    /// zero clock.
    pub fn up(&mut self) {
        for i in 1..self.dim() {
            self.matrix[i][0] = Bound::infinite();
        }
    }

    /// Time elapse followed by canonicalisation.
    pub fn future(&self) -> Dbm {
        let mut next = self.clone();
        next.up();
        next.canonical()
    }

    /// Resets `clocks_to_reset` to zero: copies row/column 0 and pins the
    /// diagonal.
    pub fn reset(&self, clocks_to_reset: &[ClockId]) -> Result<Dbm, ZoneError> {
        let mut next = self.clone();
        for &c in clocks_to_reset {
            let idx = self.idx(c)?;
            for j in 0..next.dim() {
                next.matrix[idx][j] = next.matrix[0][j].clone();
            }
            for i in 0..next.dim() {
                next.matrix[i][idx] = next.matrix[i][0].clone();
            }
            next.matrix[idx][idx] = Bound::zero_closed();
        }
        Ok(next)
    }

    /// Tightens `M[c1][c2]` with a single atomic difference constraint.
    pub fn intersect_atom(&self, atom: &AtomConstraint) -> Result<Dbm, ZoneError> {
        let mut next = self.clone();
        let i = next.idx(atom.c1())?;
        let j = next.idx(atom.c2())?;
        let candidate = Bound { value: atom.bound().clone(), closed: atom.is_closed() };
        next.matrix[i][j] = next.matrix[i][j].tighter(&candidate);
        Ok(next)
    }

    /// Tightens with every atom of a conjunction.
    pub fn intersect_constraint(&self, constraint: &Constraint) -> Result<Dbm, ZoneError> {
        let mut next = self.clone();
        for atom in constraint.atoms() {
            let i = next.idx(atom.c1())?;
            let j = next.idx(atom.c2())?;
            let candidate = Bound { value: atom.bound().clone(), closed: atom.is_closed() };
            next.matrix[i][j] = next.matrix[i][j].tighter(&candidate);
        }
        Ok(next)
    }

    /// Floyd-Warshall shortest-path closure over the bound semiring.
    pub fn canonical(&self) -> Dbm {
        let mut next = self.clone();
        let n = next.dim();
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    let via_k = next.matrix[i][k].sum(&next.matrix[k][j]);
                    next.matrix[i][j] = next.matrix[i][j].tighter(&via_k);
                }
            }
        }
        next
    }

    /// `true` iff this zone (after canonicalisation) admits no valuation.
    pub fn is_empty(&self) -> bool {
        let canon = self.canonical();
        (0..canon.dim()).any(|i| canon.matrix[i][i].is_negative_diagonal())
    }

    /// `true` iff every valuation satisfying `other` also satisfies `self`.
    pub fn include(&self, other: &Dbm) -> Result<bool, ZoneError> {
        if !self.same_clocks(other) {
            return Err(ZoneError::ClockSetMismatch);
        }
        let n = self.dim();
        Ok((0..n).all(|i| (0..n).all(|j| self.matrix[i][j].ge(&other.matrix[i][j]))))
    }

    /// `true` iff `v` satisfies every bound in this matrix.
    pub fn is_satisfied(&self, v: &ClockValuation) -> bool {
        let n = self.dim();
        let ids: Vec<ClockId> = std::iter::once(ClockId::ZERO).chain(self.clocks.iter().copied()).collect();
        for i in 0..n {
            for j in 0..n {
                let vi = match v.value(ids[i]) {
                    Ok(x) => x,
                    Err(_) => return false,
                };
                let vj = match v.value(ids[j]) {
                    Ok(x) => x,
                    Err(_) => return false,
                };
                let diff = match vi.checked_sub(vj) {
                    Ok(d) => d,
                    Err(_) => return false,
                };
                let bound = &self.matrix[i][j];
                let ok = if bound.closed { diff <= bound.value } else { diff < bound.value };
                if !ok {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dta_core::clock::Clocks;

    fn clocks() -> (Clocks, ClockId, ClockId) {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 3);
        let y = clocks.create("y", 3);
        (clocks, x, y)
    }

    #[test]
    fn canonical_is_idempotent() {
        let (_, x, y) = clocks();
        let dbm = Dbm::initial(vec![x, y]);
        let once = dbm.canonical();
        let twice = once.canonical();
        assert_eq!(format!("{once:?}"), format!("{twice:?}"));
    }

    #[test]
    fn empty_zone_detected() {
        let (_, x, _) = clocks();
        let dbm = Dbm::initial(vec![x]);
        let tight = dbm
            .intersect_atom(&AtomConstraint::upper(x, Rational::from_integer(1), true).unwrap())
            .unwrap()
            .intersect_atom(&AtomConstraint::lower(x, Rational::from_integer(2), true).unwrap())
            .unwrap();
        assert!(tight.is_empty());
    }

    #[test]
    fn future_drops_upper_bound() {
        let (_, x, _) = clocks();
        let dbm = Dbm::initial(vec![x])
            .intersect_atom(&AtomConstraint::upper(x, Rational::from_integer(1), true).unwrap())
            .unwrap();
        let after = dbm.future();
        assert!(!after.is_empty());
        let v = ClockValuation::from_map(
            [(ClockId::ZERO, Rational::zero()), (x, Rational::from_integer(10))]
                .into_iter()
                .collect(),
        );
        assert!(after.is_satisfied(&v));
    }

    #[test]
    fn reset_zeroes_the_clock() {
        let (_, x, y) = clocks();
        let dbm = Dbm::initial(vec![x, y]).future();
        let reset = dbm.reset(&[x]).unwrap();
        let v = ClockValuation::from_map(
            [
                (ClockId::ZERO, Rational::zero()),
                (x, Rational::zero()),
                (y, Rational::from_integer(7)),
            ]
            .into_iter()
            .collect(),
        );
        assert!(reset.is_satisfied(&v));
    }

    #[test]
    fn include_matches_subset_semantics() {
        let (_, x, _) = clocks();
        let wide = Dbm::initial(vec![x]).future();
        let narrow = wide
            .intersect_atom(&AtomConstraint::upper(x, Rational::from_integer(2), true).unwrap())
            .unwrap()
            .canonical();
        assert!(wide.include(&narrow).unwrap());
        assert!(!narrow.include(&wide).unwrap());
    }
}

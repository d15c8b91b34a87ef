//! Clock valuations: a total mapping from a fixed clock set to ℚ≥0.

use std::collections::BTreeMap;

use crate::clock::{ClockId, Clocks};
use crate::errors::ValuationError;
use crate::rational::Rational;

/// A total map from clock id to its current value. Every clock in `clocks`
/// is present in the domain, and the zero clock always reads `0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockValuation {
    values: BTreeMap<ClockId, Rational>,
}

impl ClockValuation {
    /// The valuation with every clock in `clocks` at `0`.
    pub fn zero(clocks: &Clocks) -> Self {
        let values = clocks.iter().map(|c| (c.id(), Rational::zero())).collect();
        ClockValuation { values }
    }

    /// Builds a valuation directly from a map, without checking it against a
    /// [`Clocks`] registry. Used internally by conversions that already know
    /// the domain is correct (e.g. region reconstruction).
    pub fn from_map(values: BTreeMap<ClockId, Rational>) -> Self {
        ClockValuation { values }
    }

    pub fn domain(&self) -> impl Iterator<Item = ClockId> + '_ {
        self.values.keys().copied()
    }

    pub fn value(&self, c: ClockId) -> Result<&Rational, ValuationError> {
        self.values
            .get(&c)
            .ok_or(ValuationError::UnknownClock(clock_index(c)))
    }

    /// `v.delay(d)`: adds `d` to every non-zero clock; the zero clock stays
    /// at `0`. Fails with `NegativeDelay` if `d < 0`.
    pub fn delay(&self, d: &Rational) -> Result<ClockValuation, ValuationError> {
        if d.is_negative() {
            return Err(ValuationError::NegativeDelay(format!("{d}")));
        }
        let values = self
            .values
            .iter()
            .map(|(&id, v)| {
                let next = if id == ClockId::ZERO {
                    v.clone()
                } else {
                    v.checked_add(d).expect("delay addition is always finite+finite")
                };
                (id, next)
            })
            .collect();
        Ok(ClockValuation { values })
    }

    /// `v.reset(R)`: sets every clock in `resets` to `0`. Fails with
    /// `UnknownClock` if `resets` names a clock outside this valuation's
    /// domain.
    pub fn reset(&self, resets: &[ClockId]) -> Result<ClockValuation, ValuationError> {
        let mut values = self.values.clone();
        for &c in resets {
            let slot = values
                .get_mut(&c)
                .ok_or(ValuationError::UnknownClock(clock_index(c)))?;
            *slot = Rational::zero();
        }
        Ok(ClockValuation { values })
    }

    pub fn fraction(&self, c: ClockId) -> Result<Rational, ValuationError> {
        let v = self.value(c)?;
        v.frac().map_err(|_| ValuationError::UnknownClock(clock_index(c)))
    }

    pub fn is_fraction_zero(&self, c: ClockId) -> Result<bool, ValuationError> {
        Ok(self.fraction(c)?.is_zero())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClockId, &Rational)> {
        self.values.iter().map(|(&id, v)| (id, v))
    }
}

fn clock_index(c: ClockId) -> u32 {
    c.index() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Clocks, ClockId, ClockId) {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 2);
        let y = clocks.create("y", 2);
        (clocks, x, y)
    }

    #[test]
    fn delay_zero_is_identity() {
        let (clocks, _, _) = setup();
        let v = ClockValuation::zero(&clocks);
        let v2 = v.delay(&Rational::zero()).unwrap();
        assert_eq!(v, v2);
    }

    #[test]
    fn delay_composes() {
        let (clocks, x, _) = setup();
        let v = ClockValuation::zero(&clocks);
        let a = Rational::from_ratio(1, 2);
        let b = Rational::from_ratio(1, 3);
        let combined = a.checked_add(&b).unwrap();
        let lhs = v.delay(&a).unwrap().delay(&b).unwrap();
        let rhs = v.delay(&combined).unwrap();
        assert_eq!(lhs.value(x).unwrap(), rhs.value(x).unwrap());
    }

    #[test]
    fn reset_zeroes_named_clocks() {
        let (clocks, x, y) = setup();
        let v = ClockValuation::zero(&clocks)
            .delay(&Rational::from_integer(3))
            .unwrap();
        let reset = v.reset(&[x]).unwrap();
        assert!(reset.value(x).unwrap().is_zero());
        assert_eq!(reset.value(y).unwrap(), v.value(y).unwrap());
    }

    #[test]
    fn negative_delay_fails() {
        let (clocks, _, _) = setup();
        let v = ClockValuation::zero(&clocks);
        assert!(v.delay(&Rational::from_integer(-1)).is_err());
    }

    #[test]
    fn reset_composes_over_disjoint_union() {
        let (clocks, x, y) = setup();
        let v = ClockValuation::zero(&clocks)
            .delay(&Rational::from_integer(3))
            .unwrap();
        let lhs = v.reset(&[x]).unwrap().reset(&[y]).unwrap();
        let rhs = v.reset(&[x, y]).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn reset_unknown_clock_fails() {
        let (clocks, _, _) = setup();
        let v = ClockValuation::zero(&clocks);
        let bogus = {
            // Construct an id outside the registry to exercise the error path.
            let mut other = Clocks::new();
            other.create("z", 1)
        };
        assert!(v.reset(&[bogus]).is_err());
    }
}

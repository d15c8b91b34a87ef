//! The six word variants a runtime can execute or a witness search can
//! produce, plus the conversions between them.

use dta_constraints::region::Region;
use dta_core::action::ActionId;
use dta_core::clock::{ClockId, Clocks};
use dta_core::rational::Rational;
use dta_core::valuation::ClockValuation;

use crate::errors::WordError;

#[derive(Clone, Debug, PartialEq)]
pub struct DelayTimedWord(pub Vec<(ActionId, Rational)>);

#[derive(Clone, Debug, PartialEq)]
pub struct ResetDelayTimedWord(pub Vec<(ActionId, Rational, Vec<ClockId>)>);

#[derive(Clone, Debug, PartialEq)]
pub struct ClockTimedWord(pub Vec<(ActionId, ClockValuation)>);

#[derive(Clone, Debug, PartialEq)]
pub struct ResetClockTimedWord(pub Vec<(ActionId, ClockValuation, Vec<ClockId>)>);

#[derive(Clone, Debug, PartialEq)]
pub struct RegionTimedWord(pub Vec<(ActionId, Region)>);

#[derive(Clone, Debug, PartialEq)]
pub struct ResetRegionTimedWord(pub Vec<(ActionId, Region, Vec<ClockId>)>);

impl ResetDelayTimedWord {
    /// reset-delay -> reset-clock: accumulates the valuation by
    /// delay-then-reset, annotating the valuation *before* reset.
    pub fn to_reset_clock(&self, clocks: &Clocks) -> Result<ResetClockTimedWord, WordError> {
        let mut current = ClockValuation::zero(clocks);
        let mut steps = Vec::with_capacity(self.0.len());
        for (action, delay, resets) in &self.0 {
            let delayed = current
                .delay(delay)
                .map_err(|e| WordError::NegativeDelay(e.to_string()))?;
            steps.push((*action, delayed.clone(), resets.clone()));
            current = delayed.reset(resets).map_err(|e| WordError::NegativeDelay(e.to_string()))?;
        }
        Ok(ResetClockTimedWord(steps))
    }
}

impl ResetClockTimedWord {
    /// reset-clock -> reset-delay: recovers `tᵢ` from `vᵢ = v'_{i-1} + tᵢ·1`,
    /// checking every non-reset clock agrees on the inferred delay.
    pub fn to_reset_delay(&self, clocks: &Clocks) -> Result<ResetDelayTimedWord, WordError> {
        let mut prior = ClockValuation::zero(clocks);
        let mut steps = Vec::with_capacity(self.0.len());
        for (action, valuation, resets) in &self.0 {
            let mut delay: Option<Rational> = None;
            for c in clocks.non_zero() {
                let id = c.id();
                let before = prior.value(id).map_err(|_| WordError::InconsistentTiming)?;
                let after = valuation.value(id).map_err(|_| WordError::InconsistentTiming)?;
                let candidate = after
                    .checked_sub(before)
                    .map_err(|_| WordError::InconsistentTiming)?;
                if candidate.is_negative() {
                    return Err(WordError::InconsistentTiming);
                }
                match &delay {
                    None => delay = Some(candidate),
                    Some(d) if *d == candidate => {}
                    Some(_) => return Err(WordError::InconsistentTiming),
                }
            }
            let delay = delay.unwrap_or_else(Rational::zero);
            steps.push((*action, delay, resets.clone()));
            prior = valuation.reset(resets).map_err(|_| WordError::InconsistentTiming)?;
        }
        Ok(ResetDelayTimedWord(steps))
    }
}

impl ResetRegionTimedWord {
    /// region-timed x reset-sequence -> reset-clock: solves each step's
    /// delay against the target region via [`crate::witness::solve_delay_to_region`].
    pub fn to_reset_clock(&self, clocks: &Clocks) -> Result<ResetClockTimedWord, WordError> {
        let mut current = ClockValuation::zero(clocks);
        let mut steps = Vec::with_capacity(self.0.len());
        for (action, region, resets) in &self.0 {
            let d = crate::witness::solve_delay_to_region(&current, region, clocks)
                .ok_or(WordError::Infeasible)?;
            let delayed = current.delay(&d).map_err(|e| WordError::NegativeDelay(e.to_string()))?;
            steps.push((*action, delayed.clone(), resets.clone()));
            current = delayed.reset(resets).map_err(|e| WordError::NegativeDelay(e.to_string()))?;
        }
        Ok(ResetClockTimedWord(steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dta_core::action::Alphabet;

    fn setup() -> (Clocks, ActionId) {
        let mut clocks = Clocks::new();
        clocks.create("x", 3);
        let mut alphabet = Alphabet::new();
        let a = alphabet.create_action("a");
        (clocks, a)
    }

    #[test]
    fn reset_delay_round_trips_through_reset_clock() {
        let (clocks, a) = setup();
        let word = ResetDelayTimedWord(vec![
            (a, Rational::from_integer(2), vec![]),
            (a, Rational::from_integer(3), vec![ClockId::ZERO]),
        ]);
        let clocked = word.to_reset_clock(&clocks).unwrap();
        let back = clocked.to_reset_delay(&clocks).unwrap();
        assert_eq!(back.0.len(), word.0.len());
        assert_eq!(back.0[0].1, Rational::from_integer(2));
        assert_eq!(back.0[1].1, Rational::from_integer(3));
    }
}

//! Plays a word against a [`Dta`], one step at a time, committing to the
//! unique enabled transition or rejecting.

use dta_constraints::region::Region;
use dta_core::clock::ClockId;
use dta_core::valuation::ClockValuation;

use crate::model::{Dta, TransitionId};
use crate::words::{
    ClockTimedWord, DelayTimedWord, RegionTimedWord, ResetClockTimedWord, ResetDelayTimedWord,
    ResetRegionTimedWord,
};

/// Why a step failed to commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    NoTransition,
    GuardNotSatisfied,
    NonUniqueTransition,
    ResetMismatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Committed(TransitionId),
    Rejected(RejectReason),
}

/// The outcome of executing a whole word: the per-step trace plus whether
/// the run ends in an accepting location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub steps: Vec<StepOutcome>,
    pub accepted: bool,
}

impl ExecutionResult {
    pub fn accepted(&self) -> bool {
        self.accepted
    }
}

/// Tracks current location/valuation while playing a word against a [`Dta`].
pub struct Runtime<'a> {
    dta: &'a Dta,
    location: dta_core::location::LocationId,
    valuation: ClockValuation,
    snapshots: Vec<(dta_core::location::LocationId, ClockValuation)>,
}

impl<'a> Runtime<'a> {
    pub fn new(dta: &'a Dta) -> Runtime<'a> {
        Runtime {
            dta,
            location: dta.init(),
            valuation: ClockValuation::zero(dta.clocks()),
            snapshots: Vec::new(),
        }
    }

    pub fn location(&self) -> dta_core::location::LocationId {
        self.location
    }

    pub fn valuation(&self) -> &ClockValuation {
        &self.valuation
    }

    pub fn snapshot(&mut self) {
        self.snapshots.push((self.location, self.valuation.clone()));
    }

    pub fn pop_snapshot(&mut self) -> bool {
        if let Some((loc, v)) = self.snapshots.pop() {
            self.location = loc;
            self.valuation = v;
            true
        } else {
            false
        }
    }

    fn reset_run(&mut self) {
        self.location = self.dta.init();
        self.valuation = ClockValuation::zero(self.dta.clocks());
    }

    /// Finds the unique transition enabled by `candidate` for the current
    /// `(location, action)` pair, or the reason none commits.
    fn resolve(
        &self,
        action: dta_core::action::ActionId,
        candidate: &ClockValuation,
        declared_reset: Option<&[ClockId]>,
    ) -> Result<TransitionId, RejectReason> {
        let transitions = self.dta.by_action(self.location, action);
        if transitions.is_empty() {
            return Err(RejectReason::NoTransition);
        }
        let matches: Vec<TransitionId> = transitions
            .iter()
            .copied()
            .filter(|&id| self.dta.transition(id).guard().is_satisfied(candidate))
            .collect();
        match matches.len() {
            0 => Err(RejectReason::GuardNotSatisfied),
            1 => {
                let id = matches[0];
                if let Some(declared) = declared_reset {
                    let actual = self.dta.transition(id).reset();
                    if !same_reset_set(declared, actual) {
                        return Err(RejectReason::ResetMismatch);
                    }
                }
                Ok(id)
            }
            _ => Err(RejectReason::NonUniqueTransition),
        }
    }

    fn commit(&mut self, id: TransitionId) {
        let t = self.dta.transition(id);
        self.valuation = self
            .valuation
            .reset(t.reset())
            .expect("transition resets only clocks within this DTA's clock set");
        self.location = t.target();
    }

    fn finish(&self, steps: Vec<StepOutcome>) -> ExecutionResult {
        let accepted = matches!(steps.last(), Some(StepOutcome::Committed(_)) | None)
            && self.dta.is_accepting(self.location);
        ExecutionResult { steps, accepted }
    }

    pub fn execute_delay_timed(&mut self, word: &DelayTimedWord) -> ExecutionResult {
        self.reset_run();
        let mut steps = Vec::with_capacity(word.0.len());
        for (action, delay) in &word.0 {
            let candidate = match self.valuation.delay(delay) {
                Ok(v) => v,
                Err(_) => {
                    steps.push(StepOutcome::Rejected(RejectReason::GuardNotSatisfied));
                    break;
                }
            };
            match self.resolve(*action, &candidate, None) {
                Ok(id) => {
                    self.valuation = candidate;
                    self.commit(id);
                    steps.push(StepOutcome::Committed(id));
                }
                Err(reason) => {
                    steps.push(StepOutcome::Rejected(reason));
                    break;
                }
            }
        }
        self.finish(steps)
    }

    pub fn execute_reset_delay_timed(&mut self, word: &ResetDelayTimedWord) -> ExecutionResult {
        self.reset_run();
        let mut steps = Vec::with_capacity(word.0.len());
        for (action, delay, resets) in &word.0 {
            let candidate = match self.valuation.delay(delay) {
                Ok(v) => v,
                Err(_) => {
                    steps.push(StepOutcome::Rejected(RejectReason::GuardNotSatisfied));
                    break;
                }
            };
            match self.resolve(*action, &candidate, Some(resets)) {
                Ok(id) => {
                    self.valuation = candidate;
                    self.commit(id);
                    steps.push(StepOutcome::Committed(id));
                }
                Err(reason) => {
                    steps.push(StepOutcome::Rejected(reason));
                    break;
                }
            }
        }
        self.finish(steps)
    }

    pub fn execute_clock_timed(&mut self, word: &ClockTimedWord) -> ExecutionResult {
        self.reset_run();
        let mut steps = Vec::with_capacity(word.0.len());
        for (action, valuation) in &word.0 {
            match self.resolve(*action, valuation, None) {
                Ok(id) => {
                    self.valuation = valuation.clone();
                    self.commit(id);
                    steps.push(StepOutcome::Committed(id));
                }
                Err(reason) => {
                    steps.push(StepOutcome::Rejected(reason));
                    break;
                }
            }
        }
        self.finish(steps)
    }

    pub fn execute_reset_clock_timed(&mut self, word: &ResetClockTimedWord) -> ExecutionResult {
        self.reset_run();
        let mut steps = Vec::with_capacity(word.0.len());
        for (action, valuation, resets) in &word.0 {
            match self.resolve(*action, valuation, Some(resets)) {
                Ok(id) => {
                    self.valuation = valuation.clone();
                    self.commit(id);
                    steps.push(StepOutcome::Committed(id));
                }
                Err(reason) => {
                    steps.push(StepOutcome::Rejected(reason));
                    break;
                }
            }
        }
        self.finish(steps)
    }

    fn region_candidate(&self, region: &Region) -> ClockValuation {
        region.build_valuation(self.dta.clocks())
    }

    pub fn execute_region_timed(&mut self, word: &RegionTimedWord) -> ExecutionResult {
        self.reset_run();
        let mut steps = Vec::with_capacity(word.0.len());
        for (action, region) in &word.0 {
            let candidate = self.region_candidate(region);
            match self.resolve(*action, &candidate, None) {
                Ok(id) => {
                    self.valuation = candidate;
                    self.commit(id);
                    steps.push(StepOutcome::Committed(id));
                }
                Err(reason) => {
                    steps.push(StepOutcome::Rejected(reason));
                    break;
                }
            }
        }
        self.finish(steps)
    }

    pub fn execute_reset_region_timed(&mut self, word: &ResetRegionTimedWord) -> ExecutionResult {
        self.reset_run();
        let mut steps = Vec::with_capacity(word.0.len());
        for (action, region, resets) in &word.0 {
            let candidate = self.region_candidate(region);
            match self.resolve(*action, &candidate, Some(resets)) {
                Ok(id) => {
                    self.valuation = candidate;
                    self.commit(id);
                    steps.push(StepOutcome::Committed(id));
                }
                Err(reason) => {
                    steps.push(StepOutcome::Rejected(reason));
                    break;
                }
            }
        }
        self.finish(steps)
    }
}

fn same_reset_set(declared: &[ClockId], actual: &[ClockId]) -> bool {
    let mut a = declared.to_vec();
    let mut b = actual.to_vec();
    a.sort();
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dta;
    use dta_constraints::atom::AtomConstraint;
    use dta_constraints::constraint::Constraint;
    use dta_core::action::Alphabet;
    use dta_core::clock::Clocks;
    use dta_core::location::Locations;
    use dta_core::rational::Rational;
    use std::collections::BTreeSet;

    fn one_clock_target() -> (Dta, dta_core::action::ActionId, ClockId) {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 1);
        let mut alphabet = Alphabet::new();
        let a = alphabet.create_action("a");
        let mut locations = Locations::new();
        let l0 = locations.create("l0");
        let l1 = locations.create("l1");
        let mut accepting = BTreeSet::new();
        accepting.insert(l1);
        let mut dta = Dta::new(clocks, alphabet, locations, l0, accepting);
        let guard =
            Constraint::new(vec![x], vec![AtomConstraint::lower(x, Rational::from_integer(1), true).unwrap()])
                .unwrap();
        dta.add_transition(l0, a, guard, vec![], l1).unwrap();
        (dta, a, x)
    }

    #[test]
    fn delay_timed_word_reaches_acceptance() {
        let (dta, a, _) = one_clock_target();
        let mut rt = Runtime::new(&dta);
        let word = DelayTimedWord(vec![(a, Rational::from_integer(2))]);
        let result = rt.execute_delay_timed(&word);
        assert!(result.accepted());
        assert_eq!(result.steps.len(), 1);
    }

    #[test]
    fn delay_timed_word_rejects_below_guard() {
        let (dta, a, _) = one_clock_target();
        let mut rt = Runtime::new(&dta);
        let word = DelayTimedWord(vec![(a, Rational::zero())]);
        let result = rt.execute_delay_timed(&word);
        assert!(!result.accepted());
        assert_eq!(result.steps, vec![StepOutcome::Rejected(RejectReason::GuardNotSatisfied)]);
    }

    #[test]
    fn snapshot_round_trips_state() {
        let (dta, a, _) = one_clock_target();
        let mut rt = Runtime::new(&dta);
        rt.snapshot();
        let word = DelayTimedWord(vec![(a, Rational::from_integer(2))]);
        rt.execute_delay_timed(&word);
        assert!(rt.pop_snapshot());
        assert_eq!(rt.location(), dta.init());
    }
}

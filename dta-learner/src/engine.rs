//! Priority-queue-driven learner loop: repeatedly pulls the cheapest
//! candidate observation table off a min-heap, closes/reconciles it, builds
//! a hypothesis, and asks the teacher whether it is correct.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use dta_automaton::Dta;
use dta_core::action::Alphabet;
use dta_core::clock::Clocks;

use crate::errors::LearnerError;
use crate::hypothesis::build_hypothesis;
use crate::table::ObservationTable;
use crate::teacher::Teacher;

/// Tuning knobs for [`learn`]. `guess_budget` bounds how many reset-subset
/// combinations any single closing/consistency/counterexample step may
/// branch into; `max_pops` bounds how many candidate tables the loop will
/// examine before giving up.
#[derive(Clone, Copy, Debug)]
pub struct LearnerConfig {
    pub guess_budget: usize,
    pub max_pops: usize,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig { guess_budget: 64, max_pops: 10_000 }
    }
}

/// Wraps a table so the min-heap orders by ascending guess count.
struct Candidate(ObservationTable);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.0.guess_count() == other.0.guess_count()
    }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: `BinaryHeap` is a max-heap, and we want the lowest
        // guess count to pop first.
        other.0.guess_count().cmp(&self.0.guess_count())
    }
}

/// Runs the active-learning loop to convergence: returns a [`Dta`]
/// hypothesis that `teacher` can no longer refute with an equivalence query,
/// or [`LearnerError::Exhausted`] if the queue runs dry or `max_pops` is hit
/// first.
pub fn learn(
    alphabet: &Alphabet,
    clocks: &Clocks,
    teacher: &mut dyn Teacher,
    config: &LearnerConfig,
) -> Result<Dta, LearnerError> {
    let mut queue: BinaryHeap<Candidate> = ObservationTable::seed(alphabet, clocks, config.guess_budget)
        .into_iter()
        .map(Candidate)
        .collect();

    let mut last_error = String::from("no candidate table was ever tried");
    let mut pops = 0usize;

    while let Some(Candidate(mut table)) = queue.pop() {
        pops += 1;
        if pops > config.max_pops {
            break;
        }

        if let Err(e) = table.fill_table(teacher, clocks, config.guess_budget) {
            last_error = e.to_string();
            continue;
        }

        if !table.is_closed() {
            for next in table.guess_closing(alphabet, clocks, config.guess_budget) {
                queue.push(Candidate(next));
            }
            continue;
        }

        if let Some(next) = table.guess_consistency(clocks) {
            queue.push(Candidate(next));
            continue;
        }

        if !table.evidence_closed() {
            last_error = "table never reached evidence-closedness".to_string();
            continue;
        }

        let hypothesis = build_hypothesis(&table, alphabet, clocks);
        match teacher.equivalence(&hypothesis) {
            None => return Ok(hypothesis),
            Some(cex) => {
                last_error = format!("counterexample {cex:?} refuted the current hypothesis");
                for next in table.process_counterexample(&cex, clocks, config.guess_budget) {
                    queue.push(Candidate(next));
                }
            }
        }
    }

    Err(LearnerError::Exhausted(last_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dta_automaton::{DelayTimedWord, Runtime};
    use dta_constraints::atom::AtomConstraint;
    use dta_constraints::constraint::Constraint;
    use dta_constraints::oracle::DifferenceLogicOracle;
    use dta_core::location::Locations;
    use dta_core::rational::Rational;
    use std::collections::BTreeSet;

    use crate::teacher::DtaTeacher;

    fn single_guarded_target() -> (Dta, Alphabet, Clocks) {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 1);
        let mut alphabet = Alphabet::new();
        let a = alphabet.create_action("a");
        let mut locations = Locations::new();
        let l0 = locations.create("l0");
        let l1 = locations.create("l1");
        let mut accepting = BTreeSet::new();
        accepting.insert(l1);
        let mut dta = Dta::new(clocks.clone(), alphabet.clone(), locations, l0, accepting);
        let guard =
            Constraint::new(vec![x], vec![AtomConstraint::lower(x, Rational::from_integer(1), true).unwrap()])
                .unwrap();
        dta.add_transition(l0, a, guard, vec![], l1).unwrap();
        (dta, alphabet, clocks)
    }

    #[test]
    fn learns_a_hypothesis_the_teacher_accepts() {
        let (target, alphabet, clocks) = single_guarded_target();
        let oracle = DifferenceLogicOracle;
        let mut teacher = DtaTeacher::new(&target, &oracle);
        let config = LearnerConfig { guess_budget: 8, max_pops: 500 };
        let hypothesis = learn(&alphabet, &clocks, &mut teacher, &config).expect("learner converges");

        let mut rt = Runtime::new(&hypothesis);
        let a = alphabet.lookup("a").unwrap();
        let accept = rt.execute_delay_timed(&DelayTimedWord(vec![(a, Rational::from_integer(2))]));
        assert!(accept.accepted());
    }
}

//! The minimally adequate teacher: membership and equivalence queries.

use dta_automaton::{DelayTimedWord, Dta};

/// A minimally adequate teacher, queried by the learner loop for membership
/// of individual timed words and for equivalence of a candidate hypothesis.
/// Implementations may wrap a reference automaton, a live system under test,
/// or a human in the loop; the learner only ever sees this interface.
pub trait Teacher {
    /// `true` iff `word` is accepted by the target language.
    fn membership(&mut self, word: &DelayTimedWord) -> bool;

    /// `None` iff `hypothesis` agrees with the target on every word;
    /// otherwise a word on which they disagree.
    fn equivalence(&mut self, hypothesis: &Dta) -> Option<DelayTimedWord>;
}

/// A [`Teacher`] backed directly by a target [`Dta`], answering membership by
/// running the word through its runtime and equivalence by intersecting the
/// hypothesis with the complement of the target (and vice versa) and
/// searching each product for a witness.
pub struct DtaTeacher<'a> {
    target: &'a Dta,
    oracle: &'a dyn dta_constraints::oracle::ConstraintOracle,
    membership_queries: u64,
    equivalence_queries: u64,
}

impl<'a> DtaTeacher<'a> {
    pub fn new(target: &'a Dta, oracle: &'a dyn dta_constraints::oracle::ConstraintOracle) -> Self {
        DtaTeacher { target, oracle, membership_queries: 0, equivalence_queries: 0 }
    }

    pub fn membership_queries(&self) -> u64 {
        self.membership_queries
    }

    pub fn equivalence_queries(&self) -> u64 {
        self.equivalence_queries
    }
}

impl<'a> Teacher for DtaTeacher<'a> {
    fn membership(&mut self, word: &DelayTimedWord) -> bool {
        self.membership_queries += 1;
        let mut runtime = dta_automaton::Runtime::new(self.target);
        runtime.execute_delay_timed(word).accepted()
    }

    fn equivalence(&mut self, hypothesis: &Dta) -> Option<DelayTimedWord> {
        self.equivalence_queries += 1;

        let target_minus_hyp = dta_automaton::complement(hypothesis, self.oracle)
            .ok()
            .and_then(|not_h| dta_automaton::intersect(self.target, &not_h, self.oracle).ok())
            .and_then(|product| dta_automaton::find_witness(&product));
        if let Some(w) = target_minus_hyp {
            return Some(w);
        }

        let hyp_minus_target = dta_automaton::complement(self.target, self.oracle)
            .ok()
            .and_then(|not_target| dta_automaton::intersect(hypothesis, &not_target, self.oracle).ok())
            .and_then(|product| dta_automaton::find_witness(&product));
        hyp_minus_target
    }
}

//! Builds a [`Dta`] hypothesis from a closed observation table: first an
//! intermediate automaton over `S`-row equivalence classes, then concrete
//! guards recovered per `(class, action)` group via
//! [`crate::partition::partition`].

use std::collections::{BTreeMap, BTreeSet};

use dta_automaton::Dta;
use dta_core::action::{ActionId, Alphabet};
use dta_core::clock::{ClockId, Clocks};
use dta_core::location::{LocationId, Locations};
use dta_core::valuation::ClockValuation;

use crate::partition::partition;
use crate::table::{valuation_before_last_reset, ObservationTable};

/// A one-step extension found in `S ∪ R`: the row classes it connects, the
/// action and reset it carries, and the pre-reset valuation its guard must
/// be recovered around.
struct AbstractEdge {
    source_class: usize,
    action: ActionId,
    valuation: ClockValuation,
    reset: Vec<ClockId>,
    target_class: usize,
}

/// Builds the current hypothesis from `table`. `table` is assumed closed
/// (every `R` row matches some `S` row); the learner loop only calls this
/// once that invariant holds, so an unmatched row here is a bug upstream.
pub fn build_hypothesis(table: &ObservationTable, alphabet: &Alphabet, clocks: &Clocks) -> Dta {
    let edges = abstract_edges(table, clocks);

    let mut classes: Vec<usize> = (0..table.s().len())
        .map(|i| table.row_class(i).expect("every S row matches its own class"))
        .collect();
    classes.sort();
    classes.dedup();

    let mut locations = Locations::new();
    let mut location_of: BTreeMap<usize, LocationId> = BTreeMap::new();
    for &class in &classes {
        location_of.insert(class, locations.create(format!("q{class}")));
    }

    let epsilon_class = table.row_class(0).expect("the empty prefix is always in S");
    let init = location_of[&epsilon_class];

    let mut accepting = BTreeSet::new();
    for &class in &classes {
        let accepts = table.row(class)[0].as_ref().map(|e| e.answer).unwrap_or(false);
        if accepts {
            accepting.insert(location_of[&class]);
        }
    }

    let mut dta = Dta::new(clocks.clone(), alphabet.clone(), locations, init, accepting);

    let mut groups: BTreeMap<(usize, ActionId), Vec<&AbstractEdge>> = BTreeMap::new();
    for edge in &edges {
        groups.entry((edge.source_class, edge.action)).or_default().push(edge);
    }

    for ((source_class, action), group) in groups {
        let psi: Vec<ClockValuation> = group.iter().map(|e| e.valuation.clone()).collect();
        let guards = partition(&psi, clocks);
        let source = location_of[&source_class];
        for (edge, guard) in group.iter().zip(guards.iter()) {
            let target = location_of[&edge.target_class];
            for disjunct in guard.disjuncts() {
                if dta.has_equivalent_transition(source, action, disjunct, &edge.reset, target) {
                    continue;
                }
                dta.add_transition(source, action, disjunct.clone(), edge.reset.clone(), target)
                    .expect("endpoints and action were built from this same Dta's registries");
            }
        }
    }

    dta
}

/// Every word `s·(a,0,ρ)` present in `S ∪ R` whose strict prefix is also a
/// table word, paired with the row classes it connects.
fn abstract_edges(table: &ObservationTable, clocks: &Clocks) -> Vec<AbstractEdge> {
    let mut edges = Vec::new();
    for (word_idx, word) in table.words().iter().enumerate() {
        if word.0.is_empty() {
            continue;
        }
        let prefix = dta_automaton::ResetDelayTimedWord(word.0[..word.0.len() - 1].to_vec());
        let Some(prefix_idx) = table.find_word(&prefix) else { continue };
        let Some(source_class) = table.row_class(prefix_idx) else { continue };
        let Some(target_class) = table.row_class(word_idx) else { continue };
        let (action, _, reset) = word.0.last().expect("checked non-empty above");
        let valuation = valuation_before_last_reset(word, clocks);
        edges.push(AbstractEdge { source_class, action: *action, valuation, reset: reset.clone(), target_class });
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teacher::Teacher;
    use dta_automaton::{DelayTimedWord, Runtime};

    struct AcceptEverything;
    impl Teacher for AcceptEverything {
        fn membership(&mut self, _word: &DelayTimedWord) -> bool {
            true
        }
        fn equivalence(&mut self, _hypothesis: &Dta) -> Option<DelayTimedWord> {
            None
        }
    }

    #[test]
    fn trivial_language_yields_a_one_state_accepting_hypothesis() {
        let mut alphabet = Alphabet::new();
        alphabet.create_action("a");
        let mut clocks = Clocks::new();
        clocks.create("x", 2);

        let mut table = ObservationTable::new(&clocks);
        let mut teacher = AcceptEverything;
        table.fill_table(&mut teacher, &clocks, 64).unwrap();
        assert!(table.is_closed());

        let dta = build_hypothesis(&table, &alphabet, &clocks);
        let mut runtime = Runtime::new(&dta);
        assert!(runtime.execute_delay_timed(&DelayTimedWord(Vec::new())).accepted());
    }
}

//! Completeness, determinism, completion to a CTA, intersection, and
//! complement.

use dta_constraints::constraint::Constraint;
use dta_constraints::disjunctive::DisjunctiveConstraint;
use dta_constraints::oracle::ConstraintOracle;
use dta_core::action::ActionId;
use dta_core::clock::ClockId;
use dta_core::location::LocationId;

use crate::errors::ModelError;
use crate::model::Dta;

/// For every `(location != sink, action)` pair, checks whether the
/// disjunction of outgoing guards covers the whole non-negative orthant.
/// An `UNKNOWN` oracle verdict is treated conservatively as "not complete".
pub fn is_complete(dta: &Dta, oracle: &dyn ConstraintOracle) -> bool {
    let clocks: Vec<ClockId> = dta.clocks().non_zero().map(|c| c.id()).collect();
    for loc in dta.locations().iter().map(|l| l.id()) {
        if Some(loc) == dta.sink() {
            continue;
        }
        for action in dta.alphabet().iter().map(|a| a.id()) {
            if !pair_is_complete(dta, oracle, loc, action, &clocks) {
                return false;
            }
        }
    }
    true
}

fn guards_for(dta: &Dta, loc: LocationId, action: ActionId, clocks: &[ClockId]) -> DisjunctiveConstraint {
    let disjuncts: Vec<Constraint> =
        dta.by_action(loc, action).iter().map(|&id| dta.transition(id).guard().clone()).collect();
    DisjunctiveConstraint::new(clocks.to_vec(), disjuncts)
}

fn pair_is_complete(
    dta: &Dta,
    oracle: &dyn ConstraintOracle,
    loc: LocationId,
    action: ActionId,
    clocks: &[ClockId],
) -> bool {
    let guards = guards_for(dta, loc, action, clocks);
    let uncovered = guards.negate();
    !uncovered.is_satisfiable(oracle)
}

/// For every `(location, action)` pair, every pair of distinct outgoing
/// transitions must have mutually unsatisfiable guards.
pub fn is_deterministic(dta: &Dta, oracle: &dyn ConstraintOracle) -> bool {
    for loc in dta.locations().iter().map(|l| l.id()) {
        for action in dta.alphabet().iter().map(|a| a.id()) {
            let ids = dta.by_action(loc, action);
            for i in 0..ids.len() {
                for j in (i + 1)..ids.len() {
                    let g1 = dta.transition(ids[i]).guard();
                    let g2 = dta.transition(ids[j]).guard();
                    if let Ok(both) = g1.and(g2) {
                        if both.is_satisfiable(oracle) {
                            return false;
                        }
                    }
                }
            }
        }
    }
    true
}

/// Completes `dta` into a CTA: a transition exists for every
/// `(non-sink location, action, valuation)` combination. Returns a clone if
/// already complete.
pub fn to_cta(dta: &Dta, oracle: &dyn ConstraintOracle) -> Result<Dta, ModelError> {
    if is_complete(dta, oracle) {
        return Ok(dta.clone());
    }
    let mut next = dta.clone();
    let sink = next.sink_or_create();
    let clocks: Vec<ClockId> = next.clocks().non_zero().map(|c| c.id()).collect();
    let all_clocks = clocks.clone();

    let locations: Vec<LocationId> = next.locations().iter().map(|l| l.id()).collect();
    let actions: Vec<ActionId> = next.alphabet().iter().map(|a| a.id()).collect();

    for &loc in &locations {
        if loc == sink {
            continue;
        }
        for &action in &actions {
            let existing = next.by_action(loc, action);
            if existing.is_empty() {
                let guard = Constraint::universal(clocks.clone());
                next.add_transition(loc, action, guard, Vec::new(), sink)?;
                continue;
            }

            let non_sink_guards: Vec<Constraint> = existing
                .iter()
                .filter(|&&id| next.transition(id).target() != sink)
                .map(|&id| next.transition(id).guard().clone())
                .collect();
            if non_sink_guards.is_empty() {
                continue;
            }
            let disjunction = DisjunctiveConstraint::new(clocks.clone(), non_sink_guards);
            let uncovered = disjunction.negate().negate_disjoint();
            for disjunct in uncovered.disjuncts() {
                if disjunct.is_satisfiable(oracle)
                    && !next.has_equivalent_transition(loc, action, disjunct, &all_clocks, sink)
                {
                    next.add_transition(loc, action, disjunct.clone(), all_clocks.clone(), sink)?;
                }
            }
        }
    }
    Ok(next)
}

/// `toCTA()`, then flip the accepting set (the sink becomes accepting iff it
/// was not already, exactly like every other location).
pub fn complement(dta: &Dta, oracle: &dyn ConstraintOracle) -> Result<Dta, ModelError> {
    let cta = to_cta(dta, oracle)?;
    let all: std::collections::BTreeSet<LocationId> = cta.locations().iter().map(|l| l.id()).collect();
    let flipped: std::collections::BTreeSet<LocationId> =
        all.difference(cta.accepting_locations()).copied().collect();
    Ok(Dta::new(
        cta.clocks().clone(),
        cta.alphabet().clone(),
        cta.locations().clone(),
        cta.init(),
        flipped,
    )
    .with_sink(cta.sink())
    .with_transitions_from(&cta)?)
}

/// Synchronised product (intersection) over the same clock/action universe:
/// BFS over location pairs, joining guards by union-of-atoms on shared
/// actions. Requires `self` and `other` to share the same `Clocks`/`Alphabet`
/// registries (both sides of an equivalence check in this system always do,
/// since they are built from the same learner session).
pub fn intersect(a: &Dta, b: &Dta, oracle: &dyn ConstraintOracle) -> Result<Dta, ModelError> {
    use std::collections::{HashMap, VecDeque};

    let clocks = a.clocks().clone();
    let alphabet = a.alphabet().clone();
    let mut locations = dta_core::location::Locations::new();
    let mut accepting = std::collections::BTreeSet::new();

    let init_pair = (a.init(), b.init());
    let mut pair_to_loc: HashMap<(LocationId, LocationId), LocationId> = HashMap::new();
    let init_loc = locations.create("(l0,r0)");
    pair_to_loc.insert(init_pair, init_loc);
    if a.is_accepting(a.init()) && b.is_accepting(b.init()) {
        accepting.insert(init_loc);
    }

    let mut dta = Dta::new(clocks.clone(), alphabet.clone(), locations, init_loc, accepting);
    // re-seed since `Dta::new` took locations by value above; rebuild the map
    // from the registry we just handed off is unnecessary, `pair_to_loc`
    // already tracks every id we allocated.

    let mut queue = VecDeque::new();
    queue.push_back(init_pair);
    let mut visited = std::collections::HashSet::new();
    visited.insert(init_pair);

    while let Some((la, lb)) = queue.pop_front() {
        let here = pair_to_loc[&(la, lb)];
        for action in alphabet.iter().map(|act| act.id()) {
            for &ta in a.by_action(la, action) {
                for &tb in b.by_action(lb, action) {
                    let guard_a = a.transition(ta).guard();
                    let guard_b = b.transition(tb).guard();
                    let joint = match guard_a.and(guard_b) {
                        Ok(c) => c,
                        Err(_) => continue,
                    };
                    if !joint.is_satisfiable(oracle) {
                        continue;
                    }
                    let target_pair = (a.transition(ta).target(), b.transition(tb).target());
                    let target_loc = *pair_to_loc.entry(target_pair).or_insert_with(|| {
                        let label = format!("({},{})", target_pair.0.index(), target_pair.1.index());
                        let id = dta.locations_mut().create(label);
                        if a.is_accepting(target_pair.0) && b.is_accepting(target_pair.1) {
                            dta.accepting_mut().insert(id);
                        }
                        if visited.insert(target_pair) {
                            queue.push_back(target_pair);
                        }
                        id
                    });

                    let mut reset: Vec<ClockId> = a.transition(ta).reset().to_vec();
                    reset.extend(b.transition(tb).reset().iter().copied());
                    reset.sort();
                    reset.dedup();
                    if !dta.has_equivalent_transition(here, action, &joint, &reset, target_loc) {
                        dta.add_transition(here, action, joint, reset, target_loc)?;
                    }
                }
            }
        }
    }
    Ok(dta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dta_constraints::atom::AtomConstraint;
    use dta_constraints::oracle::DifferenceLogicOracle;
    use dta_core::action::Alphabet;
    use dta_core::clock::Clocks;
    use dta_core::location::Locations;
    use dta_core::rational::Rational;
    use std::collections::BTreeSet;

    fn one_clock_target() -> Dta {
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
        dta
    }

    #[test]
    fn incomplete_target_is_detected() {
        let dta = one_clock_target();
        let oracle = DifferenceLogicOracle;
        assert!(!is_complete(&dta, &oracle));
    }

    #[test]
    fn completion_yields_a_complete_cta() {
        let dta = one_clock_target();
        let oracle = DifferenceLogicOracle;
        let cta = to_cta(&dta, &oracle).unwrap();
        assert!(is_complete(&cta, &oracle));
    }

    #[test]
    fn deterministic_target_is_detected() {
        let dta = one_clock_target();
        let oracle = DifferenceLogicOracle;
        assert!(is_deterministic(&dta, &oracle));
    }

    #[test]
    fn complement_flips_acceptance() {
        let dta = one_clock_target();
        let oracle = DifferenceLogicOracle;
        let comp = complement(&dta, &oracle).unwrap();
        assert_ne!(comp.accepting_locations(), dta.accepting_locations());
    }

    /// `{(a, t) : t >= 1}` complemented must concretely accept the word it
    /// rejected and reject the word it accepted.
    #[test]
    fn complement_accepts_and_rejects_concrete_words() {
        use crate::runtime::Runtime;
        use crate::words::DelayTimedWord;

        let dta = one_clock_target();
        let a = dta.alphabet().iter().next().unwrap().id();
        let oracle = DifferenceLogicOracle;
        let comp = complement(&dta, &oracle).unwrap();

        let half = DelayTimedWord(vec![(a, Rational::from_ratio(1, 2))]);
        let two = DelayTimedWord(vec![(a, Rational::from_integer(2))]);

        assert!(!Runtime::new(&dta).execute_delay_timed(&half).accepted());
        assert!(Runtime::new(&dta).execute_delay_timed(&two).accepted());

        assert!(Runtime::new(&comp).execute_delay_timed(&half).accepted());
        assert!(!Runtime::new(&comp).execute_delay_timed(&two).accepted());
    }

    /// `A.complement().complement()` must accept exactly the words `A` does,
    /// including after the sink id round-trips through two completions.
    #[test]
    fn double_complement_preserves_acceptance() {
        use crate::runtime::Runtime;
        use crate::words::DelayTimedWord;

        let dta = one_clock_target();
        let a = dta.alphabet().iter().next().unwrap().id();
        let oracle = DifferenceLogicOracle;
        let double = complement(&complement(&dta, &oracle).unwrap(), &oracle).unwrap();

        let half = DelayTimedWord(vec![(a, Rational::from_ratio(1, 2))]);
        let two = DelayTimedWord(vec![(a, Rational::from_integer(2))]);

        assert!(!Runtime::new(&double).execute_delay_timed(&half).accepted());
        assert!(Runtime::new(&double).execute_delay_timed(&two).accepted());
    }
}

//! Zone-based reachability search for a shortest accepting witness, plus the
//! delay solvers that turn a symbolic path into concrete timings.

use std::collections::{HashMap, VecDeque};

use dta_constraints::constraint::Constraint;
use dta_constraints::region::Region;
use dta_core::clock::{ClockId, Clocks};
use dta_core::location::LocationId;
use dta_core::rational::Rational;
use dta_core::valuation::ClockValuation;
use dta_zones::dbm::Dbm;

use crate::errors::WordError;
use crate::model::{Dta, TransitionId};
use crate::words::DelayTimedWord;

/// Finds a shortest [`DelayTimedWord`] reaching an accepting location, via
/// breadth-first search over `(location, zone)` pairs pruned by zone
/// inclusion against every previously passed zone at the same location.
/// Returns `None` iff the accepted language is empty.
pub fn find_witness(dta: &Dta) -> Option<DelayTimedWord> {
    struct Node {
        location: LocationId,
        zone: Dbm,
        parent: Option<usize>,
        via: Option<TransitionId>,
    }

    let clocks: Vec<ClockId> = dta.clocks().non_zero().map(|c| c.id()).collect();
    let start_zone = Dbm::initial(clocks).future();
    if start_zone.is_empty() {
        return None;
    }

    let mut nodes = vec![Node { location: dta.init(), zone: start_zone.clone(), parent: None, via: None }];
    let mut passed: HashMap<LocationId, Vec<Dbm>> = HashMap::new();
    passed.entry(dta.init()).or_default().push(start_zone);

    let mut goal = if dta.is_accepting(dta.init()) { Some(0) } else { None };
    let mut queue: VecDeque<usize> = VecDeque::new();
    queue.push_back(0);

    'search: while goal.is_none() {
        let Some(idx) = queue.pop_front() else { break };
        let location = nodes[idx].location;
        let zone = nodes[idx].zone.clone();

        for action in dta.alphabet().iter().map(|a| a.id()) {
            for &tid in dta.by_action(location, action) {
                let t = dta.transition(tid);
                let guarded = match zone.intersect_constraint(t.guard()) {
                    Ok(z) => z.canonical(),
                    Err(_) => continue,
                };
                if guarded.is_empty() {
                    continue;
                }
                let reset = match guarded.reset(t.reset()) {
                    Ok(z) => z,
                    Err(_) => continue,
                };
                let next_zone = reset.future();
                if next_zone.is_empty() {
                    continue;
                }
                let dominated = passed
                    .get(&t.target())
                    .map(|zones| zones.iter().any(|z| z.include(&next_zone).unwrap_or(false)))
                    .unwrap_or(false);
                if dominated {
                    continue;
                }

                let node_idx = nodes.len();
                nodes.push(Node {
                    location: t.target(),
                    zone: next_zone.clone(),
                    parent: Some(idx),
                    via: Some(tid),
                });
                passed.entry(t.target()).or_default().push(next_zone);

                if dta.is_accepting(t.target()) {
                    goal = Some(node_idx);
                    break 'search;
                }
                queue.push_back(node_idx);
            }
        }
    }

    let goal = goal?;
    let mut path = Vec::new();
    let mut cur = goal;
    while let Some(tid) = nodes[cur].via {
        path.push(tid);
        cur = nodes[cur].parent.expect("a node with a `via` transition always has a parent");
    }
    path.reverse();

    let mut steps = Vec::with_capacity(path.len());
    let mut v = ClockValuation::zero(dta.clocks());
    for tid in path {
        let t = dta.transition(tid);
        let delay = solve_delay(&v, t.guard())
            .expect("every transition on a zone-confirmed witness path admits a satisfying delay");
        let delayed =
            v.delay(&delay).expect("a delay solved from a non-negative lower bound is never negative");
        steps.push((t.action(), delay));
        v = delayed
            .reset(t.reset())
            .expect("transition resets only clocks within this model's clock set");
    }
    Some(DelayTimedWord(steps))
}

/// Finds a delay `d >= 0` such that `v.delay(d)` satisfies `guard`, by
/// accumulating the tightest lower/upper bound `d` can take from each atom:
/// atoms between two non-zero clocks are delay-invariant (the difference
/// cancels) and must already hold; atoms against the zero clock bound `d`
/// directly. A closed lower bound is used exactly; an open one is split to
/// the midpoint of a finite interval, or nudged by a small constant when the
/// interval is unbounded above.
pub fn solve_delay(v: &ClockValuation, guard: &Constraint) -> Result<Rational, WordError> {
    let mut lower = Rational::zero();
    let mut lower_closed = true;
    let mut upper: Option<(Rational, bool)> = None;

    for atom in guard.atoms() {
        if atom.is_self_difference() {
            continue;
        }
        if atom.c2() == ClockId::ZERO {
            let vc = v.value(atom.c1()).expect("guard atoms only name clocks within this valuation");
            let limit = atom.bound().checked_sub(vc).expect("bound and clock value are both finite");
            upper = Some(tighter_upper(upper, limit, atom.is_closed()));
        } else if atom.c1() == ClockId::ZERO {
            let vc = v.value(atom.c2()).expect("guard atoms only name clocks within this valuation");
            let limit = atom.bound().neg().checked_sub(vc).expect("bound and clock value are both finite");
            let (next_lower, next_closed) = tighter_lower((lower, lower_closed), limit, atom.is_closed());
            lower = next_lower;
            lower_closed = next_closed;
        } else if !atom.is_satisfied(v) {
            return Err(WordError::Infeasible);
        }
    }

    if let Some((u, u_closed)) = &upper {
        let empty = *u < lower || (*u == lower && !(lower_closed && *u_closed));
        if empty {
            return Err(WordError::Infeasible);
        }
    }

    if lower_closed {
        return Ok(lower);
    }
    match &upper {
        Some((u, _)) if u.is_finite() => {
            let sum = lower.checked_add(u).expect("lower and upper are both finite");
            sum.checked_div(&Rational::from_integer(2)).map_err(|_| WordError::Infeasible)
        }
        _ => Ok(lower.checked_add(&Rational::epsilon()).expect("lower bound is finite")),
    }
}

/// `true` iff `candidate` (at `closed`) is a tighter upper bound than `current`.
fn tighter_upper(current: Option<(Rational, bool)>, candidate: Rational, closed: bool) -> (Rational, bool) {
    match current {
        None => (candidate, closed),
        Some((u, u_closed)) => {
            if candidate < u || (candidate == u && !closed && u_closed) {
                (candidate, closed)
            } else {
                (u, u_closed)
            }
        }
    }
}

fn tighter_lower(current: (Rational, bool), candidate: Rational, closed: bool) -> (Rational, bool) {
    let (lower, lower_closed) = current;
    if candidate > lower || (candidate == lower && !closed && lower_closed) {
        (candidate, closed)
    } else {
        (lower, lower_closed)
    }
}

/// Finds a delay `d >= 0` such that `v.delay(d)` falls in `region`, by
/// reusing [`solve_delay`] against the region's own constraint form: a
/// region and its `to_constraint` projection describe the same equivalence
/// class, so any witness for one is a witness for the other.
pub fn solve_delay_to_region(v: &ClockValuation, region: &Region, clocks: &Clocks) -> Option<Rational> {
    let scope: Vec<ClockId> = clocks.non_zero().map(|c| c.id()).collect();
    let guard = region.to_constraint(scope, true);
    solve_delay(v, &guard).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dta_constraints::atom::AtomConstraint;
    use dta_core::action::Alphabet;
    use dta_core::location::Locations;
    use std::collections::BTreeSet;

    fn one_clock_target() -> Dta {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 2);
        let mut alphabet = Alphabet::new();
        let a = alphabet.create_action("a");
        let mut locations = Locations::new();
        let l0 = locations.create("l0");
        let l1 = locations.create("l1");
        let mut accepting = BTreeSet::new();
        accepting.insert(l1);
        let mut dta = Dta::new(clocks, alphabet, locations, l0, accepting);
        let guard = Constraint::new(
            vec![x],
            vec![
                AtomConstraint::lower(x, Rational::from_integer(1), true).unwrap(),
                AtomConstraint::upper(x, Rational::from_integer(2), true).unwrap(),
            ],
        )
        .unwrap();
        dta.add_transition(l0, a, guard, vec![], l1).unwrap();
        dta
    }

    #[test]
    fn witness_found_for_reachable_target() {
        let dta = one_clock_target();
        let witness = find_witness(&dta).expect("target location is reachable");
        assert_eq!(witness.0.len(), 1);
        let (_, delay) = &witness.0[0];
        assert!(*delay >= Rational::from_integer(1));
        assert!(*delay <= Rational::from_integer(2));
    }

    #[test]
    fn no_witness_for_unreachable_accepting_location() {
        let mut clocks = Clocks::new();
        clocks.create("x", 1);
        let mut alphabet = Alphabet::new();
        alphabet.create_action("a");
        let mut locations = Locations::new();
        let l0 = locations.create("l0");
        let l1 = locations.create("l1");
        let mut accepting = BTreeSet::new();
        accepting.insert(l1);
        let dta = Dta::new(clocks, alphabet, locations, l0, accepting);
        assert!(find_witness(&dta).is_none());
    }

    #[test]
    fn solve_delay_picks_closed_lower_bound() {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 2);
        let v = ClockValuation::zero(&clocks);
        let guard =
            Constraint::new(vec![x], vec![AtomConstraint::lower(x, Rational::from_integer(1), true).unwrap()])
                .unwrap();
        let d = solve_delay(&v, &guard).unwrap();
        assert_eq!(d, Rational::from_integer(1));
    }

    #[test]
    fn solve_delay_keeps_open_lower_bound_tied_with_a_closed_one() {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 2);
        let y = clocks.create("y", 2);
        let v = ClockValuation::zero(&clocks);
        let guard = Constraint::new(
            vec![x, y],
            vec![
                AtomConstraint::lower(x, Rational::from_integer(1), false).unwrap(),
                AtomConstraint::lower(y, Rational::from_integer(1), true).unwrap(),
            ],
        )
        .unwrap();
        let d = solve_delay(&v, &guard).unwrap();
        assert!(d > Rational::from_integer(1), "d = {d:?} must satisfy the open bound x > 1");
    }

    #[test]
    fn solve_delay_rejects_empty_interval() {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 2);
        let v = ClockValuation::zero(&clocks);
        let guard = Constraint::new(
            vec![x],
            vec![
                AtomConstraint::lower(x, Rational::from_integer(3), true).unwrap(),
                AtomConstraint::upper(x, Rational::from_integer(1), true).unwrap(),
            ],
        )
        .unwrap();
        assert!(solve_delay(&v, &guard).is_err());
    }
}

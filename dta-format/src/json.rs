//! Import/export between the JSON persistence document and a live
//! [`Dta`].

use std::collections::{BTreeMap, BTreeSet};

use num_traits::ToPrimitive;

use dta_automaton::Dta;
use dta_constraints::atom::AtomConstraint;
use dta_constraints::constraint::{Constraint, Simplified};
use dta_core::action::Alphabet;
use dta_core::clock::{ClockId, Clocks};
use dta_core::location::Locations;
use dta_core::rational::Rational;

use crate::document::{DtaDocument, LocationDoc, TransitionDoc};
use crate::errors::FormatError;
use crate::interval::{format_interval, parse_interval};

/// Parses a JSON document into a live [`Dta`]. Per-clock kappa is inferred
/// as the largest integer bound named anywhere in a guard for that clock;
/// non-integer bounds never raise it.
pub fn import(json: &str) -> Result<Dta, FormatError> {
    let doc: DtaDocument = serde_json::from_str(json)?;

    let mut kappas: BTreeMap<String, u32> = doc.clocks.iter().map(|c| (c.clone(), 0)).collect();
    for t in &doc.transitions {
        for (clock_name, interval) in &t.guard {
            let (lo, hi) = parse_interval(interval)?;
            for (value, _) in [lo, hi].into_iter().flatten() {
                if !value.is_integer() {
                    continue;
                }
                let floor = value.floor().map_err(|_| FormatError::InvalidInterval(interval.clone()))?;
                let floor = floor.to_i64().unwrap_or(0).max(0) as u32;
                kappas.entry(clock_name.clone()).and_modify(|k| *k = (*k).max(floor)).or_insert(floor);
            }
        }
    }

    let mut clocks = Clocks::new();
    let mut clock_ids: BTreeMap<String, ClockId> = BTreeMap::new();
    for name in &doc.clocks {
        let kappa = *kappas.get(name).unwrap_or(&0);
        clock_ids.insert(name.clone(), clocks.create(name.clone(), kappa));
    }

    let mut alphabet = Alphabet::new();
    for name in &doc.actions {
        alphabet.create_action(name.clone());
    }

    let mut locations = Locations::new();
    let mut location_ids: BTreeMap<String, _> = BTreeMap::new();
    let mut accepting = BTreeSet::new();
    for loc in &doc.locations {
        let id = locations.create(loc.name.clone());
        location_ids.insert(loc.name.clone(), id);
        if loc.accepting {
            accepting.insert(id);
        }
    }
    let init = *location_ids
        .get(&doc.init_location)
        .ok_or_else(|| FormatError::UnknownLocation(doc.init_location.clone()))?;

    let mut dta = Dta::new(clocks, alphabet, locations, init, accepting);
    let scope: Vec<ClockId> = clock_ids.values().copied().collect();

    for t in &doc.transitions {
        let source =
            *location_ids.get(&t.source).ok_or_else(|| FormatError::UnknownLocation(t.source.clone()))?;
        let target =
            *location_ids.get(&t.target).ok_or_else(|| FormatError::UnknownLocation(t.target.clone()))?;
        let action =
            dta.alphabet().lookup(&t.action).ok_or_else(|| FormatError::UnknownAction(t.action.clone()))?;

        let mut atoms = Vec::new();
        for (clock_name, interval) in &t.guard {
            let &clock =
                clock_ids.get(clock_name).ok_or_else(|| FormatError::UnknownClock(clock_name.clone()))?;
            let (lo, hi) = parse_interval(interval)?;
            if let Some((value, closed)) = lo {
                atoms.push(AtomConstraint::lower(clock, value, closed)?);
            }
            if let Some((value, closed)) = hi {
                atoms.push(AtomConstraint::upper(clock, value, closed)?);
            }
        }
        let guard = Constraint::new(scope.clone(), atoms)?;

        let reset: Vec<ClockId> = t
            .reset
            .iter()
            .map(|name| clock_ids.get(name).copied().ok_or_else(|| FormatError::UnknownClock(name.clone())))
            .collect::<Result<_, _>>()?;

        dta.add_transition(source, action, guard, reset, target)?;
    }

    Ok(dta)
}

/// Renders `dta` to the JSON persistence document. Guards that use a
/// genuine two-clock difference atom can't be expressed in the per-clock
/// interval syntax; such atoms are dropped and a warning is logged.
pub fn export(dta: &Dta) -> Result<String, FormatError> {
    let clocks = dta.clocks();
    let alphabet = dta.alphabet();
    let locations = dta.locations();

    let clock_names: Vec<String> = clocks.non_zero().map(|c| c.name().to_string()).collect();
    let action_names: Vec<String> = alphabet.iter().map(|a| a.name().to_string()).collect();

    let location_docs: Vec<LocationDoc> = locations
        .iter()
        .map(|loc| LocationDoc {
            name: loc.label().to_string(),
            accepting: dta.is_accepting(loc.id()),
            invariant: None,
        })
        .collect();

    let init_location = locations.get(dta.init()).expect("dta.init() names a location in this dta").label().to_string();

    let mut transitions = Vec::new();
    for t in dta.transitions() {
        let source = locations.get(t.source()).expect("transition endpoints come from this dta").label().to_string();
        let target = locations.get(t.target()).expect("transition endpoints come from this dta").label().to_string();
        let action = alphabet.get(t.action()).expect("transition actions come from this dta").name().to_string();
        let reset: Vec<String> = t
            .reset()
            .iter()
            .map(|&c| clocks.get(c).expect("reset clocks come from this dta").name().to_string())
            .collect();
        let guard = guard_to_intervals(t.guard(), clocks);
        transitions.push(TransitionDoc { source, action, guard, reset, target });
    }

    let doc = DtaDocument {
        name: "hypothesis".to_string(),
        clocks: clock_names,
        actions: action_names,
        locations: location_docs,
        init_location,
        transitions,
    };

    Ok(serde_json::to_string_pretty(&doc)?)
}

fn guard_to_intervals(guard: &Constraint, clocks: &Clocks) -> BTreeMap<String, String> {
    let simplified = match guard.simplify() {
        Simplified::Sat(c) => c,
        Simplified::Unsat => {
            tracing::warn!("exporting an unsatisfiable guard verbatim");
            guard.clone()
        }
    };

    let mut lower: BTreeMap<ClockId, (Rational, bool)> = BTreeMap::new();
    let mut upper: BTreeMap<ClockId, (Rational, bool)> = BTreeMap::new();
    for atom in simplified.atoms() {
        let (c1, c2) = (atom.c1(), atom.c2());
        if c2 == ClockId::ZERO && c1 != ClockId::ZERO {
            upper.insert(c1, (atom.bound().clone(), atom.is_closed()));
        } else if c1 == ClockId::ZERO && c2 != ClockId::ZERO {
            lower.insert(c2, (atom.bound().neg(), atom.is_closed()));
        } else if c1 != c2 {
            tracing::warn!(
                clock1 = c1.index(),
                clock2 = c2.index(),
                "dropping difference atom on export: the persistence format only encodes single-clock bounds"
            );
        }
    }

    let mut map = BTreeMap::new();
    for c in clocks.non_zero() {
        let id = c.id();
        let lo = lower.get(&id).cloned();
        let hi = upper.get(&id).cloned();
        let lo_is_default = matches!(&lo, Some((v, closed)) if v.is_zero() && *closed);
        if (lo_is_default || lo.is_none()) && hi.is_none() {
            continue;
        }
        let lo = lo.unwrap_or((Rational::zero(), true));
        map.insert(c.name().to_string(), format_interval(lo, hi));
    }
    map
}

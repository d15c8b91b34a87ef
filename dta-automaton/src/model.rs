//! The DTA model: locations, transitions, and the indices over them.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use dta_constraints::constraint::Constraint;
use dta_core::action::{ActionId, Alphabet};
use dta_core::clock::{ClockId, Clocks};
use dta_core::location::{Location, LocationId, Locations};

use crate::errors::ModelError;

/// Stable identifier for a [`Transition`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionId(u32);

impl TransitionId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single edge: `source --action, guard, reset--> target`.
#[derive(Clone, Debug)]
pub struct Transition {
    id: TransitionId,
    source: LocationId,
    action: ActionId,
    guard: Constraint,
    reset: Vec<ClockId>,
    target: LocationId,
}

impl Transition {
    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn source(&self) -> LocationId {
        self.source
    }

    pub fn action(&self) -> ActionId {
        self.action
    }

    pub fn guard(&self) -> &Constraint {
        &self.guard
    }

    pub fn reset(&self) -> &[ClockId] {
        &self.reset
    }

    pub fn target(&self) -> LocationId {
        self.target
    }

    /// `true` iff `other` has the same source, action, target, guard, and
    /// reset set (used by completion to avoid duplicate sink transitions).
    fn structurally_equal(&self, other: &Transition) -> bool {
        self.source == other.source
            && self.action == other.action
            && self.target == other.target
            && self.guard == other.guard
            && reset_sets_equal(&self.reset, &other.reset)
    }
}

fn reset_sets_equal(a: &[ClockId], b: &[ClockId]) -> bool {
    let mut a: Vec<ClockId> = a.to_vec();
    let mut b: Vec<ClockId> = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

/// A deterministic timed automaton: clocks, alphabet, locations, transitions,
/// and the indices over them. Mutations invalidate the lazily-computed
/// max-constant cache.
pub struct Dta {
    clocks: Clocks,
    alphabet: Alphabet,
    locations: Locations,
    accepting: BTreeSet<LocationId>,
    init: LocationId,
    sink: Option<LocationId>,
    transitions: Vec<Transition>,
    outgoing: HashMap<LocationId, Vec<TransitionId>>,
    incoming: HashMap<LocationId, Vec<TransitionId>>,
    by_action: HashMap<(LocationId, ActionId), Vec<TransitionId>>,
    max_constant: OnceLock<u32>,
}

impl Clone for Dta {
    fn clone(&self) -> Self {
        let max_constant = OnceLock::new();
        if let Some(&k) = self.max_constant.get() {
            let _ = max_constant.set(k);
        }
        Dta {
            clocks: self.clocks.clone(),
            alphabet: self.alphabet.clone(),
            locations: self.locations.clone(),
            accepting: self.accepting.clone(),
            init: self.init,
            sink: self.sink,
            transitions: self.transitions.clone(),
            outgoing: self.outgoing.clone(),
            incoming: self.incoming.clone(),
            by_action: self.by_action.clone(),
            max_constant,
        }
    }
}

impl Dta {
    pub fn new(
        clocks: Clocks,
        alphabet: Alphabet,
        locations: Locations,
        init: LocationId,
        accepting: BTreeSet<LocationId>,
    ) -> Dta {
        Dta {
            clocks,
            alphabet,
            locations,
            accepting,
            init,
            sink: None,
            transitions: Vec::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            by_action: HashMap::new(),
            max_constant: OnceLock::new(),
        }
    }

    pub fn clocks(&self) -> &Clocks {
        &self.clocks
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn locations_mut(&mut self) -> &mut Locations {
        &mut self.locations
    }

    pub fn accepting_mut(&mut self) -> &mut BTreeSet<LocationId> {
        &mut self.accepting
    }

    pub fn init(&self) -> LocationId {
        self.init
    }

    pub fn is_accepting(&self, loc: LocationId) -> bool {
        self.accepting.contains(&loc)
    }

    pub fn accepting_locations(&self) -> &BTreeSet<LocationId> {
        &self.accepting
    }

    pub fn sink(&self) -> Option<LocationId> {
        self.sink
    }

    /// Returns the existing sink location, or allocates one.
    pub fn sink_or_create(&mut self) -> LocationId {
        if let Some(s) = self.sink {
            return s;
        }
        let id = self.locations.create_sink("sink");
        self.sink = Some(id);
        self.invalidate_cache();
        id
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.index()]
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn outgoing(&self, loc: LocationId) -> &[TransitionId] {
        self.outgoing.get(&loc).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming(&self, loc: LocationId) -> &[TransitionId] {
        self.incoming.get(&loc).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn by_action(&self, loc: LocationId, action: ActionId) -> &[TransitionId] {
        self.by_action.get(&(loc, action)).map(Vec::as_slice).unwrap_or(&[])
    }

    fn get_location(&self, id: LocationId) -> Result<&Location, ModelError> {
        self.locations.get(id).map_err(|_| ModelError::UnknownLocation(id.index() as u32))
    }

    pub fn add_transition(
        &mut self,
        source: LocationId,
        action: ActionId,
        guard: Constraint,
        reset: Vec<ClockId>,
        target: LocationId,
    ) -> Result<TransitionId, ModelError> {
        self.get_location(source)?;
        self.get_location(target)?;
        if self.alphabet.get(action).is_err() {
            return Err(ModelError::UnknownAction(action.index() as u32));
        }
        let id = TransitionId(self.transitions.len() as u32);
        let t = Transition { id, source, action, guard, reset, target };
        self.outgoing.entry(source).or_default().push(id);
        self.incoming.entry(target).or_default().push(id);
        self.by_action.entry((source, action)).or_default().push(id);
        self.transitions.push(t);
        self.invalidate_cache();
        Ok(id)
    }

    /// `true` iff `target` already carries a structurally identical
    /// transition for `(source, action)`.
    pub fn has_equivalent_transition(
        &self,
        source: LocationId,
        action: ActionId,
        guard: &Constraint,
        reset: &[ClockId],
        target: LocationId,
    ) -> bool {
        let candidate = Transition {
            id: TransitionId(u32::MAX),
            source,
            action,
            guard: guard.clone(),
            reset: reset.to_vec(),
            target,
        };
        self.by_action(source, action)
            .iter()
            .any(|&id| self.transition(id).structurally_equal(&candidate))
    }

    /// Restores a known sink id after rebuilding a `Dta` from a cloned
    /// `Locations` registry, which preserves the `is_sink` flag on the
    /// location itself but not this struct's own `sink` cache (used after
    /// complementation, which reuses `other`'s location set).
    pub fn with_sink(mut self, sink: Option<LocationId>) -> Dta {
        self.sink = sink;
        self
    }

    /// Copies every transition from `other` into `self`, assuming both share
    /// the same location/action universe (used after rebuilding a location
    /// set with a different accepting partition, e.g. complementation).
    pub fn with_transitions_from(mut self, other: &Dta) -> Result<Dta, ModelError> {
        for t in other.transitions() {
            self.add_transition(t.source(), t.action(), t.guard().clone(), t.reset().to_vec(), t.target())?;
        }
        Ok(self)
    }

    fn invalidate_cache(&mut self) {
        self.max_constant = OnceLock::new();
    }

    /// The largest per-clock saturation ceiling in this model's clock set.
    pub fn max_constant(&self) -> u32 {
        *self.max_constant.get_or_init(|| self.clocks.non_zero().map(|c| c.kappa()).max().unwrap_or(0))
    }
}

impl std::fmt::Display for Dta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for t in &self.transitions {
            let source = self.locations.get(t.source).map(Location::label).unwrap_or("?");
            let target = self.locations.get(t.target).map(Location::label).unwrap_or("?");
            let action = self.alphabet.get(t.action).map(|a| a.name()).unwrap_or("?");
            let resets: Vec<&str> = t
                .reset
                .iter()
                .map(|&c| self.clocks.get(c).map(|cl| cl.name()).unwrap_or("?"))
                .collect();
            writeln!(
                f,
                "{source} --{action}, {guard:?}, {{{resets}}}--> {target}",
                guard = t.guard,
                resets = resets.join(", "),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dta_constraints::atom::AtomConstraint;
    use dta_core::rational::Rational;

    fn fixture() -> (Dta, ActionId, LocationId, LocationId) {
        let mut clocks = Clocks::new();
        let x = clocks.create("x", 1);
        let mut alphabet = Alphabet::new();
        let a = alphabet.create_action("a");
        let mut locations = Locations::new();
        let l0 = locations.create("l0");
        let l1 = locations.create("l1");
        let mut accepting = BTreeSet::new();
        accepting.insert(l1);
        let dta = Dta::new(clocks, alphabet, locations, l0, accepting);
        let _ = x;
        (dta, a, l0, l1)
    }

    #[test]
    fn add_transition_and_lookup() {
        let (mut dta, a, l0, l1) = fixture();
        let x = dta.clocks().non_zero().next().unwrap().id();
        let guard =
            Constraint::new(vec![x], vec![AtomConstraint::lower(x, Rational::from_integer(1), true).unwrap()])
                .unwrap();
        let t = dta.add_transition(l0, a, guard, vec![], l1).unwrap();
        assert_eq!(dta.outgoing(l0), &[t]);
        assert_eq!(dta.by_action(l0, a), &[t]);
        assert!(dta.incoming(l1).contains(&t));
    }

    #[test]
    fn unknown_location_is_rejected() {
        let (mut dta, a, l0, _) = fixture();
        let bogus = {
            let mut other = Locations::new();
            other.create("elsewhere")
        };
        assert!(dta.add_transition(l0, a, Constraint::universal(vec![]), vec![], bogus).is_err());
    }

    #[test]
    fn max_constant_tracks_clocks() {
        let (dta, ..) = fixture();
        assert_eq!(dta.max_constant(), 1);
    }
}

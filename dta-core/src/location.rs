//! Locations: stable-id entities with a sink marker, created only through
//! the [`Locations`] factory.

use std::sync::Arc;

use crate::errors::EntityError;

/// Stable integer identifier for a [`Location`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationId(u32);

impl LocationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A location: a stable id, a label, and a sink marker. Equality by id.
#[derive(Clone, Debug)]
pub struct Location {
    id: LocationId,
    label: Arc<str>,
    sink: bool,
}

impl Location {
    pub fn id(&self) -> LocationId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_sink(&self) -> bool {
        self.sink
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Location {}

/// Factory and registry for [`Location`]s, assigning monotonic ids.
#[derive(Clone, Debug, Default)]
pub struct Locations {
    locations: Vec<Location>,
}

impl Locations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, label: impl Into<String>) -> LocationId {
        self.create_impl(label, false)
    }

    /// Creates a sink location. A DTA should have at most one of these,
    /// lazily allocated by completion.
    pub fn create_sink(&mut self, label: impl Into<String>) -> LocationId {
        self.create_impl(label, true)
    }

    fn create_impl(&mut self, label: impl Into<String>, sink: bool) -> LocationId {
        let id = LocationId(self.locations.len() as u32);
        self.locations.push(Location { id, label: Arc::from(label.into().as_str()), sink });
        id
    }

    pub fn get(&self, id: LocationId) -> Result<&Location, EntityError> {
        self.locations
            .get(id.index())
            .ok_or(EntityError::UnknownLocation(id.0))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_marker_is_set_only_via_factory() {
        let mut locs = Locations::new();
        let normal = locs.create("l0");
        let sink = locs.create_sink("sink");
        assert!(!locs.get(normal).unwrap().is_sink());
        assert!(locs.get(sink).unwrap().is_sink());
    }
}

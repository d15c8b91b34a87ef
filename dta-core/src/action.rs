//! Actions and the alphabet that collects them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::EntityError;

/// Stable integer identifier for an [`Action`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(u32);

impl ActionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An action: a stable id and a name. Two actions compare equal iff their
/// names match.
#[derive(Clone, Debug)]
pub struct Action {
    id: ActionId,
    name: Arc<str>,
}

impl Action {
    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Action {}

/// An ordered `id -> Action` mapping plus a `name -> id` lookup, preserving
/// insertion order on iteration.
#[derive(Clone, Debug, Default)]
pub struct Alphabet {
    actions: Vec<Action>,
    by_name: HashMap<String, ActionId>,
}

impl Alphabet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of the action named `name`, creating it if it is not
    /// already present (idempotent on name collision).
    pub fn create_action(&mut self, name: impl Into<String>) -> ActionId {
        let name = name.into();
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let id = ActionId(self.actions.len() as u32);
        self.actions.push(Action { id, name: Arc::from(name.as_str()) });
        self.by_name.insert(name, id);
        id
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Option<ActionId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: ActionId) -> Result<&Action, EntityError> {
        self.actions
            .get(id.index())
            .ok_or(EntityError::UnknownAction(id.0))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_action_is_idempotent_on_name() {
        let mut alphabet = Alphabet::new();
        let a1 = alphabet.create_action("a");
        let a2 = alphabet.create_action("a");
        assert_eq!(a1, a2);
        assert_eq!(alphabet.len(), 1);
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut alphabet = Alphabet::new();
        alphabet.create_action("b");
        alphabet.create_action("a");
        let names: Vec<_> = alphabet.iter().map(Action::name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}

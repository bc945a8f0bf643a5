use std::collections::BTreeSet;

use crate::{
    automaton::StateId,
    error::{AutomatonError, Result},
};

/// The state set of an automaton together with its start and final flags.
///
/// Invariants: the start state, if set, is a member of `states`, and
/// `accepting` is a subset of `states`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTable {
    states: BTreeSet<StateId>,
    start: Option<StateId>,
    accepting: BTreeSet<StateId>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> &BTreeSet<StateId> {
        &self.states
    }

    pub fn start(&self) -> Option<&StateId> {
        self.start.as_ref()
    }

    pub fn accepting(&self) -> &BTreeSet<StateId> {
        &self.accepting
    }

    pub fn contains(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    pub fn is_accepting(&self, state: &str) -> bool {
        self.accepting.contains(state)
    }

    /// Adds a state. The first state added becomes the start state, as does
    /// any state added with `is_start`.
    pub fn add(&mut self, state: StateId, is_start: bool, is_final: bool) {
        if is_start || self.start.is_none() {
            self.start = Some(state.clone());
        }
        if is_final {
            self.accepting.insert(state.clone());
        }
        self.states.insert(state);
    }

    /// Adds a state without touching the start flag.
    pub fn insert(&mut self, state: StateId, is_final: bool) {
        if is_final {
            self.accepting.insert(state.clone());
        }
        self.states.insert(state);
    }

    pub fn require(&self, state: &str) -> Result<()> {
        if self.contains(state) {
            Ok(())
        } else {
            Err(AutomatonError::UnknownState(state.to_string()))
        }
    }

    pub fn set_start(&mut self, state: &str) -> Result<()> {
        self.require(state)?;
        self.start = Some(state.to_string());
        Ok(())
    }

    pub fn clear_start(&mut self) {
        self.start = None;
    }

    pub fn set_accepting(&mut self, state: &str, accepting: bool) -> Result<()> {
        self.require(state)?;
        if accepting {
            self.accepting.insert(state.to_string());
        } else {
            self.accepting.remove(state);
        }
        Ok(())
    }

    /// Flips the final flag of a state and returns the new membership.
    pub fn toggle_accepting(&mut self, state: &str) -> Result<bool> {
        let accepting = !self.is_accepting(state);
        self.set_accepting(state, accepting)?;
        Ok(accepting)
    }

    /// Removes a state and clears the flags referencing it. Returns false if
    /// the state did not exist.
    pub fn remove(&mut self, state: &str) -> bool {
        if !self.states.remove(state) {
            return false;
        }
        if self.start.as_deref() == Some(state) {
            self.start = None;
        }
        self.accepting.remove(state);
        true
    }

    /// Renames a state, carrying its flags over. Renaming a state to its own
    /// name does nothing.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        self.require(old)?;
        if old == new {
            return Ok(());
        }
        if self.contains(new) {
            return Err(AutomatonError::NameConflict(new.to_string()));
        }

        self.states.remove(old);
        self.states.insert(new.to_string());
        if self.start.as_deref() == Some(old) {
            self.start = Some(new.to_string());
        }
        if self.accepting.remove(old) {
            self.accepting.insert(new.to_string());
        }
        Ok(())
    }

    /// Returns a name based on `base` that is not yet used by any state.
    pub fn fresh_name(&self, base: &str) -> StateId {
        if !self.contains(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{}{}", base, i))
            .find(|name| !self.contains(name))
            .unwrap_or_else(|| base.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_state_becomes_start() {
        let mut table = StateTable::new();
        table.add("q0".into(), false, false);
        table.add("q1".into(), false, true);
        assert_eq!(table.start().map(String::as_str), Some("q0"));

        table.add("q2".into(), true, false);
        assert_eq!(table.start().map(String::as_str), Some("q2"));
    }

    #[test]
    fn test_remove_clears_flags() {
        let mut table = StateTable::new();
        table.add("q0".into(), true, true);
        assert!(table.remove("q0"));
        assert!(table.start().is_none());
        assert!(table.accepting().is_empty());
        assert!(!table.remove("q0"));
    }

    #[test]
    fn test_rename() {
        let mut table = StateTable::new();
        table.add("q0".into(), true, true);
        table.add("q1".into(), false, false);

        assert!(matches!(
            table.rename("q0", "q1"),
            Err(AutomatonError::NameConflict(_))
        ));
        assert!(matches!(
            table.rename("q9", "q3"),
            Err(AutomatonError::UnknownState(_))
        ));

        table.rename("q0", "s").unwrap();
        assert_eq!(table.start().map(String::as_str), Some("s"));
        assert!(table.is_accepting("s"));
        assert!(!table.contains("q0"));
    }

    #[test]
    fn test_fresh_name() {
        let mut table = StateTable::new();
        table.add("_error".into(), false, false);
        table.add("_error1".into(), false, false);
        assert_eq!(table.fresh_name("_error"), "_error2");
        assert_eq!(table.fresh_name("trap"), "trap");
    }
}

use std::{collections::BTreeSet, path::Path};

use crate::{
    automaton::states::StateTable,
    error::Result,
};

pub mod matcher;
pub mod mealy;
pub mod moore;
pub mod nfa;
pub mod pda;
pub mod states;
pub mod symbol;
pub mod transducer;
pub mod turing;

/// States are identified by their name.
pub type StateId = String;

/// A set of states, ordered so that results are reproducible.
pub type StateSet = BTreeSet<StateId>;

/// State bookkeeping shared by every automaton kind.
pub trait FiniteStateMachine {
    fn state_table(&self) -> &StateTable;
    fn state_table_mut(&mut self) -> &mut StateTable;

    /// Removes the state together with every transition that mentions it.
    /// Removing an unknown state does nothing.
    fn remove_state(&mut self, state: &str);

    /// Renames the state everywhere it occurs, including transitions.
    fn rename_state(&mut self, old: &str, new: &str) -> Result<()>;

    fn states(&self) -> &StateSet {
        self.state_table().states()
    }

    fn state_count(&self) -> usize {
        self.states().len()
    }

    fn has_state(&self, state: &str) -> bool {
        self.state_table().contains(state)
    }

    fn start_state(&self) -> Option<&StateId> {
        self.state_table().start()
    }

    /// Makes `state` the start state, replacing the previous one.
    fn set_start_state(&mut self, state: &str) -> Result<()> {
        self.state_table_mut().set_start(state)
    }
}

/// Automata that accept by final state.
pub trait Acceptor: FiniteStateMachine {
    fn final_states(&self) -> &StateSet {
        self.state_table().accepting()
    }

    fn is_final(&self, state: &str) -> bool {
        self.state_table().is_accepting(state)
    }

    fn set_final(&mut self, state: &str, is_final: bool) -> Result<()> {
        self.state_table_mut().set_accepting(state, is_final)
    }

    /// Flips the final flag of `state` and returns whether it is now final.
    fn toggle_final(&mut self, state: &str) -> Result<bool> {
        self.state_table_mut().toggle_accepting(state)
    }

    /// Checks if a set of states contains a final state.
    fn contains_final<'a>(&self, states: impl IntoIterator<Item = &'a StateId>) -> bool {
        states.into_iter().any(|s| self.is_final(s))
    }
}

/// The basic trait for anything that defines a language over strings.
pub trait Language {
    fn accepts(&self, input: &str) -> bool;
}

/// The JSON persistence format of an automaton kind.
///
/// Loading is lenient: entries that cannot be understood are skipped with a
/// warning, only a document that is not valid JSON at all fails.
pub trait JsonFormat: Sized {
    fn to_json(&self) -> Result<String>;

    fn from_json(json: &str) -> Result<Self>;

    fn to_json_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        Ok(std::fs::write(path, self.to_json()?)?)
    }

    fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }
}

/// Converts a byte offset into `input` into a character count.
pub(crate) fn char_offset(input: &str, byte: usize) -> usize {
    input[..byte].chars().count()
}

/// Picks the start state of a loaded document. A start state that is not a
/// known state falls back to the smallest state name.
pub(crate) fn restore_start(table: &mut StateTable, start: Option<&str>) {
    let Some(start) = start else {
        return;
    };

    if table.set_start(start).is_ok() {
        return;
    }

    match table.states().first().cloned() {
        Some(fallback) => {
            tracing::warn!(
                "Start state '{}' not found. Using '{}' as start state.",
                start,
                fallback
            );
            table.set_start(&fallback).ok();
        }
        None => {
            tracing::warn!("Start state '{}' not found and there are no states.", start);
        }
    }
}

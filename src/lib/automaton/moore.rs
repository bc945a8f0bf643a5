use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    automaton::{
        FiniteStateMachine, JsonFormat, Language, StateId, restore_start, states::StateTable,
        transducer::Transducer,
    },
    error::{AutomatonError, Result},
};

/// A Moore machine: every state carries an output symbol which is emitted
/// whenever the state is entered, the start state included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MooreMachine {
    table: StateTable,
    outputs: BTreeMap<StateId, String>,
    transitions: HashMap<StateId, BTreeMap<String, StateId>>,
}

impl MooreMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a state with its output symbol. The first state added becomes the
    /// start state. Adding an existing state replaces its output.
    pub fn add_state(&mut self, state: impl Into<StateId>, output: impl Into<String>, is_start: bool) {
        let state = state.into();
        self.outputs.insert(state.clone(), output.into());
        self.table.add(state, is_start, false);
    }

    pub fn output_of(&self, state: &str) -> Option<&str> {
        self.outputs.get(state).map(String::as_str)
    }

    pub fn set_output(&mut self, state: &str, output: impl Into<String>) -> Result<()> {
        self.table.require(state)?;
        self.outputs.insert(state.to_string(), output.into());
        Ok(())
    }

    /// Adds `src --input--> dst`, replacing any transition of `src` on
    /// `input`.
    pub fn add_transition(&mut self, src: &str, input: &str, dst: &str) -> Result<()> {
        self.table.require(src)?;
        self.table.require(dst)?;
        if input.is_empty() {
            return Err(AutomatonError::EmptySymbol);
        }

        self.transitions
            .entry(src.to_string())
            .or_default()
            .insert(input.to_string(), dst.to_string());
        Ok(())
    }

    /// Removes the transition of `src` on `input`. Returns whether it existed.
    pub fn remove_transition(&mut self, src: &str, input: &str) -> bool {
        let Some(row) = self.transitions.get_mut(src) else {
            return false;
        };
        let removed = row.remove(input).is_some();
        if row.is_empty() {
            self.transitions.remove(src);
        }
        removed
    }

    pub fn target(&self, src: &str, input: &str) -> Option<&StateId> {
        self.transitions.get(src).and_then(|row| row.get(input))
    }

    /// All transitions as `(src, input, dst)`, ordered by source and input.
    pub fn transitions(&self) -> impl Iterator<Item = (&StateId, &String, &StateId)> {
        self.transitions
            .iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .flat_map(|(src, row)| row.iter().map(move |(input, dst)| (src, input, dst)))
    }

    pub fn input_alphabet(&self) -> BTreeSet<String> {
        self.transitions
            .values()
            .flat_map(|row| row.keys())
            .cloned()
            .collect()
    }

    pub fn output_alphabet(&self) -> BTreeSet<String> {
        self.outputs.values().cloned().collect()
    }
}

impl FiniteStateMachine for MooreMachine {
    fn state_table(&self) -> &StateTable {
        &self.table
    }

    fn state_table_mut(&mut self) -> &mut StateTable {
        &mut self.table
    }

    fn remove_state(&mut self, state: &str) {
        if !self.table.remove(state) {
            return;
        }

        self.outputs.remove(state);
        self.transitions.remove(state);
        for row in self.transitions.values_mut() {
            row.retain(|_, dst| *dst != state);
        }
        self.transitions.retain(|_, row| !row.is_empty());
    }

    fn rename_state(&mut self, old: &str, new: &str) -> Result<()> {
        self.table.rename(old, new)?;
        if old == new {
            return Ok(());
        }

        if let Some(output) = self.outputs.remove(old) {
            self.outputs.insert(new.to_string(), output);
        }
        if let Some(row) = self.transitions.remove(old) {
            self.transitions.insert(new.to_string(), row);
        }
        for dst in self.transitions.values_mut().flat_map(|row| row.values_mut()) {
            if *dst == old {
                *dst = new.to_string();
            }
        }
        Ok(())
    }
}

impl Transducer for MooreMachine {
    fn initial_output(&self, start: &str) -> &str {
        self.output_of(start).unwrap_or_default()
    }

    fn input_symbols(&self, state: &str) -> Vec<&str> {
        self.transitions
            .get(state)
            .into_iter()
            .flat_map(|row| row.keys())
            .map(String::as_str)
            .collect()
    }

    fn follow(&self, state: &str, input: &str) -> Option<(&StateId, &str)> {
        let dst = self.target(state, input)?;
        Some((dst, self.output_of(dst).unwrap_or_default()))
    }
}

impl Language for MooreMachine {
    /// An input is accepted if the machine can translate all of it.
    fn accepts(&self, input: &str) -> bool {
        self.simulate(input).is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct MooreDocument {
    states: Vec<StateId>,
    start_state: Option<StateId>,
    input_alphabet: Vec<String>,
    output_alphabet: Vec<String>,
    output_function: BTreeMap<StateId, String>,
    transitions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MooreTransitionEntry {
    src: StateId,
    input: String,
    dst: StateId,
}

impl JsonFormat for MooreMachine {
    fn to_json(&self) -> Result<String> {
        let transitions = self
            .transitions()
            .map(|(src, input, dst)| {
                serde_json::to_value(MooreTransitionEntry {
                    src: src.clone(),
                    input: input.clone(),
                    dst: dst.clone(),
                })
            })
            .collect::<serde_json::Result<Vec<_>>>()?;

        let document = MooreDocument {
            states: self.states().iter().cloned().collect(),
            start_state: self.start_state().cloned(),
            input_alphabet: self.input_alphabet().into_iter().collect(),
            output_alphabet: self.output_alphabet().into_iter().collect(),
            output_function: self.outputs.clone(),
            transitions,
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn from_json(json: &str) -> Result<Self> {
        let document: MooreDocument = serde_json::from_str(json)?;
        let mut machine = MooreMachine::new();

        let states = document
            .states
            .iter()
            .chain(document.output_function.keys())
            .unique();
        for state in states {
            let output = match document.output_function.get(state) {
                Some(output) => output.clone(),
                None => {
                    tracing::warn!("State '{}' has no output, using the empty output", state);
                    String::new()
                }
            };
            machine.outputs.insert(state.clone(), output);
            machine.table.insert(state.clone(), false);
        }
        restore_start(&mut machine.table, document.start_state.as_deref());

        for value in document.transitions {
            let entry: MooreTransitionEntry = match serde_json::from_value(value.clone()) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Ignoring malformed transition {}: {}", value, e);
                    continue;
                }
            };

            if let Err(e) = machine.add_transition(&entry.src, &entry.input, &entry.dst) {
                tracing::warn!("Ignoring transition {}: {}", value, e);
            }
        }

        Ok(machine)
    }
}

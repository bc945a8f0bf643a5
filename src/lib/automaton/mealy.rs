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

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MealyTarget {
    pub dst: StateId,
    pub output: String,
}

/// A Mealy machine: the output is attached to the transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MealyMachine {
    table: StateTable,
    transitions: HashMap<StateId, BTreeMap<String, MealyTarget>>,
}

impl MealyMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a state. The first state added becomes the start state.
    pub fn add_state(&mut self, state: impl Into<StateId>, is_start: bool) {
        self.table.add(state.into(), is_start, false);
    }

    /// Adds `src --input/output--> dst`, replacing any transition of `src` on
    /// `input`.
    pub fn add_transition(&mut self, src: &str, input: &str, dst: &str, output: &str) -> Result<()> {
        self.table.require(src)?;
        self.table.require(dst)?;
        if input.is_empty() {
            return Err(AutomatonError::EmptySymbol);
        }

        self.transitions.entry(src.to_string()).or_default().insert(
            input.to_string(),
            MealyTarget {
                dst: dst.to_string(),
                output: output.to_string(),
            },
        );
        Ok(())
    }

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

    pub fn target(&self, src: &str, input: &str) -> Option<&MealyTarget> {
        self.transitions.get(src).and_then(|row| row.get(input))
    }

    pub fn transitions(&self) -> impl Iterator<Item = (&StateId, &String, &MealyTarget)> {
        self.transitions
            .iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .flat_map(|(src, row)| row.iter().map(move |(input, target)| (src, input, target)))
    }

    pub fn input_alphabet(&self) -> BTreeSet<String> {
        self.transitions
            .values()
            .flat_map(|row| row.keys())
            .cloned()
            .collect()
    }

    pub fn output_alphabet(&self) -> BTreeSet<String> {
        self.transitions
            .values()
            .flat_map(|row| row.values())
            .map(|target| target.output.clone())
            .collect()
    }
}

impl FiniteStateMachine for MealyMachine {
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

        self.transitions.remove(state);
        for row in self.transitions.values_mut() {
            row.retain(|_, target| target.dst != state);
        }
        self.transitions.retain(|_, row| !row.is_empty());
    }

    fn rename_state(&mut self, old: &str, new: &str) -> Result<()> {
        self.table.rename(old, new)?;
        if old == new {
            return Ok(());
        }

        if let Some(row) = self.transitions.remove(old) {
            self.transitions.insert(new.to_string(), row);
        }
        for target in self.transitions.values_mut().flat_map(|row| row.values_mut()) {
            if target.dst == old {
                target.dst = new.to_string();
            }
        }
        Ok(())
    }
}

impl Transducer for MealyMachine {
    /// Mealy machines emit nothing before the first transition.
    fn initial_output(&self, _start: &str) -> &str {
        ""
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
        let target = self.target(state, input)?;
        Some((&target.dst, target.output.as_str()))
    }
}

impl Language for MealyMachine {
    fn accepts(&self, input: &str) -> bool {
        self.simulate(input).is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct MealyDocument {
    states: Vec<StateId>,
    start_state: Option<StateId>,
    input_alphabet: Vec<String>,
    output_alphabet: Vec<String>,
    transitions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MealyTransitionEntry {
    src: StateId,
    input: String,
    dst: StateId,
    output: String,
}

impl JsonFormat for MealyMachine {
    fn to_json(&self) -> Result<String> {
        let transitions = self
            .transitions()
            .map(|(src, input, target)| {
                serde_json::to_value(MealyTransitionEntry {
                    src: src.clone(),
                    input: input.clone(),
                    dst: target.dst.clone(),
                    output: target.output.clone(),
                })
            })
            .collect::<serde_json::Result<Vec<_>>>()?;

        let document = MealyDocument {
            states: self.states().iter().cloned().collect(),
            start_state: self.start_state().cloned(),
            input_alphabet: self.input_alphabet().into_iter().collect(),
            output_alphabet: self.output_alphabet().into_iter().collect(),
            transitions,
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn from_json(json: &str) -> Result<Self> {
        let document: MealyDocument = serde_json::from_str(json)?;
        let mut machine = MealyMachine::new();

        for state in document.states {
            machine.table.insert(state, false);
        }
        restore_start(&mut machine.table, document.start_state.as_deref());

        for value in document.transitions {
            let entry: MealyTransitionEntry = match serde_json::from_value(value.clone()) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Ignoring malformed transition {}: {}", value, e);
                    continue;
                }
            };

            if let Err(e) =
                machine.add_transition(&entry.src, &entry.input, &entry.dst, &entry.output)
            {
                tracing::warn!("Ignoring transition {}: {}", value, e);
            }
        }

        Ok(machine)
    }
}

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    str::FromStr,
};

use hashbrown::HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    automaton::{
        Acceptor, FiniteStateMachine, JsonFormat, Language, StateId, restore_start,
        states::StateTable,
    },
    config::SimulationConfig,
    error::{AutomatonError, Result},
};

pub const BLANK_SYMBOL: &str = "β";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    fn offset(&self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

impl FromStr for Direction {
    type Err = AutomatonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "L" | "l" => Ok(Direction::Left),
            "R" | "r" => Ok(Direction::Right),
            _ => Err(AutomatonError::InvalidDirection(s.to_string())),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Left => write!(f, "L"),
            Direction::Right => write!(f, "R"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TuringAction {
    pub dst: StateId,
    pub write: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Accepted,
    Rejected,
    /// The step limit was reached before the machine halted.
    Loop,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "accepted"),
            Verdict::Rejected => write!(f, "rejected"),
            Verdict::Loop => write!(f, "loop"),
        }
    }
}

/// A snapshot of the machine. Only cells holding a non-blank symbol are
/// stored on the tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TuringStep {
    pub state: StateId,
    pub tape: BTreeMap<i64, String>,
    pub head: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TuringRun {
    pub steps: Vec<TuringStep>,
    pub verdict: Verdict,
}

/// A deterministic single-tape Turing machine accepting by final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuringMachine {
    table: StateTable,
    blank: String,
    transitions: HashMap<StateId, BTreeMap<String, TuringAction>>,
}

impl Default for TuringMachine {
    fn default() -> Self {
        TuringMachine {
            table: StateTable::new(),
            blank: BLANK_SYMBOL.to_string(),
            transitions: HashMap::new(),
        }
    }
}

impl TuringMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blank_symbol(&self) -> &str {
        &self.blank
    }

    pub fn set_blank_symbol(&mut self, blank: impl Into<String>) -> Result<()> {
        let blank = blank.into();
        if blank.is_empty() {
            return Err(AutomatonError::EmptySymbol);
        }
        self.blank = blank;
        Ok(())
    }

    /// Adds a state. The first state added becomes the start state.
    pub fn add_state(&mut self, state: impl Into<StateId>, is_start: bool, is_final: bool) {
        self.table.add(state.into(), is_start, is_final);
    }

    /// Adds `(src, read) -> (dst, write, direction)`, replacing any
    /// transition of `src` on `read`. The direction is `L` or `R`.
    pub fn add_transition(
        &mut self,
        src: &str,
        read: &str,
        dst: &str,
        write: &str,
        direction: &str,
    ) -> Result<()> {
        self.table.require(src)?;
        self.table.require(dst)?;
        let direction = direction.parse()?;
        if read.is_empty() || write.is_empty() {
            return Err(AutomatonError::EmptySymbol);
        }

        self.transitions.entry(src.to_string()).or_default().insert(
            read.to_string(),
            TuringAction {
                dst: dst.to_string(),
                write: write.to_string(),
                direction,
            },
        );
        Ok(())
    }

    pub fn remove_transition(&mut self, src: &str, read: &str) -> bool {
        let Some(row) = self.transitions.get_mut(src) else {
            return false;
        };
        let removed = row.remove(read).is_some();
        if row.is_empty() {
            self.transitions.remove(src);
        }
        removed
    }

    pub fn action(&self, src: &str, read: &str) -> Option<&TuringAction> {
        self.transitions.get(src).and_then(|row| row.get(read))
    }

    pub fn transitions(&self) -> impl Iterator<Item = (&StateId, &String, &TuringAction)> {
        self.transitions
            .iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .flat_map(|(src, row)| row.iter().map(move |(read, action)| (src, read, action)))
    }

    /// The symbols read by some transition, the blank excluded.
    pub fn input_alphabet(&self) -> BTreeSet<String> {
        self.transitions
            .values()
            .flat_map(|row| row.keys())
            .filter(|read| **read != self.blank)
            .cloned()
            .collect()
    }

    /// Every symbol read or written, the blank included.
    pub fn tape_alphabet(&self) -> BTreeSet<String> {
        self.transitions
            .values()
            .flatten()
            .flat_map(|(read, action)| [read.clone(), action.write.clone()])
            .chain([self.blank.clone()])
            .collect()
    }

    pub fn simulate_history(&self, input: &str) -> TuringRun {
        self.simulate_history_with(input, &SimulationConfig::default())
    }

    pub fn simulate(&self, input: &str) -> Verdict {
        self.simulate_history(input).verdict
    }

    /// Runs the machine on `input`, written character by character from
    /// cell 0, for at most `max_turing_steps` steps.
    pub fn simulate_history_with(&self, input: &str, config: &SimulationConfig) -> TuringRun {
        let Some(start) = self.start_state() else {
            return TuringRun {
                steps: vec![],
                verdict: Verdict::Rejected,
            };
        };

        let mut tape: BTreeMap<i64, String> = input
            .chars()
            .enumerate()
            .map(|(i, c)| (i as i64, c.to_string()))
            .filter(|(_, c)| *c != self.blank)
            .collect();
        let mut state = start;
        let mut head = 0;
        let mut steps = vec![TuringStep {
            state: state.clone(),
            tape: tape.clone(),
            head,
        }];

        for _ in 0..*config.get_max_turing_steps() {
            if self.is_final(state) {
                return TuringRun {
                    steps,
                    verdict: Verdict::Accepted,
                };
            }

            let read = tape.get(&head).unwrap_or(&self.blank);
            let Some(action) = self.action(state, read) else {
                return TuringRun {
                    steps,
                    verdict: Verdict::Rejected,
                };
            };

            if action.write == self.blank {
                tape.remove(&head);
            } else {
                tape.insert(head, action.write.clone());
            }
            head += action.direction.offset();
            state = &action.dst;

            steps.push(TuringStep {
                state: state.clone(),
                tape: tape.clone(),
                head,
            });
        }

        tracing::debug!(
            "Turing machine stopped after {} steps",
            config.get_max_turing_steps()
        );

        TuringRun {
            steps,
            verdict: Verdict::Loop,
        }
    }
}

impl FiniteStateMachine for TuringMachine {
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
            row.retain(|_, action| action.dst != state);
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
        for action in self.transitions.values_mut().flat_map(|row| row.values_mut()) {
            if action.dst == old {
                action.dst = new.to_string();
            }
        }
        Ok(())
    }
}

impl Acceptor for TuringMachine {}

impl Language for TuringMachine {
    fn accepts(&self, input: &str) -> bool {
        self.simulate(input) == Verdict::Accepted
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct TuringDocument {
    states: Vec<StateId>,
    start_state: Option<StateId>,
    final_states: Vec<StateId>,
    input_alphabet: Vec<String>,
    tape_alphabet: Vec<String>,
    blank_symbol: Option<String>,
    transitions: BTreeMap<String, serde_json::Value>,
}

impl JsonFormat for TuringMachine {
    fn to_json(&self) -> Result<String> {
        let mut transitions = BTreeMap::new();
        for (src, read, action) in self.transitions() {
            let value = (&action.dst, &action.write, action.direction.to_string());
            transitions.insert(format!("{},{}", src, read), serde_json::to_value(value)?);
        }

        let document = TuringDocument {
            states: self.states().iter().cloned().collect(),
            start_state: self.start_state().cloned(),
            final_states: self.final_states().iter().cloned().collect(),
            input_alphabet: self.input_alphabet().into_iter().collect(),
            tape_alphabet: self.tape_alphabet().into_iter().collect(),
            blank_symbol: Some(self.blank.clone()),
            transitions,
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn from_json(json: &str) -> Result<Self> {
        let document: TuringDocument = serde_json::from_str(json)?;
        let mut machine = TuringMachine::new();

        if let Some(blank) = document.blank_symbol
            && machine.set_blank_symbol(blank).is_err()
        {
            tracing::warn!("Ignoring empty blank symbol, using '{}'", BLANK_SYMBOL);
        }

        for state in document.states {
            machine.table.insert(state, false);
        }
        restore_start(&mut machine.table, document.start_state.as_deref());
        for state in document.final_states {
            if machine.set_final(&state, true).is_err() {
                tracing::warn!("Ignoring unknown final state '{}'", state);
            }
        }

        for (key, value) in document.transitions {
            let Some((src, read)) = key.split_once(',') else {
                tracing::warn!("Ignoring malformed transition key '{}'", key);
                continue;
            };

            let (dst, write, direction): (StateId, String, String) =
                match serde_json::from_value(value) {
                    Ok(action) => action,
                    Err(e) => {
                        tracing::warn!("Ignoring malformed transition '{}': {}", key, e);
                        continue;
                    }
                };

            if let Err(e) = machine.add_transition(src, read, &dst, &write, &direction) {
                tracing::warn!("Ignoring transition '{}': {}", key, e);
            }
        }

        Ok(machine)
    }
}

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    automaton::{
        Acceptor, FiniteStateMachine, JsonFormat, Language, StateId, StateSet, char_offset,
        matcher::{LongestMatch, SymbolMatcher},
        restore_start,
        states::StateTable,
        symbol::Symbol,
    },
    error::{AutomatonError, Result},
};

pub mod determinize;
pub mod grammar;
pub mod graph;
pub mod minimization;

/// A nondeterministic finite automaton with epsilon transitions and
/// possibly multi-character symbols.
///
/// Being a DFA is a property checked by [`Nfa::is_dfa`], not a separate
/// type, so the same structure is used for both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nfa {
    table: StateTable,
    /// Maps a source state and a symbol to the set of destinations. Neither
    /// the inner maps nor the destination sets are ever empty.
    transitions: HashMap<StateId, BTreeMap<Symbol, StateSet>>,
}

/// One step of a simulation: the active states after the input up to
/// `cursor` (in characters) has been consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NfaStep {
    pub states: StateSet,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NfaRun {
    pub steps: Vec<NfaStep>,
    pub accepted: bool,
}

impl NfaRun {
    /// The position up to which the input was consumed.
    pub fn consumed(&self) -> usize {
        self.steps.last().map_or(0, |s| s.cursor)
    }

    /// The active states after the last step.
    pub fn final_states(&self) -> Option<&StateSet> {
        self.steps.last().map(|s| &s.states)
    }
}

impl Nfa {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a state. The first state added becomes the start state.
    pub fn add_state(&mut self, state: impl Into<StateId>, is_start: bool, is_final: bool) {
        self.table.add(state.into(), is_start, is_final);
    }

    /// Adds the transition `src --symbol--> dst`. Both states must exist.
    pub fn add_transition(&mut self, src: &str, symbol: Symbol, dst: &str) -> Result<()> {
        self.table.require(src)?;
        self.table.require(dst)?;
        if symbol.is_empty_text() {
            return Err(AutomatonError::EmptySymbol);
        }

        self.insert_transition(src.to_string(), symbol, dst.to_string());
        Ok(())
    }

    /// Inserts a transition without checking that the states exist.
    pub(crate) fn insert_transition(&mut self, src: StateId, symbol: Symbol, dst: StateId) {
        self.transitions
            .entry(src)
            .or_default()
            .entry(symbol)
            .or_default()
            .insert(dst);
    }

    pub(crate) fn insert_state(&mut self, state: StateId, is_final: bool) {
        self.table.insert(state, is_final);
    }

    /// Removes one destination of a transition. Returns whether it existed.
    pub fn remove_transition(&mut self, src: &str, symbol: &Symbol, dst: &str) -> bool {
        let Some(row) = self.transitions.get_mut(src) else {
            return false;
        };
        let Some(dsts) = row.get_mut(symbol) else {
            return false;
        };

        let removed = dsts.remove(dst);
        if dsts.is_empty() {
            row.remove(symbol);
        }
        if row.is_empty() {
            self.transitions.remove(src);
        }
        removed
    }

    /// The destinations of `src` under `symbol`.
    pub fn targets(&self, src: &str, symbol: &Symbol) -> Option<&StateSet> {
        self.transitions.get(src).and_then(|row| row.get(symbol))
    }

    /// The transitions leaving `state`, ordered by symbol.
    pub fn outgoing(&self, state: &str) -> impl Iterator<Item = (&Symbol, &StateSet)> {
        self.transitions.get(state).into_iter().flatten()
    }

    /// All transitions as `(src, symbol, destinations)`, ordered by source
    /// and symbol.
    pub fn transitions(&self) -> impl Iterator<Item = (&StateId, &Symbol, &StateSet)> {
        self.transitions
            .iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .flat_map(|(src, row)| row.iter().map(move |(symbol, dsts)| (src, symbol, dsts)))
    }

    pub fn transition_count(&self) -> usize {
        self.transitions
            .values()
            .flat_map(|row| row.values())
            .map(|dsts| dsts.len())
            .sum()
    }

    /// The symbols used on some transition, epsilon excluded.
    pub fn alphabet(&self) -> BTreeSet<String> {
        self.transitions
            .values()
            .flat_map(|row| row.keys())
            .filter_map(|symbol| symbol.as_text())
            .map(str::to_string)
            .collect()
    }

    /// Calculates the epsilon closure of a set of states.
    pub fn epsilon_closure<'a>(&self, states: impl IntoIterator<Item = &'a StateId>) -> StateSet {
        let mut closure: StateSet = states.into_iter().cloned().collect();
        let mut stack = closure.iter().cloned().collect_vec();

        while let Some(state) = stack.pop() {
            if let Some(targets) = self.targets(&state, &Symbol::Epsilon) {
                for target in targets {
                    if closure.insert(target.clone()) {
                        stack.push(target.clone());
                    }
                }
            }
        }

        closure
    }

    /// The union of the destinations of every state in `states` under
    /// `symbol`, without epsilon closure.
    pub fn move_states<'a>(
        &self,
        states: impl IntoIterator<Item = &'a StateId>,
        symbol: &Symbol,
    ) -> StateSet {
        states
            .into_iter()
            .filter_map(|state| self.targets(state, symbol))
            .flatten()
            .cloned()
            .collect()
    }

    /// The non-epsilon symbols leaving any of the given states.
    fn outgoing_symbols<'a>(&'a self, states: &StateSet) -> Vec<&'a str> {
        states
            .iter()
            .flat_map(|state| self.outgoing(state))
            .filter_map(|(symbol, _)| symbol.as_text())
            .unique()
            .collect()
    }

    pub fn simulate(&self, input: &str) -> bool {
        self.simulate_history(input).accepted
    }

    /// Simulates the automaton with the [`LongestMatch`] policy and returns
    /// every step for stepwise display.
    pub fn simulate_history(&self, input: &str) -> NfaRun {
        self.simulate_history_with(input, &LongestMatch)
    }

    /// Simulates the automaton, walking the input by position so that
    /// multi-character symbols can be consumed at once.
    ///
    /// The matcher decides which symbols are taken at each step. With
    /// [`LongestMatch`] there is a single active set at any time and the run
    /// halts as soon as no symbol matches the remaining input. The input is
    /// accepted if it was consumed entirely and the active set at its end
    /// contains a final state.
    pub fn simulate_history_with(&self, input: &str, matcher: &impl SymbolMatcher) -> NfaRun {
        let Some(start) = self.table.start() else {
            return NfaRun {
                steps: vec![],
                accepted: false,
            };
        };

        // Active sets keyed by byte offset into the input. Positions only
        // grow, so the smallest pending one is processed next.
        let mut frontier: BTreeMap<usize, StateSet> = BTreeMap::new();
        frontier.insert(0, self.epsilon_closure([start]));

        let mut steps = vec![];
        let mut accepted = false;

        while let Some((position, active)) = frontier.pop_first() {
            steps.push(NfaStep {
                states: active.clone(),
                cursor: char_offset(input, position),
            });

            if position == input.len() {
                accepted |= self.contains_final(&active);
                continue;
            }

            let remaining = &input[position..];
            let candidates = self.outgoing_symbols(&active);

            for symbol in matcher.select(&candidates, remaining) {
                let next = self.move_states(&active, &Symbol::text(symbol));
                if next.is_empty() {
                    continue;
                }
                frontier
                    .entry(position + symbol.len())
                    .or_default()
                    .extend(self.epsilon_closure(&next));
            }
        }

        NfaRun { steps, accepted }
    }

    /// Checks whether the automaton is a valid DFA: no epsilon transitions,
    /// only single-character symbols and exactly one destination per source
    /// and symbol.
    pub fn is_dfa(&self) -> bool {
        self.transitions.values().flatten().all(|(symbol, dsts)| {
            !symbol.is_epsilon() && symbol.is_single_char() && dsts.len() == 1
        })
    }

    /// The unique destination of `src` under `symbol` in a DFA.
    pub(crate) fn dfa_target(&self, src: &str, symbol: &Symbol) -> Option<&StateId> {
        self.targets(src, symbol).and_then(|dsts| dsts.first())
    }
}

impl FiniteStateMachine for Nfa {
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
            for dsts in row.values_mut() {
                dsts.remove(state);
            }
            row.retain(|_, dsts| !dsts.is_empty());
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
        for row in self.transitions.values_mut() {
            for dsts in row.values_mut() {
                if dsts.remove(old) {
                    dsts.insert(new.to_string());
                }
            }
        }
        Ok(())
    }
}

impl Acceptor for Nfa {}

impl Language for Nfa {
    fn accepts(&self, input: &str) -> bool {
        self.simulate(input)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct NfaDocument {
    states: Vec<StateId>,
    start_state: Option<StateId>,
    final_states: Vec<StateId>,
    alphabet: Vec<String>,
    transitions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NfaTransitionEntry {
    src: StateId,
    symbol: Symbol,
    dsts: Vec<StateId>,
}

impl JsonFormat for Nfa {
    fn to_json(&self) -> Result<String> {
        let transitions = self
            .transitions()
            .map(|(src, symbol, dsts)| {
                serde_json::to_value(NfaTransitionEntry {
                    src: src.clone(),
                    symbol: symbol.clone(),
                    dsts: dsts.iter().cloned().collect(),
                })
            })
            .collect::<serde_json::Result<Vec<_>>>()?;

        let document = NfaDocument {
            states: self.states().iter().cloned().collect(),
            start_state: self.start_state().cloned(),
            final_states: self.final_states().iter().cloned().collect(),
            alphabet: self.alphabet().into_iter().collect(),
            transitions,
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn from_json(json: &str) -> Result<Self> {
        let document: NfaDocument = serde_json::from_str(json)?;
        let mut nfa = Nfa::new();

        for state in document.states {
            nfa.insert_state(state, false);
        }
        restore_start(&mut nfa.table, document.start_state.as_deref());
        for state in document.final_states {
            if nfa.set_final(&state, true).is_err() {
                tracing::warn!("Ignoring unknown final state '{}'", state);
            }
        }

        for value in document.transitions {
            let entry: NfaTransitionEntry = match serde_json::from_value(value.clone()) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Ignoring malformed transition {}: {}", value, e);
                    continue;
                }
            };

            for dst in &entry.dsts {
                if let Err(e) = nfa.add_transition(&entry.src, entry.symbol.clone(), dst) {
                    tracing::warn!(
                        "Ignoring transition ({}, {}) -> {}: {}",
                        entry.src,
                        entry.symbol,
                        dst,
                        e
                    );
                }
            }
        }

        Ok(nfa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_of_epsilon_chain() {
        let mut nfa = Nfa::new();
        nfa.add_state("q0", true, false);
        nfa.add_state("q1", false, false);
        nfa.add_state("q2", false, true);
        nfa.add_transition("q0", Symbol::Epsilon, "q1").unwrap();
        nfa.add_transition("q1", Symbol::Epsilon, "q2").unwrap();
        nfa.add_transition("q2", Symbol::Epsilon, "q0").unwrap();

        let closure = nfa.epsilon_closure([&"q1".to_string()]);
        assert_eq!(closure.len(), 3);
    }

    #[test]
    fn test_outgoing_symbols_skip_epsilon() {
        let mut nfa = Nfa::new();
        nfa.add_state("q0", true, false);
        nfa.add_state("q1", false, false);
        nfa.add_transition("q0", Symbol::Epsilon, "q1").unwrap();
        nfa.add_transition("q0", "ab".into(), "q1").unwrap();
        nfa.add_transition("q1", "ab".into(), "q1").unwrap();

        let active = nfa.epsilon_closure([&"q0".to_string()]);
        assert_eq!(nfa.outgoing_symbols(&active), vec!["ab"]);
    }
}

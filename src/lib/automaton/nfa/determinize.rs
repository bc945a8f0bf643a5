use std::collections::{BTreeSet, VecDeque};

use hashbrown::HashMap;

use crate::automaton::{Acceptor, FiniteStateMachine, StateId, StateSet, nfa::Nfa, symbol::Symbol};

impl Nfa {
    /// The characters occurring in any symbol. Multi-character symbols are
    /// split into their characters.
    pub fn letters(&self) -> BTreeSet<Symbol> {
        self.alphabet()
            .iter()
            .flat_map(|symbol| symbol.chars())
            .map(Symbol::from)
            .collect()
    }

    /// Determinizes the automaton by subset construction, respecting epsilon
    /// transitions. The states of the result are named `q0`, `q1`, ... in
    /// discovery order, `q0` being the closure of the start state.
    ///
    /// The construction works over single characters: transitions labelled
    /// with a multi-character symbol contribute their characters to the
    /// alphabet but are never taken, so the result only agrees with the
    /// automaton on languages over single-character symbols.
    ///
    /// Returns `None` if there is no start state.
    pub fn to_dfa(&self) -> Option<Nfa> {
        let start = self.table.start()?;
        let letters = self.letters();

        let mut dfa = Nfa::new();
        let mut state_map: HashMap<StateSet, StateId> = HashMap::new();

        let start_set = self.epsilon_closure([start]);
        let start_name = "q0".to_string();
        dfa.insert_state(start_name.clone(), self.contains_final(&start_set));
        dfa.table.set_start(&start_name).ok();
        state_map.insert(start_set.clone(), start_name);

        let mut unmarked = VecDeque::from([start_set]);

        while let Some(subset) = unmarked.pop_front() {
            let from = state_map[&subset].clone();

            for letter in &letters {
                let target = self.epsilon_closure(&self.move_states(&subset, letter));
                if target.is_empty() {
                    continue;
                }

                let to = match state_map.get(&target) {
                    Some(name) => name.clone(),
                    None => {
                        let name = format!("q{}", state_map.len());
                        dfa.insert_state(name.clone(), self.contains_final(&target));
                        state_map.insert(target.clone(), name.clone());
                        unmarked.push_back(target);
                        name
                    }
                };

                dfa.insert_transition(from.clone(), letter.clone(), to);
            }
        }

        tracing::debug!(
            "Subset construction produced {} states from {}",
            dfa.state_count(),
            self.state_count()
        );

        Some(dfa)
    }
}

use std::collections::{BTreeSet, VecDeque};

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;

use crate::{
    automaton::{Acceptor, FiniteStateMachine, StateId, StateSet, nfa::Nfa, symbol::Symbol},
    error::{AutomatonError, Result},
};

/// The name used for the state added to make a DFA complete.
pub const TRAP_STATE: &str = "_error";

/// The state of a partition refinement: disjoint blocks of states and the
/// blocks that still have to be used as splitters.
#[derive(Debug, Clone)]
struct Partition {
    blocks: Vec<StateSet>,
    worklist: VecDeque<usize>,
    pending: HashSet<usize>,
}

impl Partition {
    fn new(accepting: StateSet, rejecting: StateSet) -> Self {
        let mut partition = Partition {
            blocks: vec![],
            worklist: VecDeque::new(),
            pending: HashSet::new(),
        };

        let seed_accepting = accepting.len() <= rejecting.len();
        for (block, seed) in [(accepting, seed_accepting), (rejecting, !seed_accepting)] {
            if block.is_empty() {
                continue;
            }
            let index = partition.blocks.len();
            partition.blocks.push(block);
            if seed {
                partition.enqueue(index);
            }
        }

        // with a single non-empty block the seed may have been the empty one
        if partition.worklist.is_empty() && !partition.blocks.is_empty() {
            partition.enqueue(0);
        }

        partition
    }

    fn enqueue(&mut self, index: usize) {
        if self.pending.insert(index) {
            self.worklist.push_back(index);
        }
    }

    fn next_splitter(&mut self) -> Option<StateSet> {
        let index = self.worklist.pop_front()?;
        self.pending.remove(&index);
        Some(self.blocks[index].clone())
    }

    /// Splits every block into the states inside and outside of `x`.
    fn split(&mut self, x: &HashSet<&StateId>) {
        for index in 0..self.blocks.len() {
            let (inside, outside): (StateSet, StateSet) = self.blocks[index]
                .iter()
                .cloned()
                .partition(|state| x.contains(state));

            if inside.is_empty() || outside.is_empty() {
                continue;
            }

            let smaller_is_inside = inside.len() <= outside.len();
            let new_index = self.blocks.len();
            self.blocks[index] = inside;
            self.blocks.push(outside);

            if self.pending.contains(&index) {
                // the pending splitter now only covers one half, queue the other
                self.enqueue(new_index);
            } else if smaller_is_inside {
                self.enqueue(index);
            } else {
                self.enqueue(new_index);
            }
        }
    }
}

impl Nfa {
    /// Adds a trap state and routes every missing transition to it, so that
    /// every state has a transition for every letter. Returns the name of the
    /// trap state if one was needed.
    pub fn make_complete(&mut self) -> Option<StateId> {
        let letters = self.letters();
        let missing = self
            .states()
            .iter()
            .cartesian_product(letters.iter())
            .filter(|(state, letter)| self.targets(state, letter).is_none())
            .map(|(state, letter)| (state.clone(), letter.clone()))
            .collect_vec();

        if missing.is_empty() {
            return None;
        }

        let trap = self.table.fresh_name(TRAP_STATE);
        self.insert_state(trap.clone(), false);
        for (state, letter) in missing {
            self.insert_transition(state, letter, trap.clone());
        }
        for letter in letters {
            self.insert_transition(trap.clone(), letter, trap.clone());
        }

        tracing::debug!("Completed DFA with trap state '{}'", trap);

        Some(trap)
    }

    /// Minimizes a DFA by Hopcroft's partition refinement.
    ///
    /// The DFA is first made complete with a trap state, which is removed
    /// again from the result. Every block of equivalent states becomes one
    /// state, named after its single member or `{a,b,...}` with the sorted
    /// member names.
    pub fn minimize(&self) -> Result<Nfa> {
        if !self.is_dfa() {
            return Err(AutomatonError::InvalidDfa);
        }

        let mut dfa = self.clone();
        let trap = dfa.make_complete();
        let alphabet = dfa.letters();

        // inverse[(letter, q)] holds every state with a transition on letter into q
        let mut inverse: HashMap<(&Symbol, &StateId), Vec<&StateId>> = HashMap::new();
        for (src, symbol, dsts) in dfa.transitions() {
            for dst in dsts {
                inverse.entry((symbol, dst)).or_default().push(src);
            }
        }

        let (accepting, rejecting): (StateSet, StateSet) = dfa
            .states()
            .iter()
            .cloned()
            .partition(|state| dfa.is_final(state));
        let mut partition = Partition::new(accepting, rejecting);

        while let Some(splitter) = partition.next_splitter() {
            for letter in &alphabet {
                let x: HashSet<&StateId> = splitter
                    .iter()
                    .filter_map(|target| inverse.get(&(letter, target)))
                    .flatten()
                    .copied()
                    .collect();

                if !x.is_empty() {
                    partition.split(&x);
                }
            }
        }

        let mut blocks = partition.blocks;
        if let Some(trap) = &trap {
            for block in blocks.iter_mut() {
                block.remove(trap);
            }
            blocks.retain(|block| !block.is_empty());
        }

        tracing::debug!(
            "Minimization reduced {} states to {}",
            self.state_count(),
            blocks.len()
        );

        Ok(self.build_quotient(&blocks, &alphabet))
    }

    /// Builds the automaton whose states are the given blocks of states of
    /// `self`.
    fn build_quotient(&self, blocks: &[StateSet], alphabet: &BTreeSet<Symbol>) -> Nfa {
        let block_name = |block: &StateSet| -> StateId {
            if block.len() == 1 {
                block.iter().join(",")
            } else {
                format!("{{{}}}", block.iter().join(","))
            }
        };

        let mut state_map: HashMap<&StateId, StateId> = HashMap::new();
        let mut result = Nfa::new();

        for block in blocks {
            let name = block_name(block);
            for state in block {
                state_map.insert(state, name.clone());
            }
            result.insert_state(name.clone(), self.contains_final(block));
            if self.start_state().is_some_and(|start| block.contains(start)) {
                result.table.set_start(&name).ok();
            }
        }

        for block in blocks {
            let Some(from) = block.first().and_then(|state| state_map.get(state)) else {
                continue;
            };

            for letter in alphabet {
                // transitions into the removed trap state are dropped
                let target = block
                    .iter()
                    .filter_map(|state| self.dfa_target(state, letter))
                    .find_map(|target| state_map.get(target));

                if let Some(to) = target {
                    result.insert_transition(from.clone(), letter.clone(), to.clone());
                }
            }
        }

        result
    }
}

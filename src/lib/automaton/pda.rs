use std::collections::{BTreeMap, BTreeSet, VecDeque};

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    automaton::{
        Acceptor, FiniteStateMachine, JsonFormat, Language, StateId, char_offset,
        matcher::{LongestMatch, SymbolMatcher},
        restore_start,
        states::StateTable,
        symbol::Symbol,
    },
    config::SimulationConfig,
    error::{AutomatonError, Result},
};

pub const DEFAULT_START_STACK_SYMBOL: &str = "Z";

/// Separates source, input and pop in persisted transition keys, so input
/// and pop symbols may not contain it.
pub const KEY_SEPARATOR: char = ',';

/// The left-hand side of a pushdown transition: the input read and the stack
/// top popped. Either may be epsilon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PdaRule {
    pub input: Symbol,
    pub pop: Symbol,
}

/// The right-hand side of a pushdown transition. The characters of `push`
/// are pushed left to right, so its last character ends up on top.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PdaTarget {
    pub dst: StateId,
    pub push: Symbol,
}

type StackId = usize;

/// A stack cell: its symbol and the stack below it.
#[derive(Debug, Clone)]
struct StackCell {
    below: Option<StackId>,
    top: String,
    depth: usize,
}

/// Hash-consed stacks. Equal stacks always get the same id, so pushing
/// shares the tail and configurations compare stacks in constant time.
/// `None` is the empty stack.
#[derive(Debug, Default)]
struct StackArena {
    cells: Vec<StackCell>,
    index: HashMap<(Option<StackId>, String), StackId>,
}

impl StackArena {
    fn push(&mut self, below: Option<StackId>, symbol: String) -> StackId {
        let key = (below, symbol);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }

        let id = self.cells.len();
        let depth = self.depth(below) + 1;
        self.cells.push(StackCell {
            below,
            top: key.1.clone(),
            depth,
        });
        self.index.insert(key, id);
        id
    }

    fn depth(&self, stack: Option<StackId>) -> usize {
        stack.map_or(0, |id| self.cells[id].depth)
    }

    fn top(&self, stack: Option<StackId>) -> Option<(&str, Option<StackId>)> {
        stack.map(|id| (self.cells[id].top.as_str(), self.cells[id].below))
    }

    /// The stack as a list, bottom first.
    fn to_vec(&self, mut stack: Option<StackId>) -> Vec<String> {
        let mut symbols = vec![];
        while let Some(id) = stack {
            symbols.push(self.cells[id].top.clone());
            stack = self.cells[id].below;
        }
        symbols.reverse();
        symbols
    }
}

/// A snapshot of a pushdown run. `cursor` is a byte offset into the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Configuration {
    state: StateId,
    cursor: usize,
    stack: Option<StackId>,
}

/// One entry of a pushdown history. A `state` of `None` marks the point where
/// the run got stuck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdaStep {
    pub state: Option<StateId>,
    pub cursor: usize,
    pub stack: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdaRun {
    pub steps: Vec<PdaStep>,
    pub accepted: bool,
}

impl PdaRun {
    pub fn is_stuck(&self) -> bool {
        self.steps.last().is_some_and(|step| step.state.is_none())
    }
}

/// A nondeterministic pushdown automaton accepting by final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pda {
    table: StateTable,
    start_stack_symbol: String,
    transitions: HashMap<StateId, BTreeMap<PdaRule, BTreeSet<PdaTarget>>>,
}

impl Default for Pda {
    fn default() -> Self {
        Pda {
            table: StateTable::new(),
            start_stack_symbol: DEFAULT_START_STACK_SYMBOL.to_string(),
            transitions: HashMap::new(),
        }
    }
}

impl Pda {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_stack_symbol(&self) -> &str {
        &self.start_stack_symbol
    }

    pub fn set_start_stack_symbol(&mut self, symbol: impl Into<String>) -> Result<()> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(AutomatonError::EmptySymbol);
        }
        self.start_stack_symbol = symbol;
        Ok(())
    }

    /// Adds a state. The first state added becomes the start state.
    pub fn add_state(&mut self, state: impl Into<StateId>, is_start: bool, is_final: bool) {
        self.table.add(state.into(), is_start, is_final);
    }

    /// Adds `src --input, pop / push--> dst`. Both states must exist.
    pub fn add_transition(
        &mut self,
        src: &str,
        input: Symbol,
        pop: Symbol,
        dst: &str,
        push: Symbol,
    ) -> Result<()> {
        self.table.require(src)?;
        self.table.require(dst)?;
        if input.is_empty_text() || pop.is_empty_text() || push.is_empty_text() {
            return Err(AutomatonError::EmptySymbol);
        }
        for symbol in [&input, &pop] {
            if let Some(text) = symbol.as_text()
                && text.contains(KEY_SEPARATOR)
            {
                return Err(AutomatonError::ReservedSymbol(text.to_string()));
            }
        }

        self.transitions
            .entry(src.to_string())
            .or_default()
            .entry(PdaRule { input, pop })
            .or_default()
            .insert(PdaTarget {
                dst: dst.to_string(),
                push,
            });
        Ok(())
    }

    /// Removes a single transition. Returns whether it existed.
    pub fn remove_transition(
        &mut self,
        src: &str,
        input: &Symbol,
        pop: &Symbol,
        dst: &str,
        push: &Symbol,
    ) -> bool {
        let Some(row) = self.transitions.get_mut(src) else {
            return false;
        };

        let rule = PdaRule {
            input: input.clone(),
            pop: pop.clone(),
        };
        let Some(targets) = row.get_mut(&rule) else {
            return false;
        };

        let removed = targets.remove(&PdaTarget {
            dst: dst.to_string(),
            push: push.clone(),
        });
        if targets.is_empty() {
            row.remove(&rule);
        }
        if row.is_empty() {
            self.transitions.remove(src);
        }
        removed
    }

    /// All transitions ordered by source and rule.
    pub fn transitions(&self) -> impl Iterator<Item = (&StateId, &PdaRule, &BTreeSet<PdaTarget>)> {
        self.transitions
            .iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .flat_map(|(src, row)| row.iter().map(move |(rule, targets)| (src, rule, targets)))
    }

    pub fn transition_count(&self) -> usize {
        self.transitions
            .values()
            .flat_map(|row| row.values())
            .map(BTreeSet::len)
            .sum()
    }

    /// The input symbols used on some transition.
    pub fn input_alphabet(&self) -> BTreeSet<String> {
        self.transitions
            .values()
            .flat_map(|row| row.keys())
            .filter_map(|rule| rule.input.as_text())
            .map(str::to_string)
            .collect()
    }

    /// The symbols that can be popped or pushed, including the start stack
    /// symbol. Pushed strings contribute their characters.
    pub fn stack_alphabet(&self) -> BTreeSet<String> {
        let popped = self
            .transitions
            .values()
            .flat_map(|row| row.keys())
            .filter_map(|rule| rule.pop.as_text())
            .map(str::to_string);
        let pushed = self
            .transitions
            .values()
            .flat_map(|row| row.values())
            .flatten()
            .flat_map(|target| target.push.chars())
            .filter_map(|symbol| symbol.as_text().map(str::to_string));

        popped
            .chain(pushed)
            .chain([self.start_stack_symbol.clone()])
            .collect()
    }

    /// The configurations reached from `config` by one transition reading
    /// `input`. Transitions popping epsilon ignore the stack, the others
    /// need their pop symbol on top.
    fn successors(
        &self,
        arena: &mut StackArena,
        config: &Configuration,
        input: &Symbol,
    ) -> Vec<Configuration> {
        let Some(row) = self.transitions.get(&config.state) else {
            return vec![];
        };
        let cursor = config.cursor + input.as_text().map_or(0, str::len);
        let top = arena
            .top(config.stack)
            .map(|(top, below)| (top.to_string(), below));

        let mut next = vec![];
        let mut apply = |pop: Symbol, below: Option<StackId>| {
            let rule = PdaRule {
                input: input.clone(),
                pop,
            };
            for target in row.get(&rule).into_iter().flatten() {
                let mut stack = below;
                for symbol in target.push.chars() {
                    stack = Some(arena.push(stack, symbol.to_string()));
                }
                next.push(Configuration {
                    state: target.dst.clone(),
                    cursor,
                    stack,
                });
            }
        };

        apply(Symbol::Epsilon, config.stack);
        if let Some((top, below)) = top {
            apply(Symbol::text(top), below);
        }

        next
    }

    /// Simulates the automaton with the [`LongestMatch`] policy and the
    /// default limits.
    pub fn simulate_history(&self, input: &str) -> Result<PdaRun> {
        self.simulate_history_with(input, &SimulationConfig::default(), &LongestMatch)
    }

    pub fn simulate(&self, input: &str) -> Result<bool> {
        Ok(self.simulate_history(input)?.accepted)
    }

    /// Explores the configuration space breadth first.
    ///
    /// Epsilon moves are always explored. Input moves only use the symbols
    /// chosen by the matcher from those leaving the state of a
    /// configuration. The input is accepted as soon as a configuration that
    /// consumed all of it in a final state is discovered.
    ///
    /// The history holds the first configuration discovered at every
    /// position reached. Epsilon cycles that keep pushing make the
    /// configuration space infinite, so a search that has not accepted fails
    /// once it exceeds the limits of `config`.
    pub fn simulate_history_with(
        &self,
        input: &str,
        config: &SimulationConfig,
        matcher: &impl SymbolMatcher,
    ) -> Result<PdaRun> {
        let Some(start) = self.table.start() else {
            return Ok(PdaRun {
                steps: vec![],
                accepted: false,
            });
        };

        let mut search = Search::new(config);
        let bottom = search.arena.push(None, self.start_stack_symbol.clone());
        let initial = Configuration {
            state: start.clone(),
            cursor: 0,
            stack: Some(bottom),
        };

        let accepted = self.search(&mut search, initial, input, matcher)?;

        tracing::debug!(
            "Pushdown search explored {} configurations",
            search.visited.len()
        );

        let mut steps = search
            .representatives
            .values()
            .map(|config| PdaStep {
                state: Some(config.state.clone()),
                cursor: char_offset(input, config.cursor),
                stack: search.arena.to_vec(config.stack),
            })
            .collect_vec();

        if !accepted
            && let Some(last) = steps.last()
            && last.cursor < input.chars().count()
        {
            let stuck = PdaStep {
                state: None,
                cursor: last.cursor,
                stack: last.stack.clone(),
            };
            steps.push(stuck);
        }

        Ok(PdaRun { steps, accepted })
    }

    /// Runs the search until an accepting configuration is discovered or
    /// nothing is left to explore.
    fn search(
        &self,
        search: &mut Search,
        initial: Configuration,
        input: &str,
        matcher: &impl SymbolMatcher,
    ) -> Result<bool> {
        let is_accepting =
            |config: &Configuration| config.cursor == input.len() && self.is_final(&config.state);

        if search.discover(initial, &is_accepting)? {
            return Ok(true);
        }

        while let Some(current) = search.queue.pop_front() {
            let mut next = self.successors(&mut search.arena, &current, &Symbol::Epsilon);

            if current.cursor < input.len() {
                let remaining = &input[current.cursor..];
                let candidates = self
                    .transitions
                    .get(&current.state)
                    .into_iter()
                    .flat_map(|row| row.keys())
                    .filter_map(|rule| rule.input.as_text())
                    .collect_vec();

                for symbol in matcher.select(&candidates, remaining) {
                    next.extend(self.successors(
                        &mut search.arena,
                        &current,
                        &Symbol::text(symbol),
                    ));
                }
            }

            for config in next {
                if search.discover(config, &is_accepting)? {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }
}

/// The bookkeeping of a breadth-first configuration search.
struct Search<'a> {
    config: &'a SimulationConfig,
    arena: StackArena,
    queue: VecDeque<Configuration>,
    visited: HashSet<Configuration>,
    /// The first configuration discovered at each byte offset.
    representatives: BTreeMap<usize, Configuration>,
}

impl<'a> Search<'a> {
    fn new(config: &'a SimulationConfig) -> Self {
        Search {
            config,
            arena: StackArena::default(),
            queue: VecDeque::new(),
            visited: HashSet::new(),
            representatives: BTreeMap::new(),
        }
    }

    /// Records a configuration unless it was seen before and returns whether
    /// it is accepting. Accepting configurations end the search, so they are
    /// not queued and not held to the limits.
    fn discover(
        &mut self,
        next: Configuration,
        is_accepting: impl Fn(&Configuration) -> bool,
    ) -> Result<bool> {
        if self.visited.contains(&next) {
            return Ok(false);
        }

        let accepting = is_accepting(&next);
        if !accepting {
            let max_depth = *self.config.get_max_stack_depth();
            if self.arena.depth(next.stack) > max_depth {
                return Err(AutomatonError::StackDepthLimit { limit: max_depth });
            }

            let max_configurations = *self.config.get_max_configurations();
            if self.visited.len() >= max_configurations {
                return Err(AutomatonError::ConfigurationLimit {
                    limit: max_configurations,
                });
            }
        }

        self.representatives
            .entry(next.cursor)
            .or_insert_with(|| next.clone());
        self.visited.insert(next.clone());
        if !accepting {
            self.queue.push_back(next);
        }
        Ok(accepting)
    }
}

impl FiniteStateMachine for Pda {
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
            for targets in row.values_mut() {
                targets.retain(|target| target.dst != state);
            }
            row.retain(|_, targets| !targets.is_empty());
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
            for targets in row.values_mut() {
                *targets = std::mem::take(targets)
                    .into_iter()
                    .map(|mut target| {
                        if target.dst == old {
                            target.dst = new.to_string();
                        }
                        target
                    })
                    .collect();
            }
        }
        Ok(())
    }
}

impl Acceptor for Pda {}

impl Language for Pda {
    /// Searches that exceed their limits count as rejection.
    fn accepts(&self, input: &str) -> bool {
        self.simulate(input).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct PdaDocument {
    states: Vec<StateId>,
    input_alphabet: Vec<String>,
    stack_alphabet: Vec<String>,
    start_state: Option<StateId>,
    start_stack_symbol: Option<String>,
    final_states: Vec<StateId>,
    transitions: BTreeMap<String, serde_json::Value>,
}

fn transition_key(src: &str, rule: &PdaRule) -> String {
    format!(
        "{src}{sep}{}{sep}{}",
        rule.input.to_persisted(),
        rule.pop.to_persisted(),
        sep = KEY_SEPARATOR
    )
}

/// Transitions are keyed by `"src,input,pop"`. Input and pop symbols never
/// contain the separator, so keys are split from the right and the source
/// state is everything before the last two separators.
impl JsonFormat for Pda {
    fn to_json(&self) -> Result<String> {
        let mut transitions = BTreeMap::new();
        for (src, rule, targets) in self.transitions() {
            let targets = targets
                .iter()
                .map(|target| (target.dst.clone(), target.push.clone()))
                .collect_vec();
            transitions.insert(transition_key(src, rule), serde_json::to_value(targets)?);
        }

        let document = PdaDocument {
            states: self.states().iter().cloned().collect(),
            input_alphabet: self.input_alphabet().into_iter().collect(),
            stack_alphabet: self.stack_alphabet().into_iter().collect(),
            start_state: self.start_state().cloned(),
            start_stack_symbol: Some(self.start_stack_symbol.clone()),
            final_states: self.final_states().iter().cloned().collect(),
            transitions,
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn from_json(json: &str) -> Result<Self> {
        let document: PdaDocument = serde_json::from_str(json)?;
        let mut pda = Pda::new();

        if let Some(symbol) = document.start_stack_symbol
            && pda.set_start_stack_symbol(symbol).is_err()
        {
            tracing::warn!(
                "Ignoring empty start stack symbol, using '{}'",
                DEFAULT_START_STACK_SYMBOL
            );
        }

        for state in document.states {
            pda.table.insert(state, false);
        }
        restore_start(&mut pda.table, document.start_state.as_deref());
        for state in document.final_states {
            if pda.set_final(&state, true).is_err() {
                tracing::warn!("Ignoring unknown final state '{}'", state);
            }
        }

        for (key, value) in document.transitions {
            let Some((pop, input, src)) = key.rsplitn(3, KEY_SEPARATOR).collect_tuple() else {
                tracing::warn!("Ignoring malformed transition key '{}'", key);
                continue;
            };

            let targets: Vec<(StateId, Symbol)> = match serde_json::from_value(value) {
                Ok(targets) => targets,
                Err(e) => {
                    tracing::warn!("Ignoring malformed transition '{}': {}", key, e);
                    continue;
                }
            };

            for (dst, push) in targets {
                let added = pda.add_transition(
                    src,
                    Symbol::from_persisted(input),
                    Symbol::from_persisted(pop),
                    &dst,
                    push,
                );
                if let Err(e) = added {
                    tracing::warn!("Ignoring transition '{}' -> {}: {}", key, dst, e);
                }
            }
        }

        Ok(pda)
    }
}

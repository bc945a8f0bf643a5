use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use hashbrown::HashSet;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    automaton::{Acceptor, FiniteStateMachine, StateId, nfa::Nfa, symbol::Symbol},
    error::{AutomatonError, Result},
};

/// The right-hand side of a right-linear production.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProductionBody {
    /// `A -> ε`
    Epsilon,
    /// `A -> a`
    Terminal(String),
    /// `A -> a B`
    TerminalThen(String, String),
}

impl Display for ProductionBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductionBody::Epsilon => write!(f, "ε"),
            ProductionBody::Terminal(t) => write!(f, "{}", t),
            ProductionBody::TerminalThen(t, n) => write!(f, "{} {}", t, n),
        }
    }
}

/// A right-linear grammar. Nonterminals are the states of the automaton it
/// was extracted from, plus fresh ones in strict form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegularGrammar {
    pub start: String,
    pub productions: BTreeMap<String, BTreeSet<ProductionBody>>,
}

impl RegularGrammar {
    fn new(start: String) -> Self {
        RegularGrammar {
            start,
            productions: BTreeMap::new(),
        }
    }

    fn add(&mut self, head: &str, body: ProductionBody) {
        self.productions
            .entry(head.to_string())
            .or_default()
            .insert(body);
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &String> {
        self.productions.keys()
    }

    pub fn production_count(&self) -> usize {
        self.productions.values().map(BTreeSet::len).sum()
    }

    /// Whether every production has at most one single-character terminal.
    pub fn is_strict(&self) -> bool {
        self.productions.values().flatten().all(|body| match body {
            ProductionBody::Epsilon => true,
            ProductionBody::Terminal(t) | ProductionBody::TerminalThen(t, _) => {
                t.chars().count() == 1
            }
        })
    }

    /// Looks up `head -> body`.
    pub fn has_production(&self, head: &str, body: &ProductionBody) -> bool {
        self.productions
            .get(head)
            .is_some_and(|bodies| bodies.contains(body))
    }
}

impl Display for RegularGrammar {
    /// One line per nonterminal, the start symbol first.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let heads = self
            .productions
            .keys()
            .sorted_by_key(|head| *head != &self.start);

        for head in heads {
            writeln!(
                f,
                "{} -> {}",
                head,
                self.productions[head].iter().join(" | ")
            )?;
        }
        Ok(())
    }
}

/// Allocates nonterminal names that collide neither with states nor with each
/// other.
struct NameSupply<'a> {
    nfa: &'a Nfa,
    used: HashSet<String>,
}

impl NameSupply<'_> {
    fn fresh(&mut self, base: &str) -> String {
        let name = (1..)
            .map(|i| format!("{}_{}", base, i))
            .find(|name| !self.nfa.has_state(name) && !self.used.contains(name))
            .unwrap_or_else(|| base.to_string());
        self.used.insert(name.clone());
        name
    }
}

impl Nfa {
    /// Extracts a right-linear grammar generating the language of the
    /// automaton. Nonterminals are states and the start symbol is the start
    /// state.
    ///
    /// In extended form a terminal may be a multi-character symbol. In strict
    /// form every multi-character symbol is read through a chain of fresh
    /// nonterminals so that each production has exactly one single-character
    /// terminal.
    pub fn to_regular_grammar(&self, strict: bool) -> Result<RegularGrammar> {
        let start = self
            .start_state()
            .ok_or(AutomatonError::MissingStartState)?;

        let mut grammar = RegularGrammar::new(start.clone());
        let mut names = NameSupply {
            nfa: self,
            used: HashSet::new(),
        };
        let mut emitted: HashSet<(&StateId, &Symbol, &StateId)> = HashSet::new();

        for head in self.states() {
            let reach = self.epsilon_closure([head]);
            if self.contains_final(&reach) {
                grammar.add(head, ProductionBody::Epsilon);
            }

            for (symbol, dsts) in reach.iter().flat_map(|r| self.outgoing(r)) {
                let Some(text) = symbol.as_text() else {
                    continue;
                };

                for dst in dsts {
                    if !emitted.insert((head, symbol, dst)) {
                        continue;
                    }

                    let chars = text.chars().collect_vec();
                    let (last, prefix) = match chars.split_last() {
                        Some((last, prefix)) if strict => (last.to_string(), prefix.to_vec()),
                        _ => (text.to_string(), vec![]),
                    };

                    // read all but the last character through fresh nonterminals
                    let mut current = head.clone();
                    for c in prefix {
                        let next = names.fresh(head);
                        grammar.add(
                            &current,
                            ProductionBody::TerminalThen(c.to_string(), next.clone()),
                        );
                        current = next;
                    }

                    grammar.add(
                        &current,
                        ProductionBody::TerminalThen(last.clone(), dst.clone()),
                    );
                    if self.is_final(dst) {
                        grammar.add(&current, ProductionBody::Terminal(last));
                    }
                }
            }
        }

        Ok(grammar)
    }
}

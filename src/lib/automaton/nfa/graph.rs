use hashbrown::HashMap;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::Dfs,
};

use crate::automaton::{Acceptor, FiniteStateMachine, StateId, StateSet, nfa::Nfa, symbol::Symbol};

/// The transition graph of an automaton. Every destination of a transition
/// becomes its own edge.
pub struct TransitionGraph {
    pub graph: DiGraph<StateId, Symbol>,
    pub nodes: HashMap<StateId, NodeIndex<u32>>,
}

impl TransitionGraph {
    pub fn node(&self, state: &str) -> Option<NodeIndex<u32>> {
        self.nodes.get(state).copied()
    }
}

impl Nfa {
    pub fn to_graph(&self) -> TransitionGraph {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();

        for state in self.states() {
            nodes.insert(state.clone(), graph.add_node(state.clone()));
        }

        for (src, symbol, dsts) in self.transitions() {
            for dst in dsts {
                graph.add_edge(nodes[src], nodes[dst], symbol.clone());
            }
        }

        TransitionGraph { graph, nodes }
    }

    /// The states reachable from the start state, epsilon transitions
    /// included. Empty if there is no start state.
    pub fn reachable_states(&self) -> StateSet {
        let Some(start) = self.start_state() else {
            return StateSet::new();
        };

        let graph = self.to_graph();
        let Some(start) = graph.node(start) else {
            return StateSet::new();
        };

        let mut reachable = StateSet::new();
        let mut dfs = Dfs::new(&graph.graph, start);
        while let Some(node) = dfs.next(&graph.graph) {
            reachable.insert(graph.graph[node].clone());
        }
        reachable
    }

    pub fn unreachable_states(&self) -> StateSet {
        let reachable = self.reachable_states();
        self.states()
            .iter()
            .filter(|state| !reachable.contains(*state))
            .cloned()
            .collect()
    }

    /// Whether a final state can be reached from the start state, ignoring
    /// which symbols are needed to get there.
    pub fn has_reachable_final(&self) -> bool {
        self.contains_final(&self.reachable_states())
    }
}

use automata_engine::{
    automaton::{
        FiniteStateMachine,
        nfa::{Nfa, grammar::ProductionBody},
        symbol::Symbol,
    },
    error::AutomatonError,
};

fn then(terminal: &str, nonterminal: &str) -> ProductionBody {
    ProductionBody::TerminalThen(terminal.to_string(), nonterminal.to_string())
}

fn terminal(terminal: &str) -> ProductionBody {
    ProductionBody::Terminal(terminal.to_string())
}

/// `ab c*` with a multi-character symbol.
fn ab_c_star() -> Nfa {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);
    nfa.add_state("q1", false, true);
    nfa.add_transition("q0", "ab".into(), "q1").unwrap();
    nfa.add_transition("q1", 'c'.into(), "q1").unwrap();
    nfa
}

#[test]
fn test_extended_grammar() {
    let grammar = ab_c_star().to_regular_grammar(false).unwrap();

    assert_eq!(grammar.start, "q0");
    assert!(!grammar.is_strict());
    assert_eq!(
        grammar.to_string(),
        "q0 -> ab | ab q1\nq1 -> ε | c | c q1\n"
    );
}

#[test]
fn test_strict_grammar() {
    let grammar = ab_c_star().to_regular_grammar(true).unwrap();

    assert!(grammar.is_strict());
    assert!(grammar.has_production("q0", &then("a", "q0_1")));
    assert!(grammar.has_production("q0_1", &then("b", "q1")));
    assert!(grammar.has_production("q0_1", &terminal("b")));
    assert!(grammar.has_production("q1", &ProductionBody::Epsilon));
    assert_eq!(grammar.production_count(), 6);
}

#[test]
fn test_strict_names_avoid_states() {
    let mut nfa = ab_c_star();
    nfa.add_state("q0_1", false, false);

    let grammar = nfa.to_regular_grammar(true).unwrap();
    assert!(grammar.has_production("q0", &then("a", "q0_2")));
    assert!(grammar.has_production("q0_2", &then("b", "q1")));
}

#[test]
fn test_grammar_follows_epsilon() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);
    nfa.add_state("q1", false, true);
    nfa.add_transition("q0", Symbol::Epsilon, "q1").unwrap();
    nfa.add_transition("q1", 'a'.into(), "q1").unwrap();

    let grammar = nfa.to_regular_grammar(false).unwrap();
    assert!(grammar.has_production("q0", &ProductionBody::Epsilon));
    assert!(grammar.has_production("q0", &then("a", "q1")));
    assert!(grammar.has_production("q0", &terminal("a")));
    assert_eq!(grammar.to_string().lines().next(), Some("q0 -> ε | a | a q1"));
}

#[test]
fn test_grammar_requires_start_state() {
    let mut nfa = ab_c_star();
    nfa.state_table_mut().clear_start();

    assert!(matches!(
        nfa.to_regular_grammar(false),
        Err(AutomatonError::MissingStartState)
    ));
}

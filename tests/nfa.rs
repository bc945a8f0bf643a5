use automata_engine::automaton::{
    Acceptor, FiniteStateMachine, Language, StateSet,
    matcher::AllMatches,
    nfa::Nfa,
    symbol::Symbol,
};

mod common;

use common::{random_nfa, seeded};

fn set(states: &[&str]) -> StateSet {
    states.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_single_transition() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);
    nfa.add_state("q1", false, true);
    nfa.add_transition("q0", 'a'.into(), "q1").unwrap();

    assert!(nfa.simulate("a"));
    assert!(!nfa.simulate(""));

    let run = nfa.simulate_history("b");
    assert!(!run.accepted);
    assert_eq!(run.consumed(), 0);
    assert_eq!(run.steps.len(), 1);
    assert_eq!(run.final_states(), Some(&set(&["q0"])));
}

#[test]
fn test_epsilon_accepts_empty_input() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);
    nfa.add_state("q1", false, true);
    nfa.add_transition("q0", Symbol::Epsilon, "q1").unwrap();

    assert!(nfa.simulate(""));
    assert!(!nfa.simulate("a"));
}

#[test]
fn test_longest_match() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);
    nfa.add_state("q1", false, true);
    nfa.add_transition("q0", "ab".into(), "q1").unwrap();
    nfa.add_transition("q0", 'a'.into(), "q0").unwrap();

    let run = nfa.simulate_history("ab");
    assert!(run.accepted);
    assert_eq!(run.steps.len(), 2);
    assert_eq!(run.steps[1].states, set(&["q1"]));
    assert_eq!(run.steps[1].cursor, 2);

    assert!(nfa.simulate("aab"));
}

#[test]
fn test_longest_match_is_greedy() {
    // "ab" is only ever read as one symbol, so "a" then "b" is never tried
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);
    nfa.add_state("q1", false, false);
    nfa.add_state("q2", false, true);
    nfa.add_transition("q0", "ab".into(), "q1").unwrap();
    nfa.add_transition("q0", 'a'.into(), "q1").unwrap();
    nfa.add_transition("q1", 'b'.into(), "q2").unwrap();

    assert!(!nfa.simulate("ab"));
    assert!(nfa.simulate_history_with("ab", &AllMatches).accepted);
}

#[test]
fn test_cursor_counts_characters() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);
    nfa.add_state("q1", false, true);
    nfa.add_transition("q0", "éé".into(), "q1").unwrap();

    let run = nfa.simulate_history("éé");
    assert!(run.accepted);
    assert_eq!(run.consumed(), 2);
}

#[test]
fn test_no_start_state() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", false, true);
    nfa.state_table_mut().clear_start();

    let run = nfa.simulate_history("");
    assert!(run.steps.is_empty());
    assert!(!run.accepted);
    assert!(nfa.to_dfa().is_none());
}

#[test]
fn test_add_transition_requires_states() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);

    assert!(nfa.add_transition("q0", 'a'.into(), "q9").is_err());
    assert!(nfa.add_transition("q9", 'a'.into(), "q0").is_err());
    assert!(nfa.add_transition("q0", "".into(), "q0").is_err());
    assert_eq!(nfa.transition_count(), 0);
}

#[test]
fn test_state_mutation() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", false, false);
    nfa.add_state("q1", false, true);
    nfa.add_state("q2", false, false);
    nfa.add_transition("q0", 'a'.into(), "q1").unwrap();
    nfa.add_transition("q1", 'b'.into(), "q2").unwrap();
    nfa.add_transition("q2", 'a'.into(), "q1").unwrap();

    assert_eq!(nfa.start_state().map(String::as_str), Some("q0"));

    nfa.rename_state("q1", "p").unwrap();
    assert!(nfa.is_final("p"));
    assert_eq!(nfa.targets("q0", &'a'.into()), Some(&set(&["p"])));
    assert!(nfa.rename_state("p", "q2").is_err());
    nfa.rename_state("p", "p").unwrap();

    nfa.remove_state("p");
    assert_eq!(nfa.transition_count(), 0);
    assert!(nfa.final_states().is_empty());
    nfa.remove_state("unknown");

    assert!(nfa.toggle_final("q2").unwrap());
    assert!(nfa.is_final("q2"));
    assert!(!nfa.toggle_final("q2").unwrap());
    assert!(nfa.toggle_final("q9").is_err());

    nfa.set_start_state("q2").unwrap();
    assert_eq!(nfa.start_state().map(String::as_str), Some("q2"));
}

#[test]
fn test_remove_transition() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);
    nfa.add_state("q1", false, true);
    nfa.add_transition("q0", 'a'.into(), "q0").unwrap();
    nfa.add_transition("q0", 'a'.into(), "q1").unwrap();

    assert!(nfa.remove_transition("q0", &'a'.into(), "q1"));
    assert!(!nfa.remove_transition("q0", &'a'.into(), "q1"));
    assert_eq!(nfa.targets("q0", &'a'.into()), Some(&set(&["q0"])));

    assert!(nfa.remove_transition("q0", &'a'.into(), "q0"));
    assert_eq!(nfa.targets("q0", &'a'.into()), None);
    assert!(nfa.alphabet().is_empty());
}

#[test]
fn test_is_dfa() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);
    nfa.add_state("q1", false, true);
    nfa.add_transition("q0", 'a'.into(), "q1").unwrap();
    assert!(nfa.is_dfa());

    nfa.add_transition("q0", 'a'.into(), "q0").unwrap();
    assert!(!nfa.is_dfa());
    nfa.remove_transition("q0", &'a'.into(), "q0");

    nfa.add_transition("q1", "ab".into(), "q0").unwrap();
    assert!(!nfa.is_dfa());
    nfa.remove_transition("q1", &"ab".into(), "q0");

    nfa.add_transition("q1", Symbol::Epsilon, "q0").unwrap();
    assert!(!nfa.is_dfa());
    nfa.remove_transition("q1", &Symbol::Epsilon, "q0");

    assert!(nfa.is_dfa());
}

#[test]
fn test_closure_is_idempotent_and_extensive() {
    let mut r = seeded(7);

    for _ in 0..50 {
        let nfa = random_nfa(&mut r, 6, &["a", "b"], 0..4, 0.2);

        for state in nfa.states() {
            let seed = set(&[state.as_str()]);
            let closure = nfa.epsilon_closure(&seed);

            assert!(closure.is_superset(&seed));
            assert_eq!(nfa.epsilon_closure(&closure), closure);
        }
    }
}

#[test]
fn test_language_trait() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, true);
    nfa.add_transition("q0", "ab".into(), "q0").unwrap();

    let language: &dyn Language = &nfa;
    assert!(language.accepts("abab"));
    assert!(!language.accepts("aba"));
}

use automata_engine::{
    automaton::{
        FiniteStateMachine, Language,
        turing::{BLANK_SYMBOL, TuringMachine, Verdict},
    },
    config::SimulationConfig,
    error::AutomatonError,
};

/// Accepts words over `a` and `b` with an even number of `a`s and replaces
/// every `a` by `x` on the way.
fn even_as() -> TuringMachine {
    let mut tm = TuringMachine::new();
    tm.add_state("even", true, false);
    tm.add_state("odd", false, false);
    tm.add_state("accept", false, true);
    tm.add_transition("even", "a", "odd", "x", "R").unwrap();
    tm.add_transition("even", "b", "even", "b", "R").unwrap();
    tm.add_transition("odd", "a", "even", "x", "R").unwrap();
    tm.add_transition("odd", "b", "odd", "b", "R").unwrap();
    tm.add_transition("even", BLANK_SYMBOL, "accept", BLANK_SYMBOL, "L")
        .unwrap();
    tm
}

#[test]
fn test_accept_and_reject() {
    let tm = even_as();

    assert_eq!(tm.simulate("abab"), Verdict::Accepted);
    assert_eq!(tm.simulate(""), Verdict::Accepted);
    assert_eq!(tm.simulate("ab"), Verdict::Rejected);
    assert!(tm.accepts("aa"));
    assert!(!tm.accepts("c"));
}

#[test]
fn test_history_records_tape() {
    let tm = even_as();
    let run = tm.simulate_history("ab");

    assert_eq!(run.verdict, Verdict::Rejected);
    assert_eq!(run.steps.len(), 3);
    assert_eq!(run.steps[0].tape.get(&0).map(String::as_str), Some("a"));
    assert_eq!(run.steps[1].tape.get(&0).map(String::as_str), Some("x"));
    assert_eq!(run.steps[1].head, 1);
    assert_eq!(run.steps[2].state, "odd");
    assert_eq!(run.steps[2].head, 2);
}

#[test]
fn test_step_limit() {
    let mut tm = TuringMachine::new();
    tm.add_state("q0", true, false);
    tm.add_transition("q0", BLANK_SYMBOL, "q0", BLANK_SYMBOL, "R")
        .unwrap();

    let config = SimulationConfig::default().with_max_turing_steps(25);
    let run = tm.simulate_history_with("", &config);

    assert_eq!(run.verdict, Verdict::Loop);
    assert_eq!(run.steps.len(), 26);
    assert_eq!(run.steps.last().map(|s| s.head), Some(25));
}

#[test]
fn test_invalid_direction() {
    let mut tm = even_as();

    assert!(matches!(
        tm.add_transition("even", "c", "even", "c", "U"),
        Err(AutomatonError::InvalidDirection(_))
    ));
    assert!(tm.action("even", "c").is_none());
}

#[test]
fn test_state_mutation() {
    let mut tm = even_as();

    tm.rename_state("accept", "done").unwrap();
    assert_eq!(tm.simulate("aa"), Verdict::Accepted);

    assert!(tm.remove_transition("odd", "b"));
    assert_eq!(tm.simulate("aba"), Verdict::Rejected);

    tm.remove_state("done");
    assert_eq!(tm.simulate(""), Verdict::Rejected);
    assert!(tm.tape_alphabet().contains("x"));
    assert!(!tm.input_alphabet().contains(BLANK_SYMBOL));
}

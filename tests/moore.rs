use automata_engine::automaton::{
    FiniteStateMachine, moore::MooreMachine, transducer::Transducer,
};

/// Emits the parity of the number of `1`s read so far after every symbol.
fn parity() -> MooreMachine {
    let mut moore = MooreMachine::new();
    moore.add_state("even", "0", true);
    moore.add_state("odd", "1", false);
    moore.add_transition("even", "0", "even").unwrap();
    moore.add_transition("even", "1", "odd").unwrap();
    moore.add_transition("odd", "0", "odd").unwrap();
    moore.add_transition("odd", "1", "even").unwrap();
    moore
}

#[test]
fn test_initial_output() {
    let moore = parity();
    let run = moore.simulate_history("");

    assert_eq!(run.steps.len(), 1);
    assert_eq!(run.steps[0].output, "0");
    assert_eq!(run.steps[0].cursor, 0);
    assert_eq!(run.output.as_deref(), Some("0"));
}

#[test]
fn test_parity() {
    let moore = parity();
    let run = moore.simulate_history("1101");

    assert_eq!(run.output.as_deref(), Some("01001"));
    let states: Vec<&str> = run.steps.iter().map(|s| s.state.as_str()).collect();
    assert_eq!(states, vec!["even", "odd", "even", "even", "odd"]);
    assert_eq!(run.steps[2].output, "010");
}

#[test]
fn test_stuck() {
    let moore = parity();
    let run = moore.simulate_history("12");

    assert!(run.is_stuck());
    assert_eq!(run.output, None);
    assert_eq!(run.steps.last().map(|s| s.cursor), Some(1));
}

#[test]
fn test_multi_character_inputs() {
    let mut moore = MooreMachine::new();
    moore.add_state("q0", "", true);
    moore.add_state("q1", "x", false);
    moore.add_state("q2", "y", false);
    moore.add_transition("q0", "a", "q1").unwrap();
    moore.add_transition("q0", "ab", "q2").unwrap();
    moore.add_transition("q1", "b", "q0").unwrap();
    moore.add_transition("q2", "a", "q1").unwrap();

    assert_eq!(moore.simulate("aba").as_deref(), Some("yx"));
    assert_eq!(moore.simulate("a").as_deref(), Some("x"));
}

#[test]
fn test_remove_state() {
    let mut moore = parity();
    moore.remove_state("odd");

    assert_eq!(moore.output_of("odd"), None);
    assert_eq!(moore.output_alphabet().len(), 1);
    assert_eq!(moore.input_alphabet().len(), 1);
    assert_eq!(moore.simulate("00").as_deref(), Some("000"));
    assert_eq!(moore.simulate("1"), None);

    assert!(moore.remove_transition("even", "0"));
    assert!(!moore.remove_transition("even", "0"));
    assert!(moore.add_transition("even", "0", "odd").is_err());
}

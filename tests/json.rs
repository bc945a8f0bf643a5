use automata_engine::{
    automaton::{
        Acceptor, FiniteStateMachine, JsonFormat, mealy::MealyMachine, moore::MooreMachine,
        nfa::Nfa, pda::Pda, symbol::Symbol, transducer::Transducer, turing::TuringMachine,
    },
    error::AutomatonError,
};

#[test]
fn test_nfa_round_trip() {
    let mut nfa = Nfa::new();
    nfa.add_state("q0", true, false);
    nfa.add_state("q1", false, true);
    nfa.add_state("q2", false, false);
    nfa.add_transition("q0", Symbol::Epsilon, "q1").unwrap();
    nfa.add_transition("q0", "ab".into(), "q1").unwrap();
    nfa.add_transition("q0", "ab".into(), "q2").unwrap();
    nfa.add_transition("q2", 'c'.into(), "q0").unwrap();

    let json = nfa.to_json().unwrap();
    assert!(json.contains("\"&\""));

    let loaded = Nfa::from_json(&json).unwrap();
    assert_eq!(loaded, nfa);
}

#[test]
fn test_nfa_lenient_loading() {
    let json = r#"{
        "states": ["q0", "q1"],
        "start_state": "q0",
        "final_states": ["q1", "q7"],
        "alphabet": ["a"],
        "transitions": [
            {"src": "q0", "symbol": "a", "dsts": ["q1", "q9"]},
            {"src": "q0", "dsts": ["q1"]},
            "garbage",
            {"src": "q1", "symbol": "&", "dsts": ["q0"]}
        ]
    }"#;

    let nfa = Nfa::from_json(json).unwrap();
    assert_eq!(nfa.transition_count(), 2);
    assert_eq!(nfa.final_states().len(), 1);
    assert!(nfa.targets("q1", &Symbol::Epsilon).is_some());
    assert!(nfa.simulate("a"));
}

#[test]
fn test_unknown_start_falls_back() {
    let json = r#"{"states": ["b", "a"], "start_state": "zzz"}"#;
    let nfa = Nfa::from_json(json).unwrap();
    assert_eq!(nfa.start_state().map(String::as_str), Some("a"));

    let nfa = Nfa::from_json(r#"{"states": [], "start_state": null}"#).unwrap();
    assert_eq!(nfa.start_state(), None);
}

#[test]
fn test_malformed_document() {
    assert!(matches!(
        Nfa::from_json("{ not json"),
        Err(AutomatonError::Json(_))
    ));
}

#[test]
fn test_pda_round_trip() {
    let mut pda = Pda::new();
    pda.add_state("q0", true, false);
    pda.add_state("q1", false, true);
    pda.add_transition("q0", '('.into(), Symbol::Epsilon, "q0", '('.into())
        .unwrap();
    pda.add_transition("q0", ')'.into(), '('.into(), "q0", Symbol::Epsilon)
        .unwrap();
    pda.add_transition("q0", Symbol::Epsilon, "Z".into(), "q1", "Z".into())
        .unwrap();

    let json = pda.to_json().unwrap();
    assert!(json.contains("\"q0,(,&\""));

    let loaded = Pda::from_json(&json).unwrap();
    assert_eq!(loaded, pda);
    assert!(loaded.simulate("(())").unwrap());
}

#[test]
fn test_pda_lenient_loading() {
    let json = r#"{
        "states": ["q0", "q1"],
        "start_state": "q0",
        "start_stack_symbol": "S",
        "final_states": ["q1"],
        "transitions": {
            "q0,a,S": [["q1", "&"]],
            "q0,a": [["q1", "&"]],
            "q0,b,&": "not a list",
            "q0,c,&": [["q5", "&"]]
        }
    }"#;

    let pda = Pda::from_json(json).unwrap();
    assert_eq!(pda.start_stack_symbol(), "S");
    assert_eq!(pda.transition_count(), 1);
    assert!(pda.simulate("a").unwrap());
}

#[test]
fn test_pda_keys_with_separator_in_state_names() {
    let mut pda = Pda::new();
    pda.add_state("a,b", true, false);
    pda.add_state("c", false, true);
    pda.add_transition("a,b", 'x'.into(), Symbol::Epsilon, "c", ','.into())
        .unwrap();

    let json = pda.to_json().unwrap();
    assert!(json.contains("\"a,b,x,&\""));
    assert_eq!(Pda::from_json(&json).unwrap(), pda);

    // a separator used as input cannot be told apart from the key structure
    let json = r#"{"states": ["q0"], "transitions": {"q0,,,&": [["q0", "&"]]}}"#;
    assert_eq!(Pda::from_json(json).unwrap().transition_count(), 0);
}

#[test]
fn test_moore_round_trip() {
    let mut moore = MooreMachine::new();
    moore.add_state("q0", "0", true);
    moore.add_state("q1", "1", false);
    moore.add_transition("q0", "a", "q1").unwrap();
    moore.add_transition("q1", "bb", "q0").unwrap();

    let loaded = MooreMachine::from_json(&moore.to_json().unwrap()).unwrap();
    assert_eq!(loaded, moore);
}

#[test]
fn test_moore_missing_output() {
    let json = r#"{
        "states": ["q0", "q1"],
        "start_state": "q0",
        "output_function": {"q0": "x"},
        "transitions": [
            {"src": "q0", "input": "a", "dst": "q1"},
            {"src": "q0", "dst": "q1"}
        ]
    }"#;

    let moore = MooreMachine::from_json(json).unwrap();
    assert_eq!(moore.output_of("q1"), Some(""));
    assert_eq!(moore.simulate("a").as_deref(), Some("x"));
}

#[test]
fn test_mealy_round_trip() {
    let mut mealy = MealyMachine::new();
    mealy.add_state("q0", true);
    mealy.add_state("q1", false);
    mealy.add_transition("q0", "a", "q1", "x").unwrap();
    mealy.add_transition("q1", "a", "q0", "y").unwrap();

    let json = mealy.to_json().unwrap();
    assert!(json.contains("\"output\""));

    let loaded = MealyMachine::from_json(&json).unwrap();
    assert_eq!(loaded, mealy);
    assert_eq!(loaded.simulate("aaa").as_deref(), Some("xyx"));
}

#[test]
fn test_turing_round_trip() {
    let mut tm = TuringMachine::new();
    tm.add_state("q0", true, false);
    tm.add_state("q1", false, true);
    tm.add_transition("q0", "a", "q0", "b", "R").unwrap();
    tm.add_transition("q0", "β", "q1", "β", "L").unwrap();

    let json = tm.to_json().unwrap();
    assert!(json.contains("\"q0,a\""));

    let loaded = TuringMachine::from_json(&json).unwrap();
    assert_eq!(loaded, tm);
}

#[test]
fn test_turing_skips_bad_direction() {
    let json = r#"{
        "states": ["q0"],
        "start_state": "q0",
        "final_states": [],
        "blank_symbol": "_",
        "transitions": {
            "q0,a": ["q0", "a", "U"],
            "q0,b": ["q0", "b", "R"]
        }
    }"#;

    let tm = TuringMachine::from_json(json).unwrap();
    assert_eq!(tm.blank_symbol(), "_");
    assert!(tm.action("q0", "a").is_none());
    assert!(tm.action("q0", "b").is_some());
}
